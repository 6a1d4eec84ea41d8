//! Shared fixture: six documents in scope `org_1`, foreign documents in
//! other scopes, and the same data loaded into an in-memory SQLite store.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use docquery::search::normalize_tag_name;
use docquery::{
    Document, DocumentTag, Expression, Issue, SqlCompiler, SqlParam, filter_records, parse_query,
};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

pub const SCOPE: &str = "org_1";
pub const FOREIGN_SCOPE: &str = "org_2";
/// Scope ids the FTS tokenizer splits into the same tokens as `SCOPE`.
pub const LOOKALIKE_SCOPES: [&str; 2] = ["org-1", "ORG_1_b"];

pub const COOKING_ID: &str = "3f2b8c1e-9d4a-4b7e-8c6f-1a2b3c4d5e6f";
pub const WORK_ID: &str = "7a1d2e3f-4b5c-4d6e-8f90-a1b2c3d4e5f6";
pub const PERSONAL_ID: &str = "c0ffee00-1234-4abc-9def-0123456789ab";
pub const FOREIGN_COOKING_ID: &str = "e5d4c3b2-a190-4f8e-9d7c-6b5a49382716";

const SCHEMA: &str = "
    CREATE TABLE documents (
        id TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL,
        name TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
    CREATE VIRTUAL TABLE documents_fts USING fts5(
        document_id UNINDEXED,
        organization_id,
        name,
        content
    );
    CREATE TABLE tags (
        id TEXT PRIMARY KEY,
        organization_id TEXT NOT NULL,
        name TEXT NOT NULL,
        normalized_name TEXT NOT NULL
    );
    CREATE TABLE document_tags (
        document_id TEXT NOT NULL,
        tag_id TEXT NOT NULL,
        PRIMARY KEY (document_id, tag_id)
    );
";

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

fn cooking() -> DocumentTag {
    DocumentTag::new(COOKING_ID, "Cooking")
}

fn work() -> DocumentTag {
    DocumentTag::new(WORK_ID, "work")
}

fn personal() -> DocumentTag {
    DocumentTag::new(PERSONAL_ID, "Personal")
}

/// doc_1..doc_6, all in `SCOPE`, in fixture order.
pub fn documents() -> Vec<Document> {
    vec![
        Document::new(
            "doc_1",
            "Sunday breakfast",
            "Fluffy pancakes with maple syrup.",
            at(2024, 1, 5, 9, 0),
        )
        .with_tag(cooking()),
        Document::new(
            "doc_2",
            "Quarterly planning",
            "Draft the roadmap for the next quarter.",
            at(2024, 1, 10, 14, 30),
        )
        .with_tag(work()),
        Document::new(
            "doc_3",
            "Journal",
            "Walked along the river and read a novel.",
            at(2024, 2, 1, 8, 0),
        )
        .with_tag(personal()),
        Document::new(
            "doc_4",
            "Family cookies",
            "Grandma's cookies need brown butter and patience.",
            at(2024, 2, 1, 20, 15),
        )
        .with_tag(cooking())
        .with_tag(personal()),
        Document::new(
            "doc_5",
            "Standup notes",
            "Discussed the deployment pipeline & rollback.",
            at(2024, 3, 15, 11, 0),
        )
        .with_tag(work()),
        Document::new(
            "doc_6",
            "Loose thoughts",
            "Nothing tagged here yet.",
            at(2024, 4, 20, 17, 45),
        ),
    ]
}

/// A document in another scope that matches many of the queries under test.
pub fn foreign_document(id: &str) -> Document {
    Document::new(
        id,
        "Pancake brunch",
        "Pancakes with brown butter for the whole work team.",
        at(2024, 2, 1, 10, 0),
    )
}

/// Documents of other scopes, keyed by scope id. Each carries its own
/// "cooking" tag.
pub fn foreign_documents() -> Vec<(&'static str, Document)> {
    vec![
        (
            FOREIGN_SCOPE,
            foreign_document("foreign_1")
                .with_tag(DocumentTag::new(FOREIGN_COOKING_ID, "cooking")),
        ),
        (
            LOOKALIKE_SCOPES[0],
            foreign_document("lookalike_1").with_tag(DocumentTag::new(
                "11111111-2222-4333-8444-555555555555",
                "cooking",
            )),
        ),
        (
            LOOKALIKE_SCOPES[1],
            foreign_document("lookalike_2").with_tag(DocumentTag::new(
                "66666666-7777-4888-9999-aaaaaaaaaaaa",
                "cooking",
            )),
        ),
    ]
}

/// Both backends over the same data.
pub struct Fixture {
    pub documents: Vec<Document>,
    conn: Connection,
    compiler: SqlCompiler,
}

impl Fixture {
    pub fn new() -> Self {
        let documents = documents();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        for doc in &documents {
            insert_document(&conn, SCOPE, doc);
        }
        for (scope, doc) in foreign_documents() {
            insert_document(&conn, scope, &doc);
        }
        Self {
            documents,
            conn,
            compiler: SqlCompiler::default(),
        }
    }

    /// Ids matched by the in-memory evaluator, in fixture order.
    pub fn evaluate(&self, expr: &Expression) -> Vec<String> {
        filter_records(&self.documents, expr)
            .into_iter()
            .map(|doc| doc.id.clone())
            .collect()
    }

    /// Ids matched by the compiled statement (sorted) and its issues.
    pub fn query_sql(&self, expr: &Expression) -> (Vec<String>, Vec<Issue>) {
        let statement = self.compiler.statement(expr, SCOPE);
        let ids = self.select_ids(&statement.sql, &statement.params);
        (ids, statement.issues)
    }

    /// Ids matched by the bare fragment, with no outer scope restriction.
    pub fn query_fragment(&self, expr: &Expression) -> Vec<String> {
        let compiled = self.compiler.compile(expr, SCOPE);
        let sql = format!("SELECT d.id FROM documents AS d WHERE {}", compiled.fragment.sql);
        self.select_ids(&sql, &compiled.fragment.params)
    }

    /// Run `query` through both backends, assert they agree, and return the
    /// matched ids with the compiler's issues.
    pub fn assert_backends_agree(&self, query: &str) -> (Vec<String>, Vec<Issue>) {
        self.assert_expression_agrees(&parse_query(query), query)
    }

    pub fn assert_expression_agrees(
        &self,
        expr: &Expression,
        label: &str,
    ) -> (Vec<String>, Vec<Issue>) {
        let evaluated = self.evaluate(expr);
        let (mut compiled, issues) = self.query_sql(expr);
        compiled.sort();
        let mut expected = evaluated.clone();
        expected.sort();
        assert_eq!(
            expected, compiled,
            "backends disagree for {:?} ({:?})",
            label, expr
        );
        (evaluated, issues)
    }

    fn select_ids(&self, sql: &str, params: &[SqlParam]) -> Vec<String> {
        let values: Vec<Value> = params.iter().map(to_value).collect();
        let mut stmt = self.conn.prepare(sql).unwrap();
        let mut ids: Vec<String> = stmt
            .query_map(params_from_iter(values), |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        ids.sort();
        ids
    }
}

fn to_value(param: &SqlParam) -> Value {
    match param {
        SqlParam::Text(s) => Value::Text(s.clone()),
        SqlParam::Integer(i) => Value::Integer(*i),
    }
}

fn insert_document(conn: &Connection, scope: &str, doc: &Document) {
    conn.execute(
        "INSERT INTO documents (id, organization_id, name, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![doc.id, scope, doc.name, doc.content, doc.created_at.timestamp_millis()],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO documents_fts (document_id, organization_id, name, content) VALUES (?1, ?2, ?3, ?4)",
        params![doc.id, scope, doc.name, doc.content],
    )
    .unwrap();
    for tag in &doc.tags {
        conn.execute(
            "INSERT OR IGNORE INTO tags (id, organization_id, name, normalized_name) VALUES (?1, ?2, ?3, ?4)",
            params![tag.id, scope, tag.name, normalize_tag_name(&tag.name)],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO document_tags (document_id, tag_id) VALUES (?1, ?2)",
            params![doc.id, tag.id],
        )
        .unwrap();
    }
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
