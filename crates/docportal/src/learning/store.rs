//! SQLite store for the query log and user feedback

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{DocumentId, FeedbackRequest};

use super::feedback::{FeedbackRecord, FeedbackType, QueryLogEntry};

const QUERY_COLUMNS: &str =
    "query_id, answer_id, document_id, question, answer, context_json, latency_ms, created_at";

const FEEDBACK_COLUMNS: &str = "f.id, f.query_id, f.answer_id, f.rating, f.comment, f.created_at";

/// Query log and feedback persistence
pub struct FeedbackStore {
    conn: Arc<Mutex<Connection>>,
}

impl FeedbackStore {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("Failed to open in-memory database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            "#,
        )
        .map_err(|e| Error::Storage(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS queries (
                query_id TEXT PRIMARY KEY,
                answer_id TEXT NOT NULL,
                document_id TEXT NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                context_json TEXT NOT NULL,
                latency_ms INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_queries_document_id ON queries(document_id);

            CREATE TABLE IF NOT EXISTS feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                query_id TEXT NOT NULL REFERENCES queries(query_id),
                answer_id TEXT NOT NULL,
                rating TEXT NOT NULL,
                comment TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_feedback_query_id ON feedback(query_id);
            "#,
        )
        .map_err(|e| Error::Storage(format!("Failed to create tables: {}", e)))?;

        Ok(())
    }

    /// Append an answered query to the log
    pub fn record_query(&self, entry: &QueryLogEntry) -> Result<()> {
        let context_json = serde_json::to_string(&entry.context)?;
        let conn = self.conn.lock();

        conn.execute(
            &format!("INSERT INTO queries ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", QUERY_COLUMNS),
            params![
                entry.query_id.to_string(),
                entry.answer_id.to_string(),
                entry.document_id.as_str(),
                entry.question,
                entry.answer,
                context_json,
                entry.latency_ms as i64,
                entry.created_at,
            ],
        )
        .map_err(|e| Error::Storage(format!("Failed to record query: {}", e)))?;

        Ok(())
    }

    /// Look up a logged query
    pub fn get_query(&self, query_id: &Uuid) -> Result<Option<QueryLogEntry>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM queries WHERE query_id = ?1",
            QUERY_COLUMNS
        ))?;

        let entry = stmt
            .query_row(params![query_id.to_string()], row_to_query)
            .optional()?;

        Ok(entry)
    }

    /// Logged queries in insertion order, optionally for one document
    pub fn list_queries(&self, document: Option<&DocumentId>) -> Result<Vec<QueryLogEntry>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM queries WHERE (?1 IS NULL OR document_id = ?1) ORDER BY created_at, rowid",
            QUERY_COLUMNS
        ))?;

        let entries = stmt
            .query_map(params![document.map(|d| d.as_str())], row_to_query)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(entries)
    }

    /// Store a rating for a logged answer
    pub fn record_feedback(&self, request: &FeedbackRequest) -> Result<FeedbackRecord> {
        let query = self
            .get_query(&request.query_id)?
            .ok_or_else(|| Error::NotFound(format!("query {}", request.query_id)))?;

        if query.answer_id != request.answer_id {
            return Err(Error::InvalidRequest(format!(
                "answer {} does not belong to query {}",
                request.answer_id, request.query_id
            )));
        }

        let comment = request
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let created_at = Utc::now();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO feedback (query_id, answer_id, rating, comment, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                request.query_id.to_string(),
                request.answer_id.to_string(),
                request.rating.as_str(),
                comment,
                created_at,
            ],
        )
        .map_err(|e| Error::Storage(format!("Failed to record feedback: {}", e)))?;

        Ok(FeedbackRecord {
            id: conn.last_insert_rowid(),
            query_id: request.query_id,
            answer_id: request.answer_id,
            rating: request.rating,
            comment,
            created_at,
        })
    }

    /// Stored feedback in insertion order, optionally for one document
    pub fn list_feedback(&self, document: Option<&DocumentId>) -> Result<Vec<FeedbackRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM feedback f JOIN queries q ON q.query_id = f.query_id \
             WHERE (?1 IS NULL OR q.document_id = ?1) ORDER BY f.id",
            FEEDBACK_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![document.map(|d| d.as_str())], row_to_feedback)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Row counts of (queries, feedback)
    pub fn counts(&self) -> Result<(usize, usize)> {
        let conn = self.conn.lock();
        let queries: i64 = conn.query_row("SELECT COUNT(*) FROM queries", [], |row| row.get(0))?;
        let feedback: i64 = conn.query_row("SELECT COUNT(*) FROM feedback", [], |row| row.get(0))?;
        Ok((queries as usize, feedback as usize))
    }
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn uuid_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| conversion_error(idx, e))
}

fn row_to_query(row: &rusqlite::Row) -> rusqlite::Result<QueryLogEntry> {
    let document_id: String = row.get(2)?;
    let context_json: String = row.get(5)?;
    let latency_ms: i64 = row.get(6)?;
    let created_at: DateTime<Utc> = row.get(7)?;

    Ok(QueryLogEntry {
        query_id: uuid_column(row, 0)?,
        answer_id: uuid_column(row, 1)?,
        document_id: DocumentId::from(document_id),
        question: row.get(3)?,
        answer: row.get(4)?,
        context: serde_json::from_str(&context_json).map_err(|e| conversion_error(5, e))?,
        latency_ms: latency_ms.max(0) as u64,
        created_at,
    })
}

fn row_to_feedback(row: &rusqlite::Row) -> rusqlite::Result<FeedbackRecord> {
    let rating: String = row.get(3)?;

    Ok(FeedbackRecord {
        id: row.get(0)?,
        query_id: uuid_column(row, 1)?,
        answer_id: uuid_column(row, 2)?,
        rating: rating.parse::<FeedbackType>().map_err(|e| conversion_error(3, e))?,
        comment: row.get(4)?,
        created_at: row.get(5)?,
    })
}
