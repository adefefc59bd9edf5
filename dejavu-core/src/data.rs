use crate::error::{CoreError, Result};
use crate::history::HistoryRecord;
use chrono::{DateTime, Utc};
use dejavu_engine::error::Result as EngineResult;
use dejavu_engine::{
    AnnotationSink, CapturedRequest, ClassificationDecision, EngineError, HistoryProvider,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::Path;

/// Stored proxy history plus the last highlight applied to each entry.
pub struct Database {
    conn: Connection,
}

fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

impl Database {
    pub fn drop(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- Intercepted requests, in arrival order
            CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    captured_at INTEGER NOT NULL,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    headers TEXT NOT NULL,    -- JSON array of [name, value]
    body TEXT
);

-- Last decision applied to each request
CREATE TABLE IF NOT EXISTS annotations (
    request_id INTEGER PRIMARY KEY,
    decision TEXT NOT NULL CHECK(decision IN ('unique', 'duplicate', 'static_asset', 'suppressed')),
    annotated_at INTEGER NOT NULL,
    FOREIGN KEY(request_id) REFERENCES requests(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_annotations_decision ON annotations(decision);
            ",
        )?;
        Ok(())
    }

    // Request history
    pub fn record_request(&self, record: &HistoryRecord) -> Result<i64> {
        insert_record(&self.conn, record)
    }

    /// Store `records` in one transaction; any invalid record rolls back all.
    pub fn record_requests(&mut self, records: &[HistoryRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for record in records {
            insert_record(&tx, record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Every stored request, oldest first, with its row id as `id`.
    pub fn records(&self) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, captured_at, method, url, headers, body FROM requests ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, captured_at, method, url, headers, body)| -> Result<HistoryRecord> {
                Ok(HistoryRecord {
                    id: Some(id as u64),
                    timestamp: DateTime::from_timestamp(captured_at, 0),
                    method,
                    url,
                    headers: serde_json::from_str(&headers)?,
                    body,
                })
            })
            .collect()
    }

    pub fn requests(&self) -> Result<Vec<CapturedRequest>> {
        self.records()?
            .iter()
            .map(HistoryRecord::to_request)
            .collect()
    }

    pub fn request_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM requests", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // Annotations
    pub fn set_annotation(&self, request_id: u64, decision: ClassificationDecision) -> Result<()> {
        self.conn.execute(
            "INSERT INTO annotations (request_id, decision, annotated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(request_id) DO UPDATE SET decision = excluded.decision, annotated_at = excluded.annotated_at",
            params![request_id as i64, decision.as_str(), current_timestamp()],
        )?;
        Ok(())
    }

    pub fn annotation(&self, request_id: u64) -> Result<Option<ClassificationDecision>> {
        let decision: Option<String> = self
            .conn
            .query_row(
                "SELECT decision FROM annotations WHERE request_id = ?1",
                params![request_id as i64],
                |row| row.get(0),
            )
            .optional()?;

        decision.map(|d| parse_decision(&d)).transpose()
    }

    pub fn annotations(&self) -> Result<Vec<(u64, ClassificationDecision)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT request_id, decision FROM annotations ORDER BY request_id")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, decision)| -> Result<(u64, ClassificationDecision)> {
                Ok((id as u64, parse_decision(&decision)?))
            })
            .collect()
    }

    pub fn annotation_counts(&self) -> Result<Vec<(ClassificationDecision, u64)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT decision, COUNT(*) FROM annotations GROUP BY decision")?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(decision, count)| -> Result<(ClassificationDecision, u64)> {
                Ok((parse_decision(&decision)?, count as u64))
            })
            .collect()
    }

    /// Remove every stored highlight. Returns how many were removed.
    pub fn clear_annotations(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM annotations", [])?)
    }
}

fn insert_record(conn: &Connection, record: &HistoryRecord) -> Result<i64> {
    // refuse anything the engine could not classify later
    record.to_request()?;

    let captured_at = record
        .timestamp
        .map(|t| t.timestamp())
        .unwrap_or_else(current_timestamp);
    let headers = serde_json::to_string(&record.headers)?;

    conn.execute(
        "INSERT INTO requests (captured_at, method, url, headers, body) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![captured_at, &record.method, &record.url, headers, &record.body],
    )?;

    Ok(conn.last_insert_rowid())
}

fn parse_decision(s: &str) -> Result<ClassificationDecision> {
    ClassificationDecision::parse(s).ok_or_else(|| CoreError::UnknownDecision(s.to_string()))
}

impl HistoryProvider for Database {
    fn history(&self) -> EngineResult<Vec<CapturedRequest>> {
        self.requests()
            .map_err(|e| EngineError::History(e.to_string()))
    }
}

impl AnnotationSink for Database {
    fn report(&self, request_id: u64, decision: ClassificationDecision) -> EngineResult<()> {
        self.set_annotation(request_id, decision)
            .map_err(|e| EngineError::Sink(e.to_string()))
    }
}
