// JSON-lines capture files: one intercepted request per line

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use dejavu_engine::error::Result as EngineResult;
use dejavu_engine::{CapturedRequest, EngineError, HistoryProvider};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A stored request as it appears in capture files and the history database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub method: String,
    pub url: String,
    /// `[name, value]` pairs in wire order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl HistoryRecord {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            id: None,
            timestamp: None,
            method: method.to_string(),
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    /// Rebuild the request the engine classifies.
    ///
    /// Query, cookie and form parameters are derived the same way the
    /// interception side derives them.
    pub fn to_request(&self) -> Result<CapturedRequest> {
        let mut request = CapturedRequest::from_url(&self.method, &self.url)
            .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", self.url, e)))?
            .with_id(self.id.unwrap_or_default());

        for (name, value) in &self.headers {
            request = request.with_header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = self.body {
            request = request.with_body(body.as_bytes());
        }

        Ok(request)
    }
}

/// A capture file loaded into memory, in file order.
#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
    records: Vec<HistoryRecord>,
}

impl HistoryFile {
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let records = Self::parse(&content)?;
        debug!("Loaded {} records from {}", records.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Parse JSON-lines content. Blank lines are skipped; records without an
    /// id are numbered by their position among the records.
    pub fn parse(content: &str) -> Result<Vec<HistoryRecord>> {
        let mut records = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut record: HistoryRecord =
                serde_json::from_str(line).map_err(|e| CoreError::InvalidRecord {
                    line: line_number,
                    reason: e.to_string(),
                })?;
            if record.id.is_none() {
                record.id = Some(records.len() as u64 + 1);
            }
            record.to_request().map_err(|e| CoreError::InvalidRecord {
                line: line_number,
                reason: e.to_string(),
            })?;

            records.push(record);
        }

        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn requests(&self) -> Result<Vec<CapturedRequest>> {
        self.records.iter().map(HistoryRecord::to_request).collect()
    }
}

impl HistoryProvider for HistoryFile {
    fn history(&self) -> EngineResult<Vec<CapturedRequest>> {
        self.requests()
            .map_err(|e| EngineError::History(format!("{}: {}", self.path.display(), e)))
    }
}
