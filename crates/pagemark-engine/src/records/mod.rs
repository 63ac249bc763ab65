//! Saved highlights and the store that owns them.
//!
//! The engine never owns persisted highlights. It receives
//! [`HighlightRecord`]s from a [`HighlightStore`], asks the store to save new
//! ones, and asks it to delete them again.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anchoring::{PositionDescriptor, decode};
use crate::error::AnchorError;
use crate::marker::HighlightId;

/// A persisted highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRecord {
    pub id: HighlightId,
    /// The text covered when the highlight was captured.
    pub text: String,
    /// Position descriptor in its wire format.
    pub position: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
}

impl HighlightRecord {
    pub fn descriptor(&self) -> Result<PositionDescriptor, AnchorError> {
        decode(&self.position)
    }

    /// Whether this record was captured on `page_url`.
    pub fn belongs_to(&self, page_url: &str) -> bool {
        self.position
            .strip_prefix(page_url)
            .is_some_and(|rest| rest.starts_with("?xpath="))
    }
}

/// What a caller hands the store to save; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHighlight {
    pub text: String,
    pub position: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Highlight not found: {0}")]
    NotFound(HighlightId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse highlight store {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize highlights: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Highlight store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for highlights.
///
/// A failed `fetch` is not fatal to a page: callers treat it as "no saved
/// highlights" for that load.
pub trait HighlightStore {
    /// Records captured on `page_url`, in the order they were saved.
    fn fetch(&self, page_url: &str) -> Result<Vec<HighlightRecord>, StoreError>;

    fn save(&mut self, highlight: NewHighlight) -> Result<HighlightRecord, StoreError>;

    fn delete(&mut self, id: &HighlightId) -> Result<(), StoreError>;
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// In-process store handing out ids `h1`, `h2`, ...
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<HighlightRecord>,
    issued: u64,
}

impl MemoryStore {
    /// Seed the store. New ids continue after the highest `h<N>` present.
    pub fn with_records(records: Vec<HighlightRecord>) -> Self {
        let issued = records
            .iter()
            .filter_map(|record| record.id.as_str().strip_prefix('h')?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self { records, issued }
    }

    pub fn records(&self) -> &[HighlightRecord] {
        &self.records
    }
}

impl HighlightStore for MemoryStore {
    fn fetch(&self, page_url: &str) -> Result<Vec<HighlightRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.belongs_to(page_url))
            .cloned()
            .collect())
    }

    fn save(&mut self, highlight: NewHighlight) -> Result<HighlightRecord, StoreError> {
        self.issued += 1;
        let record = HighlightRecord {
            id: HighlightId::new(format!("h{}", self.issued)),
            text: highlight.text,
            position: highlight.position,
            created_at: now_millis(),
        };
        self.records.push(record.clone());
        Ok(record)
    }

    fn delete(&mut self, id: &HighlightId) -> Result<(), StoreError> {
        let before = self.records.len();
        self.records.retain(|record| &record.id != id);
        if self.records.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}
