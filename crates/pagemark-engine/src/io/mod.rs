use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::marker::HighlightId;
use crate::records::{HighlightRecord, HighlightStore, NewHighlight, StoreError, now_millis};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    highlights: Vec<HighlightRecord>,
}

/// Highlight store backed by one TOML file of `[[highlights]]` tables.
///
/// The file is read on every call, so several processes can share it as
/// long as they do not write at the same moment. A missing file is an empty
/// store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in the file, across all pages.
    pub fn all(&self) -> Result<Vec<HighlightRecord>, StoreError> {
        Ok(self.read()?.highlights)
    }

    fn read(&self) -> Result<StoreFile, StoreError> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, file: &StoreFile) -> Result<(), StoreError> {
        // Create parent directories if they don't exist
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(file)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl HighlightStore for FileStore {
    fn fetch(&self, page_url: &str) -> Result<Vec<HighlightRecord>, StoreError> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|record| record.belongs_to(page_url))
            .collect())
    }

    fn save(&mut self, highlight: NewHighlight) -> Result<HighlightRecord, StoreError> {
        let mut file = self.read()?;
        let record = HighlightRecord {
            id: HighlightId::new(Uuid::new_v4().to_string()),
            text: highlight.text,
            position: highlight.position,
            created_at: now_millis(),
        };
        file.highlights.push(record.clone());
        self.write(&file)?;
        Ok(record)
    }

    fn delete(&mut self, id: &HighlightId) -> Result<(), StoreError> {
        let mut file = self.read()?;
        let before = file.highlights.len();
        file.highlights.retain(|record| &record.id != id);
        if file.highlights.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.write(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn highlight(page: &str, text: &str) -> NewHighlight {
        NewHighlight {
            text: text.to_string(),
            position: format!("{page}?xpath=(startnode=/p[1],startoffset=0,endnode=/p[1],endoffset=5)"),
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("highlights.toml"));

        assert!(store.all().unwrap().is_empty());
        assert!(store.fetch("https://example.com").unwrap().is_empty());
    }

    #[test]
    fn records_survive_reopening() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("highlights.toml");
        let mut store = FileStore::new(&path);

        let saved = store.save(highlight("https://example.com/a", "Hello")).unwrap();
        store.save(highlight("https://example.com/b", "Other")).unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.fetch("https://example.com/a").unwrap(), vec![saved.clone()]);
        assert_eq!(reopened.all().unwrap().len(), 2);
        assert!(Uuid::parse_str(saved.id.as_str()).is_ok());
    }

    #[test]
    fn delete_removes_only_that_record() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("highlights.toml"));
        let first = store.save(highlight("u", "one")).unwrap();
        let second = store.save(highlight("u", "two")).unwrap();

        store.delete(&first.id).unwrap();

        assert_eq!(store.fetch("u").unwrap(), vec![second]);
        assert!(matches!(store.delete(&first.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("highlights.toml");
        fs::write(&path, "highlights = 3").unwrap();

        let err = FileStore::new(&path).all().unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
