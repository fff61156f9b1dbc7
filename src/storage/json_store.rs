//! Persistence of the grades database as a single JSON blob.
//!
//! Load-at-start, save-on-change: the core works on plain data and does
//! not care where it is persisted. A missing file is an empty database,
//! not an error.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::SubjectMap;

pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> AppResult<SubjectMap> {
        if !self.path.exists() {
            return Ok(SubjectMap::new());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|source| {
            AppError::StoreRead {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        let map: SubjectMap =
            serde_json::from_str(&content).map_err(|source| AppError::StoreCorrupt {
                path: self.path.display().to_string(),
                source,
            })?;

        info!("{} matérias carregadas de {}", map.len(), self.path.display());
        Ok(map)
    }

    pub async fn save(&self, map: &SubjectMap) -> AppResult<()> {
        let content = serde_json::to_string_pretty(map).map_err(|source| {
            AppError::StoreCorrupt {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        fs::write(&self.path, content).await.map_err(|source| {
            AppError::StoreWrite {
                path: self.path.display().to_string(),
                source,
            }
        })?;
        Ok(())
    }

    /// Explicit user reset: the database goes back to empty.
    pub async fn clear(&self) -> AppResult<()> {
        self.save(&SubjectMap::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::YearRecord;

    fn temp_store(name: &str) -> JsonStore {
        let mut path = std::env::temp_dir();
        path.push(format!("notas_test_{}_{}.json", name, std::process::id()));
        JsonStore::new(path)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_database() {
        let store = temp_store("missing");
        let map = store.load().await.unwrap();
        assert!(map.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let store = temp_store("round_trip");

        let mut map = SubjectMap::new();
        let mut record = YearRecord::default();
        record.b1.monthly_test = Some("7.50".to_string());
        record.b2.bimester_test = Some("".to_string());
        map.insert("Física".to_string(), record);

        store.save(&map).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, map);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());

        let _ = fs::remove_file(store.path()).await;
    }
}
