use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

use super::{AssetStorage, StorageError};
use crate::config::StorageConfig;

/// Filesystem backend with the same contract as the remote adapter. Used
/// directly in local development and as the dev-mode fallback when the
/// remote host is unusable.
pub struct LocalStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalStorage {
    pub fn new(config: &StorageConfig) -> LocalStorage {
        LocalStorage {
            root: PathBuf::from(&config.local_root),
            public_base: config.local_public_base.clone(),
        }
    }

    pub fn at(root: impl Into<PathBuf>, public_base: &str) -> LocalStorage {
        LocalStorage {
            root: root.into(),
            public_base: public_base.to_string(),
        }
    }

    /// Strip path traversal and leading separators from a caller-supplied
    /// name. Empty results get a generated identifier.
    fn sanitize(name: &str) -> String {
        let cleaned: Vec<&str> = name
            .split('/')
            .filter(|part| !part.is_empty() && *part != "." && *part != "..")
            .collect();
        if cleaned.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            cleaned.join("/")
        }
    }

    /// An on-disk name that does not collide with an existing file; a short
    /// random suffix is inserted before the extension when needed.
    fn available_name(&self, name: &str) -> String {
        if !self.root.join(name).exists() {
            return name.to_string();
        }
        let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
        match name.rsplit_once('.') {
            Some((stem, ext)) => format!("{}_{}.{}", stem, suffix, ext),
            None => format!("{}_{}", name, suffix),
        }
    }

    fn full_path(&self, name: &str) -> PathBuf {
        self.root.join(Self::sanitize(name))
    }

    fn file_time(
        path: &Path,
        pick: fn(&fs::Metadata) -> std::io::Result<std::time::SystemTime>,
    ) -> Result<NaiveDateTime, StorageError> {
        let meta = fs::metadata(path).map_err(|e| StorageError::Io(e.to_string()))?;
        let time = pick(&meta).map_err(|e| StorageError::Io(e.to_string()))?;
        let dt: DateTime<Utc> = time.into();
        Ok(dt.naive_utc())
    }
}

impl AssetStorage for LocalStorage {
    fn save(&self, name: &str, content: &[u8]) -> Result<String, StorageError> {
        let clean = Self::sanitize(name);
        let stored = self.available_name(&clean);
        let path = self.root.join(&stored);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        fs::write(&path, content).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(stored)
    }

    fn delete(&self, name: &str) -> bool {
        match fs::remove_file(self.full_path(name)) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Failed to delete local file {}: {}", name, e);
                false
            }
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.full_path(name).is_file()
    }

    fn url(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        if name.starts_with("http") {
            return Some(name.to_string());
        }
        Some(format!(
            "{}/{}",
            self.public_base.trim_end_matches('/'),
            name.trim_start_matches('/')
        ))
    }

    fn size(&self, name: &str) -> u64 {
        fs::metadata(self.full_path(name))
            .map(|m| m.len())
            .unwrap_or(0)
    }

    fn accessed_time(&self, name: &str) -> Result<NaiveDateTime, StorageError> {
        Self::file_time(&self.full_path(name), fs::Metadata::accessed)
    }

    fn created_time(&self, name: &str) -> Result<NaiveDateTime, StorageError> {
        Self::file_time(&self.full_path(name), fs::Metadata::created)
    }

    fn modified_time(&self, name: &str) -> Result<NaiveDateTime, StorageError> {
        Self::file_time(&self.full_path(name), fs::Metadata::modified)
    }
}
