use chrono::NaiveDateTime;

use crate::config::StorageConfig;

pub mod imagekit;
pub mod local;

pub use imagekit::ImageKitStorage;
pub use local::LocalStorage;

/// Extensions routed to the images folder and uploaded as base64 data URIs.
const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Extensions routed to the documents folder.
const DOC_EXTS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf"];

#[derive(Debug)]
pub enum StorageError {
    /// Remote host unreachable, auth rejected, or a response with no
    /// extractable identifier. Recovered via local fallback only in
    /// permissive mode; otherwise surfaced as a failed save.
    Unavailable(String),
    /// Delete failures are reported as a boolean by the trait; this variant
    /// only exists for internal plumbing and logging.
    DeleteFailed(String),
    /// Queries the backend cannot answer. Never silently approximated.
    Unsupported(&'static str),
    Io(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {}", msg),
            StorageError::DeleteFailed(msg) => write!(f, "delete failed: {}", msg),
            StorageError::Unsupported(op) => write!(f, "operation not supported: {}", op),
            StorageError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Pluggable media backend. Content-management code saves, deletes, and
/// resolves uploaded files exclusively through this trait.
pub trait AssetStorage: Send + Sync {
    /// Persist `content` and return the stored name used for later `url`
    /// and `delete` calls. The stored name is never the input `name`: a
    /// fresh collision-resistant identifier is generated per upload.
    fn save(&self, name: &str, content: &[u8]) -> Result<String, StorageError>;

    /// Delete by stored name. Never raises: a failed remote delete must not
    /// block deletion of the owning record. Failures are logged and
    /// reported as `false`.
    fn delete(&self, name: &str) -> bool;

    fn exists(&self, name: &str) -> bool;

    /// Resolve a stored name to a fetchable URL. Absolute inputs pass
    /// through unchanged; empty inputs resolve to `None`.
    fn url(&self, name: &str) -> Option<String>;

    /// Size in bytes; backends without a size primitive return 0, which
    /// callers must not treat as meaningful.
    fn size(&self, name: &str) -> u64;

    fn accessed_time(&self, name: &str) -> Result<NaiveDateTime, StorageError>;
    fn created_time(&self, name: &str) -> Result<NaiveDateTime, StorageError>;
    fn modified_time(&self, name: &str) -> Result<NaiveDateTime, StorageError>;
}

/// Destination folder for an upload, classified from the filename.
/// Extension rules win over the substring rules.
pub fn folder_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let ext = lower.rsplit('.').next().filter(|e| lower.contains('.'));

    if let Some(ext) = ext {
        if IMAGE_EXTS.contains(&ext) {
            return "skyline/images";
        }
        if DOC_EXTS.contains(&ext) {
            return "skyline/documents";
        }
    }
    if lower.contains("profile") {
        return "skyline/profiles";
    }
    if lower.contains("service") {
        return "skyline/services";
    }
    "skyline/uploads"
}

/// Collision-resistant file identifier: random UUID plus the original
/// extension when one is present.
pub fn unique_file_id(name: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => format!("{}.{}", id, ext),
        _ => id.to_string(),
    }
}

/// MIME type guessed from the extension; octet-stream when unknown.
pub fn mime_type_for(name: &str) -> String {
    let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
    rocket::http::ContentType::from_extension(&ext)
        .map(|ct| ct.media_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

pub fn is_image(name: &str) -> bool {
    mime_type_for(name).starts_with("image/")
}

/// The composed backend handed to the rest of the application: remote CDN
/// when configured, local disk otherwise, with remote failures degrading to
/// local disk only in permissive (dev) mode.
pub struct MediaStorage {
    remote: Option<ImageKitStorage>,
    local: LocalStorage,
    local_fallback: bool,
}

impl MediaStorage {
    pub fn from_config(config: &StorageConfig) -> MediaStorage {
        let remote = match ImageKitStorage::new(config) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("Remote storage not initialized: {}", e);
                None
            }
        };
        MediaStorage {
            remote,
            local: LocalStorage::new(config),
            local_fallback: config.local_fallback,
        }
    }

    #[cfg(test)]
    pub fn local_only(local: LocalStorage) -> MediaStorage {
        MediaStorage {
            remote: None,
            local,
            local_fallback: true,
        }
    }
}

impl AssetStorage for MediaStorage {
    fn save(&self, name: &str, content: &[u8]) -> Result<String, StorageError> {
        match &self.remote {
            Some(remote) => match remote.save(name, content) {
                Ok(stored) => Ok(stored),
                Err(e) if self.local_fallback => {
                    log::warn!("Remote save failed ({}), falling back to local storage", e);
                    self.local.save(name, content)
                }
                Err(e) => Err(e),
            },
            // Remote client never initialized: behave like the permissive
            // path regardless of mode, matching the adapter this replaces.
            None => self.local.save(name, content),
        }
    }

    fn delete(&self, name: &str) -> bool {
        match &self.remote {
            Some(remote) => remote.delete(name),
            None => self.local.delete(name),
        }
    }

    fn exists(&self, name: &str) -> bool {
        match &self.remote {
            Some(remote) => remote.exists(name),
            None => self.local.exists(name),
        }
    }

    fn url(&self, name: &str) -> Option<String> {
        match &self.remote {
            Some(remote) => remote.url(name),
            None => self.local.url(name),
        }
    }

    fn size(&self, name: &str) -> u64 {
        match &self.remote {
            Some(remote) => remote.size(name),
            None => self.local.size(name),
        }
    }

    fn accessed_time(&self, name: &str) -> Result<NaiveDateTime, StorageError> {
        match &self.remote {
            Some(remote) => remote.accessed_time(name),
            None => self.local.accessed_time(name),
        }
    }

    fn created_time(&self, name: &str) -> Result<NaiveDateTime, StorageError> {
        match &self.remote {
            Some(remote) => remote.created_time(name),
            None => self.local.created_time(name),
        }
    }

    fn modified_time(&self, name: &str) -> Result<NaiveDateTime, StorageError> {
        match &self.remote {
            Some(remote) => remote.modified_time(name),
            None => self.local.modified_time(name),
        }
    }
}
