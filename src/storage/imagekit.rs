use std::time::Duration;

use base64::Engine as _;
use chrono::NaiveDateTime;
use reqwest::blocking::multipart::{Form, Part};
use serde_json::Value;

use super::{folder_for, is_image, mime_type_for, unique_file_id, AssetStorage, StorageError};
use crate::config::StorageConfig;

const UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1/files/upload";
const FILES_API_URL: &str = "https://api.imagekit.io/v1/files";

/// Upload response decoded once at the network boundary. The remote host
/// answers with one of three shapes; downstream code only ever sees this
/// enum, never the raw JSON.
#[derive(Debug, PartialEq)]
pub enum UploadReply {
    /// Full path including the folder structure.
    FilePath(String),
    /// Bare file name; the path is reconstructed from the request folder.
    Name(String),
    /// Raw metadata map with a file-path-like key buried inside.
    Raw(serde_json::Map<String, Value>),
}

impl UploadReply {
    pub fn parse(body: &Value) -> UploadReply {
        if let Some(path) = body.get("filePath").and_then(|v| v.as_str()) {
            return UploadReply::FilePath(path.to_string());
        }
        if let Some(name) = body.get("name").and_then(|v| v.as_str()) {
            return UploadReply::Name(name.to_string());
        }
        UploadReply::Raw(body.as_object().cloned().unwrap_or_default())
    }

    /// Stored-name extraction, in fixed preference order: full returned
    /// path, then folder + returned name, then folder + the locally
    /// generated id. The order is a compatibility contract with the remote
    /// host's response shapes.
    pub fn stored_name(&self, folder: &str, file_id: &str) -> String {
        match self {
            UploadReply::FilePath(path) => path.trim_start_matches('/').to_string(),
            UploadReply::Name(name) => {
                format!("{}/{}", folder.trim_matches('/'), name)
            }
            UploadReply::Raw(map) => {
                if let Some(path) = map.get("filePath").and_then(|v| v.as_str()) {
                    path.trim_start_matches('/').to_string()
                } else if let Some(name) = map.get("name").and_then(|v| v.as_str()) {
                    format!("{}/{}", folder.trim_matches('/'), name)
                } else {
                    format!("{}/{}", folder.trim_matches('/'), file_id)
                }
            }
        }
    }
}

/// Storage backend for the ImageKit CDN. Uploads go to the upload API with
/// unique-name enforcement; URLs are resolved against the configured
/// endpoint without any network call.
pub struct ImageKitStorage {
    client: reqwest::blocking::Client,
    endpoint: String,
    private_key: String,
}

impl ImageKitStorage {
    pub fn new(config: &StorageConfig) -> Result<ImageKitStorage, StorageError> {
        if config.url_endpoint.is_empty() || config.private_key.is_empty() {
            return Err(StorageError::Unavailable(
                "ImageKit endpoint or private key not configured".to_string(),
            ));
        }
        if url::Url::parse(&config.url_endpoint).is_err() {
            return Err(StorageError::Unavailable(format!(
                "invalid ImageKit endpoint: {}",
                config.url_endpoint
            )));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(ImageKitStorage {
            client,
            endpoint: config.url_endpoint.clone(),
            private_key: config.private_key.clone(),
        })
    }

    /// Trailing path segment of a stored name, used as the remote file id
    /// for deletion.
    fn file_id_of(name: &str) -> &str {
        name.rsplit('/').next().unwrap_or(name)
    }
}

impl AssetStorage for ImageKitStorage {
    fn save(&self, name: &str, content: &[u8]) -> Result<String, StorageError> {
        let name = if name.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            name.to_string()
        };

        let folder = folder_for(&name);
        let file_id = unique_file_id(&name);

        // ImageKit wants inline image data as a base64 data URI; everything
        // else goes up as raw bytes.
        let form = Form::new()
            .text("fileName", file_id.clone())
            .text("folder", format!("/{}/", folder))
            .text("useUniqueFileName", "true");
        let form = if is_image(&name) {
            let encoded = base64::engine::general_purpose::STANDARD.encode(content);
            let data_uri = format!("data:{};base64,{}", mime_type_for(&name), encoded);
            form.text("file", data_uri)
        } else {
            form.part("file", Part::bytes(content.to_vec()).file_name(file_id.clone()))
        };

        let resp = self
            .client
            .post(UPLOAD_URL)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StorageError::Unavailable(format!(
                "upload returned {}",
                status
            )));
        }

        // A 2xx with an unreadable body still means the upload most likely
        // landed; fall through to the constructed path in that case.
        let stored = match resp.json::<Value>() {
            Ok(body) => UploadReply::parse(&body).stored_name(folder, &file_id),
            Err(e) => {
                log::warn!("Unreadable upload response ({}), using constructed path", e);
                format!("{}/{}", folder, file_id)
            }
        };

        log::info!("Uploaded file: {}", stored);
        Ok(stored)
    }

    fn delete(&self, name: &str) -> bool {
        let file_id = Self::file_id_of(name);

        match self
            .client
            .delete(format!("{}/{}", FILES_API_URL, file_id))
            .basic_auth(&self.private_key, Some(""))
            .send()
        {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    log::info!("Deleted file: {}", name);
                    true
                } else if status.is_client_error() || status.is_server_error() {
                    log::warn!("Failed to delete {}: {}", name, status);
                    false
                } else {
                    // Unrecognized but not an error — assume the delete
                    // went through.
                    log::info!("Assuming {} was deleted (status {})", name, status);
                    true
                }
            }
            Err(e) => {
                log::warn!("Error deleting {}: {}", name, e);
                false
            }
        }
    }

    /// The remote host has no existence-check primitive. Always answering
    /// `false` keeps every caller on the re-upload-with-fresh-name path
    /// instead of trusting a stale existence assumption.
    fn exists(&self, _name: &str) -> bool {
        false
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
            self.endpoint.trim_end_matches('/'),
            name.trim_start_matches('/')
        ))
    }

    /// No size API either; 0 is a sentinel, not a measurement.
    fn size(&self, _name: &str) -> u64 {
        0
    }

    fn accessed_time(&self, _name: &str) -> Result<NaiveDateTime, StorageError> {
        Err(StorageError::Unsupported("accessed time"))
    }

    fn created_time(&self, _name: &str) -> Result<NaiveDateTime, StorageError> {
        Err(StorageError::Unsupported("created time"))
    }

    fn modified_time(&self, _name: &str) -> Result<NaiveDateTime, StorageError> {
        Err(StorageError::Unsupported("modified time"))
    }
}
