use rocket::fs::TempFile;

pub mod admin;
pub mod auth;
pub mod public;

/// Pull a multipart upload out of Rocket's temp file as (original name,
/// bytes) so it can be handed to the storage backend. The temp file itself
/// may be memory-backed, so it is copied out rather than persisted.
pub(crate) async fn read_upload(file: &mut TempFile<'_>) -> Result<(String, Vec<u8>), String> {
    let original_name = file
        .raw_name()
        .map(|n| n.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let tmp = std::env::temp_dir().join(format!("skyline-upload-{}", uuid::Uuid::new_v4()));
    file.copy_to(&tmp).await.map_err(|e| e.to_string())?;
    let bytes = std::fs::read(&tmp).map_err(|e| e.to_string());
    let _ = std::fs::remove_file(&tmp);

    Ok((original_name, bytes?))
}

/// Basename of an upload, stripped of any client-side directory parts.
pub(crate) fn upload_basename(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .to_string()
}
