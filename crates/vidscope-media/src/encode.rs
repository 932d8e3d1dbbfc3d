//! Frame encoding.

use std::path::Path;

use vidscope_models::ImagePayload;

use crate::error::{MediaError, MediaResult};

/// Mime type for an image path, by extension. Defaults to JPEG.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Read an image file and base64-encode it.
pub async fn encode_frame(path: &Path) -> MediaResult<ImagePayload> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MediaError::FileNotFound(path.to_path_buf())
        } else {
            MediaError::Io(e)
        }
    })?;
    Ok(ImagePayload::from_bytes(mime_type_for(path), &bytes))
}
