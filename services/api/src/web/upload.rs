//! services/api/src/web/upload.rs
//!
//! Poster image upload for the authoring surface. Accepts a single
//! multipart file part, verifies the format by magic bytes (the
//! client-declared content type is not trusted), enforces the size cap,
//! and hands the bytes to the `FileStorage` port.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::state::AppState;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
}

/// Identifies the image format from its leading bytes. Returns the
/// canonical extension for accepted formats, `None` otherwise.
fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpg");
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }
    // RIFF....WEBP
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("webp");
    }
    None
}

/// POST /admin/uploads - store a poster image, returning its public URL.
#[utoipa::path(
    post,
    path = "/admin/uploads",
    request_body(content_type = "multipart/form-data", description = "The image to upload."),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 422, description = "Not a JPEG/PNG/WebP, over 5MB, or no file part"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read multipart data: {}", e)))?
        .ok_or_else(|| ApiError::Validation("Multipart form must include a file".to_string()))?;

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read file bytes: {}", e)))?;

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::Validation(format!(
            "File exceeds the {} byte limit",
            MAX_UPLOAD_BYTES
        )));
    }

    let extension = sniff_image(&data).ok_or_else(|| {
        ApiError::Validation("Only JPEG, PNG, and WebP images are accepted".to_string())
    })?;

    let url = state
        .storage
        .store(&format!("poster.{}", extension), &data)
        .await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_jpeg_png_webp() {
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), Some("jpg"));
        assert_eq!(
            sniff_image(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            Some("png")
        );

        let mut webp = Vec::new();
        webp.extend_from_slice(b"RIFF");
        webp.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        webp.extend_from_slice(b"WEBP");
        assert_eq!(sniff_image(&webp), Some("webp"));
    }

    #[test]
    fn rejects_other_formats() {
        assert_eq!(sniff_image(b"GIF89a"), None);
        assert_eq!(sniff_image(b"<svg xmlns"), None);
        assert_eq!(sniff_image(b""), None);
        // RIFF container that is not WebP (e.g. WAV audio).
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        wav.extend_from_slice(b"WAVE");
        assert_eq!(sniff_image(&wav), None);
    }
}
