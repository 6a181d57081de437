use std::collections::HashMap;

use actix_multipart::{Field, Multipart};
use futures_util::stream::StreamExt;

use crate::error::AppError;

/// A file part of a multipart upload.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Every part of a multipart body, split into text fields and file uploads.
#[derive(Debug, Default)]
pub struct MultipartFields {
    pub texts: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartFields {
    /// First present text field among `names`, so aliases can be accepted.
    pub fn text(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.texts.get(*name))
            .map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Drain a multipart payload, rejecting bodies larger than `max_bytes`.
///
/// Parts with a filename are kept as raw bytes; all others must be UTF-8.
pub async fn read_fields(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<MultipartFields, AppError> {
    let mut fields = MultipartFields::default();
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field: Field =
            item.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        let content_disposition = field
            .content_disposition()
            .ok_or_else(|| AppError::BadRequest("Missing content disposition".to_string()))?;
        let field_name = content_disposition
            .get_name()
            .ok_or_else(|| AppError::BadRequest("Missing field name".to_string()))?
            .to_string();
        let filename = content_disposition.get_filename().map(|s| s.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(format!("Chunk error: {}", e)))?;
            total += chunk.len();
            if total > max_bytes {
                return Err(AppError::ValidationError(format!(
                    "Upload too large (max: {} bytes)",
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) => {
                fields
                    .files
                    .insert(field_name, UploadedFile { filename, bytes });
            }
            None => {
                let value = String::from_utf8(bytes).map_err(|_| {
                    AppError::BadRequest(format!("Field '{}' is not valid UTF-8", field_name))
                })?;
                fields.texts.insert(field_name, value);
            }
        }
    }

    Ok(fields)
}
