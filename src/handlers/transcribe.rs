use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

use super::multipart::read_fields;
use crate::error::{AppError, AppResult};
use crate::language::LanguageCode;
use crate::pipeline::INVALID_LANGUAGE_MESSAGE;
use crate::state::AppState;

/// Recognize speech in an uploaded recording.
///
/// ## Endpoint: `POST /transcribe/`
///
/// ## Request:
/// Multipart form data with an audio file field named `audio` and the
/// spoken language in `input_lang_code` (or `input_lang`).
///
/// ## Response:
/// ```json
/// { "text": "I have had a headache since yesterday" }
/// ```
///
/// Audio the recognizer cannot make sense of answers 400 with
/// `"Sorry, the audio was not clear enough to recognize."`.
pub async fn transcribe_audio(
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let max_upload_bytes = state.config.limits.max_upload_bytes;
    let mut fields = read_fields(payload, max_upload_bytes).await?;

    let language = fields
        .text(&["input_lang_code", "input_lang"])
        .ok_or_else(|| AppError::BadRequest("Missing form field 'input_lang_code'".to_string()))?
        .parse::<LanguageCode>()
        .map_err(|_| AppError::ValidationError(INVALID_LANGUAGE_MESSAGE.to_string()))?;

    let upload = fields
        .take_file("audio")
        .ok_or_else(|| AppError::ValidationError("No audio file provided".to_string()))?;
    if upload.bytes.is_empty() {
        return Err(AppError::ValidationError("Audio file is empty".to_string()));
    }

    let audio_bytes = upload.bytes.len();
    let text = state
        .pipeline
        .transcribe(upload.bytes, &upload.filename, language)
        .await?;
    info!(%language, audio_bytes, chars = text.chars().count(), "Transcription served");

    Ok(HttpResponse::Ok().json(json!({ "text": text })))
}
