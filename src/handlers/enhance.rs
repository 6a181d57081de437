use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::pipeline::{EnhancementOutcome, SkipReason};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    pub text: String,
}

/// `POST /enhance-transcription/` with a JSON `{"text": ...}` body.
///
/// Always answers 200: `{"enhanced_text": ...}` on success, `{"error": ...}`
/// otherwise. The body is parsed by hand so that malformed JSON is reported
/// the same way.
pub async fn enhance_transcription(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request: EnhanceRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return enhancement_error(format!("Invalid request body: {}", e)),
    };
    if request.text.trim().is_empty() {
        return enhancement_error("Text must not be empty".to_string());
    }

    match state.pipeline.enhance(&request.text).await {
        EnhancementOutcome::Enhanced(enhanced_text) => {
            HttpResponse::Ok().json(json!({ "enhanced_text": enhanced_text }))
        }
        EnhancementOutcome::Skipped(SkipReason::NotConfigured | SkipReason::NotRequested) => {
            enhancement_error("Transcription enhancement is not configured".to_string())
        }
        EnhancementOutcome::Failed { reason } => {
            state.record_enhancement_failure();
            enhancement_error(reason)
        }
    }
}

fn enhancement_error(message: String) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "error": message }))
}
