use actix_web::{web, HttpResponse};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// `GET /audio/{filename}`: decrypt, serve and delete a stored artifact.
///
/// Every artifact is served at most once. Unknown, already served and
/// undecryptable names all answer 500 with `{"error": ...}`.
pub async fn get_audio(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let filename = path.into_inner();

    let audio = state
        .store
        .retrieve_named(&filename)
        .await
        .map_err(|e| {
            let err = AppError::from(e);
            warn!(artifact = %filename, error = %err, "Audio retrieval failed");
            err
        })?;

    state.record_artifact_served();
    info!(artifact = %filename, audio_bytes = audio.len(), "Audio served");

    Ok(HttpResponse::Ok().content_type("audio/mp3").body(audio))
}
