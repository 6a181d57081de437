//! HTTP surface of the translator.
//!
//! Routes are registered through [`configure`] so `main` and the handler
//! tests build exactly the same application.

pub mod audio;
pub mod enhance;
pub mod languages;
pub mod multipart;
pub mod transcribe;
pub mod translate;

use actix_web::{error, guard, http::header, web, HttpRequest};

use crate::error::AppError;
use crate::health;

pub use audio::get_audio;
pub use enhance::enhance_transcription;
pub use languages::list_languages;
pub use transcribe::transcribe_audio;
pub use translate::{translate_form, translate_multipart};

/// Register every route plus the extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(form_error))
        .service(
            web::resource("/translate/")
                .route(
                    web::post()
                        .guard(guard::fn_guard(is_multipart))
                        .to(translate_multipart),
                )
                .route(web::post().to(translate_form)),
        )
        .route("/audio/{filename}", web::get().to(get_audio))
        .route("/enhance-transcription/", web::post().to(enhance_transcription))
        .route("/transcribe/", web::post().to(transcribe_audio))
        .route("/languages", web::get().to(list_languages))
        .route("/health", web::get().to(health::health_check))
        .route("/metrics", web::get().to(health::detailed_metrics));
}

fn is_multipart(ctx: &guard::GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

fn form_error(err: error::UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(format!("Invalid form data: {}", err)).into()
}
