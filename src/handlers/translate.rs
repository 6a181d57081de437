//! `POST /translate/`: text in, translated text and an audio reference out.
//!
//! Accepts the same fields urlencoded or as multipart form data:
//!
//! | field              | alias         | required |
//! |--------------------|---------------|----------|
//! | `text`             |               | yes      |
//! | `input_lang_code`  | `input_lang`  | yes      |
//! | `output_lang_code` | `output_lang` | yes      |
//! | `enhance`          |               | no (defaults to `true`) |

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;

use super::multipart::read_fields;
use crate::error::{AppError, AppResult};
use crate::pipeline::{parse_language_pair, EnhancementOutcome, TranslationRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranslateForm {
    pub text: String,
    #[serde(alias = "input_lang")]
    pub input_lang_code: String,
    #[serde(alias = "output_lang")]
    pub output_lang_code: String,
    #[serde(default = "default_enhance")]
    pub enhance: bool,
}

fn default_enhance() -> bool {
    true
}

pub async fn translate_form(
    state: web::Data<AppState>,
    form: web::Form<TranslateForm>,
) -> AppResult<HttpResponse> {
    run_translation(&state, form.into_inner()).await
}

pub async fn translate_multipart(
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let fields = read_fields(payload, state.config.limits.max_upload_bytes).await?;

    let required = |names: &[&str]| {
        fields
            .text(names)
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest(format!("Missing form field '{}'", names[0])))
    };
    let form = TranslateForm {
        text: required(&["text"])?,
        input_lang_code: required(&["input_lang_code", "input_lang"])?,
        output_lang_code: required(&["output_lang_code", "output_lang"])?,
        enhance: match fields.text(&["enhance"]) {
            Some(raw) => parse_flag(raw)?,
            None => default_enhance(),
        },
    };

    run_translation(&state, form).await
}

async fn run_translation(state: &AppState, form: TranslateForm) -> AppResult<HttpResponse> {
    let (source, target) = parse_language_pair(&form.input_lang_code, &form.output_lang_code)?;

    let outcome = state
        .pipeline
        .translate_and_speak(TranslationRequest {
            text: form.text,
            source,
            target,
            enhance: form.enhance,
        })
        .await?;

    state.record_artifact_stored();
    if matches!(outcome.enhancement, EnhancementOutcome::Failed { .. }) {
        state.record_enhancement_failure();
    }
    info!(artifact = %outcome.audio_file, %source, %target, "Translation served");

    Ok(HttpResponse::Ok().json(&outcome))
}

fn parse_flag(raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(AppError::BadRequest(format!(
            "Invalid value for 'enhance': {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{init_app, multipart_body};
    use crate::services::mock::{MockEnhancer, MockTranslator, MockSynthesizer, FAKE_MP3};
    use crate::testing::TestHarness;
    use actix_web::http::{header, StatusCode};
    use actix_web::test;
    use serde_json::Value;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_translate_then_fetch_audio_once() {
        let harness = TestHarness::new().await;
        let app = init_app!(harness.app_state());

        let req = test::TestRequest::post()
            .uri("/translate/")
            .set_form([
                ("text", "Hello, how are you?"),
                ("input_lang_code", "en"),
                ("output_lang_code", "es"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["original_text"], "Hello, how are you?");
        let translated = body["translated_text"].as_str().unwrap();
        assert!(!translated.is_empty());
        assert_ne!(translated, "Hello, how are you?");
        let audio_file = body["audio_file"].as_str().unwrap().to_string();
        assert!(audio_file.ends_with(".mp3"));

        let req = test::TestRequest::get()
            .uri(&format!("/audio/{}", audio_file))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "audio/mp3");
        let audio = test::read_body(resp).await;
        assert_eq!(audio.as_ref(), FAKE_MP3);

        let req = test::TestRequest::get()
            .uri(&format!("/audio/{}", audio_file))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_invalid_language_is_rejected_before_any_call() {
        let harness = TestHarness::new().await;
        let app = init_app!(harness.app_state());

        let req = test::TestRequest::post()
            .uri("/translate/")
            .set_form([
                ("text", "Hello"),
                ("input_lang_code", "xx"),
                ("output_lang_code", "es"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({"error": "Invalid language code"}));
        assert_eq!(harness.translator.call_count(), 0);
        assert_eq!(harness.synthesizer.call_count(), 0);
    }

    #[actix_web::test]
    async fn test_accepts_short_field_aliases() {
        let harness = TestHarness::new().await;
        let app = init_app!(harness.app_state());

        let req = test::TestRequest::post()
            .uri("/translate/")
            .set_form([("text", "Good morning"), ("input_lang", "en"), ("output_lang", "fr")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["translated_text"], "[fr] Good morning");
    }

    #[actix_web::test]
    async fn test_missing_field_is_json_400() {
        let harness = TestHarness::new().await;
        let app = init_app!(harness.app_state());

        let req = test::TestRequest::post()
            .uri("/translate/")
            .set_form([("text", "Hello"), ("input_lang_code", "en")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("output_lang_code"));
    }

    #[actix_web::test]
    async fn test_enhancement_failure_is_invisible_to_client() {
        let harness = TestHarness::new().await;
        let pipeline = harness.pipeline_with(Some(Arc::new(MockEnhancer::failing())), None);
        let state = harness.app_state_with(pipeline);
        let app = init_app!(state.clone());

        let req = test::TestRequest::post()
            .uri("/translate/")
            .set_form([
                ("text", "pt has fever"),
                ("input_lang_code", "en"),
                ("output_lang_code", "es"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["original_text"], "pt has fever");
        assert!(body.get("error").is_none());
        assert!(!body.to_string().contains("connection refused"));
        assert_eq!(harness.translator.last_text().as_deref(), Some("pt has fever"));
        assert_eq!(state.get_metrics_snapshot().enhancement_failures, 1);
    }

    #[actix_web::test]
    async fn test_synthesis_failure_is_500() {
        let harness =
            TestHarness::with_services(MockTranslator::default(), MockSynthesizer::failing()).await;
        let app = init_app!(harness.app_state());

        let req = test::TestRequest::post()
            .uri("/translate/")
            .set_form([("text", "Hello"), ("input_lang_code", "en"), ("output_lang_code", "es")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("synthesizing"));
        assert_eq!(harness.store.live_count().await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn test_multipart_form() {
        let harness = TestHarness::new().await;
        let app = init_app!(harness.app_state());

        let boundary = "translate-boundary";
        let body = multipart_body(
            boundary,
            &[
                ("text", None, b"Hello, how are you?"),
                ("input_lang", None, b"en"),
                ("output_lang", None, b"es"),
                ("enhance", None, b"false"),
            ],
        );
        let req = test::TestRequest::post()
            .uri("/translate/")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["translated_text"], "Hola, ¿cómo estás?");
    }

    #[::core::prelude::v1::test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag(" 0 ").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
