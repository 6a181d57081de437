use actix_web::HttpResponse;
use serde_json::json;

use crate::language::LanguageCode;

/// `GET /languages`: every language the translator accepts.
pub async fn list_languages() -> HttpResponse {
    let languages: Vec<_> = LanguageCode::ALL
        .iter()
        .map(|language| json!({ "code": language.code(), "name": language.name() }))
        .collect();

    HttpResponse::Ok().json(json!({ "languages": languages }))
}
