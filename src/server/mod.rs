pub mod form;
pub mod handlers;

use crate::{
    config::Config, error::MangaError, manga::GenerationService, models::ErrorResponse,
};
use actix_cors::Cors;
use actix_files::Files;
use actix_web::{
    guard,
    http::{header, StatusCode},
    middleware::{DefaultHeaders, Logger},
    web, App, HttpResponse, HttpServer, ResponseError,
};

/// Matches the limit the frontend has always been held to.
pub const JSON_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub service: GenerationService,
}

impl AppState {
    pub fn new(service: GenerationService) -> Self {
        Self { service }
    }
}

// Every failure surfaces to API callers as a 400.
impl ResponseError for MangaError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.user_message()))
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            log::warn!("Rejected generate request: {}", err);
            let response = HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));
            actix_web::error::InternalError::from_response(err, response).into()
        })
}

fn is_multipart(ctx: &guard::GuardContext<'_>) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.starts_with("multipart/form-data"))
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .route("/health", web::get().to(handlers::health))
            .service(
                web::resource("/generate")
                    .route(
                        web::post()
                            .guard(guard::fn_guard(is_multipart))
                            .to(handlers::generate_multipart),
                    )
                    .route(web::post().to(handlers::generate_json)),
            ),
    );
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(GenerationService::from_config(&config)));

    let output_dir = config.storage.output_dir();
    std::fs::create_dir_all(&output_dir)?;
    let public_prefix = config.storage.public_prefix().to_string();

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cross-Origin-Resource-Policy", "cross-origin"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin-allow-popups")),
            )
            .wrap(Cors::permissive())
            .wrap(Logger::new("%r %s %b - %D ms"))
            .configure(configure)
            .service(Files::new(&public_prefix, output_dir.clone()))
    })
    .bind((config.host().to_string(), config.port()))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::error::Result;
    use crate::gemini::ImageProvider;
    use crate::models::gemini::{
        Candidate, CandidateContent, GenerateContentResponse, InlineData, ResponsePart,
    };
    use crate::models::ContentPart;
    use crate::storage::LocalImageStorage;
    use actix_web::test;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    struct StubProvider {
        outcome: std::result::Result<String, String>,
        last_parts: Mutex<Vec<ContentPart>>,
    }

    #[async_trait]
    impl ImageProvider for StubProvider {
        fn name(&self) -> &str {
            "gemini"
        }

        async fn generate_content(
            &self,
            _api_key: &str,
            parts: &[ContentPart],
        ) -> Result<GenerateContentResponse> {
            *self.last_parts.lock().unwrap() = parts.to_vec();
            let data = self.outcome.clone().map_err(MangaError::Provider)?;
            Ok(GenerateContentResponse {
                candidates: vec![Candidate {
                    content: Some(CandidateContent {
                        parts: vec![ResponsePart {
                            text: None,
                            inline_data: Some(InlineData {
                                mime_type: Some("image/png".into()),
                                data: Some(data),
                            }),
                        }],
                    }),
                    finish_reason: None,
                }],
                prompt_feedback: None,
            })
        }
    }

    fn state(
        dir: &Path,
        outcome: std::result::Result<&str, &str>,
        api_key: Option<&str>,
    ) -> (web::Data<AppState>, Arc<StubProvider>) {
        let provider = Arc::new(StubProvider {
            outcome: outcome.map(String::from).map_err(String::from),
            last_parts: Mutex::new(Vec::new()),
        });
        let service = GenerationService::new(
            provider.clone(),
            Arc::new(LocalImageStorage::new(
                &StorageConfig::new().with_output_dir(dir),
            )),
            api_key.map(String::from),
        );
        (web::Data::new(AppState::new(service)), provider)
    }

    #[actix_web::test]
    async fn test_health() {
        let tmp = tempfile::tempdir().unwrap();
        let (data, _) = state(tmp.path(), Ok("QUJD"), Some("key"));
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "ok", "provider": "gemini"}));
    }

    #[actix_web::test]
    async fn test_json_generate_success() {
        let tmp = tempfile::tempdir().unwrap();
        let (data, provider) = state(tmp.path(), Ok("QUJD"), Some("key"));
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "genre": "fantasy",
                "prompt": "a dragon",
                "count": 3,
                "refinementOptions": "{bad json"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], true);
        let url = body["imageUrl"].as_str().unwrap();
        assert!(url.starts_with("/public/output/manga-"));
        assert!(url.ends_with(".png"));
        assert_eq!(
            body["meta"],
            json!({"genre": "fantasy", "count": 3, "mode": "text2img", "refinementOptions": null})
        );

        let file_name = url.rsplit('/').next().unwrap();
        assert_eq!(std::fs::read(tmp.path().join(file_name)).unwrap(), b"ABC");

        let sent = provider.last_parts.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            ContentPart::Text(text) => assert!(!text.contains("Refinement:")),
            other => panic!("expected text part, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn test_multipart_img2img() {
        let tmp = tempfile::tempdir().unwrap();
        let (data, provider) = state(tmp.path(), Ok("QUJD"), Some("key"));
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let boundary = "mangaverse-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"genre\"\r\n\r\nromance\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"prompt\"\r\n\r\ntwo strangers meet\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"count\"\r\n\r\n2\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"mode\"\r\n\r\nimg2img\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"refinementOptions\"\r\n\r\n{{\"contrast\":90}}\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\nFACE\r\n\
             --{b}--\r\n",
            b = boundary
        );

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["meta"]["mode"], "img2img");
        assert_eq!(body["meta"]["count"], 2);
        assert_eq!(body["meta"]["refinementOptions"], json!({"contrast": 90}));

        let sent = provider.last_parts.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], ContentPart::png(b"FACE".to_vec()));
        match &sent[0] {
            ContentPart::Text(text) => assert!(text.contains("Contrast: high")),
            other => panic!("expected text part, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn test_validation_error_is_400() {
        let tmp = tempfile::tempdir().unwrap();
        let (data, _) = state(tmp.path(), Ok("QUJD"), Some("key"));
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({"genre": "fantasy", "prompt": "a dragon", "count": 20}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().contains("count"));

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], false);
    }

    #[actix_web::test]
    async fn test_missing_key_is_400() {
        let tmp = tempfile::tempdir().unwrap();
        let (data, _) = state(tmp.path(), Ok("QUJD"), None);
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({"genre": "fantasy", "prompt": "a dragon"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"ok": false, "error": "GEMINI_API_KEY not set"}));
    }

    #[actix_web::test]
    async fn test_provider_error_message_is_bare() {
        let tmp = tempfile::tempdir().unwrap();
        let (data, _) = state(tmp.path(), Err("400 INVALID_ARGUMENT: bad image"), Some("key"));
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({"genre": "fantasy", "prompt": "a dragon"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"ok": false, "error": "400 INVALID_ARGUMENT: bad image"}));
    }

    #[actix_web::test]
    async fn test_meta_echoes_normalized_refinement() {
        let tmp = tempfile::tempdir().unwrap();
        let (data, _) = state(tmp.path(), Ok("QUJD"), Some("key"));
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "genre": "noir",
                "prompt": "a rainy alley",
                "refinementOptions": {"contrast": "70", "lineWeight": "heavy", "extra": true}
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["meta"]["refinementOptions"],
            json!({"contrast": 70, "lineWeight": "medium"})
        );
    }

    #[actix_web::test]
    async fn test_paid_tier_error_is_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let (data, _) = state(
            tmp.path(),
            Err("400 FAILED_PRECONDITION: Image generation is only available on the paid tier"),
            Some("key"),
        );
        let app = test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({"genre": "fantasy", "prompt": "a dragon"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["error"],
            "Image generation may require paid API access in your region."
        );
    }
}
