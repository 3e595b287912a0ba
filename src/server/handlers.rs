use crate::{
    error::MangaError,
    logger,
    models::{GenerateMeta, GenerateResponse, HealthResponse},
    server::{
        form::{GenerateForm, JsonGenerateBody},
        AppState,
    },
};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        provider: state.service.provider_name().to_string(),
    })
}

// Each generate call runs under its own request id so concurrent
// generations can be told apart in the logs.

pub async fn generate_multipart(
    state: web::Data<AppState>,
    multipart: Multipart,
) -> Result<HttpResponse, MangaError> {
    logger::scope_request_id(logger::new_request_id(), async move {
        let form = GenerateForm::from_multipart(multipart)
            .await
            .map_err(log_failure)?;
        run_generation(&state, form).await
    })
    .await
}

pub async fn generate_json(
    state: web::Data<AppState>,
    body: web::Json<JsonGenerateBody>,
) -> Result<HttpResponse, MangaError> {
    logger::scope_request_id(logger::new_request_id(), async move {
        let form = GenerateForm::from_json(body.into_inner()).map_err(log_failure)?;
        run_generation(&state, form).await
    })
    .await
}

async fn run_generation(state: &AppState, form: GenerateForm) -> Result<HttpResponse, MangaError> {
    let request = form.into_request().map_err(log_failure)?;

    log::info!(
        "Generating {} panel(s) in {} mode for genre '{}'",
        request.count,
        request.mode,
        request.genre
    );

    let result = state.service.generate(&request).await.map_err(log_failure)?;
    let image_url = state.service.public_url(&result.file_path);

    Ok(HttpResponse::Ok().json(GenerateResponse {
        ok: true,
        image_url,
        meta: GenerateMeta {
            genre: request.genre,
            count: request.count,
            mode: request.mode,
            refinement_options: request.refinement_options,
        },
    }))
}

fn log_failure(err: MangaError) -> MangaError {
    match &err {
        MangaError::Validation(msg) => log::warn!("Rejected generate request: {}", msg),
        other => log::error!("Generation failed: {}", other),
    }
    err
}
