use crate::{
    config::Config,
    error::{MangaError, Result},
    gemini::{GeminiClient, ImageProvider},
    logger,
    manga::{extract::find_inline_image, prompt_builder::PromptBuilder},
    models::{GenerationMode, GenerationRequest, GenerationResult},
    storage::{ImageStorage, LocalImageStorage},
};
use std::path::Path;
use std::sync::Arc;

/// Runs one generation: build the prompt, call the provider once, pull the
/// image out of the response and persist it. Holds no per-request state.
#[derive(Clone)]
pub struct GenerationService {
    provider: Arc<dyn ImageProvider>,
    storage: Arc<dyn ImageStorage>,
    api_key: Option<String>,
}

impl GenerationService {
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        storage: Arc<dyn ImageStorage>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            provider,
            storage,
            api_key,
        }
    }

    /// Gemini provider plus local PNG storage, both from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(GeminiClient::new(&config.gemini)),
            Arc::new(LocalImageStorage::new(&config.storage)),
            config.gemini.api_key.clone(),
        )
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn public_url(&self, path: &Path) -> String {
        self.storage.public_url(path)
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| MangaError::Config("GEMINI_API_KEY not set".into()))?;

        if request.mode == GenerationMode::Img2Img && request.reference_image.is_none() {
            log::warn!("img2img requested without a reference image, sending text only");
        }

        let built = PromptBuilder::build(request);
        log::debug!(
            "Built {} prompt for genre '{}' with {} part(s)",
            request.mode,
            request.genre,
            built.parts.len()
        );

        let timer = logger::timer(&format!("{} generateContent", self.provider.name()));
        let response = self.provider.generate_content(api_key, &built.parts).await;
        drop(timer);
        let response = response?;

        let payload = find_inline_image(&response)
            .ok_or_else(|| MangaError::EmptyResponse("No image returned by Gemini".into()))?;

        let (file_path, image_bytes) = self.storage.save_base64(payload).await?;

        Ok(GenerationResult {
            file_path,
            image_bytes,
        })
    }
}
