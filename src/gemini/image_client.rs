use crate::{
    config::GeminiConfig,
    error::{MangaError, Result},
    gemini::ImageProvider,
    models::{
        gemini::{
            ApiErrorResponse, Content, GenerateContentRequest, GenerateContentResponse,
            GenerationConfig, InlineData, Part,
        },
        ContentPart,
    },
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    pub fn with_http_client(http: reqwest::Client, config: &GeminiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url().to_string(),
            model: config.model().to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub fn build_request(parts: &[ContentPart]) -> GenerateContentRequest {
        let parts = parts
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => Part::Text { text: text.clone() },
                ContentPart::InlineImage { data, mime_type } => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: Some(mime_type.clone()),
                        data: Some(STANDARD.encode(data)),
                    },
                },
            })
            .collect();

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig::default(),
        }
    }
}

#[async_trait]
impl ImageProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_content(
        &self,
        api_key: &str,
        parts: &[ContentPart],
    ) -> Result<GenerateContentResponse> {
        let request = Self::build_request(parts);

        log::info!("Generating image with model: {}", self.model);
        log::debug!(
            "Request has {} part(s), {} image(s)",
            parts.len(),
            parts.iter().filter(|part| part.is_image()).count()
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Gemini request failed: {:?}", e);
                MangaError::Provider(format!("Request to Gemini failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MangaError::Provider(format!("Failed to read Gemini response: {}", e)))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => format!(
                    "{} {}: {}",
                    api_error.error.code,
                    api_error.error.status.as_deref().unwrap_or("UNKNOWN"),
                    api_error.error.message
                ),
                Err(_) => format!("{}: {}", status.as_u16(), body),
            };
            log::error!("Gemini service error: {}", message);
            return Err(MangaError::Provider(message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| MangaError::Provider(format!("Invalid Gemini response: {}", e)))?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            log::warn!("Gemini blocked the prompt: {}", reason);
        }

        Ok(parsed)
    }
}
