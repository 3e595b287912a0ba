pub mod image_client;

use crate::{error::Result, models::gemini::GenerateContentResponse, models::ContentPart};
use async_trait::async_trait;

pub use image_client::GeminiClient;

/// An external image-generation backend, called once per generation.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_content(
        &self,
        api_key: &str,
        parts: &[ContentPart],
    ) -> Result<GenerateContentResponse>;
}
