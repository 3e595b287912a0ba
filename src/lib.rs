//! Backend for the Mangaverse panel generator.
//!
//! A generation request is turned into an instruction plus content parts by
//! [`PromptBuilder`], sent once to Gemini by [`GenerationService`], and the
//! returned image is written to disk as a PNG.

pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod manga;
pub mod models;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;

pub use config::{Config, GeminiConfig, StorageConfig};
pub use error::{MangaError, Result};
pub use gemini::{GeminiClient, ImageProvider};
pub use manga::{GenerationService, PromptBuilder};
pub use models::{
    BuiltPrompt, ContentPart, DetailLevel, GenerationMode, GenerationRequest, GenerationResult,
    LineWeight, RefinementOptions, ShadingStyle,
};
pub use storage::{ImageStorage, LocalImageStorage};
