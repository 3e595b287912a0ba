pub mod extract;
pub mod generation_service;
pub mod prompt_builder;

pub use extract::find_inline_image;
pub use generation_service::GenerationService;
pub use prompt_builder::{ContrastBand, PromptBuilder};
