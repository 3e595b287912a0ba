pub mod api;
pub mod content;
pub mod gemini;
pub mod generation;

pub use api::*;
pub use content::*;
pub use generation::*;
