use thiserror::Error;

#[derive(Debug, Error)]
pub enum MangaError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("{0}")]
    EmptyResponse(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MangaError {
    /// Message shown to API callers. Validation errors keep their prefix;
    /// everything else is the bare message. Provider quota errors about the
    /// paid tier are rewritten into a hint about regional access.
    pub fn user_message(&self) -> String {
        let message = match self {
            MangaError::Validation(_) => self.to_string(),
            MangaError::Config(msg)
            | MangaError::Provider(msg)
            | MangaError::EmptyResponse(msg)
            | MangaError::Decode(msg) => msg.clone(),
            MangaError::Io(e) => e.to_string(),
        };
        if message.contains("paid tier") {
            "Image generation may require paid API access in your region.".to_string()
        } else {
            message
        }
    }
}

pub type Result<T> = std::result::Result<T, MangaError>;
