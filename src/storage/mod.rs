pub mod local;
pub mod traits;

use crate::error::{MangaError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub use local::LocalImageStorage;
pub use traits::ImageStorage;

/// Strips a leading `data:image/<subtype>;base64,` header, if any.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    let Some(rest) = payload.strip_prefix("data:image/") else {
        return payload;
    };
    let Some((subtype, data)) = rest.split_once(";base64,") else {
        return payload;
    };
    let is_word = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_word {
        data
    } else {
        payload
    }
}

/// Decodes a provider image payload into raw bytes. Embedded whitespace
/// (line-wrapped base64) is ignored.
pub fn decode_base64_image(payload: &str) -> Result<Vec<u8>> {
    let data = strip_data_url_prefix(payload.trim());
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| MangaError::Decode(format!("Invalid base64 image data: {}", e)))
}
