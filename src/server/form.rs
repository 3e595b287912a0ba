//! Parsing of `/api/generate` bodies into a validated [`GenerationRequest`].

use crate::{
    error::{MangaError, Result},
    models::{GenerationMode, GenerationRequest, RefinementOptions, DEFAULT_PANEL_COUNT},
    storage::decode_base64_image,
};
use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::Value;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Raw form fields shared by the multipart and JSON encodings.
#[derive(Debug, Default)]
pub struct GenerateForm {
    pub genre: Option<String>,
    pub prompt: Option<String>,
    pub count: Option<String>,
    pub mode: Option<String>,
    pub refinement_options: Option<RefinementOptions>,
    pub image: Option<Vec<u8>>,
    pub style_reference: Option<Vec<u8>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonGenerateBody {
    pub genre: Option<String>,
    pub prompt: Option<String>,
    #[serde(default)]
    pub count: Option<Value>,
    pub mode: Option<String>,
    #[serde(default)]
    pub refinement_options: Option<Value>,
    /// Base64, optionally as a `data:image/...;base64,` URL.
    pub image: Option<String>,
    pub style_reference: Option<String>,
}

impl GenerateForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = GenerateForm::default();

        while let Some(mut field) = multipart
            .try_next()
            .await
            .map_err(|e| MangaError::Validation(format!("Invalid multipart body: {}", e)))?
        {
            let name = field
                .content_disposition()
                .get_name()
                .unwrap_or_default()
                .to_string();
            let limit = match name.as_str() {
                "image" | "styleReference" => MAX_UPLOAD_BYTES,
                _ => MAX_TEXT_FIELD_BYTES,
            };

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk
                    .map_err(|e| MangaError::Validation(format!("Invalid multipart body: {}", e)))?;
                if data.len() + chunk.len() > limit {
                    return Err(MangaError::Validation(format!(
                        "field '{}' exceeds {} bytes",
                        name, limit
                    )));
                }
                data.extend_from_slice(&chunk);
            }

            // At most one file per field; later duplicates are ignored.
            match name.as_str() {
                "image" => {
                    if form.image.is_none() && !data.is_empty() {
                        form.image = Some(data);
                    }
                }
                "styleReference" => {
                    if form.style_reference.is_none() && !data.is_empty() {
                        form.style_reference = Some(data);
                    }
                }
                "genre" => form.genre = Some(text_field(&name, data)?),
                "prompt" => form.prompt = Some(text_field(&name, data)?),
                "count" => form.count = Some(text_field(&name, data)?),
                "mode" => form.mode = Some(text_field(&name, data)?),
                "refinementOptions" => {
                    form.refinement_options =
                        RefinementOptions::parse_lenient(&text_field(&name, data)?)
                }
                other => log::debug!("Ignoring unknown form field '{}'", other),
            }
        }

        Ok(form)
    }

    pub fn from_json(body: JsonGenerateBody) -> Result<Self> {
        let count = match body.count {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                return Err(MangaError::Validation(format!(
                    "count must be a number (got {})",
                    other
                )))
            }
        };

        let refinement_options = match body.refinement_options {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => RefinementOptions::parse_lenient(&raw),
            Some(value) => match serde_json::from_value::<RefinementOptions>(value) {
                Ok(options) => Some(options),
                Err(e) => {
                    log::warn!("Failed to parse refinement options: {}", e);
                    None
                }
            },
        };

        Ok(GenerateForm {
            genre: body.genre,
            prompt: body.prompt,
            count,
            mode: body.mode,
            refinement_options,
            image: decode_json_image("image", body.image)?,
            style_reference: decode_json_image("styleReference", body.style_reference)?,
        })
    }

    pub fn into_request(self) -> Result<GenerationRequest> {
        let genre = self
            .genre
            .ok_or_else(|| MangaError::Validation("genre is required".into()))?;
        let prompt = self
            .prompt
            .ok_or_else(|| MangaError::Validation("prompt is required".into()))?;

        let count = match self.count.as_deref().map(str::trim) {
            None => DEFAULT_PANEL_COUNT,
            Some(raw) => parse_count(raw)?,
        };

        let mode = match self.mode.as_deref() {
            None | Some("") => GenerationMode::default(),
            Some(raw) => raw.parse()?,
        };

        let request = GenerationRequest {
            genre,
            prompt,
            count,
            mode,
            reference_image: self.image,
            style_image: self.style_reference,
            refinement_options: self.refinement_options,
        };
        request.validate()?;
        Ok(request)
    }
}

fn text_field(name: &str, data: Vec<u8>) -> Result<String> {
    String::from_utf8(data)
        .map_err(|_| MangaError::Validation(format!("field '{}' is not valid UTF-8", name)))
}

fn decode_json_image(name: &str, value: Option<String>) -> Result<Option<Vec<u8>>> {
    match value {
        Some(encoded) if !encoded.is_empty() => decode_base64_image(&encoded)
            .map(Some)
            .map_err(|e| MangaError::Validation(format!("{}: {}", name, e))),
        _ => Ok(None),
    }
}

/// Coerces the count the way a number input would: "3", "3.0" and 3 are all
/// accepted, fractions and non-numbers are rejected.
fn parse_count(raw: &str) -> Result<u8> {
    let invalid = || MangaError::Validation(format!("count must be an integer (got '{}')", raw));

    let value: f64 = raw.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(invalid());
    }
    if !(1.0..=12.0).contains(&value) {
        return Err(MangaError::Validation("count must be between 1 and 12".into()));
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> JsonGenerateBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_json_defaults() {
        let request = GenerateForm::from_json(body(json!({"genre": "anime", "prompt": "a cat"})))
            .unwrap()
            .into_request()
            .unwrap();

        assert_eq!(request.count, 4);
        assert_eq!(request.mode, GenerationMode::Text2Img);
        assert!(request.refinement_options.is_none());
        assert!(request.reference_image.is_none());
    }

    #[test]
    fn test_count_coercion() {
        assert_eq!(parse_count("3").unwrap(), 3);
        assert_eq!(parse_count("12.0").unwrap(), 12);
        assert!(parse_count("2.5").is_err());
        assert!(parse_count("0").is_err());
        assert!(parse_count("13").is_err());
        assert!(parse_count("many").is_err());

        let request = GenerateForm::from_json(body(
            json!({"genre": "anime", "prompt": "a cat", "count": "7"}),
        ))
        .unwrap()
        .into_request()
        .unwrap();
        assert_eq!(request.count, 7);
    }

    #[test]
    fn test_missing_fields_are_validation_errors() {
        let err = GenerateForm::from_json(body(json!({"prompt": "a cat"})))
            .unwrap()
            .into_request()
            .unwrap_err();
        assert!(matches!(err, MangaError::Validation(_)));

        let err = GenerateForm::from_json(body(
            json!({"genre": "anime", "prompt": "a cat", "mode": "video"}),
        ))
        .unwrap()
        .into_request()
        .unwrap_err();
        assert!(matches!(err, MangaError::Validation(_)));
    }

    #[test]
    fn test_refinement_as_string_or_object() {
        let from_string = GenerateForm::from_json(body(json!({
            "refinementOptions": "{\"contrast\": 20, \"lineWeight\": \"light\"}"
        })))
        .unwrap();
        assert_eq!(from_string.refinement_options.unwrap().contrast, Some(20));

        let from_object = GenerateForm::from_json(body(json!({
            "refinementOptions": {"shadingStyle": "minimal"}
        })))
        .unwrap();
        assert!(from_object.refinement_options.unwrap().shading_style.is_some());

        let malformed =
            GenerateForm::from_json(body(json!({"refinementOptions": "{bad json"}))).unwrap();
        assert!(malformed.refinement_options.is_none());
    }

    #[test]
    fn test_json_images_are_decoded() {
        let form = GenerateForm::from_json(body(json!({
            "image": "data:image/png;base64,QUJD",
            "styleReference": ""
        })))
        .unwrap();
        assert_eq!(form.image.as_deref(), Some(&b"ABC"[..]));
        assert!(form.style_reference.is_none());

        let err = GenerateForm::from_json(body(json!({"image": "***"}))).unwrap_err();
        assert!(matches!(err, MangaError::Validation(_)));
    }
}
