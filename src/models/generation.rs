use crate::error::{MangaError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const MAX_PROMPT_CHARS: usize = 800;
pub const MIN_PANEL_COUNT: u8 = 1;
pub const MAX_PANEL_COUNT: u8 = 12;
pub const DEFAULT_PANEL_COUNT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenerationMode {
    #[default]
    #[serde(rename = "text2img")]
    Text2Img,
    #[serde(rename = "img2img")]
    Img2Img,
    #[serde(rename = "styleTransfer")]
    StyleTransfer,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Text2Img => "text2img",
            GenerationMode::Img2Img => "img2img",
            GenerationMode::StyleTransfer => "styleTransfer",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = MangaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text2img" => Ok(GenerationMode::Text2Img),
            "img2img" => Ok(GenerationMode::Img2Img),
            "styleTransfer" => Ok(GenerationMode::StyleTransfer),
            other => Err(MangaError::Validation(format!(
                "mode must be one of text2img, img2img, styleTransfer (got '{}')",
                other
            ))),
        }
    }
}

// The knob enums deserialize leniently: an unrecognized value falls back to
// the middle setting instead of rejecting the whole refinement record.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum LineWeight {
    Light,
    #[default]
    Medium,
    Bold,
}

impl From<String> for LineWeight {
    fn from(value: String) -> Self {
        match value.as_str() {
            "light" => LineWeight::Light,
            "medium" => LineWeight::Medium,
            "bold" => LineWeight::Bold,
            other => {
                log::warn!("Unknown lineWeight '{}', using medium", other);
                LineWeight::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ShadingStyle {
    #[default]
    Screentone,
    Crosshatch,
    Minimal,
}

impl From<String> for ShadingStyle {
    fn from(value: String) -> Self {
        match value.as_str() {
            "screentone" => ShadingStyle::Screentone,
            "crosshatch" => ShadingStyle::Crosshatch,
            "minimal" => ShadingStyle::Minimal,
            other => {
                log::warn!("Unknown shadingStyle '{}', using screentone", other);
                ShadingStyle::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DetailLevel {
    Simple,
    #[default]
    Detailed,
    Complex,
}

impl From<String> for DetailLevel {
    fn from(value: String) -> Self {
        match value.as_str() {
            "simple" => DetailLevel::Simple,
            "detailed" => DetailLevel::Detailed,
            "complex" => DetailLevel::Complex,
            other => {
                log::warn!("Unknown detailLevel '{}', using detailed", other);
                DetailLevel::default()
            }
        }
    }
}

/// Accepts contrast as an integer, a float or a numeric string. Fractions are
/// floored, which keeps the 33/66 band edges where a raw comparison puts them.
/// Anything else drops only this field.
fn lenient_contrast<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let contrast = match &value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(floor_to_i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(floor_to_i64))
        }
        Some(_) => None,
    };

    if contrast.is_none() {
        if let Some(value) = value.filter(|v| !v.is_null()) {
            log::warn!("Ignoring non-numeric contrast {}", value);
        }
    }
    Ok(contrast)
}

fn floor_to_i64(value: f64) -> Option<i64> {
    value.is_finite().then(|| value.floor() as i64)
}

/// Stylistic knobs appended to the instruction text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementOptions {
    #[serde(
        default,
        deserialize_with = "lenient_contrast",
        skip_serializing_if = "Option::is_none"
    )]
    pub contrast: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_weight: Option<LineWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shading_style: Option<ShadingStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_level: Option<DetailLevel>,
}

impl RefinementOptions {
    /// Parses the JSON-encoded string sent by the frontend. Malformed JSON is
    /// logged and treated as "no refinement".
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<RefinementOptions>(raw) {
            Ok(options) => Some(options),
            Err(e) => {
                log::warn!("Failed to parse refinement options: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub genre: String,
    pub prompt: String,
    pub count: u8,
    pub mode: GenerationMode,
    pub reference_image: Option<Vec<u8>>,
    pub style_image: Option<Vec<u8>>,
    pub refinement_options: Option<RefinementOptions>,
}

impl GenerationRequest {
    pub fn new(genre: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
            prompt: prompt.into(),
            count: DEFAULT_PANEL_COUNT,
            mode: GenerationMode::default(),
            reference_image: None,
            style_image: None,
            refinement_options: None,
        }
    }

    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count;
        self
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_reference_image(mut self, image: Vec<u8>) -> Self {
        self.reference_image = Some(image);
        self
    }

    pub fn with_style_image(mut self, image: Vec<u8>) -> Self {
        self.style_image = Some(image);
        self
    }

    pub fn with_refinement(mut self, options: RefinementOptions) -> Self {
        self.refinement_options = Some(options);
        self
    }

    /// Checks the field ranges the HTTP layer promises before a request
    /// reaches the generation service.
    pub fn validate(&self) -> Result<()> {
        if self.genre.trim().is_empty() {
            return Err(MangaError::Validation("genre must not be empty".into()));
        }

        let prompt_chars = self.prompt.chars().count();
        if prompt_chars == 0 {
            return Err(MangaError::Validation("prompt must not be empty".into()));
        }
        if prompt_chars > MAX_PROMPT_CHARS {
            return Err(MangaError::Validation(format!(
                "prompt must be at most {} characters",
                MAX_PROMPT_CHARS
            )));
        }

        if !(MIN_PANEL_COUNT..=MAX_PANEL_COUNT).contains(&self.count) {
            return Err(MangaError::Validation(format!(
                "count must be between {} and {}",
                MIN_PANEL_COUNT, MAX_PANEL_COUNT
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub file_path: PathBuf,
    pub image_bytes: Vec<u8>,
}
