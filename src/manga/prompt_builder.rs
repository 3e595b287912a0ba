use crate::models::{
    BuiltPrompt, ContentPart, DetailLevel, GenerationMode, GenerationRequest, LineWeight,
    RefinementOptions, ShadingStyle,
};

pub const LOW_CONTRAST_LIMIT: i64 = 33;
pub const MEDIUM_CONTRAST_LIMIT: i64 = 66;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContrastBand {
    Low,
    Medium,
    High,
}

impl ContrastBand {
    pub fn from_value(contrast: i64) -> Self {
        if contrast < LOW_CONTRAST_LIMIT {
            ContrastBand::Low
        } else if contrast < MEDIUM_CONTRAST_LIMIT {
            ContrastBand::Medium
        } else {
            ContrastBand::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContrastBand::Low => "low",
            ContrastBand::Medium => "medium",
            ContrastBand::High => "high",
        }
    }

    fn phrase(&self) -> &'static str {
        match self {
            ContrastBand::Low => "low contrast with soft grays and gentle transitions",
            ContrastBand::Medium => "medium contrast with balanced blacks and whites",
            ContrastBand::High => "high contrast with deep solid blacks and stark whites",
        }
    }
}

fn line_weight_phrase(weight: LineWeight) -> &'static str {
    match weight {
        LineWeight::Light => "thin, delicate linework",
        LineWeight::Medium => "clean, medium-weight linework",
        LineWeight::Bold => "thick, bold inking",
    }
}

fn shading_phrase(style: ShadingStyle) -> &'static str {
    match style {
        ShadingStyle::Screentone => "classic screentone dot shading",
        ShadingStyle::Crosshatch => "hand-drawn crosshatch shading",
        ShadingStyle::Minimal => "minimal shading with mostly flat areas",
    }
}

fn detail_phrase(level: DetailLevel) -> &'static str {
    match level {
        DetailLevel::Simple => "simple, uncluttered compositions with sparse backgrounds",
        DetailLevel::Detailed => "detailed characters and backgrounds",
        DetailLevel::Complex => "intricate, highly detailed artwork with dense backgrounds",
    }
}

/// Turns a generation request into the instruction text and the ordered
/// content parts for the provider. Pure: no I/O.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(request: &GenerationRequest) -> BuiltPrompt {
        let mut instruction = match request.mode {
            GenerationMode::StyleTransfer => Self::style_transfer_template(request),
            GenerationMode::Text2Img | GenerationMode::Img2Img => Self::panel_template(request),
        };

        if let Some(options) = &request.refinement_options {
            instruction.push_str(&Self::refinement_block(options));
        }

        let mut parts = vec![ContentPart::text(instruction.clone())];

        match request.mode {
            GenerationMode::StyleTransfer => {
                if let Some(style) = &request.style_image {
                    parts.push(ContentPart::png(style.clone()));
                }
            }
            GenerationMode::Img2Img => {
                if let Some(reference) = &request.reference_image {
                    parts.push(ContentPart::png(reference.clone()));
                }
            }
            GenerationMode::Text2Img => {}
        }

        BuiltPrompt { instruction, parts }
    }

    fn panel_template(request: &GenerationRequest) -> String {
        format!(
            r#"
You are a professional manga artist. You'll receive:
- a short STORYLINE (English)
- a GENRE
- an optional REAL PERSON reference image
- a PANEL COUNT

TASK:
Create ONE single image containing exactly {count} manga panels laid out like a manga page, depicting: {prompt}
Keep it BLACK & WHITE, high contrast, screentone style. Keep DIALOGUES in English.
If a reference image is provided, preserve the person's identity and facial features consistently across panels.

GENRE: {genre}
STORYLINE: {prompt}
PANEL COUNT: {count}

Composition guidance:
- Vary camera angles (close-up, mid, wide) and panel sizes for drama.
- Clean borders; no watermarks; minimal text artifacts.
- Ensure speech bubbles are readable but not excessive.
"#,
            count = request.count,
            prompt = request.prompt,
            genre = request.genre,
        )
    }

    fn style_transfer_template(request: &GenerationRequest) -> String {
        format!(
            r#"
You are a professional manga artist. You'll receive:
- a STYLE REFERENCE image
- a short STORYLINE (English)
- a GENRE

TASK:
Replicate the art style of the reference image (linework, shading, tone and panel treatment) while depicting: {prompt}
Do not copy the reference's characters or composition; only its visual style.

GENRE: {genre}
STORYLINE: {prompt}

Style guidance:
- Match the reference's line quality and shading technique closely.
- Clean borders; no watermarks; minimal text artifacts.
- Keep any DIALOGUES in English and speech bubbles readable.
"#,
            prompt = request.prompt,
            genre = request.genre,
        )
    }

    fn refinement_block(options: &RefinementOptions) -> String {
        let mut block = String::from("\nRefinement:\n");

        if let Some(contrast) = options.contrast {
            let band = ContrastBand::from_value(contrast);
            block.push_str(&format!("- Contrast: {} ({}).\n", band.as_str(), band.phrase()));
        }
        if let Some(weight) = options.line_weight {
            block.push_str(&format!("- Line weight: {}.\n", line_weight_phrase(weight)));
        }
        if let Some(style) = options.shading_style {
            block.push_str(&format!("- Shading: {}.\n", shading_phrase(style)));
        }
        if let Some(level) = options.detail_level {
            block.push_str(&format!("- Detail level: {}.\n", detail_phrase(level)));
        }

        block
    }
}
