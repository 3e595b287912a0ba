/// One unit of provider input: instruction text or an embedded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineImage { data: Vec<u8>, mime_type: String },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(text.into())
    }

    pub fn png(data: Vec<u8>) -> Self {
        ContentPart::InlineImage {
            data,
            mime_type: "image/png".to_string(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentPart::InlineImage { .. })
    }
}

/// Output of the prompt builder: the instruction string plus the ordered
/// parts sent to the provider. `parts[0]` always carries `instruction`.
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub instruction: String,
    pub parts: Vec<ContentPart>,
}
