//! Locating the inline image in a `generateContent` response.
//!
//! The image is not guaranteed to land in candidate 0, so the search runs in
//! two tiers: the first candidate's parts, then every part of every
//! candidate in order.

use crate::models::gemini::{Candidate, GenerateContentResponse, ResponsePart};

fn candidate_parts(candidate: &Candidate) -> &[ResponsePart] {
    candidate
        .content
        .as_ref()
        .map(|content| content.parts.as_slice())
        .unwrap_or_default()
}

/// First part of the first candidate that carries inline image data.
pub fn first_candidate_image(response: &GenerateContentResponse) -> Option<&str> {
    response
        .candidates
        .first()
        .map(candidate_parts)
        .unwrap_or_default()
        .iter()
        .find_map(ResponsePart::image_data)
}

/// First part carrying inline image data across all candidates, flattened.
pub fn any_candidate_image(response: &GenerateContentResponse) -> Option<&str> {
    response
        .candidates
        .iter()
        .flat_map(candidate_parts)
        .find_map(ResponsePart::image_data)
}

pub fn find_inline_image(response: &GenerateContentResponse) -> Option<&str> {
    first_candidate_image(response).or_else(|| {
        log::debug!("No image in first candidate, searching all candidates");
        any_candidate_image(response)
    })
}
