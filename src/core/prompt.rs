/// Instruction sent with a photo and the glasses overlay image.
pub const GLASSES_OVERLAY_PROMPT: &str = include_str!("prompts/glasses_overlay.txt");

pub const STUDIO_REMIX_PROMPT: &str = "Turn this image into a professional quality studio shoot with better lighting and depth of field.";

pub const COMBINE_REMIX_PROMPT: &str =
    "Combine the subjects of these images in a natural way, producing a new image.";

/// Default remix instruction for the given number of input images.
pub fn default_remix_prompt(image_count: usize) -> &'static str {
    if image_count <= 1 {
        STUDIO_REMIX_PROMPT
    } else {
        COMBINE_REMIX_PROMPT
    }
}

/// Returns the caller's prompt unless it is blank.
pub fn resolve_prompt(custom: Option<&str>, fallback: &str) -> String {
    match custom.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => fallback.to_string(),
    }
}
