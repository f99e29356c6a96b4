//! Pulls the single game action out of a free-form model message. The model
//! marks its action with a fixed tag pair; everything around the tags is
//! narration meant for the human watching.

pub const COMMAND_OPEN_TAG: &str = "<command>";
pub const COMMAND_CLOSE_TAG: &str = "</command>";

/// Splits `text` into the delimited command (if any) and the residual
/// display text with the delimiter span removed and trimmed.
///
/// Only the first complete `<command>...</command>` span is honored; later
/// tags stay in the display text untouched. A lone open or close tag is not
/// a command. An empty span yields `Some("")`, which callers treat as a bare
/// Enter keystroke, distinct from `None` (no action at all).
pub fn extract_command(text: &str) -> (Option<String>, String) {
    if let Some(start) = text.find(COMMAND_OPEN_TAG) {
        if let Some(end) = text[start..].find(COMMAND_CLOSE_TAG).map(|i| start + i) {
            let command = text[start + COMMAND_OPEN_TAG.len()..end].trim().to_string();
            let mut display = String::with_capacity(text.len());
            display.push_str(&text[..start]);
            display.push_str(&text[end + COMMAND_CLOSE_TAG.len()..]);
            return (Some(command), display.trim().to_string());
        }
    }
    (None, text.trim().to_string())
}
