//! Lenient parsing of the tagging service's text answer.
//!
//! Models are asked for bare JSON but sometimes wrap it in a code fence or
//! prefix it with prose. The raw text is tried first; on failure the fence
//! markers and everything before the first `{` are stripped and parsing is
//! tried once more.

use core_library::TagResult;
use tracing::{debug, warn};

/// Parse a service answer into a [`TagResult`]. `None` when both attempts fail.
pub fn parse_tag_response(raw: &str) -> Option<TagResult> {
    if let Ok(result) = TagResult::from_json_str(raw) {
        return Some(result);
    }

    let cleaned = clean(raw);
    match TagResult::from_json_str(cleaned) {
        Ok(result) => {
            debug!("Parsed tagging response after cleanup");
            Some(result)
        }
        Err(e) => {
            warn!(error = %e, cleaned, "Unparseable tagging response");
            None
        }
    }
}

fn clean(raw: &str) -> &str {
    let text = raw.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    let text = match text.find('{') {
        Some(start) => &text[start..],
        None => text,
    };
    text.trim()
}
