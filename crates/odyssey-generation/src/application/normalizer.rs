//! Free-text response normalization.
//!
//! Free-text backends wrap their JSON in code fences, quote it, or prefix
//! it with prose. This module unwraps the text, parses it, folds key
//! spellings onto the canonical schema, and validates the result.
//! Structured backends never pass through here.

use odyssey_core::adventure::{AdventureLimits, GeneratedAdventure};
use odyssey_core::error::GenerationError;
use odyssey_core::wire;
use serde_json::Value;

const FENCE: &str = "```";

/// Strips wrapping from both ends of `raw` until nothing more comes off.
///
/// Handles surrounding whitespace, escaped `\n` sequences left at the edges,
/// JSON string quoting, and code fences with an optional language tag.
#[must_use]
pub fn strip_wrapping(raw: &str) -> String {
    let mut text = raw.to_owned();
    loop {
        let next = strip_once(&text);
        if next == text {
            return next;
        }
        text = next;
    }
}

fn strip_once(text: &str) -> String {
    let mut t = text.trim();
    t = t.strip_prefix("\\n").unwrap_or(t);
    t = t.strip_suffix("\\n").unwrap_or(t);

    if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
        // A JSON-encoded string carries escaped quotes inside; decode it
        // rather than just dropping the outer quotes.
        if let Ok(inner) = serde_json::from_str::<String>(t) {
            return inner;
        }
        return t[1..t.len() - 1].to_owned();
    }

    if let Some(rest) = t.strip_prefix(FENCE) {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        t = &rest[tag_len..];
    }
    t = t.strip_suffix(FENCE).unwrap_or(t);

    t.to_owned()
}

/// Parses `text` as JSON. If that fails and the text has prose around an
/// object, the outermost `{ ... }` span is tried instead.
fn parse_json(text: &str) -> Result<Value, GenerationError> {
    let err = match serde_json::from_str(text) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    let Some(value) = outermost_object(text) else {
        return Err(GenerationError::MalformedResponse(format!(
            "response is not valid JSON: {err}"
        )));
    };
    Ok(value)
}

fn outermost_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Normalizes raw free-text backend output into a validated adventure.
///
/// # Errors
///
/// Returns `GenerationError::MalformedResponse` if the text is empty, is not
/// JSON, does not match the schema, or violates `limits`.
pub fn normalize(
    raw: &str,
    limits: &AdventureLimits,
) -> Result<GeneratedAdventure, GenerationError> {
    let text = strip_wrapping(raw);
    if text.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "response is empty".to_owned(),
        ));
    }

    let value = parse_json(&text)?;
    let adventure = wire::decode(value)?;
    limits.check(&adventure)?;
    Ok(adventure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use odyssey_core::adventure::DEFAULT_EXPOSITION_MAX_CHARS;
    use odyssey_core::wire::WireFormat;
    use odyssey_test_support::sample_adventure;

    fn limits() -> AdventureLimits {
        AdventureLimits {
            exposition_max_chars: DEFAULT_EXPOSITION_MAX_CHARS,
            scene_count: 3,
            max_encounters_per_scene: 2,
        }
    }

    fn wire_text(format: WireFormat) -> String {
        format.encode(&sample_adventure(3, 2)).to_string()
    }

    #[test]
    fn test_strips_json_code_fence() {
        let raw = format!("```json\n{}\n```", wire_text(WireFormat::Underscored));

        let adventure = normalize(&raw, &limits()).unwrap();

        assert_eq!(adventure, sample_adventure(3, 2));
    }

    #[test]
    fn test_strips_bare_fence_and_whitespace() {
        let raw = format!("\n\n```\n{}\n```  \n", wire_text(WireFormat::Spaced));

        assert_eq!(normalize(&raw, &limits()).unwrap(), sample_adventure(3, 2));
    }

    #[test]
    fn test_strips_quoted_fenced_payload_with_escaped_newlines() {
        let raw = format!("\"```json\\n{}\\n```\"", wire_text(WireFormat::Underscored));

        assert_eq!(normalize(&raw, &limits()).unwrap(), sample_adventure(3, 2));
    }

    #[test]
    fn test_decodes_json_encoded_string() {
        let inner = wire_text(WireFormat::Spaced);
        let raw = serde_json::to_string(&inner).unwrap();

        assert_eq!(normalize(&raw, &limits()).unwrap(), sample_adventure(3, 2));
    }

    #[test]
    fn test_recovers_object_surrounded_by_prose() {
        let raw = format!(
            "Here is your adventure:\n{}\nEnjoy the session!",
            wire_text(WireFormat::Underscored)
        );

        assert_eq!(normalize(&raw, &limits()).unwrap(), sample_adventure(3, 2));
    }

    #[test]
    fn test_round_trip_for_both_wire_formats() {
        for format in [WireFormat::Underscored, WireFormat::Spaced] {
            let original = sample_adventure(3, 1);

            let text = format.encode(&original).to_string();

            assert_eq!(normalize(&text, &limits()).unwrap(), original, "{format}");
        }
    }

    #[test]
    fn test_rejects_empty_response() {
        let result = normalize("```json\n```", &limits());

        assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));
    }

    #[test]
    fn test_rejects_non_json() {
        let result = normalize("I cannot write that adventure.", &limits());

        assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));
    }

    #[test]
    fn test_rejects_exposition_over_cap() {
        let mut adventure = sample_adventure(3, 2);
        adventure.exposition = "a".repeat(600);
        let raw = WireFormat::Underscored.encode(&adventure).to_string();

        let err = normalize(&raw, &limits()).unwrap_err();

        assert!(err.to_string().contains("exposition is 600 characters"));
    }

    #[test]
    fn test_accepts_exposition_one_below_cap() {
        let mut adventure = sample_adventure(3, 2);
        adventure.exposition = "a".repeat(DEFAULT_EXPOSITION_MAX_CHARS - 1);
        let raw = WireFormat::Underscored.encode(&adventure).to_string();

        assert_eq!(normalize(&raw, &limits()).unwrap(), adventure);
    }

    #[test]
    fn test_strip_wrapping_leaves_plain_json_alone() {
        assert_eq!(strip_wrapping("{\"a\": 1}"), "{\"a\": 1}");
    }
}
