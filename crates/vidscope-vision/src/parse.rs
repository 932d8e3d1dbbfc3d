//! Parsing model replies into frame analyses.
//!
//! The model is asked for a JSON object but may wrap it in markdown fences
//! or prose. Decoding is tried on the whole reply first, then on the
//! longest brace-delimited span; anything else is kept verbatim as
//! `FrameAnalysis::Unparsed`.

use serde_json::Value;
use tracing::debug;

use vidscope_models::{FrameAnalysis, VisualAnalysis};

/// Parse a model reply into a frame analysis.
pub fn parse_frame_analysis(text: &str) -> FrameAnalysis {
    let cleaned = strip_code_fence(text);

    if let Some(analysis) = decode_analysis(cleaned) {
        return FrameAnalysis::Analyzed(analysis);
    }

    if let Some(span) = longest_brace_span(cleaned) {
        if let Some(analysis) = decode_analysis(span) {
            debug!("Recovered embedded JSON from model reply");
            return FrameAnalysis::Analyzed(analysis);
        }
    }

    FrameAnalysis::Unparsed {
        raw_text: text.to_string(),
    }
}

/// Decode a JSON object carrying at least a `description` field.
///
/// Other fields are taken only when present and well-formed; nothing is
/// filled in for them.
fn decode_analysis(candidate: &str) -> Option<VisualAnalysis> {
    let value: Value = serde_json::from_str(candidate.trim()).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Remove a surrounding ```json ... ``` fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// From the first `{` to the last `}`.
fn longest_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json() {
        let reply = r#"{"description":"Close-up of a product","emotionalImpact":"Excited","appealScore":9,"suggestedImprovements":["Brighter light"],"attentionGrabbing":true}"#;
        match parse_frame_analysis(reply) {
            FrameAnalysis::Analyzed(a) => {
                assert_eq!(a.description, "Close-up of a product");
                assert_eq!(a.appeal_score, Some(9));
                assert_eq!(a.attention_grabbing, Some(true));
                assert_eq!(
                    a.suggested_improvements,
                    Some(vec!["Brighter light".to_string()])
                );
            }
            other => panic!("expected analyzed, got {other:?}"),
        }
    }

    #[test]
    fn test_fenced_json() {
        let reply = "```json\n{\"description\": \"A beach\", \"appealScore\": 5}\n```";
        assert!(matches!(
            parse_frame_analysis(reply),
            FrameAnalysis::Analyzed(a) if a.description == "A beach" && a.appeal_score == Some(5)
        ));
    }

    #[test]
    fn test_embedded_json_recovered() {
        let reply = "Sure! Here is the analysis:\n{\"description\": \"Two people laughing\", \"appealScore\": 8}\nLet me know if you need more.";
        assert!(matches!(
            parse_frame_analysis(reply),
            FrameAnalysis::Analyzed(a) if a.description == "Two people laughing"
        ));
    }

    #[test]
    fn test_description_only_reply_keeps_other_fields_absent() {
        let reply = r#"{"description": "A dog"}"#;
        assert_eq!(
            parse_frame_analysis(reply),
            FrameAnalysis::Analyzed(VisualAnalysis::described("A dog"))
        );
    }

    #[test]
    fn test_malformed_score_is_unparsed() {
        let reply = r#"{"description": "A dog", "appealScore": "very high"}"#;
        assert_eq!(
            parse_frame_analysis(reply),
            FrameAnalysis::Unparsed {
                raw_text: reply.to_string()
            }
        );
    }

    #[test]
    fn test_prose_is_unparsed() {
        let reply = "The frame shows a sunset over the water.";
        assert_eq!(
            parse_frame_analysis(reply),
            FrameAnalysis::Unparsed {
                raw_text: reply.to_string()
            }
        );
    }

    #[test]
    fn test_object_without_description_is_unparsed() {
        let reply = r#"{"score": 3}"#;
        assert!(matches!(
            parse_frame_analysis(reply),
            FrameAnalysis::Unparsed { .. }
        ));
    }

    #[test]
    fn test_broken_braces_are_unparsed() {
        let reply = "} nothing here {";
        assert!(matches!(
            parse_frame_analysis(reply),
            FrameAnalysis::Unparsed { .. }
        ));
    }
}
