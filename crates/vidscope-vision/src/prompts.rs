//! Prompts sent to the vision model.

use vidscope_models::Frame;

/// Frames at or before this many seconds get the hook-weighted prompt.
pub const HOOK_WINDOW_SECS: u32 = 3;

const RESPONSE_FORMAT: &str = r#"Respond with ONLY a JSON object, no markdown, using this schema:
{
  "description": "What is happening in the frame",
  "emotionalImpact": "The emotion a viewer is likely to feel",
  "appealScore": 7,
  "suggestedImprovements": ["Concrete change that would make the shot stronger"],
  "attentionGrabbing": true
}
appealScore is an integer from 1 (no appeal) to 10 (irresistible)."#;

/// Prompt for a single frame.
///
/// Frames inside the opening hook window are judged on whether they stop
/// a viewer from scrolling past.
pub fn frame_prompt(timestamp: u32) -> String {
    if timestamp <= HOOK_WINDOW_SECS {
        format!(
            "You are analyzing frame {timestamp}s of a short-form marketing video. \
This frame is part of the HOOK: the first {HOOK_WINDOW_SECS} seconds that decide whether \
a viewer keeps watching. Weigh scroll-stopping power, visual clarity and immediate \
intrigue heavily when scoring appeal and attention.\n\n{RESPONSE_FORMAT}"
        )
    } else {
        format!(
            "You are analyzing frame {timestamp}s of a short-form marketing video. \
Evaluate composition, subject clarity, emotional tone and how well the frame \
keeps a viewer engaged.\n\n{RESPONSE_FORMAT}"
        )
    }
}

/// One line per frame: `"<t>s: <description>"`.
pub fn build_digest(frames: &[Frame]) -> String {
    frames
        .iter()
        .map(|frame| {
            let description = frame
                .analysis
                .as_ref()
                .and_then(|a| a.description())
                .unwrap_or("(analysis unavailable)");
            format!("{}s: {}", frame.timestamp, description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Aggregate prompt over the per-frame digest.
pub fn summary_prompt(digest: &str) -> String {
    format!(
        "Below are second-by-second descriptions of a short-form marketing video.\n\n\
{digest}\n\n\
Write a concise overall assessment of the video: how strong the opening hook is, \
where viewer attention is likely to drop, the overall emotional arc, and the three \
most valuable improvements. Answer in plain prose."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidscope_models::{FrameAnalysis, ImagePayload, VisualAnalysis};

    fn frame(timestamp: u32, analysis: Option<FrameAnalysis>) -> Frame {
        Frame {
            timestamp,
            image: ImagePayload::from_bytes("image/jpeg", b"x"),
            analysis,
        }
    }

    #[test]
    fn test_hook_window_prompt_variant() {
        assert!(frame_prompt(1).contains("HOOK"));
        assert!(frame_prompt(3).contains("HOOK"));
        assert!(!frame_prompt(4).contains("HOOK"));
        assert!(!frame_prompt(5).contains("HOOK"));
        assert!(frame_prompt(5).contains("appealScore"));
    }

    #[test]
    fn test_digest_lines() {
        let frames = vec![
            frame(
                1,
                Some(FrameAnalysis::Analyzed(VisualAnalysis {
                    description: "Logo reveal".into(),
                    emotional_impact: Some("Curious".into()),
                    appeal_score: Some(6),
                    suggested_improvements: None,
                    attention_grabbing: Some(true),
                })),
            ),
            frame(
                2,
                Some(FrameAnalysis::Failed {
                    error: "timeout".into(),
                }),
            ),
        ];
        assert_eq!(
            build_digest(&frames),
            "1s: Logo reveal\n2s: (analysis unavailable)"
        );
    }

    #[test]
    fn test_summary_prompt_embeds_digest() {
        let prompt = summary_prompt("1s: Logo reveal");
        assert!(prompt.contains("1s: Logo reveal"));
    }
}
