//! Sampled frames and their analysis.

use base64::{engine::general_purpose::STANDARD, Engine};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Appeal scores are reported on a 1-10 scale.
pub const MIN_APPEAL_SCORE: u8 = 1;
pub const MAX_APPEAL_SCORE: u8 = 10;

/// Errors produced while handling image payloads.
#[derive(Debug, Error)]
pub enum ImagePayloadError {
    #[error("Not a base64 data URI")]
    NotDataUri,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Encoded image bytes plus their mime type.
///
/// Serialized at the boundary as a `data:<mime>;base64,<body>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    /// Standard base64 body, no data URI prefix
    pub base64: String,
}

impl ImagePayload {
    /// Encode raw image bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64: STANDARD.encode(bytes),
        }
    }

    /// Render as a data URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    /// Parse a `data:<mime>;base64,<body>` URI.
    pub fn parse_data_uri(uri: &str) -> Result<Self, ImagePayloadError> {
        let rest = uri.strip_prefix("data:").ok_or(ImagePayloadError::NotDataUri)?;
        let (mime_type, body) = rest
            .split_once(";base64,")
            .ok_or(ImagePayloadError::NotDataUri)?;
        // Validate the body so a stored payload always decodes.
        STANDARD.decode(body)?;
        Ok(Self {
            mime_type: mime_type.to_string(),
            base64: body.to_string(),
        })
    }

    /// Decode back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, ImagePayloadError> {
        Ok(STANDARD.decode(&self.base64)?)
    }
}

impl Serialize for ImagePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_uri())
    }
}

impl<'de> Deserialize<'de> for ImagePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let uri = String::deserialize(deserializer)?;
        ImagePayload::parse_data_uri(&uri).map_err(serde::de::Error::custom)
    }
}

/// Structured analysis of a single frame as returned by the vision model.
///
/// Only `description` is required. Fields the model left out stay `None`
/// rather than taking a made-up value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisualAnalysis {
    /// What is visible in the frame
    pub description: String,

    /// Emotional effect on a viewer
    #[serde(
        default,
        alias = "emotional_impact",
        skip_serializing_if = "Option::is_none"
    )]
    pub emotional_impact: Option<String>,

    /// Viewer appeal on a 1-10 scale
    #[serde(
        default,
        alias = "appeal_score",
        alias = "appealRating",
        deserialize_with = "deserialize_appeal_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub appeal_score: Option<u8>,

    /// Concrete suggestions to improve the shot
    #[serde(
        default,
        alias = "suggested_improvements",
        alias = "improvements",
        deserialize_with = "deserialize_string_or_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub suggested_improvements: Option<Vec<String>>,

    /// Whether the frame grabs attention
    #[serde(
        default,
        alias = "attention_grabbing",
        alias = "isAttentionGrabbing",
        alias = "is_attention_grabbing",
        skip_serializing_if = "Option::is_none"
    )]
    pub attention_grabbing: Option<bool>,
}

impl VisualAnalysis {
    /// Analysis carrying only a description.
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            emotional_impact: None,
            appeal_score: None,
            suggested_improvements: None,
            attention_grabbing: None,
        }
    }
}

/// Clamp a raw score into the 1-10 range.
pub fn clamp_appeal_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return MIN_APPEAL_SCORE;
    }
    raw.round()
        .clamp(MIN_APPEAL_SCORE as f64, MAX_APPEAL_SCORE as f64) as u8
}

fn deserialize_appeal_score<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u8>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Number(f64),
        Text(String),
    }

    match Option::<RawScore>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawScore::Number(n)) => Ok(Some(clamp_appeal_score(n))),
        Some(RawScore::Text(s)) => {
            // Models sometimes answer "7/10".
            let head = s.split('/').next().unwrap_or_default().trim();
            head.parse::<f64>()
                .map(|n| Some(clamp_appeal_score(n)))
                .map_err(|_| serde::de::Error::custom(format!("invalid appeal score: {s}")))
        }
    }
}

fn deserialize_string_or_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<RawList>::deserialize(deserializer)? {
        None => None,
        Some(RawList::One(s)) if s.trim().is_empty() => Some(Vec::new()),
        Some(RawList::One(s)) => Some(vec![s]),
        Some(RawList::Many(v)) => Some(v),
    })
}

/// Outcome of running inference on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameAnalysis {
    /// The reply decoded into structured fields
    Analyzed(VisualAnalysis),
    /// The reply carried no decodable structured payload
    Unparsed {
        #[serde(rename = "rawText")]
        raw_text: String,
    },
    /// The inference call itself failed
    Failed { error: String },
}

impl FrameAnalysis {
    /// Description usable in the summary digest, if the frame was analyzed.
    pub fn description(&self) -> Option<&str> {
        match self {
            FrameAnalysis::Analyzed(a) if !a.description.trim().is_empty() => {
                Some(a.description.as_str())
            }
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FrameAnalysis::Failed { .. })
    }
}

/// One sampled still image from the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Seconds from video start
    pub timestamp: u32,

    /// Image rendered as a base64 data URI
    #[serde(rename = "imageData")]
    #[schemars(with = "String")]
    pub image: ImagePayload,

    /// Populated after inference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<FrameAnalysis>,
}

impl Frame {
    pub fn new(timestamp: u32, image: ImagePayload) -> Self {
        Self {
            timestamp,
            image,
            analysis: None,
        }
    }
}

/// Final output of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    /// Frames in ascending timestamp order
    pub frames: Vec<Frame>,
    /// Free-text narrative over all frames
    pub summary: String,
}
