//! Video analysis handlers.
//!
//! `POST /video-analysis` accepts a base64 video (raw body, data URI, or
//! JSON `{ "videoData": ... }`) and answers with a job id. Progress and
//! results are polled by id, either on dedicated paths or through the
//! `type` query parameter on `/video-analysis`.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

use vidscope_models::{AnalysisResult, JobId, JobProgress, JobStatus};
use vidscope_worker::{job_result, job_status, JobOutcome};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const NO_VIDEO_DATA: &str = "No video data provided";
const INVALID_ENCODING: &str = "Invalid video data encoding";

/// JSON submission body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub video_data: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: String,
}

/// Query parameters shared by the poll endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuery {
    pub job_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Which view a poll asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Progress,
    Results,
}

impl PollKind {
    /// Parse the `type` parameter; absent means progress.
    pub fn parse(value: Option<&str>) -> ApiResult<Self> {
        match value.map(str::trim) {
            None | Some("") | Some("progress") => Ok(Self::Progress),
            Some("results") | Some("result") => Ok(Self::Results),
            Some(other) => Err(ApiError::bad_request(format!(
                "Unknown type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub result: AnalysisResult,
}

/// Body of a 202 answer to a results poll.
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    #[serde(flatten)]
    pub progress: JobProgress,
    pub message: String,
}

/// Submit a video for analysis.
pub async fn submit_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<SubmitResponse>> {
    let executor = state.executor()?;
    let video = decode_video_payload(&headers, &body)?;

    let job_id = executor.submit(&video).await?;
    info!(job_id = %job_id, bytes = video.len(), "Accepted video for analysis");

    Ok(Json(SubmitResponse {
        job_id: job_id.to_string(),
    }))
}

/// Extract the raw video bytes from a submission body.
pub fn decode_video_payload(headers: &HeaderMap, body: &[u8]) -> ApiResult<Vec<u8>> {
    let first = body.iter().find(|b| !b.is_ascii_whitespace());
    let Some(first) = first else {
        return Err(ApiError::bad_request(NO_VIDEO_DATA));
    };

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
        || *first == b'{';

    let encoded = if is_json {
        let request: SubmitRequest = serde_json::from_slice(body)
            .map_err(|_| ApiError::bad_request("Invalid JSON body"))?;
        request.video_data.unwrap_or_default()
    } else {
        String::from_utf8(body.to_vec()).map_err(|_| ApiError::bad_request(INVALID_ENCODING))?
    };

    decode_base64_video(&encoded)
}

/// Decode standard base64, with or without a `data:...;base64,` prefix.
fn decode_base64_video(encoded: &str) -> ApiResult<Vec<u8>> {
    let encoded = encoded.trim();
    let data = match encoded.strip_prefix("data:") {
        Some(uri) => uri
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ApiError::bad_request(INVALID_ENCODING))?,
        None => encoded,
    };

    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(ApiError::bad_request(NO_VIDEO_DATA));
    }

    STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| ApiError::bad_request(INVALID_ENCODING))
}

/// `GET /video-analysis?jobId=...&type=progress|results`
pub async fn poll_video_analysis(
    State(state): State<AppState>,
    Query(query): Query<PollQuery>,
) -> ApiResult<Response> {
    let kind = PollKind::parse(query.kind.as_deref())?;
    poll(&state, query.job_id.as_deref(), kind).await
}

/// `GET /video-analysis/progress?jobId=...`
pub async fn get_progress(
    State(state): State<AppState>,
    Query(query): Query<PollQuery>,
) -> ApiResult<Response> {
    poll(&state, query.job_id.as_deref(), PollKind::Progress).await
}

/// `GET /video-analysis/results?jobId=...`
pub async fn get_results(
    State(state): State<AppState>,
    Query(query): Query<PollQuery>,
) -> ApiResult<Response> {
    poll(&state, query.job_id.as_deref(), PollKind::Results).await
}

async fn poll(state: &AppState, job_id: Option<&str>, kind: PollKind) -> ApiResult<Response> {
    let job_id = job_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(JobId::from_string)
        .ok_or_else(|| ApiError::bad_request("Job ID is required"))?;

    match kind {
        PollKind::Progress => {
            let progress = job_status(state.store.as_ref(), &job_id).await?;
            Ok(Json(progress).into_response())
        }
        PollKind::Results => match job_result(state.store.as_ref(), &job_id).await? {
            JobOutcome::Ready(result) => Ok(Json(ResultResponse { result }).into_response()),
            JobOutcome::Pending(progress) => {
                let message = match progress.status {
                    JobStatus::Error => "Analysis failed",
                    _ => "Analysis not complete yet",
                };
                Ok((
                    StatusCode::ACCEPTED,
                    Json(PendingResponse {
                        progress,
                        message: message.to_string(),
                    }),
                )
                    .into_response())
            }
        },
    }
}

/// Fallback for unsupported methods on the analysis routes.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    #[test]
    fn test_raw_base64_body() {
        let bytes = decode_video_payload(&HeaderMap::new(), b"AAECAw==").unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_data_uri_body() {
        let bytes =
            decode_video_payload(&HeaderMap::new(), b"data:video/mp4;base64,AAECAw==\n").unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_json_body() {
        let bytes =
            decode_video_payload(&json_headers(), br#"{"videoData": "AAECAw=="}"#).unwrap();
        assert_eq!(bytes, vec![0, 1, 2, 3]);

        // Detected without a content type too.
        let bytes = decode_video_payload(&HeaderMap::new(), br#" {"videoData":"AAE="}"#).unwrap();
        assert_eq!(bytes, vec![0, 1]);
    }

    #[test]
    fn test_missing_video_data() {
        let bodies: [&[u8]; 4] = [b"", b"   \n", br#"{}"#, br#"{"videoData": ""}"#];
        for body in bodies {
            let err = decode_video_payload(&json_headers(), body).unwrap_err();
            assert_eq!(err.to_string(), NO_VIDEO_DATA, "body {:?}", body);
        }
    }

    #[test]
    fn test_invalid_encoding() {
        let err = decode_video_payload(&HeaderMap::new(), b"not base64 at all!").unwrap_err();
        assert_eq!(err.to_string(), INVALID_ENCODING);

        let err = decode_video_payload(&HeaderMap::new(), &[0xff, 0xfe, 0x41]).unwrap_err();
        assert_eq!(err.to_string(), INVALID_ENCODING);
    }

    #[test]
    fn test_poll_kind() {
        assert_eq!(PollKind::parse(None).unwrap(), PollKind::Progress);
        assert_eq!(PollKind::parse(Some("progress")).unwrap(), PollKind::Progress);
        assert_eq!(PollKind::parse(Some("results")).unwrap(), PollKind::Results);
        assert!(PollKind::parse(Some("frames")).is_err());
    }
}
