//! JSON envelopes returned by the HTTP service.
//!
//! Every response is one of two shapes:
//!
//! ```text
//! {"message": "...", "error": bool}                     MessageResponse
//! {"images": [{"size": "...", "base64": "..."}], "error": bool}   ImagesResponse
//! ```
//!
//! With failure reporting enabled, `ImagesResponse` also carries
//! `"failed": ["label", ...]` and `error` is true when that list is non-empty.
//! Sizes skipped because the request ran out of time always set `error`,
//! whichever mode is active.

use crate::dispatch::ResultSet;
use crate::imaging::ResultItem;
use crate::request::RequestError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

pub const PING_MESSAGE: &str = "Pong! You've pinged Akira. This endpoint will be used to get stats for a status page in the future.";
pub const ROOT_MESSAGE: &str = "You've bumped into Akira. You probably shouldn't be here.";
pub const NOT_FOUND_MESSAGE: &str = "Route does not exist.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub error: bool,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagesResponse {
    pub images: Vec<ResultItem>,
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<String>>,
}

impl ImagesResponse {
    /// Build the response body for one dispatch.
    ///
    /// Blank, failed and cancelled items never appear in `images`. Unless
    /// `report_failures` is set, a failed transform leaves `error` false;
    /// a cancelled size sets it in both modes.
    pub fn from_results(results: ResultSet, report_failures: bool) -> Self {
        let cancelled = results.has_cancelled();
        let failed: Vec<String> = results
            .failed_labels()
            .into_iter()
            .map(str::to_string)
            .collect();
        let images = results.into_usable();

        if report_failures {
            Self {
                images,
                error: cancelled || !failed.is_empty(),
                failed: Some(failed),
            }
        } else {
            Self {
                images,
                error: cancelled,
                failed: None,
            }
        }
    }
}

/// An error envelope with its status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        Self::new(err.status_code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageResponse::error(self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{QualityError, ResultItem};
    use serde_json::json;

    fn sample_results() -> ResultSet {
        ResultSet::from(vec![
            ResultItem::encoded("5x5", "data:image/jpeg;base64,AA==".to_string()),
            ResultItem::blank(),
            ResultItem::failed("abc", "invalid size"),
            ResultItem::cancelled("9x9"),
        ])
    }

    #[test]
    fn silent_mode_drops_failures_and_reports_no_error() {
        let results = ResultSet::from(vec![
            ResultItem::encoded("5x5", "data:image/jpeg;base64,AA==".to_string()),
            ResultItem::blank(),
            ResultItem::failed("abc", "invalid size"),
        ]);
        let body = ImagesResponse::from_results(results, false);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            json!({
                "images": [{"size": "5x5", "base64": "data:image/jpeg;base64,AA=="}],
                "error": false
            })
        );
    }

    #[test]
    fn cancelled_sizes_set_error_in_silent_mode() {
        let body = ImagesResponse::from_results(sample_results(), false);
        assert!(body.error);
        assert_eq!(body.failed, None);
        assert_eq!(body.images.len(), 1);
    }

    #[test]
    fn reporting_mode_lists_failed_labels() {
        let body = ImagesResponse::from_results(sample_results(), true);
        assert!(body.error);
        assert_eq!(
            body.failed,
            Some(vec!["abc".to_string(), "9x9".to_string()])
        );
        assert_eq!(body.images.len(), 1);
    }

    #[test]
    fn reporting_mode_without_failures_is_not_an_error() {
        let results = ResultSet::from(vec![ResultItem::blank()]);
        let body = ImagesResponse::from_results(results, true);
        assert!(!body.error);
        assert_eq!(body.failed, Some(Vec::new()));
    }

    #[test]
    fn empty_result_serializes_images_as_array() {
        let body = ImagesResponse::from_results(ResultSet::default(), false);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["images"], json!([]));
    }

    #[test]
    fn request_errors_map_to_status() {
        let err = ApiError::from(RequestError::MissingSize);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = ApiError::from(RequestError::Quality(QualityError::OutOfRange));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Quality must be between 0 and 100.");

        let err = ApiError::from(RequestError::ImageRead("boom".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("boom"));

        let err = ApiError::from(RequestError::UploadTooLarge("limit".into()));
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn message_response_shape() {
        let json = serde_json::to_value(MessageResponse::ok(PING_MESSAGE)).unwrap();
        assert_eq!(json, json!({"message": PING_MESSAGE, "error": false}));
    }
}
