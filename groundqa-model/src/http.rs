//! Shared response handling for the HTTP backends.

use groundqa_rag::FailureKind;
use reqwest::StatusCode;
use serde::Deserialize;

/// Classify a non-success HTTP status.
pub(crate) fn status_kind(status: StatusCode) -> FailureKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureKind::Authentication,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => FailureKind::Timeout,
        _ => FailureKind::Backend,
    }
}

/// Classify a transport-level `reqwest` error.
pub(crate) fn transport_kind(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() { FailureKind::Timeout } else { FailureKind::Network }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

/// Pull a human-readable message out of an error body, falling back to the raw body.
pub(crate) fn error_detail(body: String) -> String {
    if let Ok(e) = serde_json::from_str::<ErrorResponse>(&body) {
        return e.error.message;
    }
    if let Ok(e) = serde_json::from_str::<MessageResponse>(&body) {
        return e.message;
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_are_fatal() {
        assert_eq!(status_kind(StatusCode::UNAUTHORIZED), FailureKind::Authentication);
        assert_eq!(status_kind(StatusCode::FORBIDDEN), FailureKind::Authentication);
        assert_eq!(status_kind(StatusCode::INTERNAL_SERVER_ERROR), FailureKind::Backend);
        assert_eq!(status_kind(StatusCode::GATEWAY_TIMEOUT), FailureKind::Timeout);
    }

    #[test]
    fn error_detail_reads_known_shapes() {
        assert_eq!(error_detail(r#"{"error":{"message":"bad key"}}"#.into()), "bad key");
        assert_eq!(error_detail(r#"{"message":"throttled"}"#.into()), "throttled");
        assert_eq!(error_detail("plain".into()), "plain");
    }
}
