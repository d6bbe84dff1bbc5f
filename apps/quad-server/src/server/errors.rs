use axum::{
    extract::rejection::BytesRejection, http::StatusCode, response::IntoResponse, Json,
};
use quad_protocol::ProtocolError;

use super::{metrics::record_rejected_query, types::ApiError};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ApiFailure {
    InvalidRequest,
    UnsupportedVersion,
    BatchTooLarge,
    PayloadTooLarge,
}

impl ApiFailure {
    const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnsupportedVersion => "unsupported_version",
            Self::BatchTooLarge => "batch_too_large",
            Self::PayloadTooLarge => "payload_too_large",
        }
    }
}

impl From<ProtocolError> for ApiFailure {
    fn from(value: ProtocolError) -> Self {
        match value {
            ProtocolError::OversizedPayload { .. } => Self::PayloadTooLarge,
            ProtocolError::UnsupportedVersion { .. } => Self::UnsupportedVersion,
            ProtocolError::InvalidBatchSize { actual, .. } if actual > 0 => Self::BatchTooLarge,
            ProtocolError::InvalidBatchSize { .. } | ProtocolError::InvalidJson => {
                Self::InvalidRequest
            }
        }
    }
}

impl From<BytesRejection> for ApiFailure {
    fn from(value: BytesRejection) -> Self {
        if value.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::InvalidRequest
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> axum::response::Response {
        let code = self.code();
        record_rejected_query(code);
        tracing::warn!(event = "authorize.rejected", reason = code);

        let status = match self {
            Self::InvalidRequest | Self::UnsupportedVersion | Self::BatchTooLarge => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        };
        (status, Json(ApiError { error: code })).into_response()
    }
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .with_span_list(true)
        .init();
}
