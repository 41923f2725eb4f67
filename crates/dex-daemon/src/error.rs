use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use dex_sync::SyncError;

use crate::api_types::ErrorBody;

/// Handler error: a [`SyncError`] rendered as `{ "error", "message" }`.
#[derive(Debug)]
pub struct ApiError(pub SyncError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SyncError::NotFound(_) => StatusCode::NOT_FOUND,
            SyncError::Validation(_) => StatusCode::BAD_REQUEST,
            SyncError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::Unrecoverable(_) | SyncError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "request failed");
        }
        let body = ErrorBody {
            error: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_sync::NotFoundTarget;

    #[test]
    fn status_mapping() {
        let cases = [
            (
                SyncError::NotFound(NotFoundTarget::LocalRecord(1)),
                StatusCode::NOT_FOUND,
            ),
            (SyncError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                SyncError::UpstreamUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                SyncError::Unrecoverable("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (SyncError::Store("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, want) in cases {
            assert_eq!(ApiError(err).status(), want);
        }
    }
}
