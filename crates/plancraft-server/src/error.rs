use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use plancraft_core::PlanError;
use serde_json::json;
use tracing::{error, warn};

/// A [`PlanError`] rendered as `{"detail": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub PlanError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<PlanError> for ApiError {
    fn from(e: PlanError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PlanError::NotFound(_) => StatusCode::NOT_FOUND,
            PlanError::Conflict(_) => StatusCode::CONFLICT,
            PlanError::Validation(_) | PlanError::InvalidArguments { .. } => {
                StatusCode::BAD_REQUEST
            }
            PlanError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match &self.0 {
            PlanError::Conflict(m)
            | PlanError::Validation(m)
            | PlanError::Unauthorized(m)
            | PlanError::MissingCredential(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            warn!(status = status.as_u16(), %detail, "request rejected");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
