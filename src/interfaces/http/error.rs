use crate::domain::errors::PredictionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

/// Error type for HTTP responses. Every variant renders as
/// `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Upstream(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg)
            | Self::NotFound(msg)
            | Self::Unavailable(msg)
            | Self::Upstream(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        match e {
            PredictionError::Unsupported(_) => Self::BadRequest(e.to_string()),
            PredictionError::Unavailable(_) => Self::Unavailable(e.to_string()),
            PredictionError::MarketData(_) | PredictionError::InsufficientHistory { .. } => {
                Self::Upstream(e.to_string())
            }
            PredictionError::Forecast(_) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("HTTP: {} {}", status.as_u16(), self.message());
        } else {
            warn!("HTTP: {} {}", status.as_u16(), self.message());
        }

        let body = json!({ "error": self.message() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ArtifactError, ForecastError, MarketDataError, RegistryError};
    use std::path::PathBuf;

    #[test]
    fn test_prediction_error_status_mapping() {
        let unsupported = ApiError::from(PredictionError::Unsupported(
            RegistryError::UnsupportedToken {
                token: "shiba".to_string(),
                supported: vec!["bitcoin".to_string()],
            },
        ));
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);
        assert_eq!(unsupported.message(), "Unsupported token. Try: [\"bitcoin\"]");

        let missing = ApiError::from(PredictionError::Unavailable(ArtifactError::NotFound {
            path: PathBuf::from("models/bitcoin/model.json"),
        }));
        assert_eq!(missing.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(missing.message(), "Model not trained for this token");

        let upstream = ApiError::from(PredictionError::MarketData(MarketDataError::Status {
            id: "bitcoin".to_string(),
            status: 429,
            body: "rate limited".to_string(),
        }));
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let model = ApiError::from(PredictionError::Forecast(ForecastError::NoExamples));
        assert_eq!(model.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
