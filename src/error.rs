use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum MarketError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(reqwest::Error),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid payload: field '{field}' {reason}")]
    InvalidPayload { field: &'static str, reason: String },

    #[error("authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("no registry record found for NDC '{0}'")]
    DrugNotFound(String),

    #[error("a listing for '{0}' already exists")]
    Conflict(String),

    #[error("SQLite error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("stored record '{id}' is corrupt: {reason}")]
    CorruptRecord { id: String, reason: String },

    #[error("{0}")]
    Internal(String),
}

impl MarketError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } | Self::DrugNotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(_)
            | Self::CorruptRecord { .. }
            | Self::HttpClientInit(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidPayload { .. } => "invalid_payload",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::DrugNotFound(_) => "drug_not_found",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) | Self::CorruptRecord { .. } => "storage_error",
            Self::HttpClientInit(_) | Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 5xx details stay in the logs; callers get a stable kind only.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(serde_json::json!({
            "error": self.kind(),
            "message": message,
        }));
        (status, body).into_response()
    }
}
