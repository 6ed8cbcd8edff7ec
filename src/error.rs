use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use thiserror::Error;

/// Erreurs métier renvoyées par les services.
/// Chaque variante correspond à un statut HTTP, le corps est toujours
/// `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Formation not purchased or payment not completed")]
    NotEntitled,
    #[error("Download limit reached")]
    QuotaExceeded,
    #[error("{0}")]
    NotFound(String),
    #[error("No order matches this payment reference")]
    WebhookMismatch,
    #[error("{0}")]
    Conflict(String),
    #[error("Failed to generate download link: {0}")]
    LinkGenerationFailed(String),
    #[error("Payment provider error: {0}")]
    UpstreamFailure(String),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::NotEntitled | AppError::QuotaExceeded => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound(_) | AppError::WebhookMismatch => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::LinkGenerationFailed(_)
            | AppError::UpstreamFailure(_)
            | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
