use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::assist::AssistError;
use crate::export::ExportError;
use crate::validation::FieldError;
use crate::wizard::operation::OperationBusy;
use crate::wizard::state::WizardError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant leaves the session as it was; nothing here is fatal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{} field(s) failed validation", .0.len())]
    InvalidFields(Vec<FieldError>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Operation in progress: {0}")]
    OperationInProgress(String),

    #[error("AI assist is not configured")]
    AiNotConfigured,

    #[error("AI error: {0}")]
    AiFailed(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<WizardError> for AppError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::Invalid { report, .. } => AppError::InvalidFields(report.field_errors()),
            other => AppError::Conflict(other.to_string()),
        }
    }
}

impl From<OperationBusy> for AppError {
    fn from(e: OperationBusy) -> Self {
        AppError::OperationInProgress(e.to_string())
    }
}

impl From<AssistError> for AppError {
    fn from(e: AssistError) -> Self {
        match e {
            AssistError::NotConfigured => AppError::AiNotConfigured,
            AssistError::Precondition(msg) => AppError::Validation(msg),
            other => AppError::AiFailed(other.to_string()),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Export(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details: Option<Value> = None;

        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidFields(errors) => {
                details = Some(json!(errors));
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INVALID_FIELDS",
                    "Certains champs sont invalides.".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::OperationInProgress(msg) => (
                StatusCode::CONFLICT,
                "OPERATION_IN_PROGRESS",
                msg.clone(),
            ),
            AppError::AiNotConfigured => {
                tracing::warn!("AI assist requested but no API key is configured");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "AI_NOT_CONFIGURED",
                    "La clé API de l'assistant IA n'est pas configurée.".to_string(),
                )
            }
            AppError::AiFailed(msg) => {
                tracing::error!("AI error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "AI_FAILED",
                    "L'assistant IA n'a pas pu répondre. Veuillez réessayer.".to_string(),
                )
            }
            AppError::Export(msg) => {
                tracing::error!("Export error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_FAILED",
                    "Erreur lors de la génération du document.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
