use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use taskapi_core::error::{CoreError, ErrorKind};
use taskapi_db::store::StoreError;

use crate::response::ApiResponse;
use crate::services::ServiceError;

/// Detail returned in place of any internal error message.
const CONTACT_ADMIN: &str = "Contact the system administrator";

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain, service and storage errors and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce the standard envelope
/// with `success: false`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Lookup by something other than the id found nothing.
    #[error("{entity} not found: {detail}")]
    NotFound { entity: &'static str, detail: String },

    /// A malformed request the framework could not decode.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// The one place an [`ErrorKind`] becomes an HTTP status.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Core(err) => err.kind(),
            AppError::Service(err) => err.kind(),
            AppError::Store(err) => err.kind(),
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::BadRequest(_) => ErrorKind::Validation,
        }
    }

    /// Headline message and detail list for the envelope.
    fn describe(&self) -> (String, Vec<String>) {
        match self {
            AppError::Core(CoreError::NotFound { entity, id }) => (
                format!("{entity} not found"),
                vec![format!("No {} exists with id {id}", entity.to_lowercase())],
            ),
            AppError::NotFound { entity, detail } => {
                (format!("{entity} not found"), vec![detail.clone()])
            }
            AppError::Core(CoreError::Validation(errors))
            | AppError::Service(ServiceError::Validation(errors)) => {
                ("Invalid input data".into(), errors.clone())
            }
            AppError::Service(ServiceError::NotImplemented(op)) => (
                "Method not implemented".into(),
                vec![format!("{op} is left as an exercise and is not implemented yet")],
            ),
            AppError::Service(
                err @ (ServiceError::DuplicateName(_) | ServiceError::DuplicateEmail(_)),
            ) => ("Data conflict".into(), vec![err.to_string()]),
            AppError::BadRequest(msg) => ("Invalid request".into(), vec![msg.clone()]),
            other => match other.kind() {
                ErrorKind::Conflict => (
                    "Data conflict".into(),
                    vec!["The request conflicts with existing data".into()],
                ),
                ErrorKind::Validation => (
                    "Invalid input data".into(),
                    vec!["The request references data that does not exist".into()],
                ),
                _ => ("Internal server error".into(), vec![CONTACT_ADMIN.into()]),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);

        if kind == ErrorKind::Internal {
            tracing::error!(error = %self, "Internal error");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request failed");
        }

        let (message, errors) = self.describe();
        (status, Json(ApiResponse::error(message, errors))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
