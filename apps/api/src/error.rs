use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nomadgate_application::{Rejection, RejectionStage, TrustAdminError};
use nomadgate_core::AppError;
use serde::Serialize;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// Structured rejection payload.
#[derive(Debug, Serialize)]
pub struct RejectionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_id: Option<String>,
    pub stage: &'static str,
    pub path: Option<String>,
    pub reason: String,
    pub message: String,
}

impl RejectionResponse {
    pub fn new(rejection: &Rejection, admission_id: Option<String>) -> Self {
        Self {
            admission_id,
            stage: rejection.stage().as_str(),
            path: rejection.path().map(|path| path.as_str().to_owned()),
            reason: rejection.reason().to_owned(),
            message: rejection.to_string(),
        }
    }
}

/// HTTP API error wrapper around application errors and rejections.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    Rejected(Rejection),
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

impl From<Rejection> for ApiError {
    fn from(value: Rejection) -> Self {
        Self::Rejected(value)
    }
}

impl From<TrustAdminError> for ApiError {
    fn from(value: TrustAdminError) -> Self {
        match value {
            TrustAdminError::Rejected(rejection) => Self::Rejected(rejection),
            TrustAdminError::App(error) => Self::App(error),
        }
    }
}

pub fn rejection_status(rejection: &Rejection) -> StatusCode {
    match rejection.stage() {
        RejectionStage::Token
        | RejectionStage::Issuer
        | RejectionStage::Key
        | RejectionStage::Signature => StatusCode::UNAUTHORIZED,
        RejectionStage::BoundClaims | RejectionStage::JobSpec => StatusCode::FORBIDDEN,
        RejectionStage::Registration => StatusCode::BAD_REQUEST,
        RejectionStage::Role => StatusCode::NOT_FOUND,
        RejectionStage::Compile => StatusCode::UNPROCESSABLE_ENTITY,
        RejectionStage::KeySet | RejectionStage::Dispatch => StatusCode::BAD_GATEWAY,
        RejectionStage::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::App(error) => {
                let status = match error {
                    AppError::Validation(_) => StatusCode::BAD_REQUEST,
                    AppError::NotFound(_) => StatusCode::NOT_FOUND,
                    AppError::Conflict(_) => StatusCode::CONFLICT,
                    AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                    AppError::Forbidden(_) => StatusCode::FORBIDDEN,
                    AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };

                let payload = Json(ErrorResponse {
                    message: error.to_string(),
                });

                (status, payload).into_response()
            }
            Self::Rejected(rejection) => (
                rejection_status(&rejection),
                Json(RejectionResponse::new(&rejection, None)),
            )
                .into_response(),
        }
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
