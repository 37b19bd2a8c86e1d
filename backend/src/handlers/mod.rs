pub mod auth;
pub mod data;
pub mod dates;
pub mod matches;
pub mod profile;

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Json, Path,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::validation::FieldError;

/// Unwraps a JSON body, reporting malformed input as a validation error.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            Err(AppError::Validation(vec![FieldError {
                field: "body".to_string(),
                message: rejection.body_text(),
            }]))
        }
    }
}

/// Unwraps a UUID path segment, reporting a bad id against `field`.
pub(crate) fn path_id(path: Result<Path<Uuid>, PathRejection>, field: &str, message: &str) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id).map_err(|_| {
        AppError::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }])
    })
}
