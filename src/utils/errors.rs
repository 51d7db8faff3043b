//! Application-wide error taxonomy and its mapping onto HTTP responses.
//!
//! Endpoints answer with a JSON body `{ error, details?, redirect? }`; the
//! redirect hint tells the frontend where to send an unauthenticated user.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::models::UnknownRole;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(String),

    #[error("Email already in use")]
    DuplicateEmail,

    #[error("Mobile number already in use")]
    DuplicateMobile,

    #[error("Identifier already in use")]
    DuplicateId(String),

    #[error("Invalid security code")]
    InvalidSecurityCode,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized: Please log in first")]
    Unauthorized,

    #[error("Invalid session data")]
    SessionInvalid,

    #[error("Forbidden")]
    Forbidden(String),

    #[error("Not found")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateEmail
            | ApiError::DuplicateMobile
            | ApiError::DuplicateId(_)
            | ApiError::InvalidSecurityCode => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::Unauthorized
            | ApiError::SessionInvalid => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::Validation(d) => Some(d.clone()),
            ApiError::DuplicateEmail => {
                Some("This email is already registered with another account".to_string())
            }
            ApiError::DuplicateMobile => {
                Some("This mobile number is already registered with another account".to_string())
            }
            ApiError::DuplicateId(d) | ApiError::Forbidden(d) | ApiError::NotFound(d) => {
                Some(d.clone())
            }
            _ => None,
        }
    }

    fn redirect(&self) -> Option<&'static str> {
        match self {
            ApiError::Unauthorized | ApiError::SessionInvalid => Some("/"),
            _ => None,
        }
    }
}

impl From<UnknownRole> for ApiError {
    fn from(e: UnknownRole) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            log::error!("Internal error: {err:#}");
        }

        let mut body = json!({ "error": self.to_string() });
        if let Some(details) = self.details() {
            body["details"] = json!(details);
        }
        if let Some(redirect) = self.redirect() {
            body["redirect"] = json!(redirect);
        }

        (self.status(), Json(body)).into_response()
    }
}
