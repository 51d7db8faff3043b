//! Session middleware: resolves the logged-in principal from the session.
//!
//! The session stores exactly one tagged `{role, id}` value, overwritten on
//! every login, so a session can never speak for two principals at once.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::{Role, UserId};
use crate::utils::errors::ApiError;

/// Session key holding the current principal.
pub const SESSION_PRINCIPAL_KEY: &str = "principal";

/// The single authenticated identity a session resolves to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionPrincipal {
    pub role: Role,
    pub id: UserId,
}

impl SessionPrincipal {
    /// Narrows the principal to one expected role. A mismatch is treated
    /// the same as not being logged in at all.
    pub fn require(self, role: Role) -> Result<UserId, ApiError> {
        if self.role == role {
            Ok(self.id)
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

fn principal_of(parts: &Parts) -> Option<SessionPrincipal> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<SessionPrincipal>(SESSION_PRINCIPAL_KEY)
        .ok()
        .flatten()
}

/// Extractor for routes that require a logged-in principal of any role.
pub struct Authed(pub SessionPrincipal);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Authed
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        principal_of(parts).map(Authed).ok_or(ApiError::Unauthorized)
    }
}

/// Extractor for routes that work with or without a session, like the
/// public blog submission.
pub struct MaybeAuthed(pub Option<SessionPrincipal>);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for MaybeAuthed
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthed(principal_of(parts)))
    }
}
