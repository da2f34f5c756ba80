use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use super::claims::TokenKind;
use super::services::JwtKeys;
use crate::error::AppError;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingHeader,
    UnsupportedScheme,
    InvalidToken,
    WrongTokenKind,
}

impl RejectReason {
    pub fn message(self) -> &'static str {
        match self {
            RejectReason::MissingHeader => "Missing Authorization header",
            RejectReason::UnsupportedScheme => "Invalid Authorization header",
            RejectReason::InvalidToken => "Invalid or expired token",
            RejectReason::WrongTokenKind => "Access token required",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized(Uuid),
    Rejected(RejectReason),
}

/// Pulls the credential out of `Bearer <jwt>` or `Token <jwt>`.
fn credential(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    match scheme.to_ascii_lowercase().as_str() {
        "bearer" | "token" => Some(token),
        _ => None,
    }
}

/// Decides whether the request carries a valid access token.
pub fn authorize(headers: &HeaderMap, keys: &JwtKeys) -> AuthOutcome {
    let Some(header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) else {
        return AuthOutcome::Rejected(RejectReason::MissingHeader);
    };
    let Some(token) = credential(header) else {
        return AuthOutcome::Rejected(RejectReason::UnsupportedScheme);
    };
    match keys.verify(token) {
        Ok(claims) if claims.kind == TokenKind::Access => AuthOutcome::Authorized(claims.sub),
        Ok(_) => AuthOutcome::Rejected(RejectReason::WrongTokenKind),
        Err(e) => {
            warn!(error = %e, "invalid or expired token");
            AuthOutcome::Rejected(RejectReason::InvalidToken)
        }
    }
}

/// The authenticated caller's user id.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        match authorize(&parts.headers, &keys) {
            AuthOutcome::Authorized(user_id) => Ok(AuthUser(user_id)),
            AuthOutcome::Rejected(reason) => Err(AppError::Unauthorized(reason.message().into())),
        }
    }
}
