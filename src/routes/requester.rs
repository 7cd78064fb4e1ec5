use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::constants::{ERR_INVALID_REQUESTER, USER_ID_HEADER, USER_SIGNATURE_HEADER};
use crate::db::tables::parse_digits;
use crate::error::AppError;
use crate::security::verify_hmac;
use crate::AppState;

/// Authenticated user id forwarded by the gateway
///
/// Requires `X-User-Id` and `X-User-Signature`, the latter being the hex
/// HMAC-SHA256 of the id under the shared app secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester(pub i64);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

#[async_trait]
impl FromRequestParts<AppState> for Requester {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user_id = header(parts, USER_ID_HEADER).ok_or(AppError::Unauthorized)?;
        let signature = header(parts, USER_SIGNATURE_HEADER).ok_or(AppError::Unauthorized)?;

        if !verify_hmac(user_id, signature, &state.config.app_secret_key) {
            tracing::warn!("Invalid requester signature");
            return Err(AppError::InvalidSignature);
        }

        let id = parse_digits(user_id)
            .ok_or_else(|| AppError::InvalidInput(ERR_INVALID_REQUESTER.to_string()))?;
        Ok(Requester(id))
    }
}
