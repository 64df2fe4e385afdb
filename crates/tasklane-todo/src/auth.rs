//! Bearer-token extraction.
//!
//! Handlers take a [`CurrentUser`] argument; the request is rejected with
//! 401 before the handler runs when the token is missing, malformed,
//! wrongly signed or expired.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tasklane_core::{ApiError, TokenError, TokenKeys};
use tracing::debug;

pub const TOKEN_INVALID: &str = "Token inválido";
pub const TOKEN_EXPIRED: &str = "Token expirado";

/// Username carried by a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    TokenKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| ApiError::Unauthorized(TOKEN_INVALID.to_string()))?;

        let keys = TokenKeys::from_ref(state);
        match keys.verify(token) {
            Ok(claims) => Ok(CurrentUser(claims.sub)),
            Err(TokenError::Expired) => Err(ApiError::Unauthorized(TOKEN_EXPIRED.to_string())),
            Err(e) => {
                debug!(error = %e, "token rejected");
                Err(ApiError::Unauthorized(TOKEN_INVALID.to_string()))
            }
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
