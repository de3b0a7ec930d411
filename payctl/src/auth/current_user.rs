use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::{instrument, trace};

/// Pull the token out of an `Authorization: Bearer <token>` header.
///
/// A missing header, a non-Bearer scheme and an empty token all count as no
/// token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Verify the bearer token on a request.
#[instrument(skip_all)]
pub fn authenticate(headers: &HeaderMap, config: &Config) -> Result<CurrentUser> {
    let token = bearer_token(headers).ok_or(Error::Unauthenticated)?;
    let user = session::verify_session_token(token, config)?;
    trace!(user_id = user.id, "Bearer token verified");
    Ok(user)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Set by the auth middleware on protected routes
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }
        authenticate(&parts.headers, &state.config)
    }
}
