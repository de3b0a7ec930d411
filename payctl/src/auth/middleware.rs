use crate::{AppState, auth::current_user::authenticate, errors::Error};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Reject requests without a valid bearer token before any handler runs.
///
/// On success the verified [`CurrentUser`](crate::api::models::users::CurrentUser)
/// is stored in the request extensions for the extractor to pick up.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, Error> {
    let user = authenticate(request.headers(), &state.config).inspect_err(|e| {
        debug!(path = %request.uri().path(), error = %e, "Rejected unauthenticated request");
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
