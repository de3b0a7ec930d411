use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::info;

use crate::{
    AppState,
    api::models::{
        auth::{AuthResponse, LoginRequest, SignupRequest},
        responses::ApiResponse,
        users::{CurrentUser, UserResponse},
    },
    auth::{
        password::{self, Argon2Params},
        session,
    },
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    errors::Error,
};

/// Create an account and sign it in
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorEnvelope),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorEnvelope),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), Error> {
    let Json(request) = body?;
    let account = request.validate(state.config.auth.password.min_length)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Users::new(&mut conn).find_by_email(&account.email).await?.is_some() {
        return Err(Error::DuplicateEmail);
    }

    let password_hash = password::hash_password(account.password, Argon2Params::from(&state.config.auth.password)).await?;

    // A concurrent signup can still win the race between the check and the insert
    let created = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: account.email,
            password_hash,
            role: account.role,
        })
        .await
        .map_err(|e| {
            if e.is_unique_violation_on("users", "email") {
                Error::DuplicateEmail
            } else {
                Error::Database(e)
            }
        })?;

    let token = session::create_session_token(&CurrentUser::from(&created), &state.config)?;
    info!(user_id = created.id, role = %created.role, "User signed up");

    Ok(ApiResponse::success(
        "User created successfully",
        AuthResponse {
            user: UserResponse::from(created),
            token,
        },
    )
    .with_status(StatusCode::CREATED))
}

/// Exchange email and password for a session token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorEnvelope),
        (status = 401, description = "Invalid email or password", body = crate::errors::ErrorEnvelope),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthResponse>>, Error> {
    let Json(request) = body?;
    let credentials = request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let Some(user) = Users::new(&mut conn).find_by_email(&credentials.email).await? else {
        // Same Argon2 work as a wrong password, so timing does not reveal accounts
        password::verify_password(credentials.password, state.login_decoy_hash.clone()).await?;
        return Err(Error::InvalidCredentials);
    };

    if !password::verify_password(credentials.password, user.password_hash.clone()).await? {
        return Err(Error::InvalidCredentials);
    }

    let token = session::create_session_token(&CurrentUser::from(&user), &state.config)?;
    info!(user_id = user.id, "User logged in");

    Ok(Json(ApiResponse::success(
        "Login successful",
        AuthResponse {
            user: UserResponse::from(user),
            token,
        },
    )))
}
