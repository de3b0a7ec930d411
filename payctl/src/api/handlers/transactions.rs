use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{responses::ApiResponse, transactions::TransactionListResponse, users::CurrentUser},
    db::handlers::Transactions,
    errors::Error,
};

/// List the authenticated user's transactions, newest first
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    security(("BearerAuth" = [])),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = ApiResponse<TransactionListResponse>),
        (status = 401, description = "Missing, invalid or expired token", body = crate::errors::ErrorEnvelope),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn list_transactions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<TransactionListResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Transactions::new(&mut conn).list_for_user(user.id).await?;

    Ok(Json(ApiResponse::success(
        "Transactions retrieved successfully",
        TransactionListResponse::from(rows),
    )))
}
