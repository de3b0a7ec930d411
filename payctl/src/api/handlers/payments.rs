use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        responses::ApiResponse,
        transactions::{PaymentResponse, SendPaymentRequest, TransactionResponse},
        users::CurrentUser,
    },
    errors::Error,
};

/// Send a payment from the authenticated user
///
/// Settlement may decline an otherwise valid payment, in which case nothing
/// is recorded and the request fails with 400.
#[utoipa::path(
    post,
    path = "/send",
    request_body = SendPaymentRequest,
    tag = "payments",
    security(("BearerAuth" = [])),
    responses(
        (status = 201, description = "Payment sent successfully", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Validation failed or payment declined", body = crate::errors::ErrorEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = crate::errors::ErrorEnvelope),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = user.id))]
pub async fn send_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<SendPaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), Error> {
    let Json(request) = body?;
    let transaction = state.payments.submit(&user, &request).await?;

    Ok(ApiResponse::success(
        "Payment sent successfully",
        PaymentResponse {
            transaction: TransactionResponse::from(transaction),
        },
    )
    .with_status(StatusCode::CREATED))
}
