//! OpenAPI document for the payment API, served at `/api-docs/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::{handlers, models};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token returned by `/auth/signup` or `/auth/login`:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mobile Payment API",
        description = "Account authentication, simulated payments and transaction history."
    ),
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::payments::send_payment,
        handlers::transactions::list_transactions,
        handlers::health::health,
    ),
    components(schemas(
        models::auth::SignupRequest,
        models::auth::LoginRequest,
        models::auth::AuthResponse,
        models::users::Role,
        models::users::UserResponse,
        models::transactions::Currency,
        models::transactions::TransactionStatus,
        models::transactions::SendPaymentRequest,
        models::transactions::TransactionResponse,
        models::transactions::PaymentResponse,
        models::transactions::TransactionListResponse,
        models::responses::HealthResponse,
        crate::errors::ErrorEnvelope,
        crate::errors::FieldError,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Signup and login"),
        (name = "payments", description = "Sending money"),
        (name = "transactions", description = "Payment history"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
