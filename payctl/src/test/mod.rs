//! End-to-end tests over the full router with an in-memory database.

mod utils;

use crate::{
    api::models::users::Role,
    auth::session::{self, SessionClaims},
    db::handlers::Users,
    test_utils::{create_test_app, create_test_app_with_config, create_test_config, create_test_state, create_test_user},
};
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{Value, json};
use utils::{send, signup, transactions};

/// The walkthrough a new mobile user goes through: sign up, log back in,
/// pay someone, check the history.
#[test_log::test(tokio::test)]
async fn test_e2e_signup_login_send_list() {
    let (server, _pool) = create_test_app().await;

    let (user, signup_token) = signup(&server, "psp@example.com", "psp").await;
    assert_eq!(user["email"], "psp@example.com");
    assert_eq!(user["role"], "psp");
    assert!(user.get("passwordHash").is_none() && user.get("password_hash").is_none());

    let claims = session::verify_session_token(&signup_token, &create_test_config()).unwrap();
    assert_eq!(claims.email, "psp@example.com");
    assert_eq!(claims.role, Role::Psp);

    let login = server
        .post("/auth/login")
        .json(&json!({"email": "psp@example.com", "password": "password123"}))
        .await;
    assert_eq!(login.status_code(), 200);
    let login_body: Value = login.json();
    assert_eq!(login_body["status"], "success");
    assert_eq!(login_body["message"], "Login successful");
    let token = login_body["data"]["token"].as_str().unwrap().to_string();

    let response = send(&server, &token, json!({"recipient": "Bob", "amount": 50.00, "currency": "USD"})).await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["message"], "Payment sent successfully");
    let transaction = &body["data"]["transaction"];
    assert_eq!(transaction["amount"].as_f64(), Some(50.0));
    assert_eq!(transaction["status"], "completed");
    assert_eq!(transaction["currency"], "USD");
    assert_eq!(transaction["recipient"], "Bob");

    let listed = transactions(&server, &token).await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["transactions"][0]["id"], transaction["id"]);
}

#[test_log::test(tokio::test)]
async fn test_signup_rejects_duplicate_email() {
    let (server, pool) = create_test_app().await;
    signup(&server, "psp@example.com", "psp").await;

    let response = server
        .post("/auth/signup")
        .json(&json!({"email": "psp@example.com", "password": "another-password", "role": "dev"}))
        .await;

    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "User with this email already exists");

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(Users::new(&mut conn).count().await.unwrap(), 1);
}

#[test_log::test(tokio::test)]
async fn test_concurrent_signups_with_one_email_create_one_user() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config();
    config.database.url = format!("sqlite://{}", dir.path().join("payctl.db").display());
    config.database.max_connections = 4;
    let pool = crate::setup_database(&config).await.unwrap();
    let state = create_test_state(pool.clone(), config);
    let server = TestServer::new(crate::build_router(&state).unwrap()).unwrap();

    let (first, second) = tokio::join!(
        async {
            server
                .post("/auth/signup")
                .json(&json!({"email": "race@example.com", "password": "password123", "role": "psp"}))
                .await
        },
        async {
            server
                .post("/auth/signup")
                .json(&json!({"email": "race@example.com", "password": "password456", "role": "dev"}))
                .await
        },
    );

    let mut statuses = vec![first.status_code().as_u16(), second.status_code().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![201, 409]);

    let conflict = if first.status_code() == 409 { &first } else { &second };
    assert_eq!(conflict.json::<Value>()["message"], "User with this email already exists");

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(Users::new(&mut conn).count().await.unwrap(), 1);
}

#[test_log::test(tokio::test)]
async fn test_signup_validation_lists_each_field() {
    let (server, _pool) = create_test_app().await;

    let response = server
        .post("/auth/signup")
        .json(&json!({"email": "not-an-email", "password": "12345", "role": "admin"}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Validation failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "role"]);
}

#[test_log::test(tokio::test)]
async fn test_signup_role_is_case_insensitive() {
    let (server, _pool) = create_test_app().await;
    let (user, _) = signup(&server, "dev@example.com", "DEV").await;
    assert_eq!(user["role"], "dev");
}

#[test_log::test(tokio::test)]
async fn test_login_does_not_reveal_which_part_was_wrong() {
    let (server, _pool) = create_test_app().await;
    signup(&server, "psp@example.com", "psp").await;

    let wrong_password = server
        .post("/auth/login")
        .json(&json!({"email": "psp@example.com", "password": "password124"}))
        .await;
    let unknown_email = server
        .post("/auth/login")
        .json(&json!({"email": "nobody@example.com", "password": "password123"}))
        .await;

    assert_eq!(wrong_password.status_code(), 401);
    assert_eq!(unknown_email.status_code(), 401);
    let a: Value = wrong_password.json();
    let b: Value = unknown_email.json();
    assert_eq!(a["message"], "Invalid email or password");
    assert_eq!(a["message"], b["message"]);
}

#[test_log::test(tokio::test)]
async fn test_login_with_unknown_email_still_verifies_a_password() {
    let pool = crate::test_utils::create_test_pool().await;
    let mut state = create_test_state(pool, create_test_config());
    // An unusable decoy turns the otherwise silent verification into a 500
    state.login_decoy_hash = "not-a-phc-string".to_string();
    let server = TestServer::new(crate::build_router(&state).unwrap()).unwrap();

    let response = server
        .post("/auth/login")
        .json(&json!({"email": "nobody@example.com", "password": "password123"}))
        .await;
    assert_eq!(response.status_code(), 500);
}

#[test_log::test(tokio::test)]
async fn test_login_validation() {
    let (server, _pool) = create_test_app().await;
    let response = server.post("/auth/login").json(&json!({"email": "psp@example.com"})).await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["errors"][0]["field"], "password");
}

#[test_log::test(tokio::test)]
async fn test_malformed_json_is_validation_error() {
    let (server, _pool) = create_test_app().await;
    let response = server
        .post("/auth/signup")
        .text("{\"email\": ")
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Validation failed");
}

#[test_log::test(tokio::test)]
async fn test_protected_routes_require_token() {
    let (server, _pool) = create_test_app().await;

    let response = server.get("/transactions").await;
    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<Value>()["message"], "Access token required");

    let response = server
        .post("/send")
        .json(&json!({"recipient": "Bob", "amount": 5, "currency": "USD"}))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = server.get("/transactions").authorization_bearer("garbage").await;
    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<Value>()["message"], "Invalid token");
}

#[test_log::test(tokio::test)]
async fn test_expired_token_rejected_even_with_valid_body() {
    let (server, pool) = create_test_app().await;
    let (user, _) = create_test_user(&pool, "psp@example.com", Role::Psp).await;

    let now = Utc::now().timestamp();
    let expired = session::encode_claims(
        &SessionClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now - 3600,
            exp: now - 10,
        },
        &create_test_config(),
    )
    .unwrap();

    let response = send(&server, &expired, json!({"recipient": "Bob", "amount": 5, "currency": "USD"})).await;
    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<Value>()["message"], "Token expired");

    let response = server.get("/transactions").authorization_bearer(&expired).await;
    assert_eq!(response.status_code(), 401);
}

#[test_log::test(tokio::test)]
async fn test_token_from_another_secret_rejected() {
    let (server, _pool) = create_test_app().await;
    let mut other = create_test_config();
    other.secret_key = Some("someone-elses-secret".to_string());

    let forged = session::create_session_token(
        &crate::api::models::users::CurrentUser {
            id: 1,
            email: "psp@example.com".to_string(),
            role: Role::Psp,
        },
        &other,
    )
    .unwrap();

    let response = server.get("/transactions").authorization_bearer(&forged).await;
    assert_eq!(response.status_code(), 401);
    assert_eq!(response.json::<Value>()["message"], "Invalid token");
}

#[test_log::test(tokio::test)]
async fn test_routes_also_served_under_api_prefix() {
    let (server, _pool) = create_test_app().await;

    let response = server
        .post("/api/auth/signup")
        .json(&json!({"email": "psp@example.com", "password": "password123", "role": "psp"}))
        .await;
    assert_eq!(response.status_code(), 201);
    let token = response.json::<Value>()["data"]["token"].as_str().unwrap().to_string();

    let response = server
        .post("/api/send")
        .authorization_bearer(&token)
        .json(&json!({"recipient": "Bob", "amount": 12.5, "currency": "EUR"}))
        .await;
    assert_eq!(response.status_code(), 201);

    let response = server.get("/api/transactions").authorization_bearer(&token).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["data"]["count"], 1);
}

#[test_log::test(tokio::test)]
async fn test_unknown_route_is_404_envelope() {
    let (server, _pool) = create_test_app().await;

    let response = server.get("/api/does-not-exist").await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Route /api/does-not-exist not found");
    assert!(body["timestamp"].is_string());
}

#[test_log::test(tokio::test)]
async fn test_wrong_method_is_404_envelope() {
    let (server, _pool) = create_test_app().await;

    for (response, path) in [
        (server.get("/auth/signup").await, "/auth/signup"),
        (server.get("/api/auth/login").await, "/api/auth/login"),
        (server.delete("/health").await, "/health"),
    ] {
        assert_eq!(response.status_code(), 404, "{path}");
        let body: Value = response.json();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], format!("Route {path} not found"));
    }
}

#[test_log::test(tokio::test)]
async fn test_security_headers_on_every_response() {
    let (server, _pool) = create_test_app().await;

    for response in [server.get("/health").await, server.get("/nope").await] {
        let header = |name: &str| response.headers().get(name).map(|v| v.to_str().unwrap().to_string());
        assert_eq!(header("x-content-type-options").as_deref(), Some("nosniff"));
        assert_eq!(header("x-frame-options").as_deref(), Some("SAMEORIGIN"));
        assert_eq!(header("referrer-policy").as_deref(), Some("no-referrer"));
        assert!(header("strict-transport-security").is_some());
    }
}

#[test_log::test(tokio::test)]
async fn test_health_and_openapi() {
    let (server, _pool) = create_test_app().await;

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "API is healthy");
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);

    let response = server.get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.json::<Value>()["paths"]["/send"].is_object());
}

#[test_log::test(tokio::test)]
async fn test_oversized_body_rejected() {
    let mut config = create_test_config();
    config.body_limit_bytes = 256;
    let (server, pool) = create_test_app_with_config(config).await;

    let response = server
        .post("/auth/signup")
        .json(&json!({"email": "psp@example.com", "password": "x".repeat(1024), "role": "psp"}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Validation failed");
    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(Users::new(&mut conn).count().await.unwrap(), 0);
}
