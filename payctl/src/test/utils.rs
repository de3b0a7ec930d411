//! Helpers for driving the HTTP API in end-to-end tests.

use axum_test::TestServer;
use serde_json::{Value, json};

/// Sign up through the API, asserting success, and return `(user, token)`.
pub async fn signup(server: &TestServer, email: &str, role: &str) -> (Value, String) {
    let response = server
        .post("/auth/signup")
        .json(&json!({"email": email, "password": "password123", "role": role}))
        .await;
    assert_eq!(response.status_code(), 201, "signup failed: {}", response.text());

    let body: Value = response.json();
    let token = body["data"]["token"].as_str().expect("token in signup response").to_string();
    (body["data"]["user"].clone(), token)
}

/// `POST /send` as the holder of `token`.
pub async fn send(server: &TestServer, token: &str, payment: Value) -> axum_test::TestResponse {
    server.post("/send").authorization_bearer(token).json(&payment).await
}

/// `GET /transactions` as the holder of `token`, asserting success.
pub async fn transactions(server: &TestServer, token: &str) -> Value {
    let response = server.get("/transactions").authorization_bearer(token).await;
    assert_eq!(response.status_code(), 200, "listing failed: {}", response.text());
    response.json::<Value>()["data"].clone()
}
