//! Shared constructors for tests: in-memory databases, a fast config and a
//! ready-to-call test server.

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    auth::session,
    config::{AuthConfig, Config, PasswordConfig, PaymentsConfig, SettlementConfig},
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    payments::{PaymentProcessor, SettlementOutcome},
};
use axum_test::TestServer;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, sync::Arc};

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// Fresh, migrated in-memory database.
///
/// A single connection that never expires: every connection to
/// `sqlite::memory:` is its own database.
pub async fn create_test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");
    crate::migrator().run(&pool).await.expect("Failed to run migrations");
    pool
}

/// Config with cheap password hashing and settlement that always approves.
pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some(TEST_SECRET.to_string()),
        database: crate::config::DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        auth: AuthConfig {
            password: PasswordConfig {
                argon2_memory_kib: 64,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Default::default()
            },
            ..Default::default()
        },
        payments: PaymentsConfig {
            settlement: SettlementConfig::Fixed {
                outcome: SettlementOutcome::Approved,
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn create_test_state(pool: SqlitePool, config: Config) -> AppState {
    crate::install_crypto_provider();
    let payments = PaymentProcessor::from_config(pool.clone(), &config).expect("Failed to build payment processor");
    let login_decoy_hash = crate::auth::password::hash_string("decoy", (&config.auth.password).into())
        .expect("Failed to hash decoy password");
    AppState::builder()
        .db(pool)
        .config(config)
        .payments(Arc::new(payments))
        .login_decoy_hash(login_decoy_hash)
        .build()
}

/// Test server over the full router.
pub async fn create_test_app_with_config(config: Config) -> (TestServer, SqlitePool) {
    let pool = create_test_pool().await;
    let state = create_test_state(pool.clone(), config);
    let router = crate::build_router(&state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, pool)
}

pub async fn create_test_app() -> (TestServer, SqlitePool) {
    create_test_app_with_config(create_test_config()).await
}

/// Insert a user directly and return it with a valid token.
pub async fn create_test_user(pool: &SqlitePool, email: &str, role: Role) -> (CurrentUser, String) {
    let config = create_test_config();
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            password_hash: crate::auth::password::hash_string("password123", (&config.auth.password).into())
                .expect("Failed to hash password"),
            role,
        })
        .await
        .expect("Failed to create test user");
    let user = CurrentUser::from(&user);
    let token = session::create_session_token(&user, &config).expect("Failed to create token");
    (user, token)
}
