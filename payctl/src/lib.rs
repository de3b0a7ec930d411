//! # payctl: Mobile payment backend
//!
//! `payctl` is the REST backend of a demo mobile-payment app. It signs users
//! up and in, accepts payment requests from authenticated users, settles them
//! through a pluggable (today simulated) gateway, keeps a per-user ledger of
//! completed payments and notifies an external webhook when money moves.
//!
//! ## Request flow
//!
//! Clients obtain a bearer token from `/auth/signup` or `/auth/login`. Calls to
//! `/send` and `/transactions` pass through the authentication middleware
//! ([`auth::middleware`]), which verifies the token before any handler runs and
//! hands the verified identity to the handler. The caller's user id always comes
//! from the token, never from the request body.
//!
//! A payment then moves through the [`payments::PaymentProcessor`]:
//!
//! ```text
//! validate ──invalid──▶ 400 Validation failed
//!    │
//! settle ───declined──▶ 400 Payment failed (nothing recorded)
//!    │
//! record (status=completed) ──▶ 201 {transaction}
//!    │
//! webhook (spawned; outcome logged, never returned)
//! ```
//!
//! ## Components
//!
//! - [`api`]: Axum handlers and request/response models
//! - [`auth`]: Password hashing, session tokens, bearer middleware
//! - [`db`]: SQLite repositories for users and the ledger
//! - [`payments`]: Validation, settlement and recording
//! - [`webhooks`]: Outbound `payment.completed` notifications
//! - [`config`]: Layered configuration
//! - [`errors`]: The error taxonomy and its HTTP mapping
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use payctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     payctl::install_crypto_provider();
//!     let args = payctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     payctl::telemetry::init_telemetry(&config.telemetry)?;
//!
//!     Application::new(config)
//!         .await?
//!         .serve(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod payments;
pub mod telemetry;
mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod test;

use crate::{
    api::{
        handlers::{auth as auth_handlers, health, payments as payment_handlers, transactions as transaction_handlers},
        models::users::Role,
    },
    auth::{middleware::require_auth, password::Argon2Params},
    config::CorsOrigin,
    db::{
        handlers::{Repository, Transactions, Users},
        models::{transactions::TransactionCreateDBRequest, users::UserCreateDBRequest},
    },
    errors::{expose_internal_errors, route_not_found},
    openapi::ApiDoc,
    payments::PaymentProcessor,
};
use anyhow::Context;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use rust_decimal::Decimal;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, sync::Arc, time::Instant};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;

pub use types::{TransactionId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .payments(Arc::new(processor))
///     .login_decoy_hash(decoy)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub payments: Arc<PaymentProcessor>,
    /// Verified against on logins naming an unknown email
    pub login_decoy_hash: String,
    #[builder(default = Instant::now())]
    pub started_at: Instant,
}

/// Install the process-wide rustls provider used by the outbound webhook
/// client. Safe to call more than once.
pub fn install_crypto_provider() {
    // Err only means a provider is already installed
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Get the payctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

const DEMO_PASSWORD: &str = "password123";

/// Demo ledger: (owner email, recipient, amount in cents)
const DEMO_TRANSACTIONS: &[(&str, &str, i64)] = &[
    ("psp@example.com", "Alice Johnson", 25_000),
    ("psp@example.com", "Bob Smith", 15_075),
    ("psp@example.com", "Carol Davis", 32_050),
    ("dev@example.com", "API Gateway", 5_000),
    ("dev@example.com", "Cloud Services", 12_599),
];

/// Seed demo accounts and a handful of completed payments.
///
/// Only runs against an empty `users` table, so restarting never duplicates
/// data or touches real accounts. Everything is written in one transaction.
/// Returns whether anything was seeded.
#[instrument(skip_all, err)]
pub async fn seed_demo_data(db: &SqlitePool, params: Argon2Params) -> anyhow::Result<bool> {
    let mut tx = db.begin().await?;

    if Users::new(&mut tx).count().await? > 0 {
        info!("Users already present, skipping demo seed");
        tx.rollback().await?;
        return Ok(false);
    }

    let password_hash = auth::password::hash_password(DEMO_PASSWORD.to_string(), params).await?;

    let mut owners = Vec::new();
    for (email, role) in [("psp@example.com", Role::Psp), ("dev@example.com", Role::Dev)] {
        let user = Users::new(&mut tx)
            .create(&UserCreateDBRequest {
                email: email.to_string(),
                password_hash: password_hash.clone(),
                role,
            })
            .await
            .with_context(|| format!("seed user {email}"))?;
        owners.push(user);
    }

    for &(email, recipient, cents) in DEMO_TRANSACTIONS {
        let owner = owners
            .iter()
            .find(|user| user.email == email)
            .with_context(|| format!("demo owner {email} was not seeded"))?;
        Transactions::new(&mut tx)
            .create(&TransactionCreateDBRequest {
                user_id: owner.id,
                recipient: recipient.to_string(),
                amount: Decimal::new(cents, 2),
                currency: api::models::transactions::Currency::Usd,
                status: api::models::transactions::TransactionStatus::Completed,
            })
            .await
            .with_context(|| format!("seed transaction to {recipient}"))?;
    }

    tx.commit().await?;
    info!(
        users = owners.len(),
        transactions = DEMO_TRANSACTIONS.len(),
        "Seeded demo data"
    );
    Ok(true)
}

/// Connect, migrate and optionally seed. Each step aborts startup on failure.
#[instrument(skip_all, err)]
pub async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database.url)
        .with_context(|| format!("invalid database url '{}'", config.database.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(options)
        .await
        .context("connect to database")?;
    info!(url = %config.database.url, "Connected to database");

    migrator().run(&pool).await.context("run database migrations")?;
    debug!("Database migrations applied");

    if config.seed_demo_data {
        seed_demo_data(&pool, Argon2Params::from(&config.auth.password)).await?;
    }

    Ok(pool)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;

    // A wildcard anywhere allows every origin, and rules out credentials
    let wildcard = cors_config.allowed_origins.contains(&CorsOrigin::Wildcard);
    let allow_origin = if wildcard {
        AllowOrigin::any()
    } else {
        let origins = cors_config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin {
                CorsOrigin::Url(url) => Some(url.origin().ascii_serialization()),
                CorsOrigin::Wildcard => None,
            })
            .map(|origin| origin.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_credentials(cors_config.allow_credentials && !wildcard);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Routes shared by the root and the `/api` prefix.
fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/send", post(payment_handlers::send_payment))
        .route("/transactions", get(transaction_handlers::list_transactions))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/auth/signup", post(auth_handlers::signup))
        .route("/auth/login", post(auth_handlers::login))
        .route("/health", get(health::health))
        .merge(protected)
        .method_not_allowed_fallback(route_not_found)
}

/// Baseline hardening headers for every response, unless a handler set its own.
fn security_headers() -> [SetResponseHeaderLayer<HeaderValue>; 6] {
    [
        (http::header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        (http::header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (http::header::REFERRER_POLICY, "no-referrer"),
        (http::header::STRICT_TRANSPORT_SECURITY, "max-age=15552000; includeSubDomains"),
        (http::header::X_XSS_PROTECTION, "0"),
        (http::header::X_DNS_PREFETCH_CONTROL, "off"),
    ]
    .map(|(name, value)| SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value)))
}

/// Build the application router with all endpoints and middleware.
///
/// Layers, outermost first: tracing, optional Prometheus metrics, CORS, the
/// request body limit, security headers, then development-mode error detail.
/// Unknown paths and unsupported methods both answer with the 404 error
/// envelope.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api = api_routes(state);

    let mut router = Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .fallback(route_not_found)
        .layer(from_fn_with_state(state.clone(), expose_internal_errors))
        .with_state(state.clone());

    for header in security_headers() {
        router = router.layer(header);
    }
    router = router.layer(
        ServiceBuilder::new()
            .layer(create_cors_layer(&state.config)?)
            .layer(DefaultBodyLimit::max(state.config.body_limit_bytes)),
    );

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    Ok(router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    ))
}

pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!(environment = ?config.environment, "Starting payctl");

        let pool = setup_database(&config).await?;
        let payments = PaymentProcessor::from_config(pool.clone(), &config)?;

        let login_decoy_hash = auth::password::decoy_hash(Argon2Params::from(&config.auth.password)).await?;

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .payments(Arc::new(payments))
            .login_decoy_hash(login_decoy_hash)
            .build();

        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("bind {bind_addr}"))?;
        info!(
            "Payment API listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
