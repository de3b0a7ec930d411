//! Configuration management.
//!
//! Configuration is layered with figment, later sources overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. YAML file (`config.yaml`, or the path given with `-f`)
//! 3. `PAYCTL_`-prefixed environment variables, `__` separating nested keys
//!    (e.g. `PAYCTL_WEBHOOK__URL`, `PAYCTL_AUTH__TOKEN_EXPIRY=1h`)
//! 4. The bare variables older deployments set: `DATABASE_URL`, `WEBHOOK_URL`,
//!    `JWT_SECRET` and `PORT`
//!
//! ```yaml
//! port: 3000
//! environment: production
//! secret_key: change-me
//! database:
//!   url: sqlite://payctl.db
//! payments:
//!   max_amount: 10000.00
//!   settlement:
//!     simulated:
//!       success_rate: 0.9
//! webhook:
//!   url: https://hooks.example.com/payments
//!   timeout: 5s
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;
use crate::payments::settlement::SettlementOutcome;

/// Longest session token lifetime accepted by [`Config::validate`]
pub const MAX_TOKEN_EXPIRY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PAYCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Development mode exposes internal error text in 500 responses
    pub environment: Environment,
    /// Secret for signing session tokens (required)
    pub secret_key: Option<String>,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub webhook: WebhookConfig,
    pub cors: CorsConfig,
    /// Maximum accepted request body size
    pub body_limit_bytes: usize,
    /// Insert the demo accounts and sample payments into an empty database
    pub seed_demo_data: bool,
    /// Serve Prometheus metrics at `/internal/metrics`
    pub enable_metrics: bool,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite connection string; the file is created if missing
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://payctl.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Lifetime of issued session tokens
    #[serde(with = "humantime_serde")]
    pub token_expiry: Duration,
    pub password: PasswordConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_expiry: Duration::from_secs(24 * 60 * 60),
            password: PasswordConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentsConfig {
    /// Largest amount a single payment may carry
    pub max_amount: Decimal,
    pub settlement: SettlementConfig,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            max_amount: Decimal::new(1_000_000, 2),
            settlement: SettlementConfig::default(),
        }
    }
}

/// How payment settlement is decided.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementConfig {
    /// Random outcome, approving with probability `success_rate`
    /// - `PAYCTL_PAYMENTS__SETTLEMENT__SIMULATED__SUCCESS_RATE`
    Simulated {
        #[serde(default = "default_success_rate")]
        success_rate: f64,
    },
    /// Every payment gets the same outcome (demos and tests)
    /// - `PAYCTL_PAYMENTS__SETTLEMENT__FIXED__OUTCOME=approved|declined`
    Fixed { outcome: SettlementOutcome },
}

fn default_success_rate() -> f64 {
    0.9
}

impl Default for SettlementConfig {
    fn default() -> Self {
        SettlementConfig::Simulated {
            success_rate: default_success_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebhookConfig {
    /// Endpoint receiving `payment.completed` events; unset disables delivery
    pub url: Option<Url>,
    /// Hard client-side timeout per delivery
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Value of the `source` field in every event
    pub source: String,
    pub user_agent: String,
    /// Standard Webhooks secret (`whsec_...`); when set, deliveries are signed
    pub signing_secret: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(5),
            source: "mobile-payment-app".to_string(),
            user_agent: "MobilePaymentApp/1.0".to_string(),
            signing_secret: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<CorsOrigin>,
    pub allow_credentials: bool,
    /// Preflight cache lifetime in seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        let dev_origins = [
            "http://localhost:19006",
            "http://localhost:8081",
            "http://localhost:3000",
            "http://127.0.0.1:19006",
        ];
        Self {
            allowed_origins: dev_origins
                .iter()
                .filter_map(|origin| Url::parse(origin).ok())
                .map(CorsOrigin::Url)
                .collect(),
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

/// An allowed CORS origin.
///
/// Either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Export spans over OTLP (endpoint from the standard `OTEL_*` variables)
    pub otel_export: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: Environment::default(),
            secret_key: None,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            payments: PaymentsConfig::default(),
            webhook: WebhookConfig::default(),
            cors: CorsConfig::default(),
            body_limit_bytes: 10 * 1024 * 1024,
            seed_demo_data: false,
            enable_metrics: false,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("PAYCTL_").ignore(&["CONFIG"]).split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["WEBHOOK_URL"]).map(|_| "webhook.url".into()))
            .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "secret_key".into()))
            .merge(Env::raw().only(&["PORT"]).map(|_| "port".into()))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.as_deref().is_none_or(|key| key.trim().is_empty()) {
            return Err(invalid(
                "secret_key is not configured. Set PAYCTL_SECRET_KEY (or JWT_SECRET) or add secret_key to the config file",
            ));
        }

        if self.auth.password.min_length < 1 {
            return Err(invalid("auth.password.min_length must be at least 1"));
        }

        if self.auth.token_expiry.is_zero() {
            return Err(invalid("auth.token_expiry must be greater than zero"));
        }

        if self.auth.token_expiry > MAX_TOKEN_EXPIRY {
            return Err(invalid(&format!(
                "auth.token_expiry must be at most {}, got {}",
                humantime::format_duration(MAX_TOKEN_EXPIRY),
                humantime::format_duration(self.auth.token_expiry)
            )));
        }

        if self.payments.max_amount <= Decimal::ZERO {
            return Err(invalid(&format!(
                "payments.max_amount must be positive, got {}",
                self.payments.max_amount
            )));
        }

        if let SettlementConfig::Simulated { success_rate } = self.payments.settlement {
            if !(0.0..=1.0).contains(&success_rate) {
                return Err(invalid(&format!(
                    "payments.settlement.simulated.success_rate must be between 0 and 1, got {success_rate}"
                )));
            }
        }

        if self.webhook.timeout.is_zero() {
            return Err(invalid("webhook.timeout must be greater than zero"));
        }

        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections must be at least 1"));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn invalid(message: &str) -> Error {
    Error::Internal {
        operation: format!("validate config: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args() -> Args {
        Args {
            config: "test.yaml".to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_yaml_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: hello
environment: production
auth:
  token_expiry: 2h
  password:
    min_length: 8
payments:
  max_amount: 500.00
  settlement:
    fixed:
      outcome: declined
webhook:
  url: https://hooks.example.com/payments
  timeout: 3s
  signing_secret: whsec_dGVzdA==
cors:
  allowed_origins:
    - "*"
    - http://localhost:8081
"#,
            )?;

            let config = Config::load(&args())?;

            assert_eq!(config.environment, Environment::Production);
            assert_eq!(config.auth.token_expiry, Duration::from_secs(7200));
            assert_eq!(config.auth.password.min_length, 8);
            assert_eq!(config.payments.max_amount, Decimal::new(50000, 2));
            assert!(matches!(
                config.payments.settlement,
                SettlementConfig::Fixed {
                    outcome: SettlementOutcome::Declined
                }
            ));
            assert_eq!(
                config.webhook.url.as_ref().map(Url::as_str),
                Some("https://hooks.example.com/payments")
            );
            assert_eq!(config.webhook.timeout, Duration::from_secs(3));
            assert_eq!(config.webhook.source, "mobile-payment-app");
            assert_eq!(config.cors.allowed_origins.len(), 2);
            assert_eq!(config.cors.allowed_origins[0], CorsOrigin::Wildcard);

            Ok(())
        });
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "secret_key: hello\n")?;

            let config = Config::load(&args())?;

            assert_eq!(config.auth.password.min_length, 6);
            assert_eq!(config.auth.token_expiry, Duration::from_secs(86400));
            assert_eq!(config.payments.max_amount, Decimal::new(1_000_000, 2));
            assert!(matches!(
                config.payments.settlement,
                SettlementConfig::Simulated { success_rate } if success_rate == 0.9
            ));
            assert_eq!(config.webhook.timeout, Duration::from_secs(5));
            assert_eq!(config.webhook.user_agent, "MobilePaymentApp/1.0");
            assert_eq!(config.body_limit_bytes, 10 * 1024 * 1024);
            assert!(!config.seed_demo_data);
            assert_eq!(config.cors.allowed_origins.len(), 4);

            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "secret_key: hello\nhost: 0.0.0.0\n")?;

            jail.set_env("PAYCTL_HOST", "127.0.0.1");
            jail.set_env("PAYCTL_PORT", "8080");
            jail.set_env("PAYCTL_PAYMENTS__SETTLEMENT__SIMULATED__SUCCESS_RATE", "0.5");
            jail.set_env("PAYCTL_WEBHOOK__TIMEOUT", "10s");

            let config = Config::load(&args())?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8080);
            assert!(matches!(
                config.payments.settlement,
                SettlementConfig::Simulated { success_rate } if success_rate == 0.5
            ));
            assert_eq!(config.webhook.timeout, Duration::from_secs(10));

            Ok(())
        });
    }

    #[test]
    fn test_bare_env_vars() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "host: 127.0.0.1\n")?;

            jail.set_env("JWT_SECRET", "from-env");
            jail.set_env("WEBHOOK_URL", "http://localhost:9999/hook");
            jail.set_env("DATABASE_URL", "sqlite::memory:");

            let config = Config::load(&args())?;

            assert_eq!(config.secret_key.as_deref(), Some("from-env"));
            assert_eq!(
                config.webhook.url.as_ref().map(Url::as_str),
                Some("http://localhost:9999/hook")
            );
            assert_eq!(config.database.url, "sqlite::memory:");

            Ok(())
        });
    }

    #[test]
    fn test_missing_secret_key_fails_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 3000\n")?;
            let err = Config::load(&args()).unwrap_err();
            assert!(err.to_string().contains("secret_key"));
            Ok(())
        });
    }

    #[test]
    fn test_unknown_keys_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "secret_key: hello\nwebhook:\n  retries: 3\n")?;
            assert!(Config::load(&args()).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = Config {
            secret_key: Some("hello".to_string()),
            ..Default::default()
        };
        assert!(base.validate().is_ok());

        let mut config = base.clone();
        config.payments.settlement = SettlementConfig::Simulated { success_rate: 1.5 };
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.payments.max_amount = Decimal::ZERO;
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.auth.token_expiry = MAX_TOKEN_EXPIRY;
        assert!(config.validate().is_ok());
        config.auth.token_expiry = MAX_TOKEN_EXPIRY + Duration::from_secs(1);
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.webhook.timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = base;
        config.secret_key = Some("   ".to_string());
        assert!(config.validate().is_err());
    }
}
