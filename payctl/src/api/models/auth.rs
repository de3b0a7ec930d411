//! Signup and login payloads.
//!
//! Request bodies are deserialized loosely (every field optional, roles as
//! plain strings) and then validated into typed values, so a bad field turns
//! into a 400 with a per-field message instead of a body-parse rejection.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::{Role, UserResponse};
use crate::errors::{Error, FieldError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// `psp` or `dev`
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A signup that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Login credentials that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Payload of a successful signup or login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

impl SignupRequest {
    pub fn validate(&self, min_password_length: usize) -> Result<NewAccount, Error> {
        let mut errors = Vec::new();

        let email = check_email(self.email.as_deref(), &mut errors);

        let password = match self.password.as_deref() {
            None | Some("") => {
                errors.push(FieldError::new("password", "password is required"));
                None
            }
            Some(p) if p.chars().count() < min_password_length => {
                errors.push(FieldError::new(
                    "password",
                    format!("password must be at least {min_password_length} characters long"),
                ));
                None
            }
            Some(p) => Some(p.to_string()),
        };

        let role = match self.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => Some(role),
            None => {
                errors.push(FieldError::new("role", "role is required"));
                None
            }
            Some(Err(_)) => {
                let allowed = Role::ALL.iter().map(Role::as_str).collect::<Vec<_>>().join(", ");
                errors.push(FieldError::new("role", format!("role must be one of [{allowed}]")));
                None
            }
        };

        match (email, password, role) {
            (Some(email), Some(password), Some(role)) => Ok(NewAccount { email, password, role }),
            _ => Err(Error::Validation { errors }),
        }
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<Credentials, Error> {
        let mut errors = Vec::new();
        let email = check_email(self.email.as_deref(), &mut errors);
        let password = match self.password.as_deref() {
            None | Some("") => {
                errors.push(FieldError::new("password", "password is required"));
                None
            }
            Some(p) => Some(p.to_string()),
        };

        match (email, password) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(Error::Validation { errors }),
        }
    }
}

fn check_email(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<String> {
    let email = raw.map(str::trim).unwrap_or_default();
    if email.is_empty() {
        errors.push(FieldError::new("email", "email is required"));
        return None;
    }
    if !is_well_formed_email(email) {
        errors.push(FieldError::new("email", "email must be a valid email address"));
        return None;
    }
    Some(email.to_string())
}

/// Structural address check: `local@domain.tld` with no whitespace, dot-atom
/// local part and hostname-style domain labels.
pub fn is_well_formed_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));

    labels_ok && tld_ok
}
