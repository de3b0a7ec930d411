//! Signed session tokens.
//!
//! Tokens are stateless HS256 JWTs; validity is the signature plus the
//! embedded expiry, with no server-side revocation.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    api::models::users::{CurrentUser, Role},
    config::Config,
    errors::Error,
};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // User id
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(user: &CurrentUser, config: &Config) -> Result<Self, Error> {
        let now = Utc::now();
        let exp = TimeDelta::from_std(config.auth.token_expiry)
            .ok()
            .and_then(|expiry| now.checked_add_signed(expiry))
            .ok_or_else(|| Error::Internal {
                operation: format!("compute token expiry: {:?} is out of range", config.auth.token_expiry),
            })?;

        Ok(Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }
}

impl TryFrom<SessionClaims> for CurrentUser {
    type Error = Error;

    fn try_from(claims: SessionClaims) -> Result<Self, Error> {
        let id = claims.sub.parse().map_err(|_| Error::TokenInvalid)?;
        Ok(Self {
            id,
            email: claims.email,
            role: claims.role,
        })
    }
}

fn secret(config: &Config) -> Result<&[u8], Error> {
    config
        .secret_key
        .as_deref()
        .map(str::as_bytes)
        .ok_or_else(|| Error::Internal {
            operation: "sign session token: secret_key is required".to_string(),
        })
}

/// Create a token for a freshly authenticated user
pub fn create_session_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    encode_claims(&SessionClaims::new(user, config)?, config)
}

pub(crate) fn encode_claims(claims: &SessionClaims, config: &Config) -> Result<String, Error> {
    let key = EncodingKey::from_secret(secret(config)?);
    encode(&Header::new(Algorithm::HS256), claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify a token and recover the user it was issued to.
///
/// Expiry is checked without leeway: a token is rejected the second it
/// lapses.
pub fn verify_session_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    let key = DecodingKey::from_secret(secret(config)?);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => Error::TokenExpired,
        _ => Error::TokenInvalid,
    })?;

    CurrentUser::try_from(token_data.claims)
}
