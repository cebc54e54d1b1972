//! Access token verification settings.

use jsonwebtoken::Algorithm;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Minimum HMAC key length accepted outside development.
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Tokens are HMAC-signed JWTs; the key never appears in `Debug` output.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,

    /// One of HS256, HS384, HS512 (case-insensitive).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl AuthConfig {
    pub fn algorithm(&self) -> Result<Algorithm, ValidationError> {
        match self.algorithm.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(ValidationError::UnsupportedJwtAlgorithm(
                self.algorithm.clone(),
            )),
        }
    }

    /// Production requires a key of at least 32 bytes.
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_JWT_SECRET"));
        }
        if environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ValidationError::JwtSecretTooShort(MIN_PRODUCTION_SECRET_LEN));
        }
        self.algorithm()?;
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Secret::new(String::new()),
            algorithm: default_algorithm(),
        }
    }
}

fn default_algorithm() -> String {
    "HS256".to_string()
}
