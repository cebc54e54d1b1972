//! Shared-secret JWT session validator.
//!
//! Tokens are HMAC-signed JWTs whose `sub` claim is the username. The
//! username is resolved through the `UserDirectory` so a token for a
//! deleted account is rejected even while its signature is still valid.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::{SessionValidator, UserDirectory};

/// Claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Username of the token holder.
    pub sub: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// Validates HMAC-signed JWTs and resolves the subject to a user.
pub struct JwtSessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    users: Arc<dyn UserDirectory>,
}

impl JwtSessionValidator {
    pub fn new(secret: &Secret<String>, algorithm: Algorithm, users: Arc<dyn UserDirectory>) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
            users,
        }
    }

    fn decode_claims(&self, token: &str) -> Result<AccessClaims, AuthError> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    _ => {
                        tracing::debug!("Token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            })
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let claims = self.decode_claims(token)?;

        let user = self
            .users
            .find_by_username(&claims.sub)
            .await
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?
            .ok_or_else(|| {
                tracing::debug!(username = %claims.sub, "Token subject not in directory");
                AuthError::UserNotFound
            })?;

        Ok(AuthenticatedUser::new(user.id, user.username))
    }
}
