//! HMAC-signed token codec.
//!
//! Decoding never fails loudly: a malformed, unsigned, tampered, expired,
//! or wrongly-typed token decodes to `None`, exactly like a missing one.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use portal_core::config::AuthConfig;
use portal_core::error::AppError;

use super::claims::{Claims, TokenType};
use crate::session::SessionPayload;

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenCodec {
    /// Creates a codec from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Signs `payload` into a token of the given type that expires after `ttl`.
    pub fn encode(
        &self,
        payload: &SessionPayload,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            session: payload.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    /// Verifies a token and returns its claims, or `None` for any failure.
    pub fn decode_claims(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "Rejected token");
                None
            }
        }
    }

    /// Verifies a token of the expected type and returns its session.
    pub fn decode(&self, token: &str, expected: TokenType) -> Option<SessionPayload> {
        self.decode_claims(token)
            .filter(|claims| claims.token_type == expected)
            .map(|claims| claims.session)
    }
}
