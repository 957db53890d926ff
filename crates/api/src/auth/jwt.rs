//! JWT validation.
//!
//! Tokens are issued by the external identity provider; this service only
//! validates them and reads the `sub` claim as the owner identifier.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT validation configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret shared with the identity provider.
    pub secret: String,
}

impl JwtConfig {
    /// Load from `JWT_SECRET`. Panics if unset; tokens could otherwise
    /// never validate.
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
        }
    }
}

/// The claims this service reads from an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the opaque owner identifier (e.g. `"auth0|abc123"`).
    pub sub: String,
    /// Expiry as a unix timestamp.
    pub exp: usize,
}

/// Validate a bearer token and return its claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
        }
    }

    fn issue(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_roundtrips_subject() {
        let claims = Claims {
            sub: "auth0|abc123".into(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        let token = issue(&claims, "test-secret");
        let validated = validate_token(&token, &config()).unwrap();
        assert_eq!(validated.sub, "auth0|abc123");
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: "auth0|abc123".into(),
            exp: (chrono::Utc::now().timestamp() - 3600) as usize,
        };
        let token = issue(&claims, "test-secret");
        assert!(validate_token(&token, &config()).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims {
            sub: "auth0|abc123".into(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        let token = issue(&claims, "other-secret");
        assert!(validate_token(&token, &config()).is_err());
    }
}
