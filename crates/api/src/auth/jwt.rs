//! Bearer token verification.
//!
//! Tokens are HS256-signed JWTs issued by the account service. The server
//! only validates them; `sub` carries the account id.

use jsonwebtoken::{decode, DecodingKey, Validation};
use notesync_core::types::AccountId;
use serde::{Deserialize, Serialize};

/// JWT claims carried by every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the account id.
    pub sub: AccountId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the token issuer.
    pub secret: String,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var      | Required |
    /// |--------------|----------|
    /// | `JWT_SECRET` | **yes**  |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        Self { secret }
    }
}

/// Validate signature and expiry, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    use super::*;

    fn test_config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
        }
    }

    fn sign(account_id: AccountId, config: &JwtConfig) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: account_id,
            exp: now + 15 * 60,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_validate_signed_token() {
        let config = test_config("test-secret-that-is-long-enough-for-hmac");
        let account_id = Uuid::new_v4();

        let token = sign(account_id, &config);
        let claims = validate_token(&token, &config).unwrap();

        assert_eq!(claims.sub, account_id);
        assert!(claims.exp > claims.iat);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token_fails() {
        let config = test_config("test-secret-that-is-long-enough-for-hmac");

        // Well past the default 60 second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let token = sign(Uuid::new_v4(), &test_config("secret-alpha"));
        assert!(validate_token(&token, &test_config("secret-bravo")).is_err());
    }

    #[test]
    fn test_non_uuid_subject_fails() {
        #[derive(Serialize)]
        struct LegacyClaims {
            sub: i64,
            exp: i64,
        }

        let config = test_config("secret");
        let token = encode(
            &Header::default(),
            &LegacyClaims {
                sub: 42,
                exp: chrono::Utc::now().timestamp() + 600,
            },
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        assert!(validate_token(&token, &config).is_err());
    }
}
