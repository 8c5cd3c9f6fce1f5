//! JWT service for session token generation and validation
//!
//! Login issues an HS256 access token carrying the user's id, username, and
//! admin flag; the auth middleware validates it on every protected route.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Access token expiration time in seconds (default: 12 hours)
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Shared secret for signing tokens
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 43200)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "43200".to_string()) // 12 hours
            .parse()
            .unwrap_or(43200);

        Ok(JwtConfig {
            secret,
            access_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// Student id
    pub username: String,
    /// Administrator flag
    pub is_admin: bool,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            validation,
            access_token_expiry: config.access_token_expiry,
        })
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            iat: now,
            exp: now + self.access_token_expiry,
        };

        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.access_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: 3600,
        })
        .unwrap()
    }

    fn test_user(is_admin: bool) -> User {
        User {
            id: 7,
            username: "202500010001".to_string(),
            name: "Test".to_string(),
            department: "Engineering".to_string(),
            contact: "12345".to_string(),
            password_hash: String::new(),
            is_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let service = test_service();
        let token = service.generate_access_token(&test_user(false)).unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "202500010001");
        assert!(!claims.is_admin);
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_admin_flag_survives_round_trip() {
        let service = test_service();
        let token = service.generate_access_token(&test_user(true)).unwrap();
        assert!(service.validate_token(&token).unwrap().is_admin);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = test_service().generate_access_token(&test_user(false)).unwrap();

        let other = JwtService::new(JwtConfig {
            secret: "other-secret".to_string(),
            access_token_expiry: 3600,
        })
        .unwrap();

        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(test_service().validate_token("not.a.token").is_err());
    }
}
