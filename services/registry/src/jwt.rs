//! JWT service for token generation and validation
//!
//! Tokens are signed with HS256 using a shared secret and carry the person's
//! identifier and display name for a fixed validity window.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Person;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Access token expiration time in seconds (default: 1 hour)
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: shared HMAC secret
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: access token expiry in seconds (default: 3600)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        Ok(JwtConfig {
            secret,
            access_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Person ID
    pub sub: i64,
    /// Display name
    pub name: String,
    /// Token ID
    pub jti: Uuid,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// An issued access token together with its expiration instant.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
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
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            access_token_expiry: config.access_token_expiry,
        }
    }

    /// Generate an access token for a person
    pub fn issue_token(&self, person: &Person) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.access_token_expiry as i64);

        let claims = Claims {
            sub: person.id,
            name: person.name.clone(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(jsonwebtoken::Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_person() -> Person {
        Person {
            id: 7,
            name: "Ana".to_string(),
            gender: None,
            email: None,
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 20).unwrap(),
            nationality: None,
            place_of_birth: None,
            cpf: "11144477735".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn test_service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            access_token_expiry: 3600,
        })
    }

    #[test]
    fn issued_token_round_trips() {
        let service = test_service("test-secret");
        let issued = service.issue_token(&test_person()).unwrap();

        let claims = service.validate_token(&issued.token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.name, "Ana");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let issued = test_service("first-secret")
            .issue_token(&test_person())
            .unwrap();

        assert!(
            test_service("second-secret")
                .validate_token(&issued.token)
                .is_err()
        );
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(test_service("test-secret").validate_token("garbage").is_err());
    }
}
