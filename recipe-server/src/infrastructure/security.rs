use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub token_type: TokenType,
}

#[derive(Clone)]
pub struct JwtKeys {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: String, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            secret,
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    pub fn generate_access_token(
        &self,
        user_id: Uuid,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.generate(user_id, TokenType::Access, self.access_ttl)
    }

    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.generate(user_id, TokenType::Refresh, self.refresh_ttl)
    }

    fn generate(
        &self,
        user_id: Uuid,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
            token_type,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Decodes `token` and checks it is of the `expected` kind.
    pub fn verify(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        if data.claims.token_type != expected {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }
        Ok(data.claims)
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    let argon2 = Argon2::default();
    Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> JwtKeys {
        JwtKeys::new("test-secret".into(), 300, 86_400)
    }

    #[test]
    fn access_token_round_trips_subject() {
        let user_id = Uuid::new_v4();
        let token = keys().generate_access_token(user_id).unwrap();
        let claims = keys().verify(&token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let user_id = Uuid::new_v4();
        let refresh = keys().generate_refresh_token(user_id).unwrap();
        let access = keys().generate_access_token(user_id).unwrap();
        assert!(keys().verify(&refresh, TokenType::Access).is_err());
        assert!(keys().verify(&access, TokenType::Refresh).is_err());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let other = JwtKeys::new("other".into(), 300, 300);
        let token = other.generate_access_token(Uuid::new_v4()).unwrap();
        assert!(keys().verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let expired = JwtKeys::new("test-secret".into(), -3600, 300);
        let token = expired.generate_access_token(Uuid::new_v4()).unwrap();
        assert!(keys().verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("testpass123").unwrap();
        assert_ne!(hash, "testpass123");
        assert!(verify_password("testpass123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}
