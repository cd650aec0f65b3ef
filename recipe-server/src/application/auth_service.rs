use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::{ProfileChanges, User, normalize_email};
use crate::infrastructure::security::{JwtKeys, TokenType, hash_password, verify_password};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, keys: JwtKeys) -> Self {
        Self { repo, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo.find_by_id(id).await?.ok_or(DomainError::NotFound)
    }

    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, DomainError> {
        if email.trim().is_empty() {
            return Err(DomainError::EmailRequired);
        }
        let hash = hash(password)?;
        let user = User::new(normalize_email(email), name.trim().to_string(), hash);
        self.repo.create(user).await
    }

    #[instrument(skip(self, password))]
    pub async fn create_superuser(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let mut user = self.create_user(email, password, "").await?;
        user.is_staff = true;
        user.is_superuser = true;
        let user = self.repo.update(user).await?;
        info!(user_id = %user.id, "superuser created");
        Ok(user)
    }

    /// Exchanges credentials for an access/refresh pair.
    ///
    /// Unknown email, wrong password and inactive accounts are indistinguishable
    /// to the caller.
    #[instrument(skip(self, password))]
    pub async fn obtain_token_pair(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, DomainError> {
        let user = self
            .repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| DomainError::InvalidCredentials)?;
        if !valid || !user.is_active {
            warn!(user_id = %user.id, "rejected token request");
            return Err(DomainError::InvalidCredentials);
        }

        Ok(TokenPair {
            access: self.access_token(user.id)?,
            refresh: self
                .keys
                .generate_refresh_token(user.id)
                .map_err(|err| DomainError::Internal(err.to_string()))?,
        })
    }

    #[instrument(skip_all)]
    pub async fn refresh_access(&self, refresh_token: &str) -> Result<String, DomainError> {
        let user = self.resolve(refresh_token, TokenType::Refresh).await?;
        self.access_token(user.id)
    }

    /// Resolves a bearer access token to its active account.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, DomainError> {
        self.resolve(access_token, TokenType::Access).await
    }

    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<User, DomainError> {
        let mut user = self.get_user(id).await?;
        if let Some(email) = changes.email {
            if email.trim().is_empty() {
                return Err(DomainError::EmailRequired);
            }
            user.email = normalize_email(&email);
        }
        if let Some(name) = changes.name {
            user.name = name.trim().to_string();
        }
        if let Some(password) = changes.password {
            user.password_hash = hash(&password)?;
        }
        self.repo.update(user).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.repo.find_by_email(&normalize_email(email)).await
    }

    /// Deletes the account; its tags, ingredients and recipes go with it.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> Result<bool, DomainError> {
        self.repo.delete(id).await
    }

    async fn resolve(&self, token: &str, expected: TokenType) -> Result<User, DomainError> {
        let claims = self
            .keys
            .verify(token, expected)
            .map_err(|_| DomainError::InvalidToken)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| DomainError::InvalidToken)?;

        match self.repo.find_by_id(user_id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(DomainError::InvalidToken),
        }
    }

    fn access_token(&self, user_id: Uuid) -> Result<String, DomainError> {
        self.keys
            .generate_access_token(user_id)
            .map_err(|err| DomainError::Internal(err.to_string()))
    }
}

fn hash(password: &str) -> Result<String, DomainError> {
    hash_password(password).map_err(|err| DomainError::Internal(err.to_string()))
}
