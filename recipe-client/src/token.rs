use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::RecipeClientError;
use crate::types::TokenPair;

pub const DEFAULT_TOKEN_FILE: &str = ".recipe_token";

/// Token pair persisted between CLI invocations as JSON.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<TokenPair>, RecipeClientError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, tokens: &TokenPair) -> Result<(), RecipeClientError> {
        fs::write(&self.path, serde_json::to_string(tokens)?)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), RecipeClientError> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair {
            access: "access-token".into(),
            refresh: "refresh-token".into(),
        }
    }

    #[test]
    fn missing_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token"));
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn saved_tokens_are_loaded_back_and_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token"));

        store.save(&pair()).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair()));

        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn garbage_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "not json").unwrap();

        let err = TokenStore::new(path).load().unwrap_err();
        assert!(matches!(err, RecipeClientError::TokenFormat(_)));
    }
}
