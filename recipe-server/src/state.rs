use std::sync::Arc;

use sqlx::PgPool;

use crate::application::attribute_service::AttributeService;
use crate::application::auth_service::AuthService;
use crate::application::recipe_service::RecipeService;
use crate::data::attribute_repository::{AttributeRepository, PostgresAttributeRepository};
use crate::data::memory::InMemoryStore;
use crate::data::recipe_repository::{PostgresRecipeRepository, RecipeRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::domain::attribute::{Ingredient, Tag};
use crate::domain::error::DomainError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::security::JwtKeys;
use crate::infrastructure::storage::ImageStorage;

/// Services shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub tags: AttributeService<Tag>,
    pub ingredients: AttributeService<Ingredient>,
    pub recipes: RecipeService,
    pub upload_limit: usize,
}

impl AppState {
    pub fn postgres(pool: PgPool, config: &AppConfig) -> Self {
        Self::assemble(
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresAttributeRepository::<Tag>::new(pool.clone())),
            Arc::new(PostgresAttributeRepository::<Ingredient>::new(pool.clone())),
            Arc::new(PostgresRecipeRepository::new(pool)),
            keys_from(config),
            ImageStorage::new(config.media_root.clone(), config.media_url.clone()),
            config.max_upload_bytes,
        )
    }

    /// Same services backed by one [`InMemoryStore`].
    pub fn in_memory(keys: JwtKeys, storage: ImageStorage, upload_limit: usize) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::assemble(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            keys,
            storage,
            upload_limit,
        )
    }

    /// Removes the account with `email` along with its recipes' image files.
    pub async fn delete_user(&self, email: &str) -> Result<bool, DomainError> {
        let Some(user) = self.auth.find_by_email(email).await? else {
            return Ok(false);
        };
        let images = self.recipes.image_references(user.id).await?;
        if !self.auth.delete_user(user.id).await? {
            return Ok(false);
        }
        self.recipes.discard_images(&images).await;
        Ok(true)
    }

    fn assemble(
        users: Arc<dyn UserRepository>,
        tags: Arc<dyn AttributeRepository<Tag>>,
        ingredients: Arc<dyn AttributeRepository<Ingredient>>,
        recipes: Arc<dyn RecipeRepository>,
        keys: JwtKeys,
        storage: ImageStorage,
        upload_limit: usize,
    ) -> Self {
        let tags = AttributeService::new(tags);
        let ingredients = AttributeService::new(ingredients);
        Self {
            auth: AuthService::new(users, keys),
            recipes: RecipeService::new(recipes, tags.clone(), ingredients.clone(), storage),
            tags,
            ingredients,
            upload_limit,
        }
    }
}

pub fn keys_from(config: &AppConfig) -> JwtKeys {
    JwtKeys::new(
        config.jwt_secret.clone(),
        config.jwt_access_ttl_secs,
        config.jwt_refresh_ttl_secs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recipe::RecipeDraft;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use rust_decimal::Decimal;
    use std::io::Cursor;

    fn png() -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(4, 4);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn draft() -> RecipeDraft {
        RecipeDraft {
            title: "Flatbread".into(),
            time_minutes: 15,
            price: Decimal::new(300, 2),
            link: String::new(),
            tags: Vec::new(),
            ingredients: Vec::new(),
        }
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_image_files() {
        let media = tempfile::tempdir().unwrap();
        let state = AppState::in_memory(
            JwtKeys::new("secret".into(), 300, 3600),
            ImageStorage::new(media.path(), "/media/"),
            1024 * 1024,
        );
        let user = state
            .auth
            .create_user("baker@example.com", "pass123", "")
            .await
            .unwrap();
        let recipe = state.recipes.create(user.id, draft()).await.unwrap();
        state.recipes.upload_image(user.id, recipe.id, &png()).await.unwrap();
        let upload_dir = media.path().join("uploads/recipe");
        assert_eq!(std::fs::read_dir(&upload_dir).unwrap().count(), 1);

        assert!(state.delete_user("baker@example.com").await.unwrap());
        assert_eq!(std::fs::read_dir(&upload_dir).unwrap().count(), 0);
        assert!(state.recipes.list(user.id).await.unwrap().is_empty());
        assert!(!state.delete_user("baker@example.com").await.unwrap());
    }
}
