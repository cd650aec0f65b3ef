use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::attribute_service::AttributeService;
use crate::data::recipe_repository::RecipeRepository;
use crate::domain::attribute::{Ingredient, RecipeAttribute, Tag};
use crate::domain::error::DomainError;
use crate::domain::recipe::{Recipe, RecipeChanges, RecipeDetail, RecipeDraft, dedup_ids};
use crate::infrastructure::storage::ImageStorage;

#[derive(Clone)]
pub struct RecipeService {
    repo: Arc<dyn RecipeRepository>,
    tags: AttributeService<Tag>,
    ingredients: AttributeService<Ingredient>,
    storage: ImageStorage,
}

impl RecipeService {
    pub fn new(
        repo: Arc<dyn RecipeRepository>,
        tags: AttributeService<Tag>,
        ingredients: AttributeService<Ingredient>,
        storage: ImageStorage,
    ) -> Self {
        Self {
            repo,
            tags,
            ingredients,
            storage,
        }
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Recipe>, DomainError> {
        self.repo.list_for_owner(owner_id).await
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Recipe, DomainError> {
        self.repo
            .find(owner_id, id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    /// Recipe with its tags and ingredients expanded to full objects.
    pub async fn get_detail(&self, owner_id: Uuid, id: Uuid) -> Result<RecipeDetail, DomainError> {
        let recipe = self.get(owner_id, id).await?;
        let tags = self.tags.find_many(owner_id, &recipe.tags).await?;
        let ingredients = self
            .ingredients
            .find_many(owner_id, &recipe.ingredients)
            .await?;
        Ok(RecipeDetail::new(recipe, tags, ingredients))
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, owner_id: Uuid, mut draft: RecipeDraft) -> Result<Recipe, DomainError> {
        draft.tags = dedup_ids(draft.tags);
        draft.ingredients = dedup_ids(draft.ingredients);
        self.check_links(owner_id, Some(&draft.tags), Some(&draft.ingredients))
            .await?;
        self.repo.create(Recipe::new(owner_id, draft)).await
    }

    /// Full replacement: associations left out of `draft` are cleared.
    #[instrument(skip(self, draft))]
    pub async fn replace(
        &self,
        owner_id: Uuid,
        id: Uuid,
        draft: RecipeDraft,
    ) -> Result<Recipe, DomainError> {
        self.patch(owner_id, id, draft.into()).await
    }

    /// Partial update: only supplied fields and association lists change.
    #[instrument(skip(self, changes))]
    pub async fn patch(
        &self,
        owner_id: Uuid,
        id: Uuid,
        mut changes: RecipeChanges,
    ) -> Result<Recipe, DomainError> {
        // ownership first, so foreign recipes are 404 rather than 400
        self.get(owner_id, id).await?;

        changes.tags = changes.tags.map(dedup_ids);
        changes.ingredients = changes.ingredients.map(dedup_ids);
        self.check_links(
            owner_id,
            changes.tags.as_deref(),
            changes.ingredients.as_deref(),
        )
        .await?;

        self.repo
            .update(owner_id, id, changes)
            .await?
            .ok_or(DomainError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        let recipe = self.get(owner_id, id).await?;
        if !self.repo.delete(owner_id, id).await? {
            return Err(DomainError::NotFound);
        }
        if let Some(image) = recipe.image {
            self.storage.remove(&image).await;
        }
        Ok(())
    }

    /// Stored image references of every recipe `owner_id` has.
    pub async fn image_references(&self, owner_id: Uuid) -> Result<Vec<String>, DomainError> {
        let recipes = self.repo.list_for_owner(owner_id).await?;
        Ok(recipes.into_iter().filter_map(|r| r.image).collect())
    }

    pub async fn discard_images(&self, references: &[String]) {
        for reference in references {
            self.storage.remove(reference).await;
        }
    }

    /// Validates and stores `bytes` as the recipe's image, replacing any
    /// previous one. Nothing is written unless the recipe is the caller's and
    /// the payload decodes as an image.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_image(
        &self,
        owner_id: Uuid,
        id: Uuid,
        bytes: &[u8],
    ) -> Result<Recipe, DomainError> {
        let existing = self.get(owner_id, id).await?;
        let format = ImageStorage::validate_image(bytes)?;
        let reference = self.storage.save(format, bytes).await?;

        match self.repo.set_image(owner_id, id, &reference).await {
            Ok(Some(recipe)) => {
                if let Some(previous) = existing.image {
                    self.storage.remove(&previous).await;
                }
                info!(recipe_id = %id, image = %reference, "recipe image uploaded");
                Ok(recipe)
            }
            Ok(None) => {
                self.storage.remove(&reference).await;
                Err(DomainError::NotFound)
            }
            Err(e) => {
                warn!(recipe_id = %id, "discarding stored image after failed update");
                self.storage.remove(&reference).await;
                Err(e)
            }
        }
    }

    async fn check_links(
        &self,
        owner_id: Uuid,
        tags: Option<&[Uuid]>,
        ingredients: Option<&[Uuid]>,
    ) -> Result<(), DomainError> {
        if let Some(ids) = tags {
            self.tags
                .resolve_owned(owner_id, ids, Tag::RECIPE_FIELD)
                .await?;
        }
        if let Some(ids) = ingredients {
            self.ingredients
                .resolve_owned(owner_id, ids, Ingredient::RECIPE_FIELD)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use rust_decimal::Decimal;
    use std::io::Cursor;
    use tempfile::TempDir;

    struct Fixture {
        service: RecipeService,
        tags: AttributeService<Tag>,
        ingredients: AttributeService<Ingredient>,
        media: TempDir,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let media = tempfile::tempdir().unwrap();
        let tags = AttributeService::<Tag>::new(store.clone());
        let ingredients = AttributeService::<Ingredient>::new(store.clone());
        let service = RecipeService::new(
            store,
            tags.clone(),
            ingredients.clone(),
            ImageStorage::new(media.path(), "/media/"),
        );
        Fixture {
            service,
            tags,
            ingredients,
            media,
        }
    }

    fn draft(tags: Vec<Uuid>, ingredients: Vec<Uuid>) -> RecipeDraft {
        RecipeDraft {
            title: "Thai prawn curry".into(),
            time_minutes: 20,
            price: Decimal::new(700, 2),
            link: String::new(),
            tags,
            ingredients,
        }
    }

    fn upload_dir_entries(media: &TempDir) -> usize {
        std::fs::read_dir(media.path().join("uploads/recipe"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn detail_expands_owned_links() {
        let fx = fixture();
        let owner = Uuid::new_v4();
        let vegan = fx.tags.create(owner, "Vegan".into()).await.unwrap();
        let dessert = fx.tags.create(owner, "Dessert".into()).await.unwrap();
        let prawns = fx.ingredients.create(owner, "Prawns".into()).await.unwrap();

        let recipe = fx
            .service
            .create(owner, draft(vec![vegan.id, dessert.id, vegan.id], vec![prawns.id]))
            .await
            .unwrap();
        assert_eq!(recipe.tags, vec![vegan.id, dessert.id]);

        let detail = fx.service.get_detail(owner, recipe.id).await.unwrap();
        assert_eq!(detail.tags, vec![vegan, dessert]);
        assert_eq!(detail.ingredients, vec![prawns]);
    }

    #[tokio::test]
    async fn links_to_foreign_attributes_are_rejected() {
        let fx = fixture();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let foreign = fx.tags.create(other, "Theirs".into()).await.unwrap();

        let err = fx
            .service
            .create(owner, draft(vec![foreign.id], vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(f) if f.get("tags").is_some()));
        assert!(fx.service.list(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn patch_keeps_links_and_replace_clears_them() {
        let fx = fixture();
        let owner = Uuid::new_v4();
        let tag = fx.tags.create(owner, "Curry".into()).await.unwrap();
        let recipe = fx
            .service
            .create(owner, draft(vec![tag.id], vec![]))
            .await
            .unwrap();

        let patched = fx
            .service
            .patch(
                owner,
                recipe.id,
                RecipeChanges {
                    title: Some("Chicken tikka".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.title, "Chicken tikka");
        assert_eq!(patched.tags, vec![tag.id]);

        let replaced = fx
            .service
            .replace(owner, recipe.id, draft(vec![], vec![]))
            .await
            .unwrap();
        assert_eq!(replaced.title, "Thai prawn curry");
        assert!(replaced.tags.is_empty());
    }

    #[tokio::test]
    async fn foreign_recipe_is_not_found() {
        let fx = fixture();
        let owner = Uuid::new_v4();
        let recipe = fx.service.create(owner, draft(vec![], vec![])).await.unwrap();
        let intruder = Uuid::new_v4();

        assert!(matches!(
            fx.service.get_detail(intruder, recipe.id).await,
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            fx.service.delete(intruder, recipe.id).await,
            Err(DomainError::NotFound)
        ));
        assert!(fx.service.get(owner, recipe.id).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_upload_leaves_no_file() {
        let fx = fixture();
        let owner = Uuid::new_v4();
        let recipe = fx.service.create(owner, draft(vec![], vec![])).await.unwrap();

        let err = fx
            .service
            .upload_image(owner, recipe.id, b"notimage")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(upload_dir_entries(&fx.media), 0);
        assert!(fx.service.get(owner, recipe.id).await.unwrap().image.is_none());
    }

    #[tokio::test]
    async fn new_upload_replaces_previous_file() {
        let fx = fixture();
        let owner = Uuid::new_v4();
        let recipe = fx.service.create(owner, draft(vec![], vec![])).await.unwrap();

        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(10, 10);
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let first = fx.service.upload_image(owner, recipe.id, &png).await.unwrap();
        let second = fx.service.upload_image(owner, recipe.id, &png).await.unwrap();

        assert_ne!(first.image, second.image);
        assert_eq!(upload_dir_entries(&fx.media), 1);

        fx.service.delete(owner, recipe.id).await.unwrap();
        assert_eq!(upload_dir_entries(&fx.media), 0);
    }
}
