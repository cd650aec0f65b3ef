use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::attribute_repository::AttributeRepository;
use crate::domain::attribute::RecipeAttribute;
use crate::domain::error::DomainError;

/// Owner-scoped CRUD over one kind of recipe attribute.
pub struct AttributeService<A: RecipeAttribute> {
    repo: Arc<dyn AttributeRepository<A>>,
}

impl<A: RecipeAttribute> Clone for AttributeService<A> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<A: RecipeAttribute> AttributeService<A> {
    pub fn new(repo: Arc<dyn AttributeRepository<A>>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<A>, DomainError> {
        self.repo.list_for_owner(owner_id).await
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<A, DomainError> {
        self.repo
            .find(owner_id, id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    #[instrument(skip(self), fields(kind = A::TABLE))]
    pub async fn create(&self, owner_id: Uuid, name: String) -> Result<A, DomainError> {
        self.repo.create(A::new(owner_id, name.trim().to_string())).await
    }

    #[instrument(skip(self), fields(kind = A::TABLE))]
    pub async fn rename(&self, owner_id: Uuid, id: Uuid, name: String) -> Result<A, DomainError> {
        self.repo
            .rename(owner_id, id, name.trim().to_string())
            .await?
            .ok_or(DomainError::NotFound)
    }

    #[instrument(skip(self), fields(kind = A::TABLE))]
    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), DomainError> {
        if self.repo.delete(owner_id, id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound)
        }
    }

    /// Loads whichever of `ids` the owner has, silently skipping the rest.
    pub async fn find_many(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<A>, DomainError> {
        self.repo.find_many(owner_id, ids).await
    }

    /// Loads the attributes named by `ids`, failing on the first id the owner
    /// does not have. `field` names the payload field in the error.
    pub async fn resolve_owned(
        &self,
        owner_id: Uuid,
        ids: &[Uuid],
        field: &str,
    ) -> Result<Vec<A>, DomainError> {
        let found = self.find_many(owner_id, ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|a| a.id() == **id)) {
            return Err(DomainError::field(
                field,
                &format!("Invalid pk \"{}\" - object does not exist.", missing),
            ));
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use crate::domain::attribute::{Ingredient, Tag};

    fn tags() -> AttributeService<Tag> {
        AttributeService::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn create_trims_and_lists_by_name_descending() {
        let service = tags();
        let owner = Uuid::new_v4();
        service.create(owner, " Vegan ".into()).await.unwrap();
        service.create(owner, "Dessert".into()).await.unwrap();

        let names: Vec<String> = service
            .list(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["Vegan", "Dessert"]);
    }

    #[tokio::test]
    async fn foreign_rows_are_not_found() {
        let service = tags();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let tag = service.create(owner, "Breakfast".into()).await.unwrap();

        assert!(matches!(
            service.get(intruder, tag.id).await,
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            service.rename(intruder, tag.id, "Lunch".into()).await,
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            service.delete(intruder, tag.id).await,
            Err(DomainError::NotFound)
        ));
        assert_eq!(service.get(owner, tag.id).await.unwrap().name, "Breakfast");
    }

    #[tokio::test]
    async fn resolve_owned_reports_the_first_unknown_id() {
        let service: AttributeService<Ingredient> =
            AttributeService::new(Arc::new(InMemoryStore::new()));
        let owner = Uuid::new_v4();
        let salt = service.create(owner, "Salt".into()).await.unwrap();
        let unknown = Uuid::new_v4();

        let found = service
            .resolve_owned(owner, &[salt.id], "ingredients")
            .await
            .unwrap();
        assert_eq!(found, vec![salt.clone()]);

        let err = service
            .resolve_owned(owner, &[salt.id, unknown], "ingredients")
            .await
            .unwrap_err();
        match err {
            DomainError::Validation(fields) => {
                let messages = fields.get("ingredients").unwrap();
                assert!(messages[0].contains(&unknown.to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
