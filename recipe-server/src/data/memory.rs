//! In-process implementation of every repository trait.
//!
//! All tables live behind one lock so that cascading deletes (user → owned
//! rows, attribute → recipe links) happen atomically, the way the Postgres
//! foreign keys behave. Used by the test suites and for running the API
//! without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::data::attribute_repository::AttributeRepository;
use crate::data::recipe_repository::RecipeRepository;
use crate::data::user_repository::{UserRepository, email_taken};
use crate::domain::attribute::{Ingredient, RecipeAttribute, Tag, sort_by_name_desc};
use crate::domain::error::DomainError;
use crate::domain::recipe::{Recipe, RecipeChanges};
use crate::domain::user::User;

#[derive(Default)]
pub struct Tables {
    users: HashMap<Uuid, User>,
    tags: HashMap<Uuid, Tag>,
    ingredients: HashMap<Uuid, Ingredient>,
    recipes: HashMap<Uuid, Recipe>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Selects the table an attribute type is stored in and unlinks it from recipes.
pub trait StoredAttribute: RecipeAttribute {
    fn rows(tables: &Tables) -> &HashMap<Uuid, Self>;
    fn rows_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self>;
    fn unlink(recipe: &mut Recipe, id: Uuid);
}

impl StoredAttribute for Tag {
    fn rows(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.tags
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.tags
    }

    fn unlink(recipe: &mut Recipe, id: Uuid) {
        recipe.tags.retain(|t| *t != id);
    }
}

impl StoredAttribute for Ingredient {
    fn rows(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.ingredients
    }

    fn rows_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.ingredients
    }

    fn unlink(recipe: &mut Recipe, id: Uuid) {
        recipe.ingredients.retain(|i| *i != id);
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(email_taken());
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(email_taken());
        }
        match tables.users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user)
            }
            None => Err(DomainError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.tags.retain(|_, t| t.owner_id != id);
        tables.ingredients.retain(|_, i| i.owner_id != id);
        tables.recipes.retain(|_, r| r.owner_id != id);
        Ok(true)
    }
}

#[async_trait]
impl<A: StoredAttribute> AttributeRepository<A> for InMemoryStore {
    async fn create(&self, item: A) -> Result<A, DomainError> {
        let mut tables = self.tables.write().await;
        A::rows_mut(&mut tables).insert(item.id(), item.clone());
        Ok(item)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<A>, DomainError> {
        let tables = self.tables.read().await;
        let mut items: Vec<A> = A::rows(&tables)
            .values()
            .filter(|a| a.owner_id() == owner_id)
            .cloned()
            .collect();
        sort_by_name_desc(&mut items);
        Ok(items)
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<A>, DomainError> {
        let tables = self.tables.read().await;
        Ok(A::rows(&tables)
            .get(&id)
            .filter(|a| a.owner_id() == owner_id)
            .cloned())
    }

    async fn find_many(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<A>, DomainError> {
        let tables = self.tables.read().await;
        let rows = A::rows(&tables);
        let mut items: Vec<A> = ids
            .iter()
            .filter_map(|id| rows.get(id))
            .filter(|a| a.owner_id() == owner_id)
            .cloned()
            .collect();
        sort_by_name_desc(&mut items);
        Ok(items)
    }

    async fn rename(
        &self,
        owner_id: Uuid,
        id: Uuid,
        name: String,
    ) -> Result<Option<A>, DomainError> {
        let mut tables = self.tables.write().await;
        Ok(A::rows_mut(&mut tables)
            .get_mut(&id)
            .filter(|a| a.owner_id() == owner_id)
            .map(|a| {
                a.set_name(name);
                a.clone()
            }))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        let owned = A::rows(&tables)
            .get(&id)
            .is_some_and(|a| a.owner_id() == owner_id);
        if !owned {
            return Ok(false);
        }
        A::rows_mut(&mut tables).remove(&id);
        for recipe in tables.recipes.values_mut() {
            A::unlink(recipe, id);
        }
        Ok(true)
    }
}

#[async_trait]
impl RecipeRepository for InMemoryStore {
    async fn create(&self, recipe: Recipe) -> Result<Recipe, DomainError> {
        let mut tables = self.tables.write().await;
        tables.recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Recipe>, DomainError> {
        let tables = self.tables.read().await;
        let mut recipes: Vec<Recipe> = tables
            .recipes
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        recipes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(recipes)
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Recipe>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .recipes
            .get(&id)
            .filter(|r| r.owner_id == owner_id)
            .cloned())
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>, DomainError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .recipes
            .get_mut(&id)
            .filter(|r| r.owner_id == owner_id)
            .map(|r| {
                r.apply(changes);
                r.clone()
            }))
    }

    async fn set_image(
        &self,
        owner_id: Uuid,
        id: Uuid,
        image: &str,
    ) -> Result<Option<Recipe>, DomainError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .recipes
            .get_mut(&id)
            .filter(|r| r.owner_id == owner_id)
            .map(|r| {
                r.image = Some(image.to_string());
                r.clone()
            }))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .recipes
            .get(&id)
            .is_some_and(|r| r.owner_id == owner_id);
        if owned {
            tables.recipes.remove(&id);
        }
        Ok(owned)
    }
}
