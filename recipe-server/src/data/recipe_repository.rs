use crate::domain::attribute::{Ingredient, RecipeAttribute, Tag};
use crate::domain::error::DomainError;
use crate::domain::recipe::{Recipe, RecipeChanges};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, info};
use uuid::Uuid;

#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Inserts the recipe and its tag/ingredient links atomically.
    async fn create(&self, recipe: Recipe) -> Result<Recipe, DomainError>;
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Recipe>, DomainError>;
    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Recipe>, DomainError>;
    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>, DomainError>;
    async fn set_image(
        &self,
        owner_id: Uuid,
        id: Uuid,
        image: &str,
    ) -> Result<Option<Recipe>, DomainError>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DomainError>;
}

const SELECT_RECIPE: &str = r#"
    SELECT r.id, r.owner_id, r.title, r.time_minutes, r.price, r.link, r.image,
           r.created_at, r.updated_at,
           COALESCE(
               (SELECT array_agg(rt.tag_id ORDER BY rt.position) FROM recipe_tags rt WHERE rt.recipe_id = r.id),
               '{}'
           ) AS tags,
           COALESCE(
               (SELECT array_agg(ri.ingredient_id ORDER BY ri.position) FROM recipe_ingredients ri WHERE ri.recipe_id = r.id),
               '{}'
           ) AS ingredients
    FROM recipes r
"#;

#[derive(Clone)]
pub struct PostgresRecipeRepository {
    pool: PgPool,
}

impl PostgresRecipeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replaces the recipe's links to attributes of type `A` with `ids`, keeping their order.
    async fn replace_links<A: RecipeAttribute>(
        tx: &mut Transaction<'_, Postgres>,
        recipe_id: Uuid,
        ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query(&format!("DELETE FROM {} WHERE recipe_id = $1", A::LINK_TABLE))
            .bind(recipe_id)
            .execute(&mut **tx)
            .await?;

        if !ids.is_empty() {
            sqlx::query(&format!(
                "INSERT INTO {} (recipe_id, {}, position) \
                 SELECT $1, link.id, link.ord FROM UNNEST($2::uuid[]) WITH ORDINALITY AS link(id, ord)",
                A::LINK_TABLE,
                A::LINK_COLUMN
            ))
            .bind(recipe_id)
            .bind(ids.to_vec())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    error!("{}: {}", context, e);
    DomainError::Internal(format!("database error: {}", e))
}

#[async_trait]
impl RecipeRepository for PostgresRecipeRepository {
    async fn create(&self, recipe: Recipe) -> Result<Recipe, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("failed to begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO recipes (id, owner_id, title, time_minutes, price, link, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            "#,
        )
        .bind(recipe.id)
        .bind(recipe.owner_id)
        .bind(&recipe.title)
        .bind(recipe.time_minutes)
        .bind(recipe.price)
        .bind(&recipe.link)
        .bind(&recipe.image)
        .bind(recipe.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("failed to create recipe", e))?;

        Self::replace_links::<Tag>(&mut tx, recipe.id, &recipe.tags)
            .await
            .map_err(|e| db_error("failed to link tags", e))?;
        Self::replace_links::<Ingredient>(&mut tx, recipe.id, &recipe.ingredients)
            .await
            .map_err(|e| db_error("failed to link ingredients", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("failed to commit recipe", e))?;

        info!(recipe_id = %recipe.id, owner_id = %recipe.owner_id, "recipe created");
        Ok(recipe)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Recipe>, DomainError> {
        sqlx::query_as::<_, Recipe>(&format!(
            "{} WHERE r.owner_id = $1 ORDER BY r.created_at DESC",
            SELECT_RECIPE
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("db error while fetching recipes", e))
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Recipe>, DomainError> {
        sqlx::query_as::<_, Recipe>(&format!(
            "{} WHERE r.id = $1 AND r.owner_id = $2",
            SELECT_RECIPE
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("db error find recipe", e))
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: RecipeChanges,
    ) -> Result<Option<Recipe>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("failed to begin transaction", e))?;

        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE recipes
            SET
                title = COALESCE($1, title),
                time_minutes = COALESCE($2, time_minutes),
                price = COALESCE($3, price),
                link = COALESCE($4, link),
                updated_at = $5
            WHERE id = $6 AND owner_id = $7
            RETURNING id
            "#,
        )
        .bind(changes.title)
        .bind(changes.time_minutes)
        .bind(changes.price)
        .bind(changes.link)
        .bind(Utc::now())
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("failed to update recipe", e))?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(tags) = &changes.tags {
            Self::replace_links::<Tag>(&mut tx, id, tags)
                .await
                .map_err(|e| db_error("failed to relink tags", e))?;
        }
        if let Some(ingredients) = &changes.ingredients {
            Self::replace_links::<Ingredient>(&mut tx, id, ingredients)
                .await
                .map_err(|e| db_error("failed to relink ingredients", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("failed to commit recipe update", e))?;

        info!(recipe_id = %id, "recipe updated");
        self.find(owner_id, id).await
    }

    async fn set_image(
        &self,
        owner_id: Uuid,
        id: Uuid,
        image: &str,
    ) -> Result<Option<Recipe>, DomainError> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            "UPDATE recipes SET image = $1, updated_at = $2 WHERE id = $3 AND owner_id = $4 RETURNING id",
        )
        .bind(image)
        .bind(Utc::now())
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("failed to set recipe image", e))?;

        match updated {
            Some(_) => {
                info!(recipe_id = %id, image, "recipe image stored");
                self.find(owner_id, id).await
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM recipes WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if deleted.rows_affected() > 0 {
            info!(recipe_id = %id, "recipe deleted");
        }
        Ok(deleted.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linked_ids_are_aggregated_in_submission_order() {
        assert!(SELECT_RECIPE.contains("array_agg(rt.tag_id ORDER BY rt.position)"));
        assert!(SELECT_RECIPE.contains("array_agg(ri.ingredient_id ORDER BY ri.position)"));
    }
}
