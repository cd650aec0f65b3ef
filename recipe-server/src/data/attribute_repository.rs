use std::marker::PhantomData;

use crate::domain::attribute::RecipeAttribute;
use crate::domain::error::DomainError;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

/// Owner-scoped storage for tags and ingredients.
#[async_trait]
pub trait AttributeRepository<A: RecipeAttribute>: Send + Sync {
    async fn create(&self, item: A) -> Result<A, DomainError>;
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<A>, DomainError>;
    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<A>, DomainError>;
    /// Returns the subset of `ids` that exist and belong to `owner_id`.
    async fn find_many(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<A>, DomainError>;
    async fn rename(&self, owner_id: Uuid, id: Uuid, name: String)
    -> Result<Option<A>, DomainError>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DomainError>;
}

pub struct PostgresAttributeRepository<A> {
    pool: PgPool,
    _marker: PhantomData<fn() -> A>,
}

impl<A> Clone for PostgresAttributeRepository<A> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

impl<A> PostgresAttributeRepository<A> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

fn db_error(table: &str, e: sqlx::Error) -> DomainError {
    error!(table, "database error: {}", e);
    DomainError::Internal(format!("database error: {}", e))
}

#[async_trait]
impl<A> AttributeRepository<A> for PostgresAttributeRepository<A>
where
    A: RecipeAttribute + for<'r> FromRow<'r, PgRow>,
{
    async fn create(&self, item: A) -> Result<A, DomainError> {
        let sql = format!(
            "INSERT INTO {} (id, owner_id, name) VALUES ($1, $2, $3) \
             RETURNING id, owner_id, name, created_at",
            A::TABLE
        );
        let created = sqlx::query_as::<_, A>(&sql)
            .bind(item.id())
            .bind(item.owner_id())
            .bind(item.name())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error(A::TABLE, e))?;

        info!(table = A::TABLE, id = %created.id(), owner_id = %created.owner_id(), "attribute created");
        Ok(created)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<A>, DomainError> {
        let sql = format!(
            "SELECT id, owner_id, name, created_at FROM {} \
             WHERE owner_id = $1 ORDER BY name DESC",
            A::TABLE
        );
        sqlx::query_as::<_, A>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(A::TABLE, e))
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<A>, DomainError> {
        let sql = format!(
            "SELECT id, owner_id, name, created_at FROM {} WHERE id = $1 AND owner_id = $2",
            A::TABLE
        );
        sqlx::query_as::<_, A>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(A::TABLE, e))
    }

    async fn find_many(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<Vec<A>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, owner_id, name, created_at FROM {} \
             WHERE owner_id = $1 AND id = ANY($2) ORDER BY name DESC",
            A::TABLE
        );
        sqlx::query_as::<_, A>(&sql)
            .bind(owner_id)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error(A::TABLE, e))
    }

    async fn rename(
        &self,
        owner_id: Uuid,
        id: Uuid,
        name: String,
    ) -> Result<Option<A>, DomainError> {
        let sql = format!(
            "UPDATE {} SET name = $1 WHERE id = $2 AND owner_id = $3 \
             RETURNING id, owner_id, name, created_at",
            A::TABLE
        );
        let updated = sqlx::query_as::<_, A>(&sql)
            .bind(name)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(A::TABLE, e))?;

        if updated.is_some() {
            info!(table = A::TABLE, id = %id, "attribute renamed");
        }
        Ok(updated)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, DomainError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND owner_id = $2", A::TABLE);
        let deleted = sqlx::query(&sql)
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error(A::TABLE, e))?;

        if deleted.rows_affected() > 0 {
            info!(table = A::TABLE, id = %id, "attribute deleted");
        }
        Ok(deleted.rows_affected() > 0)
    }
}
