//! Tags and ingredients: named labels owned by a user and attached to recipes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Shared shape of [`Tag`] and [`Ingredient`].
///
/// The associated constants name the storage table, the join table linking the
/// attribute to recipes, and the route segment it is served under.
pub trait RecipeAttribute:
    Clone + Serialize + Send + Sync + Unpin + std::fmt::Debug + 'static
{
    const TABLE: &'static str;
    const LINK_TABLE: &'static str;
    const LINK_COLUMN: &'static str;
    const PATH: &'static str;
    /// Name of the recipe payload field holding ids of this attribute.
    const RECIPE_FIELD: &'static str;

    fn new(owner_id: Uuid, name: String) -> Self;
    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Uuid;
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    #[serde(skip)]
    pub owner_id: Uuid,
    pub name: String,
    #[serde(skip, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    #[serde(skip)]
    pub owner_id: Uuid,
    pub name: String,
    #[serde(skip, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

macro_rules! impl_recipe_attribute {
    ($ty:ty, $table:literal, $link_table:literal, $link_column:literal, $path:literal, $field:literal) => {
        impl RecipeAttribute for $ty {
            const TABLE: &'static str = $table;
            const LINK_TABLE: &'static str = $link_table;
            const LINK_COLUMN: &'static str = $link_column;
            const PATH: &'static str = $path;
            const RECIPE_FIELD: &'static str = $field;

            fn new(owner_id: Uuid, name: String) -> Self {
                Self {
                    id: Uuid::new_v4(),
                    owner_id,
                    name,
                    created_at: Utc::now(),
                }
            }

            fn id(&self) -> Uuid {
                self.id
            }

            fn owner_id(&self) -> Uuid {
                self.owner_id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn set_name(&mut self, name: String) {
                self.name = name;
            }
        }
    };
}

impl_recipe_attribute!(Tag, "tags", "recipe_tags", "tag_id", "/tags", "tags");
impl_recipe_attribute!(
    Ingredient,
    "ingredients",
    "recipe_ingredients",
    "ingredient_id",
    "/ingredients",
    "ingredients"
);

/// Sort order used for every attribute listing: name, descending.
pub fn sort_by_name_desc<A: RecipeAttribute>(items: &mut [A]) {
    items.sort_by(|a, b| b.name().cmp(a.name()));
}
