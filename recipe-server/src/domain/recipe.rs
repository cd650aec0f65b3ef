use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::attribute::{Ingredient, Tag};

/// Prices are stored with exactly two decimal places.
pub const PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    #[serde(skip)]
    pub owner_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(owner_id: Uuid, draft: RecipeDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: draft.title,
            time_minutes: draft.time_minutes,
            price: scale_price(draft.price),
            link: draft.link,
            image: None,
            tags: draft.tags,
            ingredients: draft.ingredients,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies `changes` in place; association lists are replaced only when present.
    pub fn apply(&mut self, changes: RecipeChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(time_minutes) = changes.time_minutes {
            self.time_minutes = time_minutes;
        }
        if let Some(price) = changes.price {
            self.price = scale_price(price);
        }
        if let Some(link) = changes.link {
            self.link = link;
        }
        if let Some(tags) = changes.tags {
            self.tags = tags;
        }
        if let Some(ingredients) = changes.ingredients {
            self.ingredients = ingredients;
        }
        self.updated_at = Utc::now();
    }
}

/// Everything needed to create a recipe, or to replace one wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<Uuid>>,
}

impl From<RecipeDraft> for RecipeChanges {
    /// A full replacement: every field is set, so omitted associations clear.
    fn from(draft: RecipeDraft) -> Self {
        Self {
            title: Some(draft.title),
            time_minutes: Some(draft.time_minutes),
            price: Some(draft.price),
            link: Some(draft.link),
            tags: Some(draft.tags),
            ingredients: Some(draft.ingredients),
        }
    }
}

/// Recipe with its tags and ingredients expanded.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
}

impl RecipeDetail {
    pub fn new(recipe: Recipe, tags: Vec<Tag>, ingredients: Vec<Ingredient>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            image: recipe.image,
            tags,
            ingredients,
        }
    }
}

pub fn scale_price(mut price: Decimal) -> Decimal {
    price.rescale(PRICE_SCALE);
    price
}

/// Removes repeated ids while keeping first-seen order.
pub fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
