use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessToken {
    pub access: String,
}

/// Fields to change on the caller's profile; `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A tag or an ingredient; both share the same wire shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Attribute {
    pub id: Uuid,
    pub name: String,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Tag,
    Ingredient,
}

impl AttributeKind {
    pub(crate) fn path(self) -> &'static str {
        match self {
            AttributeKind::Tag => "tags",
            AttributeKind::Ingredient => "ingredients",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({} min, {})",
            self.id, self.title, self.time_minutes, self.price
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecipeDetail {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub image: Option<String>,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
}

impl fmt::Display for RecipeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.title, self.id)?;
        writeln!(f, "  time:  {} min", self.time_minutes)?;
        writeln!(f, "  price: {}", self.price)?;
        if !self.link.is_empty() {
            writeln!(f, "  link:  {}", self.link)?;
        }
        if let Some(image) = &self.image {
            writeln!(f, "  image: {}", image)?;
        }
        let names = |items: &[Attribute]| {
            items
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(f, "  tags:  {}", names(&self.tags))?;
        write!(f, "  ingredients: {}", names(&self.ingredients))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

/// Partial recipe update; omitted fields, including associations, are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecipeImage {
    pub id: Uuid,
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recipe_update_sends_only_set_fields() {
        let update = RecipeUpdate {
            title: Some("Chicken tikka".into()),
            tags: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "title": "Chicken tikka", "tags": [] })
        );
    }

    #[test]
    fn recipe_price_reads_from_string() {
        let recipe: Recipe = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "title": "Toast",
            "time_minutes": 3,
            "price": "1.50",
            "link": "",
            "image": null,
            "tags": [],
            "ingredients": [],
        }))
        .unwrap();
        assert_eq!(recipe.price, Decimal::new(150, 2));
        assert_eq!(recipe.to_string(), format!("[{}] Toast (3 min, 1.50)", Uuid::nil()));
    }
}
