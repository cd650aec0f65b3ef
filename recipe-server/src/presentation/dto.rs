use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::error::{DomainError, FieldErrors};
use crate::domain::recipe::{Recipe, RecipeChanges, RecipeDraft};
use crate::domain::user::{ProfileChanges, User};

/// Largest absolute price that fits five digits with two decimal places.
const PRICE_LIMIT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);
const MAX_DECIMAL_PLACES: u32 = 2;
const REQUIRED: &str = "This field is required.";

// ======================= USERS =======================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

/// Full profile replacement (`PUT`): email and password are required.
#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: String,
}

impl From<ProfileUpdateRequest> for ProfileChanges {
    fn from(req: ProfileUpdateRequest) -> Self {
        Self {
            email: Some(req.email),
            name: Some(req.name),
            password: Some(req.password),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfilePatchRequest {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub email: Option<String>,
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: Option<String>,
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub name: Option<String>,
}

impl From<ProfilePatchRequest> for ProfileChanges {
    fn from(req: ProfilePatchRequest) -> Self {
        Self {
            email: req.email,
            name: req.name,
            password: req.password,
        }
    }
}

// ======================= TAGS / INGREDIENTS =======================

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AttributeRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AttributePatchRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub name: Option<String>,
}

// ======================= RECIPES =======================

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecipeRequest {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub time_minutes: Option<i32>,
    #[serde(default)]
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[serde(default)]
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub link: String,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub ingredients: Vec<Uuid>,
}

impl RecipeRequest {
    /// Runs the field rules and reports absent or null required fields in the same error map.
    pub fn into_draft(self) -> Result<RecipeDraft, DomainError> {
        let mut errors = self.validate().err().map(FieldErrors::from).unwrap_or_default();
        let required = [
            ("title", self.title.is_none()),
            ("time_minutes", self.time_minutes.is_none()),
            ("price", self.price.is_none()),
        ];
        for (field, missing) in required {
            if missing {
                errors.add(field, REQUIRED);
            }
        }

        match (self.title, self.time_minutes, self.price) {
            (Some(title), Some(time_minutes), Some(price)) if errors.is_empty() => Ok(RecipeDraft {
                title: title.trim().to_string(),
                time_minutes,
                price,
                link: self.link.trim().to_string(),
                tags: self.tags,
                ingredients: self.ingredients,
            }),
            _ => Err(DomainError::Validation(errors)),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct RecipePatchRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 255, message = "Ensure this field has no more than 255 characters.")
    )]
    pub title: Option<String>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub time_minutes: Option<i32>,
    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub link: Option<String>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<Uuid>>,
}

impl From<RecipePatchRequest> for RecipeChanges {
    fn from(req: RecipePatchRequest) -> Self {
        Self {
            title: req.title.map(|t| t.trim().to_string()),
            time_minutes: req.time_minutes,
            price: req.price,
            link: req.link.map(|l| l.trim().to_string()),
            tags: req.tags,
            ingredients: req.ingredients,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: Uuid,
    pub image: Option<String>,
}

impl From<Recipe> for ImageResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            image: recipe.image,
        }
    }
}

// ======================= Validators =======================

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank")
            .with_message(Cow::Borrowed("This field may not be blank.")));
    }
    Ok(())
}

fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    if value.normalize().scale() > MAX_DECIMAL_PLACES {
        return Err(ValidationError::new("max_decimal_places")
            .with_message(Cow::Borrowed("Ensure that there are no more than 2 decimal places.")));
    }
    if value.abs() >= PRICE_LIMIT {
        return Err(ValidationError::new("max_digits")
            .with_message(Cow::Borrowed("Ensure that there are no more than 5 digits in total.")));
    }
    Ok(())
}
