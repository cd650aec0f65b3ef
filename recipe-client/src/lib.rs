//! Typed async client for the recipe REST API.

mod error;
mod http_client;
mod token;
mod types;

pub use error::RecipeClientError;
pub use http_client::RecipeClientHttp;
pub use token::{DEFAULT_TOKEN_FILE, TokenStore};
pub use types::{
    Attribute, AttributeKind, NewRecipe, ProfileUpdate, Recipe, RecipeDetail, RecipeImage,
    RecipeUpdate, TokenPair, User,
};
