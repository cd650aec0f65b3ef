pub mod attribute;
pub mod error;
pub mod recipe;
pub mod user;
