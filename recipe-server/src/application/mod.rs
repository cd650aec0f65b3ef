pub mod attribute_service;
pub mod auth_service;
pub mod recipe_service;
