pub mod attribute_repository;
pub mod memory;
pub mod recipe_repository;
pub mod user_repository;
