pub mod recipe_service;
pub mod relation_service;
pub mod shopping_list_service;
pub mod user_service;
