// ============================================================================
// MODELS
// ============================================================================
//
// Entry point for all data models. Each model maps one PostgreSQL table
// through a SeaORM entity (see schema.sql for constraints and cascades).
//
// Modules:
//   - users             : accounts (unique email/username, avatar, hash)
//   - tag               : recipe tags (unique name/slug)
//   - ingredient        : ingredient catalog (unique name + unit pair)
//   - recipe            : recipes, owned by a user, with a unique short link
//   - recipe_tag        : recipe <-> tag join (composite key)
//   - recipe_ingredient : recipe <-> ingredient join carrying an amount
//   - favorite_recipe   : user <-> recipe relation (at most one per pair)
//   - shopping_cart     : user <-> recipe relation (at most one per pair)
//   - subscription      : user <-> user relation (no self-subscription)
//   - dto               : request/response shapes for the API layer
//
// ============================================================================

pub mod dto;
pub mod favorite_recipe;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod shopping_cart;
pub mod subscription;
pub mod tag;
pub mod users;
