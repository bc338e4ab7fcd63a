use chrono::Utc;
use sea_orm::*;

use crate::errors::ApiError;
use crate::models::{favorite_recipe, recipe, shopping_cart, subscription, users};

/// Favorite, shopping-cart and subscription toggles.
///
/// All three are idempotency-guarded join rows: add fails with Conflict when
/// the pair already exists, remove fails with NotFound when it does not.
/// The service-level existence checks give clean error messages; the schema's
/// unique constraints are the backstop for concurrent duplicate adds, and a
/// store-level rejection is mapped to the same Conflict.
pub struct RelationService;

impl RelationService {
    pub async fn add_favorite(
        db: &DatabaseConnection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<recipe::Model, ApiError> {
        let recipe = Self::get_recipe(db, recipe_id).await?;

        let exists = favorite_recipe::Entity::find()
            .filter(favorite_recipe::Column::UserId.eq(user_id))
            .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
            .one(db)
            .await?;
        if exists.is_some() {
            return Err(ApiError::Conflict(
                "Recipe is already in favorites.".to_string(),
            ));
        }

        let row = favorite_recipe::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            added_at: Set(Utc::now()),
            ..Default::default()
        };
        row.insert(db).await.map_err(|e| {
            ApiError::conflict_on_unique(e, "Recipe is already in favorites.")
        })?;

        Ok(recipe)
    }

    pub async fn remove_favorite(
        db: &DatabaseConnection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), ApiError> {
        Self::get_recipe(db, recipe_id).await?;

        let deleted = favorite_recipe::Entity::delete_many()
            .filter(favorite_recipe::Column::UserId.eq(user_id))
            .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
            .exec(db)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(ApiError::NotFound(
                "Recipe is not in favorites.".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn add_to_cart(
        db: &DatabaseConnection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<recipe::Model, ApiError> {
        let recipe = Self::get_recipe(db, recipe_id).await?;

        let exists = shopping_cart::Entity::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .one(db)
            .await?;
        if exists.is_some() {
            return Err(ApiError::Conflict(
                "Recipe is already in the shopping cart.".to_string(),
            ));
        }

        let row = shopping_cart::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            added_at: Set(Utc::now()),
            ..Default::default()
        };
        row.insert(db).await.map_err(|e| {
            ApiError::conflict_on_unique(e, "Recipe is already in the shopping cart.")
        })?;

        Ok(recipe)
    }

    pub async fn remove_from_cart(
        db: &DatabaseConnection,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), ApiError> {
        Self::get_recipe(db, recipe_id).await?;

        let deleted = shopping_cart::Entity::delete_many()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .exec(db)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(ApiError::NotFound(
                "Recipe is not in the shopping cart.".to_string(),
            ));
        }
        Ok(())
    }

    /// Subscribe `user_id` to `author_id`. Self-subscription is rejected
    /// before touching the store.
    pub async fn subscribe(
        db: &DatabaseConnection,
        user_id: i32,
        author_id: i32,
    ) -> Result<users::Model, ApiError> {
        if user_id == author_id {
            return Err(ApiError::Validation(
                "You cannot subscribe to yourself.".to_string(),
            ));
        }

        let author = users::Entity::find_by_id(author_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

        let exists = subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::AuthorId.eq(author_id))
            .one(db)
            .await?;
        if exists.is_some() {
            return Err(ApiError::Conflict(
                "You are already subscribed to this user.".to_string(),
            ));
        }

        let row = subscription::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            ..Default::default()
        };
        row.insert(db).await.map_err(|e| {
            ApiError::conflict_on_unique(e, "You are already subscribed to this user.")
        })?;

        Ok(author)
    }

    pub async fn unsubscribe(
        db: &DatabaseConnection,
        user_id: i32,
        author_id: i32,
    ) -> Result<(), ApiError> {
        users::Entity::find_by_id(author_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

        let deleted = subscription::Entity::delete_many()
            .filter(subscription::Column::UserId.eq(user_id))
            .filter(subscription::Column::AuthorId.eq(author_id))
            .exec(db)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(ApiError::NotFound(
                "You are not subscribed to this user.".to_string(),
            ));
        }
        Ok(())
    }

    /// The authors the user follows, ordered by email, each with their
    /// recipe count.
    pub async fn subscriptions(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<Vec<(users::Model, u64)>, ApiError> {
        let subs = subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let author_ids: Vec<i32> = subs.into_iter().map(|s| s.author_id).collect();
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let authors = users::Entity::find()
            .filter(users::Column::Id.is_in(author_ids))
            .order_by_asc(users::Column::Email)
            .all(db)
            .await?;

        let mut result = Vec::with_capacity(authors.len());
        for author in authors {
            let recipes_count = recipe::Entity::find()
                .filter(recipe::Column::AuthorId.eq(author.id))
                .count(db)
                .await?;
            result.push((author, recipes_count));
        }
        Ok(result)
    }

    pub async fn is_subscribed(
        db: &DatabaseConnection,
        viewer: Option<i32>,
        author_id: i32,
    ) -> Result<bool, ApiError> {
        let Some(viewer_id) = viewer else {
            return Ok(false);
        };
        let exists = subscription::Entity::find()
            .filter(subscription::Column::UserId.eq(viewer_id))
            .filter(subscription::Column::AuthorId.eq(author_id))
            .one(db)
            .await?;
        Ok(exists.is_some())
    }

    pub async fn is_favorited(
        db: &DatabaseConnection,
        viewer: Option<i32>,
        recipe_id: i32,
    ) -> Result<bool, ApiError> {
        let Some(viewer_id) = viewer else {
            return Ok(false);
        };
        let exists = favorite_recipe::Entity::find()
            .filter(favorite_recipe::Column::UserId.eq(viewer_id))
            .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
            .one(db)
            .await?;
        Ok(exists.is_some())
    }

    pub async fn is_in_cart(
        db: &DatabaseConnection,
        viewer: Option<i32>,
        recipe_id: i32,
    ) -> Result<bool, ApiError> {
        let Some(viewer_id) = viewer else {
            return Ok(false);
        };
        let exists = shopping_cart::Entity::find()
            .filter(shopping_cart::Column::UserId.eq(viewer_id))
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .one(db)
            .await?;
        Ok(exists.is_some())
    }

    async fn get_recipe(
        db: &DatabaseConnection,
        recipe_id: i32,
    ) -> Result<recipe::Model, ApiError> {
        recipe::Entity::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Recipe not found.".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe() -> recipe::Model {
        recipe::Model {
            id: 10,
            author_id: 2,
            name: "Borscht".to_string(),
            image: None,
            text: "Cook it".to_string(),
            cooking_time: 60,
            pub_date: Utc::now(),
            short_link: Some("Ab3x".to_string()),
        }
    }

    #[tokio::test]
    async fn test_self_subscription_rejected_without_queries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = RelationService::subscribe(&db, 7, 7).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_add_favorite_twice_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_recipe()]])
            .append_query_results([vec![favorite_recipe::Model {
                id: 1,
                user_id: 1,
                recipe_id: 10,
                added_at: Utc::now(),
            }]])
            .into_connection();

        let err = RelationService::add_favorite(&db, 1, 10).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_add_favorite_missing_recipe_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<recipe::Model>::new()])
            .into_connection();

        let err = RelationService::add_favorite(&db, 1, 99).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_absent_cart_row_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_recipe()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = RelationService::remove_from_cart(&db, 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_anonymous_viewer_flags_are_false() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert!(!RelationService::is_favorited(&db, None, 10).await.unwrap());
        assert!(!RelationService::is_in_cart(&db, None, 10).await.unwrap());
        assert!(!RelationService::is_subscribed(&db, None, 2).await.unwrap());
    }
}
