use chrono::Utc;
use sea_orm::*;
use std::collections::HashSet;

use crate::errors::ApiError;
use crate::models::dto::{
    IngredientAmountRequest, PageQuery, RecipeCreateRequest, RecipeDetail,
    RecipeIngredientView, RecipeUpdateRequest, TagResponse, UserResponse,
};
use crate::models::{
    favorite_recipe, ingredient, recipe, recipe_ingredient, recipe_tag,
    shopping_cart, tag, users,
};
use crate::services::relation_service::RelationService;
use crate::utils::{image, short_link};

/// Recipe authoring and lookup.
///
/// Writes touching more than one table (the recipe row plus its tag and
/// ingredient associations) run inside a single transaction. Only the author
/// may update or delete a recipe.
pub struct RecipeService;

/// Optional filters for the recipe listing. Viewer-scoped filters carry the
/// viewer's id; they are ignored for anonymous requests.
#[derive(Debug, Default)]
pub struct RecipeFilters {
    pub author: Option<i32>,
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
}

impl RecipeService {
    pub async fn create(
        db: &DatabaseConnection,
        author_id: i32,
        req: RecipeCreateRequest,
    ) -> Result<recipe::Model, ApiError> {
        // 1. Validate references before writing anything
        Self::check_ingredient_refs(db, &req.ingredients).await?;
        Self::check_tag_refs(db, &req.tags).await?;

        // 2. Store the image, keep only its path
        let image_path = match &req.image {
            Some(data) => Some(image::save_base64_image(data, "recipes")?),
            None => None,
        };

        // 3. Recipe row plus associations, atomically. The stored file is
        // removed again if the write fails.
        match Self::insert_recipe(db, author_id, &req, &image_path).await {
            Ok(recipe) => Ok(recipe),
            Err(e) => {
                if let Some(path) = &image_path {
                    image::delete_image(path);
                }
                Err(e)
            }
        }
    }

    /// Reserve a short link and write the recipe row plus its associations in
    /// one transaction. A concurrent create can claim the same token between
    /// the availability check and the insert; the unique index rejects the
    /// second insert and the whole write retries with a fresh token. The only
    /// unique constraint on the recipes table is the short link, so a
    /// violation here is always a token collision.
    async fn insert_recipe(
        db: &DatabaseConnection,
        author_id: i32,
        req: &RecipeCreateRequest,
        image_path: &Option<String>,
    ) -> Result<recipe::Model, ApiError> {
        loop {
            let token = Self::generate_unique_short_link(db).await?;
            let txn = db.begin().await?;

            let inserted = recipe::ActiveModel {
                author_id: Set(author_id),
                name: Set(req.name.clone()),
                image: Set(image_path.clone()),
                text: Set(req.text.clone()),
                cooking_time: Set(req.cooking_time),
                pub_date: Set(Utc::now()),
                short_link: Set(Some(token)),
                ..Default::default()
            }
            .insert(&txn)
            .await;

            let recipe = match inserted {
                Ok(recipe) => recipe,
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    txn.rollback().await?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            Self::insert_tag_rows(&txn, recipe.id, &req.tags).await?;
            Self::insert_ingredient_rows(&txn, recipe.id, &req.ingredients).await?;

            txn.commit().await?;
            return Ok(recipe);
        }
    }

    /// Partial update by the author. When `tags` or `ingredients` is present
    /// the existing association rows are fully replaced (delete-then-insert),
    /// never merged.
    pub async fn update(
        db: &DatabaseConnection,
        recipe_id: i32,
        actor_id: i32,
        req: RecipeUpdateRequest,
    ) -> Result<recipe::Model, ApiError> {
        let recipe = Self::get(db, recipe_id).await?;
        if recipe.author_id != actor_id {
            return Err(ApiError::Authorization(
                "You do not have permission to perform this action.".to_string(),
            ));
        }

        if let Some(entries) = &req.ingredients {
            Self::check_ingredient_refs(db, entries).await?;
        }
        if let Some(tag_ids) = &req.tags {
            Self::check_tag_refs(db, tag_ids).await?;
        }
        let image_path = match &req.image {
            Some(data) => Some(image::save_base64_image(data, "recipes")?),
            None => None,
        };
        let old_image = recipe.image.clone();

        match Self::apply_update(db, recipe, req, &image_path).await {
            Ok(updated) => {
                // The replaced file has no remaining reference
                if image_path.is_some() {
                    if let Some(old) = &old_image {
                        image::delete_image(old);
                    }
                }
                Ok(updated)
            }
            Err(e) => {
                if let Some(path) = &image_path {
                    image::delete_image(path);
                }
                Err(e)
            }
        }
    }

    async fn apply_update(
        db: &DatabaseConnection,
        recipe: recipe::Model,
        req: RecipeUpdateRequest,
        image_path: &Option<String>,
    ) -> Result<recipe::Model, ApiError> {
        let recipe_id = recipe.id;
        let txn = db.begin().await?;

        let mut active: recipe::ActiveModel = recipe.into();
        if let Some(name) = req.name {
            active.name = Set(name);
        }
        if let Some(text) = req.text {
            active.text = Set(text);
        }
        if let Some(cooking_time) = req.cooking_time {
            active.cooking_time = Set(cooking_time);
        }
        if let Some(path) = image_path {
            active.image = Set(Some(path.clone()));
        }
        let updated = active.update(&txn).await?;

        if let Some(tag_ids) = &req.tags {
            recipe_tag::Entity::delete_many()
                .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
                .exec(&txn)
                .await?;
            Self::insert_tag_rows(&txn, recipe_id, tag_ids).await?;
        }
        if let Some(entries) = &req.ingredients {
            recipe_ingredient::Entity::delete_many()
                .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
                .exec(&txn)
                .await?;
            Self::insert_ingredient_rows(&txn, recipe_id, entries).await?;
        }

        txn.commit().await?;
        Ok(updated)
    }

    /// Delete by the author. Dependent rows are enumerated and removed
    /// explicitly; the schema's ON DELETE CASCADE is the declared backstop.
    pub async fn delete(
        db: &DatabaseConnection,
        recipe_id: i32,
        actor_id: i32,
    ) -> Result<(), ApiError> {
        let recipe = Self::get(db, recipe_id).await?;
        if recipe.author_id != actor_id {
            return Err(ApiError::Authorization(
                "You do not have permission to perform this action.".to_string(),
            ));
        }

        let txn = db.begin().await?;
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        recipe_tag::Entity::delete_many()
            .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        favorite_recipe::Entity::delete_many()
            .filter(favorite_recipe::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        shopping_cart::Entity::delete_many()
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        recipe::Entity::delete_by_id(recipe_id).exec(&txn).await?;
        txn.commit().await?;

        if let Some(path) = &recipe.image {
            image::delete_image(path);
        }
        Ok(())
    }

    pub async fn get(
        db: &DatabaseConnection,
        recipe_id: i32,
    ) -> Result<recipe::Model, ApiError> {
        recipe::Entity::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Recipe not found.".to_string()))
    }

    /// The recipe whose short link matches, for redirects. No mutation.
    pub async fn resolve_short_link(
        db: &DatabaseConnection,
        token: &str,
    ) -> Result<recipe::Model, ApiError> {
        recipe::Entity::find()
            .filter(recipe::Column::ShortLink.eq(token))
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("Recipe not found.".to_string()))
    }

    /// Recipes ordered by publication date descending, filtered, with the
    /// total count for pagination.
    pub async fn list(
        db: &DatabaseConnection,
        filters: &RecipeFilters,
        page: &PageQuery,
    ) -> Result<(Vec<recipe::Model>, u64), ApiError> {
        let mut select = recipe::Entity::find().order_by_desc(recipe::Column::PubDate);

        if let Some(author_id) = filters.author {
            select = select.filter(recipe::Column::AuthorId.eq(author_id));
        }

        if !filters.tag_slugs.is_empty() {
            let tag_ids: Vec<i32> = tag::Entity::find()
                .filter(tag::Column::Slug.is_in(filters.tag_slugs.clone()))
                .all(db)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();
            let recipe_ids: Vec<i32> = recipe_tag::Entity::find()
                .filter(recipe_tag::Column::TagId.is_in(tag_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|rt| rt.recipe_id)
                .collect();
            select = select.filter(recipe::Column::Id.is_in(recipe_ids));
        }

        if let Some(user_id) = filters.favorited_by {
            let recipe_ids: Vec<i32> = favorite_recipe::Entity::find()
                .filter(favorite_recipe::Column::UserId.eq(user_id))
                .all(db)
                .await?
                .into_iter()
                .map(|f| f.recipe_id)
                .collect();
            select = select.filter(recipe::Column::Id.is_in(recipe_ids));
        }

        if let Some(user_id) = filters.in_cart_of {
            let recipe_ids: Vec<i32> = shopping_cart::Entity::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .all(db)
                .await?
                .into_iter()
                .map(|c| c.recipe_id)
                .collect();
            select = select.filter(recipe::Column::Id.is_in(recipe_ids));
        }

        let count = select.clone().count(db).await?;
        let rows = select
            .offset(page.offset())
            .limit(page.limit())
            .all(db)
            .await?;
        Ok((rows, count))
    }

    /// Full detail projection: nested author, tags, ingredient lines and the
    /// viewer-scoped flags.
    pub async fn detail(
        db: &DatabaseConnection,
        recipe: recipe::Model,
        viewer: Option<i32>,
    ) -> Result<RecipeDetail, ApiError> {
        let author = users::Entity::find_by_id(recipe.author_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::Internal("Recipe author missing".to_string()))?;
        let is_subscribed = RelationService::is_subscribed(db, viewer, author.id).await?;

        let tag_ids: Vec<i32> = recipe_tag::Entity::find()
            .filter(recipe_tag::Column::RecipeId.eq(recipe.id))
            .all(db)
            .await?
            .into_iter()
            .map(|rt| rt.tag_id)
            .collect();
        let tags: Vec<TagResponse> = if tag_ids.is_empty() {
            Vec::new()
        } else {
            tag::Entity::find()
                .filter(tag::Column::Id.is_in(tag_ids))
                .order_by_asc(tag::Column::Id)
                .all(db)
                .await?
                .into_iter()
                .map(TagResponse::from)
                .collect()
        };

        let ingredient_rows = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
            .all(db)
            .await?;
        let ingredient_ids: Vec<i32> =
            ingredient_rows.iter().map(|r| r.ingredient_id).collect();
        let catalog = if ingredient_ids.is_empty() {
            Vec::new()
        } else {
            ingredient::Entity::find()
                .filter(ingredient::Column::Id.is_in(ingredient_ids))
                .all(db)
                .await?
        };
        let ingredients: Vec<RecipeIngredientView> = ingredient_rows
            .iter()
            .filter_map(|row| {
                catalog.iter().find(|i| i.id == row.ingredient_id).map(|i| {
                    RecipeIngredientView {
                        id: i.id,
                        name: i.name.clone(),
                        measurement_unit: i.measurement_unit.clone(),
                        amount: row.amount,
                    }
                })
            })
            .collect();

        let is_favorited = RelationService::is_favorited(db, viewer, recipe.id).await?;
        let is_in_shopping_cart = RelationService::is_in_cart(db, viewer, recipe.id).await?;

        Ok(RecipeDetail {
            id: recipe.id,
            tags,
            author: UserResponse::from_model(author, is_subscribed),
            ingredients,
            is_favorited,
            is_in_shopping_cart,
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        })
    }

    /// Generate a short-link token and retry until it does not collide with
    /// an existing recipe. Collisions are never surfaced to the caller.
    async fn generate_unique_short_link(
        db: &DatabaseConnection,
    ) -> Result<String, ApiError> {
        loop {
            let token = short_link::random_token();
            let exists = recipe::Entity::find()
                .filter(recipe::Column::ShortLink.eq(token.as_str()))
                .one(db)
                .await?;
            if exists.is_none() {
                return Ok(token);
            }
        }
    }

    fn duplicate_id(ids: &[i32]) -> Option<i32> {
        let mut seen = HashSet::new();
        ids.iter().find(|&&id| !seen.insert(id)).copied()
    }

    async fn check_ingredient_refs(
        db: &DatabaseConnection,
        entries: &[IngredientAmountRequest],
    ) -> Result<(), ApiError> {
        if entries.is_empty() {
            return Err(ApiError::Validation(
                "Recipe must contain at least one ingredient.".to_string(),
            ));
        }
        let ids: Vec<i32> = entries.iter().map(|e| e.id).collect();
        if let Some(id) = Self::duplicate_id(&ids) {
            return Err(ApiError::Validation(format!(
                "Duplicate ingredient id: {}",
                id
            )));
        }

        let found = ingredient::Entity::find()
            .filter(ingredient::Column::Id.is_in(ids.clone()))
            .all(db)
            .await?;
        for id in &ids {
            if !found.iter().any(|i| i.id == *id) {
                return Err(ApiError::Validation(format!(
                    "Unknown ingredient id: {}",
                    id
                )));
            }
        }
        Ok(())
    }

    async fn check_tag_refs(
        db: &DatabaseConnection,
        tag_ids: &[i32],
    ) -> Result<(), ApiError> {
        if tag_ids.is_empty() {
            return Ok(());
        }
        if let Some(id) = Self::duplicate_id(tag_ids) {
            return Err(ApiError::Validation(format!("Duplicate tag id: {}", id)));
        }

        let found = tag::Entity::find()
            .filter(tag::Column::Id.is_in(tag_ids.to_vec()))
            .all(db)
            .await?;
        for id in tag_ids {
            if !found.iter().any(|t| t.id == *id) {
                return Err(ApiError::Validation(format!("Unknown tag id: {}", id)));
            }
        }
        Ok(())
    }

    async fn insert_tag_rows<C: ConnectionTrait>(
        conn: &C,
        recipe_id: i32,
        tag_ids: &[i32],
    ) -> Result<(), ApiError> {
        if tag_ids.is_empty() {
            return Ok(());
        }
        let rows = tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        });
        recipe_tag::Entity::insert_many(rows).exec(conn).await?;
        Ok(())
    }

    async fn insert_ingredient_rows<C: ConnectionTrait>(
        conn: &C,
        recipe_id: i32,
        entries: &[IngredientAmountRequest],
    ) -> Result<(), ApiError> {
        if entries.is_empty() {
            return Ok(());
        }
        let rows = entries.iter().map(|entry| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(entry.id),
            amount: Set(entry.amount),
            ..Default::default()
        });
        recipe_ingredient::Entity::insert_many(rows)
            .exec(conn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => ApiError::Validation(
                    "Duplicate ingredient in recipe.".to_string(),
                ),
                _ => ApiError::Database(e),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_recipe(author_id: i32) -> recipe::Model {
        recipe::Model {
            id: 10,
            author_id,
            name: "Borscht".to_string(),
            image: None,
            text: "Cook it".to_string(),
            cooking_time: 60,
            pub_date: Utc::now(),
            short_link: Some("Ab3x".to_string()),
        }
    }

    #[test]
    fn test_duplicate_id_detection() {
        assert_eq!(RecipeService::duplicate_id(&[1, 2, 3]), None);
        assert_eq!(RecipeService::duplicate_id(&[1, 2, 1]), Some(1));
        assert_eq!(RecipeService::duplicate_id(&[]), None);
    }

    #[tokio::test]
    async fn test_update_by_non_author_is_forbidden() {
        // Only the recipe lookup is mocked; an authorization failure must
        // stop before any further statement runs.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_recipe(1)]])
            .into_connection();

        let req = RecipeUpdateRequest {
            name: Some("Stolen".to_string()),
            text: None,
            cooking_time: None,
            tags: None,
            ingredients: None,
            image: None,
        };
        let err = RecipeService::update(&db, 10, 2, req).await.unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_delete_by_non_author_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_recipe(1)]])
            .into_connection();

        let err = RecipeService::delete(&db, 10, 2).await.unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_ingredient_ids() {
        // Duplicate detection runs before any catalog lookup.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let req = RecipeCreateRequest {
            name: "Borscht".to_string(),
            text: "Cook it".to_string(),
            cooking_time: 30,
            tags: vec![],
            ingredients: vec![
                IngredientAmountRequest { id: 1, amount: 5 },
                IngredientAmountRequest { id: 1, amount: 7 },
            ],
            image: None,
        };
        let err = RecipeService::create(&db, 1, req).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_ingredient_id() {
        // Catalog lookup returns nothing for id 99.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ingredient::Model>::new()])
            .into_connection();

        let req = RecipeCreateRequest {
            name: "Borscht".to_string(),
            text: "Cook it".to_string(),
            cooking_time: 30,
            tags: vec![],
            ingredients: vec![IngredientAmountRequest { id: 99, amount: 5 }],
            image: None,
        };
        let err = RecipeService::create(&db, 1, req).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resolve_short_link_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<recipe::Model>::new()])
            .into_connection();

        let err = RecipeService::resolve_short_link(&db, "zzzz")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_short_link_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_recipe(1)]])
            .into_connection();

        let recipe = RecipeService::resolve_short_link(&db, "Ab3x").await.unwrap();
        assert_eq!(recipe.id, 10);
    }

    fn sample_ingredient(id: i32) -> ingredient::Model {
        ingredient::Model {
            id,
            name: "Salt".to_string(),
            measurement_unit: "g".to_string(),
        }
    }

    fn sample_tag(id: i32) -> tag::Model {
        tag::Model {
            id,
            name: "Dinner".to_string(),
            slug: "dinner".to_string(),
        }
    }

    // The transaction log is inspected through its Debug output; quotes
    // around identifiers may appear escaped there.
    fn stmt_position(dump: &str, op: &str, table: &str) -> usize {
        dump.find(&format!("{} \\\"{}\\\"", op, table))
            .or_else(|| dump.find(&format!("{} \"{}\"", op, table)))
            .unwrap()
    }

    fn stmt_count(dump: &str, op: &str, table: &str) -> usize {
        dump.matches(&format!("{} \\\"{}\\\"", op, table)).count()
            + dump.matches(&format!("{} \"{}\"", op, table)).count()
    }

    #[tokio::test]
    async fn test_update_replaces_associations_delete_then_insert() {
        let mut inserted_line = BTreeMap::new();
        inserted_line.insert("id", Value::from(7i32));

        // Queries: recipe lookup, ingredient catalog, tag catalog, the UPDATE
        // returning the row, the ingredient insert returning its id. Execs:
        // tag delete, tag insert, ingredient delete.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_recipe(1)]])
            .append_query_results([vec![sample_ingredient(2)]])
            .append_query_results([vec![sample_tag(5)]])
            .append_query_results([vec![sample_recipe(1)]])
            .append_query_results([vec![inserted_line]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let req = RecipeUpdateRequest {
            name: Some("Updated".to_string()),
            text: None,
            cooking_time: None,
            tags: Some(vec![5]),
            ingredients: Some(vec![IngredientAmountRequest { id: 2, amount: 3 }]),
            image: None,
        };
        RecipeService::update(&db, 10, 1, req).await.unwrap();

        // Old association rows go away before the new ones land, for both
        // join tables, exactly once each.
        let dump = format!("{:?}", db.into_transaction_log());
        for table in ["recipe_tags", "recipe_ingredients"] {
            assert_eq!(stmt_count(&dump, "DELETE FROM", table), 1, "{}", table);
            assert_eq!(stmt_count(&dump, "INSERT INTO", table), 1, "{}", table);
            assert!(
                stmt_position(&dump, "DELETE FROM", table)
                    < stmt_position(&dump, "INSERT INTO", table),
                "{}",
                table
            );
        }
    }

    #[tokio::test]
    async fn test_create_retries_taken_short_link_token() {
        let mut inserted_line = BTreeMap::new();
        inserted_line.insert("id", Value::from(7i32));

        // First token draw collides with an existing recipe, the second one
        // is free; exactly one recipe row is inserted.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_ingredient(2)]])
            .append_query_results([vec![sample_recipe(1)]])
            .append_query_results([Vec::<recipe::Model>::new()])
            .append_query_results([vec![sample_recipe(1)]])
            .append_query_results([vec![inserted_line]])
            .into_connection();

        let req = RecipeCreateRequest {
            name: "Borscht".to_string(),
            text: "Cook it".to_string(),
            cooking_time: 30,
            tags: vec![],
            ingredients: vec![IngredientAmountRequest { id: 2, amount: 3 }],
            image: None,
        };
        let recipe = RecipeService::create(&db, 1, req).await.unwrap();
        assert_eq!(recipe.id, 10);

        let dump = format!("{:?}", db.into_transaction_log());
        assert_eq!(stmt_count(&dump, "INSERT INTO", "recipes"), 1);
    }

    #[tokio::test]
    async fn test_create_failure_removes_stored_image() {
        let media_root =
            std::env::temp_dir().join(format!("media-{}", uuid::Uuid::new_v4()));
        std::env::set_var("MEDIA_ROOT", &media_root);

        // Catalog lookup and short-link check pass, the recipe insert fails.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_ingredient(2)]])
            .append_query_results([Vec::<recipe::Model>::new()])
            .append_query_errors([DbErr::Custom("insert failed".to_string())])
            .into_connection();

        let req = RecipeCreateRequest {
            name: "Borscht".to_string(),
            text: "Cook it".to_string(),
            cooking_time: 30,
            tags: vec![],
            ingredients: vec![IngredientAmountRequest { id: 2, amount: 3 }],
            // "hi" in base64, stored as a png
            image: Some("aGk=".to_string()),
        };
        let err = RecipeService::create(&db, 1, req).await.unwrap_err();
        assert!(matches!(err, ApiError::Database(_)));

        let leftover = std::fs::read_dir(media_root.join("recipes"))
            .map(|dir| dir.count())
            .unwrap_or(0);
        assert_eq!(leftover, 0);
        let _ = std::fs::remove_dir_all(&media_root);
    }
}
