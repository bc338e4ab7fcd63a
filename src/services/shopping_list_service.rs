use sea_orm::*;
use std::collections::HashMap;

use crate::errors::ApiError;
use crate::models::{ingredient, recipe_ingredient, shopping_cart};

pub struct ShoppingListService;

/// One aggregated line of the shopping list: an ingredient identity and the
/// summed amount across every recipe in the user's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Result of the aggregation. An empty cart yields the explicit `Empty`
/// sentinel, not an empty item list: the caller renders a human-readable
/// message instead of an empty file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShoppingList {
    Empty,
    Items(Vec<ShoppingListItem>),
}

impl ShoppingList {
    /// Render the list as the plain-text attachment body, one line per
    /// ingredient, ordered by name.
    pub fn render_text(&self) -> String {
        match self {
            ShoppingList::Empty => "Shopping list is empty.".to_string(),
            ShoppingList::Items(items) => items
                .iter()
                .map(|item| {
                    format!(
                        "{} ({}) - {}",
                        item.name, item.measurement_unit, item.total_amount
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// Consuming iteration only: the list is produced once per request and read
// once by the renderer.
impl IntoIterator for ShoppingList {
    type Item = ShoppingListItem;
    type IntoIter = std::vec::IntoIter<ShoppingListItem>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            ShoppingList::Empty => Vec::new().into_iter(),
            ShoppingList::Items(items) => items.into_iter(),
        }
    }
}

impl ShoppingListService {
    /// Build the aggregated shopping list for a user.
    ///
    /// Collects the recipes in the user's cart, joins their ingredient rows,
    /// groups by ingredient identity and sums the amounts.
    pub async fn build(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<ShoppingList, ApiError> {
        // 1. Recipes currently in the cart
        let cart_rows = shopping_cart::Entity::find()
            .filter(shopping_cart::Column::UserId.eq(user_id))
            .all(db)
            .await?;

        if cart_rows.is_empty() {
            return Ok(ShoppingList::Empty);
        }

        let recipe_ids: Vec<i32> = cart_rows.into_iter().map(|row| row.recipe_id).collect();

        // 2. Ingredient rows of those recipes
        let ingredient_rows = recipe_ingredient::Entity::find()
            .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
            .all(db)
            .await?;

        // 3. Resolve ingredient identities
        let ingredient_ids: Vec<i32> = ingredient_rows
            .iter()
            .map(|row| row.ingredient_id)
            .collect();
        let ingredients: HashMap<i32, ingredient::Model> = ingredient::Entity::find()
            .filter(ingredient::Column::Id.is_in(ingredient_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|model| (model.id, model))
            .collect();

        let entries: Vec<(String, String, i32)> = ingredient_rows
            .iter()
            .filter_map(|row| {
                ingredients.get(&row.ingredient_id).map(|ing| {
                    (ing.name.clone(), ing.measurement_unit.clone(), row.amount)
                })
            })
            .collect();

        Ok(Self::aggregate(entries))
    }

    /// Grouped sum over (name, unit, amount) entries, sorted by name.
    /// Grouping is order-independent: the totals do not depend on the order
    /// recipes were added to the cart.
    fn aggregate(entries: Vec<(String, String, i32)>) -> ShoppingList {
        if entries.is_empty() {
            return ShoppingList::Empty;
        }

        let mut totals: HashMap<(String, String), i64> = HashMap::new();
        for (name, unit, amount) in entries {
            *totals.entry((name, unit)).or_insert(0) += i64::from(amount);
        }

        let mut items: Vec<ShoppingListItem> = totals
            .into_iter()
            .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
                name,
                measurement_unit,
                total_amount,
            })
            .collect();

        items.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
        });

        ShoppingList::Items(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(name: &str, unit: &str, amount: i32) -> (String, String, i32) {
        (name.to_string(), unit.to_string(), amount)
    }

    #[test]
    fn test_aggregate_sums_same_ingredient() {
        // Two cart recipes both using Salt (g): 10 and 15 -> one 25 line.
        let list = ShoppingListService::aggregate(vec![
            entry("Salt", "g", 10),
            entry("Salt", "g", 15),
        ]);
        assert_eq!(
            list,
            ShoppingList::Items(vec![ShoppingListItem {
                name: "Salt".to_string(),
                measurement_unit: "g".to_string(),
                total_amount: 25,
            }])
        );
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let forward = ShoppingListService::aggregate(vec![
            entry("Salt", "g", 10),
            entry("Flour", "g", 200),
            entry("Salt", "g", 15),
        ]);
        let reversed = ShoppingListService::aggregate(vec![
            entry("Salt", "g", 15),
            entry("Flour", "g", 200),
            entry("Salt", "g", 10),
        ]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_aggregate_sorts_by_name() {
        let list = ShoppingListService::aggregate(vec![
            entry("Zucchini", "pc", 2),
            entry("Apple", "pc", 3),
            entry("Milk", "ml", 500),
        ]);
        match list {
            ShoppingList::Items(items) => {
                let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
                assert_eq!(names, vec!["Apple", "Milk", "Zucchini"]);
            }
            ShoppingList::Empty => panic!("expected items"),
        }
    }

    #[test]
    fn test_aggregate_keeps_units_separate() {
        // Same name, different unit: distinct lines.
        let list = ShoppingListService::aggregate(vec![
            entry("Sugar", "g", 100),
            entry("Sugar", "cup", 1),
        ]);
        match list {
            ShoppingList::Items(items) => assert_eq!(items.len(), 2),
            ShoppingList::Empty => panic!("expected items"),
        }
    }

    #[test]
    fn test_render_text() {
        let list = ShoppingListService::aggregate(vec![
            entry("Salt", "g", 10),
            entry("Salt", "g", 15),
        ]);
        assert_eq!(list.render_text(), "Salt (g) - 25");
        assert_eq!(
            ShoppingList::Empty.render_text(),
            "Shopping list is empty."
        );
    }

    #[test]
    fn test_into_iter_consumes_items() {
        let list = ShoppingListService::aggregate(vec![entry("Salt", "g", 10)]);
        let collected: Vec<ShoppingListItem> = list.into_iter().collect();
        assert_eq!(collected.len(), 1);
        assert!(ShoppingList::Empty.into_iter().next().is_none());
    }

    #[tokio::test]
    async fn test_build_empty_cart_returns_sentinel() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<shopping_cart::Model>::new()])
            .into_connection();

        let list = ShoppingListService::build(&db, 1).await.unwrap();
        assert_eq!(list, ShoppingList::Empty);
    }

    #[tokio::test]
    async fn test_build_aggregates_across_cart_recipes() {
        let now = Utc::now();
        let cart = vec![
            shopping_cart::Model {
                id: 1,
                user_id: 1,
                recipe_id: 10,
                added_at: now,
            },
            shopping_cart::Model {
                id: 2,
                user_id: 1,
                recipe_id: 11,
                added_at: now,
            },
        ];
        let rows = vec![
            recipe_ingredient::Model {
                id: 1,
                recipe_id: 10,
                ingredient_id: 5,
                amount: 10,
            },
            recipe_ingredient::Model {
                id: 2,
                recipe_id: 11,
                ingredient_id: 5,
                amount: 15,
            },
        ];
        let ingredients = vec![ingredient::Model {
            id: 5,
            name: "Salt".to_string(),
            measurement_unit: "g".to_string(),
        }];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([cart])
            .append_query_results([rows])
            .append_query_results([ingredients])
            .into_connection();

        let list = ShoppingListService::build(&db, 1).await.unwrap();
        assert_eq!(
            list,
            ShoppingList::Items(vec![ShoppingListItem {
                name: "Salt".to_string(),
                measurement_unit: "g".to_string(),
                total_amount: 25,
            }])
        );
    }
}
