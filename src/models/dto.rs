// Request and response shapes for the API layer.
//
// Requests carry `validator` derives so handlers can reject malformed input
// up front; responses are explicit per-shape projections (summary vs detail)
// built deliberately from entity models, never by field introspection.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ingredient, recipe, tag, users};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetAvatarRequest {
    /// Base64-encoded image, optionally a `data:image/...;base64,` URI.
    pub avatar: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct IngredientAmountRequest {
    pub id: i32,
    #[validate(range(min = 1))]
    pub amount: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecipeCreateRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(min = 1))]
    pub text: String,
    #[validate(range(min = 1))]
    pub cooking_time: i32,
    pub tags: Vec<i32>,
    #[validate(length(min = 1), nested)]
    pub ingredients: Vec<IngredientAmountRequest>,
    pub image: Option<String>,
}

/// Partial update; omitted fields keep their current value. When `tags` or
/// `ingredients` is present the existing associations are fully replaced.
#[derive(Debug, Deserialize, Validate)]
pub struct RecipeUpdateRequest {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub text: Option<String>,
    #[validate(range(min = 1))]
    pub cooking_time: Option<i32>,
    pub tags: Option<Vec<i32>>,
    #[validate(length(min = 1), nested)]
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AuthTokenResponse {
    pub auth_token: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserResponse {
    pub fn from_model(user: users::Model, is_subscribed: bool) -> Self {
        UserResponse {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
            avatar: user.avatar,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(t: tag::Model) -> Self {
        TagResponse {
            id: t.id,
            name: t.name,
            slug: t.slug,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredient::Model> for IngredientResponse {
    fn from(i: ingredient::Model) -> Self {
        IngredientResponse {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
        }
    }
}

/// One ingredient line inside a recipe detail: the ingredient's identity
/// plus the amount this recipe uses.
#[derive(Debug, Serialize)]
pub struct RecipeIngredientView {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe representation with nested author, tags and ingredients.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i32,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact recipe representation used in favorites, carts and subscriptions.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<recipe::Model> for RecipeSummary {
    fn from(r: recipe::Model) -> Self {
        RecipeSummary {
            id: r.id,
            name: r.name,
            image: r.image,
            cooking_time: r.cooking_time,
        }
    }
}

/// A followed author with their recipes and recipe count.
#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: u64,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE_LIMIT: u64 = 6;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.limit()
    }
}

/// Base URL for page links: the path plus every query parameter except
/// `page` and `limit`, which the envelope rewrites per link. Parameters are
/// carried as received, still percent-encoded.
pub fn page_base(path: &str, query: &str) -> String {
    let carried: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            !pair.is_empty() && !pair.starts_with("page=") && !pair.starts_with("limit=")
        })
        .collect();
    if carried.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, carried.join("&"))
    }
}

/// Standard page envelope: total count plus links to the adjacent pages.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(count: u64, page: &PageQuery, base: &str, results: Vec<T>) -> Self {
        let (page_no, limit) = (page.page(), page.limit());
        let last_page = count.div_ceil(limit).max(1);
        let sep = if base.contains('?') { '&' } else { '?' };

        let next = (page_no < last_page)
            .then(|| format!("{}{}page={}&limit={}", base, sep, page_no + 1, limit));
        let previous = (page_no > 1)
            .then(|| format!("{}{}page={}&limit={}", base, sep, page_no - 1, limit));

        Paginated {
            count,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_requires_long_password() {
        let req = SignupRequest {
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: "short".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_signup_rejects_bad_email() {
        let req = SignupRequest {
            email: "not-an-email".to_string(),
            username: "cook".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: "long-enough-password".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_recipe_rejects_cooking_time_below_one() {
        let req = RecipeCreateRequest {
            name: "Borscht".to_string(),
            text: "Cook it".to_string(),
            cooking_time: 0,
            tags: vec![1],
            ingredients: vec![IngredientAmountRequest { id: 1, amount: 10 }],
            image: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_recipe_rejects_zero_amount_and_empty_ingredients() {
        let zero_amount = RecipeCreateRequest {
            name: "Borscht".to_string(),
            text: "Cook it".to_string(),
            cooking_time: 30,
            tags: vec![],
            ingredients: vec![IngredientAmountRequest { id: 1, amount: 0 }],
            image: None,
        };
        assert!(zero_amount.validate().is_err());

        let no_ingredients = RecipeCreateRequest {
            name: "Borscht".to_string(),
            text: "Cook it".to_string(),
            cooking_time: 30,
            tags: vec![],
            ingredients: vec![],
            image: None,
        };
        assert!(no_ingredients.validate().is_err());
    }

    #[test]
    fn test_update_validates_present_fields_only() {
        let req = RecipeUpdateRequest {
            name: None,
            text: None,
            cooking_time: Some(0),
            tags: None,
            ingredients: None,
            image: None,
        };
        assert!(req.validate().is_err());

        let ok = RecipeUpdateRequest {
            name: None,
            text: None,
            cooking_time: None,
            tags: None,
            ingredients: None,
            image: None,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_pagination_links() {
        let page = PageQuery {
            page: Some(2),
            limit: Some(5),
        };
        let env = Paginated::new(12, &page, "/api/recipes/", vec![1, 2, 3, 4, 5]);
        assert_eq!(env.count, 12);
        assert_eq!(
            env.next.as_deref(),
            Some("/api/recipes/?page=3&limit=5")
        );
        assert_eq!(
            env.previous.as_deref(),
            Some("/api/recipes/?page=1&limit=5")
        );

        let last = PageQuery {
            page: Some(3),
            limit: Some(5),
        };
        let env = Paginated::new(12, &last, "/api/recipes/", vec![11, 12]);
        assert!(env.next.is_none());
    }

    #[test]
    fn test_page_base_strips_page_and_limit_only() {
        assert_eq!(
            page_base("/api/recipes/", "tags=breakfast&page=2&author=3&limit=5"),
            "/api/recipes/?tags=breakfast&author=3"
        );
        assert_eq!(page_base("/api/recipes/", "page=2&limit=5"), "/api/recipes/");
        assert_eq!(page_base("/api/recipes/", ""), "/api/recipes/");
    }

    #[test]
    fn test_pagination_links_keep_filters() {
        let base = page_base(
            "/api/recipes/",
            "tags=breakfast&tags=dinner&is_favorited=1&page=2&limit=5",
        );
        let page = PageQuery {
            page: Some(2),
            limit: Some(5),
        };
        let env = Paginated::new(12, &page, &base, vec![0; 5]);
        assert_eq!(
            env.next.as_deref(),
            Some("/api/recipes/?tags=breakfast&tags=dinner&is_favorited=1&page=3&limit=5")
        );
        assert_eq!(
            env.previous.as_deref(),
            Some("/api/recipes/?tags=breakfast&tags=dinner&is_favorited=1&page=1&limit=5")
        );
    }
}
