use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::{AuthUser, MaybeAuth};
use crate::models::dto::{
    page_base, PageQuery, Paginated, RecipeCreateRequest, RecipeSummary,
    RecipeUpdateRequest, ShortLinkResponse,
};
use crate::services::recipe_service::{RecipeFilters, RecipeService};
use crate::services::relation_service::RelationService;
use crate::services::shopping_list_service::ShoppingListService;

#[derive(Debug, Deserialize)]
pub struct RecipeListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub author: Option<i32>,
    pub is_favorited: Option<u8>,
    pub is_in_shopping_cart: Option<u8>,
}

/// Collect repeated `tags=<slug>` parameters; serde's query extractor only
/// sees the last one. Values are percent-decoded, slugs are not limited to
/// ASCII.
fn tag_slugs_from_query(query: &str) -> Vec<String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .unwrap_or_default()
        .into_iter()
        .filter(|(key, value)| key == "tags" && !value.is_empty())
        .map(|(_, value)| value)
        .collect()
}

/// GET /api/recipes/ - paginated, filtered recipe list (PUBLIC)
#[get("")]
pub async fn list_recipes(
    req: HttpRequest,
    query: web::Query<RecipeListQuery>,
    viewer: MaybeAuth,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let viewer_id = viewer.user_id();
    let filters = RecipeFilters {
        author: query.author,
        tag_slugs: tag_slugs_from_query(req.query_string()),
        // Viewer-scoped filters are ignored for anonymous requests.
        favorited_by: (query.is_favorited == Some(1))
            .then_some(viewer_id)
            .flatten(),
        in_cart_of: (query.is_in_shopping_cart == Some(1))
            .then_some(viewer_id)
            .flatten(),
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    let (rows, count) = RecipeService::list(db.get_ref(), &filters, &page).await?;
    let mut results = Vec::with_capacity(rows.len());
    for recipe in rows {
        results.push(RecipeService::detail(db.get_ref(), recipe, viewer_id).await?);
    }

    let base = page_base("/api/recipes/", req.query_string());
    Ok(HttpResponse::Ok().json(Paginated::new(count, &page, &base, results)))
}

/// POST /api/recipes/ - create a recipe (PROTECTED)
#[post("")]
pub async fn create_recipe(
    auth_user: AuthUser,
    body: web::Json<RecipeCreateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let recipe =
        RecipeService::create(db.get_ref(), auth_user.user_id, body.into_inner()).await?;
    let detail = RecipeService::detail(db.get_ref(), recipe, Some(auth_user.user_id)).await?;
    Ok(HttpResponse::Created().json(detail))
}

/// GET /api/recipes/download_shopping_cart - aggregated list (PROTECTED)
#[get("/download_shopping_cart")]
pub async fn download_shopping_cart(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let list = ShoppingListService::build(db.get_ref(), auth_user.user_id).await?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"shopping_list.txt\"",
        ))
        .body(list.render_text()))
}

/// GET /api/recipes/{id} - recipe detail (PUBLIC)
#[get("/{id}")]
pub async fn get_recipe(
    path: web::Path<i32>,
    viewer: MaybeAuth,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let recipe = RecipeService::get(db.get_ref(), path.into_inner()).await?;
    let detail = RecipeService::detail(db.get_ref(), recipe, viewer.user_id()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// PATCH /api/recipes/{id} - partial update by the author (PROTECTED)
#[patch("/{id}")]
pub async fn update_recipe(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<RecipeUpdateRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let recipe = RecipeService::update(
        db.get_ref(),
        path.into_inner(),
        auth_user.user_id,
        body.into_inner(),
    )
    .await?;
    let detail = RecipeService::detail(db.get_ref(), recipe, Some(auth_user.user_id)).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// DELETE /api/recipes/{id} - delete by the author (PROTECTED)
#[delete("/{id}")]
pub async fn delete_recipe(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    RecipeService::delete(db.get_ref(), path.into_inner(), auth_user.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/recipes/{id}/get-link - shareable short URL (PUBLIC)
#[get("/{id}/get-link")]
pub async fn get_link(
    req: HttpRequest,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let recipe = RecipeService::get(db.get_ref(), path.into_inner()).await?;
    let token = recipe
        .short_link
        .ok_or_else(|| ApiError::Internal("Recipe has no short link".to_string()))?;

    let info = req.connection_info();
    let url = format!("{}://{}/s/{}", info.scheme(), info.host(), token);
    Ok(HttpResponse::Ok().json(ShortLinkResponse { short_link: url }))
}

/// POST /api/recipes/{id}/favorite - add to favorites (PROTECTED)
#[post("/{id}/favorite")]
pub async fn add_favorite(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let recipe =
        RelationService::add_favorite(db.get_ref(), auth_user.user_id, path.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(RecipeSummary::from(recipe)))
}

/// DELETE /api/recipes/{id}/favorite - remove from favorites (PROTECTED)
#[delete("/{id}/favorite")]
pub async fn remove_favorite(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    RelationService::remove_favorite(db.get_ref(), auth_user.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/recipes/{id}/shopping_cart - add to the cart (PROTECTED)
#[post("/{id}/shopping_cart")]
pub async fn add_to_cart(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let recipe =
        RelationService::add_to_cart(db.get_ref(), auth_user.user_id, path.into_inner())
            .await?;
    Ok(HttpResponse::Created().json(RecipeSummary::from(recipe)))
}

/// DELETE /api/recipes/{id}/shopping_cart - remove from the cart (PROTECTED)
#[delete("/{id}/shopping_cart")]
pub async fn remove_from_cart(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    RelationService::remove_from_cart(db.get_ref(), auth_user.user_id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn recipe_routes(cfg: &mut web::ServiceConfig) {
    // Static segments before the dynamic /{id} routes.
    cfg.service(
        web::scope("/recipes")
            .service(list_recipes)
            .service(create_recipe)
            .service(download_shopping_cart)
            .service(get_link)
            .service(add_favorite)
            .service(remove_favorite)
            .service(add_to_cart)
            .service(remove_from_cart)
            .service(get_recipe)
            .service(update_recipe)
            .service(delete_recipe),
    );
}
