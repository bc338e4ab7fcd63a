use actix_web::{get, http::header, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::ApiError;
use crate::services::recipe_service::RecipeService;

/// GET /s/{token} - redirect a short link to the recipe page (PUBLIC)
#[get("/s/{token}")]
pub async fn redirect_short_link(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let recipe = RecipeService::resolve_short_link(db.get_ref(), &path).await?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, format!("/recipes/{}/", recipe.id)))
        .finish())
}
