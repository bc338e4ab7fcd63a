use actix_web::{get, web, HttpResponse};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::models::dto::IngredientResponse;
use crate::models::ingredient;

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix search.
    pub name: Option<String>,
}

/// GET /api/ingredients/ - ingredient catalog (PUBLIC, unpaginated)
#[get("")]
pub async fn list_ingredients(
    query: web::Query<IngredientQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let mut select = ingredient::Entity::find().order_by_asc(ingredient::Column::Id);
    if let Some(name) = &query.name {
        let prefix = name.replace('%', "\\%").replace('_', "\\_");
        select = select.filter(
            Expr::col(ingredient::Column::Name).ilike(format!("{}%", prefix)),
        );
    }

    let ingredients: Vec<IngredientResponse> = select
        .all(db.get_ref())
        .await?
        .into_iter()
        .map(IngredientResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(ingredients))
}

/// GET /api/ingredients/{id} - single ingredient (PUBLIC)
#[get("/{id}")]
pub async fn get_ingredient(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let ingredient = ingredient::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Ingredient not found.".to_string()))?;
    Ok(HttpResponse::Ok().json(IngredientResponse::from(ingredient)))
}

pub fn ingredient_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ingredients")
            .service(list_ingredients)
            .service(get_ingredient),
    );
}
