use actix_web::{get, web, HttpResponse};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::errors::ApiError;
use crate::models::dto::TagResponse;
use crate::models::tag;

/// GET /api/tags/ - full tag list (PUBLIC, unpaginated)
#[get("")]
pub async fn list_tags(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ApiError> {
    let tags: Vec<TagResponse> = tag::Entity::find()
        .order_by_asc(tag::Column::Id)
        .all(db.get_ref())
        .await?
        .into_iter()
        .map(TagResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(tags))
}

/// GET /api/tags/{id} - single tag (PUBLIC)
#[get("/{id}")]
pub async fn get_tag(
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let tag = tag::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found.".to_string()))?;
    Ok(HttpResponse::Ok().json(TagResponse::from(tag)))
}

pub fn tag_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/tags").service(list_tags).service(get_tag));
}
