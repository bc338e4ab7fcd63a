use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use serde::Deserialize;
use validator::Validate;

use crate::errors::ApiError;
use crate::middleware::{AuthUser, MaybeAuth};
use crate::models::dto::{
    page_base, AvatarResponse, PageQuery, Paginated, RecipeSummary,
    SetAvatarRequest, SetPasswordRequest, SignupRequest, SubscriptionView,
    UserResponse,
};
use crate::models::{recipe, users};
use crate::services::relation_service::RelationService;
use crate::services::user_service::UserService;

#[derive(Debug, Deserialize)]
pub struct SubscriptionsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub recipes_limit: Option<u64>,
}

/// POST /api/users/ - create an account (PUBLIC)
#[post("")]
pub async fn signup(
    body: web::Json<SignupRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = UserService::signup(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserResponse::from_model(user, false)))
}

/// GET /api/users/ - paginated user list (PUBLIC)
#[get("")]
pub async fn list_users(
    req: HttpRequest,
    query: web::Query<PageQuery>,
    viewer: MaybeAuth,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let count = users::Entity::find().count(db.get_ref()).await?;
    let rows = users::Entity::find()
        .order_by_asc(users::Column::Email)
        .offset(query.offset())
        .limit(query.limit())
        .all(db.get_ref())
        .await?;

    let mut results = Vec::with_capacity(rows.len());
    for user in rows {
        results.push(UserService::profile(db.get_ref(), user, viewer.user_id()).await?);
    }

    let base = page_base("/api/users/", req.query_string());
    Ok(HttpResponse::Ok().json(Paginated::new(count, &query, &base, results)))
}

/// GET /api/users/me - current user's profile (PROTECTED)
#[get("/me")]
pub async fn me(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::get(db.get_ref(), auth_user.user_id).await?;
    // is_subscribed is about the viewer following this profile; for one's
    // own profile it is always false.
    Ok(HttpResponse::Ok().json(UserResponse::from_model(user, false)))
}

/// PUT /api/users/me/avatar - upload a new avatar (PROTECTED)
#[put("/me/avatar")]
pub async fn set_avatar(
    auth_user: AuthUser,
    body: web::Json<SetAvatarRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let path = UserService::set_avatar(db.get_ref(), auth_user.user_id, &body.avatar).await?;
    Ok(HttpResponse::Ok().json(AvatarResponse { avatar: path }))
}

/// DELETE /api/users/me/avatar - remove the avatar (PROTECTED)
#[delete("/me/avatar")]
pub async fn delete_avatar(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    UserService::delete_avatar(db.get_ref(), auth_user.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/users/set_password - change own password (PROTECTED)
#[post("/set_password")]
pub async fn set_password(
    auth_user: AuthUser,
    body: web::Json<SetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    UserService::set_password(
        db.get_ref(),
        auth_user.user_id,
        &body.current_password,
        &body.new_password,
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/users/subscriptions - followed authors (PROTECTED)
#[get("/subscriptions")]
pub async fn subscriptions(
    req: HttpRequest,
    auth_user: AuthUser,
    query: web::Query<SubscriptionsQuery>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let authors = RelationService::subscriptions(db.get_ref(), auth_user.user_id).await?;

    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let count = authors.len() as u64;
    let page_slice = authors
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize);

    let mut results = Vec::new();
    for (author, recipes_count) in page_slice {
        results.push(
            subscription_view(db.get_ref(), author, recipes_count, query.recipes_limit)
                .await?,
        );
    }

    // Carries recipes_limit into the page links
    let base = page_base("/api/users/subscriptions/", req.query_string());
    Ok(HttpResponse::Ok().json(Paginated::new(count, &page, &base, results)))
}

/// POST /api/users/{id}/subscribe - follow an author (PROTECTED)
#[post("/{id}/subscribe")]
pub async fn subscribe(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let author_id = path.into_inner();
    let author = RelationService::subscribe(db.get_ref(), auth_user.user_id, author_id).await?;

    let recipes_count = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .count(db.get_ref())
        .await?;
    let view = subscription_view(db.get_ref(), author, recipes_count, None).await?;
    Ok(HttpResponse::Created().json(view))
}

/// DELETE /api/users/{id}/subscribe - unfollow an author (PROTECTED)
#[delete("/{id}/subscribe")]
pub async fn unsubscribe(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    RelationService::unsubscribe(db.get_ref(), auth_user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/users/{id} - public profile (PUBLIC)
#[get("/{id}")]
pub async fn profile(
    path: web::Path<i32>,
    viewer: MaybeAuth,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::get(db.get_ref(), path.into_inner()).await?;
    let response = UserService::profile(db.get_ref(), user, viewer.user_id()).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn subscription_view(
    db: &DatabaseConnection,
    author: users::Model,
    recipes_count: u64,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionView, ApiError> {
    let mut select = recipe::Entity::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .order_by_desc(recipe::Column::PubDate);
    if let Some(limit) = recipes_limit {
        select = select.limit(limit);
    }
    let recipes: Vec<RecipeSummary> = select
        .all(db)
        .await?
        .into_iter()
        .map(RecipeSummary::from)
        .collect();

    Ok(SubscriptionView {
        id: author.id,
        email: author.email,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: true,
        recipes,
        recipes_count,
        avatar: author.avatar,
    })
}

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    // Static segments before the dynamic /{id} routes.
    cfg.service(
        web::scope("/users")
            .service(signup)
            .service(list_users)
            .service(me)
            .service(set_avatar)
            .service(delete_avatar)
            .service(set_password)
            .service(subscriptions)
            .service(subscribe)
            .service(unsubscribe)
            .service(profile),
    );
}
