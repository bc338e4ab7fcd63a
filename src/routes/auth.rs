use actix_web::{post, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::errors::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{AuthTokenResponse, LoginRequest};
use crate::services::user_service::UserService;
use crate::utils::jwt;

/// POST /api/auth/token/login - exchange credentials for a token (PUBLIC)
#[post("/token/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, ApiError> {
    let user = UserService::authenticate(db.get_ref(), &body.email, &body.password).await?;
    let token = jwt::generate_token(user.id, &user.email).map_err(ApiError::Internal)?;

    Ok(HttpResponse::Ok().json(AuthTokenResponse { auth_token: token }))
}

/// POST /api/auth/token/logout - end the session (PROTECTED)
///
/// Tokens are stateless JWTs; there is no server-side session row to remove,
/// so this only confirms the caller was authenticated.
#[post("/token/logout")]
pub async fn logout(_auth_user: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::NoContent().finish())
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").service(login).service(logout));
}
