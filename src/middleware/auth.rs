use actix_web::{dev::Payload, Error, FromRequest, HttpRequest, HttpResponse};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::utils::jwt;

/// The authenticated user's identity, extracted from the Authorization
/// header. Using it as a handler argument makes the route require auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

fn identity_from_request(req: &HttpRequest) -> Result<AuthUser, String> {
    // 1. Authorization header, "Bearer <token>"
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or("Missing Authorization header")?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header")?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or("Invalid Authorization format (expected: Bearer <token>)")?;

    // 2. Verify the JWT
    let claims = jwt::verify_token(token)?;

    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
    })
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match identity_from_request(req) {
            Ok(user) => ready(Ok(user)),
            Err(message) => {
                let response = HttpResponse::Unauthorized()
                    .json(serde_json::json!({ "detail": message }));
                ready(Err(
                    actix_web::error::InternalError::from_response("", response).into(),
                ))
            }
        }
    }
}

/// Optional identity for anonymous-allowed reads: viewer-scoped flags like
/// `is_subscribed` and `is_favorited` need the viewer when present, but the
/// request must not fail without one.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthUser>);

impl MaybeAuth {
    pub fn user_id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

impl FromRequest for MaybeAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(MaybeAuth(identity_from_request(req).ok())))
    }
}
