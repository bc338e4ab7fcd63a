pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod short_link;
pub mod tags;
pub mod users;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth::auth_routes)
            .configure(users::user_routes)
            .configure(tags::tag_routes)
            .configure(ingredients::ingredient_routes)
            .configure(recipes::recipe_routes),
    )
    // Short-link redirects live outside /api
    .service(short_link::redirect_short_link);
}
