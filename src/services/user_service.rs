use sea_orm::*;

use crate::errors::ApiError;
use crate::models::dto::{SignupRequest, UserResponse};
use crate::models::users;
use crate::services::relation_service::RelationService;
use crate::utils::{image, password};

// "me" is routed to the current user's profile, so no account may claim it.
const RESERVED_USERNAMES: &[&str] = &["me"];

pub struct UserService;

impl UserService {
    /// Create an account. Email and username are globally unique; duplicates
    /// are reported as Conflict, with the store's unique constraints catching
    /// any concurrent race the pre-checks miss.
    pub async fn signup(
        db: &DatabaseConnection,
        req: SignupRequest,
    ) -> Result<users::Model, ApiError> {
        if RESERVED_USERNAMES.contains(&req.username.as_str()) {
            return Err(ApiError::Validation(format!(
                "Username '{}' is reserved.",
                req.username
            )));
        }

        let email_taken = users::Entity::find()
            .filter(users::Column::Email.eq(req.email.as_str()))
            .one(db)
            .await?;
        if email_taken.is_some() {
            return Err(ApiError::Conflict(
                "A user with this email already exists.".to_string(),
            ));
        }

        let username_taken = users::Entity::find()
            .filter(users::Column::Username.eq(req.username.as_str()))
            .one(db)
            .await?;
        if username_taken.is_some() {
            return Err(ApiError::Conflict(
                "A user with this username already exists.".to_string(),
            ));
        }

        let password_hash =
            password::hash_password(&req.password).map_err(ApiError::Internal)?;

        let new_user = users::ActiveModel {
            email: Set(req.email),
            username: Set(req.username),
            first_name: Set(req.first_name),
            last_name: Set(req.last_name),
            password_hash: Set(password_hash),
            avatar: Set(None),
            ..Default::default()
        };
        new_user.insert(db).await.map_err(|e| {
            ApiError::conflict_on_unique(
                e,
                "A user with this email or username already exists.",
            )
        })
    }

    /// Check credentials and return the account. The same error covers an
    /// unknown email and a wrong password.
    pub async fn authenticate(
        db: &DatabaseConnection,
        email: &str,
        pass: &str,
    ) -> Result<users::Model, ApiError> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?
            .ok_or_else(|| {
                ApiError::Authentication("Invalid email or password.".to_string())
            })?;

        let valid = password::verify_password(pass, &user.password_hash)
            .map_err(ApiError::Internal)?;
        if !valid {
            return Err(ApiError::Authentication(
                "Invalid email or password.".to_string(),
            ));
        }
        Ok(user)
    }

    pub async fn set_password(
        db: &DatabaseConnection,
        user_id: i32,
        current: &str,
        new: &str,
    ) -> Result<(), ApiError> {
        let user = Self::get(db, user_id).await?;

        let valid = password::verify_password(current, &user.password_hash)
            .map_err(ApiError::Internal)?;
        if !valid {
            return Err(ApiError::Authentication(
                "Current password is incorrect.".to_string(),
            ));
        }

        let new_hash = password::hash_password(new).map_err(ApiError::Internal)?;
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.update(db).await?;
        Ok(())
    }

    /// Decode and store a new avatar, replacing any previous file.
    pub async fn set_avatar(
        db: &DatabaseConnection,
        user_id: i32,
        data: &str,
    ) -> Result<String, ApiError> {
        let user = Self::get(db, user_id).await?;

        let path = image::save_base64_image(data, "avatars")?;
        if let Some(old) = &user.avatar {
            image::delete_image(old);
        }

        let mut active: users::ActiveModel = user.into();
        active.avatar = Set(Some(path.clone()));
        active.update(db).await?;
        Ok(path)
    }

    pub async fn delete_avatar(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<(), ApiError> {
        let user = Self::get(db, user_id).await?;
        let Some(old) = user.avatar.clone() else {
            return Err(ApiError::NotFound("No avatar is set.".to_string()));
        };

        image::delete_image(&old);
        let mut active: users::ActiveModel = user.into();
        active.avatar = Set(None);
        active.update(db).await?;
        Ok(())
    }

    pub async fn get(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> Result<users::Model, ApiError> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))
    }

    /// Profile projection with the viewer-scoped `is_subscribed` flag.
    pub async fn profile(
        db: &DatabaseConnection,
        user: users::Model,
        viewer: Option<i32>,
    ) -> Result<UserResponse, ApiError> {
        let is_subscribed = RelationService::is_subscribed(db, viewer, user.id).await?;
        Ok(UserResponse::from_model(user, is_subscribed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dto::SignupRequest;

    fn signup_request(username: &str) -> SignupRequest {
        SignupRequest {
            email: "cook@example.com".to_string(),
            username: username.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: "long-enough-password".to_string(),
        }
    }

    fn sample_user(hash: String) -> users::Model {
        users::Model {
            id: 1,
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: hash,
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_signup_rejects_reserved_username() {
        // Rejected before any query runs.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let err = UserService::signup(&db, signup_request("me"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_signup_duplicate_email_conflicts() {
        let existing = sample_user("pbkdf2_sha256$1$x$x".to_string());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![existing]])
            .into_connection();

        let err = UserService::signup(&db, signup_request("newcook"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let hash = password::hash_password("the-real-password").unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_user(hash)]])
            .into_connection();

        let err = UserService::authenticate(&db, "cook@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let err = UserService::authenticate(&db, "nobody@example.com", "whatever")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_delete_avatar_when_none_set() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sample_user("h".to_string())]])
            .into_connection();

        let err = UserService::delete_avatar(&db, 1).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
