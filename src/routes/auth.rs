//! Authentication routes

use crate::auth::{create_token, AuthUser};
use crate::db::schema::UserRow;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    LoginRequest, LoginResponse, SignupRequest, UpdateProfileRequest, UserResponse,
};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const TOKEN_EXPIRES_IN_SECS: u64 = 24 * 60 * 60;
const MAX_BIO_LEN: usize = 500;

fn validate_signup(req: &SignupRequest) -> ApiResult<()> {
    if req.username.is_empty() || req.name.is_empty() || req.email.is_empty() || req.password.is_empty()
    {
        return Err(ApiError::Validation(
            "username, name, email and password are required".to_string(),
        ));
    }
    let username_chars = req.username.chars().count();
    if !(3..=20).contains(&username_chars) {
        return Err(ApiError::Validation(
            "username must be between 3 and 20 characters".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("email is not valid".to_string()));
    }
    Ok(())
}

/// The duplicate pre-check races with concurrent signups; the UNIQUE
/// constraint is the backstop and still means "taken", not a server fault.
fn map_unique_violation(e: sqlx::Error) -> ApiError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict("username or email is already registered".to_string())
        }
        _ => e.into(),
    }
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    validate_signup(&req)?;

    // Usernames and emails are case-folded at the door
    let username = req.username.to_lowercase();
    let email = req.email.to_lowercase();

    let taken = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE username = ? OR email = ?",
    )
    .bind(&username)
    .bind(&email)
    .fetch_one(&state.db)
    .await?;

    if taken > 0 {
        return Err(ApiError::Conflict(
            "username or email is already registered".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO users (id, username, name, email, password_hash, bio, photo_url, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, '', NULL, ?, ?)",
    )
    .bind(id)
    .bind(&username)
    .bind(&req.name)
    .bind(&email)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(&state.db)
    .await
    .map_err(map_unique_violation)?;

    info!("Registered user {}", username);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id,
            username,
            name: req.name,
            email,
            bio: String::new(),
            photo_url: None,
            created_at: now,
            updated_at: now,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let username = req.username.to_lowercase();

    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
        .bind(&username)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    let valid = bcrypt::verify(&req.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("password verification failed: {e}")))?;
    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    let token = create_token(user.id, &state.config.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;

    Ok(Json(LoginResponse {
        token,
        expires_in: TOKEN_EXPIRES_IN_SECS,
    }))
}

async fn load_user(state: &AppState, user_id: Uuid) -> ApiResult<UserRow> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let row = load_user(&state, user.user_id).await?;
    Ok(Json(row.into()))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    if let Some(bio) = &req.bio {
        if bio.len() > MAX_BIO_LEN {
            return Err(ApiError::Validation(format!(
                "bio must be at most {MAX_BIO_LEN} characters"
            )));
        }
    }
    if let Some(name) = &req.name {
        if name.is_empty() {
            return Err(ApiError::Validation("name must not be empty".to_string()));
        }
    }

    let current = load_user(&state, user.user_id).await?;
    let name = req.name.unwrap_or(current.name);
    let bio = req.bio.unwrap_or(current.bio);
    let photo_url = req.photo_url.or(current.photo_url);
    let now = Utc::now();

    sqlx::query("UPDATE users SET name = ?, bio = ?, photo_url = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&bio)
        .bind(&photo_url)
        .bind(now)
        .bind(user.user_id)
        .execute(&state.db)
        .await?;

    Ok(Json(UserResponse {
        id: current.id,
        username: current.username,
        name,
        email: current.email,
        bio,
        photo_url,
        created_at: current.created_at,
        updated_at: now,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    fn signup_request(username: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password: "hunter22!".to_string(),
        }
    }

    #[test]
    fn username_length_counts_chars_not_bytes() {
        // 3 characters, 9 bytes
        assert!(validate_signup(&signup_request("äöü")).is_ok());
        // 7 characters, 28 bytes
        assert!(validate_signup(&signup_request("🦀🦀🦀🦀🦀🦀🦀")).is_ok());
        assert!(validate_signup(&signup_request("ab")).is_err());
        assert!(validate_signup(&signup_request(&"x".repeat(21))).is_err());
    }

    #[tokio::test]
    async fn unique_violation_maps_to_conflict() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::migrate(&pool).await.unwrap();

        let insert = |username: &'static str| {
            sqlx::query(
                "INSERT INTO users (id, username, name, email, password_hash, bio, photo_url, created_at, updated_at)
                 VALUES (?, ?, 'Test', ?, 'hash', '', NULL, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(username)
            .bind(format!("{username}@example.com"))
            .bind(Utc::now())
            .bind(Utc::now())
            .execute(&pool)
        };

        insert("alice").await.unwrap();
        let err = insert("alice").await.unwrap_err();
        assert!(matches!(
            map_unique_violation(err),
            ApiError::Conflict(_)
        ));

        let other = sqlx::Error::RowNotFound;
        assert!(!matches!(map_unique_violation(other), ApiError::Conflict(_)));
    }
}
