use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::{self, AuditEntry},
    config::AppConfig,
    dto::auth::{Claims, Credentials, LoginResponse, NewUser},
    entity::users::{self, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_USER},
    models::User,
    response::ApiResponse,
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn issue_token(config: &AppConfig, user_id: Uuid, role: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register_user(state: &AppState, payload: NewUser) -> AppResult<ApiResponse<User>> {
    let NewUser {
        name,
        email,
        password,
    } = payload;
    let exist = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let user: User = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(ROLE_USER.to_string()),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&state.orm)
    .await?
    .into();

    audit::record(
        &state.pool,
        AuditEntry::new(user.id, "user_register", "users")
            .with_metadata(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success("User registered successfully", user, None))
}

pub async fn login_user(
    state: &AppState,
    payload: Credentials,
) -> AppResult<ApiResponse<LoginResponse>> {
    let Credentials { email, password } = payload;
    let user: User = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid_credentials)?
        .into();

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid_credentials());
    }

    let token = issue_token(&state.config, user.id, &user.role)?;

    audit::record(
        &state.pool,
        AuditEntry::new(user.id, "user_login", "users")
            .with_metadata(serde_json::json!({ "user_id": user.id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in successfully",
        LoginResponse { token },
        None,
    ))
}

pub async fn get_profile(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<User>> {
    let user: User = Users::find_by_id(auth.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
        .into();

    Ok(ApiResponse::success("User profile fetched successfully", user, None))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CartSettings;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    fn config() -> AppConfig {
        AppConfig {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: "test-secret".into(),
            jwt_ttl_hours: 1,
            cart: CartSettings::default(),
        }
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let config = config();
        let user_id = Uuid::new_v4();
        let token = issue_token(&config, user_id, "admin").unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, user_id.to_string());
        assert_eq!(decoded.claims.role, "admin");
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("crab42").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"crab42", &parsed)
                .is_ok()
        );
    }
}
