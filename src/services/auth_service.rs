use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db::user_queries;
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

/// False for a wrong password and for a stored hash that does not parse
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn hash_off_thread(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}

pub async fn register(pool: &PgPool, req: RegisterRequest) -> Result<RegisterResponse, AppError> {
    let (email, full_name, password) = match (present(req.email), present(req.full_name), req.password) {
        (Some(e), Some(n), Some(p)) if !p.is_empty() => (e, n, p),
        _ => return Err(AppError::Validation("Please provide all fields".to_string())),
    };

    let password_hash = hash_off_thread(password).await?;
    let user = user_queries::create_user(pool, &email, &full_name, &password_hash)
        .await?
        .ok_or_else(|| AppError::Conflict("User already exists".to_string()))?;

    info!("Registered user {}", user.id);
    Ok(RegisterResponse {
        message: "Registered successfully".to_string(),
        user_id: user.id,
    })
}

pub async fn login(pool: &PgPool, req: LoginRequest) -> Result<LoginResponse, AppError> {
    let (email, password) = match (present(req.email), req.password) {
        (Some(e), Some(p)) if !p.is_empty() => (e, p),
        _ => return Err(AppError::Validation("Please provide email and password".to_string())),
    };

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());
    let user = user_queries::find_by_email(pool, &email).await?.ok_or_else(invalid)?;

    let stored = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !matches {
        return Err(invalid());
    }

    Ok(LoginResponse {
        message: "Login successful".to_string(),
        user_id: user.id,
        full_name: user.full_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_register_requires_every_field() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let req = RegisterRequest {
            email: Some("a@b.c".into()),
            full_name: Some("   ".into()),
            password: Some("pw".into()),
        };
        assert!(matches!(register(&pool, req).await, Err(AppError::Validation(_))));
    }
}
