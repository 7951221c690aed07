use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher,
};

use crate::error::AppError;

/// Hashes a password with Argon2id on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|err| AppError::Internal(format!("password hashing task failed: {}", err)))?
    .map_err(|err| AppError::Internal(format!("password hashing failed: {}", err)))
}
