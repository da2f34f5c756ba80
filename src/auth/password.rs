use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;
use validator::ValidationError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Returns why a password is unacceptable, if it is.
pub fn password_problem(plain: &str) -> Option<&'static str> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        Some("must be at least 8 characters")
    } else if plain.chars().all(|c| c.is_ascii_digit()) {
        Some("must not be entirely numeric")
    } else {
        None
    }
}

/// `password_problem` as a field rule for request bodies.
pub fn password_rule(plain: &str) -> Result<(), ValidationError> {
    match password_problem(plain) {
        Some(problem) => Err(ValidationError::new("password").with_message(problem.into())),
        None => Ok(()),
    }
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
