use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch, `Err` only when the stored hash cannot be parsed.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        tracing::error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("adobo-rice").expect("hash");
        let b = hash_password("adobo-rice").expect("hash");
        assert_ne!(a, b);
        assert!(verify_password("adobo-rice", &a).expect("verify"));
        assert!(verify_password("adobo-rice", &b).expect("verify"));
    }

    #[test]
    fn rejects_wrong_password() {
        let hash = hash_password("sinigang").expect("hash");
        assert!(!verify_password("sisig", &hash).expect("verify"));
    }

    #[test]
    fn errors_on_malformed_hash() {
        assert!(verify_password("anything", "plaintext-in-db").is_err());
    }
}
