//! Argon2id password hashing. Digests are PHC-format strings (salt
//! included), so the `users` table only needs one column for them.

use anyhow::{anyhow, bail, Result};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Argon2,
};

pub fn hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("cannot hash password: {e}"))?;

    Ok(digest.to_string())
}

pub fn check(password: &str, digest: &str) -> Result<()> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| anyhow!("stored digest is malformed: {e}"))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        bail!("wrong password");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_password_checks_out() {
        let digest = hash("hunter2").expect("can hash");
        assert!(check("hunter2", &digest).is_ok());
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let digest = hash("hunter2").expect("can hash");
        assert!(check("hunter3", &digest).is_err());
    }

    #[test]
    fn test_digests_are_salted() {
        let a = hash("hunter2").expect("can hash");
        let b = hash("hunter2").expect("can hash");
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_digest_is_an_error() {
        assert!(check("hunter2", "not a phc string").is_err());
    }
}
