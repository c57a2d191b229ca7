use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::env;

type HmacSha256 = Hmac<Sha256>;

fn get_session_secret() -> Vec<u8> {
    env::var("SESSION_SECRET")
        .expect("session secret to be defined in the environment")
        .into()
}

pub fn get_digest(val: &[u8]) -> Vec<u8> {
    let secret = get_session_secret();
    let mut mac =
        HmacSha256::new_from_slice(&secret).expect("can init with secret key");
    mac.update(val);

    mac.finalize().into_bytes().to_vec()
}

pub fn is_valid(val: &[u8], digest: &[u8]) -> bool {
    let secret = get_session_secret();
    let mut mac =
        HmacSha256::new_from_slice(&secret).expect("can init with secret key");
    mac.update(val);

    mac.verify_slice(digest).is_ok()
}

/// CSRF token for forms rendered to a logged-in user. The token is just a
/// MAC over the username, so it can be recomputed server-side on submission
/// without any per-form storage. Forging one requires $SESSION_SECRET.
pub fn csrf_token(username: &str) -> String {
    let digest = get_digest(format!("csrf:{username}").as_bytes());
    general_purpose::STANDARD_NO_PAD.encode(digest)
}

pub fn csrf_token_is_valid(username: &str, token: &str) -> bool {
    let digest = match general_purpose::STANDARD_NO_PAD.decode(token) {
        Ok(d) => d,
        Err(_) => return false,
    };
    is_valid(format!("csrf:{username}").as_bytes(), &digest)
}

/// Random nonce backing the CSRF token on the register and login forms,
/// where there is no session username to MAC yet. The nonce rides in its
/// own cookie; the token in the form is a MAC over it.
pub fn csrf_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    general_purpose::STANDARD_NO_PAD.encode(bytes)
}

pub fn anon_csrf_token(nonce: &str) -> String {
    let digest = get_digest(format!("anon-csrf:{nonce}").as_bytes());
    general_purpose::STANDARD_NO_PAD.encode(digest)
}

pub fn anon_csrf_token_is_valid(nonce: &str, token: &str) -> bool {
    let digest = match general_purpose::STANDARD_NO_PAD.decode(token) {
        Ok(d) => d,
        Err(_) => return false,
    };
    is_valid(format!("anon-csrf:{nonce}").as_bytes(), &digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csrf_token_round_trips() {
        env::set_var("SESSION_SECRET", "foo");
        let token = csrf_token("jack");
        assert!(csrf_token_is_valid("jack", &token));
    }

    #[test]
    fn test_csrf_token_is_bound_to_the_user() {
        env::set_var("SESSION_SECRET", "foo");
        let token = csrf_token("jack");
        assert!(!csrf_token_is_valid("jill", &token));
    }

    #[test]
    fn test_garbage_csrf_token_is_rejected() {
        env::set_var("SESSION_SECRET", "foo");
        assert!(!csrf_token_is_valid("jack", "!!not even base64!!"));
        assert!(!csrf_token_is_valid("jack", ""));
    }

    #[test]
    fn test_anon_csrf_token_round_trips() {
        env::set_var("SESSION_SECRET", "foo");
        let nonce = csrf_nonce();
        let token = anon_csrf_token(&nonce);
        assert!(anon_csrf_token_is_valid(&nonce, &token));
    }

    #[test]
    fn test_anon_csrf_token_is_bound_to_the_nonce() {
        env::set_var("SESSION_SECRET", "foo");
        let token = anon_csrf_token(&csrf_nonce());
        assert!(!anon_csrf_token_is_valid(&csrf_nonce(), &token));
        assert!(!anon_csrf_token_is_valid("", &token));
    }

    #[test]
    fn test_nonces_are_unique() {
        assert_ne!(csrf_nonce(), csrf_nonce());
    }
}
