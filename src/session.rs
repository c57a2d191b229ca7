use super::{config, crypto};
use axum::http::{HeaderMap, HeaderValue};
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// HMAC-secured session string, signed by $SESSION_SECRET
///
/// Note: since this guy is stored in a browser cookie, it's important to
/// ensure it does not get too large. We only hold the username of whoever
/// is logged in, plus the moment they logged in so stale sessions can be
/// aged out.
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub created_at: u64,
}

impl Session {
    pub fn new(username: &str) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("now is after the epoch")
            .as_secs();
        Self {
            username: username.to_string(),
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("now is after the epoch")
            .as_secs();
        now.saturating_sub(self.created_at) > config::SESSION_TTL_SECONDS
    }
}

pub fn serialize_session(session: &Session) -> String {
    let json_bytes = serde_json::to_string(&session)
        .expect("session can be JSON serialized");
    let b64 = general_purpose::STANDARD_NO_PAD.encode(json_bytes);
    let raw_digest = crypto::get_digest(&b64.clone().into_bytes());
    let digest = general_purpose::STANDARD_NO_PAD.encode(raw_digest);

    format!("{}:{}", b64, digest)
}

pub fn deserialize_session(cookie: &str) -> Result<Session, &'static str> {
    let parts: Vec<&str> = cookie.split(':').collect();
    if parts.len() != 2 {
        Err("Invalid session")
    } else {
        let b64_json: Vec<u8> = parts[0].into();
        let digest: Vec<u8> =
            match general_purpose::STANDARD_NO_PAD.decode(parts[1]) {
                Ok(v) => v,
                Err(_) => {
                    return Err("Cannot base64 decode the digest");
                }
            };

        if crypto::is_valid(&b64_json, &digest) {
            let json_string =
                match general_purpose::STANDARD_NO_PAD.decode(b64_json) {
                    Ok(v) => v,
                    Err(_) => {
                        return Err("Cannot base64 decode session string");
                    }
                };

            match serde_json::from_slice(&json_string) {
                Ok(v) => Ok(v),
                Err(_) => Err("Cannot deserialize session JSON"),
            }
        } else {
            Err("Failed to validate session signature")
        }
    }
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("Cookie")?.to_str().ok()?;
    let re = Regex::new(&format!(r"{name}=([^;]+)"))
        .expect("cookie pattern compiles");
    let captures = re.captures(cookie)?;

    Some(captures[1].to_string())
}

pub fn session_cookie(session: &Session) -> HeaderValue {
    let token = serialize_session(session);
    HeaderValue::from_str(&format!(
        "{}={token}; Path=/; HttpOnly; SameSite=Lax",
        config::SESSION_COOKIE
    ))
    .expect("that is ascii, I promise")
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; Max-Age=0",
        config::SESSION_COOKIE
    ))
    .expect("that is ascii, I promise")
}

pub fn csrf_nonce_cookie(nonce: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}={nonce}; Path=/; HttpOnly; SameSite=Lax",
        config::CSRF_NONCE_COOKIE
    ))
    .expect("that is ascii, I promise")
}

/// One-shot flash message, carried across a redirect in its own cookie. The
/// message is base64-encoded so it survives the cookie-value character
/// rules; [take_flash] is the other half.
pub fn flash_cookie(message: &str) -> HeaderValue {
    let b64 = general_purpose::STANDARD_NO_PAD.encode(message);
    HeaderValue::from_str(&format!(
        "{}={b64}; Path=/; HttpOnly; SameSite=Lax",
        config::FLASH_COOKIE
    ))
    .expect("that is ascii, I promise")
}

pub fn clear_flash_cookie() -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}=; Path=/; HttpOnly; Max-Age=0",
        config::FLASH_COOKIE
    ))
    .expect("that is ascii, I promise")
}

/// Read the flash message from the request, if one is present. Callers who
/// render it should also send [clear_flash_cookie] so it only shows once.
pub fn take_flash(headers: &HeaderMap) -> Option<String> {
    let raw = cookie_value(headers, config::FLASH_COOKIE)?;
    let bytes = general_purpose::STANDARD_NO_PAD.decode(raw).ok()?;

    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn get_session() -> Session {
        Session {
            username: "Jack".to_string(),
            created_at: 1_690_000_000,
        }
    }

    #[test]
    fn test_session_round_trips() {
        env::set_var("SESSION_SECRET", "foo");

        let token = serialize_session(&get_session());
        let result = deserialize_session(&token).expect("result");
        assert_eq!(result.username, "Jack");
        assert_eq!(result.created_at, 1_690_000_000);
    }

    #[test]
    fn test_tampered_session_is_rejected() {
        env::set_var("SESSION_SECRET", "foo");

        let token = serialize_session(&get_session());
        // flip a character in the payload, keeping the digest
        let mut tampered: Vec<char> = token.chars().collect();
        tampered[0] = if tampered[0] == 'A' { 'B' } else { 'A' };
        let tampered: String = tampered.into_iter().collect();

        assert!(deserialize_session(&tampered).is_err());
    }

    #[test]
    fn test_malformed_session_is_rejected() {
        env::set_var("SESSION_SECRET", "foo");

        assert!(deserialize_session("no delimiter here").is_err());
        assert!(deserialize_session("a:b:c").is_err());
        assert!(deserialize_session("").is_err());
    }

    #[test]
    fn test_old_session_is_expired() {
        let session = get_session();
        // created_at is from July 2023; that ship has sailed
        assert!(session.is_expired());
        assert!(!Session::new("Jack").is_expired());
    }

    #[test]
    fn test_flash_round_trips() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Cookie",
            HeaderValue::from_str(&format!(
                "other=1; {}",
                flash_cookie("You must be logged in to view!")
                    .to_str()
                    .unwrap()
            ))
            .unwrap(),
        );
        assert_eq!(
            take_flash(&headers).expect("flash is present"),
            "You must be logged in to view!"
        );
    }

    #[test]
    fn test_no_flash_is_none() {
        let headers = HeaderMap::new();
        assert!(take_flash(&headers).is_none());
    }
}
