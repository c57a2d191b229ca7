use super::{config, session};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue, StatusCode},
};

/// Extractor for routes behind the login wall. Handlers still need to
/// check that the session's username matches whatever resource the route
/// touches; this only proves that *somebody* is logged in.
pub struct AuthenticatedUser {
    pub username: String,
}

fn redirect_to_login() -> (StatusCode, HeaderMap) {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Location",
        HeaderValue::from_str("/login").expect("that is ascii, I promise"),
    );

    (StatusCode::FOUND, headers)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, HeaderMap);

    async fn from_request_parts(
        req: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let token =
            session::cookie_value(&req.headers, config::SESSION_COOKIE)
                .ok_or_else(redirect_to_login)?;
        let session = session::deserialize_session(&token)
            .map_err(|_| redirect_to_login())?;
        if session.is_expired() {
            return Err(redirect_to_login());
        }

        Ok(AuthenticatedUser {
            username: session.username,
        })
    }
}
