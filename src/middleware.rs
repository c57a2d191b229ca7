use super::errors::ServerError;
use axum::{
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Everything we serve is a server-rendered page, so default the
/// content-type accordingly (handlers issuing redirects don't care).
pub async fn html_headers<B>(
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, ServerError> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "content-type",
        HeaderValue::from_str("text/html; charset=utf-8")?,
    );

    Ok(response)
}
