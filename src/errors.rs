use anyhow::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub struct ServerError(Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Lookups of users and notes that don't exist surface here as
        // sqlx's RowNotFound; everything else is a real 500.
        if let Some(sqlx::Error::RowNotFound) =
            self.0.downcast_ref::<sqlx::Error>()
        {
            return (StatusCode::NOT_FOUND, "Not found").into_response();
        }
        println!("{:?}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            .into_response()
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>`
// to turn them into `Result<_, ServerError>`. That way you don't need to do
// that manually.
impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
