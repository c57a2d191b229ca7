use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// Site user. The username doubles as the primary key, which is fine at
/// this scale and keeps the URLs pretty (`/users/jack`). The password
/// digest deliberately lives outside this struct so it never wanders into
/// a session cookie or a rendered page; see `db_ops::get_password_digest`.
#[derive(Clone, Debug)]
pub struct User {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Debug)]
pub struct Note {
    pub id: i32,
    pub title: String,
    pub content: String,
    /// Owner; foreign key onto [User::username].
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
}
