use super::models;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, PgPool};

/// Generic CRUD hooks for models with a natural get/list/save/delete
/// shape. `GetQuery` and `ListQuery` are per-model structs describing how
/// to find one or many rows.
#[async_trait]
pub trait DbModel<GetQuery, ListQuery>: Send + Sync {
    /// Get exactly one record; absence is an error.
    async fn get(db: &PgPool, query: &GetQuery) -> Result<Self>
    where
        Self: Sized;
    async fn list(db: &PgPool, query: &ListQuery) -> Result<Vec<Self>>
    where
        Self: Sized;
    /// Persist the record, which must already exist in the database.
    /// Creation happens through standalone functions since the database
    /// assigns identity.
    async fn save(&self, db: &PgPool) -> Result<()>;
    async fn delete(self, db: &PgPool) -> Result<()>;
}

pub struct GetNoteQuery {
    pub id: i32,
}

pub struct ListNoteQuery<'a> {
    pub username: &'a str,
}

#[derive(sqlx::FromRow)]
struct QresNote {
    id: i32,
    title: String,
    content: String,
    username: String,
    created_at: DateTime<Utc>,
}

impl From<QresNote> for models::Note {
    fn from(row: QresNote) -> Self {
        models::Note {
            id: row.id,
            title: row.title,
            content: row.content,
            username: row.username,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl<'a> DbModel<GetNoteQuery, ListNoteQuery<'a>> for models::Note {
    async fn get(db: &PgPool, q: &GetNoteQuery) -> Result<Self> {
        let res = query_as::<_, QresNote>(
            "select id, title, content, username, created_at
            from note
            where id = $1",
        )
        .bind(q.id)
        .fetch_one(db)
        .await?;

        Ok(res.into())
    }
    async fn list(db: &PgPool, q: &ListNoteQuery<'a>) -> Result<Vec<Self>> {
        let res = query_as::<_, QresNote>(
            "select id, title, content, username, created_at
            from note
            where username = $1
            order by created_at desc, id desc",
        )
        .bind(q.username)
        .fetch_all(db)
        .await?;

        Ok(res.into_iter().map(Into::into).collect())
    }
    async fn save(&self, db: &PgPool) -> Result<()> {
        query(
            "update note set
                title = $1,
                content = $2
            where id = $3",
        )
        .bind(&self.title)
        .bind(&self.content)
        .bind(self.id)
        .execute(db)
        .await?;

        Ok(())
    }
    async fn delete(self, db: &PgPool) -> Result<()> {
        query("delete from note where id = $1")
            .bind(self.id)
            .execute(db)
            .await?;

        Ok(())
    }
}

pub async fn create_note(
    db: &PgPool,
    username: &str,
    title: &str,
    content: &str,
) -> Result<models::Note> {
    let res = query_as::<_, QresNote>(
        "insert into note (title, content, username) values ($1, $2, $3)
        returning id, title, content, username, created_at",
    )
    .bind(title)
    .bind(content)
    .bind(username)
    .fetch_one(db)
    .await?;

    Ok(res.into())
}

pub async fn get_user(db: &PgPool, username: &str) -> Result<models::User> {
    #[derive(sqlx::FromRow)]
    struct Qres {
        username: String,
        email: String,
        first_name: String,
        last_name: String,
    }
    let res = query_as::<_, Qres>(
        "select username, email, first_name, last_name
        from users
        where username = $1",
    )
    .bind(username)
    .fetch_one(db)
    .await?;

    Ok(models::User {
        username: res.username,
        email: res.email,
        first_name: res.first_name,
        last_name: res.last_name,
    })
}

pub async fn create_user(
    db: &PgPool,
    user: &models::User,
    digest: &str,
) -> Result<()> {
    query(
        "insert into users (username, digest, email, first_name, last_name)
        values ($1, $2, $3, $4, $5)",
    )
    .bind(&user.username)
    .bind(digest)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .execute(db)
    .await?;

    Ok(())
}

/// The user's notes go with them; `note.username` is `on delete cascade`.
pub async fn delete_user(db: &PgPool, username: &str) -> Result<()> {
    query("delete from users where username = $1")
        .bind(username)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn get_password_digest(
    db: &PgPool,
    username: &str,
) -> Result<String> {
    #[derive(sqlx::FromRow)]
    struct Qres {
        digest: String,
    }
    let res =
        query_as::<_, Qres>("select digest from users where username = $1")
            .bind(username)
            .fetch_one(db)
            .await?;

    Ok(res.digest)
}

/// Registration pre-check, so we can put a friendly message on the form
/// instead of bubbling a unique-constraint violation up as a 500. The
/// constraints still exist in the schema for the race where two requests
/// pass this check at once.
pub async fn identity_taken(
    db: &PgPool,
    username: &str,
    email: &str,
) -> Result<(bool, bool)> {
    #[derive(sqlx::FromRow)]
    struct Qres {
        username_taken: bool,
        email_taken: bool,
    }
    let res = query_as::<_, Qres>(
        "select
            exists(select 1 from users where username = $1) as username_taken,
            exists(select 1 from users where email = $2) as email_taken",
    )
    .bind(username)
    .bind(email)
    .fetch_one(db)
    .await?;

    Ok((res.username_taken, res.email_taken))
}
