use super::{db_ops, models, pw, session};
use anyhow::Result;
use sqlx::postgres::PgPool;

pub async fn authenticate(
    db: &PgPool,
    username: &str,
    password: &str,
) -> Result<session::Session> {
    let truth = db_ops::get_password_digest(db, username).await?;
    pw::check(password, &truth)?;

    Ok(session::Session::new(username))
}

/// True when an [authenticate] failure should read as "Incorrect
/// username/password": the user doesn't exist (RowNotFound from the
/// digest lookup) or the password didn't match. Any other database error
/// is the server's problem and should propagate as a 500.
pub fn is_credential_error(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::RowNotFound) => true,
        Some(_) => false,
        None => true,
    }
}

/// Insert the new user with their password hashed, and log them in. The
/// caller is responsible for having checked that the username and email
/// are free; if the check raced, the unique constraints will make this
/// return an error.
pub async fn register(
    db: &PgPool,
    user: &models::User,
    password: &str,
) -> Result<session::Session> {
    let digest = pw::hash(password)?;
    db_ops::create_user(db, user, &digest).await?;

    Ok(session::Session::new(&user.username))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_user_is_a_credential_error() {
        let err = anyhow::Error::from(sqlx::Error::RowNotFound);
        assert!(is_credential_error(&err));
    }

    #[test]
    fn test_wrong_password_is_a_credential_error() {
        let err = pw::check("hunter2", &pw::hash("hunter3").unwrap())
            .expect_err("passwords differ");
        assert!(is_credential_error(&err));
    }

    #[test]
    fn test_database_outage_is_not_a_credential_error() {
        let err = anyhow::Error::from(sqlx::Error::PoolTimedOut);
        assert!(!is_credential_error(&err));
    }
}
