use super::{
    auth,
    components,
    components::Component,
    config, crypto, db_ops,
    db_ops::DbModel,
    errors::ServerError,
    extractors::AuthenticatedUser,
    forms, models,
    models::AppState,
    session,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use futures::join;

pub async fn root() -> impl IntoResponse {
    Redirect::to("/register")
}

fn invalid_csrf() -> Response {
    (StatusCode::FORBIDDEN, "invalid CSRF token").into_response()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "unauthorized").into_response()
}

/// Redirect to `to`, setting a flash message which the next rendered page
/// (register or login) will show once.
fn redirect_with_flash(to: &str, message: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", session::flash_cookie(message));

    (headers, Redirect::to(to)).into_response()
}

pub async fn register_form(headers: HeaderMap) -> impl IntoResponse {
    let flash = session::take_flash(&headers);
    let nonce = crypto::csrf_nonce();
    let csrf_token = crypto::anon_csrf_token(&nonce);
    let mut response_headers = HeaderMap::new();
    response_headers
        .append("Set-Cookie", session::csrf_nonce_cookie(&nonce));
    if flash.is_some() {
        response_headers.append("Set-Cookie", session::clear_flash_cookie());
    }
    let page = components::Page {
        title: "Register",
        children: Box::new(components::RegisterPage {
            username: "",
            email: "",
            first_name: "",
            last_name: "",
            errors: &[],
            flash: flash.as_deref(),
            csrf_token: &csrf_token,
        }),
    }
    .render();

    (response_headers, page)
}

pub async fn handle_register(
    State(AppState { db }): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<forms::RegisterForm>,
) -> Result<Response, ServerError> {
    let nonce =
        match session::cookie_value(&headers, config::CSRF_NONCE_COOKIE) {
            Some(nonce) => nonce,
            None => return Ok(invalid_csrf()),
        };
    if !crypto::anon_csrf_token_is_valid(&nonce, &form.csrf_token) {
        return Ok(invalid_csrf());
    }
    let form = form.normalized();
    let mut errors = form.validate();
    if errors.is_empty() {
        let (username_taken, email_taken) =
            db_ops::identity_taken(&db, &form.username, &form.email).await?;
        if username_taken {
            errors.push("Username is already taken".to_string());
        }
        if email_taken {
            errors.push("Email is already taken".to_string());
        }
    }
    if !errors.is_empty() {
        let csrf_token = crypto::anon_csrf_token(&nonce);
        let page = components::Page {
            title: "Register",
            children: Box::new(components::RegisterPage {
                username: &form.username,
                email: &form.email,
                first_name: &form.first_name,
                last_name: &form.last_name,
                errors: &errors,
                flash: None,
                csrf_token: &csrf_token,
            }),
        }
        .render();
        return Ok(page.into_response());
    }

    let password = form.password;
    let user = models::User {
        username: form.username,
        email: form.email,
        first_name: form.first_name,
        last_name: form.last_name,
    };
    let session = auth::register(&db, &user, &password).await?;
    let mut response_headers = HeaderMap::new();
    response_headers.insert("Set-Cookie", session::session_cookie(&session));

    Ok((
        response_headers,
        Redirect::to(&format!("/users/{}", user.username)),
    )
        .into_response())
}

pub async fn login_form(headers: HeaderMap) -> impl IntoResponse {
    let flash = session::take_flash(&headers);
    let nonce = crypto::csrf_nonce();
    let csrf_token = crypto::anon_csrf_token(&nonce);
    let mut response_headers = HeaderMap::new();
    response_headers
        .append("Set-Cookie", session::csrf_nonce_cookie(&nonce));
    if flash.is_some() {
        response_headers.append("Set-Cookie", session::clear_flash_cookie());
    }
    let page = components::Page {
        title: "Log in",
        children: Box::new(components::LoginPage {
            username: "",
            errors: &[],
            flash: flash.as_deref(),
            csrf_token: &csrf_token,
        }),
    }
    .render();

    (response_headers, page)
}

pub async fn handle_login(
    State(AppState { db }): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<forms::LoginForm>,
) -> Result<Response, ServerError> {
    let nonce =
        match session::cookie_value(&headers, config::CSRF_NONCE_COOKIE) {
            Some(nonce) => nonce,
            None => return Ok(invalid_csrf()),
        };
    if !crypto::anon_csrf_token_is_valid(&nonce, &form.csrf_token) {
        return Ok(invalid_csrf());
    }
    let mut errors = form.validate();
    if errors.is_empty() {
        match auth::authenticate(&db, &form.username, &form.password).await {
            Ok(session) => {
                let mut response_headers = HeaderMap::new();
                response_headers
                    .insert("Set-Cookie", session::session_cookie(&session));
                return Ok((
                    response_headers,
                    Redirect::to(&format!("/users/{}", form.username)),
                )
                    .into_response());
            }
            Err(e) if auth::is_credential_error(&e) => {
                errors.push("Incorrect username/password".to_string());
            }
            // a database outage is not the user's fault
            Err(e) => return Err(e.into()),
        }
    }

    let csrf_token = crypto::anon_csrf_token(&nonce);
    let page = components::Page {
        title: "Log in",
        children: Box::new(components::LoginPage {
            username: &form.username,
            errors: &errors,
            flash: None,
            csrf_token: &csrf_token,
        }),
    }
    .render();

    Ok(page.into_response())
}

pub async fn user_detail(
    State(AppState { db }): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    // The profile is only for its owner; anyone else (logged in or not)
    // gets bounced to the landing page with a flash message.
    let viewer = session::cookie_value(&headers, config::SESSION_COOKIE)
        .and_then(|token| session::deserialize_session(&token).ok())
        .filter(|session| !session.is_expired())
        .map(|session| session.username);
    if viewer.as_deref() != Some(username.as_str()) {
        return Ok(redirect_with_flash(
            "/",
            "You must be logged in to view!",
        ));
    }

    let list_query = db_ops::ListNoteQuery {
        username: &username,
    };
    let (user, notes) = join!(
        db_ops::get_user(&db, &username),
        models::Note::list(&db, &list_query)
    );
    let user = user?;
    let notes = notes?;
    let csrf_token = crypto::csrf_token(&username);
    let page = components::Page {
        title: &format!("{} {}", user.first_name, user.last_name),
        children: Box::new(components::UserDetailPage {
            user: &user,
            notes: &notes,
            csrf_token: &csrf_token,
        }),
    }
    .render();

    Ok(page.into_response())
}

pub async fn logout(
    AuthenticatedUser { username }: AuthenticatedUser,
    Form(form): Form<forms::CsrfForm>,
) -> Response {
    if !crypto::csrf_token_is_valid(&username, &form.csrf_token) {
        return invalid_csrf();
    }
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", session::clear_session_cookie());

    (headers, Redirect::to("/")).into_response()
}

pub async fn new_note_form(
    AuthenticatedUser { username: viewer }: AuthenticatedUser,
    Path(username): Path<String>,
) -> Response {
    if viewer != username {
        return unauthorized();
    }
    let csrf_token = crypto::csrf_token(&username);
    let page = components::Page {
        title: "Add a note",
        children: Box::new(components::NoteFormPage {
            action: &format!("/users/{username}/notes/add"),
            heading: "Add a note",
            title: "",
            content: "",
            back_href: &format!("/users/{username}"),
            errors: &[],
            csrf_token: &csrf_token,
        }),
    }
    .render();

    page.into_response()
}

pub async fn handle_note_submission(
    State(AppState { db }): State<AppState>,
    AuthenticatedUser { username: viewer }: AuthenticatedUser,
    Path(username): Path<String>,
    Form(form): Form<forms::NoteForm>,
) -> Result<Response, ServerError> {
    if viewer != username {
        return Ok(unauthorized());
    }
    if !crypto::csrf_token_is_valid(&username, &form.csrf_token) {
        return Ok(invalid_csrf());
    }
    let errors = form.validate();
    if !errors.is_empty() {
        let csrf_token = crypto::csrf_token(&username);
        let page = components::Page {
            title: "Add a note",
            children: Box::new(components::NoteFormPage {
                action: &format!("/users/{username}/notes/add"),
                heading: "Add a note",
                title: &form.title,
                content: &form.content,
                back_href: &format!("/users/{username}"),
                errors: &errors,
                csrf_token: &csrf_token,
            }),
        }
        .render();
        return Ok(page.into_response());
    }
    db_ops::create_note(&db, &username, &form.title, &form.content).await?;

    Ok(Redirect::to(&format!("/users/{username}")).into_response())
}

pub async fn edit_note_form(
    State(AppState { db }): State<AppState>,
    AuthenticatedUser { username: viewer }: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Response, ServerError> {
    let note = models::Note::get(&db, &db_ops::GetNoteQuery { id }).await?;
    if note.username != viewer {
        return Ok(unauthorized());
    }
    let csrf_token = crypto::csrf_token(&viewer);
    let page = components::Page {
        title: "Edit note",
        children: Box::new(components::NoteFormPage {
            action: &format!("/notes/{id}/edit"),
            heading: "Edit note",
            title: &note.title,
            content: &note.content,
            back_href: &format!("/users/{}", note.username),
            errors: &[],
            csrf_token: &csrf_token,
        }),
    }
    .render();

    Ok(page.into_response())
}

pub async fn handle_note_edit(
    State(AppState { db }): State<AppState>,
    AuthenticatedUser { username: viewer }: AuthenticatedUser,
    Path(id): Path<i32>,
    Form(form): Form<forms::NoteForm>,
) -> Result<Response, ServerError> {
    let mut note = models::Note::get(&db, &db_ops::GetNoteQuery { id }).await?;
    if note.username != viewer {
        return Ok(unauthorized());
    }
    if !crypto::csrf_token_is_valid(&viewer, &form.csrf_token) {
        return Ok(invalid_csrf());
    }
    let errors = form.validate();
    if !errors.is_empty() {
        let csrf_token = crypto::csrf_token(&viewer);
        let page = components::Page {
            title: "Edit note",
            children: Box::new(components::NoteFormPage {
                action: &format!("/notes/{id}/edit"),
                heading: "Edit note",
                title: &form.title,
                content: &form.content,
                back_href: &format!("/users/{}", note.username),
                errors: &errors,
                csrf_token: &csrf_token,
            }),
        }
        .render();
        return Ok(page.into_response());
    }
    note.title = form.title;
    note.content = form.content;
    note.save(&db).await?;

    Ok(Redirect::to(&format!("/users/{}", note.username)).into_response())
}

pub async fn delete_note(
    State(AppState { db }): State<AppState>,
    AuthenticatedUser { username: viewer }: AuthenticatedUser,
    Path(id): Path<i32>,
    Form(form): Form<forms::CsrfForm>,
) -> Result<Response, ServerError> {
    let note = models::Note::get(&db, &db_ops::GetNoteQuery { id }).await?;
    if note.username != viewer {
        return Ok(unauthorized());
    }
    if !crypto::csrf_token_is_valid(&viewer, &form.csrf_token) {
        return Ok(invalid_csrf());
    }
    let owner = note.username.clone();
    note.delete(&db).await?;

    Ok(Redirect::to(&format!("/users/{owner}")).into_response())
}

pub async fn delete_user(
    State(AppState { db }): State<AppState>,
    AuthenticatedUser { username: viewer }: AuthenticatedUser,
    Path(username): Path<String>,
    Form(form): Form<forms::CsrfForm>,
) -> Result<Response, ServerError> {
    if viewer != username {
        return Ok(unauthorized());
    }
    if !crypto::csrf_token_is_valid(&username, &form.csrf_token) {
        return Ok(invalid_csrf());
    }
    // The notes cascade away with the user.
    db_ops::delete_user(&db, &username).await?;
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", session::clear_session_cookie());

    Ok((headers, Redirect::to("/")).into_response())
}
