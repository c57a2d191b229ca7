use super::{controllers, models};
use axum::routing::{get, post, Router};

#[rustfmt::skip]
pub fn get_routes() -> Router<models::AppState> {
    Router::new()
        .route("/", get(controllers::root))
        .route("/register", get(controllers::register_form))
        .route("/register", post(controllers::handle_register))
        .route("/login", get(controllers::login_form))
        .route("/login", post(controllers::handle_login))
        .route("/logout", post(controllers::logout))
        .route("/users/:username", get(controllers::user_detail))
        .route("/users/:username/notes/add", get(controllers::new_note_form))
        .route("/users/:username/notes/add", post(controllers::handle_note_submission))
        .route("/users/:username/delete", post(controllers::delete_user))
        .route("/notes/:id/edit", get(controllers::edit_note_form))
        .route("/notes/:id/edit", post(controllers::handle_note_edit))
        .route("/notes/:id/delete", post(controllers::delete_note))
}
