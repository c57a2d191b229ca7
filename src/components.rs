// In many cases, we need to do a let binding to satisfy the borrow checker
// and for some reason, clippy identifies those as unnecessary. Maybe there
// are and clippy knows more than me, maybe not.
#![allow(clippy::let_and_return)]

use super::models;
use ammonia::{clean, clean_text};
use std::fmt::Write;

pub trait Component {
    /// Render the component to a HTML string. By convention, the
    /// implementation should sanitize all string properties at render-time
    fn render(&self) -> String;
}

pub struct Page<'a> {
    pub title: &'a str,
    pub children: Box<dyn Component + 'a>,
}

impl Component for Page<'_> {
    fn render(&self) -> String {
        let stylesheet = include_str!("./style.css");
        format!(
            r#"
            <html>
                <head>
                    <meta name="viewport" content="width=device-width, initial-scale=1.0"></meta>
                    <title>{title}</title>
                    <style>
                        {stylesheet}
                    </style>
                </head>
                <body>
                    {body_html}
                </body>
            </html>
            "#,
            title = clean(self.title),
            body_html = self.children.render()
        )
    }
}

pub struct FlashMessage<'a> {
    pub message: Option<&'a str>,
}
impl Component for FlashMessage<'_> {
    fn render(&self) -> String {
        if let Some(message) = self.message {
            format!(
                r#"<p class="flash">{}</p>"#,
                clean(message)
            )
        } else {
            "".to_string()
        }
    }
}

pub struct ErrorList<'a> {
    pub errors: &'a [String],
}
impl Component for ErrorList<'_> {
    fn render(&self) -> String {
        if self.errors.is_empty() {
            return "".to_string();
        }
        let items = self.errors.iter().fold(String::new(), |mut str, e| {
            let _ = write!(str, "<li>{}</li>", clean(e));
            str
        });
        format!(r#"<ul class="errors">{items}</ul>"#)
    }
}

fn text_input(label: &str, name: &str, value: &str, kind: &str) -> String {
    format!(
        r#"
        <div class="field">
            <label for="{name}">{label}</label>
            <input type="{kind}" name="{name}" id="{name}" value="{value}" />
        </div>
        "#,
        label = clean(label),
        value = clean_text(value)
    )
}

pub struct RegisterPage<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub errors: &'a [String],
    pub flash: Option<&'a str>,
    pub csrf_token: &'a str,
}
impl Component for RegisterPage<'_> {
    fn render(&self) -> String {
        let flash = FlashMessage {
            message: self.flash,
        }
        .render();
        let errors = ErrorList {
            errors: self.errors,
        }
        .render();
        let username = text_input("Username", "username", self.username, "text");
        let password = text_input("Password", "password", "", "password");
        let email = text_input("Email", "email", self.email, "text");
        let first_name =
            text_input("First name", "first_name", self.first_name, "text");
        let last_name =
            text_input("Last name", "last_name", self.last_name, "text");
        format!(
            r#"
            <main class="card">
                <h1>Register</h1>
                {flash}
                {errors}
                <form method="POST" action="/register">
                    <input type="hidden" name="csrf_token" value="{token}" />
                    {username}
                    {password}
                    {email}
                    {first_name}
                    {last_name}
                    <button>Register</button>
                </form>
                <p>Already have an account? <a href="/login">Log in</a></p>
            </main>
            "#,
            token = clean_text(self.csrf_token)
        )
    }
}

pub struct LoginPage<'a> {
    pub username: &'a str,
    pub errors: &'a [String],
    pub flash: Option<&'a str>,
    pub csrf_token: &'a str,
}
impl Component for LoginPage<'_> {
    fn render(&self) -> String {
        let flash = FlashMessage {
            message: self.flash,
        }
        .render();
        let errors = ErrorList {
            errors: self.errors,
        }
        .render();
        let username = text_input("Username", "username", self.username, "text");
        let password = text_input("Password", "password", "", "password");
        format!(
            r#"
            <main class="card">
                <h1>Log in</h1>
                {flash}
                {errors}
                <form method="POST" action="/login">
                    <input type="hidden" name="csrf_token" value="{token}" />
                    {username}
                    {password}
                    <button>Log in</button>
                </form>
                <p>New here? <a href="/register">Register</a></p>
            </main>
            "#,
            token = clean_text(self.csrf_token)
        )
    }
}

/// A form with nothing in it but the CSRF token and a submit button;
/// logout and the two delete actions all look like this.
struct CsrfButton<'a> {
    action: &'a str,
    label: &'a str,
    csrf_token: &'a str,
}
impl Component for CsrfButton<'_> {
    fn render(&self) -> String {
        format!(
            r#"
            <form method="POST" action="{action}" class="inline">
                <input type="hidden" name="csrf_token" value="{token}" />
                <button>{label}</button>
            </form>
            "#,
            action = clean_text(self.action),
            token = clean_text(self.csrf_token),
            label = clean(self.label)
        )
    }
}

pub struct NoteCard<'a> {
    pub note: &'a models::Note,
    pub csrf_token: &'a str,
}
impl Component for NoteCard<'_> {
    fn render(&self) -> String {
        let id = self.note.id;
        let title = clean(&self.note.title);
        // note content is markdown
        let content = clean(&markdown::to_html(&self.note.content));
        let created_at = self.note.created_at.format("%Y-%m-%d");
        let delete = CsrfButton {
            action: &format!("/notes/{id}/delete"),
            label: "Delete",
            csrf_token: self.csrf_token,
        }
        .render();
        format!(
            r#"
            <div class="note">
                <h3>{title}</h3>
                <div class="note-content">{content}</div>
                <p class="note-meta">{created_at}</p>
                <a href="/notes/{id}/edit">Edit</a>
                {delete}
            </div>
            "#
        )
    }
}

pub struct UserDetailPage<'a> {
    pub user: &'a models::User,
    pub notes: &'a [models::Note],
    pub csrf_token: &'a str,
}
impl Component for UserDetailPage<'_> {
    fn render(&self) -> String {
        let username = clean(&self.user.username);
        // attribute context needs entity encoding, not just tag stripping
        let username_attr = clean_text(&self.user.username);
        let full_name = clean(&format!(
            "{} {}",
            self.user.first_name, self.user.last_name
        ));
        let email = clean(&self.user.email);
        let notes = if self.notes.is_empty() {
            "<p>No notes yet.</p>".to_string()
        } else {
            self.notes.iter().fold(String::new(), |mut str, note| {
                let _ = write!(
                    str,
                    "{}",
                    NoteCard {
                        note,
                        csrf_token: self.csrf_token
                    }
                    .render()
                );
                str
            })
        };
        let logout = CsrfButton {
            action: "/logout",
            label: "Log out",
            csrf_token: self.csrf_token,
        }
        .render();
        let delete_account = CsrfButton {
            action: &format!("/users/{}/delete", self.user.username),
            label: "Delete account",
            csrf_token: self.csrf_token,
        }
        .render();
        format!(
            r#"
            <main>
                <h1>{full_name}</h1>
                <p>@{username} &lt;{email}&gt;</p>
                <div class="toolbar">
                    {logout}
                    {delete_account}
                </div>
                <h2>Notes</h2>
                <a href="/users/{username_attr}/notes/add">Add a note</a>
                {notes}
            </main>
            "#
        )
    }
}

pub struct NoteFormPage<'a> {
    /// Where the form POSTs to; add and edit share this component.
    pub action: &'a str,
    pub heading: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub back_href: &'a str,
    pub errors: &'a [String],
    pub csrf_token: &'a str,
}
impl Component for NoteFormPage<'_> {
    fn render(&self) -> String {
        let errors = ErrorList {
            errors: self.errors,
        }
        .render();
        let title = text_input("Title", "title", self.title, "text");
        format!(
            r#"
            <main class="card">
                <h1>{heading}</h1>
                {errors}
                <form method="POST" action="{action}">
                    <input type="hidden" name="csrf_token" value="{token}" />
                    {title}
                    <div class="field">
                        <label for="content">Content</label>
                        <textarea name="content" id="content">{content}</textarea>
                    </div>
                    <button>Save</button>
                </form>
                <a href="{back_href}">Back</a>
            </main>
            "#,
            heading = clean(self.heading),
            action = clean_text(self.action),
            token = clean_text(self.csrf_token),
            content = clean_text(self.content),
            back_href = clean_text(self.back_href),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn get_user() -> models::User {
        models::User {
            username: "jack".to_string(),
            email: "jack@jack.com".to_string(),
            first_name: "Jack".to_string(),
            last_name: "Sparrow".to_string(),
        }
    }

    fn get_note() -> models::Note {
        models::Note {
            id: 7,
            title: "groceries".to_string(),
            content: "- eggs\n- rum".to_string(),
            username: "jack".to_string(),
            created_at: chrono::Utc
                .with_ymd_and_hms(2023, 7, 1, 0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_user_detail_lists_notes() {
        let user = get_user();
        let note = get_note();
        let html = UserDetailPage {
            user: &user,
            notes: std::slice::from_ref(&note),
            csrf_token: "tok",
        }
        .render();
        assert!(html.contains("groceries"));
        assert!(html.contains("/notes/7/edit"));
        // form actions pass through clean_text, which entity-encodes
        // slashes; browsers decode attribute values before use
        assert!(html.contains("notes&#47;7&#47;delete"));
        assert!(html.contains("/users/jack/notes/add"));
    }

    #[test]
    fn test_user_detail_without_notes() {
        let user = get_user();
        let html = UserDetailPage {
            user: &user,
            notes: &[],
            csrf_token: "tok",
        }
        .render();
        assert!(html.contains("No notes yet."));
    }

    #[test]
    fn test_script_tags_are_stripped() {
        let mut note = get_note();
        note.title = "<script>alert('hi')</script>hello".to_string();
        let html = NoteCard {
            note: &note,
            csrf_token: "tok",
        }
        .render();
        assert!(!html.contains("<script>"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn test_form_errors_are_rendered() {
        let errors = vec!["Title is required".to_string()];
        let html = NoteFormPage {
            action: "/users/jack/notes/add",
            heading: "Add a note",
            title: "",
            content: "",
            back_href: "/users/jack",
            errors: &errors,
            csrf_token: "tok",
        }
        .render();
        assert!(html.contains("Title is required"));
        assert!(html.contains(r#"action="&#47;users&#47;jack&#47;notes&#47;add""#));
    }

    #[test]
    fn test_username_cannot_break_out_of_attributes() {
        // passes RegisterForm validation (under 20 chars, non-empty), so
        // it can exist in the database
        let mut user = get_user();
        user.username = r#"x" onfocus="alert(1)"#.to_string();
        let html = UserDetailPage {
            user: &user,
            notes: &[],
            csrf_token: "tok",
        }
        .render();
        assert!(!html.contains(r#"href="/users/x" onfocus"#));
        assert!(!html.contains(r#"action="/users/x" onfocus"#));
    }

    #[test]
    fn test_login_page_renders_flash() {
        let html = LoginPage {
            username: "",
            errors: &[],
            flash: Some("You must be logged in to view!"),
            csrf_token: "tok",
        }
        .render();
        assert!(html.contains("You must be logged in to view!"));
        assert!(html.contains(r#"name="csrf_token" value="tok""#));
    }
}
