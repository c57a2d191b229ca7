//! Typed form payloads and their field-level validation. Validation
//! returns user-facing messages which the components re-render inline,
//! next to the offending form.

use regex::Regex;
use serde::Deserialize;

fn is_required(value: &str, label: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{label} is required"));
    }
}

fn max_len(value: &str, label: &str, max: usize, errors: &mut Vec<String>) {
    if value.chars().count() > max {
        errors.push(format!("{label} must be at most {max} characters"));
    }
}

fn looks_like_email(value: &str) -> bool {
    let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .expect("email pattern compiles");
    re.is_match(value)
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub csrf_token: String,
}

impl RegisterForm {
    /// Copy with the identity fields whitespace-trimmed, so the duplicate
    /// pre-check and the insert agree on what is being stored. The
    /// password is kept byte-for-byte.
    pub fn normalized(&self) -> RegisterForm {
        RegisterForm {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            email: self.email.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            csrf_token: self.csrf_token.clone(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        is_required(&self.username, "Username", &mut errors);
        is_required(&self.password, "Password", &mut errors);
        is_required(&self.email, "Email", &mut errors);
        is_required(&self.first_name, "First name", &mut errors);
        is_required(&self.last_name, "Last name", &mut errors);
        max_len(&self.username, "Username", 20, &mut errors);
        max_len(&self.email, "Email", 50, &mut errors);
        max_len(&self.first_name, "First name", 30, &mut errors);
        max_len(&self.last_name, "Last name", 30, &mut errors);
        if !self.email.trim().is_empty() && !looks_like_email(&self.email) {
            errors.push("Email does not look like an email".to_string());
        }

        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
}

impl LoginForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        is_required(&self.username, "Username", &mut errors);
        is_required(&self.password, "Password", &mut errors);

        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct NoteForm {
    pub title: String,
    pub content: String,
    pub csrf_token: String,
}

impl NoteForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        is_required(&self.title, "Title", &mut errors);
        is_required(&self.content, "Content", &mut errors);

        errors
    }
}

/// For forms whose only payload is the CSRF token (logout, deletions).
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    pub csrf_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_registration() -> RegisterForm {
        RegisterForm {
            username: "jack".to_string(),
            password: "hunter2".to_string(),
            email: "jack@jack.com".to_string(),
            first_name: "Jack".to_string(),
            last_name: "Sparrow".to_string(),
            csrf_token: "tok".to_string(),
        }
    }

    #[test]
    fn test_valid_registration_has_no_errors() {
        assert!(valid_registration().validate().is_empty());
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let form = RegisterForm {
            username: "".to_string(),
            password: "  ".to_string(),
            email: "".to_string(),
            first_name: "".to_string(),
            last_name: "".to_string(),
            csrf_token: "tok".to_string(),
        };
        let errors = form.validate();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&"Username is required".to_string()));
        assert!(errors.contains(&"Password is required".to_string()));
    }

    #[test]
    fn test_bad_email_is_reported() {
        let mut form = valid_registration();
        form.email = "not-an-email".to_string();
        let errors = form.validate();
        assert_eq!(errors, vec!["Email does not look like an email"]);
    }

    #[test]
    fn test_overlong_username_is_reported() {
        let mut form = valid_registration();
        form.username = "j".repeat(21);
        let errors = form.validate();
        assert_eq!(errors, vec!["Username must be at most 20 characters"]);
    }

    #[test]
    fn test_normalized_trims_identity_fields() {
        let mut form = valid_registration();
        form.username = "  jack ".to_string();
        form.email = " jack@jack.com\n".to_string();
        form.password = " hunter2 ".to_string();
        let form = form.normalized();
        assert_eq!(form.username, "jack");
        assert_eq!(form.email, "jack@jack.com");
        // passwords are allowed to contain whitespace
        assert_eq!(form.password, " hunter2 ");
    }

    #[test]
    fn test_note_needs_title_and_content() {
        let form = NoteForm {
            title: "".to_string(),
            content: "hello".to_string(),
            csrf_token: "whatever".to_string(),
        };
        assert_eq!(form.validate(), vec!["Title is required"]);
    }
}
