//! We can have a little hard-coded config, [as a
//! snack](https://knowyourmeme.com/memes/cats-can-have-a-little-salami).

/// Name of the cookie carrying the signed session.
pub const SESSION_COOKIE: &str = "session";

/// Name of the cookie carrying a one-shot flash message.
pub const FLASH_COOKIE: &str = "flash";

/// Name of the cookie carrying the pre-session CSRF nonce, for forms
/// rendered before anyone is logged in (register, login).
pub const CSRF_NONCE_COOKIE: &str = "csrf_nonce";

/// Sessions older than this are treated as if the user never logged in and
/// the browser gets bounced to the login page.
pub const SESSION_TTL_SECONDS: u64 = 60 * 60 * 24 * 30;
