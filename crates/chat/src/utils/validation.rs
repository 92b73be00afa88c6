//! Field-level validation rules shared by the forms.
//!
//! Each check returns the user-facing message on failure so forms can collect
//! every problem instead of stopping at the first one.

use once_cell::sync::Lazy;
use regex::Regex;

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 128;
pub const DISPLAY_NAME_MAX_LENGTH: usize = 50;
pub const BIO_MAX_LENGTH: usize = 500;
pub const URL_MAX_LENGTH: usize = 2048;
pub const TITLE_MAX_LENGTH: usize = 255;

pub const REQUIRED: &str = "This field is required.";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9@.+_-]+$").expect("username pattern compiles"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern compiles")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url pattern compiles"));

pub type FieldResult = Result<(), String>;

pub fn max_length(value: &str, limit: usize) -> FieldResult {
    let length = value.chars().count();
    if length > limit {
        return Err(format!(
            "Ensure this value has at most {limit} characters (it has {length})."
        ));
    }
    Ok(())
}

pub fn username(value: &str) -> FieldResult {
    if value.is_empty() {
        return Err(REQUIRED.to_string());
    }
    max_length(value, USERNAME_MAX_LENGTH)?;
    if !USERNAME_RE.is_match(value) {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    Ok(())
}

/// An empty email is allowed and means "no address".
pub fn email(value: &str) -> FieldResult {
    if value.is_empty() {
        return Ok(());
    }
    max_length(value, EMAIL_MAX_LENGTH)?;
    if !EMAIL_RE.is_match(value) {
        return Err("Enter a valid email address.".to_string());
    }
    Ok(())
}

pub fn password(value: &str) -> FieldResult {
    if value.is_empty() {
        return Err(REQUIRED.to_string());
    }
    let length = value.chars().count();
    if length < PASSWORD_MIN_LENGTH {
        return Err(format!(
            "This password is too short. It must contain at least {PASSWORD_MIN_LENGTH} characters."
        ));
    }
    if length > PASSWORD_MAX_LENGTH {
        return Err(format!(
            "This password is too long. It must contain at most {PASSWORD_MAX_LENGTH} characters."
        ));
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Err("This password is entirely numeric.".to_string());
    }
    Ok(())
}

pub fn display_name(value: &str) -> FieldResult {
    max_length(value, DISPLAY_NAME_MAX_LENGTH)?;
    if value.chars().any(char::is_control) {
        return Err("Display name contains invalid characters.".to_string());
    }
    Ok(())
}

pub fn bio(value: &str) -> FieldResult {
    max_length(value, BIO_MAX_LENGTH)
}

/// An empty URL is allowed and clears the avatar.
pub fn avatar_url(value: &str) -> FieldResult {
    if value.is_empty() {
        return Ok(());
    }
    max_length(value, URL_MAX_LENGTH)?;
    if !URL_RE.is_match(value) {
        return Err("Enter a valid URL.".to_string());
    }
    Ok(())
}

pub fn title(value: &str) -> FieldResult {
    max_length(value, TITLE_MAX_LENGTH)
}

pub fn message_text(value: &str, limit: usize) -> FieldResult {
    if value.trim().is_empty() {
        return Err(REQUIRED.to_string());
    }
    max_length(value, limit)
}
