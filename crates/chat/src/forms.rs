//! Typed request payloads and their validation.
//!
//! Forms never touch the database; checks that need it (unknown participants,
//! taken usernames) are added by the services on top of [`FormErrors`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::utils::validation::{self, FieldResult, REQUIRED};

/// Key used for errors that are not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Validation messages collected per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record the outcome of a field check.
    pub fn check(&mut self, field: &str, result: FieldResult) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Registration payload.
#[derive(Debug, Clone, Default)]
pub struct UserCreateForm {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

impl UserCreateForm {
    /// Trim the username and email in place, then validate.
    pub fn clean(&mut self) -> Result<(), FormErrors> {
        self.username = self.username.trim().to_string();
        self.email = self.email.take().map(|e| e.trim().to_string());

        let mut errors = FormErrors::new();
        errors.check("username", validation::username(&self.username));
        if let Some(email) = &self.email {
            errors.check("email", validation::email(email));
        }
        errors.check("password", validation::password(&self.password));
        errors.into_result()
    }
}

/// Sign-in credentials. Only presence is checked; the authenticator does the rest.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn clean(&mut self) -> Result<(), FormErrors> {
        self.username = self.username.trim().to_string();

        let mut errors = FormErrors::new();
        if self.username.is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()
    }
}

/// Partial account update.
#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UserForm {
    pub fn clean(&mut self) -> Result<(), FormErrors> {
        self.username = self.username.take().map(|u| u.trim().to_string());
        self.email = self.email.take().map(|e| e.trim().to_string());

        let mut errors = FormErrors::new();
        if self.username.is_none() && self.email.is_none() {
            errors.add(NON_FIELD_ERRORS, "Provide at least one field to update.");
        }
        if let Some(username) = &self.username {
            errors.check("username", validation::username(username));
        }
        if let Some(email) = &self.email {
            errors.check("email", validation::email(email));
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub new_password: String,
}

impl PasswordChangeForm {
    pub fn clean(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if self.current_password.is_empty() {
            errors.add("current_password", REQUIRED);
        }
        errors.check("new_password", validation::password(&self.new_password));
        errors.into_result()
    }
}

/// Profile fields. `None` leaves a field alone; an empty string clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileForm {
    pub fn clean(&mut self) -> Result<(), FormErrors> {
        self.display_name = self.display_name.take().map(|d| d.trim().to_string());
        self.avatar_url = self.avatar_url.take().map(|u| u.trim().to_string());

        let mut errors = FormErrors::new();
        if let Some(display_name) = &self.display_name {
            errors.check("display_name", validation::display_name(display_name));
        }
        if let Some(bio) = &self.bio {
            errors.check("bio", validation::bio(bio));
        }
        if let Some(avatar_url) = &self.avatar_url {
            errors.check("avatar_url", validation::avatar_url(avatar_url));
        }
        errors.into_result()
    }
}

/// New conversation. Participants are user public ids; the creator is always added.
#[derive(Debug, Clone, Default)]
pub struct ConversationCreateForm {
    pub title: Option<String>,
    pub participants: Vec<String>,
}

impl ConversationCreateForm {
    pub fn clean(&mut self) -> Result<(), FormErrors> {
        self.title = self.title.take().map(|t| t.trim().to_string());
        self.participants = dedupe(std::mem::take(&mut self.participants));

        let mut errors = FormErrors::new();
        if let Some(title) = &self.title {
            errors.check("title", validation::title(title));
        }
        errors.into_result()
    }
}

/// Conversation update. A present participant list replaces the current set.
#[derive(Debug, Clone, Default)]
pub struct ConversationForm {
    pub title: Option<String>,
    pub participants: Option<Vec<String>>,
}

impl ConversationForm {
    pub fn clean(&mut self) -> Result<(), FormErrors> {
        self.title = self.title.take().map(|t| t.trim().to_string());
        self.participants = self.participants.take().map(dedupe);

        let mut errors = FormErrors::new();
        if self.title.is_none() && self.participants.is_none() {
            errors.add(NON_FIELD_ERRORS, "Provide at least one field to update.");
        }
        if let Some(title) = &self.title {
            errors.check("title", validation::title(title));
        }
        if matches!(&self.participants, Some(list) if list.is_empty()) {
            errors.add("participants", REQUIRED);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParticipantsForm {
    pub participants: Vec<String>,
}

impl ParticipantsForm {
    pub fn clean(&mut self) -> Result<(), FormErrors> {
        self.participants = dedupe(std::mem::take(&mut self.participants));

        let mut errors = FormErrors::new();
        if self.participants.is_empty() {
            errors.add("participants", REQUIRED);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MessageForm {
    pub text: String,
}

impl MessageForm {
    pub fn clean(&mut self, max_length: usize) -> Result<(), FormErrors> {
        self.text = self.text.trim().to_string();

        let mut errors = FormErrors::new();
        errors.check("text", validation::message_text(&self.text, max_length));
        errors.into_result()
    }
}

/// Trim ids, drop blanks and repeats, keep first-seen order.
fn dedupe(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if !id.is_empty() && seen.insert(id.to_string()) {
            unique.push(id.to_string());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_errors_serialize_as_field_map() {
        let mut errors = FormErrors::new();
        errors.add("username", REQUIRED);
        errors.add("password", "too short");
        errors.add("password", "entirely numeric");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "password": ["too short", "entirely numeric"],
                "username": [REQUIRED],
            })
        );
        assert_eq!(
            errors.to_string(),
            "password: too short; password: entirely numeric; username: This field is required."
        );
    }

    #[test]
    fn user_create_form_collects_every_error() {
        let mut form = UserCreateForm {
            username: "  ".to_string(),
            email: Some("nope".to_string()),
            password: "123".to_string(),
        };

        let errors = form.clean().unwrap_err();
        assert_eq!(errors.get("username"), Some(&[REQUIRED.to_string()][..]));
        assert!(errors.get("email").is_some());
        assert!(errors.get("password").is_some());
    }

    #[test]
    fn user_create_form_trims_input() {
        let mut form = UserCreateForm {
            username: " alice ".to_string(),
            email: Some(" alice@example.com ".to_string()),
            password: "password123".to_string(),
        };

        form.clean().unwrap();
        assert_eq!(form.username, "alice");
        assert_eq!(form.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn login_form_requires_both_fields() {
        let errors = LoginForm::default().clean().unwrap_err();
        assert!(errors.get("username").is_some());
        assert!(errors.get("password").is_some());

        let mut form = LoginForm {
            username: " alice ".to_string(),
            password: "secret".to_string(),
        };
        form.clean().unwrap();
        assert_eq!(form.username, "alice");
    }

    #[test]
    fn user_form_requires_a_field() {
        let errors = UserForm::default().clean().unwrap_err();
        assert!(errors.get(NON_FIELD_ERRORS).is_some());

        let mut clear_email = UserForm {
            username: None,
            email: Some(String::new()),
        };
        clear_email.clean().unwrap();
    }

    #[test]
    fn password_change_form_rules() {
        let errors = PasswordChangeForm::default().clean().unwrap_err();
        assert!(errors.get("current_password").is_some());
        assert!(errors.get("new_password").is_some());

        PasswordChangeForm {
            current_password: "old".to_string(),
            new_password: "brand-new-pass".to_string(),
        }
        .clean()
        .unwrap();
    }

    #[test]
    fn profile_form_validates_present_fields_only() {
        ProfileForm::default().clean().unwrap();

        let mut form = ProfileForm {
            display_name: Some("x".repeat(51)),
            bio: Some("b".repeat(501)),
            avatar_url: Some("javascript:alert(1)".to_string()),
        };
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.as_map().len(), 3);
    }

    #[test]
    fn conversation_forms_dedupe_participants() {
        let mut form = ConversationCreateForm {
            title: Some(" Plans ".to_string()),
            participants: vec!["a".into(), " b ".into(), "a".into(), "".into()],
        };
        form.clean().unwrap();
        assert_eq!(form.title.as_deref(), Some("Plans"));
        assert_eq!(form.participants, vec!["a".to_string(), "b".to_string()]);

        let mut update = ConversationForm {
            title: None,
            participants: Some(vec!["  ".into()]),
        };
        let errors = update.clean().unwrap_err();
        assert!(errors.get("participants").is_some());

        assert!(ConversationForm::default().clean().is_err());
        assert!(ParticipantsForm::default().clean().is_err());
    }

    #[test]
    fn dedupe_keeps_first_seen_order_over_large_lists() {
        let ids: Vec<String> = (0..5_000)
            .rev()
            .chain(0..5_000)
            .map(|i| format!(" user-{i} "))
            .collect();
        let unique = dedupe(ids);
        assert_eq!(unique.len(), 5_000);
        assert_eq!(unique.first().map(String::as_str), Some("user-4999"));
        assert_eq!(unique.last().map(String::as_str), Some("user-0"));

        let mixed = vec!["b".into(), "a".into(), " b".into(), "c".into(), "a ".into()];
        assert_eq!(dedupe(mixed), vec!["b", "a", "c"]);
    }

    #[test]
    fn conversation_title_limit() {
        let mut form = ConversationCreateForm {
            title: Some("t".repeat(256)),
            participants: Vec::new(),
        };
        assert!(form.clean().unwrap_err().get("title").is_some());
    }

    #[test]
    fn message_form_trims_and_limits() {
        let mut form = MessageForm {
            text: "  hello  ".to_string(),
        };
        form.clean(100).unwrap();
        assert_eq!(form.text, "hello");

        let mut blank = MessageForm {
            text: " \n ".to_string(),
        };
        assert!(blank.clean(100).is_err());

        let mut long = MessageForm {
            text: "x".repeat(11),
        };
        assert!(long.clean(10).is_err());
    }
}
