//! # Parley Chat Crate
//!
//! Business rules for the Parley chat demo: form validation, permission checks
//! and the services that combine them with the database repositories.
//!
//! ## Architecture
//!
//! - **Forms**: typed payloads that validate into per-field [`FormErrors`]
//! - **Services**: validate, check permissions, then call repositories
//! - **Types**: the [`ChatError`] returned by every service
//! - **Utils**: field validators and the [`PermissionChecker`]

pub mod forms;
pub mod services;
pub mod types;
pub mod utils;

pub use forms::{
    ConversationCreateForm, ConversationForm, FormErrors, LoginForm, MessageForm,
    ParticipantsForm, PasswordChangeForm, ProfileForm, UserCreateForm, UserForm,
    NON_FIELD_ERRORS,
};
pub use services::{ConversationService, MessagePage, MessageService, ProfileService, UserService};
pub use types::{ChatError, ChatResult};
pub use utils::PermissionChecker;
