//! Domain entities for the database layer

pub mod conversation;
pub mod message;
pub mod profile;
pub mod user;

pub use conversation::{Conversation, Participant};
pub use message::Message;
pub use profile::{Profile, UpdateProfileRequest};
pub use user::{UpdateUserRequest, User};
