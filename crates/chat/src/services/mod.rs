//! Business logic layer

pub mod conversation_service;
pub mod message_service;
pub mod profile_service;
pub mod user_service;

pub use conversation_service::{ConversationService, MessagePage};
pub use message_service::MessageService;
pub use profile_service::ProfileService;
pub use user_service::UserService;
