//! Parley Database Crate
//!
//! This crate provides database functionality for the Parley chat backend,
//! including connection management, migrations, and repository implementations
//! for users, profiles, conversations and messages.

use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use parley_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{ConversationRepository, MessageRepository, ProfileRepository, UserRepository};

pub use entities::{
    conversation::{Conversation, Participant},
    message::Message,
    profile::{Profile, UpdateProfileRequest},
    user::{UpdateUserRequest, User},
};

pub use types::{errors::DatabaseError, DatabaseResult};

pub use sqlx::SqlitePool;

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Generate an opaque public identifier for a new row.
pub fn new_public_id() -> String {
    CUID.create_id()
}

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::Connection(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(format!("{e:#}")))?;

    Ok(pool)
}
