//! Internal utilities

pub mod permissions;
pub mod validation;

pub use permissions::PermissionChecker;
