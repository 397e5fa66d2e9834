//! Business operations for users and posts.
//!
//! Controllers in `web` call into this crate; it persists through `entity_api`
//! and announces successful post mutations as `events::DomainEvent`s so the
//! real-time hub can fan them out.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{posts, users, Id};

pub mod error;
pub mod jwt;
pub mod post;
pub mod user;
