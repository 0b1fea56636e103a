// Domain layer - Pure business logic
// No dependencies on infrastructure or presentation layers

pub mod challenge;
pub mod chat;
pub mod config;
pub mod inference;
pub mod report;
pub mod shared;
pub mod store;
pub mod user;

// Re-exports for convenience
pub use shared::{ChatId, DomainError, UserId};
