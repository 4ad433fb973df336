//! Repository layer for session documents.
//!
//! One JSON-shaped [`werewolf_core::Session`] document per guild. Static rules
//! (action definitions) live in the core registry, not here.

mod error;
mod memory;
mod traits;

pub use error::RepositoryError;
pub use memory::InMemorySessionRepository;
pub use traits::SessionRepository;
