//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration and infrastructure.

pub mod errors;
pub mod ports;

pub use errors::{Result, RuntimeError};
pub use ports::{ChannelPromptPort, LoggingPromptPort, Prompt, PromptPort};
