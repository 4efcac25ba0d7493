//! Ragline Core - Shared types and collaborator contracts for the Ragline pipeline.

mod conversation;
mod error;
mod traits;
mod types;

pub use conversation::*;
pub use error::{CoreError, CoreResult};
pub use traits::*;
pub use types::*;
