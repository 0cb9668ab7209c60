pub mod cli;
pub mod client;
pub mod config;
pub mod debounce;
pub mod overlay;
pub mod text;

pub use client::{ClientError, GrammarCheck, GrammarClient};
pub use config::Config;
pub use debounce::{CheckEvent, CheckScheduler, DebouncedChecker, Ticket};
pub use overlay::Rectifier;

use serde::{Deserialize, Serialize};

/// A single grammar problem reported by the checking service.
///
/// `offset` and `length` count characters, not bytes, and describe the
/// half-open span `[offset, offset + length)` of the text that was checked.
/// They may point past the end of the text once it has been edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub bad: String,
    pub message: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub offset: usize,
    pub length: usize,
}

impl ErrorDescriptor {
    /// End of the span, in characters.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length)
    }
}
