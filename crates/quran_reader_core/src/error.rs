//! crates/quran_reader_core/src/error.rs
//!
//! Errors raised by the reading cursor. None of them leave the state half-updated.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReaderError {
    /// A jump target that the active sequence does not contain.
    #[error("Verse {verse} is not in the current sequence")]
    VerseNotFound { verse: u16 },

    #[error("Index {index} is outside a sequence of {len} entries")]
    OutOfRange { index: usize, len: usize },

    /// A load that completed after a newer one was requested.
    #[error("Load {ticket} was superseded by load {latest}")]
    StaleLoad { ticket: u64, latest: u64 },

    #[error("Failed to load content: {0}")]
    Load(String),

    #[error("Nothing is loaded")]
    NotLoaded,

    #[error("Pagination is disabled")]
    PaginationDisabled,

    #[error("Quick jump {0} is not known")]
    QuickJumpNotFound(Uuid),
}
