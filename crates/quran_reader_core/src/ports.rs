//! crates/quran_reader_core/src/ports.rs
//!
//! Defines the service contracts (traits) the reader core consumes.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of how verses, progress and audio are actually stored or played.

use crate::domain::{
    JuzMeta, KhatamProgressEntry, KhatamSession, QuickJump, ReadingProgress, SurahMeta, Verse,
    VerseKey,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, file system).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait VerseStore: Send + Sync {
    /// Verses of one surah, ordered by verse number.
    async fn verses_of_surah(&self, surah: u16) -> PortResult<Vec<Verse>>;

    /// Verses of one juz, ordered by global verse number.
    async fn verses_of_juz(&self, juz: u16) -> PortResult<Vec<Verse>>;

    async fn surah_metadata(&self, surah: u16) -> PortResult<SurahMeta>;

    async fn juz_metadata(&self, juz: u16) -> PortResult<JuzMeta>;
}

#[async_trait]
pub trait AnnotationStore: Send + Sync {
    async fn set_bookmark(&self, verse: VerseKey, bookmarked: bool) -> PortResult<()>;

    async fn set_favorite(&self, verse: VerseKey, favorited: bool) -> PortResult<()>;

    async fn set_note(&self, verse: VerseKey, note: &str) -> PortResult<()>;

    async fn set_audio_path(&self, verse: VerseKey, path: &str) -> PortResult<()>;

    // --- Navigation helpers ---
    async fn bookmarked_numbers(&self, surah: u16) -> PortResult<Vec<u16>>;

    async fn favorited_numbers(&self, surah: u16) -> PortResult<Vec<u16>>;

    async fn noted_numbers(&self, surah: u16) -> PortResult<Vec<u16>>;
}

#[async_trait]
pub trait ReadingProgressStore: Send + Sync {
    async fn get_progress(&self, surah: u16) -> PortResult<Option<ReadingProgress>>;

    /// Stores `progress` unless the record of its surah is already at or past
    /// `progress.last_read_verse`. The comparison and the write are one atomic
    /// step. Returns whether anything was written.
    async fn write_progress(&self, progress: ReadingProgress) -> PortResult<bool>;

    /// All records, most recently written first.
    async fn list_progress(&self) -> PortResult<Vec<ReadingProgress>>;
}

#[async_trait]
pub trait KhatamStore: Send + Sync {
    async fn active_session(&self) -> PortResult<Option<KhatamSession>>;

    async fn entries_for_date(
        &self,
        session_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<KhatamProgressEntry>>;

    /// Entries logged strictly before `date`.
    async fn entries_before(
        &self,
        session_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<KhatamProgressEntry>>;

    async fn insert_entry(&self, entry: KhatamProgressEntry) -> PortResult<()>;

    async fn update_session_aggregate(
        &self,
        session_id: Uuid,
        surah: u16,
        verse: u16,
        total_verses_read: u32,
    ) -> PortResult<()>;

    async fn complete_session(&self, session_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait QuickJumpStore: Send + Sync {
    async fn quick_jumps_for_surah(&self, surah: u16) -> PortResult<Vec<QuickJump>>;

    async fn quick_jump(&self, id: Uuid) -> PortResult<QuickJump>;

    async fn insert_quick_jump(&self, quick_jump: QuickJump) -> PortResult<()>;

    async fn delete_quick_jump(&self, id: Uuid) -> PortResult<()>;
}

/// Receives download progress in percent (0.0 to 100.0).
pub type ProgressCallback<'a> = &'a (dyn Fn(f32) + Send + Sync);

#[async_trait]
pub trait AudioService: Send + Sync {
    /// Fetches the recitation of one verse and returns its local path.
    async fn download(
        &self,
        surah: u16,
        verse: u16,
        on_progress: ProgressCallback<'_>,
    ) -> PortResult<String>;

    async fn play(&self, path: &str) -> PortResult<()>;

    async fn pause(&self) -> PortResult<()>;

    async fn stop(&self) -> PortResult<()>;

    /// Frees the underlying player. Called once when the owning controller is torn down.
    async fn release(&self);
}
