//! crates/quran_reader_core/src/domain.rs
//!
//! Defines the pure, core data structures for the reader.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One numbered unit of Quran text, or a synthetic Bismillah marker when
/// `number_in_surah` is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Verse {
    /// Global number across the whole Quran (0 for a synthetic marker).
    pub number_in_quran: u16,
    pub number_in_surah: u16,
    pub surah: u16,
    pub juz: u16,
    pub ruku: u16,
    pub text_arabic: String,
    /// Translations keyed by language code ("en", "ur", ...).
    pub translations: BTreeMap<String, String>,
    pub bookmarked: bool,
    pub favorited: bool,
    pub note: String,
    pub sajda: bool,
    pub sajda_type: String,
    /// Local path of the downloaded recitation, empty when not downloaded.
    pub audio_path: String,
    /// Set by the sequence builder: this entry closes its surah.
    pub is_surah_end: bool,
}

impl Verse {
    pub fn key(&self) -> VerseKey {
        VerseKey {
            number_in_quran: self.number_in_quran,
            number_in_surah: self.number_in_surah,
            surah: self.surah,
        }
    }

    /// True for the synthetic Bismillah entry inserted by the builder.
    pub fn is_bismillah_marker(&self) -> bool {
        self.number_in_surah == 0
    }

    /// The number shown to the reader. The synthetic marker reads as verse 1.
    pub fn display_number(&self) -> u16 {
        if self.is_bismillah_marker() {
            1
        } else {
            self.number_in_surah
        }
    }
}

/// The identity triple of a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VerseKey {
    pub number_in_quran: u16,
    pub number_in_surah: u16,
    pub surah: u16,
}

/// Static reference data about one surah.
#[derive(Debug, Clone, PartialEq)]
pub struct SurahMeta {
    pub number: u16,
    pub verse_count: u16,
    pub name_arabic: String,
    pub name_english: String,
}

/// Static reference data about one juz.
#[derive(Debug, Clone, PartialEq)]
pub struct JuzMeta {
    pub number: u16,
    pub name_arabic: String,
    pub start_surah: u16,
    pub start_verse: u16,
}

/// A surah title placed inside a page before the verse at `insert_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralHeader {
    pub surah: u16,
    pub name_arabic: String,
    pub name_english: String,
    pub bismillah: bool,
    pub insert_at: usize,
}

/// One render-ready entry produced by the page compositor.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceItem {
    Header(StructuralHeader),
    Bismillah { surah: u16 },
    Verse { verse: Verse, selected: bool },
}

/// Per-surah record of how far the reader got.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingProgress {
    pub surah: u16,
    pub last_read_verse: u16,
    pub completion_percentage: f32,
    pub last_read_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KhatamSession {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub is_active: bool,
    pub is_completed: bool,
    pub current_surah: u16,
    pub current_verse: u16,
    pub total_verses_read: u32,
}

/// One logged khatam position. Several may exist for the same day.
#[derive(Debug, Clone, PartialEq)]
pub struct KhatamProgressEntry {
    pub id: Uuid,
    pub session_id: Uuid,
    pub surah: u16,
    pub verse: u16,
    pub date_read: NaiveDate,
    pub recorded_at: DateTime<Utc>,
}

/// A named shortcut to a (surah, verse) position.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickJump {
    pub id: Uuid,
    pub name: String,
    pub surah: u16,
    pub verse: u16,
}

/// Mirror of what the audio collaborator is doing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioState {
    pub is_playing: bool,
    pub is_paused: bool,
    pub is_downloading: bool,
    pub download_progress: f32,
    pub current_path: String,
    pub playing: Option<VerseKey>,
}
