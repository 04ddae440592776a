//! services/reader_api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between a reader client and the server,
//! plus the JSON views of the core types shared with the REST endpoints.

use chrono::NaiveDate;
use quran_reader_core::cursor::{LoadTarget, ReaderState};
use quran_reader_core::domain::{
    AudioState, KhatamSession, QuickJump, ReadingProgress, SequenceItem, SurahMeta, Verse,
    VerseKey,
};
use quran_reader_core::KhatamOverview;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

/// Identifies one verse on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub struct VerseKeyDto {
    pub number_in_quran: u16,
    pub number_in_surah: u16,
    pub surah: u16,
}

impl From<VerseKeyDto> for VerseKey {
    fn from(dto: VerseKeyDto) -> Self {
        VerseKey {
            number_in_quran: dto.number_in_quran,
            number_in_surah: dto.number_in_surah,
            surah: dto.surah,
        }
    }
}

impl From<VerseKey> for VerseKeyDto {
    fn from(key: VerseKey) -> Self {
        VerseKeyDto {
            number_in_quran: key.number_in_quran,
            number_in_surah: key.number_in_surah,
            surah: key.surah,
        }
    }
}

/// The structured text messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Loads a surah, optionally landing on one of its verses.
    LoadSurah {
        surah: u16,
        #[serde(default)]
        verse: Option<u16>,
    },
    LoadJuz { juz: u16 },
    JumpToVerse { verse: u16 },
    NavigateNext,
    NavigatePrevious,
    NextPage,
    PreviousPage,
    JumpToPage { page: usize },
    SetPagination { enabled: bool },
    UpdateReadingProgress { verse: u16 },

    /// The visible range of the list changed (inclusive indices).
    ViewportChanged { first: usize, last: usize },
    /// A `scroll_to` animation requested by the server has ended.
    ScrollAnimationFinished,

    ToggleBookmark { verse: VerseKeyDto },
    ToggleFavorite { verse: VerseKeyDto },
    UpdateNote { verse: VerseKeyDto, note: String },
    SelectVerse { verse: VerseKeyDto },
    ToggleNavigationPanel,
    ClearError,

    AddQuickJump { name: String },
    DeleteQuickJump { id: Uuid },
    OpenQuickJump { id: Uuid },

    DownloadAudio { verse: VerseKeyDto },
    PlayAudio { verse: VerseKeyDto },
    PauseAudio,
    StopAudio,

    UpdateKhatamProgress { surah: u16, verse: u16 },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

/// The structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The whole navigable sequence. Sent again whenever its contents change.
    Sequence { revision: u64, verses: Vec<VerseDto> },

    Status(StatusDto),

    /// Render-ready items of the current page, in pagination mode.
    Page {
        page: usize,
        total_pages: usize,
        items: Vec<ItemDto>,
    },

    /// Animate the list so that this index becomes visible.
    ScrollTo { index: usize },

    Error { message: String },
}

//=========================================================================================
// JSON Views
//=========================================================================================

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VerseDto {
    pub number_in_quran: u16,
    pub number_in_surah: u16,
    pub display_number: u16,
    pub is_bismillah: bool,
    pub surah: u16,
    pub juz: u16,
    pub ruku: u16,
    pub text_arabic: String,
    pub translations: BTreeMap<String, String>,
    pub bookmarked: bool,
    pub favorited: bool,
    pub note: String,
    pub sajda: bool,
    pub sajda_type: String,
    pub audio_path: String,
    pub is_surah_end: bool,
}

impl From<&Verse> for VerseDto {
    fn from(verse: &Verse) -> Self {
        VerseDto {
            number_in_quran: verse.number_in_quran,
            number_in_surah: verse.number_in_surah,
            display_number: verse.display_number(),
            is_bismillah: verse.is_bismillah_marker(),
            surah: verse.surah,
            juz: verse.juz,
            ruku: verse.ruku,
            text_arabic: verse.text_arabic.clone(),
            translations: verse.translations.clone(),
            bookmarked: verse.bookmarked,
            favorited: verse.favorited,
            note: verse.note.clone(),
            sajda: verse.sajda,
            sajda_type: verse.sajda_type.clone(),
            audio_path: verse.audio_path.clone(),
            is_surah_end: verse.is_surah_end,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemDto {
    Header {
        surah: u16,
        name_arabic: String,
        name_english: String,
        bismillah: bool,
    },
    Bismillah {
        surah: u16,
    },
    Verse {
        verse: VerseDto,
        selected: bool,
    },
}

impl From<&SequenceItem> for ItemDto {
    fn from(item: &SequenceItem) -> Self {
        match item {
            SequenceItem::Header(header) => ItemDto::Header {
                surah: header.surah,
                name_arabic: header.name_arabic.clone(),
                name_english: header.name_english.clone(),
                bismillah: header.bismillah,
            },
            SequenceItem::Bismillah { surah } => ItemDto::Bismillah { surah: *surah },
            SequenceItem::Verse { verse, selected } => ItemDto::Verse {
                verse: verse.into(),
                selected: *selected,
            },
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ProgressDto {
    pub surah: u16,
    pub last_read_verse: u16,
    pub completion_percentage: f32,
    pub last_read_date: NaiveDate,
}

impl From<&ReadingProgress> for ProgressDto {
    fn from(progress: &ReadingProgress) -> Self {
        ProgressDto {
            surah: progress.surah,
            last_read_verse: progress.last_read_verse,
            completion_percentage: progress.completion_percentage,
            last_read_date: progress.last_read_date,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct QuickJumpDto {
    pub id: Uuid,
    pub name: String,
    pub surah: u16,
    pub verse: u16,
}

impl From<&QuickJump> for QuickJumpDto {
    fn from(quick_jump: &QuickJump) -> Self {
        QuickJumpDto {
            id: quick_jump.id,
            name: quick_jump.name.clone(),
            surah: quick_jump.surah,
            verse: quick_jump.verse,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct KhatamSessionDto {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub is_completed: bool,
    pub current_surah: u16,
    pub current_verse: u16,
    pub total_verses_read: u32,
}

impl From<&KhatamSession> for KhatamSessionDto {
    fn from(session: &KhatamSession) -> Self {
        KhatamSessionDto {
            id: session.id,
            name: session.name.clone(),
            start_date: session.start_date,
            is_completed: session.is_completed,
            current_surah: session.current_surah,
            current_verse: session.current_verse,
            total_verses_read: session.total_verses_read,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct KhatamDto {
    pub session: Option<KhatamSessionDto>,
    pub completion_percentage: f32,
    pub is_complete: bool,
    pub verses_read_today: u32,
    /// Today's furthest (surah, verse), when anything was read today.
    pub today_surah: Option<u16>,
    pub today_verse: Option<u16>,
}

impl From<&KhatamOverview> for KhatamDto {
    fn from(overview: &KhatamOverview) -> Self {
        KhatamDto {
            session: overview.session.as_ref().map(KhatamSessionDto::from),
            completion_percentage: overview.completion_percentage(),
            is_complete: overview.is_complete(),
            verses_read_today: overview.verses_read_today,
            today_surah: overview.today_best.map(|(surah, _)| surah),
            today_verse: overview.today_best.map(|(_, verse)| verse),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AudioDto {
    pub is_playing: bool,
    pub is_paused: bool,
    pub is_downloading: bool,
    pub download_progress: f32,
    pub current_path: String,
    pub playing: Option<VerseKeyDto>,
}

impl From<&AudioState> for AudioDto {
    fn from(audio: &AudioState) -> Self {
        AudioDto {
            is_playing: audio.is_playing,
            is_paused: audio.is_paused,
            is_downloading: audio.is_downloading,
            download_progress: audio.download_progress,
            current_path: audio.current_path.clone(),
            playing: audio.playing.map(VerseKeyDto::from),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SurahDto {
    pub number: u16,
    pub verse_count: u16,
    pub name_arabic: String,
    pub name_english: String,
}

impl From<&SurahMeta> for SurahDto {
    fn from(meta: &SurahMeta) -> Self {
        SurahDto {
            number: meta.number,
            verse_count: meta.verse_count,
            name_arabic: meta.name_arabic.clone(),
            name_english: meta.name_english.clone(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NavigationDto {
    pub quick_jumps: Vec<QuickJumpDto>,
    pub bookmarked: Vec<u16>,
    pub favorited: Vec<u16>,
    pub noted: Vec<u16>,
    pub total_verses: u16,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PaginationDto {
    pub enabled: bool,
    pub verses_per_page: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Everything the client shows around the list.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusDto {
    /// `"surah"` or `"juz"`, absent before the first load.
    pub mode: Option<String>,
    pub number: Option<u16>,
    pub surah: Option<SurahDto>,
    pub juz: Option<u16>,
    pub current_index: usize,
    pub current_verse: Option<VerseKeyDto>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub show_navigation_panel: bool,
    pub selected: Option<VerseKeyDto>,
    pub pagination: PaginationDto,
    pub progress: Option<ProgressDto>,
    pub navigation: NavigationDto,
    pub khatam: KhatamDto,
    pub audio: AudioDto,
}

impl From<&ReaderState> for StatusDto {
    fn from(state: &ReaderState) -> Self {
        let mode = state.target.map(|target| match target {
            LoadTarget::Surah(_) => "surah".to_string(),
            LoadTarget::Juz(_) => "juz".to_string(),
        });
        StatusDto {
            mode,
            number: state.target.map(|target| target.number()),
            surah: state.surah.as_ref().map(SurahDto::from),
            juz: state.juz.as_ref().map(|juz| juz.number),
            current_index: state.current_index(),
            current_verse: state.current_verse().map(|verse| verse.key().into()),
            is_loading: state.is_loading,
            error: state.error.clone(),
            show_navigation_panel: state.show_navigation_panel,
            selected: state.selected.map(VerseKeyDto::from),
            pagination: PaginationDto {
                enabled: state.pagination.enabled,
                verses_per_page: state.pagination.verses_per_page,
                current_page: state.current_page(),
                total_pages: state.total_pages(),
            },
            progress: state
                .current_surah()
                .and_then(|surah| state.stored_progress(surah))
                .map(ProgressDto::from),
            navigation: NavigationDto {
                quick_jumps: state.navigation.quick_jumps.iter().map(QuickJumpDto::from).collect(),
                bookmarked: state.navigation.bookmarked.clone(),
                favorited: state.navigation.favorited.clone(),
                noted: state.navigation.noted.clone(),
                total_verses: state.navigation.total_verses,
            },
            khatam: KhatamDto::from(&state.khatam.overview),
            audio: AudioDto::from(&state.audio),
        }
    }
}

impl ServerMessage {
    pub fn sequence(state: &ReaderState) -> Self {
        ServerMessage::Sequence {
            revision: state.content_revision,
            verses: state.sequence().iter().map(VerseDto::from).collect(),
        }
    }

    pub fn page(state: &ReaderState) -> Self {
        ServerMessage::Page {
            page: state.current_page(),
            total_pages: state.total_pages(),
            items: state.page_items().iter().map(ItemDto::from).collect(),
        }
    }
}
