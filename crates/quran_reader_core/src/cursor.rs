//! crates/quran_reader_core/src/cursor.rs
//!
//! The reading cursor: the single source of truth for "which verse is current".
//!
//! `ReaderState` is a synchronous state machine. Reader intents arrive as
//! `ReaderEvent`s and are dispatched by `ReaderState::handle`, which mutates the
//! in-memory state and returns the `Effect`s (persistence, fetches, programmatic
//! scrolls) the host must carry out. Results of those effects come back through
//! the `apply_*` methods. Nothing in here awaits.

use crate::compositor;
use crate::domain::{
    AudioState, JuzMeta, QuickJump, ReadingProgress, SequenceItem, SurahMeta, Verse, VerseKey,
};
use crate::error::ReaderError;
use crate::khatam::{self, KhatamOverview, UpdateGuard};
use crate::sequence;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub const JUZ_COUNT: u16 = 30;

//=========================================================================================
// Load Requests
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Surah(u16),
    Juz(u16),
}

impl LoadTarget {
    pub fn number(&self) -> u16 {
        match self {
            LoadTarget::Surah(number) | LoadTarget::Juz(number) => *number,
        }
    }

    pub fn is_surah(&self) -> bool {
        matches!(self, LoadTarget::Surah(_))
    }

    fn next(&self) -> Option<LoadTarget> {
        match *self {
            LoadTarget::Surah(n) if n < khatam::SURAH_COUNT => Some(LoadTarget::Surah(n + 1)),
            LoadTarget::Juz(n) if n < JUZ_COUNT => Some(LoadTarget::Juz(n + 1)),
            _ => None,
        }
    }

    fn previous(&self) -> Option<LoadTarget> {
        match *self {
            LoadTarget::Surah(n) if n > 1 => Some(LoadTarget::Surah(n - 1)),
            LoadTarget::Juz(n) if n > 1 => Some(LoadTarget::Juz(n - 1)),
            _ => None,
        }
    }
}

/// Where the cursor lands once a load completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Start,
    /// Last page in pagination mode, last entry otherwise.
    End,
    /// The entry with this verse-in-surah number.
    Verse(u16),
}

/// Identifies one load request. Only the most recent ticket may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: u64,
    pub target: LoadTarget,
    pub anchor: Anchor,
}

/// Raw fetch results for a load, before the sequence builder runs.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedContent {
    pub verses: Vec<Verse>,
    pub surah: SurahMeta,
    pub juz: JuzMeta,
    /// Metadata of every surah the verses touch, for page headers.
    pub surahs: Vec<SurahMeta>,
}

//=========================================================================================
// Events and Effects
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Bookmark(bool),
    Favorite(bool),
    Note(String),
}

/// Every intent the reader can express.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    Load { target: LoadTarget, anchor: Anchor },
    JumpToVerse(u16),
    NavigateNext,
    NavigatePrevious,
    /// Programmatic index change, rejected when out of range.
    SetIndex(usize),
    /// The visible list settled on a new top item through an organic scroll.
    ScrollSettled(usize),
    UpdateReadingProgress(u16),
    SetPagination(bool),
    NextPage,
    PreviousPage,
    JumpToPage(usize),
    SelectVerse(VerseKey),
    ToggleNavigationPanel,
    ClearError,
    ToggleBookmark(VerseKey),
    ToggleFavorite(VerseKey),
    UpdateNote { verse: VerseKey, note: String },
    AddQuickJump(String),
    DeleteQuickJump(Uuid),
    OpenQuickJump(Uuid),
    DownloadAudio(VerseKey),
    PlayAudio(VerseKey),
    PauseAudio,
    StopAudio,
    UpdateKhatamProgress { surah: u16, verse: u16 },
}

/// Work the host must perform on behalf of the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(LoadTicket),
    /// Bring this index into view. Never emitted for organic scrolls.
    ScrollTo(usize),
    PersistProgress(ReadingProgress),
    RecordKhatam { session_id: Uuid, surah: u16, verse: u16 },
    RefreshNavigation { surah: u16 },
    RefreshKhatam,
    SaveAnnotation { verse: VerseKey, annotation: Annotation },
    SaveQuickJump(QuickJump),
    DeleteQuickJump(Uuid),
    DownloadAudio(VerseKey),
    PlayAudio { verse: VerseKey, path: String },
    PauseAudio,
    StopAudio,
}

//=========================================================================================
// State
//=========================================================================================

/// Reader-facing knobs, resolved by the host from its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderSettings {
    pub verses_per_page: usize,
    /// Quiet period after a programmatic scroll before organic scrolls count again.
    pub settle: Duration,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            verses_per_page: 10,
            settle: crate::debouncer::DEFAULT_SETTLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub enabled: bool,
    pub verses_per_page: usize,
}

/// Per-surah side data shown by the navigation panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationData {
    pub quick_jumps: Vec<QuickJump>,
    pub stored_progress: Option<ReadingProgress>,
    pub bookmarked: Vec<u16>,
    pub favorited: Vec<u16>,
    pub noted: Vec<u16>,
    pub total_verses: u16,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KhatamView {
    pub overview: KhatamOverview,
    pub guard: UpdateGuard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReaderState {
    sequence: Arc<Vec<Verse>>,
    current_index: usize,
    pub target: Option<LoadTarget>,
    pub surah: Option<SurahMeta>,
    pub juz: Option<JuzMeta>,
    pub surahs_in_view: Vec<SurahMeta>,
    pub pagination: Pagination,
    pub is_loading: bool,
    pub error: Option<String>,
    pub show_navigation_panel: bool,
    pub selected: Option<VerseKey>,
    /// Forward-only mirror of reading progress, one record per surah.
    pub progress: BTreeMap<u16, ReadingProgress>,
    pub navigation: NavigationData,
    pub khatam: KhatamView,
    pub audio: AudioState,
    /// Bumped whenever the sequence contents change.
    pub content_revision: u64,
    latest_load: u64,
}

impl ReaderState {
    pub fn new(verses_per_page: usize) -> Self {
        Self {
            sequence: Arc::new(Vec::new()),
            current_index: 0,
            target: None,
            surah: None,
            juz: None,
            surahs_in_view: Vec::new(),
            pagination: Pagination {
                enabled: false,
                verses_per_page: verses_per_page.max(1),
            },
            is_loading: false,
            error: None,
            show_navigation_panel: false,
            selected: None,
            progress: BTreeMap::new(),
            navigation: NavigationData::default(),
            khatam: KhatamView::default(),
            audio: AudioState::default(),
            content_revision: 0,
            latest_load: 0,
        }
    }

    //-------------------------------------------------------------------------------------
    // Read access
    //-------------------------------------------------------------------------------------

    pub fn is_loaded(&self) -> bool {
        !self.sequence.is_empty()
    }

    pub fn sequence(&self) -> &Arc<Vec<Verse>> {
        &self.sequence
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_verse(&self) -> Option<&Verse> {
        self.sequence.get(self.current_index)
    }

    /// Surah of the current entry, falling back to the loaded surah.
    pub fn current_surah(&self) -> Option<u16> {
        self.current_verse()
            .map(|verse| verse.surah)
            .or_else(|| self.surah.as_ref().map(|meta| meta.number))
    }

    pub fn position_of(&self, key: VerseKey) -> Option<usize> {
        self.sequence.iter().position(|verse| verse.key() == key)
    }

    pub fn current_page(&self) -> usize {
        if self.sequence.is_empty() {
            return 0;
        }
        self.current_index / self.pagination.verses_per_page + 1
    }

    pub fn total_pages(&self) -> usize {
        self.sequence.len().div_ceil(self.pagination.verses_per_page)
    }

    /// The entries of the current page.
    pub fn page_window(&self) -> &[Verse] {
        if self.sequence.is_empty() {
            return &[];
        }
        let start = (self.current_page() - 1) * self.pagination.verses_per_page;
        let end = (start + self.pagination.verses_per_page).min(self.sequence.len());
        &self.sequence[start..end]
    }

    /// The current page as render-ready items, headers and Bismillah included.
    pub fn page_items(&self) -> Vec<SequenceItem> {
        let verses: Vec<Verse> = self
            .page_window()
            .iter()
            .filter(|verse| !verse.is_bismillah_marker())
            .cloned()
            .collect();
        let headers = compositor::headers_for_page(&verses, &self.surahs_in_view);
        compositor::compose_page(&verses, &headers, self.selected)
    }

    pub fn stored_progress(&self, surah: u16) -> Option<&ReadingProgress> {
        self.progress.get(&surah)
    }

    fn total_verses_of(&self, surah: u16) -> Option<u16> {
        match &self.surah {
            Some(meta) if meta.number == surah && meta.verse_count > 0 => Some(meta.verse_count),
            _ => khatam::verse_count(surah),
        }
    }

    //-------------------------------------------------------------------------------------
    // Event dispatch
    //-------------------------------------------------------------------------------------

    /// Applies one reader intent. `today` dates any progress it records.
    pub fn handle(
        &mut self,
        event: ReaderEvent,
        today: NaiveDate,
    ) -> Result<Vec<Effect>, ReaderError> {
        match event {
            ReaderEvent::Load { target, anchor } => Ok(vec![Effect::Fetch(self.begin_load(target, anchor))]),
            ReaderEvent::JumpToVerse(verse) => self.jump_to_verse(verse, today),
            ReaderEvent::NavigateNext => Ok(self.navigate_next(today)),
            ReaderEvent::NavigatePrevious => Ok(self.navigate_previous(today)),
            ReaderEvent::SetIndex(index) => self.set_index(index).map(|_| vec![Effect::ScrollTo(index)]),
            ReaderEvent::ScrollSettled(index) => self.scroll_settled(index, today),
            ReaderEvent::UpdateReadingProgress(verse) => Ok(self.update_reading_progress(verse, today)),
            ReaderEvent::SetPagination(enabled) => {
                self.pagination.enabled = enabled;
                Ok(Vec::new())
            }
            ReaderEvent::NextPage => self.next_page(today),
            ReaderEvent::PreviousPage => self.previous_page(today),
            ReaderEvent::JumpToPage(page) => self.jump_to_page(page, today),
            ReaderEvent::SelectVerse(key) => {
                self.selected = Some(key);
                Ok(Vec::new())
            }
            ReaderEvent::ToggleNavigationPanel => {
                self.show_navigation_panel = !self.show_navigation_panel;
                Ok(Vec::new())
            }
            ReaderEvent::ClearError => {
                self.error = None;
                Ok(Vec::new())
            }
            ReaderEvent::ToggleBookmark(key) => {
                let verse = self.annotatable(key)?;
                let annotation = Annotation::Bookmark(!verse.bookmarked);
                Ok(vec![Effect::SaveAnnotation { verse: key, annotation }])
            }
            ReaderEvent::ToggleFavorite(key) => {
                let verse = self.annotatable(key)?;
                let annotation = Annotation::Favorite(!verse.favorited);
                Ok(vec![Effect::SaveAnnotation { verse: key, annotation }])
            }
            ReaderEvent::UpdateNote { verse, note } => {
                self.annotatable(verse)?;
                Ok(vec![Effect::SaveAnnotation {
                    verse,
                    annotation: Annotation::Note(note),
                }])
            }
            ReaderEvent::AddQuickJump(name) => Ok(self.add_quick_jump(name)),
            ReaderEvent::DeleteQuickJump(id) => Ok(vec![Effect::DeleteQuickJump(id)]),
            ReaderEvent::OpenQuickJump(id) => self.open_quick_jump(id, today),
            ReaderEvent::DownloadAudio(key) => {
                let verse = self.annotatable(key)?;
                if self.audio.is_downloading {
                    debug!("Download already running, ignoring request for {}:{}", verse.surah, verse.number_in_surah);
                    return Ok(Vec::new());
                }
                self.audio.is_downloading = true;
                self.audio.download_progress = 0.0;
                Ok(vec![Effect::DownloadAudio(key)])
            }
            ReaderEvent::PlayAudio(key) => self.play_audio(key),
            ReaderEvent::PauseAudio => Ok(if self.audio.is_playing {
                vec![Effect::PauseAudio]
            } else {
                Vec::new()
            }),
            ReaderEvent::StopAudio => Ok(vec![Effect::StopAudio]),
            ReaderEvent::UpdateKhatamProgress { surah, verse } => Ok(self.record_khatam(surah, verse)),
        }
    }

    //-------------------------------------------------------------------------------------
    // Loading
    //-------------------------------------------------------------------------------------

    /// Starts a load. The loaded content stays untouched until the matching
    /// ticket is applied.
    pub fn begin_load(&mut self, target: LoadTarget, anchor: Anchor) -> LoadTicket {
        self.latest_load += 1;
        self.is_loading = true;
        self.error = None;
        LoadTicket {
            id: self.latest_load,
            target,
            anchor,
        }
    }

    /// Replaces the whole cursor with freshly loaded content.
    pub fn apply_loaded(
        &mut self,
        ticket: LoadTicket,
        content: LoadedContent,
        today: NaiveDate,
    ) -> Result<Vec<Effect>, ReaderError> {
        self.check_ticket(ticket)?;

        let sequence = if ticket.target.is_surah() {
            sequence::build_surah_sequence(content.verses)
        } else {
            sequence::build_juz_sequence(content.verses)
        };
        if sequence.is_empty() {
            let error = ReaderError::Load(format!("No verses found for {:?}", ticket.target));
            self.is_loading = false;
            self.error = Some(error.to_string());
            return Err(error);
        }

        let total_verses = content.surah.verse_count;
        self.sequence = Arc::new(sequence);
        self.target = Some(ticket.target);
        self.surah = Some(content.surah);
        self.juz = Some(content.juz);
        self.surahs_in_view = content.surahs;
        self.selected = None;
        self.is_loading = false;
        self.error = None;
        self.navigation = NavigationData {
            total_verses,
            ..NavigationData::default()
        };
        self.content_revision += 1;

        let index = self.anchor_index(ticket.anchor);
        self.current_index = index;

        let surah = self.current_surah().unwrap_or_default();
        let mut effects = vec![
            Effect::RefreshNavigation { surah },
            Effect::RefreshKhatam,
            Effect::ScrollTo(index),
        ];
        if let Anchor::Verse(_) = ticket.anchor {
            let landed = &self.sequence[index];
            if !landed.is_bismillah_marker() {
                let (surah, verse) = (landed.surah, landed.number_in_surah);
                effects.extend(self.progress_for(surah, verse, today));
            }
        }
        Ok(effects)
    }

    /// Records a failed load. The previously loaded content stays usable.
    pub fn apply_load_failed(&mut self, ticket: LoadTicket, message: String) -> Result<(), ReaderError> {
        self.check_ticket(ticket)?;
        self.is_loading = false;
        self.error = Some(message);
        Ok(())
    }

    fn check_ticket(&self, ticket: LoadTicket) -> Result<(), ReaderError> {
        if ticket.id != self.latest_load {
            debug!("Discarding load {} superseded by load {}", ticket.id, self.latest_load);
            return Err(ReaderError::StaleLoad {
                ticket: ticket.id,
                latest: self.latest_load,
            });
        }
        Ok(())
    }

    fn anchor_index(&self, anchor: Anchor) -> usize {
        let last = self.sequence.len().saturating_sub(1);
        match anchor {
            Anchor::Start => 0,
            Anchor::End if self.pagination.enabled => {
                (self.total_pages().saturating_sub(1)) * self.pagination.verses_per_page
            }
            Anchor::End => last,
            Anchor::Verse(verse) => self
                .sequence
                .iter()
                .position(|entry| entry.number_in_surah == verse)
                .unwrap_or(0),
        }
    }

    //-------------------------------------------------------------------------------------
    // Cursor movement
    //-------------------------------------------------------------------------------------

    /// Sets the index without side effects. Out-of-range values leave the state unchanged.
    pub fn set_index(&mut self, index: usize) -> Result<(), ReaderError> {
        if index >= self.sequence.len() {
            return Err(ReaderError::OutOfRange {
                index,
                len: self.sequence.len(),
            });
        }
        self.current_index = index;
        Ok(())
    }

    /// Moves to `index` and reports the landed verse as read.
    fn land(&mut self, index: usize, today: NaiveDate, scroll: bool) -> Result<Vec<Effect>, ReaderError> {
        self.set_index(index)?;
        let mut effects = Vec::new();
        if scroll {
            effects.push(Effect::ScrollTo(index));
        }
        let landed = self.sequence[index].clone();
        if !landed.is_bismillah_marker() {
            effects.extend(self.progress_for(landed.surah, landed.number_in_surah, today));
        }
        Ok(effects)
    }

    fn jump_to_verse(&mut self, verse: u16, today: NaiveDate) -> Result<Vec<Effect>, ReaderError> {
        match self.sequence.iter().position(|entry| entry.number_in_surah == verse) {
            Some(index) => self.land(index, today, true),
            None => {
                let available: Vec<u16> = self.sequence.iter().map(|v| v.number_in_surah).collect();
                warn!("Could not find verse {} in the sequence, available: {:?}", verse, available);
                Err(ReaderError::VerseNotFound { verse })
            }
        }
    }

    fn navigate_next(&mut self, today: NaiveDate) -> Vec<Effect> {
        if self.current_index + 1 >= self.sequence.len() {
            return Vec::new();
        }
        self.land(self.current_index + 1, today, true).unwrap_or_default()
    }

    fn navigate_previous(&mut self, today: NaiveDate) -> Vec<Effect> {
        if self.current_index == 0 {
            return Vec::new();
        }
        self.land(self.current_index - 1, today, true).unwrap_or_default()
    }

    fn scroll_settled(&mut self, index: usize, today: NaiveDate) -> Result<Vec<Effect>, ReaderError> {
        if index == self.current_index && index < self.sequence.len() {
            return Ok(Vec::new());
        }
        self.land(index, today, false)
    }

    //-------------------------------------------------------------------------------------
    // Pagination
    //-------------------------------------------------------------------------------------

    fn jump_to_page(&mut self, page: usize, today: NaiveDate) -> Result<Vec<Effect>, ReaderError> {
        let total = self.total_pages();
        if total == 0 {
            return Err(ReaderError::NotLoaded);
        }
        let page = page.clamp(1, total);
        self.land((page - 1) * self.pagination.verses_per_page, today, true)
    }

    fn next_page(&mut self, today: NaiveDate) -> Result<Vec<Effect>, ReaderError> {
        self.require_pagination()?;
        if self.current_page() < self.total_pages() {
            return self.jump_to_page(self.current_page() + 1, today);
        }
        Ok(self.boundary_load(self.target.and_then(|t| t.next()), Anchor::Start))
    }

    fn previous_page(&mut self, today: NaiveDate) -> Result<Vec<Effect>, ReaderError> {
        self.require_pagination()?;
        if self.current_page() > 1 {
            return self.jump_to_page(self.current_page() - 1, today);
        }
        Ok(self.boundary_load(self.target.and_then(|t| t.previous()), Anchor::End))
    }

    fn require_pagination(&self) -> Result<(), ReaderError> {
        if !self.is_loaded() {
            return Err(ReaderError::NotLoaded);
        }
        if !self.pagination.enabled {
            return Err(ReaderError::PaginationDisabled);
        }
        Ok(())
    }

    fn boundary_load(&mut self, target: Option<LoadTarget>, anchor: Anchor) -> Vec<Effect> {
        match target {
            Some(target) => vec![Effect::Fetch(self.begin_load(target, anchor))],
            None => Vec::new(),
        }
    }

    //-------------------------------------------------------------------------------------
    // Reading progress
    //-------------------------------------------------------------------------------------

    /// Forward-only progress for the current surah.
    pub fn update_reading_progress(&mut self, verse: u16, today: NaiveDate) -> Vec<Effect> {
        match self.current_surah() {
            Some(surah) => self.progress_for(surah, verse, today),
            None => Vec::new(),
        }
    }

    fn progress_for(&mut self, surah: u16, verse: u16, today: NaiveDate) -> Vec<Effect> {
        let Some(total) = self.total_verses_of(surah) else {
            return Vec::new();
        };
        let verse = verse.min(total);
        if verse == 0 {
            return Vec::new();
        }
        if self
            .progress
            .get(&surah)
            .is_some_and(|existing| verse <= existing.last_read_verse)
        {
            return Vec::new();
        }
        let progress = ReadingProgress {
            surah,
            last_read_verse: verse,
            completion_percentage: f32::from(verse) / f32::from(total) * 100.0,
            last_read_date: today,
        };
        self.progress.insert(surah, progress.clone());
        vec![Effect::PersistProgress(progress)]
    }

    /// Merges a stored record, keeping whichever is further along.
    pub fn apply_stored_progress(&mut self, stored: ReadingProgress) {
        let keep_local = self
            .progress
            .get(&stored.surah)
            .is_some_and(|local| local.last_read_verse >= stored.last_read_verse);
        if !keep_local {
            self.progress.insert(stored.surah, stored);
        }
    }

    //-------------------------------------------------------------------------------------
    // Navigation data, annotations and quick jumps
    //-------------------------------------------------------------------------------------

    pub fn apply_navigation(&mut self, surah: u16, mut navigation: NavigationData) {
        if self.current_surah() != Some(surah) {
            debug!("Dropping navigation data of surah {} no longer shown", surah);
            return;
        }
        if let Some(stored) = navigation.stored_progress.clone() {
            self.apply_stored_progress(stored);
        }
        if navigation.total_verses == 0 {
            navigation.total_verses = self.navigation.total_verses;
        }
        self.navigation = navigation;
    }

    fn annotatable(&self, key: VerseKey) -> Result<&Verse, ReaderError> {
        self.sequence
            .iter()
            .find(|verse| verse.key() == key && !verse.is_bismillah_marker())
            .ok_or(ReaderError::VerseNotFound {
                verse: key.number_in_surah,
            })
    }

    /// Mirrors a successfully persisted annotation into the sequence.
    pub fn apply_annotation(&mut self, key: VerseKey, annotation: &Annotation) {
        let sequence = Arc::make_mut(&mut self.sequence);
        let Some(verse) = sequence
            .iter_mut()
            .find(|verse| verse.number_in_quran == key.number_in_quran && !verse.is_bismillah_marker())
        else {
            return;
        };
        let number = verse.number_in_surah;
        let (list, flag) = match annotation {
            Annotation::Bookmark(on) => {
                verse.bookmarked = *on;
                (&mut self.navigation.bookmarked, *on)
            }
            Annotation::Favorite(on) => {
                verse.favorited = *on;
                (&mut self.navigation.favorited, *on)
            }
            Annotation::Note(note) => {
                verse.note = note.clone();
                (&mut self.navigation.noted, !note.is_empty())
            }
        };
        list.retain(|&n| n != number);
        if flag {
            list.push(number);
            list.sort_unstable();
        }
        self.content_revision += 1;
    }

    fn add_quick_jump(&mut self, name: String) -> Vec<Effect> {
        let Some(verse) = self.current_verse() else {
            return Vec::new();
        };
        vec![Effect::SaveQuickJump(QuickJump {
            id: Uuid::new_v4(),
            name,
            surah: verse.surah,
            verse: verse.number_in_surah,
        })]
    }

    fn open_quick_jump(&mut self, id: Uuid, today: NaiveDate) -> Result<Vec<Effect>, ReaderError> {
        let quick_jump = self
            .navigation
            .quick_jumps
            .iter()
            .find(|quick_jump| quick_jump.id == id)
            .cloned()
            .ok_or(ReaderError::QuickJumpNotFound(id))?;
        let index = self
            .sequence
            .iter()
            .position(|v| v.surah == quick_jump.surah && v.number_in_surah == quick_jump.verse);
        match index {
            Some(index) => self.land(index, today, true),
            None => Ok(vec![Effect::Fetch(self.begin_load(
                LoadTarget::Surah(quick_jump.surah),
                Anchor::Verse(quick_jump.verse),
            ))]),
        }
    }

    //-------------------------------------------------------------------------------------
    // Khatam
    //-------------------------------------------------------------------------------------

    fn record_khatam(&mut self, surah: u16, verse: u16) -> Vec<Effect> {
        let Some(session) = self.khatam.overview.session.as_ref() else {
            return Vec::new();
        };
        let session_id = session.id;
        if !self.khatam.guard.try_begin() {
            debug!("Khatam update for {}:{} rejected, another one is in flight", surah, verse);
            return Vec::new();
        }
        vec![Effect::RecordKhatam {
            session_id,
            surah,
            verse,
        }]
    }

    pub fn apply_khatam(&mut self, overview: KhatamOverview) {
        self.khatam.overview = overview;
    }

    /// Ends the in-flight khatam update, with its refreshed overview when it succeeded.
    pub fn finish_khatam_update(&mut self, overview: Option<KhatamOverview>) {
        self.khatam.guard.finish();
        if let Some(overview) = overview {
            self.khatam.overview = overview;
        }
    }

    //-------------------------------------------------------------------------------------
    // Audio
    //-------------------------------------------------------------------------------------

    fn play_audio(&mut self, key: VerseKey) -> Result<Vec<Effect>, ReaderError> {
        let path = self.annotatable(key)?.audio_path.clone();
        if path.is_empty() {
            self.error = Some("No audio file available".to_string());
            return Ok(Vec::new());
        }
        Ok(vec![Effect::PlayAudio { verse: key, path }])
    }

    pub fn apply_download_progress(&mut self, percent: f32) {
        if self.audio.is_downloading {
            self.audio.download_progress = percent.clamp(0.0, 100.0);
        }
    }

    pub fn apply_download_complete(&mut self, key: VerseKey, path: String) {
        self.audio.is_downloading = false;
        self.audio.download_progress = 100.0;
        self.audio.current_path = path.clone();
        let sequence = Arc::make_mut(&mut self.sequence);
        if let Some(verse) = sequence
            .iter_mut()
            .find(|verse| verse.number_in_quran == key.number_in_quran && !verse.is_bismillah_marker())
        {
            verse.audio_path = path;
            self.content_revision += 1;
        }
    }

    pub fn apply_download_failed(&mut self, message: String) {
        self.audio.is_downloading = false;
        self.error = Some(message);
    }

    pub fn apply_playing(&mut self, key: VerseKey, path: String) {
        self.audio.is_playing = true;
        self.audio.is_paused = false;
        self.audio.playing = Some(key);
        self.audio.current_path = path;
    }

    pub fn apply_paused(&mut self) {
        self.audio.is_playing = false;
        self.audio.is_paused = true;
    }

    pub fn apply_stopped(&mut self) {
        self.audio.is_playing = false;
        self.audio.is_paused = false;
        self.audio.playing = None;
    }

    /// Surfaces a failure of an asynchronous operation without touching the content.
    pub fn fail(&mut self, message: String) {
        self.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KhatamSession;
    use crate::sequence::tests::{surah, verse};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
    }

    fn meta(number: u16) -> SurahMeta {
        SurahMeta {
            number,
            verse_count: khatam::verse_count(number).unwrap(),
            name_arabic: String::new(),
            name_english: format!("Surah {number}"),
        }
    }

    fn juz_meta(number: u16) -> JuzMeta {
        JuzMeta {
            number,
            name_arabic: String::new(),
            start_surah: 1,
            start_verse: 1,
        }
    }

    fn content(number: u16) -> LoadedContent {
        LoadedContent {
            verses: surah(number),
            surah: meta(number),
            juz: juz_meta(1),
            surahs: vec![meta(number)],
        }
    }

    fn loaded(number: u16, verses_per_page: usize) -> ReaderState {
        let mut state = ReaderState::new(verses_per_page);
        let ticket = state.begin_load(LoadTarget::Surah(number), Anchor::Start);
        state.apply_loaded(ticket, content(number), today()).unwrap();
        state
    }

    fn persisted(effects: &[Effect]) -> Vec<u16> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::PersistProgress(p) => Some(p.last_read_verse),
                _ => None,
            })
            .collect()
    }

    fn active_session() -> KhatamOverview {
        KhatamOverview {
            session: Some(KhatamSession {
                id: Uuid::nil(),
                name: "Ramadan".to_string(),
                start_date: today(),
                is_active: true,
                is_completed: false,
                current_surah: 1,
                current_verse: 1,
                total_verses_read: 0,
            }),
            today_best: None,
            verses_read_today: 0,
        }
    }

    #[rstest]
    #[case(1, 7)]
    #[case(2, 287)]
    #[case(9, 129)]
    fn load_builds_the_expected_sequence(#[case] number: u16, #[case] len: usize) {
        let state = loaded(number, 10);
        assert_eq!(state.sequence().len(), len);
        assert_eq!(state.current_index(), 0);
        assert!(!state.is_loading);
        assert_eq!(state.navigation.total_verses, khatam::verse_count(number).unwrap());
    }

    #[test]
    fn load_emits_refresh_effects() {
        let mut state = ReaderState::new(10);
        let ticket = state.begin_load(LoadTarget::Surah(36), Anchor::Start);
        assert!(state.is_loading);
        let effects = state.apply_loaded(ticket, content(36), today()).unwrap();
        assert_eq!(
            effects,
            vec![
                Effect::RefreshNavigation { surah: 36 },
                Effect::RefreshKhatam,
                Effect::ScrollTo(0),
            ]
        );
        assert_eq!(state.content_revision, 1);
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut state = ReaderState::new(10);
        let first = state.begin_load(LoadTarget::Surah(2), Anchor::Start);
        let second = state.begin_load(LoadTarget::Surah(3), Anchor::Start);
        state.apply_loaded(second, content(3), today()).unwrap();

        let result = state.apply_loaded(first, content(2), today());
        assert_eq!(result, Err(ReaderError::StaleLoad { ticket: 1, latest: 2 }));
        assert_eq!(state.surah.as_ref().map(|m| m.number), Some(3));
        assert_eq!(state.sequence().len(), 201);

        assert_eq!(
            state.apply_load_failed(first, "late".to_string()),
            Err(ReaderError::StaleLoad { ticket: 1, latest: 2 })
        );
        assert_eq!(state.error, None);
    }

    #[test]
    fn failed_load_keeps_previous_content() {
        let mut state = loaded(36, 10);
        state.set_index(12).unwrap();
        let ticket = state.begin_load(LoadTarget::Surah(37), Anchor::Start);
        state.apply_load_failed(ticket, "disk on fire".to_string()).unwrap();
        assert_eq!(state.error.as_deref(), Some("disk on fire"));
        assert!(!state.is_loading);
        assert_eq!(state.surah.as_ref().map(|m| m.number), Some(36));
        assert_eq!(state.current_index(), 12);
    }

    #[test]
    fn empty_load_is_a_failure() {
        let mut state = loaded(1, 10);
        let ticket = state.begin_load(LoadTarget::Juz(31), Anchor::Start);
        let empty = LoadedContent {
            verses: Vec::new(),
            surah: meta(1),
            juz: juz_meta(31),
            surahs: Vec::new(),
        };
        assert!(matches!(state.apply_loaded(ticket, empty, today()), Err(ReaderError::Load(_))));
        assert_eq!(state.sequence().len(), 7);
        assert!(state.error.is_some());
    }

    #[test]
    fn jump_lands_on_the_matching_entry() {
        let mut state = loaded(1, 10);
        let effects = state.handle(ReaderEvent::JumpToVerse(5), today()).unwrap();
        assert_eq!(state.current_index(), 4);
        assert_eq!(effects[0], Effect::ScrollTo(4));
        assert_eq!(persisted(&effects), vec![5]);

        let mut baqarah = loaded(2, 10);
        baqarah.handle(ReaderEvent::JumpToVerse(5), today()).unwrap();
        assert_eq!(baqarah.current_index(), 5);
    }

    #[test]
    fn jump_miss_changes_nothing() {
        let mut state = loaded(1, 10);
        state.set_index(2).unwrap();
        let result = state.handle(ReaderEvent::JumpToVerse(8), today());
        assert_eq!(result, Err(ReaderError::VerseNotFound { verse: 8 }));
        assert_eq!(state.current_index(), 2);
    }

    #[test]
    fn navigation_skips_progress_on_the_marker() {
        let mut state = loaded(2, 10);
        state.set_index(1).unwrap();
        let back = state.handle(ReaderEvent::NavigatePrevious, today()).unwrap();
        assert_eq!(state.current_index(), 0);
        assert_eq!(back, vec![Effect::ScrollTo(0)]);

        assert_eq!(state.handle(ReaderEvent::NavigatePrevious, today()).unwrap(), vec![]);
        assert_eq!(state.current_index(), 0);

        let forward = state.handle(ReaderEvent::NavigateNext, today()).unwrap();
        assert_eq!(state.current_index(), 1);
        assert_eq!(persisted(&forward), vec![1]);
    }

    #[test]
    fn navigate_next_stops_at_the_end() {
        let mut state = loaded(1, 10);
        state.set_index(6).unwrap();
        assert_eq!(state.handle(ReaderEvent::NavigateNext, today()).unwrap(), vec![]);
        assert_eq!(state.current_index(), 6);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut state = loaded(1, 10);
        state.set_index(3).unwrap();
        assert_eq!(
            state.handle(ReaderEvent::SetIndex(7), today()),
            Err(ReaderError::OutOfRange { index: 7, len: 7 })
        );
        assert_eq!(state.current_index(), 3);
        assert!(ReaderState::new(10).set_index(0).is_err());
    }

    #[test]
    fn progress_is_forward_only() {
        let mut state = loaded(1, 10);
        assert_eq!(persisted(&state.update_reading_progress(3, today())), vec![3]);
        assert_eq!(persisted(&state.update_reading_progress(2, today())), Vec::<u16>::new());
        assert_eq!(persisted(&state.update_reading_progress(3, today())), Vec::<u16>::new());
        assert_eq!(state.stored_progress(1).map(|p| p.last_read_verse), Some(3));
    }

    #[test]
    fn progress_is_capped_at_the_surah_length() {
        let mut state = loaded(1, 10);
        let effects = state.update_reading_progress(40, today());
        match effects.as_slice() {
            [Effect::PersistProgress(progress)] => {
                assert_eq!(progress.last_read_verse, 7);
                assert_eq!(progress.completion_percentage, 100.0);
                assert_eq!(progress.last_read_date, today());
            }
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn progress_of_any_sequence_is_the_running_max() {
        let mut state = loaded(2, 10);
        let inputs = [4u16, 9, 2, 9, 300, 17];
        for verse in inputs {
            state.update_reading_progress(verse, today());
        }
        assert_eq!(state.stored_progress(2).map(|p| p.last_read_verse), Some(286));
    }

    #[test]
    fn stored_progress_merges_forward_only() {
        let mut state = loaded(1, 10);
        state.update_reading_progress(4, today());
        let older = ReadingProgress {
            surah: 1,
            last_read_verse: 2,
            completion_percentage: 28.0,
            last_read_date: today(),
        };
        state.apply_stored_progress(older);
        assert_eq!(state.stored_progress(1).map(|p| p.last_read_verse), Some(4));

        let newer = ReadingProgress {
            last_read_verse: 6,
            ..state.stored_progress(1).cloned().unwrap()
        };
        state.apply_stored_progress(newer);
        assert_eq!(persisted(&state.update_reading_progress(5, today())), Vec::<u16>::new());
    }

    #[test]
    fn organic_scroll_updates_without_scrolling_back() {
        let mut state = loaded(2, 10);
        let effects = state.handle(ReaderEvent::ScrollSettled(10), today()).unwrap();
        assert_eq!(state.current_index(), 10);
        assert!(!effects.iter().any(|e| matches!(e, Effect::ScrollTo(_))));
        assert_eq!(persisted(&effects), vec![10]);

        let marker = state.handle(ReaderEvent::ScrollSettled(0), today()).unwrap();
        assert_eq!(marker, vec![]);
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn pages_are_derived_from_the_index() {
        let mut state = loaded(2, 10);
        state.handle(ReaderEvent::SetPagination(true), today()).unwrap();
        assert_eq!((state.current_page(), state.total_pages()), (1, 29));
        state.set_index(25).unwrap();
        assert_eq!(state.current_page(), 3);
        assert_eq!(state.page_window().len(), 10);

        state.handle(ReaderEvent::JumpToPage(99), today()).unwrap();
        assert_eq!(state.current_index(), 280);
        assert_eq!(state.page_window().len(), 7);
        state.handle(ReaderEvent::JumpToPage(0), today()).unwrap();
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn paging_moves_one_window() {
        let mut state = loaded(36, 10);
        state.handle(ReaderEvent::SetPagination(true), today()).unwrap();
        state.handle(ReaderEvent::NextPage, today()).unwrap();
        assert_eq!(state.current_index(), 10);
        state.handle(ReaderEvent::PreviousPage, today()).unwrap();
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn paging_past_the_edges_loads_the_neighbour() {
        let mut state = loaded(36, 10);
        state.handle(ReaderEvent::SetPagination(true), today()).unwrap();
        let back = state.handle(ReaderEvent::PreviousPage, today()).unwrap();
        assert_eq!(
            back,
            vec![Effect::Fetch(LoadTicket {
                id: 2,
                target: LoadTarget::Surah(35),
                anchor: Anchor::End,
            })]
        );

        state.handle(ReaderEvent::JumpToPage(9), today()).unwrap();
        let forward = state.handle(ReaderEvent::NextPage, today()).unwrap();
        assert!(matches!(
            forward.as_slice(),
            [Effect::Fetch(LoadTicket { target: LoadTarget::Surah(37), anchor: Anchor::Start, .. })]
        ));
    }

    #[test]
    fn paging_stops_at_the_quran_edges() {
        let mut state = loaded(114, 10);
        state.handle(ReaderEvent::SetPagination(true), today()).unwrap();
        assert_eq!(state.handle(ReaderEvent::NextPage, today()).unwrap(), vec![]);

        let mut first = loaded(1, 10);
        first.handle(ReaderEvent::SetPagination(true), today()).unwrap();
        assert_eq!(first.handle(ReaderEvent::PreviousPage, today()).unwrap(), vec![]);
    }

    #[test]
    fn paging_requires_pagination_mode() {
        let mut state = loaded(36, 10);
        assert_eq!(
            state.handle(ReaderEvent::NextPage, today()),
            Err(ReaderError::PaginationDisabled)
        );
    }

    #[test]
    fn end_anchor_lands_on_the_last_page() {
        let mut state = loaded(36, 10);
        state.handle(ReaderEvent::SetPagination(true), today()).unwrap();
        let ticket = state.begin_load(LoadTarget::Surah(35), Anchor::End);
        state.apply_loaded(ticket, content(35), today()).unwrap();
        // 45 verses + marker = 46 entries, 5 pages.
        assert_eq!(state.current_index(), 40);
        assert_eq!(state.current_page(), 5);
    }

    #[test]
    fn verse_anchor_lands_and_records_progress() {
        let mut state = ReaderState::new(10);
        let ticket = state.begin_load(LoadTarget::Surah(18), Anchor::Verse(10));
        let effects = state.apply_loaded(ticket, content(18), today()).unwrap();
        assert_eq!(state.current_index(), 10);
        assert_eq!(persisted(&effects), vec![10]);
    }

    #[test]
    fn missing_anchor_verse_records_the_landed_verse() {
        let mut state = ReaderState::new(10);
        let ticket = state.begin_load(LoadTarget::Surah(1), Anchor::Verse(40));
        let effects = state.apply_loaded(ticket, content(1), today()).unwrap();
        assert_eq!(state.current_index(), 0);
        assert_eq!(persisted(&effects), vec![1]);

        let ticket = state.begin_load(LoadTarget::Surah(18), Anchor::Verse(200));
        let effects = state.apply_loaded(ticket, content(18), today()).unwrap();
        assert_eq!(state.current_index(), 0);
        assert_eq!(persisted(&effects), vec![]);
    }

    #[test]
    fn page_items_interleave_headers() {
        let mut state = ReaderState::new(6);
        let ticket = state.begin_load(LoadTarget::Juz(30), Anchor::Start);
        let mut verses = vec![verse(112, 3, 30), verse(112, 4, 30)];
        verses.extend(surah(113));
        let juz = LoadedContent {
            verses,
            surah: meta(112),
            juz: juz_meta(30),
            surahs: vec![meta(112), meta(113)],
        };
        state.apply_loaded(ticket, juz, today()).unwrap();
        state.handle(ReaderEvent::SetPagination(true), today()).unwrap();
        let items = state.page_items();
        let headers = items
            .iter()
            .filter(|item| matches!(item, SequenceItem::Header(_)))
            .count();
        let bismillahs = items
            .iter()
            .filter(|item| matches!(item, SequenceItem::Bismillah { surah: 113 }))
            .count();
        assert_eq!((headers, bismillahs), (1, 1));
        assert_eq!(items.len(), 5 + headers + bismillahs);
    }

    #[test]
    fn annotations_update_the_sequence_and_lists() {
        let mut state = loaded(1, 10);
        let key = state.sequence()[2].key();
        let effects = state.handle(ReaderEvent::ToggleBookmark(key), today()).unwrap();
        assert_eq!(
            effects,
            vec![Effect::SaveAnnotation {
                verse: key,
                annotation: Annotation::Bookmark(true),
            }]
        );
        state.apply_annotation(key, &Annotation::Bookmark(true));
        state.apply_annotation(key, &Annotation::Note("reflect".to_string()));
        assert!(state.sequence()[2].bookmarked);
        assert_eq!(state.sequence()[2].note, "reflect");
        assert_eq!(state.navigation.bookmarked, vec![3]);
        assert_eq!(state.navigation.noted, vec![3]);

        state.apply_annotation(key, &Annotation::Note(String::new()));
        assert!(state.navigation.noted.is_empty());
    }

    #[test]
    fn markers_cannot_be_annotated() {
        let mut state = loaded(2, 10);
        let marker = state.sequence()[0].key();
        assert!(state.handle(ReaderEvent::ToggleFavorite(marker), today()).is_err());
    }

    #[test]
    fn quick_jumps_open_in_place_or_load() {
        let mut state = loaded(2, 10);
        state.set_index(3).unwrap();
        let effects = state.handle(ReaderEvent::AddQuickJump("Ayat".to_string()), today()).unwrap();
        let Some(Effect::SaveQuickJump(saved)) = effects.first().cloned() else {
            panic!("expected a quick jump to be saved");
        };
        assert_eq!((saved.surah, saved.verse), (2, 3));

        let elsewhere = QuickJump {
            id: Uuid::new_v4(),
            name: "Kahf".to_string(),
            surah: 18,
            verse: 10,
        };
        state.apply_navigation(
            2,
            NavigationData {
                quick_jumps: vec![saved.clone(), elsewhere.clone()],
                ..NavigationData::default()
            },
        );
        assert_eq!(state.navigation.total_verses, 286);

        state.set_index(0).unwrap();
        state.handle(ReaderEvent::OpenQuickJump(saved.id), today()).unwrap();
        assert_eq!(state.current_index(), 3);

        let load = state.handle(ReaderEvent::OpenQuickJump(elsewhere.id), today()).unwrap();
        assert!(matches!(
            load.as_slice(),
            [Effect::Fetch(LoadTicket { target: LoadTarget::Surah(18), anchor: Anchor::Verse(10), .. })]
        ));
        let unknown = Uuid::new_v4();
        assert_eq!(
            state.handle(ReaderEvent::OpenQuickJump(unknown), today()),
            Err(ReaderError::QuickJumpNotFound(unknown))
        );
    }

    #[test]
    fn navigation_for_another_surah_is_dropped() {
        let mut state = loaded(2, 10);
        state.apply_navigation(
            3,
            NavigationData {
                bookmarked: vec![1],
                ..NavigationData::default()
            },
        );
        assert!(state.navigation.bookmarked.is_empty());
    }

    #[test]
    fn khatam_updates_are_guarded() {
        let mut state = loaded(1, 10);
        let without_session = state
            .handle(ReaderEvent::UpdateKhatamProgress { surah: 1, verse: 3 }, today())
            .unwrap();
        assert_eq!(without_session, vec![]);

        state.apply_khatam(active_session());
        let first = state
            .handle(ReaderEvent::UpdateKhatamProgress { surah: 1, verse: 3 }, today())
            .unwrap();
        assert_eq!(
            first,
            vec![Effect::RecordKhatam {
                session_id: Uuid::nil(),
                surah: 1,
                verse: 3,
            }]
        );
        let second = state
            .handle(ReaderEvent::UpdateKhatamProgress { surah: 1, verse: 4 }, today())
            .unwrap();
        assert_eq!(second, vec![]);

        state.finish_khatam_update(None);
        let third = state
            .handle(ReaderEvent::UpdateKhatamProgress { surah: 1, verse: 4 }, today())
            .unwrap();
        assert_eq!(third.len(), 1);
    }

    #[test]
    fn moving_through_the_text_never_records_khatam() {
        let mut state = loaded(114, 10);
        state.apply_khatam(active_session());
        let mut effects = Vec::new();
        for _ in 0..10 {
            effects.extend(state.handle(ReaderEvent::NavigateNext, today()).unwrap());
        }
        effects.extend(state.handle(ReaderEvent::JumpToVerse(3), today()).unwrap());
        effects.extend(state.handle(ReaderEvent::ScrollSettled(5), today()).unwrap());
        effects.extend(state.handle(ReaderEvent::JumpToPage(1), today()).unwrap());

        assert!(!effects.iter().any(|e| matches!(e, Effect::RecordKhatam { .. })));
        assert!(!state.khatam.guard.is_in_flight());
        assert!(!persisted(&effects).is_empty());
    }

    #[test]
    fn audio_state_tracks_the_collaborator() {
        let mut state = loaded(1, 10);
        let key = state.sequence()[0].key();

        assert_eq!(state.handle(ReaderEvent::PlayAudio(key), today()).unwrap(), vec![]);
        assert_eq!(state.error.as_deref(), Some("No audio file available"));
        state.handle(ReaderEvent::ClearError, today()).unwrap();

        assert_eq!(
            state.handle(ReaderEvent::DownloadAudio(key), today()).unwrap(),
            vec![Effect::DownloadAudio(key)]
        );
        assert_eq!(state.handle(ReaderEvent::DownloadAudio(key), today()).unwrap(), vec![]);
        state.apply_download_progress(40.0);
        assert_eq!(state.audio.download_progress, 40.0);
        state.apply_download_complete(key, "/tmp/001001.mp3".to_string());
        assert!(!state.audio.is_downloading);
        assert_eq!(state.sequence()[0].audio_path, "/tmp/001001.mp3");

        let play = state.handle(ReaderEvent::PlayAudio(key), today()).unwrap();
        assert_eq!(
            play,
            vec![Effect::PlayAudio {
                verse: key,
                path: "/tmp/001001.mp3".to_string(),
            }]
        );
        assert_eq!(state.handle(ReaderEvent::PauseAudio, today()).unwrap(), vec![]);
        state.apply_playing(key, "/tmp/001001.mp3".to_string());
        assert_eq!(state.handle(ReaderEvent::PauseAudio, today()).unwrap(), vec![Effect::PauseAudio]);
        state.apply_paused();
        assert!(state.audio.is_paused);
        state.apply_stopped();
        assert_eq!(state.audio.playing, None);
    }

    #[test]
    fn every_event_is_dispatched_without_panicking() {
        let key = VerseKey {
            number_in_quran: 1,
            number_in_surah: 1,
            surah: 1,
        };
        let events = vec![
            ReaderEvent::Load { target: LoadTarget::Surah(1), anchor: Anchor::Start },
            ReaderEvent::JumpToVerse(1),
            ReaderEvent::NavigateNext,
            ReaderEvent::NavigatePrevious,
            ReaderEvent::SetIndex(0),
            ReaderEvent::ScrollSettled(1),
            ReaderEvent::UpdateReadingProgress(2),
            ReaderEvent::SetPagination(true),
            ReaderEvent::NextPage,
            ReaderEvent::PreviousPage,
            ReaderEvent::JumpToPage(1),
            ReaderEvent::SelectVerse(key),
            ReaderEvent::ToggleNavigationPanel,
            ReaderEvent::ClearError,
            ReaderEvent::ToggleBookmark(key),
            ReaderEvent::ToggleFavorite(key),
            ReaderEvent::UpdateNote { verse: key, note: "n".to_string() },
            ReaderEvent::AddQuickJump("q".to_string()),
            ReaderEvent::DeleteQuickJump(Uuid::nil()),
            ReaderEvent::OpenQuickJump(Uuid::nil()),
            ReaderEvent::DownloadAudio(key),
            ReaderEvent::PlayAudio(key),
            ReaderEvent::PauseAudio,
            ReaderEvent::StopAudio,
            ReaderEvent::UpdateKhatamProgress { surah: 1, verse: 1 },
        ];
        for event in events {
            let mut empty = ReaderState::new(10);
            let _ = empty.handle(event.clone(), today());
            assert!(empty.current_index() == 0);

            let mut state = loaded(1, 10);
            let _ = state.handle(event, today());
            assert!(state.current_index() < state.sequence().len());
        }
    }
}
