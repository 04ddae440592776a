//! services/reader_api/src/adapters/memory.rs
//!
//! An in-process implementation of every storage port. Backs the integration
//! tests and local runs without a database.

use async_trait::async_trait;
use chrono::NaiveDate;
use quran_reader_core::domain::{
    JuzMeta, KhatamProgressEntry, KhatamSession, QuickJump, ReadingProgress, SurahMeta, Verse,
    VerseKey,
};
use quran_reader_core::khatam;
use quran_reader_core::ports::{
    AnnotationStore, KhatamStore, PortError, PortResult, QuickJumpStore, ReadingProgressStore,
    VerseStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    verses: BTreeMap<u16, Verse>,
    surahs: BTreeMap<u16, SurahMeta>,
    juz: BTreeMap<u16, JuzMeta>,
    /// Records in write order, oldest first.
    progress: Vec<ReadingProgress>,
    sessions: Vec<KhatamSession>,
    entries: Vec<KhatamProgressEntry>,
    quick_jumps: Vec<QuickJump>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding `surahs` with placeholder text ("surah:verse"), verse counts
    /// from the canonical table and every verse in juz 1.
    pub async fn seeded(surahs: &[u16]) -> Self {
        let store = Self::new();
        for &surah in surahs {
            let count = khatam::verse_count(surah).unwrap_or_default();
            let verses = (1..=count)
                .map(|verse| placeholder_verse(surah, verse, 1))
                .collect();
            store
                .insert_surah(
                    SurahMeta {
                        number: surah,
                        verse_count: count,
                        name_arabic: String::new(),
                        name_english: format!("Surah {surah}"),
                    },
                    verses,
                )
                .await;
        }
        store
            .insert_juz(JuzMeta {
                number: 1,
                name_arabic: String::new(),
                start_surah: 1,
                start_verse: 1,
            })
            .await;
        store
    }

    pub async fn insert_surah(&self, meta: SurahMeta, verses: Vec<Verse>) {
        let mut inner = self.inner.lock().await;
        for verse in verses {
            inner.verses.insert(verse.number_in_quran, verse);
        }
        inner.surahs.insert(meta.number, meta);
    }

    pub async fn insert_juz(&self, meta: JuzMeta) {
        self.inner.lock().await.juz.insert(meta.number, meta);
    }

    pub async fn insert_session(&self, session: KhatamSession) {
        self.inner.lock().await.sessions.push(session);
    }

    pub async fn session(&self, id: Uuid) -> Option<KhatamSession> {
        let inner = self.inner.lock().await;
        inner.sessions.iter().find(|s| s.id == id).cloned()
    }

    pub async fn entries(&self) -> Vec<KhatamProgressEntry> {
        self.inner.lock().await.entries.clone()
    }

    async fn with_verse<F>(&self, key: VerseKey, apply: F) -> PortResult<()>
    where
        F: FnOnce(&mut Verse) + Send,
    {
        let mut inner = self.inner.lock().await;
        let verse = inner
            .verses
            .get_mut(&key.number_in_quran)
            .ok_or_else(|| PortError::NotFound(format!("Verse {} not found", key.number_in_quran)))?;
        apply(verse);
        Ok(())
    }

    async fn numbers_where<F>(&self, surah: u16, keep: F) -> PortResult<Vec<u16>>
    where
        F: Fn(&Verse) -> bool + Send,
    {
        let inner = self.inner.lock().await;
        Ok(inner
            .verses
            .values()
            .filter(|v| v.surah == surah && keep(v))
            .map(|v| v.number_in_surah)
            .collect())
    }
}

/// A verse whose text is its own "surah:verse" reference.
pub fn placeholder_verse(surah: u16, verse: u16, juz: u16) -> Verse {
    Verse {
        number_in_quran: khatam::total_verses(surah, verse) as u16,
        number_in_surah: verse,
        surah,
        juz,
        ruku: 1,
        text_arabic: format!("{surah}:{verse}"),
        translations: BTreeMap::new(),
        bookmarked: false,
        favorited: false,
        note: String::new(),
        sajda: false,
        sajda_type: String::new(),
        audio_path: String::new(),
        is_surah_end: false,
    }
}

#[async_trait]
impl VerseStore for MemoryStore {
    async fn verses_of_surah(&self, surah: u16) -> PortResult<Vec<Verse>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .verses
            .values()
            .filter(|v| v.surah == surah)
            .cloned()
            .collect())
    }

    async fn verses_of_juz(&self, juz: u16) -> PortResult<Vec<Verse>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .verses
            .values()
            .filter(|v| v.juz == juz)
            .cloned()
            .collect())
    }

    async fn surah_metadata(&self, surah: u16) -> PortResult<SurahMeta> {
        let inner = self.inner.lock().await;
        inner
            .surahs
            .get(&surah)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Surah {} not found", surah)))
    }

    async fn juz_metadata(&self, juz: u16) -> PortResult<JuzMeta> {
        let inner = self.inner.lock().await;
        inner
            .juz
            .get(&juz)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Juz {} not found", juz)))
    }
}

#[async_trait]
impl AnnotationStore for MemoryStore {
    async fn set_bookmark(&self, verse: VerseKey, bookmarked: bool) -> PortResult<()> {
        self.with_verse(verse, |v| v.bookmarked = bookmarked).await
    }

    async fn set_favorite(&self, verse: VerseKey, favorited: bool) -> PortResult<()> {
        self.with_verse(verse, |v| v.favorited = favorited).await
    }

    async fn set_note(&self, verse: VerseKey, note: &str) -> PortResult<()> {
        let note = note.to_string();
        self.with_verse(verse, move |v| v.note = note).await
    }

    async fn set_audio_path(&self, verse: VerseKey, path: &str) -> PortResult<()> {
        let path = path.to_string();
        self.with_verse(verse, move |v| v.audio_path = path).await
    }

    async fn bookmarked_numbers(&self, surah: u16) -> PortResult<Vec<u16>> {
        self.numbers_where(surah, |v| v.bookmarked).await
    }

    async fn favorited_numbers(&self, surah: u16) -> PortResult<Vec<u16>> {
        self.numbers_where(surah, |v| v.favorited).await
    }

    async fn noted_numbers(&self, surah: u16) -> PortResult<Vec<u16>> {
        self.numbers_where(surah, |v| !v.note.is_empty()).await
    }
}

#[async_trait]
impl ReadingProgressStore for MemoryStore {
    async fn get_progress(&self, surah: u16) -> PortResult<Option<ReadingProgress>> {
        let inner = self.inner.lock().await;
        Ok(inner.progress.iter().find(|p| p.surah == surah).cloned())
    }

    async fn write_progress(&self, progress: ReadingProgress) -> PortResult<bool> {
        let mut inner = self.inner.lock().await;
        let behind = inner
            .progress
            .iter()
            .any(|p| p.surah == progress.surah && p.last_read_verse >= progress.last_read_verse);
        if behind {
            return Ok(false);
        }
        inner.progress.retain(|p| p.surah != progress.surah);
        inner.progress.push(progress);
        Ok(true)
    }

    async fn list_progress(&self) -> PortResult<Vec<ReadingProgress>> {
        let inner = self.inner.lock().await;
        Ok(inner.progress.iter().rev().cloned().collect())
    }
}

#[async_trait]
impl KhatamStore for MemoryStore {
    async fn active_session(&self) -> PortResult<Option<KhatamSession>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .iter()
            .find(|s| s.is_active && !s.is_completed)
            .cloned())
    }

    async fn entries_for_date(
        &self,
        session_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<KhatamProgressEntry>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.session_id == session_id && e.date_read == date)
            .cloned()
            .collect())
    }

    async fn entries_before(
        &self,
        session_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<KhatamProgressEntry>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.session_id == session_id && e.date_read < date)
            .cloned()
            .collect())
    }

    async fn insert_entry(&self, entry: KhatamProgressEntry) -> PortResult<()> {
        self.inner.lock().await.entries.push(entry);
        Ok(())
    }

    async fn update_session_aggregate(
        &self,
        session_id: Uuid,
        surah: u16,
        verse: u16,
        total_verses_read: u32,
    ) -> PortResult<()> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| PortError::NotFound(format!("Khatam session {} not found", session_id)))?;
        session.current_surah = surah;
        session.current_verse = verse;
        session.total_verses_read = total_verses_read;
        Ok(())
    }

    async fn complete_session(&self, session_id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(session) = inner.sessions.iter_mut().find(|s| s.id == session_id) {
            session.is_completed = true;
            session.is_active = false;
        }
        Ok(())
    }
}

#[async_trait]
impl QuickJumpStore for MemoryStore {
    async fn quick_jumps_for_surah(&self, surah: u16) -> PortResult<Vec<QuickJump>> {
        let inner = self.inner.lock().await;
        let mut found: Vec<QuickJump> = inner
            .quick_jumps
            .iter()
            .filter(|q| q.surah == surah)
            .cloned()
            .collect();
        found.sort_by_key(|q| q.verse);
        Ok(found)
    }

    async fn quick_jump(&self, id: Uuid) -> PortResult<QuickJump> {
        let inner = self.inner.lock().await;
        inner
            .quick_jumps
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Quick jump {} not found", id)))
    }

    async fn insert_quick_jump(&self, quick_jump: QuickJump) -> PortResult<()> {
        self.inner.lock().await.quick_jumps.push(quick_jump);
        Ok(())
    }

    async fn delete_quick_jump(&self, id: Uuid) -> PortResult<()> {
        self.inner.lock().await.quick_jumps.retain(|q| q.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn progress(surah: u16, verse: u16) -> ReadingProgress {
        ReadingProgress {
            surah,
            last_read_verse: verse,
            completion_percentage: 0.0,
            last_read_date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
        }
    }

    #[tokio::test]
    async fn progress_writes_only_move_forward() {
        let store = MemoryStore::new();
        assert!(store.write_progress(progress(2, 10)).await.unwrap());
        assert!(!store.write_progress(progress(2, 4)).await.unwrap());
        assert!(!store.write_progress(progress(2, 10)).await.unwrap());
        assert!(store.write_progress(progress(3, 1)).await.unwrap());

        let stored = store.get_progress(2).await.unwrap().unwrap();
        assert_eq!(stored.last_read_verse, 10);
    }

    #[tokio::test]
    async fn progress_is_listed_most_recent_first() {
        let store = MemoryStore::new();
        store.write_progress(progress(2, 10)).await.unwrap();
        store.write_progress(progress(18, 3)).await.unwrap();
        store.write_progress(progress(2, 11)).await.unwrap();

        let surahs: Vec<u16> = store
            .list_progress()
            .await
            .unwrap()
            .iter()
            .map(|p| p.surah)
            .collect();
        assert_eq!(surahs, vec![2, 18]);
    }
}
