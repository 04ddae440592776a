//! services/reader_api/src/adapters/db.rs
//!
//! This module contains the database adapter, the PostgreSQL implementation of
//! every storage port of the reader core. It handles all interactions with the
//! database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use quran_reader_core::domain::{
    JuzMeta, KhatamProgressEntry, KhatamSession, QuickJump, ReadingProgress, SurahMeta, Verse,
    VerseKey,
};
use quran_reader_core::ports::{
    AnnotationStore, KhatamStore, PortError, PortResult, QuickJumpStore, ReadingProgressStore,
    VerseStore,
};
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const VERSE_COLUMNS: &str = "number_in_quran, number_in_surah, surah, juz, ruku, text_arabic, \
     translation_en, translation_ur, sajda, sajda_type, bookmarked, favorited, note, audio_path";

#[derive(FromRow)]
struct VerseRecord {
    number_in_quran: i32,
    number_in_surah: i32,
    surah: i32,
    juz: i32,
    ruku: i32,
    text_arabic: String,
    translation_en: String,
    translation_ur: String,
    sajda: bool,
    sajda_type: String,
    bookmarked: bool,
    favorited: bool,
    note: String,
    audio_path: String,
}
impl VerseRecord {
    fn to_domain(self) -> Verse {
        let mut translations = BTreeMap::new();
        if !self.translation_en.is_empty() {
            translations.insert("en".to_string(), self.translation_en);
        }
        if !self.translation_ur.is_empty() {
            translations.insert("ur".to_string(), self.translation_ur);
        }
        Verse {
            number_in_quran: self.number_in_quran as u16,
            number_in_surah: self.number_in_surah as u16,
            surah: self.surah as u16,
            juz: self.juz as u16,
            ruku: self.ruku as u16,
            text_arabic: self.text_arabic,
            translations,
            bookmarked: self.bookmarked,
            favorited: self.favorited,
            note: self.note,
            sajda: self.sajda,
            sajda_type: self.sajda_type,
            audio_path: self.audio_path,
            is_surah_end: false,
        }
    }
}

#[derive(FromRow)]
struct SurahRecord {
    number: i32,
    verse_count: i32,
    name_arabic: String,
    name_english: String,
}
impl SurahRecord {
    fn to_domain(self) -> SurahMeta {
        SurahMeta {
            number: self.number as u16,
            verse_count: self.verse_count as u16,
            name_arabic: self.name_arabic,
            name_english: self.name_english,
        }
    }
}

#[derive(FromRow)]
struct JuzRecord {
    number: i32,
    name_arabic: String,
    start_surah: i32,
    start_verse: i32,
}
impl JuzRecord {
    fn to_domain(self) -> JuzMeta {
        JuzMeta {
            number: self.number as u16,
            name_arabic: self.name_arabic,
            start_surah: self.start_surah as u16,
            start_verse: self.start_verse as u16,
        }
    }
}

#[derive(FromRow)]
struct ProgressRecord {
    surah: i32,
    last_read_verse: i32,
    completion_percentage: f32,
    last_read_date: NaiveDate,
}
impl ProgressRecord {
    fn to_domain(self) -> ReadingProgress {
        ReadingProgress {
            surah: self.surah as u16,
            last_read_verse: self.last_read_verse as u16,
            completion_percentage: self.completion_percentage,
            last_read_date: self.last_read_date,
        }
    }
}

#[derive(FromRow)]
struct KhatamSessionRecord {
    id: Uuid,
    name: String,
    start_date: NaiveDate,
    is_active: bool,
    is_completed: bool,
    current_surah: i32,
    current_verse: i32,
    total_verses_read: i32,
}
impl KhatamSessionRecord {
    fn to_domain(self) -> KhatamSession {
        KhatamSession {
            id: self.id,
            name: self.name,
            start_date: self.start_date,
            is_active: self.is_active,
            is_completed: self.is_completed,
            current_surah: self.current_surah as u16,
            current_verse: self.current_verse as u16,
            total_verses_read: self.total_verses_read as u32,
        }
    }
}

#[derive(FromRow)]
struct KhatamEntryRecord {
    id: Uuid,
    session_id: Uuid,
    surah: i32,
    verse: i32,
    date_read: NaiveDate,
    recorded_at: DateTime<Utc>,
}
impl KhatamEntryRecord {
    fn to_domain(self) -> KhatamProgressEntry {
        KhatamProgressEntry {
            id: self.id,
            session_id: self.session_id,
            surah: self.surah as u16,
            verse: self.verse as u16,
            date_read: self.date_read,
            recorded_at: self.recorded_at,
        }
    }
}

#[derive(FromRow)]
struct QuickJumpRecord {
    id: Uuid,
    name: String,
    surah: i32,
    verse: i32,
}
impl QuickJumpRecord {
    fn to_domain(self) -> QuickJump {
        QuickJump {
            id: self.id,
            name: self.name,
            surah: self.surah as u16,
            verse: self.verse as u16,
        }
    }
}

#[derive(FromRow)]
struct NumberRecord {
    number_in_surah: i32,
}

//=========================================================================================
// `VerseStore` Implementation
//=========================================================================================

#[async_trait]
impl VerseStore for DbAdapter {
    async fn verses_of_surah(&self, surah: u16) -> PortResult<Vec<Verse>> {
        let sql = format!(
            "SELECT {VERSE_COLUMNS} FROM verses WHERE surah = $1 ORDER BY number_in_surah"
        );
        let records = sqlx::query_as::<_, VerseRecord>(&sql)
            .bind(i32::from(surah))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(VerseRecord::to_domain).collect())
    }

    async fn verses_of_juz(&self, juz: u16) -> PortResult<Vec<Verse>> {
        let sql =
            format!("SELECT {VERSE_COLUMNS} FROM verses WHERE juz = $1 ORDER BY number_in_quran");
        let records = sqlx::query_as::<_, VerseRecord>(&sql)
            .bind(i32::from(juz))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(VerseRecord::to_domain).collect())
    }

    async fn surah_metadata(&self, surah: u16) -> PortResult<SurahMeta> {
        let record = sqlx::query_as::<_, SurahRecord>(
            "SELECT number, verse_count, name_arabic, name_english FROM surahs WHERE number = $1",
        )
        .bind(i32::from(surah))
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Surah {} not found", surah)))?;
        Ok(record.to_domain())
    }

    async fn juz_metadata(&self, juz: u16) -> PortResult<JuzMeta> {
        let record = sqlx::query_as::<_, JuzRecord>(
            "SELECT number, name_arabic, start_surah, start_verse FROM juz WHERE number = $1",
        )
        .bind(i32::from(juz))
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Juz {} not found", juz)))?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `AnnotationStore` Implementation
//=========================================================================================

impl DbAdapter {
    async fn update_verse<T>(&self, column: &str, verse: VerseKey, value: T) -> PortResult<()>
    where
        T: for<'q> sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + 'static,
    {
        let sql = format!("UPDATE verses SET {column} = $1 WHERE number_in_quran = $2");
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(i32::from(verse.number_in_quran))
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Verse {} not found",
                verse.number_in_quran
            )));
        }
        Ok(())
    }

    async fn numbers_where(&self, condition: &str, surah: u16) -> PortResult<Vec<u16>> {
        let sql = format!(
            "SELECT number_in_surah FROM verses WHERE surah = $1 AND {condition} ORDER BY number_in_surah"
        );
        let records = sqlx::query_as::<_, NumberRecord>(&sql)
            .bind(i32::from(surah))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| r.number_in_surah as u16)
            .collect())
    }
}

#[async_trait]
impl AnnotationStore for DbAdapter {
    async fn set_bookmark(&self, verse: VerseKey, bookmarked: bool) -> PortResult<()> {
        self.update_verse("bookmarked", verse, bookmarked).await
    }

    async fn set_favorite(&self, verse: VerseKey, favorited: bool) -> PortResult<()> {
        self.update_verse("favorited", verse, favorited).await
    }

    async fn set_note(&self, verse: VerseKey, note: &str) -> PortResult<()> {
        self.update_verse("note", verse, note.to_string()).await
    }

    async fn set_audio_path(&self, verse: VerseKey, path: &str) -> PortResult<()> {
        self.update_verse("audio_path", verse, path.to_string()).await
    }

    async fn bookmarked_numbers(&self, surah: u16) -> PortResult<Vec<u16>> {
        self.numbers_where("bookmarked", surah).await
    }

    async fn favorited_numbers(&self, surah: u16) -> PortResult<Vec<u16>> {
        self.numbers_where("favorited", surah).await
    }

    async fn noted_numbers(&self, surah: u16) -> PortResult<Vec<u16>> {
        self.numbers_where("note <> ''", surah).await
    }
}

//=========================================================================================
// `ReadingProgressStore` Implementation
//=========================================================================================

#[async_trait]
impl ReadingProgressStore for DbAdapter {
    async fn get_progress(&self, surah: u16) -> PortResult<Option<ReadingProgress>> {
        let record = sqlx::query_as::<_, ProgressRecord>(
            "SELECT surah, last_read_verse, completion_percentage, last_read_date \
             FROM reading_progress WHERE surah = $1",
        )
        .bind(i32::from(surah))
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ProgressRecord::to_domain))
    }

    async fn write_progress(&self, progress: ReadingProgress) -> PortResult<bool> {
        let result = sqlx::query(
            "INSERT INTO reading_progress \
                 (surah, last_read_verse, completion_percentage, last_read_date, updated_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (surah) DO UPDATE SET \
                 last_read_verse = EXCLUDED.last_read_verse, \
                 completion_percentage = EXCLUDED.completion_percentage, \
                 last_read_date = EXCLUDED.last_read_date, \
                 updated_at = NOW() \
             WHERE reading_progress.last_read_verse < EXCLUDED.last_read_verse",
        )
        .bind(i32::from(progress.surah))
        .bind(i32::from(progress.last_read_verse))
        .bind(progress.completion_percentage)
        .bind(progress.last_read_date)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_progress(&self) -> PortResult<Vec<ReadingProgress>> {
        let records = sqlx::query_as::<_, ProgressRecord>(
            "SELECT surah, last_read_verse, completion_percentage, last_read_date \
             FROM reading_progress ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ProgressRecord::to_domain).collect())
    }
}

//=========================================================================================
// `KhatamStore` Implementation
//=========================================================================================

const ENTRY_COLUMNS: &str = "id, session_id, surah, verse, date_read, recorded_at";

#[async_trait]
impl KhatamStore for DbAdapter {
    async fn active_session(&self) -> PortResult<Option<KhatamSession>> {
        let record = sqlx::query_as::<_, KhatamSessionRecord>(
            "SELECT id, name, start_date, is_active, is_completed, current_surah, current_verse, \
                    total_verses_read \
             FROM khatam_sessions WHERE is_active AND NOT is_completed \
             ORDER BY start_date DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(KhatamSessionRecord::to_domain))
    }

    async fn entries_for_date(
        &self,
        session_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<KhatamProgressEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM khatam_progress WHERE session_id = $1 AND date_read = $2"
        );
        let records = sqlx::query_as::<_, KhatamEntryRecord>(&sql)
            .bind(session_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(KhatamEntryRecord::to_domain).collect())
    }

    async fn entries_before(
        &self,
        session_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<Vec<KhatamProgressEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM khatam_progress WHERE session_id = $1 AND date_read < $2"
        );
        let records = sqlx::query_as::<_, KhatamEntryRecord>(&sql)
            .bind(session_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(KhatamEntryRecord::to_domain).collect())
    }

    async fn insert_entry(&self, entry: KhatamProgressEntry) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO khatam_progress (id, session_id, surah, verse, date_read, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id)
        .bind(entry.session_id)
        .bind(i32::from(entry.surah))
        .bind(i32::from(entry.verse))
        .bind(entry.date_read)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn update_session_aggregate(
        &self,
        session_id: Uuid,
        surah: u16,
        verse: u16,
        total_verses_read: u32,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE khatam_sessions \
             SET current_surah = $2, current_verse = $3, total_verses_read = $4 \
             WHERE id = $1",
        )
        .bind(session_id)
        .bind(i32::from(surah))
        .bind(i32::from(verse))
        .bind(total_verses_read as i32)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Khatam session {} not found",
                session_id
            )));
        }
        Ok(())
    }

    async fn complete_session(&self, session_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "UPDATE khatam_sessions SET is_completed = TRUE, is_active = FALSE WHERE id = $1",
        )
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `QuickJumpStore` Implementation
//=========================================================================================

#[async_trait]
impl QuickJumpStore for DbAdapter {
    async fn quick_jumps_for_surah(&self, surah: u16) -> PortResult<Vec<QuickJump>> {
        let records = sqlx::query_as::<_, QuickJumpRecord>(
            "SELECT id, name, surah, verse FROM quick_jumps WHERE surah = $1 ORDER BY verse",
        )
        .bind(i32::from(surah))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(QuickJumpRecord::to_domain).collect())
    }

    async fn quick_jump(&self, id: Uuid) -> PortResult<QuickJump> {
        let record = sqlx::query_as::<_, QuickJumpRecord>(
            "SELECT id, name, surah, verse FROM quick_jumps WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Quick jump {} not found", id)))?;
        Ok(record.to_domain())
    }

    async fn insert_quick_jump(&self, quick_jump: QuickJump) -> PortResult<()> {
        sqlx::query("INSERT INTO quick_jumps (id, name, surah, verse) VALUES ($1, $2, $3, $4)")
            .bind(quick_jump.id)
            .bind(quick_jump.name)
            .bind(i32::from(quick_jump.surah))
            .bind(i32::from(quick_jump.verse))
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_quick_jump(&self, id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM quick_jumps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
