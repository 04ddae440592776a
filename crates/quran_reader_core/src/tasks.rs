//! crates/quran_reader_core/src/tasks.rs
//!
//! The asynchronous halves of the reader's effects. Each function talks to the
//! ports only and returns a value the state machine can apply; none of them
//! touch `ReaderState`.

use crate::cursor::{LoadTarget, LoadedContent, NavigationData};
use crate::domain::{KhatamProgressEntry, ReadingProgress};
use crate::khatam::{self, KhatamDecision, KhatamOverview, TOTAL_QURAN_VERSES};
use crate::ports::{
    AnnotationStore, KhatamStore, PortError, PortResult, QuickJumpStore, ReadingProgressStore,
    VerseStore,
};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

/// Fetches everything a load needs. Metadata is fetched once the verses are in,
/// surah and juz metadata concurrently.
pub async fn load_content(verses: &dyn VerseStore, target: LoadTarget) -> PortResult<LoadedContent> {
    let raw = match target {
        LoadTarget::Surah(surah) => verses.verses_of_surah(surah).await?,
        LoadTarget::Juz(juz) => verses.verses_of_juz(juz).await?,
    };
    let Some(first) = raw.first() else {
        return Err(PortError::NotFound(format!("No verses for {target:?}")));
    };
    let (surah_number, juz_number) = match target {
        LoadTarget::Surah(surah) => (surah, first.juz),
        LoadTarget::Juz(juz) => (first.surah, juz),
    };

    let mut in_view: Vec<u16> = raw.iter().map(|verse| verse.surah).collect();
    in_view.dedup();
    let others = in_view
        .iter()
        .filter(|&&number| number != surah_number)
        .map(|&number| verses.surah_metadata(number));

    let (surah, juz, other_surahs) = futures::try_join!(
        verses.surah_metadata(surah_number),
        verses.juz_metadata(juz_number),
        futures::future::try_join_all(others)
    )?;
    debug!("Loaded {} verses for {:?}", raw.len(), target);

    let mut surahs = Vec::with_capacity(other_surahs.len() + 1);
    surahs.push(surah.clone());
    surahs.extend(other_surahs);
    Ok(LoadedContent {
        verses: raw,
        surah,
        juz,
        surahs,
    })
}

/// Writes `progress` unless the store already holds something further along.
/// Returns the record the store ends up with.
///
/// The store decides atomically, so overlapping calls for one surah can never
/// move the stored verse backwards.
pub async fn persist_progress_forward(
    store: &dyn ReadingProgressStore,
    progress: ReadingProgress,
) -> PortResult<ReadingProgress> {
    if store.write_progress(progress.clone()).await? {
        return Ok(progress);
    }
    let stored = store.get_progress(progress.surah).await?;
    debug!(
        "Stored progress of surah {} is ahead of {}, not writing",
        progress.surah, progress.last_read_verse
    );
    Ok(stored.unwrap_or(progress))
}

/// Side data of the navigation panel for one surah.
pub async fn load_navigation(
    annotations: &dyn AnnotationStore,
    quick_jumps: &dyn QuickJumpStore,
    progress: &dyn ReadingProgressStore,
    surah: u16,
) -> PortResult<NavigationData> {
    let (quick_jumps, stored_progress, bookmarked, favorited, noted) = futures::try_join!(
        quick_jumps.quick_jumps_for_surah(surah),
        progress.get_progress(surah),
        annotations.bookmarked_numbers(surah),
        annotations.favorited_numbers(surah),
        annotations.noted_numbers(surah),
    )?;
    Ok(NavigationData {
        quick_jumps,
        stored_progress,
        bookmarked,
        favorited,
        noted,
        total_verses: khatam::verse_count(surah).unwrap_or_default(),
    })
}

/// The active session plus today's metrics.
pub async fn khatam_overview(store: &dyn KhatamStore, today: NaiveDate) -> PortResult<KhatamOverview> {
    let Some(session) = store.active_session().await? else {
        return Ok(KhatamOverview::default());
    };
    let (todays, earlier) = futures::try_join!(
        store.entries_for_date(session.id, today),
        store.entries_before(session.id, today)
    )?;
    Ok(KhatamOverview {
        today_best: khatam::best_entry(&todays).map(|best| (best.surah, best.verse)),
        verses_read_today: khatam::verses_read_today(&earlier, &todays),
        session: Some(session),
    })
}

/// Logs a khatam position for today if it moves past today's best, then
/// returns the refreshed overview.
pub async fn record_khatam_progress(
    store: &dyn KhatamStore,
    session_id: Uuid,
    surah: u16,
    verse: u16,
    today: NaiveDate,
) -> PortResult<KhatamOverview> {
    let todays = store.entries_for_date(session_id, today).await?;
    match khatam::decide(&todays, surah, verse) {
        KhatamDecision::Write { total } => {
            store
                .insert_entry(KhatamProgressEntry {
                    id: Uuid::new_v4(),
                    session_id,
                    surah,
                    verse,
                    date_read: today,
                    recorded_at: Utc::now(),
                })
                .await?;
            store
                .update_session_aggregate(session_id, surah, verse, total)
                .await?;
            if total >= TOTAL_QURAN_VERSES {
                let mut overview = khatam_overview(store, today).await?;
                store.complete_session(session_id).await?;
                info!("Khatam session {} completed", session_id);
                if let Some(session) = overview.session.as_mut() {
                    session.is_completed = true;
                    session.is_active = false;
                }
                return Ok(overview);
            }
        }
        KhatamDecision::Refresh { best } => {
            debug!(
                "Khatam position {}:{} does not pass today's best {}:{}",
                surah, verse, best.surah, best.verse
            );
        }
    }
    khatam_overview(store, today).await
}
