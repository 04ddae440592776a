//! crates/quran_reader_core/src/khatam.rs
//!
//! Converts (surah, verse) positions into a monotonic "verses read" count across
//! the whole Quran, and decides which khatam progress writes are worth making.

use crate::domain::{KhatamProgressEntry, KhatamSession};

pub const SURAH_COUNT: u16 = 114;
pub const TOTAL_QURAN_VERSES: u32 = 6236;

/// Canonical verse count of every surah, index 0 being Al-Fatiha.
const SURAH_VERSE_COUNTS: [u16; SURAH_COUNT as usize] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Number of verses in `surah`, `None` outside 1..=114.
pub fn verse_count(surah: u16) -> Option<u16> {
    if (1..=SURAH_COUNT).contains(&surah) {
        Some(SURAH_VERSE_COUNTS[usize::from(surah - 1)])
    } else {
        None
    }
}

/// Verses read from the start of the Quran up to and including `verse` of `surah`.
///
/// Out-of-range surah numbers yield 0.
pub fn total_verses(surah: u16, verse: u16) -> u32 {
    if verse_count(surah).is_none() {
        return 0;
    }
    let preceding: u32 = SURAH_VERSE_COUNTS[..usize::from(surah - 1)]
        .iter()
        .map(|&count| u32::from(count))
        .sum();
    preceding + u32::from(verse)
}

pub fn completion_percentage(total_read: u32) -> f32 {
    (total_read.min(TOTAL_QURAN_VERSES) as f32 / TOTAL_QURAN_VERSES as f32) * 100.0
}

fn entry_total(entry: &KhatamProgressEntry) -> u32 {
    total_verses(entry.surah, entry.verse)
}

/// The authoritative entry among `entries`: highest total, later recording on ties.
pub fn best_entry(entries: &[KhatamProgressEntry]) -> Option<&KhatamProgressEntry> {
    entries
        .iter()
        .max_by_key(|entry| (entry_total(entry), entry.recorded_at))
}

/// Progress made today relative to the best position logged before today.
pub fn verses_read_today(before: &[KhatamProgressEntry], today: &[KhatamProgressEntry]) -> u32 {
    let Some(best_today) = best_entry(today) else {
        return 0;
    };
    let start = best_entry(before).map(entry_total).unwrap_or(0);
    entry_total(best_today).saturating_sub(start)
}

/// What the reader shows about the active khatam.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KhatamOverview {
    pub session: Option<KhatamSession>,
    /// Today's authoritative (surah, verse), if anything was logged today.
    pub today_best: Option<(u16, u16)>,
    pub verses_read_today: u32,
}

impl KhatamOverview {
    pub fn completion_percentage(&self) -> f32 {
        self.session
            .as_ref()
            .map(|session| completion_percentage(session.total_verses_read))
            .unwrap_or(0.0)
    }

    pub fn is_complete(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.total_verses_read >= TOTAL_QURAN_VERSES)
    }
}

/// What to do with a new (surah, verse) report for the current day.
#[derive(Debug, Clone, PartialEq)]
pub enum KhatamDecision {
    /// The position moves past today's best: persist it.
    Write { total: u32 },
    /// Nothing new: refresh the in-memory markers from the existing best.
    Refresh { best: KhatamProgressEntry },
}

pub fn decide(today: &[KhatamProgressEntry], surah: u16, verse: u16) -> KhatamDecision {
    let total = total_verses(surah, verse);
    match best_entry(today) {
        Some(best) if total <= entry_total(best) => KhatamDecision::Refresh { best: best.clone() },
        _ => KhatamDecision::Write { total },
    }
}

/// Allows at most one khatam write per session at a time. A second request while
/// one is in flight is rejected, never queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateGuard {
    in_flight: bool,
}

impl UpdateGuard {
    pub fn try_begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use uuid::Uuid;

    fn entry(surah: u16, verse: u16, second: u32) -> KhatamProgressEntry {
        KhatamProgressEntry {
            id: Uuid::new_v4(),
            session_id: Uuid::nil(),
            surah,
            verse,
            date_read: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            recorded_at: Utc.with_ymd_and_hms(2024, 3, 11, 6, 0, second).unwrap(),
        }
    }

    #[test]
    fn table_covers_the_whole_quran() {
        let sum: u32 = (1..=SURAH_COUNT)
            .map(|s| u32::from(verse_count(s).unwrap()))
            .sum();
        assert_eq!(sum, TOTAL_QURAN_VERSES);
        assert_eq!(total_verses(114, 6), TOTAL_QURAN_VERSES);
    }

    #[rstest]
    #[case(1, 1, 1)]
    #[case(1, 7, 7)]
    #[case(2, 1, 8)]
    #[case(3, 1, 294)]
    #[case(9, 1, 1236)]
    fn totals_follow_the_prefix_sum(#[case] surah: u16, #[case] verse: u16, #[case] expected: u32) {
        assert_eq!(total_verses(surah, verse), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(115)]
    #[case(u16::MAX)]
    fn out_of_range_surah_is_zero(#[case] surah: u16) {
        assert_eq!(total_verses(surah, 3), 0);
        assert_eq!(verse_count(surah), None);
    }

    #[test]
    fn totals_are_strictly_monotonic() {
        let mut previous = 0;
        for surah in 1..=SURAH_COUNT {
            for verse in 1..=verse_count(surah).unwrap() {
                let total = total_verses(surah, verse);
                assert!(total > previous, "{surah}:{verse} did not advance");
                previous = total;
            }
        }
    }

    #[test]
    fn best_entry_ranks_by_total_then_recency() {
        let entries = vec![entry(2, 10, 0), entry(3, 1, 1), entry(2, 200, 2)];
        assert_eq!(best_entry(&entries).map(|e| (e.surah, e.verse)), Some((3, 1)));

        let tie = vec![entry(4, 4, 5), entry(4, 4, 9)];
        assert_eq!(best_entry(&tie).unwrap().recorded_at, tie[1].recorded_at);
        assert!(best_entry(&[]).is_none());
    }

    #[test]
    fn decide_suppresses_non_advancing_writes() {
        let today = vec![entry(2, 50, 0)];
        assert_eq!(
            decide(&today, 2, 40),
            KhatamDecision::Refresh { best: today[0].clone() }
        );
        assert_eq!(
            decide(&today, 2, 50),
            KhatamDecision::Refresh { best: today[0].clone() }
        );
        assert_eq!(decide(&today, 2, 51), KhatamDecision::Write { total: 58 });
        assert_eq!(decide(&[], 1, 1), KhatamDecision::Write { total: 1 });
    }

    #[test]
    fn verses_read_today_is_relative_to_yesterday() {
        let before = vec![entry(1, 7, 0), entry(2, 3, 1)];
        let today = vec![entry(2, 20, 2), entry(2, 13, 3)];
        assert_eq!(verses_read_today(&before, &today), 17);
        assert_eq!(verses_read_today(&before, &[]), 0);
        assert_eq!(verses_read_today(&[], &today), 27);
        assert_eq!(verses_read_today(&today, &before), 0);
    }

    #[test]
    fn guard_rejects_overlapping_updates() {
        let mut guard = UpdateGuard::default();
        assert!(guard.try_begin());
        assert!(!guard.try_begin());
        guard.finish();
        assert!(!guard.is_in_flight());
        assert!(guard.try_begin());
    }

    #[test]
    fn completion_is_capped() {
        assert_eq!(completion_percentage(0), 0.0);
        assert_eq!(completion_percentage(TOTAL_QURAN_VERSES), 100.0);
        assert_eq!(completion_percentage(TOTAL_QURAN_VERSES + 10), 100.0);
    }
}
