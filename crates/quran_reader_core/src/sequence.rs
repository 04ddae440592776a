//! crates/quran_reader_core/src/sequence.rs
//!
//! Turns raw verse lists into the navigable sequence: synthetic Bismillah
//! markers are inserted where a surah opens, and every entry is tagged with
//! whether it closes its surah.

use crate::domain::Verse;
use crate::khatam;
use std::collections::BTreeMap;

pub const BISMILLAH_ARABIC: &str = "بِسْمِ ٱللَّهِ ٱلرَّحْمَـٰنِ ٱلرَّحِيمِ";
pub const BISMILLAH_ENGLISH: &str =
    "In the name of Allah, the Entirely Merciful, the Especially Merciful";
pub const BISMILLAH_URDU: &str = "اللہ کے نام سے جو رحمان و رحیم ہے";

/// Al-Fatiha: its first verse already is the Bismillah.
pub const AL_FATIHA: u16 = 1;
/// At-Tawbah: opens without a Bismillah.
pub const AT_TAWBAH: u16 = 9;

/// The synthetic, non-counted marker for `surah`.
pub fn bismillah_marker(surah: u16, juz: u16) -> Verse {
    let translations = BTreeMap::from([
        ("en".to_string(), BISMILLAH_ENGLISH.to_string()),
        ("ur".to_string(), BISMILLAH_URDU.to_string()),
    ]);
    Verse {
        number_in_quran: 0,
        number_in_surah: 0,
        surah,
        juz,
        ruku: 0,
        text_arabic: BISMILLAH_ARABIC.to_string(),
        translations,
        bookmarked: false,
        favorited: false,
        note: String::new(),
        sajda: false,
        sajda_type: String::new(),
        audio_path: String::new(),
        is_surah_end: false,
    }
}

fn opens_with_bismillah(surah: u16) -> bool {
    surah != AL_FATIHA && surah != AT_TAWBAH
}

/// Builds the sequence of a single surah.
pub fn build_surah_sequence(mut verses: Vec<Verse>) -> Vec<Verse> {
    let Some(first) = verses.first() else {
        return verses;
    };
    if opens_with_bismillah(first.surah)
        && first.text_arabic != BISMILLAH_ARABIC
        && !first.is_bismillah_marker()
    {
        let marker = bismillah_marker(first.surah, first.juz);
        verses.insert(0, marker);
    }
    tag_surah_ends(verses)
}

/// Builds the sequence of a juz, which may span several surahs.
///
/// A marker goes before every verse 1 of a surah other than Al-Fatiha and
/// At-Tawbah, unless one is already there.
pub fn build_juz_sequence(verses: Vec<Verse>) -> Vec<Verse> {
    let mut built: Vec<Verse> = Vec::with_capacity(verses.len() + 2);
    for verse in verses {
        if verse.number_in_surah == 1 && opens_with_bismillah(verse.surah) {
            let already_marked = built.last().is_some_and(|previous| {
                previous.is_bismillah_marker() && previous.surah == verse.surah
            });
            if !already_marked && verse.text_arabic != BISMILLAH_ARABIC {
                built.push(bismillah_marker(verse.surah, verse.juz));
            }
        }
        built.push(verse);
    }
    tag_surah_ends(built)
}

fn tag_surah_ends(mut verses: Vec<Verse>) -> Vec<Verse> {
    for verse in &mut verses {
        verse.is_surah_end = !verse.is_bismillah_marker()
            && khatam::verse_count(verse.surah) == Some(verse.number_in_surah);
    }
    verses
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    pub(crate) fn verse(surah: u16, number_in_surah: u16, juz: u16) -> Verse {
        Verse {
            number_in_quran: (khatam::total_verses(surah, number_in_surah)) as u16,
            number_in_surah,
            surah,
            juz,
            ruku: 1,
            text_arabic: format!("{surah}:{number_in_surah}"),
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

    pub(crate) fn surah(number: u16) -> Vec<Verse> {
        let count = khatam::verse_count(number).unwrap();
        (1..=count).map(|v| verse(number, v, 1)).collect()
    }

    fn numbers(sequence: &[Verse]) -> Vec<(u16, u16)> {
        sequence.iter().map(|v| (v.surah, v.number_in_surah)).collect()
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(build_surah_sequence(Vec::new()).is_empty());
        assert!(build_juz_sequence(Vec::new()).is_empty());
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    #[case(8)]
    #[case(10)]
    #[case(114)]
    fn surah_gets_a_leading_marker(#[case] number: u16) {
        let raw = surah(number);
        let built = build_surah_sequence(raw.clone());
        assert_eq!(built.len(), raw.len() + 1);
        assert!(built[0].is_bismillah_marker());
        assert_eq!(built[0].surah, number);
        assert_eq!(built[0].text_arabic, BISMILLAH_ARABIC);
        assert_eq!(built.iter().filter(|v| v.is_bismillah_marker()).count(), 1);
    }

    #[test]
    fn al_fatiha_and_at_tawbah_get_no_marker() {
        assert_eq!(build_surah_sequence(surah(1)).len(), 7);
        let tawbah = build_surah_sequence(surah(9));
        assert_eq!(tawbah.len(), 129);
        assert!(tawbah.iter().all(|v| !v.is_bismillah_marker()));
    }

    #[test]
    fn literal_bismillah_is_not_duplicated() {
        let mut raw = surah(27);
        raw[0].text_arabic = BISMILLAH_ARABIC.to_string();
        assert_eq!(build_surah_sequence(raw).len(), 93);
    }

    #[test]
    fn juz_marks_every_surah_opening() {
        // Four short surahs back to back.
        let raw: Vec<Verse> = [111u16, 112, 113, 114]
            .iter()
            .flat_map(|&s| surah(s))
            .collect();
        let built = build_juz_sequence(raw.clone());
        assert_eq!(built.len(), raw.len() + 4);
        let markers: Vec<u16> = built
            .iter()
            .filter(|v| v.is_bismillah_marker())
            .map(|v| v.surah)
            .collect();
        assert_eq!(markers, vec![111, 112, 113, 114]);
        // Each marker directly precedes verse 1 of its surah.
        for (i, v) in built.iter().enumerate() {
            if v.is_bismillah_marker() {
                assert_eq!((built[i + 1].surah, built[i + 1].number_in_surah), (v.surah, 1));
            }
        }
    }

    #[test]
    fn juz_ten_has_no_marker_before_at_tawbah() {
        // Juz 10 runs from 8:41 to 9:92.
        let mut raw: Vec<Verse> = (41..=75).map(|v| verse(8, v, 10)).collect();
        raw.extend((1..=92).map(|v| verse(9, v, 10)));
        let built = build_juz_sequence(raw.clone());
        assert_eq!(built.len(), raw.len());
        assert_eq!(numbers(&built)[35], (9, 1));
    }

    #[test]
    fn juz_nine_marks_al_anfal() {
        // Juz 9 runs from 7:88 to 8:40; Al-Anfal opens inside it.
        let mut raw: Vec<Verse> = (88..=206).map(|v| verse(7, v, 9)).collect();
        raw.extend((1..=40).map(|v| verse(8, v, 9)));
        let built = build_juz_sequence(raw.clone());
        assert_eq!(built.len(), raw.len() + 1);
        assert_eq!(numbers(&built)[119], (8, 0));
    }

    #[test]
    fn juz_build_is_idempotent() {
        let raw: Vec<Verse> = [77u16, 78].iter().flat_map(|&s| surah(s)).collect();
        let once = build_juz_sequence(raw);
        let twice = build_juz_sequence(once.clone());
        assert_eq!(numbers(&once), numbers(&twice));
    }

    #[test]
    fn surah_end_tags_use_canonical_counts() {
        let built = build_surah_sequence(surah(112));
        let ends: Vec<bool> = built.iter().map(|v| v.is_surah_end).collect();
        assert_eq!(ends, vec![false, false, false, false, true]);

        // A juz cut mid-surah has no false end tag.
        let partial: Vec<Verse> = (1..=10).map(|v| verse(2, v, 1)).collect();
        assert!(build_juz_sequence(partial).iter().all(|v| !v.is_surah_end));
    }

    #[test]
    fn marker_displays_as_verse_one() {
        let marker = bismillah_marker(2, 1);
        assert_eq!(marker.display_number(), 1);
        assert_eq!(marker.translations.get("en").map(String::as_str), Some(BISMILLAH_ENGLISH));
    }
}
