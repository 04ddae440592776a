//! crates/quran_reader_core/src/compositor.rs
//!
//! Flattens a page of verses plus its surah headers into one ordered list of
//! render-ready items.

use crate::domain::{SequenceItem, StructuralHeader, SurahMeta, Verse, VerseKey};
use crate::sequence::{AL_FATIHA, AT_TAWBAH};

/// Derives the headers of a page: one for every surah whose first verse sits on it.
///
/// `verses` must not contain synthetic markers; the compositor emits those itself.
pub fn headers_for_page(verses: &[Verse], surahs: &[SurahMeta]) -> Vec<StructuralHeader> {
    verses
        .iter()
        .enumerate()
        .filter(|(_, verse)| verse.number_in_surah == 1)
        .map(|(insert_at, verse)| {
            let meta = surahs.iter().find(|meta| meta.number == verse.surah);
            StructuralHeader {
                surah: verse.surah,
                name_arabic: meta.map(|m| m.name_arabic.clone()).unwrap_or_default(),
                name_english: meta.map(|m| m.name_english.clone()).unwrap_or_default(),
                bismillah: verse.surah != AL_FATIHA && verse.surah != AT_TAWBAH,
                insert_at,
            }
        })
        .collect()
}

/// Interleaves `verses` with `headers` (and the Bismillah each header asks for).
///
/// Headers are placed before the verse at their `insert_at`; an index past the
/// end of the page places the header after the last verse.
pub fn compose_page(
    verses: &[Verse],
    headers: &[StructuralHeader],
    selected: Option<VerseKey>,
) -> Vec<SequenceItem> {
    let mut ordered: Vec<&StructuralHeader> = headers.iter().collect();
    ordered.sort_by_key(|header| header.insert_at);

    let bismillahs = ordered.iter().filter(|header| header.bismillah).count();
    let mut items = Vec::with_capacity(verses.len() + ordered.len() + bismillahs);
    let mut cursor = 0;

    let verse_item = |verse: &Verse| SequenceItem::Verse {
        verse: verse.clone(),
        selected: selected == Some(verse.key()),
    };

    for header in ordered {
        let until = header.insert_at.min(verses.len());
        while cursor < until {
            items.push(verse_item(&verses[cursor]));
            cursor += 1;
        }
        items.push(SequenceItem::Header(header.clone()));
        if header.bismillah {
            items.push(SequenceItem::Bismillah {
                surah: header.surah,
            });
        }
    }
    items.extend(verses[cursor..].iter().map(verse_item));
    items
}
