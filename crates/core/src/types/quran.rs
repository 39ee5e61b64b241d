//! Static shape of the collection: chapter count and verses per chapter

use super::position::Position;

/// Number of chapters in the collection
pub const CHAPTER_COUNT: u16 = 114;

/// Total number of verses across all chapters
pub const TOTAL_VERSES: u32 = 6236;

/// Verse count of every chapter, index 0 is chapter 1
pub const VERSE_COUNTS: [u16; CHAPTER_COUNT as usize] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Returns the static verse count of a chapter, `None` outside 1..=114
pub fn verses_in(chapter: u16) -> Option<u16> {
    if chapter == 0 {
        return None;
    }
    VERSE_COUNTS.get(usize::from(chapter) - 1).copied()
}

/// Returns true if the chapter number exists
pub fn is_valid_chapter(chapter: u16) -> bool {
    (1..=CHAPTER_COUNT).contains(&chapter)
}

/// 1-based index of a verse across the whole collection
///
/// Uses the static table only. Returns `None` when the chapter does not exist
/// or the verse is zero or past the end of the chapter.
pub fn absolute_verse_index(chapter: u16, verse: u16) -> Option<u32> {
    let count = verses_in(chapter)?;
    if verse == 0 || verse > count {
        return None;
    }

    let preceding: u32 = VERSE_COUNTS[..usize::from(chapter) - 1]
        .iter()
        .map(|&c| u32::from(c))
        .sum();
    Some(preceding + u32::from(verse))
}

/// Chapter of the verse of the day, cycling through all chapters
pub fn daily_chapter(day_of_year: u16) -> u16 {
    day_of_year % CHAPTER_COUNT + 1
}

/// Verse of the day for a chapter with `verse_count` verses
///
/// The same day always lands on the same verse. `None` for an empty chapter.
pub fn daily_position(day_of_year: u16, verse_count: u16) -> Option<Position> {
    if verse_count == 0 {
        return None;
    }
    let verse = day_of_year % verse_count + 1;
    Position::new(
        u32::from(daily_chapter(day_of_year)),
        u32::from(verse),
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_totals() {
        let total: u32 = VERSE_COUNTS.iter().map(|&c| u32::from(c)).sum();
        assert_eq!(total, TOTAL_VERSES);
    }

    #[test]
    fn test_verses_in_bounds() {
        assert_eq!(verses_in(1), Some(7));
        assert_eq!(verses_in(2), Some(286));
        assert_eq!(verses_in(4), Some(176));
        assert_eq!(verses_in(114), Some(6));
        assert_eq!(verses_in(0), None);
        assert_eq!(verses_in(115), None);
    }

    #[test]
    fn test_absolute_index_first_chapter() {
        assert_eq!(absolute_verse_index(1, 1), Some(1));
        assert_eq!(absolute_verse_index(1, 7), Some(7));
    }

    #[test]
    fn test_absolute_index_crosses_chapter() {
        assert_eq!(absolute_verse_index(2, 1), Some(8));
        assert_eq!(absolute_verse_index(3, 1), Some(7 + 286 + 1));
    }

    #[test]
    fn test_absolute_index_last_verse() {
        assert_eq!(absolute_verse_index(114, 6), Some(TOTAL_VERSES));
    }

    #[test]
    fn test_absolute_index_rejects_out_of_range() {
        assert_eq!(absolute_verse_index(1, 0), None);
        assert_eq!(absolute_verse_index(1, 8), None);
        assert_eq!(absolute_verse_index(0, 1), None);
        assert_eq!(absolute_verse_index(115, 1), None);
    }

    #[test]
    fn test_daily_chapter_cycles() {
        assert_eq!(daily_chapter(0), 1);
        assert_eq!(daily_chapter(1), 2);
        assert_eq!(daily_chapter(113), 114);
        assert_eq!(daily_chapter(114), 1);
        assert_eq!(daily_chapter(366), 25);
    }

    #[test]
    fn test_daily_position() {
        // Day 1 picks chapter 2, verse index 1 of 286
        let position = daily_position(1, 286).unwrap();
        assert_eq!((position.chapter(), position.verse()), (2, 2));

        // Day 200: chapter 87 (19 verses), index 200 % 19 = 10
        let position = daily_position(200, 19).unwrap();
        assert_eq!((position.chapter(), position.verse()), (87, 11));
    }

    #[test]
    fn test_daily_position_stays_inside_chapter() {
        for day in 1..=366 {
            let chapter = daily_chapter(day);
            let count = verses_in(chapter).unwrap();
            let position = daily_position(day, count).unwrap();
            assert_eq!(position.chapter(), chapter);
            assert!(position.verse() >= 1 && position.verse() <= count);
        }
    }

    #[test]
    fn test_daily_position_empty_chapter() {
        assert_eq!(daily_position(5, 0), None);
    }
}
