//! The fixed 30-part division of the Quran, with boundaries in the 604-page Madani mushaf.

use serde::Serialize;

pub const JUZ_COUNT: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Juz {
    pub number: u8,
    pub start_surah: u16,
    pub start_verse: u16,
    pub end_surah: u16,
    pub end_verse: u16,
    pub start_page: u16,
    pub end_page: u16,
    pub total_pages: u16,
}

impl Juz {
    const fn new(
        number: u8,
        (start_surah, start_verse): (u16, u16),
        (end_surah, end_verse): (u16, u16),
        (start_page, end_page): (u16, u16),
    ) -> Self {
        Juz {
            number,
            start_surah,
            start_verse,
            end_surah,
            end_verse,
            start_page,
            end_page,
            total_pages: end_page - start_page + 1,
        }
    }

    /// Whether `surah:verse` falls inside this juz (inclusive on both ends).
    pub fn contains(&self, surah: u16, verse: u16) -> bool {
        let at = (surah, verse);
        at >= (self.start_surah, self.start_verse) && at <= (self.end_surah, self.end_verse)
    }
}

pub const JUZ_TABLE: [Juz; JUZ_COUNT as usize] = [
    Juz::new(1, (1, 1), (2, 141), (1, 21)),
    Juz::new(2, (2, 142), (2, 252), (22, 41)),
    Juz::new(3, (2, 253), (3, 92), (42, 61)),
    Juz::new(4, (3, 93), (4, 23), (62, 81)),
    Juz::new(5, (4, 24), (4, 147), (82, 101)),
    Juz::new(6, (4, 148), (5, 81), (102, 121)),
    Juz::new(7, (5, 82), (6, 110), (122, 141)),
    Juz::new(8, (6, 111), (7, 87), (142, 161)),
    Juz::new(9, (7, 88), (8, 40), (162, 181)),
    Juz::new(10, (8, 41), (9, 92), (182, 201)),
    Juz::new(11, (9, 93), (11, 5), (202, 221)),
    Juz::new(12, (11, 6), (12, 52), (222, 241)),
    Juz::new(13, (12, 53), (14, 52), (242, 261)),
    Juz::new(14, (15, 1), (16, 128), (262, 281)),
    Juz::new(15, (17, 1), (18, 74), (282, 301)),
    Juz::new(16, (18, 75), (20, 135), (302, 321)),
    Juz::new(17, (21, 1), (22, 78), (322, 341)),
    Juz::new(18, (23, 1), (25, 20), (342, 361)),
    Juz::new(19, (25, 21), (27, 55), (362, 381)),
    Juz::new(20, (27, 56), (29, 45), (382, 401)),
    Juz::new(21, (29, 46), (33, 30), (402, 421)),
    Juz::new(22, (33, 31), (36, 27), (422, 441)),
    Juz::new(23, (36, 28), (39, 31), (442, 461)),
    Juz::new(24, (39, 32), (41, 46), (462, 481)),
    Juz::new(25, (41, 47), (45, 37), (482, 501)),
    Juz::new(26, (46, 1), (51, 30), (502, 521)),
    Juz::new(27, (51, 31), (57, 29), (522, 541)),
    Juz::new(28, (58, 1), (66, 12), (542, 561)),
    Juz::new(29, (67, 1), (77, 50), (562, 581)),
    Juz::new(30, (78, 1), (114, 6), (582, 604)),
];

pub fn is_valid_juz(number: i64) -> bool {
    (1..=JUZ_COUNT as i64).contains(&number)
}

pub fn juz_info(number: u8) -> Option<&'static Juz> {
    if !is_valid_juz(number as i64) {
        return None;
    }
    JUZ_TABLE.get(number as usize - 1)
}

pub fn all_juz() -> &'static [Juz] {
    &JUZ_TABLE
}

/// Pages covered by the given juz numbers; unknown numbers count as zero.
pub fn pages_for<I: IntoIterator<Item = u8>>(numbers: I) -> u32 {
    numbers
        .into_iter()
        .filter_map(juz_info)
        .map(|j| j.total_pages as u32)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_contiguous_and_covers_the_mushaf() {
        for (i, juz) in JUZ_TABLE.iter().enumerate() {
            assert_eq!(juz.number as usize, i + 1);
            assert_eq!(juz.total_pages, juz.end_page - juz.start_page + 1);
            if let Some(next) = JUZ_TABLE.get(i + 1) {
                assert_eq!(next.start_page, juz.end_page + 1);
            }
        }
        assert_eq!(JUZ_TABLE[0].start_page, 1);
        assert_eq!(JUZ_TABLE[29].end_page, 604);
        assert_eq!(pages_for(1..=30), 604);
    }

    #[test]
    fn lookup_rejects_out_of_range() {
        assert!(juz_info(0).is_none());
        assert!(juz_info(31).is_none());
        assert_eq!(juz_info(30).map(|j| j.start_surah), Some(78));
        assert_eq!(pages_for([0, 31, 200]), 0);
    }

    #[test]
    fn first_three_share_al_baqarah() {
        assert!(JUZ_TABLE[..3].iter().all(|j| j.start_surah <= 2 && j.end_surah >= 2));
        assert!(juz_info(1).unwrap().contains(2, 141));
        assert!(!juz_info(1).unwrap().contains(2, 142));
        assert!(juz_info(2).unwrap().contains(2, 142));
        assert!(juz_info(3).unwrap().contains(2, 253));
        assert!(juz_info(3).unwrap().contains(3, 1));
    }
}
