//! Word-level bit primitives shared by the bit vector and the tries.

pub const U64_BIT_SIZE: usize = 64;

/// Set bit `pos` in a word slice.
pub fn set_bit(words: &mut [u64], pos: usize) {
    words[pos / U64_BIT_SIZE] |= 1u64 << (pos % U64_BIT_SIZE);
}

/// Clear bit `pos` in a word slice.
pub fn clear_bit(words: &mut [u64], pos: usize) {
    words[pos / U64_BIT_SIZE] &= !(1u64 << (pos % U64_BIT_SIZE));
}

/// Read bit `pos` from a word slice.
pub fn get_bit(words: &[u64], pos: usize) -> bool {
    (words[pos / U64_BIT_SIZE] >> (pos % U64_BIT_SIZE)) & 1 == 1
}

/// Number of set bits in a word.
#[inline]
pub fn popcount(word: u64) -> usize {
    word.count_ones() as usize
}

/// Number of set bits strictly below `pos` (0..=64).
#[inline]
pub fn rank_word(word: u64, pos: usize) -> usize {
    if pos >= U64_BIT_SIZE {
        popcount(word)
    } else {
        popcount(word & ((1u64 << pos) - 1))
    }
}

/// Position of the `rank`-th (0-based) set bit of `word`.
///
/// Requires `rank < popcount(word)`.
#[inline]
pub fn select_in_word(word: u64, rank: usize) -> usize {
    debug_assert!(rank < popcount(word));
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("bmi2") {
            // safety: bmi2 availability checked above
            return unsafe { select_in_word_bmi2(word, rank) };
        }
    }
    select_in_word_portable(word, rank)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "bmi2")]
unsafe fn select_in_word_bmi2(word: u64, rank: usize) -> usize {
    use std::arch::x86_64::_pdep_u64;
    // deposit a lone bit at the rank-th set position, then locate it
    _pdep_u64(1u64 << rank, word).trailing_zeros() as usize
}

fn select_in_word_portable(word: u64, rank: usize) -> usize {
    let mut word = word;
    for _ in 0..rank {
        word &= word - 1;
    }
    word.trailing_zeros() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clear_get() {
        let mut words = vec![0u64; 2];
        set_bit(&mut words, 3);
        set_bit(&mut words, 64);
        set_bit(&mut words, 127);
        assert!(get_bit(&words, 3));
        assert!(get_bit(&words, 64));
        assert!(get_bit(&words, 127));
        assert!(!get_bit(&words, 4));
        clear_bit(&mut words, 64);
        assert!(!get_bit(&words, 64));
        assert!(get_bit(&words, 127));
    }

    #[test]
    fn test_rank_word() {
        let word = 0b1011_0100u64;
        assert_eq!(rank_word(word, 0), 0);
        assert_eq!(rank_word(word, 3), 1);
        assert_eq!(rank_word(word, 8), 4);
        assert_eq!(rank_word(word, 64), 4);
        assert_eq!(rank_word(u64::MAX, 64), 64);
        assert_eq!(rank_word(u64::MAX, 13), 13);
    }

    #[test]
    fn test_select_in_word() {
        let word = 0b1011_0100u64;
        assert_eq!(select_in_word(word, 0), 2);
        assert_eq!(select_in_word(word, 1), 4);
        assert_eq!(select_in_word(word, 2), 5);
        assert_eq!(select_in_word(word, 3), 7);
        assert_eq!(select_in_word(u64::MAX, 63), 63);
        assert_eq!(select_in_word(1u64 << 63, 0), 63);
    }

    #[test]
    fn test_select_matches_portable() {
        let words = [
            0x8000_0000_0000_0001u64,
            0xAAAA_AAAA_AAAA_AAAA,
            0x0123_4567_89AB_CDEF,
            u64::MAX,
        ];
        for &word in &words {
            for rank in 0..popcount(word) {
                assert_eq!(select_in_word(word, rank), select_in_word_portable(word, rank));
            }
        }
    }

    #[test]
    fn test_rank_select_inverse() {
        let word = 0xDEAD_BEEF_CAFE_F00Du64;
        for rank in 0..popcount(word) {
            let pos = select_in_word(word, rank);
            assert_eq!(rank_word(word, pos), rank);
            assert!(get_bit(&[word], pos));
        }
    }
}
