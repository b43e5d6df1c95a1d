//! Rank/select bit vector with a two-level cumulative index.

use crate::bitmap::{
    U64_BIT_SIZE, clear_bit, get_bit, popcount, rank_word, select_in_word, set_bit,
};
use crate::error::{Error, Result};

// 8 words = 512 bits per coarse block
const BLOCK_WORDS: usize = 8;

/// Bit vector supporting `rank`, `select`, and `select0` in O(1)-ish time
/// via a coarse per-block index and a fine per-word index, plus O(n) bit
/// `insert`/`remove` for the succinct trie's in-place edits.
///
/// Index layout:
/// - `coarse[b]` = total set bits in blocks `0..=b` (cumulative),
/// - `fine[w]` = set bits in the words of `w`'s block that precede `w`.
///
/// Bits in `words` beyond `len` are always zero.
#[derive(Debug, Clone, Default)]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
    ones: usize,
    coarse: Vec<u32>,
    fine: Vec<u16>,
}

impl BitVector {
    /// Empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// All-zero vector of `len` bits.
    pub fn zeroed(len: usize) -> Self {
        let mut bv = Self {
            words: vec![0u64; len.div_ceil(U64_BIT_SIZE)],
            len,
            ..Self::default()
        };
        bv.rebuild_index();
        bv
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.ones
    }

    /// Number of clear bits.
    pub fn count_zeros(&self) -> usize {
        self.len - self.ones
    }

    /// Read bit `pos`.
    pub fn get(&self, pos: usize) -> bool {
        debug_assert!(pos < self.len);
        get_bit(&self.words, pos)
    }

    /// Set bit `pos`, updating both index levels in place.
    pub fn set(&mut self, pos: usize) {
        debug_assert!(pos < self.len);
        if get_bit(&self.words, pos) {
            return;
        }
        set_bit(&mut self.words, pos);
        self.ones += 1;
        self.bump_index(pos, 1);
    }

    /// Clear bit `pos`, updating both index levels in place.
    pub fn clear(&mut self, pos: usize) {
        debug_assert!(pos < self.len);
        if !get_bit(&self.words, pos) {
            return;
        }
        clear_bit(&mut self.words, pos);
        self.ones -= 1;
        self.bump_index(pos, -1);
    }

    /// Number of set bits strictly below `pos` (`pos` may equal `len`).
    pub fn rank(&self, pos: usize) -> usize {
        debug_assert!(pos <= self.len);
        let w = pos / U64_BIT_SIZE;
        if w == self.words.len() {
            return self.ones;
        }
        let b = w / BLOCK_WORDS;
        let base = if b == 0 { 0 } else { self.coarse[b - 1] as usize };
        base + self.fine[w] as usize + rank_word(self.words[w], pos % U64_BIT_SIZE)
    }

    /// Number of clear bits strictly below `pos`.
    pub fn rank0(&self, pos: usize) -> usize {
        pos - self.rank(pos)
    }

    /// Position of the `rank`-th (0-based) set bit.
    pub fn select(&self, rank: usize) -> Result<usize> {
        if rank >= self.ones {
            return Err(Error::OutOfRange {
                index: rank,
                available: self.ones,
            });
        }
        // first block whose cumulative count exceeds rank
        let b = self.coarse.partition_point(|&c| c as usize <= rank);
        let base = if b == 0 { 0 } else { self.coarse[b - 1] as usize };
        let rem = rank - base;
        let start = b * BLOCK_WORDS;
        let end = (start + BLOCK_WORDS).min(self.words.len());
        // last word in the block with fine count <= rem
        let fine = &self.fine[start..end];
        let w = start + fine.partition_point(|&f| f as usize <= rem) - 1;
        Ok(w * U64_BIT_SIZE + select_in_word(self.words[w], rem - self.fine[w] as usize))
    }

    /// Position of the `rank`-th (0-based) clear bit.
    pub fn select0(&self, rank: usize) -> Result<usize> {
        let zeros = self.len - self.ones;
        if rank >= zeros {
            return Err(Error::OutOfRange {
                index: rank,
                available: zeros,
            });
        }
        // zero counts derive from the ones index: bits through a block minus
        // its cumulative ones. padding zeros past `len` sit after every real
        // zero, so rank < zeros keeps the answer below `len`.
        let zeros_through = |b: usize| -> usize {
            let covered = ((b + 1) * BLOCK_WORDS).min(self.words.len());
            covered * U64_BIT_SIZE - self.coarse[b] as usize
        };
        let (mut lo, mut hi) = (0usize, self.coarse.len() - 1);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if zeros_through(mid) <= rank {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let b = lo;
        let base = if b == 0 { 0 } else { zeros_through(b - 1) };
        let rem = rank - base;
        let start = b * BLOCK_WORDS;
        let end = (start + BLOCK_WORDS).min(self.words.len());
        // zeros before word start+j within the block = j*64 - fine[start+j]
        let mut w = start;
        for j in 1..end - start {
            if j * U64_BIT_SIZE - self.fine[start + j] as usize <= rem {
                w = start + j;
            } else {
                break;
            }
        }
        let zeros_before = (w - start) * U64_BIT_SIZE - self.fine[w] as usize;
        Ok(w * U64_BIT_SIZE + select_in_word(!self.words[w], rem - zeros_before))
    }

    /// Append a bit.
    pub fn push(&mut self, bit: bool) {
        let pos = self.len;
        if pos % U64_BIT_SIZE == 0 {
            self.words.push(0);
            let w = self.words.len() - 1;
            if w % BLOCK_WORDS == 0 {
                self.fine.push(0);
                self.coarse.push(self.ones as u32);
            } else {
                let prev = self.fine[w - 1] as usize + popcount(self.words[w - 1]);
                self.fine.push(prev as u16);
            }
        }
        self.len += 1;
        if bit {
            self.set(pos);
        }
    }

    /// Insert `bit` at `pos`, shifting all later bits up. O(len / 64).
    pub fn insert(&mut self, pos: usize, bit: bool) {
        debug_assert!(pos <= self.len);
        if self.len % U64_BIT_SIZE == 0 {
            self.words.push(0);
        }
        let w = pos / U64_BIT_SIZE;
        let off = pos % U64_BIT_SIZE;
        for j in (w + 1..self.words.len()).rev() {
            self.words[j] = (self.words[j] << 1) | (self.words[j - 1] >> 63);
        }
        let low = self.words[w] & (1u64 << off).wrapping_sub(1);
        self.words[w] = low | (((self.words[w] >> off) << 1) << off);
        if bit {
            self.words[w] |= 1u64 << off;
        }
        self.len += 1;
        self.rebuild_index();
    }

    /// Remove the bit at `pos`, shifting all later bits down. O(len / 64).
    pub fn remove(&mut self, pos: usize) -> bool {
        debug_assert!(pos < self.len);
        let bit = get_bit(&self.words, pos);
        let w = pos / U64_BIT_SIZE;
        let off = pos % U64_BIT_SIZE;
        let low = self.words[w] & (1u64 << off).wrapping_sub(1);
        self.words[w] = if off == U64_BIT_SIZE - 1 {
            low
        } else {
            low | ((self.words[w] >> (off + 1)) << off)
        };
        for j in w + 1..self.words.len() {
            self.words[j - 1] |= (self.words[j] & 1) << 63;
            self.words[j] >>= 1;
        }
        self.len -= 1;
        self.words.truncate(self.len.div_ceil(U64_BIT_SIZE));
        self.rebuild_index();
        bit
    }

    fn rebuild_index(&mut self) {
        let n_words = self.words.len();
        self.fine.clear();
        self.coarse.clear();
        self.fine.reserve(n_words);
        self.coarse.reserve(n_words.div_ceil(BLOCK_WORDS));
        let mut total = 0usize;
        for (w, &word) in self.words.iter().enumerate() {
            if w % BLOCK_WORDS == 0 {
                if w > 0 {
                    self.coarse.push(total as u32);
                }
                self.fine.push(0);
            } else {
                let prev = self.fine[w - 1] as usize + popcount(self.words[w - 1]);
                self.fine.push(prev as u16);
            }
            total += popcount(word);
        }
        if n_words > 0 {
            self.coarse.push(total as u32);
        }
        self.ones = total;
    }

    // set/clear touched one bit; shift the index entries after it
    fn bump_index(&mut self, pos: usize, delta: i32) {
        let w = pos / U64_BIT_SIZE;
        let b = w / BLOCK_WORDS;
        let block_end = ((b + 1) * BLOCK_WORDS).min(self.words.len());
        for ww in w + 1..block_end {
            self.fine[ww] = (self.fine[ww] as i32 + delta) as u16;
        }
        for bb in b..self.coarse.len() {
            self.coarse[bb] = (self.coarse[bb] as i32 + delta) as u32;
        }
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bv = Self::new();
        for bit in iter {
            bv.push(bit);
        }
        bv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_str(s: &str) -> BitVector {
        s.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_get_set_clear() {
        let mut bv = BitVector::zeroed(200);
        bv.set(0);
        bv.set(63);
        bv.set(64);
        bv.set(199);
        assert!(bv.get(0));
        assert!(bv.get(63));
        assert!(bv.get(64));
        assert!(bv.get(199));
        assert!(!bv.get(100));
        assert_eq!(bv.count_ones(), 4);
        bv.clear(63);
        assert!(!bv.get(63));
        assert_eq!(bv.count_ones(), 3);
    }

    #[test]
    fn test_rank_small() {
        let bv = from_str("10110");
        assert_eq!(bv.rank(0), 0);
        assert_eq!(bv.rank(1), 1);
        assert_eq!(bv.rank(2), 1);
        assert_eq!(bv.rank(3), 2);
        assert_eq!(bv.rank(5), 3);
        assert_eq!(bv.rank0(5), 2);
    }

    #[test]
    fn test_select_small() {
        let bv = from_str("10110");
        assert_eq!(bv.select(0), Ok(0));
        assert_eq!(bv.select(1), Ok(2));
        assert_eq!(bv.select(2), Ok(3));
        assert_eq!(
            bv.select(3),
            Err(Error::OutOfRange {
                index: 3,
                available: 3
            })
        );
        assert_eq!(bv.select0(0), Ok(1));
        assert_eq!(bv.select0(1), Ok(4));
        assert_eq!(
            bv.select0(2),
            Err(Error::OutOfRange {
                index: 2,
                available: 2
            })
        );
    }

    #[test]
    fn test_rank_select_laws_multi_word() {
        // every 3rd bit set over several blocks
        let len = 4096 + 17;
        let mut bv = BitVector::zeroed(len);
        for i in (0..len).step_by(3) {
            bv.set(i);
        }
        assert_eq!(bv.count_ones(), len.div_ceil(3));
        for k in 0..bv.count_ones() {
            let pos = bv.select(k).unwrap();
            assert_eq!(pos, 3 * k);
            assert_eq!(bv.rank(pos), k);
            assert!(bv.get(pos));
        }
        for k in 0..bv.count_zeros() {
            let pos = bv.select0(k).unwrap();
            assert_eq!(bv.rank0(pos), k);
            assert!(!bv.get(pos));
        }
        assert_eq!(bv.rank(len), bv.count_ones());
    }

    #[test]
    fn test_incremental_index_matches_rebuild() {
        let mut a = BitVector::zeroed(1000);
        for i in [0, 511, 512, 513, 999, 64, 65, 700] {
            a.set(i);
        }
        a.clear(512);
        let b: BitVector = (0..1000).map(|i| a.get(i)).collect();
        for pos in 0..=1000 {
            assert_eq!(a.rank(pos), b.rank(pos));
        }
        for k in 0..a.count_ones() {
            assert_eq!(a.select(k), b.select(k));
        }
    }

    #[test]
    fn test_insert_remove() {
        let mut bv = from_str("101");
        bv.insert(1, true);
        // 1101
        assert_eq!(bv.len(), 4);
        assert!(bv.get(0) && bv.get(1) && !bv.get(2) && bv.get(3));
        bv.insert(4, false);
        assert_eq!(bv.len(), 5);
        assert!(!bv.get(4));
        assert!(bv.remove(0));
        // 1010
        assert_eq!(bv.len(), 4);
        assert!(bv.get(0) && !bv.get(1) && bv.get(2) && !bv.get(3));
        assert_eq!(bv.count_ones(), 2);
    }

    #[test]
    fn test_insert_across_word_boundary() {
        let mut bv = BitVector::zeroed(64);
        bv.set(63);
        bv.insert(0, false);
        assert_eq!(bv.len(), 65);
        assert!(!bv.get(63));
        assert!(bv.get(64));
        assert_eq!(bv.rank(65), 1);
        bv.remove(0);
        assert_eq!(bv.len(), 64);
        assert!(bv.get(63));
    }

    #[test]
    fn test_push() {
        let mut bv = BitVector::new();
        for i in 0..300 {
            bv.push(i % 7 == 0);
        }
        assert_eq!(bv.len(), 300);
        assert_eq!(bv.count_ones(), 300usize.div_ceil(7));
        assert_eq!(bv.select(1), Ok(7));
        assert_eq!(bv.rank(300), bv.count_ones());
    }
}
