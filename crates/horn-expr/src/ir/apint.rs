//! Fixed-width two's-complement integers
//!
//! `ApInt` is the bit pattern carried by IR integer constants. Widths are
//! arbitrary (including zero and multi-word widths); the words are stored
//! little-endian and the bits above `width` are always kept clear.

/// Bits per storage word.
pub const WORD_BITS: u32 = 64;

fn words_for(width: u32) -> usize {
    ((u64::from(width) + u64::from(WORD_BITS) - 1) / u64::from(WORD_BITS)) as usize
}

/// A fixed-width two's-complement bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApInt {
    width: u32,
    words: Vec<u64>,
}

impl ApInt {
    /// All-zero value of the given width.
    pub fn zero(width: u32) -> Self {
        Self {
            width,
            words: vec![0; words_for(width)],
        }
    }

    /// Unsigned value truncated to `width` bits.
    pub fn from_u64(width: u32, value: u64) -> Self {
        let mut result = Self::zero(width);
        if let Some(low) = result.words.first_mut() {
            *low = value;
        }
        result.clear_unused_bits();
        result
    }

    /// Signed value, sign-extended to `width` bits and then truncated.
    pub fn from_i64(width: u32, value: i64) -> Self {
        let fill = if value < 0 { u64::MAX } else { 0 };
        let mut words = vec![fill; words_for(width)];
        if let Some(low) = words.first_mut() {
            *low = value as u64;
        }
        let mut result = Self { width, words };
        result.clear_unused_bits();
        result
    }

    /// Build from little-endian words. Missing words are zero, extra words
    /// and bits above `width` are dropped.
    pub fn from_words(width: u32, mut words: Vec<u64>) -> Self {
        words.resize(words_for(width), 0);
        let mut result = Self { width, words };
        result.clear_unused_bits();
        result
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Little-endian storage words.
    pub fn raw_data(&self) -> &[u64] {
        &self.words
    }

    /// Value of bit `index` (false past the width).
    pub fn bit(&self, index: u32) -> bool {
        if index >= self.width {
            return false;
        }
        let word = self.words[(index / WORD_BITS) as usize];
        (word >> (index % WORD_BITS)) & 1 == 1
    }

    /// Sign bit set. A zero-width value is never negative.
    pub fn is_negative(&self) -> bool {
        self.width > 0 && self.bit(self.width - 1)
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Sign bit set and every other bit clear.
    pub fn is_min_signed(&self) -> bool {
        self.is_negative() && (0..self.width - 1).all(|i| !self.bit(i))
    }

    /// `!self + 1`, truncated to the width.
    pub fn twos_complement_negate(&self) -> Self {
        let mut words: Vec<u64> = self.words.iter().map(|w| !w).collect();
        let mut carry = true;
        for word in &mut words {
            if !carry {
                break;
            }
            let (sum, overflow) = word.overflowing_add(1);
            *word = sum;
            carry = overflow;
        }
        let mut result = Self {
            width: self.width,
            words,
        };
        result.clear_unused_bits();
        result
    }

    /// Magnitude of the signed interpretation. The minimum signed value is
    /// its own negation and is returned unchanged; read it as unsigned.
    pub fn abs(&self) -> Self {
        if self.is_negative() {
            self.twos_complement_negate()
        } else {
            self.clone()
        }
    }

    fn clear_unused_bits(&mut self) {
        let rem = self.width % WORD_BITS;
        if rem != 0 {
            if let Some(top) = self.words.last_mut() {
                *top &= (1u64 << rem) - 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_counts() {
        assert_eq!(ApInt::zero(0).num_words(), 0);
        assert_eq!(ApInt::zero(1).num_words(), 1);
        assert_eq!(ApInt::zero(64).num_words(), 1);
        assert_eq!(ApInt::zero(65).num_words(), 2);
        assert_eq!(ApInt::zero(256).num_words(), 4);
    }

    #[test]
    fn test_from_i64_sign_extends() {
        let v = ApInt::from_i64(128, -1);
        assert_eq!(v.raw_data(), &[u64::MAX, u64::MAX]);
        assert!(v.is_negative());

        let v = ApInt::from_i64(8, -128);
        assert_eq!(v.raw_data(), &[0x80]);
        assert!(v.is_min_signed());
    }

    #[test]
    fn test_truncation_clears_high_bits() {
        let v = ApInt::from_u64(4, 0xff);
        assert_eq!(v.raw_data(), &[0x0f]);
        let v = ApInt::from_words(70, vec![1, u64::MAX, 7]);
        assert_eq!(v.raw_data(), &[1, 0x3f]);
    }

    #[test]
    fn test_negate() {
        let five = ApInt::from_u64(8, 5);
        assert_eq!(five.twos_complement_negate(), ApInt::from_i64(8, -5));

        // carry propagates across the word boundary
        let v = ApInt::from_words(128, vec![0, 1]);
        let neg = v.twos_complement_negate();
        assert_eq!(neg.raw_data(), &[0, u64::MAX]);

        assert_eq!(ApInt::zero(32).twos_complement_negate(), ApInt::zero(32));
    }

    #[test]
    fn test_min_signed_is_own_negation() {
        for width in [1u32, 8, 32, 64, 128, 256] {
            let mut words = vec![0u64; words_for(width)];
            let top = (width - 1) as usize;
            words[top / 64] = 1u64 << (top % 64);
            let min = ApInt::from_words(width, words);
            assert!(min.is_min_signed(), "width {width}");
            assert_eq!(min.abs(), min);
        }
    }

    #[test]
    fn test_zero_width() {
        let v = ApInt::from_i64(0, -7);
        assert!(v.is_zero());
        assert!(!v.is_negative());
        assert!(!v.bit(0));
    }
}
