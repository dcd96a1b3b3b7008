use std::ops::RangeInclusive;

/// Contains some helper methods to manipulate bits of a 32 bit word,
/// the index (`bit_idx`) goes from lsb to msb (right to left).
pub trait Bits: Copy {
    fn get_bit(self, bit_idx: u8) -> bool;

    /// Returns the bits in `bits_range` moved down to position 0.
    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self;

    fn set_bit(&mut self, bit_idx: u8, value: bool);

    /// Replaces the bits in `bits_range` with the low bits of `value`.
    fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self);
}

impl Bits for u32 {
    fn get_bit(self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < 32);
        (self >> bit_idx) & 0b1 == 0b1
    }

    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        (self & mask(&bits_range)) >> start
    }

    fn set_bit(&mut self, bit_idx: u8, value: bool) {
        debug_assert!(bit_idx < 32);
        let bit = 0b1 << bit_idx;
        if value {
            *self |= bit;
        } else {
            *self &= !bit;
        }
    }

    fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self) {
        let start = *bits_range.start();
        let mask = mask(&bits_range);
        *self = (*self & !mask) | ((value << start) & mask);
    }
}

/// A mask with ones exactly on `bits_range`.
fn mask(bits_range: &RangeInclusive<u8>) -> u32 {
    let (start, end) = (*bits_range.start(), *bits_range.end());
    debug_assert!(start <= end && end < 32);

    // Built in u64 so that a full 0..=31 range does not overflow the shift.
    let ones = (1_u64 << (end - start + 1)) - 1;
    (ones << start) as u32
}
