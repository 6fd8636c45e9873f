//! Bit-field helpers shared by the raw word accessors and the encoders.
//!
//! All truncation is done with an explicit AND against `(1 << width) - 1`.

/// Returns a mask with the low `width` bits set.
#[inline]
pub const fn mask(width: u32) -> u32 {
    if width >= u32::BITS {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Returns a 64-bit mask with the low `width` bits set.
#[inline]
pub const fn mask64(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Reads `width` bits of `word` starting at bit `offset`.
#[inline]
pub const fn extract(word: u32, offset: u32, width: u32) -> u32 {
    (word >> offset) & mask(width)
}

/// Returns `word` with bits `offset..offset + width` replaced by the low
/// `width` bits of `value`.
#[inline]
pub const fn insert(word: u32, offset: u32, width: u32, value: u32) -> u32 {
    let field = mask(width) << offset;
    (word & !field) | ((value & mask(width)) << offset)
}
