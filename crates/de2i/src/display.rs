//! Seven-segment display patterns
//!
//! Segments are active-low: a cleared bit lights the segment, a set bit
//! turns it off. Bits 0..6 drive segments a..g, bit 7 the decimal point,
//! and the upper bits are left set so unused digits stay dark.
//!
//! ```text
//!      a
//!     ---
//!  f |   | b
//!     -g-
//!  e |   | c
//!     ---
//!      d
//! ```

/// All segments off
pub const BLANK: u32 = 0xFFFF_FFFF;

/// Patterns for the decimal digits 0-9
pub const DIGITS: [u32; 10] = [
    0xFFFF_FFC0, // 0
    0xFFFF_FFF9, // 1
    0xFFFF_FFA4, // 2
    0xFFFF_FFB0, // 3
    0xFFFF_FF99, // 4
    0xFFFF_FF92, // 5
    0xFFFF_FF82, // 6
    0xFFFF_FFF8, // 7
    0xFFFF_FF80, // 8
    0xFFFF_FF90, // 9
];

/// Pattern showing the last decimal digit of `value`
///
/// The board has a single digit per side, so 12 shows as 2.
#[inline]
pub const fn digit_pattern(value: u32) -> u32 {
    DIGITS[(value % 10) as usize]
}
