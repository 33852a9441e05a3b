//! LED bank masks
//!
//! Bit n of a mask drives LED n of the bank (1 = lit). The red bank has 18
//! LEDs and the green bank 9; higher bits are ignored by the hardware.

/// Every LED off
pub const OFF: u32 = 0;

/// Every LED on
pub const ALL: u32 = 0xFFFF_FFFF;

/// Even LEDs lit
pub const ALTERNATING: u32 = 0x5555_5555;

/// Odd LEDs lit
pub const ALTERNATING_ODD: u32 = 0xAAAA_AAAA;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternating_patterns_are_complementary() {
        assert_eq!(ALTERNATING & ALTERNATING_ODD, OFF);
        assert_eq!(ALTERNATING | ALTERNATING_ODD, ALL);
    }
}
