//! Symbol-table index decoder for packed scripts
//!
//! Packed scripts encode symbol-table indices as short tokens in a numeric
//! base between 2 and 95. [`Unbaser`] turns a token back into its index.

use crate::error::{EmbedError, Result};

const ALPHABET_62: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const MIN_RADIX: u32 = 2;
pub const MAX_RADIX: u32 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alphabet {
    /// Case-insensitive digits and letters
    Standard,
    /// `0-9a-zA-Z` truncated to the radix
    Extended,
    /// Printable ASCII from space to `~`
    Printable,
}

/// Converts base-N tokens back to integers
///
/// A symbol that is not part of the alphabet contributes 0 instead of
/// failing the whole token.
#[derive(Debug, Clone, Copy)]
pub struct Unbaser {
    radix: u32,
    alphabet: Alphabet,
}

impl Unbaser {
    /// Create an unbaser for `radix`
    ///
    /// # Errors
    /// Returns `Decode` if radix is outside `2..=95`
    pub fn new(radix: u32) -> Result<Self> {
        let alphabet = match radix {
            2..=36 => Alphabet::Standard,
            37..=62 => Alphabet::Extended,
            63..=95 => Alphabet::Printable,
            _ => {
                return Err(EmbedError::Decode(format!(
                    "Unsupported radix {} (expected {}..={})",
                    radix, MIN_RADIX, MAX_RADIX
                )));
            }
        };
        Ok(Self { radix, alphabet })
    }

    pub fn radix(&self) -> u32 {
        self.radix
    }

    /// Decode a token to its integer value
    pub fn unbase(&self, token: &str) -> u64 {
        let radix = u64::from(self.radix);
        let mut value: u64 = 0;
        let mut weight: u64 = 1;

        for symbol in token.chars().rev() {
            let rank = self.rank(symbol).unwrap_or(0);
            value = value.saturating_add(rank.saturating_mul(weight));
            weight = weight.saturating_mul(radix);
        }

        value
    }

    fn rank(&self, symbol: char) -> Option<u64> {
        match self.alphabet {
            Alphabet::Standard => symbol.to_digit(self.radix).map(u64::from),
            Alphabet::Extended => ALPHABET_62
                .chars()
                .take(self.radix as usize)
                .position(|c| c == symbol)
                .map(|p| p as u64),
            Alphabet::Printable => {
                let code = u32::from(symbol);
                (0x20..=0x7e).contains(&code).then(|| u64::from(code - 0x20))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Encode `value` in `radix` using the same alphabet rules as [`Unbaser`]
    fn encode(mut value: u64, radix: u32) -> String {
        let symbols: Vec<char> = match radix {
            2..=36 => "0123456789abcdefghijklmnopqrstuvwxyz".chars().collect(),
            37..=62 => ALPHABET_62.chars().collect(),
            _ => (0x20u8..=0x7e).map(char::from).collect(),
        };
        let radix = u64::from(radix);
        if value == 0 {
            return symbols[0].to_string();
        }
        let mut out = Vec::new();
        while value > 0 {
            out.push(symbols[(value % radix) as usize]);
            value /= radix;
        }
        out.iter().rev().collect()
    }

    #[test]
    fn test_radix_bounds() {
        assert!(Unbaser::new(1).is_err());
        assert!(Unbaser::new(96).is_err());
        assert!(Unbaser::new(2).is_ok());
        assert!(Unbaser::new(95).is_ok());
        match Unbaser::new(0) {
            Err(EmbedError::Decode(msg)) => assert!(msg.contains("radix")),
            _ => panic!("Expected Decode error"),
        }
    }

    #[test]
    fn test_unbase_base36() {
        let unbaser = Unbaser::new(36).unwrap();
        assert_eq!(unbaser.unbase("0"), 0);
        assert_eq!(unbaser.unbase("z"), 35);
        assert_eq!(unbaser.unbase("10"), 36);
        // Case-insensitive below 37
        assert_eq!(unbaser.unbase("Z"), 35);
    }

    #[test]
    fn test_unbase_base62() {
        let unbaser = Unbaser::new(62).unwrap();
        assert_eq!(unbaser.unbase("a"), 10);
        assert_eq!(unbaser.unbase("A"), 36);
        assert_eq!(unbaser.unbase("Z"), 61);
        assert_eq!(unbaser.unbase("10"), 62);
        assert_eq!(unbaser.unbase("1Z"), 123);
    }

    #[test]
    fn test_unbase_truncated_alphabet() {
        let unbaser = Unbaser::new(40).unwrap();
        assert_eq!(unbaser.unbase("D"), 39);
        // 'E' is beyond the truncated alphabet and contributes 0
        assert_eq!(unbaser.unbase("E"), 0);
        assert_eq!(unbaser.unbase("1E"), 40);
    }

    #[test]
    fn test_unbase_printable() {
        let unbaser = Unbaser::new(95).unwrap();
        assert_eq!(unbaser.unbase(" "), 0);
        assert_eq!(unbaser.unbase("!"), 1);
        assert_eq!(unbaser.unbase("~"), 94);
        assert_eq!(unbaser.unbase("! "), 95);
    }

    #[test]
    fn test_unknown_symbol_contributes_zero() {
        let unbaser = Unbaser::new(10).unwrap();
        assert_eq!(unbaser.unbase("1x3"), 103);
    }

    #[test]
    fn test_long_token_saturates() {
        let unbaser = Unbaser::new(95).unwrap();
        let token = "~".repeat(64);
        assert_eq!(unbaser.unbase(&token), u64::MAX);
    }

    proptest! {
        #[test]
        fn prop_unbase_inverts_encoding(radix in MIN_RADIX..=MAX_RADIX, value in 0u64..1_000_000_000) {
            let unbaser = Unbaser::new(radix).unwrap();
            let token = encode(value, radix);
            prop_assert_eq!(unbaser.unbase(&token), value);
        }
    }
}
