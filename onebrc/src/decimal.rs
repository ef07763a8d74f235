//! Fixed-point parsing of decimal tokens.
//!
//! Values are kept as whole millionths in an `i64` so that sums are exact and
//! merging partial results never depends on the order of additions.

/// Millionths per unit.
pub const SCALE: i64 = 1_000_000;

const FRACTION_DIGITS: usize = 6;

fn digit(byte: u8) -> Option<i64> {
    byte.is_ascii_digit().then(|| (byte - b'0') as i64)
}

/// Parses `[+-]?digits[.digits]` into millionths.
///
/// Either side of the dot may be empty but not both. Digits past the sixth
/// fractional place round the magnitude half away from zero. Returns `None`
/// for anything else, including values too large for the fixed-point range.
pub fn parse_millionths(bytes: &[u8]) -> Option<i64> {
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    let (int_part, frac_part) = match memchr::memchr(b'.', digits) {
        Some(dot) => (&digits[..dot], &digits[dot + 1..]),
        None => (digits, &digits[digits.len()..]),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut whole: i64 = 0;
    for &byte in int_part {
        whole = whole.checked_mul(10)?.checked_add(digit(byte)?)?;
    }

    let mut fraction: i64 = 0;
    let mut place = SCALE / 10;
    let mut round_up = false;
    for (index, &byte) in frac_part.iter().enumerate() {
        let d = digit(byte)?;
        if index < FRACTION_DIGITS {
            fraction += d * place;
            place /= 10;
        } else if index == FRACTION_DIGITS {
            round_up = d >= 5;
        }
    }

    let mut magnitude = whole.checked_mul(SCALE)?.checked_add(fraction)?;
    if round_up {
        magnitude = magnitude.checked_add(1)?;
    }

    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_one_decimal_place() {
        assert_eq!(parse_millionths(b"10.0"), Some(10_000_000));
        assert_eq!(parse_millionths(b"-99.9"), Some(-99_900_000));
        assert_eq!(parse_millionths(b"0.1"), Some(100_000));
    }

    #[test]
    fn test_parse_other_shapes() {
        assert_eq!(parse_millionths(b"42"), Some(42_000_000));
        assert_eq!(parse_millionths(b"+3.25"), Some(3_250_000));
        assert_eq!(parse_millionths(b".5"), Some(500_000));
        assert_eq!(parse_millionths(b"-.5"), Some(-500_000));
        assert_eq!(parse_millionths(b"7."), Some(7_000_000));
        assert_eq!(parse_millionths(b"-0.0"), Some(0));
        assert_eq!(parse_millionths(b"1234.5678"), Some(1_234_567_800));
    }

    #[test]
    fn test_extra_fraction_digits_round_half_away_from_zero() {
        assert_eq!(parse_millionths(b"0.0000005"), Some(1));
        assert_eq!(parse_millionths(b"0.00000049"), Some(0));
        assert_eq!(parse_millionths(b"-0.0000005"), Some(-1));
        assert_eq!(parse_millionths(b"1.1234564999"), Some(1_123_456));
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        let tokens: [&[u8]; 13] = [
            b"",
            b"-",
            b"+",
            b".",
            b"-.",
            b"abc",
            b"1.2.3",
            b"1e5",
            b" 1.0",
            b"1.0 ",
            b"5.0\r",
            b"--1",
            b"1.00000a",
        ];
        for token in tokens {
            assert_eq!(parse_millionths(token), None, "token {:?}", token);
        }
    }

    #[test]
    fn test_rejects_overflow() {
        assert_eq!(parse_millionths(b"99999999999999999999"), None);
        assert_eq!(parse_millionths(b"9300000000000"), None);
        assert!(parse_millionths(b"9000000000000").is_some());
    }
}
