//! Exact numeric view of Kubernetes resource quantities.
//!
//! The API server stores quantities in canonical form, so the literal a batch
//! asked for (`1000m`) can come back as a different literal (`1`). `Quantity`
//! parses both into `mantissa * 10^pow10 * 2^pow2` so that they can be
//! compared without floating point rounding.

use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing a quantity literal
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QuantityError {
    /// Empty literal
    #[error("empty quantity")]
    Empty,

    /// Numeric part is malformed
    #[error("invalid number in quantity '{0}'")]
    InvalidNumber(String),

    /// Suffix is not a known SI, binary or exponent suffix
    #[error("unknown suffix '{suffix}' in quantity '{literal}'")]
    UnknownSuffix {
        /// The offending suffix
        suffix: String,
        /// The whole literal
        literal: String,
    },

    /// Too many significant digits or an exponent out of range
    #[error("quantity '{0}' is too large")]
    Overflow(String),
}

/// A parsed resource quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity {
    mantissa: i128,
    pow10: i32,
    pow2: u32,
}

impl Quantity {
    /// Exact comparison of two quantities.
    ///
    /// `None` when the pair cannot be brought to a common exponent without
    /// overflowing.
    pub fn compare(&self, other: &Quantity) -> Option<Ordering> {
        if self.mantissa == 0 || other.mantissa == 0 || self.mantissa.signum() != other.mantissa.signum() {
            return Some(self.mantissa.signum().cmp(&other.mantissa.signum()));
        }
        Some(self.scaled_to(other)?.cmp(&other.scaled_to(self)?))
    }

    /// True only when both quantities provably denote the same amount
    pub fn same_amount(&self, other: &Quantity) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Numerator of this quantity expressed at the smaller decimal exponent of the pair
    fn scaled_to(&self, other: &Quantity) -> Option<i128> {
        let common = self.pow10.min(other.pow10);
        let shift = u32::try_from(self.pow10.checked_sub(common)?).ok()?;
        let binary = 1i128.checked_shl(self.pow2)?;
        self.mantissa
            .checked_mul(binary)?
            .checked_mul(10i128.checked_pow(shift)?)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(literal: &str) -> Result<Self, Self::Err> {
        if literal.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, unsigned) = match literal.as_bytes()[0] {
            b'-' => (true, &literal[1..]),
            b'+' => (false, &literal[1..]),
            _ => (false, literal),
        };

        let number_len = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(number_len);

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
            return Err(QuantityError::InvalidNumber(literal.to_string()));
        }

        let digits = format!("{whole}{fraction}");
        let magnitude: i128 = digits
            .parse()
            .map_err(|_| QuantityError::Overflow(literal.to_string()))?;
        let fraction_len = i32::try_from(fraction.len())
            .map_err(|_| QuantityError::Overflow(literal.to_string()))?;

        let (suffix_pow10, pow2) = parse_suffix(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
            suffix: suffix.to_string(),
            literal: literal.to_string(),
        })?;

        Ok(Quantity {
            mantissa: if negative { -magnitude } else { magnitude },
            pow10: suffix_pow10
                .checked_sub(fraction_len)
                .ok_or_else(|| QuantityError::Overflow(literal.to_string()))?,
            pow2,
        })
    }
}

/// Maps a suffix to (decimal exponent, binary exponent)
fn parse_suffix(suffix: &str) -> Option<(i32, u32)> {
    let factors = match suffix {
        "" => (0, 0),
        "n" => (-9, 0),
        "u" => (-6, 0),
        "m" => (-3, 0),
        "k" => (3, 0),
        "M" => (6, 0),
        "G" => (9, 0),
        "T" => (12, 0),
        "P" => (15, 0),
        "E" => (18, 0),
        "Ki" => (0, 10),
        "Mi" => (0, 20),
        "Gi" => (0, 30),
        "Ti" => (0, 40),
        "Pi" => (0, 50),
        "Ei" => (0, 60),
        _ => {
            let exponent = suffix.strip_prefix(['e', 'E'])?;
            (exponent.parse().ok()?, 0)
        }
    };
    Some(factors)
}

/// Compares two quantity literals by amount; falls back to literal equality
/// when either side cannot be parsed.
pub fn same_amount(a: &str, b: &str) -> bool {
    match (a.parse::<Quantity>(), b.parse::<Quantity>()) {
        (Ok(a), Ok(b)) => a.same_amount(&b),
        _ => a == b,
    }
}
