//! Kubernetes style resource quantities
//!
//! Supports the three suffix families accepted by the orchestration platform:
//! binary (`Ki`..`Ei`), decimal (`n`..`E`) and exponent (`e3`). Values are held
//! exactly as a count of nano-units and rendered back in canonical form, so
//! `1024Mi` renders as `1Gi` and `0.5` as `500m`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;
use thiserror::Error;

const NANOS_PER_UNIT: i128 = 1_000_000_000;
const BINARY_SUFFIXES: [(&str, u32); 6] = [
    ("Ki", 1),
    ("Mi", 2),
    ("Gi", 3),
    ("Ti", 4),
    ("Pi", 5),
    ("Ei", 6),
];
const DECIMAL_SUFFIXES: [(&str, i32); 10] = [
    ("n", -9),
    ("u", -6),
    ("m", -3),
    ("", 0),
    ("k", 3),
    ("M", 6),
    ("G", 9),
    ("T", 12),
    ("P", 15),
    ("E", 18),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,

    #[error("invalid number in quantity {0:?}")]
    InvalidNumber(String),

    #[error("unknown suffix {suffix:?} in quantity {input:?}")]
    InvalidSuffix { input: String, suffix: String },

    #[error("quantity {0:?} is out of range")]
    OutOfRange(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityFormat {
    BinarySI,
    DecimalSI,
    DecimalExponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity {
    nanos: i128,
    format: QuantityFormat,
}

impl Quantity {
    /// `n` mebibytes.
    pub fn from_mebibytes(n: u32) -> Self {
        Self {
            nanos: i128::from(n) * 1024 * 1024 * NANOS_PER_UNIT,
            format: QuantityFormat::BinarySI,
        }
    }

    pub fn format(&self) -> QuantityFormat {
        self.format
    }

    /// Value in milli-units, rounded up.
    pub fn milli_value(&self) -> i128 {
        ceil_div(self.nanos, 1_000_000)
    }

    /// Value in whole units, rounded up.
    pub fn value(&self) -> i128 {
        ceil_div(self.nanos, NANOS_PER_UNIT)
    }

    fn parse_suffix(input: &str, suffix: &str) -> Result<(i128, i32, QuantityFormat), QuantityError> {
        if let Some((_, power)) = BINARY_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
            return Ok((1024_i128.pow(*power), 0, QuantityFormat::BinarySI));
        }
        if let Some((_, exp)) = DECIMAL_SUFFIXES.iter().find(|(s, _)| *s == suffix) {
            return Ok((1, *exp, QuantityFormat::DecimalSI));
        }
        if suffix.len() > 1 && (suffix.starts_with('e') || suffix.starts_with('E')) {
            if let Ok(exp) = suffix[1..].parse::<i32>() {
                return Ok((1, exp, QuantityFormat::DecimalExponent));
            }
        }
        Err(QuantityError::InvalidSuffix {
            input: input.to_string(),
            suffix: suffix.to_string(),
        })
    }

    fn canonical_binary(&self) -> Option<String> {
        if self.nanos % NANOS_PER_UNIT != 0 {
            return None;
        }
        let units = self.nanos / NANOS_PER_UNIT;
        if units.abs() < 1024 {
            return None;
        }
        for (suffix, power) in BINARY_SUFFIXES.iter().rev() {
            let base = 1024_i128.pow(*power);
            if units % base == 0 {
                return Some(format!("{}{}", units / base, suffix));
            }
        }
        Some(units.to_string())
    }

    fn canonical_decimal(&self, exponent_form: bool) -> String {
        for (suffix, exp) in DECIMAL_SUFFIXES.iter().rev() {
            let scale = 10_i128.pow((exp + 9) as u32);
            if self.nanos % scale == 0 {
                let value = self.nanos / scale;
                return if exponent_form {
                    if *exp == 0 {
                        value.to_string()
                    } else {
                        format!("{}e{}", value, exp)
                    }
                } else {
                    format!("{}{}", value, suffix)
                };
            }
        }
        // every i128 is a multiple of 10^0
        self.nanos.to_string() + "n"
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, unsigned) = match input.as_bytes()[0] {
            b'-' => (true, &input[1..]),
            b'+' => (false, &input[1..]),
            _ => (false, input),
        };
        let number_len = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(number_len);

        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
            return Err(QuantityError::InvalidNumber(input.to_string()));
        }

        let (base, exp, format) = Self::parse_suffix(input, suffix)?;

        let out_of_range = || QuantityError::OutOfRange(input.to_string());
        let digits = format!("{}{}", int_part, frac_part);
        let mantissa: i128 = digits.parse().map_err(|_| out_of_range())?;
        let scaled = mantissa.checked_mul(base).ok_or_else(out_of_range)?;

        // Widened so no exponent the suffix accepts can overflow the shift.
        let shift = i64::from(exp) + 9 - frac_part.len() as i64;
        let magnitude = if shift >= 0 {
            let factor = u32::try_from(shift)
                .ok()
                .and_then(|s| 10_i128.checked_pow(s))
                .ok_or_else(out_of_range)?;
            scaled.checked_mul(factor).ok_or_else(out_of_range)?
        } else {
            // Anything below one nano-unit rounds up to it.
            match u32::try_from(-shift).ok().and_then(|s| 10_i128.checked_pow(s)) {
                Some(divisor) => ceil_div(scaled, divisor),
                None => i128::from(scaled > 0),
            }
        };

        Ok(Self {
            nanos: if negative { -magnitude } else { magnitude },
            format,
        })
    }
}

impl AddAssign for Quantity {
    /// Keeps the left-hand format, as the platform does.
    fn add_assign(&mut self, rhs: Self) {
        self.nanos = self.nanos.saturating_add(rhs.nanos);
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return f.write_str("0");
        }
        let rendered = match self.format {
            QuantityFormat::BinarySI => self
                .canonical_binary()
                .unwrap_or_else(|| self.canonical_decimal(false)),
            QuantityFormat::DecimalSI => self.canonical_decimal(false),
            QuantityFormat::DecimalExponent => self.canonical_decimal(true),
        };
        f.write_str(&rendered)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn ceil_div(value: i128, divisor: i128) -> i128 {
    let quotient = value / divisor;
    if value % divisor > 0 {
        quotient + 1
    } else {
        quotient
    }
}
