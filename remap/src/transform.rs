//! The fixed registry of named text transforms.

use std::str::FromStr;

use crate::Error;

/// A named, pure text transform, applied cell-by-cell to a column.
///
/// The registry is closed: templates can only refer to the transforms
/// defined here, and validation checks names against this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Transform {
    /// Strip leading and trailing whitespace.
    Trim,
    /// Uppercase the whole string.
    Upper,
    /// Lowercase the whole string.
    Lower,
    /// Remove every character that is not an ASCII digit.
    DigitsOnly,
    /// Parse a loosely formatted currency amount into its minor-unit
    /// (pence/cents) representation.
    CurrencyToMinor,
}

impl FromStr for Transform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "trim" => Self::Trim,
            "upper" => Self::Upper,
            "lower" => Self::Lower,
            "digits_only" => Self::DigitsOnly,
            "currency_to_minor" => Self::CurrencyToMinor,
            _ => return Err(Error::UnknownTransform(s.to_string())),
        })
    }
}

impl Transform {
    /// Every registered transform, in a stable order.
    pub fn all() -> &'static [Transform] {
        &[
            Self::Trim,
            Self::Upper,
            Self::Lower,
            Self::DigitsOnly,
            Self::CurrencyToMinor,
        ]
    }

    /// The name under which this transform is registered.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Trim => "trim",
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::DigitsOnly => "digits_only",
            Self::CurrencyToMinor => "currency_to_minor",
        }
    }

    /// Returns whether a transform is registered under the given name.
    pub fn is_registered(name: &str) -> bool {
        Self::from_str(name).is_ok()
    }

    /// Apply this transform to a single cell. Transforms are total: they
    /// never fail, whatever the input.
    pub fn apply(&self, input: &str) -> String {
        match self {
            Self::Trim => input.trim().to_string(),
            Self::Upper => input.to_uppercase(),
            Self::Lower => input.to_lowercase(),
            Self::DigitsOnly => input.chars().filter(char::is_ascii_digit).collect(),
            Self::CurrencyToMinor => currency_to_minor(input),
        }
    }
}

// Minor units are always two digits: "12.34" -> "1234", "12" -> "1200",
// "1.2" -> "120". The fractional part is truncated, never rounded. A single
// leading '-' is kept as the sign; dashes anywhere else are discarded.
fn currency_to_minor(input: &str) -> String {
    let mut stripped: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(*c, '.' | ',' | '-'))
        .collect();
    stripped.retain(|c| c != ',');
    let negative = stripped.starts_with('-');
    stripped.retain(|c| c != '-');
    if stripped.is_empty() {
        return String::new();
    }
    // Split on the first '.' only; everything after it counts as the
    // fractional part.
    let (major, frac) = match stripped.find('.') {
        Some(idx) => {
            let mut frac = stripped[idx + 1..].to_string();
            while frac.len() < 2 {
                frac.push('0');
            }
            frac.truncate(2);
            (stripped[..idx].to_string(), frac)
        }
        None => (stripped, "00".to_string()),
    };
    let mut out = String::with_capacity(major.len() + 3);
    if negative {
        out.push('-');
    }
    out.push_str(&major);
    out.push_str(&frac);
    out
}
