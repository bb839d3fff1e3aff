//! Scalar values and the numeric coercion ladder.
//!
//! Table cells and dataset parameters both arrive as text. Before comparing
//! they are coerced by trying, in order, integer, floating-point and complex
//! parses, falling back to the (trimmed) text itself. This makes `"1600"` in
//! a table equal to `1600.0` from a header.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

const NUMBER: &str = r"(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?";

/// Purely imaginary literal: `2j`, `-j`, `1.5e3J`.
static IMAGINARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^([+-]?(?:{NUMBER})?)[jJ]$")).expect("valid regex"));

/// Real and imaginary parts: `1+2j`, `-0.5-j`.
static COMPLEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^([+-]?{NUMBER})([+-](?:{NUMBER})?)[jJ]$")).expect("valid regex")
});

/// A coerced cell or parameter value.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Int(i64),
    Float(f64),
    Complex { re: f64, im: f64 },
    Text(String),
}

impl ScalarValue {
    /// Coerce a raw value, trimming surrounding whitespace from text results.
    pub fn coerce(raw: &str) -> Self {
        Self::coerce_with(raw, true)
    }

    /// Coerce a raw value. Numeric parses always ignore surrounding
    /// whitespace; `strip` only controls whether a text fallback is trimmed.
    pub fn coerce_with(raw: &str, strip: bool) -> Self {
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            return Self::Float(f);
        }
        if let Some((re, im)) = parse_complex(trimmed) {
            return Self::Complex { re, im };
        }
        if strip {
            Self::Text(trimmed.to_string())
        } else {
            Self::Text(raw.to_string())
        }
    }

    /// Whether this value took one of the numeric rungs of the ladder.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Text(_))
    }

    fn as_complex(&self) -> Option<(f64, f64)> {
        match self {
            Self::Int(i) => Some((*i as f64, 0.0)),
            Self::Float(f) => Some((*f, 0.0)),
            Self::Complex { re, im } => Some((*re, *im)),
            Self::Text(_) => None,
        }
    }

    /// Compare two values. Numbers compare by value across integer, float
    /// and complex representations; text compares only with text.
    pub fn equals(&self, other: &ScalarValue, case_sensitive: bool) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => {
                if case_sensitive {
                    a == b
                } else {
                    a.to_lowercase() == b.to_lowercase()
                }
            }
            (a, b) => match (a.as_complex(), b.as_complex()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, true)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::coerce(value)
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::coerce(&value)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Complex { re, im } => {
                if *im < 0.0 {
                    write!(f, "({re:?}-{:?}j)", -im)
                } else {
                    write!(f, "({re:?}+{im:?}j)")
                }
            }
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            other => serializer.collect_str(other),
        }
    }
}

fn parse_part(text: &str) -> Option<f64> {
    match text {
        "" | "+" => Some(1.0),
        "-" => Some(-1.0),
        _ => text.parse().ok(),
    }
}

/// Parse a complex literal, optionally wrapped in parentheses.
fn parse_complex(input: &str) -> Option<(f64, f64)> {
    let inner = input
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(input);

    if let Some(caps) = IMAGINARY.captures(inner) {
        return Some((0.0, parse_part(&caps[1])?));
    }
    if let Some(caps) = COMPLEX.captures(inner) {
        let re = caps[1].parse().ok()?;
        return Some((re, parse_part(&caps[2])?));
    }
    // Parenthesised plain reals are complex in this ladder.
    if inner.len() != input.len() {
        return inner.parse::<f64>().ok().map(|re| (re, 0.0));
    }
    None
}
