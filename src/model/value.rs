//! Typed attribute values and literal detection.
//!
//! The parser hands every flat value through [`LiteralParser`], which
//! detects date ranges, dates (with `TBD` placeholders), quantities,
//! colors and numbers before falling back to plain text. Picklist- and
//! reference-shaped fields bypass detection and produce their own
//! variants.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

/// A typed scalar value carried by an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Value {
    Text { text: String },
    Number { value: f64 },
    Quantity { value: f64, unit: String },
    Color { hex: String, name: Option<String> },
    Date { date: DateValue },
    DateRange { start: DateValue, end: DateValue },
    Pick { option: String },
    Reference(Reference),
}

impl Value {
    /// Rendered form for narrative output and tests.
    pub fn display(&self) -> String {
        match self {
            Value::Text { text } => text.clone(),
            Value::Number { value } => value.to_string(),
            Value::Quantity { value, unit } => format!("{} {}", value, unit),
            Value::Color { hex, name } => match name {
                Some(n) => format!("{} {}", hex, n),
                None => hex.clone(),
            },
            Value::Date { date } => date.to_string(),
            Value::DateRange { start, end } => format!("{} to {}", start, end),
            Value::Pick { option } => option.clone(),
            Value::Reference(r) => r.raw.clone(),
        }
    }
}

/// A date literal. `TBD` is a first-class placeholder, never a parse
/// failure; a bare year is common in lore chronology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateValue {
    Tbd,
    Day { date: NaiveDate },
    Year { year: i32 },
}

impl DateValue {
    pub fn is_tbd(&self) -> bool {
        matches!(self, DateValue::Tbd)
    }

    /// Comparable key in days; `None` for TBD.
    fn order_key(&self) -> Option<i64> {
        match self {
            DateValue::Tbd => None,
            DateValue::Day { date } => Some(i64::from(date.num_days_from_ce())),
            DateValue::Year { year } => NaiveDate::from_ymd_opt(*year, 1, 1)
                .map(|d| i64::from(d.num_days_from_ce())),
        }
    }

    /// True when `self` falls strictly after `other`; TBD endpoints are
    /// incomparable and never inverted.
    pub fn is_after(&self, other: &DateValue) -> bool {
        match (self.order_key(), other.order_key()) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        }
    }
}

impl std::fmt::Display for DateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateValue::Tbd => write!(f, "TBD"),
            DateValue::Day { date } => write!(f, "{}", date),
            DateValue::Year { year } => write!(f, "{}", year),
        }
    }
}

/// A reference token, resolved after merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    /// The token as written in the document
    pub raw: String,
    /// Resolution outcome; `None` until the resolver runs or when no
    /// target matched
    pub target: Option<ResolvedTarget>,
}

impl Reference {
    pub fn unresolved(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            target: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedTarget {
    /// Runtime identity of the target node
    pub node: Uuid,
    /// True when the token only matched the target's name, not its id
    pub by_name: bool,
}

/// Detects typed literals in flat values. Compiled once per parser.
pub struct LiteralParser {
    quantity: Regex,
    color: Regex,
    year: Regex,
}

impl Default for LiteralParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LiteralParser {
    pub fn new() -> Self {
        Self {
            quantity: Regex::new(r"^([+-]?\d+(?:\.\d+)?)\s+(\p{L}[\p{L}/²³]*)$").unwrap(),
            color: Regex::new(r"^(#[0-9a-fA-F]{6})(?:\s+(.+))?$").unwrap(),
            year: Regex::new(r"^\d{1,4}$").unwrap(),
        }
    }

    /// Detect the typed form of a flat value.
    pub fn detect(&self, raw: &str) -> Value {
        let raw = raw.trim();

        if let Some((start, end)) = self.split_range(raw) {
            return Value::DateRange { start, end };
        }
        if raw.eq_ignore_ascii_case("tbd") {
            return Value::Date {
                date: DateValue::Tbd,
            };
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Value::Date {
                date: DateValue::Day { date },
            };
        }
        if let Some(caps) = self.color.captures(raw) {
            return Value::Color {
                hex: caps[1].to_lowercase(),
                name: caps.get(2).map(|m| m.as_str().to_string()),
            };
        }
        if let Some(caps) = self.quantity.captures(raw) {
            if let Ok(value) = caps[1].parse::<f64>() {
                return Value::Quantity {
                    value,
                    unit: caps[2].to_string(),
                };
            }
        }
        if let Ok(value) = raw.parse::<f64>() {
            return Value::Number { value };
        }
        Value::Text {
            text: raw.to_string(),
        }
    }

    /// A range splits on ` to ` or an en dash when both sides read as
    /// date endpoints (day, bare year, or TBD).
    fn split_range(&self, raw: &str) -> Option<(DateValue, DateValue)> {
        for sep in [" to ", " \u{2013} ", " \u{2014} "] {
            if let Some((left, right)) = raw.split_once(sep) {
                let start = self.date_endpoint(left.trim())?;
                let end = self.date_endpoint(right.trim())?;
                return Some((start, end));
            }
        }
        None
    }

    fn date_endpoint(&self, raw: &str) -> Option<DateValue> {
        if raw.eq_ignore_ascii_case("tbd") {
            return Some(DateValue::Tbd);
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(DateValue::Day { date });
        }
        if self.year.is_match(raw) {
            return raw.parse::<i32>().ok().map(|year| DateValue::Year { year });
        }
        None
    }
}
