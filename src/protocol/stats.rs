//! Statistics and listing bodies
//!
//! `stats*` and `list-tubes*` replies carry a small YAML subset:
//!
//! ```text
//! ---
//! current-jobs-ready: 3        (mapping form)
//! ---
//! - default                    (list form)
//! ```
//!
//! The first line is a document marker and is discarded. One body uses one
//! form only; mixing them is rejected.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StalkError};

/// A scalar value from a statistics body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl StatValue {
    /// Coerce a raw value
    ///
    /// Decimal literals become `Int` when integral and within `i64`, else
    /// `Float`. Double-quoted values are unquoted and kept as strings.
    pub fn coerce(raw: &str) -> Self {
        let raw = raw.trim();

        let unquoted = unquote(raw);
        if unquoted.len() != raw.len() {
            return StatValue::Str(unquoted.to_string());
        }
        if !is_decimal_literal(raw) {
            return StatValue::Str(raw.to_string());
        }
        if let Ok(int) = raw.parse::<i64>() {
            return StatValue::Int(int);
        }

        match raw.parse::<f64>() {
            // 2^63: the first integral value outside i64
            Ok(float) if float.fract() == 0.0 && float.abs() < 9_223_372_036_854_775_808.0 => {
                StatValue::Int(float as i64)
            }
            Ok(float) => StatValue::Float(float),
            Err(_) => StatValue::Str(raw.to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StatValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatValue::Int(v) => Some(*v as f64),
            StatValue::Float(v) => Some(*v),
            StatValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StatValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Int(v) => write!(f, "{}", v),
            StatValue::Float(v) => write!(f, "{}", v),
            StatValue::Str(v) => f.write_str(v),
        }
    }
}

/// A parsed statistics or listing body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Stats {
    Map(HashMap<String, StatValue>),
    List(Vec<StatValue>),
}

impl Stats {
    /// Parse a reply body; it must be UTF-8
    pub fn parse_bytes(body: &[u8]) -> Result<Self> {
        parse_stats(body_text(body)?)
    }

    /// Value for `key` in the mapping form
    pub fn get(&self, key: &str) -> Option<&StatValue> {
        match self {
            Stats::Map(map) => map.get(key),
            Stats::List(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, StatValue>> {
        match self {
            Stats::Map(map) => Some(map),
            Stats::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StatValue]> {
        match self {
            Stats::List(list) => Some(list),
            Stats::Map(_) => None,
        }
    }
}

/// One meaningful line of a body
enum Line<'a> {
    Item(&'a str),
    Pair(&'a str, &'a str),
}

/// Split a body into lines of a single form
fn body_lines(body: &str) -> Result<Vec<Line<'_>>> {
    let mut lines = Vec::new();
    let (mut items, mut pairs) = (false, false);

    for line in body.trim_end().lines().skip(1) {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(item) = line.strip_prefix('-') {
            items = true;
            lines.push(Line::Item(item));
        } else if let Some((key, value)) = line.split_once(':') {
            pairs = true;
            lines.push(Line::Pair(key.trim(), value));
        } else {
            return Err(StalkError::Stats(format!("unrecognized line {:?}", line)));
        }

        if items && pairs {
            return Err(StalkError::Stats(
                "body mixes list items and key/value pairs".to_string(),
            ));
        }
    }

    Ok(lines)
}

fn body_text(body: &[u8]) -> Result<&str> {
    std::str::from_utf8(body).map_err(|_| StalkError::Stats("body is not UTF-8".to_string()))
}

/// Parse a statistics or listing body
pub fn parse_stats(body: &str) -> Result<Stats> {
    let lines = body_lines(body)?;

    if matches!(lines.first(), Some(Line::Item(_))) {
        let list = lines
            .into_iter()
            .filter_map(|line| match line {
                Line::Item(item) => Some(StatValue::coerce(item)),
                Line::Pair(..) => None,
            })
            .collect();
        return Ok(Stats::List(list));
    }

    let map = lines
        .into_iter()
        .filter_map(|line| match line {
            Line::Pair(key, value) => Some((key.to_string(), StatValue::coerce(value))),
            Line::Item(_) => None,
        })
        .collect();
    Ok(Stats::Map(map))
}

/// Parse a listing body into its items, text kept as sent
///
/// Tube names such as `007` or `1e3` are not coerced. An empty body is an
/// empty list; a mapping body is rejected.
pub fn parse_list(body: &str) -> Result<Vec<String>> {
    body_lines(body)?
        .into_iter()
        .map(|line| match line {
            Line::Item(item) => Ok(unquote(item.trim()).to_string()),
            Line::Pair(..) => Err(StalkError::Stats("expected a list body".to_string())),
        })
        .collect()
}

/// [`parse_list`] over a raw reply body
pub fn parse_list_bytes(body: &[u8]) -> Result<Vec<String>> {
    parse_list(body_text(body)?)
}

fn unquote(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// `[+-]digits[.digits][e[+-]digits]`, with at least one mantissa digit
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}
