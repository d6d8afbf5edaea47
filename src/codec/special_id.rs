//! Sentinel-aware id formatting and pipe-delimited id lists.
//!
//! EPC-style ids are unsigned 16-bit on the wire but reserve two negative
//! values, [`ID_OTHER`] and [`ID_INTERNET`]. Every other value is folded
//! into the unsigned 16-bit range.

use crate::core::{FlowTagError, Result};
use std::fmt;
use std::str::FromStr;

pub const ID_OTHER: i16 = -1;
pub const ID_INTERNET: i16 = -2;

const LIST_SEPARATOR: char = '|';

/// A signed 16-bit id printed as unsigned unless it is a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecialId(pub i16);

impl SpecialId {
    pub fn is_sentinel(self) -> bool {
        self.0 == ID_OTHER || self.0 == ID_INTERNET
    }
}

impl fmt::Display for SpecialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "{}", self.0 as u16)
        }
    }
}

/// Accepts the signed sentinels and the unsigned 16-bit form, so the text
/// written by `Display` always parses back to the same value.
impl FromStr for SpecialId {
    type Err = FlowTagError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(v) = s.parse::<u16>() {
            return Ok(SpecialId(v as i16));
        }
        let id = SpecialId(s.parse()?);
        if id.is_sentinel() {
            Ok(id)
        } else {
            Err(FlowTagError::parse(format!("'{}' is neither a sentinel nor a 16-bit id", s)))
        }
    }
}

/// Normalises a 32-bit id: sentinels pass through, anything else keeps only
/// its low 16 bits, read as unsigned.
pub fn marshal_i32_with_special_id(v: i32) -> i32 {
    if v == i32::from(ID_OTHER) || v == i32::from(ID_INTERNET) {
        return v;
    }
    i32::from(v as u16)
}

/// Inverse of [`marshal_i32_with_special_id`] for values in the 16-bit range.
pub fn unmarshal_i32_with_special_id(v: i32) -> i16 {
    v as i16
}

pub fn marshal_u16s(values: &[u16]) -> String {
    let mut out = String::with_capacity(values.len() * 6);
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(LIST_SEPARATOR);
        }
        out.push_str(&v.to_string());
    }
    out
}

/// Splits on `|`; any empty, non-numeric or out-of-range token fails the
/// whole list.
pub fn unmarshal_u16s(s: &str) -> Result<Vec<u16>> {
    s.split(LIST_SEPARATOR)
        .map(|token| {
            token.parse::<u16>().map_err(|e| {
                FlowTagError::parse(format!("invalid id list token '{}': {}", token, e))
            })
        })
        .collect()
}
