//! Canonical instrument identifiers.
//!
//! The exchange names every tradeable contract with a structured string:
//! futures as `{underlying}_future_{expirySeconds}` and options as
//! `{underlying}_{call|put}_{strike}_{expirySeconds}`. Underlying symbols
//! (e.g. `$CARD`) may themselves contain underscores, so parsing locates the
//! kind token from the right.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::values::Price;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseInstrumentError {
    #[error("instrument id has too few components: {0}")]
    TooShort(String),
    #[error("unknown instrument kind in id: {0}")]
    UnknownKind(String),
    #[error("invalid numeric field `{field}` in id: {id}")]
    InvalidNumber { id: String, field: &'static str },
    #[error("empty underlying in id: {0}")]
    EmptyUnderlying(String),
}

/// Contract kind, with the strike for options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    Future,
    Call { strike: Price },
    Put { strike: Price },
}

impl InstrumentKind {
    fn token(&self) -> &'static str {
        match self {
            InstrumentKind::Future => "future",
            InstrumentKind::Call { .. } => "call",
            InstrumentKind::Put { .. } => "put",
        }
    }
}

/// A fully specified instrument: underlying, kind (with strike for options)
/// and expiry in exchange seconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub underlying: String,
    pub kind: InstrumentKind,
    pub expiry_seconds: i64,
}

impl InstrumentSpec {
    pub fn future(underlying: impl Into<String>, expiry_seconds: i64) -> Self {
        InstrumentSpec {
            underlying: underlying.into(),
            kind: InstrumentKind::Future,
            expiry_seconds,
        }
    }

    pub fn call(underlying: impl Into<String>, strike: Price, expiry_seconds: i64) -> Self {
        InstrumentSpec {
            underlying: underlying.into(),
            kind: InstrumentKind::Call { strike },
            expiry_seconds,
        }
    }

    pub fn put(underlying: impl Into<String>, strike: Price, expiry_seconds: i64) -> Self {
        InstrumentSpec {
            underlying: underlying.into(),
            kind: InstrumentKind::Put { strike },
            expiry_seconds,
        }
    }

    /// Strike price, present only for options.
    pub fn strike(&self) -> Option<Price> {
        match self.kind {
            InstrumentKind::Future => None,
            InstrumentKind::Call { strike } | InstrumentKind::Put { strike } => Some(strike),
        }
    }

    pub fn is_option(&self) -> bool {
        !matches!(self.kind, InstrumentKind::Future)
    }

    /// Canonical identifier string as transmitted to the exchange.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InstrumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InstrumentKind::Future => {
                write!(f, "{}_future_{}", self.underlying, self.expiry_seconds)
            }
            InstrumentKind::Call { strike } | InstrumentKind::Put { strike } => write!(
                f,
                "{}_{}_{}_{}",
                self.underlying,
                self.kind.token(),
                strike,
                self.expiry_seconds
            ),
        }
    }
}

fn parse_field(raw: &str, id: &str, field: &'static str) -> Result<i64, ParseInstrumentError> {
    raw.parse::<i64>()
        .map_err(|_| ParseInstrumentError::InvalidNumber {
            id: id.to_string(),
            field,
        })
}

impl FromStr for InstrumentSpec {
    type Err = ParseInstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() < 3 {
            return Err(ParseInstrumentError::TooShort(s.to_string()));
        }

        // Futures: kind token is second from the right.
        if parts[parts.len() - 2] == "future" {
            let underlying = parts[..parts.len() - 2].join("_");
            if underlying.is_empty() {
                return Err(ParseInstrumentError::EmptyUnderlying(s.to_string()));
            }
            let expiry_seconds = parse_field(parts[parts.len() - 1], s, "expiry")?;
            return Ok(InstrumentSpec::future(underlying, expiry_seconds));
        }

        // Options: kind token is third from the right, followed by strike
        // and expiry.
        if parts.len() >= 4 {
            let token = parts[parts.len() - 3];
            if token == "call" || token == "put" {
                let underlying = parts[..parts.len() - 3].join("_");
                if underlying.is_empty() {
                    return Err(ParseInstrumentError::EmptyUnderlying(s.to_string()));
                }
                let strike = parse_field(parts[parts.len() - 2], s, "strike")?;
                let expiry_seconds = parse_field(parts[parts.len() - 1], s, "expiry")?;
                return Ok(match token {
                    "call" => InstrumentSpec::call(underlying, strike, expiry_seconds),
                    _ => InstrumentSpec::put(underlying, strike, expiry_seconds),
                });
            }
        }

        Err(ParseInstrumentError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_future_id_format() {
        let spec = InstrumentSpec::future("$CARD", 60);
        assert_eq!(spec.to_string(), "$CARD_future_60");
        assert_eq!(spec.strike(), None);
    }

    #[test]
    fn test_option_id_roundtrip() {
        let spec = InstrumentSpec::call("$CARD", 500, 60);
        let id = spec.to_string();
        assert_eq!(id, "$CARD_call_500_60");

        let parsed: InstrumentSpec = id.parse().unwrap();
        assert_eq!(parsed.underlying, "$CARD");
        assert_eq!(parsed.kind, InstrumentKind::Call { strike: 500 });
        assert_eq!(parsed.strike(), Some(500));
        assert_eq!(parsed.expiry_seconds, 60);
    }

    #[test]
    fn test_put_roundtrip() {
        let spec = InstrumentSpec::put("$HEST", 1200, 300);
        let parsed: InstrumentSpec = spec.to_string().parse().unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_future_roundtrip() {
        let spec = InstrumentSpec::future("$JUMP", 120);
        let parsed: InstrumentSpec = spec.to_string().parse().unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_underscore_in_underlying() {
        let parsed: InstrumentSpec = "MY_SYM_future_30".parse().unwrap();
        assert_eq!(parsed.underlying, "MY_SYM");
        assert_eq!(parsed.kind, InstrumentKind::Future);

        let parsed: InstrumentSpec = "MY_SYM_put_100_30".parse().unwrap();
        assert_eq!(parsed.underlying, "MY_SYM");
        assert_eq!(parsed.strike(), Some(100));
    }

    #[test]
    fn test_malformed_ids_rejected() {
        assert!("".parse::<InstrumentSpec>().is_err());
        assert!("$CARD".parse::<InstrumentSpec>().is_err());
        assert!("$CARD_swap_60".parse::<InstrumentSpec>().is_err());
        assert!("$CARD_future_soon".parse::<InstrumentSpec>().is_err());
        assert!("$CARD_call_high_60".parse::<InstrumentSpec>().is_err());
        assert!("_future_60".parse::<InstrumentSpec>().is_err());
    }
}
