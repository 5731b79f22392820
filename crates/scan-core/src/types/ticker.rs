//! Ticker symbols.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TickerError;

/// Longest accepted symbol, covering share-class suffixes such as `BRK.B`.
pub const MAX_TICKER_LEN: usize = 10;

/// An exchange symbol identifying one tradable instrument.
///
/// Always upper case. Construct through [`Ticker::parse`] or [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Validate and normalise a raw symbol.
    pub fn parse(raw: &str) -> Result<Self, TickerError> {
        let value = raw.trim().to_ascii_uppercase();

        if value.is_empty() {
            return Err(TickerError::Empty);
        }
        if value.len() > MAX_TICKER_LEN {
            return Err(TickerError::TooLong(value));
        }
        if let Some(ch) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '-'))
        {
            return Err(TickerError::InvalidCharacter { value, ch });
        }
        if !value.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(TickerError::LeadingNonLetter(value));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalises_case_and_whitespace() {
        let ticker = Ticker::parse("  aapl ").unwrap();
        assert_eq!(ticker.as_str(), "AAPL");
        assert_eq!(ticker.to_string(), "AAPL");
    }

    #[test]
    fn test_parse_accepts_share_classes() {
        assert!(Ticker::parse("BRK.B").is_ok());
        assert!(Ticker::parse("BF-B").is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Ticker::parse("   "), Err(TickerError::Empty));
        assert!(matches!(
            Ticker::parse("AA PL"),
            Err(TickerError::InvalidCharacter { ch: ' ', .. })
        ));
        assert!(matches!(
            Ticker::parse("1ABC"),
            Err(TickerError::LeadingNonLetter(_))
        ));
        assert!(matches!(
            Ticker::parse("ABCDEFGHIJK"),
            Err(TickerError::TooLong(_))
        ));
    }

    #[test]
    fn test_serde_validates() {
        let ticker: Ticker = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(ticker.as_str(), "MSFT");
        assert!(serde_json::from_str::<Ticker>("\"$$$\"").is_err());
    }
}
