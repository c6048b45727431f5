//! Station code types.

use std::fmt;

/// Longest station code we accept.
pub const MAX_CODE_LEN: usize = 8;

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code {input:?}: {reason}")]
pub struct InvalidStationCode {
    input: String,
    reason: &'static str,
}

/// A normalized station code (e.g. `NDLS`, `CSMT`, `SBC`).
///
/// Codes are stored upper-cased with surrounding whitespace removed, so
/// `" ndls "` and `"NDLS"` are the same key. Any `StationCode` value is
/// 1 to 8 ASCII letters or digits.
///
/// # Examples
///
/// ```
/// use interchange_engine::domain::StationCode;
///
/// let ndls = StationCode::parse(" ndls ").unwrap();
/// assert_eq!(ndls.as_str(), "NDLS");
///
/// assert!(StationCode::parse("").is_err());
/// assert!(StationCode::parse("NEW DELHI").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationCode {
    bytes: [u8; MAX_CODE_LEN],
    len: u8,
}

impl StationCode {
    /// Parse and normalize a station code.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let trimmed = s.trim();
        let invalid = |reason| InvalidStationCode {
            input: s.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if trimmed.len() > MAX_CODE_LEN {
            return Err(invalid("must be at most 8 characters"));
        }

        let mut bytes = [0u8; MAX_CODE_LEN];
        for (slot, b) in bytes.iter_mut().zip(trimmed.bytes()) {
            if !b.is_ascii_alphanumeric() {
                return Err(invalid("must be ASCII letters or digits"));
            }
            *slot = b.to_ascii_uppercase();
        }

        Ok(Self {
            bytes,
            len: trimmed.len() as u8,
        })
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII alphanumerics are ever stored.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.as_str())
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Parsing normalizes to upper case and preserves the characters.
        #[test]
        fn roundtrip_upper(s in "[A-Za-z0-9]{1,8}") {
            let code = StationCode::parse(&s).unwrap();
            prop_assert_eq!(code.as_str(), s.to_ascii_uppercase());
        }

        /// Case never changes identity.
        #[test]
        fn case_insensitive(s in "[a-z]{1,8}") {
            let lower = StationCode::parse(&s).unwrap();
            let upper = StationCode::parse(&s.to_ascii_uppercase()).unwrap();
            prop_assert_eq!(lower, upper);
        }

        /// Over-long codes are always rejected.
        #[test]
        fn too_long_rejected(s in "[A-Z]{9,16}") {
            prop_assert!(StationCode::parse(&s).is_err());
        }
    }
}
