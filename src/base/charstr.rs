//! Character strings.
//!
//! The `<character-string>` of RFC 1035: up to 255 octets of arbitrary
//! binary data, preceded on the wire by a one octet length. TXT, HINFO,
//! and NAPTR record data are built from these.

use core::fmt;
use core::str::FromStr;
use bytes::Bytes;
use super::wire::{Composer, ParseError, Parser};

//------------ CharStr -------------------------------------------------------

/// A DNS character string of at most 255 octets.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CharStr {
    /// The content, without the length octet.
    octets: Bytes,
}

impl CharStr {
    /// Creates a character string from octets.
    ///
    /// Fails if there are more than 255 of them.
    pub fn from_octets(octets: Bytes) -> Result<Self, CharStrError> {
        if octets.len() > 255 {
            return Err(CharStrError);
        }
        Ok(CharStr { octets })
    }

    /// Returns the content octets.
    pub fn as_slice(&self) -> &[u8] {
        &self.octets
    }

    /// Returns the content length.
    pub fn len(&self) -> usize {
        self.octets.len()
    }

    /// Returns whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.octets.is_empty()
    }

    /// Parses a character string.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let len = usize::from(parser.parse_u8()?);
        let octets = parser.parse_octets(len)?;
        Ok(CharStr { octets })
    }

    /// Appends the character string to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_u8(self.octets.len() as u8);
        composer.append_slice(&self.octets);
    }
}

//--- From and FromStr

impl FromStr for CharStr {
    type Err = CharStrError;

    fn from_str(s: &str) -> Result<Self, CharStrError> {
        Self::from_octets(Bytes::copy_from_slice(s.as_bytes()))
    }
}

//--- Display

impl fmt::Display for CharStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &ch in self.octets.iter() {
            if ch == b'"' || ch == b'\\' {
                write!(f, "\\{}", ch as char)?;
            } else if ch.is_ascii_graphic() || ch == b' ' {
                write!(f, "{}", ch as char)?;
            } else {
                write!(f, "\\{:03}", ch)?;
            }
        }
        Ok(())
    }
}

//------------ CharStrError --------------------------------------------------

/// A character string was longer than 255 octets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CharStrError;

impl fmt::Display for CharStrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("character string too long")
    }
}

impl std::error::Error for CharStrError {}

//============ Tests =========================================================
