//! Record data from RFC 2874.

use core::fmt;
use std::net::Ipv6Addr;
use crate::base::name::Name;
use crate::base::wire::{Composer, ParseError, Parser};

//------------ A6 ------------------------------------------------------------

/// A6 record data: an IPv6 address, possibly deferred to a prefix name.
///
/// Historic. The address is split into a literal suffix of
/// `128 - prefix_len` bits and a name to look the remaining prefix bits up
/// under. A prefix length of zero carries the whole address and no name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct A6 {
    /// The number of leading address bits deferred to the prefix name.
    pub prefix_len: u8,

    /// The address suffix. The deferred leading bits are zero.
    pub suffix: Ipv6Addr,

    /// The name holding the prefix; `None` when `prefix_len` is zero.
    pub prefix: Option<Name>,
}

impl A6 {
    /// Returns the number of suffix octets present on the wire.
    fn suffix_octets(prefix_len: u8) -> usize {
        (128 - usize::from(prefix_len)).div_ceil(8)
    }

    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let prefix_len = parser.parse_u8()?;
        if prefix_len > 128 {
            return Err(ParseError::form_error("invalid A6 prefix length"));
        }
        let count = Self::suffix_octets(prefix_len);
        let slice = parser.parse_slice(count)?;
        let mut octets = [0u8; 16];
        octets[16 - count..].copy_from_slice(slice);
        let prefix = if prefix_len > 0 {
            Some(Name::parse(parser)?)
        } else {
            None
        };
        Ok(A6 {
            prefix_len,
            suffix: octets.into(),
            prefix,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_u8(self.prefix_len);
        let count = Self::suffix_octets(self.prefix_len);
        composer.append_slice(&self.suffix.octets()[16 - count..]);
        if let Some(ref prefix) = self.prefix {
            prefix.compose(composer, false);
        }
    }
}

impl fmt::Display for A6 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.prefix_len, self.suffix)?;
        if let Some(ref prefix) = self.prefix {
            write!(f, " {}.", prefix)?;
        }
        Ok(())
    }
}

//============ Tests =========================================================
