//! Record data from RFC 3596.

use core::fmt;
use std::net::Ipv6Addr;
use crate::base::wire::{Composer, ParseError, Parser};

//------------ Aaaa ----------------------------------------------------------

/// AAAA record data: a single IPv6 host address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Aaaa {
    /// The IPv6 address.
    pub addr: Ipv6Addr,
}

impl Aaaa {
    /// Creates new AAAA record data.
    pub fn new(addr: Ipv6Addr) -> Self {
        Aaaa { addr }
    }

    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let slice = parser.parse_slice(16)?;
        let mut octets = [0u8; 16];
        octets.copy_from_slice(slice);
        Ok(Aaaa::new(octets.into()))
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_slice(&self.addr.octets());
    }
}

impl From<Ipv6Addr> for Aaaa {
    fn from(addr: Ipv6Addr) -> Self {
        Aaaa::new(addr)
    }
}

impl fmt::Display for Aaaa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.addr.fmt(f)
    }
}
