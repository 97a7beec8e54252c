//! Record data from RFC 1183.

use core::fmt;
use crate::base::name::Name;
use crate::base::wire::{Composer, ParseError, Parser};

//------------ Afsdb ---------------------------------------------------------

/// AFSDB record data: the location of an AFS database server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Afsdb {
    /// The kind of server: 1 for an AFS cell database server,
    /// 2 for a DCE authenticated name server.
    pub subtype: u16,

    /// The host providing the service.
    pub hostname: Name,
}

impl Afsdb {
    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Afsdb {
            subtype: parser.parse_u16_be()?,
            hostname: Name::parse(parser)?,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_u16_be(self.subtype);
        self.hostname.compose(composer, false);
    }
}

impl fmt::Display for Afsdb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}.", self.subtype, self.hostname)
    }
}

//------------ Rp ------------------------------------------------------------

/// RP record data: the person responsible for the owner name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rp {
    /// A mailbox for the responsible person, in domain name form.
    pub mbox: Name,

    /// The name of a TXT record with further information, or the root
    /// name if there is none.
    pub txt: Name,
}

impl Rp {
    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Rp {
            mbox: Name::parse(parser)?,
            txt: Name::parse(parser)?,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        self.mbox.compose(composer, false);
        self.txt.compose(composer, false);
    }
}

impl fmt::Display for Rp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}. {}.", self.mbox, self.txt)
    }
}
