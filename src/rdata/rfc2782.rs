//! Record data from RFC 2782.

use core::fmt;
use crate::base::name::Name;
use crate::base::wire::{Composer, ParseError, Parser};

//------------ Srv -----------------------------------------------------------

/// SRV record data: the location of a service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Srv {
    /// The priority of this target; lower is tried first.
    pub priority: u16,

    /// The relative weight among targets of equal priority.
    pub weight: u16,

    /// The port the service is offered on.
    pub port: u16,

    /// The host offering the service.
    ///
    /// Written uncompressed, as RFC 2782 requires.
    pub target: Name,
}

impl Srv {
    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Srv {
            priority: parser.parse_u16_be()?,
            weight: parser.parse_u16_be()?,
            port: parser.parse_u16_be()?,
            target: Name::parse(parser)?,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_u16_be(self.priority);
        composer.append_u16_be(self.weight);
        composer.append_u16_be(self.port);
        self.target.compose(composer, false);
    }
}

impl fmt::Display for Srv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}.",
            self.priority, self.weight, self.port, self.target
        )
    }
}
