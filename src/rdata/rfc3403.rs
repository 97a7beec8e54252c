//! Record data from RFC 3403.

use core::fmt;
use crate::base::charstr::CharStr;
use crate::base::name::Name;
use crate::base::wire::{Composer, ParseError, Parser};

//------------ Naptr ---------------------------------------------------------

/// NAPTR record data: a rule for rewriting the owner name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Naptr {
    /// The order in which rules must be processed; lower first.
    pub order: u16,

    /// Tie breaker among rules of equal order; lower first.
    pub preference: u16,

    /// Flags controlling rewriting, e.g. `"S"`, `"A"`, `"U"`.
    pub flags: CharStr,

    /// The service parameters available down this rewrite path.
    pub services: CharStr,

    /// A substitution expression applied to the original string.
    pub regexp: CharStr,

    /// The next name to query; root when the regexp is used instead.
    ///
    /// Written uncompressed.
    pub replacement: Name,
}

impl Naptr {
    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Naptr {
            order: parser.parse_u16_be()?,
            preference: parser.parse_u16_be()?,
            flags: CharStr::parse(parser)?,
            services: CharStr::parse(parser)?,
            regexp: CharStr::parse(parser)?,
            replacement: Name::parse(parser)?,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_u16_be(self.order);
        composer.append_u16_be(self.preference);
        self.flags.compose(composer);
        self.services.compose(composer);
        self.regexp.compose(composer);
        self.replacement.compose(composer, false);
    }
}

impl fmt::Display for Naptr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} \"{}\" \"{}\" \"{}\" {}.",
            self.order,
            self.preference,
            self.flags,
            self.services,
            self.regexp,
            self.replacement
        )
    }
}
