//! A single question of a DNS message.

use core::fmt;
use super::iana::{Class, Rtype};
use super::name::Name;
use super::wire::{Composer, ParseError, Parser};

//------------ Question ------------------------------------------------------

/// A question asked of a name server.
///
/// Equality and hashing fold the case of the name, so two questions for
/// the same name in different spellings are the same question. This is
/// what makes questions usable as cache and single-flight keys.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    /// The name being asked about.
    pub qname: Name,

    /// The requested record type.
    pub qtype: Rtype,

    /// The requested class.
    pub qclass: Class,
}

impl Question {
    /// Creates a new question in class IN.
    pub fn new(qname: Name, qtype: Rtype) -> Self {
        Question {
            qname,
            qtype,
            qclass: Class::IN,
        }
    }

    /// Parses a question out of a message.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let qname = Name::parse(parser)?;
        let qtype = Rtype::from_int(parser.parse_u16_be()?);
        let qclass = Class::from_int(parser.parse_u16_be()?);
        Ok(Question {
            qname,
            qtype,
            qclass,
        })
    }

    /// Appends the question to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        self.qname.compose(composer, true);
        composer.append_u16_be(self.qtype.to_int());
        composer.append_u16_be(self.qclass.to_int());
    }
}

//--- Display

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

//============ Tests =========================================================
