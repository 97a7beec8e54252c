//! Record data from RFC 6672.

use core::fmt;
use crate::base::name::Name;
use crate::base::wire::{Composer, ParseError, Parser};

//------------ Dname ---------------------------------------------------------

/// DNAME record data: redirection for a whole subtree of the name space.
///
/// Unlike CNAME, the target name is written uncompressed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dname {
    /// The target the subtree is redirected to.
    pub target: Name,
}

impl Dname {
    /// Creates new DNAME record data.
    pub fn new(target: Name) -> Self {
        Dname { target }
    }

    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Name::parse(parser).map(Self::new)
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        self.target.compose(composer, false);
    }
}

impl fmt::Display for Dname {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.", self.target)
    }
}
