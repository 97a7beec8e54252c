//! Resource records.

use core::fmt;
use core::str::FromStr;
use super::iana::{Class, Rtype};
use super::name::Name;
use super::opt::OptRecord;
use super::wire::{ComposeError, Composer, ParseError, Parser};
use crate::rdata::RecordData;

//------------ Ttl -----------------------------------------------------------

/// The time a record may be cached, in seconds.
///
/// A TTL can be written symbolically with a unit suffix: `"30"` and
/// `"30S"` are thirty seconds, `"2M"` two minutes, `"3H"` three hours,
/// `"4D"` four days, and `"5Y"` five years of 365 days. Suffixes are
/// case-insensitive. The value is normalized to seconds on construction.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Ttl(u32);

impl Ttl {
    /// Creates a TTL from a number of seconds.
    pub const fn from_secs(secs: u32) -> Self {
        Ttl(secs)
    }

    /// Returns the number of seconds.
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Returns the TTL reduced by `elapsed` seconds, floored at zero.
    pub fn saturating_sub(self, elapsed: u64) -> Self {
        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
        Ttl(self.0.saturating_sub(elapsed))
    }
}

impl From<u32> for Ttl {
    fn from(secs: u32) -> Self {
        Ttl(secs)
    }
}

impl FromStr for Ttl {
    type Err = TtlError;

    fn from_str(s: &str) -> Result<Self, TtlError> {
        if s.is_empty() {
            return Err(TtlError);
        }
        let (digits, unit) = match s.as_bytes()[s.len() - 1] {
            b'0'..=b'9' => (s, 1),
            b's' | b'S' => (&s[..s.len() - 1], 1),
            b'm' | b'M' => (&s[..s.len() - 1], 60),
            b'h' | b'H' => (&s[..s.len() - 1], 3600),
            b'd' | b'D' => (&s[..s.len() - 1], 86400),
            b'y' | b'Y' => (&s[..s.len() - 1], 86400 * 365),
            _ => return Err(TtlError),
        };
        let value: u32 = digits.parse().map_err(|_| TtlError)?;
        value.checked_mul(unit).map(Ttl).ok_or(TtlError)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

//------------ TtlError ------------------------------------------------------

/// A TTL string could not be understood.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TtlError;

impl fmt::Display for TtlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid TTL")
    }
}

impl std::error::Error for TtlError {}

//------------ Record --------------------------------------------------------

/// A resource record.
///
/// The record type is not stored separately: it is determined by the
/// variant of the data, so a record's type and its data can never
/// disagree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The name owning the record.
    pub owner: Name,

    /// The class of the record.
    pub class: Class,

    /// How long the record may be cached.
    pub ttl: Ttl,

    /// The record data.
    pub data: RecordData,
}

impl Record {
    /// Creates a new record in class IN.
    pub fn new(
        owner: Name,
        ttl: impl Into<Ttl>,
        data: RecordData,
    ) -> Self {
        Record {
            owner,
            class: Class::IN,
            ttl: ttl.into(),
            data,
        }
    }

    /// Returns the record type.
    pub fn rtype(&self) -> Rtype {
        self.data.rtype()
    }

    /// Parses one record out of a record section.
    ///
    /// A record of a type the crate has no decoder for is skipped over
    /// using its length field and reported as [`ParsedRecord::Unknown`];
    /// OPT pseudo records get their own variant since their class and TTL
    /// fields do not mean class and TTL. A malformed name or a data field
    /// that does not fit its length fails the parse, since section
    /// boundaries can no longer be trusted.
    pub fn parse(parser: &mut Parser) -> Result<ParsedRecord, ParseError> {
        let owner = Name::parse(parser)?;
        let rtype = Rtype::from_int(parser.parse_u16_be()?);
        let class = parser.parse_u16_be()?;
        let ttl = parser.parse_u32_be()?;
        let rdlen = usize::from(parser.parse_u16_be()?);
        let saved = parser.set_limit(rdlen)?;

        if rtype == Rtype::OPT {
            let options = parser.parse_octets(rdlen)?;
            parser.restore_limit(saved);
            return Ok(ParsedRecord::Opt(OptRecord::from_wire_parts(
                class, ttl, options,
            )));
        }

        let res = match RecordData::parse(rtype, parser)? {
            Some(data) => {
                if parser.remaining() != 0 {
                    return Err(ParseError::form_error(
                        "trailing record data",
                    ));
                }
                ParsedRecord::Record(Record {
                    owner,
                    class: Class::from_int(class),
                    ttl: Ttl::from_secs(ttl),
                    data,
                })
            }
            None => {
                parser.advance(parser.remaining())?;
                ParsedRecord::Unknown(rtype)
            }
        };
        parser.restore_limit(saved);
        Ok(res)
    }

    /// Appends the record to a composer.
    pub fn compose(
        &self,
        composer: &mut Composer,
    ) -> Result<(), ComposeError> {
        self.owner.compose(composer, true);
        composer.append_u16_be(self.rtype().to_int());
        composer.append_u16_be(self.class.to_int());
        composer.append_u32_be(self.ttl.as_secs());
        composer.append_len_prefixed(|c| self.data.compose(c))
    }
}

//--- Display

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.owner,
            self.ttl,
            self.class,
            self.rtype(),
            self.data
        )
    }
}

//------------ ParsedRecord --------------------------------------------------

/// The outcome of parsing a single record.
#[derive(Clone, Debug)]
pub enum ParsedRecord {
    /// A record with data the crate understands.
    Record(Record),

    /// An EDNS OPT pseudo record.
    Opt(OptRecord),

    /// A record of an unsupported type; its data has been skipped.
    Unknown(Rtype),
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn symbolic_ttl() {
        assert_eq!(Ttl::from_str("90"), Ok(Ttl::from_secs(90)));
        assert_eq!(Ttl::from_str("1S"), Ok(Ttl::from_secs(1)));
        assert_eq!(Ttl::from_str("2M"), Ok(Ttl::from_secs(120)));
        assert_eq!(Ttl::from_str("3h"), Ok(Ttl::from_secs(10_800)));
        assert_eq!(Ttl::from_str("4D"), Ok(Ttl::from_secs(345_600)));
        assert_eq!(Ttl::from_str("5Y"), Ok(Ttl::from_secs(157_680_000)));
        assert_eq!(Ttl::from_str(""), Err(TtlError));
        assert_eq!(Ttl::from_str("S"), Err(TtlError));
        assert_eq!(Ttl::from_str("12W"), Err(TtlError));
    }

    #[test]
    fn ttl_never_negative() {
        let ttl = Ttl::from_secs(60);
        assert_eq!(ttl.saturating_sub(1).as_secs(), 59);
        assert_eq!(ttl.saturating_sub(60).as_secs(), 0);
        assert_eq!(ttl.saturating_sub(4_000_000_000).as_secs(), 0);
    }
}
