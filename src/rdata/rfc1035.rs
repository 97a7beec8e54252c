//! Record data from RFC 1035.
//!
//! The initial set of record types. The names these payloads carry are
//! "well-known" in the sense of RFC 3597 and therefore participate in name
//! compression on the wire.

use core::fmt;
use std::net::Ipv4Addr;
use bytes::Bytes;
use smallvec::SmallVec;
use crate::base::charstr::CharStr;
use crate::base::name::Name;
use crate::base::wire::{Composer, ParseError, Parser};

//------------ dname_type! ---------------------------------------------------

/// A macro for a record data type consisting of a single domain name.
macro_rules! dname_type {
    ( $(#[$attr:meta])* $target:ident, $field:ident, $compressed:expr ) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub struct $target {
            /// The domain name carried by the record.
            pub $field: Name,
        }

        impl $target {
            /// Creates new record data from a name.
            pub fn new($field: Name) -> Self {
                $target { $field }
            }

            /// Parses the record data.
            pub fn parse(
                parser: &mut Parser
            ) -> Result<Self, ParseError> {
                Name::parse(parser).map(Self::new)
            }

            /// Appends the record data to a composer.
            pub fn compose(&self, composer: &mut Composer) {
                self.$field.compose(composer, $compressed);
            }
        }

        impl fmt::Display for $target {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}.", self.$field)
            }
        }
    };
}

//------------ A -------------------------------------------------------------

/// A record data: a single IPv4 host address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct A {
    /// The IPv4 address.
    pub addr: Ipv4Addr,
}

impl A {
    /// Creates new A record data.
    pub fn new(addr: Ipv4Addr) -> Self {
        A { addr }
    }

    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let octets = parser.parse_slice(4)?;
        Ok(A::new(Ipv4Addr::new(
            octets[0], octets[1], octets[2], octets[3],
        )))
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_slice(&self.addr.octets());
    }
}

impl From<Ipv4Addr> for A {
    fn from(addr: Ipv4Addr) -> Self {
        A::new(addr)
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.addr.fmt(f)
    }
}

dname_type! {
    /// NS record data: the name of an authoritative server.
    Ns, nsdname, true
}

dname_type! {
    /// CNAME record data: the canonical name of an alias.
    Cname, cname, true
}

dname_type! {
    /// PTR record data: a pointer to another part of the name space.
    Ptr, ptrdname, true
}

dname_type! {
    /// MB record data: a host with the specified mailbox.
    Mb, madname, true
}

dname_type! {
    /// MG record data: a mailbox that is a member of a mail group.
    Mg, mgmname, true
}

dname_type! {
    /// MR record data: a mailbox rename target.
    Mr, newname, true
}

//------------ Soa -----------------------------------------------------------

/// SOA record data: marks the start of a zone of authority.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Soa {
    /// The primary name server for the zone.
    pub mname: Name,

    /// The mailbox of the person responsible for the zone.
    pub rname: Name,

    /// The version number of the zone.
    pub serial: u32,

    /// The refresh interval for secondaries, in seconds.
    pub refresh: u32,

    /// The retry interval after a failed refresh, in seconds.
    pub retry: u32,

    /// When the zone is no longer authoritative, in seconds.
    pub expire: u32,

    /// The minimum TTL, also used for negative caching.
    pub minimum: u32,
}

impl Soa {
    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Soa {
            mname: Name::parse(parser)?,
            rname: Name::parse(parser)?,
            serial: parser.parse_u32_be()?,
            refresh: parser.parse_u32_be()?,
            retry: parser.parse_u32_be()?,
            expire: parser.parse_u32_be()?,
            minimum: parser.parse_u32_be()?,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        self.mname.compose(composer, true);
        self.rname.compose(composer, true);
        composer.append_u32_be(self.serial);
        composer.append_u32_be(self.refresh);
        composer.append_u32_be(self.retry);
        composer.append_u32_be(self.expire);
        composer.append_u32_be(self.minimum);
    }
}

impl fmt::Display for Soa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}. {}. {} {} {} {} {}",
            self.mname,
            self.rname,
            self.serial,
            self.refresh,
            self.retry,
            self.expire,
            self.minimum
        )
    }
}

//------------ Hinfo ---------------------------------------------------------

/// HINFO record data: the CPU and OS of a host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hinfo {
    /// The CPU type.
    pub cpu: CharStr,

    /// The operating system.
    pub os: CharStr,
}

impl Hinfo {
    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Hinfo {
            cpu: CharStr::parse(parser)?,
            os: CharStr::parse(parser)?,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        self.cpu.compose(composer);
        self.os.compose(composer);
    }
}

impl fmt::Display for Hinfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\" \"{}\"", self.cpu, self.os)
    }
}

//------------ Mx ------------------------------------------------------------

/// MX record data: a mail exchange for the owner name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mx {
    /// The preference of this exchange; lower is preferred.
    pub preference: u16,

    /// The host willing to act as mail exchange.
    pub exchange: Name,
}

impl Mx {
    /// Creates new MX record data.
    pub fn new(preference: u16, exchange: Name) -> Self {
        Mx {
            preference,
            exchange,
        }
    }

    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Mx {
            preference: parser.parse_u16_be()?,
            exchange: Name::parse(parser)?,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_u16_be(self.preference);
        self.exchange.compose(composer, true);
    }
}

impl fmt::Display for Mx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}.", self.preference, self.exchange)
    }
}

//------------ Txt -----------------------------------------------------------

/// TXT record data: free-form descriptive text.
///
/// The data is a sequence of character strings. Most records carry exactly
/// one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Txt {
    /// The character strings making up the text.
    pub segments: SmallVec<[CharStr; 1]>,
}

impl Txt {
    /// Creates TXT record data from a single character string.
    pub fn single(segment: CharStr) -> Self {
        let mut segments = SmallVec::new();
        segments.push(segment);
        Txt { segments }
    }

    /// Parses the record data.
    ///
    /// Character strings are read until the end of the data field.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let mut segments = SmallVec::new();
        while parser.remaining() > 0 {
            segments.push(CharStr::parse(parser)?);
        }
        Ok(Txt { segments })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        for segment in &self.segments {
            segment.compose(composer);
        }
    }
}

impl fmt::Display for Txt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "\"{}\"", segment)?;
        }
        Ok(())
    }
}

//------------ Null ----------------------------------------------------------

/// NULL record data: anything at all.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Null {
    /// The uninterpreted data.
    pub data: Bytes,
}

impl Null {
    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let data = parser.parse_octets(parser.remaining())?;
        Ok(Null { data })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_slice(&self.data);
    }
}

impl fmt::Display for Null {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\# {}", self.data.len())
    }
}

//------------ Wks -----------------------------------------------------------

/// WKS record data: the well-known services of an IPv4 host.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Wks {
    /// The host address.
    pub addr: Ipv4Addr,

    /// The IP protocol number, typically TCP or UDP.
    pub protocol: u8,

    /// The service bitmap: bit `n` set means port `n` is served.
    pub bitmap: Bytes,
}

impl Wks {
    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let addr = A::parse(parser)?.addr;
        let protocol = parser.parse_u8()?;
        let bitmap = parser.parse_octets(parser.remaining())?;
        Ok(Wks {
            addr,
            protocol,
            bitmap,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_slice(&self.addr.octets());
        composer.append_u8(self.protocol);
        composer.append_slice(&self.bitmap);
    }

    /// Returns whether the bitmap marks `port` as served.
    pub fn serves_port(&self, port: u16) -> bool {
        let octet = usize::from(port / 8);
        let mask = 0x80 >> (port % 8);
        self.bitmap.get(octet).map_or(false, |ch| ch & mask != 0)
    }
}

impl fmt::Display for Wks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.addr, self.protocol)
    }
}

//------------ Minfo ---------------------------------------------------------

/// MINFO record data: mailboxes related to a mailing list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Minfo {
    /// The mailbox responsible for the list.
    pub rmailbx: Name,

    /// The mailbox receiving error messages.
    pub emailbx: Name,
}

impl Minfo {
    /// Parses the record data.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        Ok(Minfo {
            rmailbx: Name::parse(parser)?,
            emailbx: Name::parse(parser)?,
        })
    }

    /// Appends the record data to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        self.rmailbx.compose(composer, true);
        self.emailbx.compose(composer, true);
    }
}

impl fmt::Display for Minfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}. {}.", self.rmailbx, self.emailbx)
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use core::str::FromStr;
    use super::*;

    #[test]
    fn wks_bitmap() {
        let wks = Wks {
            addr: Ipv4Addr::new(10, 0, 0, 1),
            protocol: 6,
            bitmap: Bytes::from_static(&[0x00, 0x40]),
        };
        assert!(wks.serves_port(9));
        assert!(!wks.serves_port(8));
        assert!(!wks.serves_port(25));
    }

    #[test]
    fn txt_segments() {
        let txt = Txt {
            segments: [
                CharStr::from_str("one").unwrap(),
                CharStr::from_str("two").unwrap(),
            ]
            .into_iter()
            .collect(),
        };
        let mut composer = Composer::new();
        txt.compose(&mut composer);
        let octets = composer.finish();
        assert_eq!(&octets[..], b"\x03one\x03two");
        let mut parser = Parser::from_octets(&octets);
        assert_eq!(Txt::parse(&mut parser).unwrap(), txt);
    }
}
