//! Record data.
//!
//! Every record type the crate can decode has a concrete data type in one
//! of the per-RFC submodules. [`RecordData`] is the dispatch point: one
//! variant per supported type, driven by a static match over the numeric
//! type code. Parsing a type the table does not know produces `None`, so
//! the caller can skip the record without failing the whole message.

pub mod rfc1035;
pub mod rfc1183;
pub mod rfc2782;
pub mod rfc2874;
pub mod rfc3403;
pub mod rfc3596;
pub mod rfc6672;

pub use self::rfc1035::{
    Cname, Hinfo, Mb, Mg, Minfo, Mr, Mx, Ns, Null, Ptr, Soa, Txt, Wks, A,
};
pub use self::rfc1183::{Afsdb, Rp};
pub use self::rfc2782::Srv;
pub use self::rfc2874::A6;
pub use self::rfc3403::Naptr;
pub use self::rfc3596::Aaaa;
pub use self::rfc6672::Dname;

use core::fmt;
use crate::base::iana::Rtype;
use crate::base::wire::{Composer, ParseError, Parser};

//------------ record_data! --------------------------------------------------

/// Generates the [`RecordData`] enum and its dispatch methods.
macro_rules! record_data {
    ( $( $(#[$attr:meta])* $variant:ident($type:ty) => $rtype:ident, )* ) => {
        /// The data of a resource record.
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub enum RecordData {
            $( $(#[$attr])* $variant($type), )*
        }

        impl RecordData {
            /// Returns the record type of the data.
            pub fn rtype(&self) -> Rtype {
                match *self {
                    $( RecordData::$variant(_) => Rtype::$rtype, )*
                }
            }

            /// Parses record data of the given type.
            ///
            /// The parser must be limited to the record's data field.
            /// Returns `None` for a type the crate has no decoder for;
            /// the caller skips the data field in that case.
            pub fn parse(
                rtype: Rtype,
                parser: &mut Parser,
            ) -> Result<Option<Self>, ParseError> {
                match rtype {
                    $(
                        Rtype::$rtype => {
                            <$type>::parse(parser)
                                .map(RecordData::$variant)
                                .map(Some)
                        }
                    )*
                    _ => Ok(None),
                }
            }

            /// Appends the record data to a composer.
            pub fn compose(&self, composer: &mut Composer) {
                match *self {
                    $(
                        RecordData::$variant(ref data) => {
                            data.compose(composer)
                        }
                    )*
                }
            }
        }

        //--- Display

        impl fmt::Display for RecordData {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match *self {
                    $(
                        RecordData::$variant(ref data) => data.fmt(f),
                    )*
                }
            }
        }

    };
}

//--- From
//
// Not generated: TXT and SPF share a payload type, so a blanket impl per
// variant would conflict.

impl From<A> for RecordData {
    fn from(data: A) -> Self {
        RecordData::A(data)
    }
}

impl From<Aaaa> for RecordData {
    fn from(data: Aaaa) -> Self {
        RecordData::Aaaa(data)
    }
}

impl From<Ns> for RecordData {
    fn from(data: Ns) -> Self {
        RecordData::Ns(data)
    }
}

impl From<Cname> for RecordData {
    fn from(data: Cname) -> Self {
        RecordData::Cname(data)
    }
}

impl From<Soa> for RecordData {
    fn from(data: Soa) -> Self {
        RecordData::Soa(data)
    }
}

impl From<Mx> for RecordData {
    fn from(data: Mx) -> Self {
        RecordData::Mx(data)
    }
}

impl From<Ptr> for RecordData {
    fn from(data: Ptr) -> Self {
        RecordData::Ptr(data)
    }
}

record_data! {
    /// A host address.
    A(A) => A,
    /// An authoritative name server.
    Ns(Ns) => NS,
    /// The canonical name for an alias.
    Cname(Cname) => CNAME,
    /// The start of a zone of authority.
    Soa(Soa) => SOA,
    /// A mailbox domain name.
    Mb(Mb) => MB,
    /// A mail group member.
    Mg(Mg) => MG,
    /// A mail rename domain name.
    Mr(Mr) => MR,
    /// A null record.
    Null(Null) => NULL,
    /// A well known service description.
    Wks(Wks) => WKS,
    /// A domain name pointer.
    Ptr(Ptr) => PTR,
    /// Host information.
    Hinfo(Hinfo) => HINFO,
    /// Mailing list information.
    Minfo(Minfo) => MINFO,
    /// A mail exchange.
    Mx(Mx) => MX,
    /// Text strings.
    Txt(Txt) => TXT,
    /// A responsible person.
    Rp(Rp) => RP,
    /// An AFS database location.
    Afsdb(Afsdb) => AFSDB,
    /// An IPv6 host address.
    Aaaa(Aaaa) => AAAA,
    /// A service location.
    Srv(Srv) => SRV,
    /// A naming authority pointer.
    Naptr(Naptr) => NAPTR,
    /// An IPv6 address with prefix delegation.
    A6(A6) => A6,
    /// A subtree redirection.
    Dname(Dname) => DNAME,
    /// A sender policy, TXT-shaped.
    Spf(Txt) => SPF,
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use core::str::FromStr;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use bytes::Bytes;
    use smallvec::smallvec;
    use crate::base::charstr::CharStr;
    use crate::base::name::Name;
    use super::*;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn charstr(s: &str) -> CharStr {
        CharStr::from_str(s).unwrap()
    }

    /// One of every supported record data type.
    pub(crate) fn samples() -> Vec<RecordData> {
        vec![
            A::new(Ipv4Addr::new(192, 0, 2, 1)).into(),
            Ns::new(name("ns1.example.com")).into(),
            Cname::new(name("real.example.com")).into(),
            RecordData::Soa(Soa {
                mname: name("ns1.example.com"),
                rname: name("hostmaster.example.com"),
                serial: 2024010101,
                refresh: 10800,
                retry: 3600,
                expire: 604800,
                minimum: 86400,
            }),
            RecordData::Mb(Mb::new(name("mail.example.com"))),
            RecordData::Mg(Mg::new(name("group.example.com"))),
            RecordData::Mr(Mr::new(name("new.example.com"))),
            RecordData::Null(Null {
                data: Bytes::from_static(b"anything at all"),
            }),
            RecordData::Wks(Wks {
                addr: Ipv4Addr::new(192, 0, 2, 1),
                protocol: 6,
                bitmap: Bytes::from_static(&[0x00, 0x01, 0x80]),
            }),
            RecordData::Ptr(Ptr::new(name("host.example.com"))),
            RecordData::Hinfo(Hinfo {
                cpu: charstr("VAX-11/780"),
                os: charstr("UNIX"),
            }),
            RecordData::Minfo(Minfo {
                rmailbx: name("admin.example.com"),
                emailbx: name("errors.example.com"),
            }),
            RecordData::Mx(Mx::new(10, name("mail.example.com"))),
            RecordData::Txt(Txt {
                segments: smallvec![charstr("v=test"), charstr("second")],
            }),
            RecordData::Rp(Rp {
                mbox: name("ops.example.com"),
                txt: name("ops-info.example.com"),
            }),
            RecordData::Afsdb(Afsdb {
                subtype: 1,
                hostname: name("afs.example.com"),
            }),
            Aaaa::new(Ipv6Addr::from_str("2001:db8::1").unwrap()).into(),
            RecordData::Srv(Srv {
                priority: 0,
                weight: 5,
                port: 5060,
                target: name("sip.example.com"),
            }),
            RecordData::Naptr(Naptr {
                order: 100,
                preference: 50,
                flags: charstr("s"),
                services: charstr("SIP+D2U"),
                regexp: charstr(""),
                replacement: name("_sip._udp.example.com"),
            }),
            RecordData::A6(A6 {
                prefix_len: 64,
                suffix: Ipv6Addr::from_str("::1234:5678:9abc:def0")
                    .unwrap(),
                prefix: Some(name("subnet.example.com")),
            }),
            RecordData::Dname(Dname::new(name("new-tree.example.com"))),
            RecordData::Spf(Txt {
                segments: smallvec![charstr("v=spf1 -all")],
            }),
        ]
    }

    #[test]
    fn every_type_roundtrips() {
        for data in samples() {
            let mut composer = Composer::new();
            data.compose(&mut composer);
            let octets = composer.finish();
            let mut parser = Parser::from_octets(&octets);
            let saved = parser.set_limit(octets.len()).unwrap();
            let parsed = RecordData::parse(data.rtype(), &mut parser)
                .unwrap()
                .unwrap_or_else(|| panic!("no decoder for {}", data.rtype()));
            parser.restore_limit(saved);
            assert_eq!(parsed, data, "mismatch for {}", data.rtype());
            assert_eq!(parsed.rtype(), data.rtype());
        }
    }

    #[test]
    fn unknown_type_yields_none() {
        let mut parser = Parser::from_octets(b"\x01\x02\x03");
        assert_eq!(
            RecordData::parse(Rtype::from_int(4711), &mut parser),
            Ok(None)
        );
        // Nothing was consumed.
        assert_eq!(parser.pos(), 0);
    }
}
