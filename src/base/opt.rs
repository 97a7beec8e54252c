//! The OPT pseudo record of EDNS.
//!
//! EDNS (RFC 6891) smuggles protocol extensions into the additional
//! section as a pseudo record of type OPT owned by the root name. The
//! record's class field carries the sender's maximum UDP payload size and
//! its TTL field is split into an extended rcode octet, a version octet,
//! and a flags word of which only the DNSSEC-OK bit is assigned.
//!
//! The message codec keeps OPT out of the visible additional section:
//! exactly one OPT is lifted into [`Message::opt`] on parse and appended
//! back on compose. Two or more OPT records are a format error.
//!
//! [`Message::opt`]: super::message::Message::opt

use core::fmt;
use bytes::Bytes;
use super::iana::Rtype;
use super::wire::Composer;

/// The default advertised UDP payload size.
///
/// Large enough to be useful, small enough to avoid fragmentation on
/// common paths.
pub const DEF_UDP_PAYLOAD_SIZE: u16 = 1232;

//------------ OptRecord -----------------------------------------------------

/// An EDNS OPT pseudo record in unpacked form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OptRecord {
    /// The EDNS version. Version 0 is the only one defined.
    pub version: u8,

    /// The sender's maximum acceptable UDP payload size.
    pub udp_payload_size: u16,

    /// The DNSSEC-OK bit: the sender wants DNSSEC records in responses.
    pub dnssec_ok: bool,

    /// The upper eight bits of the extended response code.
    pub ext_rcode: u8,

    /// The raw EDNS options, passed through uninterpreted.
    pub options: Bytes,
}

impl OptRecord {
    /// Creates an OPT record advertising the given version.
    pub fn new(version: u8) -> Self {
        OptRecord {
            version,
            udp_payload_size: DEF_UDP_PAYLOAD_SIZE,
            dnssec_ok: false,
            ext_rcode: 0,
            options: Bytes::new(),
        }
    }

    /// Unpacks an OPT record from the class and TTL fields of its record.
    pub fn from_wire_parts(class: u16, ttl: u32, options: Bytes) -> Self {
        OptRecord {
            version: ((ttl >> 16) & 0xFF) as u8,
            udp_payload_size: class,
            dnssec_ok: ttl & 0x8000 != 0,
            ext_rcode: (ttl >> 24) as u8,
            options,
        }
    }

    /// Appends the record to a composer in wire form.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_u8(0); // the root owner name
        composer.append_u16_be(Rtype::OPT.to_int());
        composer.append_u16_be(self.udp_payload_size);
        let mut ttl = u32::from(self.ext_rcode) << 24
            | u32::from(self.version) << 16;
        if self.dnssec_ok {
            ttl |= 0x8000;
        }
        composer.append_u32_be(ttl);
        composer.append_u16_be(self.options.len() as u16);
        composer.append_slice(&self.options);
    }
}

impl Default for OptRecord {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Display for OptRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "EDNS version {}; udp={}; flags={}",
            self.version,
            self.udp_payload_size,
            if self.dnssec_ok { "do" } else { "" }
        )
    }
}

//============ Tests =========================================================
