//! The header of a DNS message.
//!
//! Every message starts with twelve octets: a 16 bit transaction ID, two
//! flag octets carrying the opcode, response code, and the single-bit
//! flags, and the four section counts. [`Header`] covers the first four
//! octets in unpacked form; the counts are derived from the section
//! vectors when a message is composed and are therefore handled by the
//! message codec itself.

use super::iana::{Opcode, Rcode};
use super::wire::{Composer, ParseError, Parser};

//------------ Header --------------------------------------------------------

/// The ID and flags portion of a message header.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Header {
    /// The transaction ID, echoed verbatim in responses.
    pub id: u16,

    /// Is this message a response?
    pub qr: bool,

    /// The kind of operation the message performs.
    pub opcode: Opcode,

    /// Is the responding server an authority for the queried name?
    pub aa: bool,

    /// Was the response truncated to fit the transport?
    pub tc: bool,

    /// Does the requester want the server to recurse?
    pub rd: bool,

    /// Is the responding server willing to recurse?
    pub ra: bool,

    /// The outcome of the request.
    pub rcode: Rcode,
}

impl Header {
    /// Creates a request header with the given ID.
    pub fn request(id: u16) -> Self {
        Header {
            id,
            rd: true,
            ..Default::default()
        }
    }

    /// Creates the header of a response to a request with this header.
    ///
    /// The ID and opcode are echoed, RD is mirrored, QR is set.
    pub fn answer_to(&self) -> Self {
        Header {
            id: self.id,
            qr: true,
            opcode: self.opcode,
            rd: self.rd,
            ..Default::default()
        }
    }

    /// Parses the first four header octets.
    pub fn parse(parser: &mut Parser) -> Result<Self, ParseError> {
        let id = parser.parse_u16_be()?;
        let flags = parser.parse_u16_be()?;
        Ok(Header {
            id,
            qr: flags & 0x8000 != 0,
            opcode: Opcode::from_int(((flags >> 11) & 0x0F) as u8),
            aa: flags & 0x0400 != 0,
            tc: flags & 0x0200 != 0,
            rd: flags & 0x0100 != 0,
            ra: flags & 0x0080 != 0,
            rcode: Rcode::from_int((flags & 0x000F) as u8),
        })
    }

    /// Appends the first four header octets to a composer.
    pub fn compose(&self, composer: &mut Composer) {
        composer.append_u16_be(self.id);
        let mut flags = 0u16;
        if self.qr {
            flags |= 0x8000;
        }
        flags |= u16::from(self.opcode.to_int() & 0x0F) << 11;
        if self.aa {
            flags |= 0x0400;
        }
        if self.tc {
            flags |= 0x0200;
        }
        if self.rd {
            flags |= 0x0100;
        }
        if self.ra {
            flags |= 0x0080;
        }
        flags |= u16::from(self.rcode.to_int() & 0x0F);
        composer.append_u16_be(flags);
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flag_layout() {
        let header = Header {
            id: 0x1234,
            qr: true,
            opcode: Opcode::NOTIFY,
            aa: true,
            tc: false,
            rd: true,
            ra: true,
            rcode: Rcode::REFUSED,
        };
        let mut composer = Composer::new();
        header.compose(&mut composer);
        let octets = composer.finish();
        assert_eq!(&octets[..], &[0x12, 0x34, 0xA5, 0x85]);
        let mut parser = Parser::from_octets(&octets);
        assert_eq!(Header::parse(&mut parser).unwrap(), header);
    }

    #[test]
    fn answer_echoes_request() {
        let mut request = Header::request(999);
        request.opcode = Opcode::QUERY;
        let answer = request.answer_to();
        assert_eq!(answer.id, 999);
        assert!(answer.qr);
        assert!(answer.rd);
        assert!(!answer.aa);
        assert_eq!(answer.rcode, Rcode::NOERROR);
    }
}
