//! Whole DNS messages.
//!
//! [`Message`] is the unit the transports exchange: a header, the four
//! record sections, and an optional EDNS OPT record kept apart from the
//! visible additional section. Messages are owned values; parsing copies
//! out of the wire buffer and composing builds a fresh buffer with name
//! compression applied across the entire message.

use bytes::Bytes;
use tracing::debug;
use super::header::Header;
use super::opt::OptRecord;
use super::question::Question;
use super::record::{ParsedRecord, Record};
use super::wire::{ComposeError, Composer, ParseError, Parser};

/// The traditional maximum size of a UDP response without EDNS.
pub const MAX_UDP_PAYLOAD: usize = 512;

//------------ Message -------------------------------------------------------

/// A DNS message.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    /// The ID and flags of the message.
    pub header: Header,

    /// The question section.
    pub questions: Vec<Question>,

    /// The answer section.
    pub answers: Vec<Record>,

    /// The authority section.
    pub authority: Vec<Record>,

    /// The additional section, without any OPT record.
    pub additional: Vec<Record>,

    /// The EDNS OPT record, if the message carries one.
    pub opt: Option<OptRecord>,
}

impl Message {
    /// Creates a query message for a single question.
    ///
    /// The recursion desired flag is set; the transaction ID is zero and
    /// assigned by the transport before the message goes out.
    pub fn query(question: Question) -> Self {
        Message {
            header: Header::request(0),
            questions: vec![question],
            ..Default::default()
        }
    }

    /// Returns the first question of the message, if there is one.
    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    /// Returns whether this message answers the given query.
    ///
    /// The message must be a response carrying the query's ID. A response
    /// with an empty question section is accepted if it reports an error
    /// or is truncated; otherwise the question must match the query's.
    pub fn is_answer(&self, query: &Message) -> bool {
        if !self.header.qr || self.header.id != query.header.id {
            return false;
        }
        if self.questions.is_empty() {
            return self.header.tc
                || self.header.rcode != super::iana::Rcode::NOERROR;
        }
        self.questions == query.questions
    }

    /// Parses a message from its wire format.
    ///
    /// A record of an unsupported type is skipped and dropped from the
    /// result. A malformed name, a record data field that does not fit
    /// its declared length, or a repeated OPT record fail the whole
    /// message, since the following section boundaries cannot be trusted.
    pub fn parse(octets: &[u8]) -> Result<Self, ParseError> {
        let mut parser = Parser::from_octets(octets);
        let header = Header::parse(&mut parser)?;
        let qdcount = parser.parse_u16_be()?;
        let ancount = parser.parse_u16_be()?;
        let nscount = parser.parse_u16_be()?;
        let arcount = parser.parse_u16_be()?;

        let mut questions = Vec::with_capacity(usize::from(qdcount));
        for _ in 0..qdcount {
            questions.push(Question::parse(&mut parser)?);
        }

        let mut opt = None;
        let answers = Self::parse_section(&mut parser, ancount, None)?;
        let authority = Self::parse_section(&mut parser, nscount, None)?;
        let additional =
            Self::parse_section(&mut parser, arcount, Some(&mut opt))?;

        Ok(Message {
            header,
            questions,
            answers,
            authority,
            additional,
            opt,
        })
    }

    /// Parses one record section.
    ///
    /// `opt` is `Some` for the additional section, where a single OPT
    /// record is legal and extracted.
    fn parse_section(
        parser: &mut Parser,
        count: u16,
        mut opt: Option<&mut Option<OptRecord>>,
    ) -> Result<Vec<Record>, ParseError> {
        let mut records = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            match Record::parse(parser)? {
                ParsedRecord::Record(record) => records.push(record),
                ParsedRecord::Unknown(rtype) => {
                    debug!("skipping record of unsupported type {}", rtype);
                }
                ParsedRecord::Opt(record) => match opt {
                    Some(ref mut slot) => {
                        if slot.is_some() {
                            return Err(ParseError::form_error(
                                "more than one OPT record",
                            ));
                        }
                        **slot = Some(record);
                    }
                    None => {
                        return Err(ParseError::form_error(
                            "OPT record outside additional section",
                        ));
                    }
                },
            }
        }
        Ok(records)
    }

    /// Composes the message into its wire format.
    ///
    /// With a size limit, records are dropped from the tail of the
    /// answer, authority, and additional sections until the message fits
    /// and the truncated flag is set. Questions are never dropped. The
    /// OPT record, if any, is appended after the additional section.
    pub fn compose(
        &self,
        limit: Option<usize>,
    ) -> Result<Bytes, ComposeError> {
        let mut composer = Composer::new();
        self.header.compose(&mut composer);
        composer.append_u16_be(self.questions.len() as u16);
        // Section counts, patched below once truncation is decided.
        composer.append_u16_be(0);
        composer.append_u16_be(0);
        composer.append_u16_be(0);

        for question in &self.questions {
            question.compose(&mut composer);
        }

        let mut counts = [0u16; 3];
        let mut truncated = false;
        let sections =
            [&self.answers, &self.authority, &self.additional];
        'sections: for (idx, section) in sections.iter().enumerate() {
            for record in section.iter() {
                let mark = composer.len();
                record.compose(&mut composer)?;
                if limit.is_some_and(|limit| composer.len() > limit) {
                    composer.truncate(mark);
                    truncated = true;
                    break 'sections;
                }
                counts[idx] += 1;
            }
        }

        let mut arcount = counts[2];
        if let Some(ref opt) = self.opt {
            if !truncated {
                let mark = composer.len();
                opt.compose(&mut composer);
                if limit.is_some_and(|limit| composer.len() > limit) {
                    composer.truncate(mark);
                } else {
                    arcount += 1;
                }
            }
        }

        composer.patch_u16_be(6, counts[0]);
        composer.patch_u16_be(8, counts[1]);
        composer.patch_u16_be(10, arcount);
        if truncated {
            let flags = u16::from_be_bytes([
                composer.as_slice()[2],
                composer.as_slice()[3],
            ]);
            composer.patch_u16_be(2, flags | 0x0200);
        }
        Ok(composer.finish())
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use core::str::FromStr;
    use std::net::Ipv4Addr;
    use crate::base::iana::{Class, Rcode, Rtype};
    use crate::base::name::Name;
    use crate::base::record::Ttl;
    use crate::rdata::{Ns, RecordData, A};
    use super::*;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn a_record(owner: &str, addr: [u8; 4]) -> Record {
        Record::new(
            name(owner),
            Ttl::from_secs(300),
            A::new(Ipv4Addr::from(addr)).into(),
        )
    }

    fn query(qname: &str, qtype: Rtype) -> Message {
        let mut msg = Message::query(Question::new(name(qname), qtype));
        msg.header.id = 4711;
        msg
    }

    #[test]
    fn roundtrip_with_all_sections() {
        let mut msg = query("example.com", Rtype::A);
        msg.header.qr = true;
        msg.header.aa = true;
        msg.answers.push(a_record("example.com", [192, 0, 2, 1]));
        msg.authority.push(Record::new(
            name("example.com"),
            Ttl::from_secs(3600),
            RecordData::Ns(Ns::new(name("ns1.example.com"))),
        ));
        msg.additional.push(a_record("ns1.example.com", [192, 0, 2, 53]));

        let octets = msg.compose(None).unwrap();
        let parsed = Message::parse(&octets).unwrap();
        assert_eq!(parsed.header, msg.header);
        assert_eq!(parsed.questions, msg.questions);
        assert_eq!(parsed.answers, msg.answers);
        assert_eq!(parsed.authority, msg.authority);
        assert_eq!(parsed.additional, msg.additional);
        assert_eq!(parsed.opt, None);
    }

    #[test]
    fn repeated_names_are_compressed() {
        let mut msg = query("example.com", Rtype::A);
        msg.answers.push(a_record("example.com", [192, 0, 2, 1]));
        msg.answers.push(a_record("example.com", [192, 0, 2, 2]));
        let octets = msg.compose(None).unwrap();

        // The question name at offset 12 takes 13 octets and the whole
        // question section ends at offset 29. Both answer owners must be
        // two-octet pointers back to offset 12.
        assert_eq!(&octets[29..31], &[0xC0, 12]);
        assert_eq!(&octets[45..47], &[0xC0, 12]);

        let parsed = Message::parse(&octets).unwrap();
        assert_eq!(parsed.answers[0].owner, parsed.answers[1].owner);
        assert_eq!(parsed.answers[0].owner, name("example.com"));
    }

    #[test]
    fn truncation_drops_tail_and_sets_tc() {
        let mut msg = query("example.com", Rtype::A);
        for i in 0..60 {
            msg.answers.push(a_record("example.com", [192, 0, 2, i]));
        }
        let octets = msg.compose(Some(MAX_UDP_PAYLOAD)).unwrap();
        assert!(octets.len() <= MAX_UDP_PAYLOAD);

        let parsed = Message::parse(&octets).unwrap();
        assert!(parsed.header.tc);
        assert_eq!(parsed.questions, msg.questions);
        // The retained records are exactly a prefix of the original.
        assert!(!parsed.answers.is_empty());
        assert!(parsed.answers.len() < 60);
        assert_eq!(
            parsed.answers.as_slice(),
            &msg.answers[..parsed.answers.len()]
        );
    }

    #[test]
    fn unsupported_rtype_is_skipped_not_fatal() {
        let mut msg = query("example.com", Rtype::A);
        msg.header.qr = true;
        msg.answers.push(a_record("example.com", [192, 0, 2, 1]));
        let octets = msg.compose(None).unwrap();

        // Rewrite the answer's TYPE field to an unassigned value. The
        // answer owner is a two-octet pointer at offset 29.
        let mut raw = octets.to_vec();
        raw[31] = 0xF0;
        raw[32] = 0x39;
        let parsed = Message::parse(&raw).unwrap();
        assert!(parsed.answers.is_empty());
        assert_eq!(parsed.questions, msg.questions);
    }

    #[test]
    fn bad_compression_is_fatal() {
        let msg = query("example.com", Rtype::A);
        let octets = msg.compose(None).unwrap();
        let mut raw = octets.to_vec();
        // Replace the first label length with a forward pointer.
        raw[12] = 0xC0;
        raw[13] = 0xFF;
        assert!(Message::parse(&raw).is_err());
    }

    #[test]
    fn opt_is_extracted_and_restored() {
        let mut msg = query("example.com", Rtype::A);
        msg.opt = Some(OptRecord::new(0));
        let octets = msg.compose(None).unwrap();

        // ARCOUNT counts the OPT record on the wire.
        assert_eq!(octets[11], 1);
        let parsed = Message::parse(&octets).unwrap();
        assert!(parsed.additional.is_empty());
        assert_eq!(parsed.opt, Some(OptRecord::new(0)));
    }

    #[test]
    fn second_opt_is_a_format_error() {
        let mut msg = query("example.com", Rtype::A);
        msg.opt = Some(OptRecord::new(0));
        let octets = msg.compose(None).unwrap();
        let mut raw = octets.to_vec();
        // Duplicate the trailing 11-octet OPT record.
        let opt_wire = raw[raw.len() - 11..].to_vec();
        raw.extend_from_slice(&opt_wire);
        raw[11] = 2;
        assert_eq!(
            Message::parse(&raw),
            Err(ParseError::form_error("more than one OPT record"))
        );
    }

    #[test]
    fn is_answer_checks_id_and_question() {
        let msg = query("example.com", Rtype::A);
        let mut reply = msg.clone();
        reply.header.qr = true;
        assert!(reply.is_answer(&msg));

        let mut wrong_id = reply.clone();
        wrong_id.header.id = 1;
        assert!(!wrong_id.is_answer(&msg));

        let mut wrong_q = reply.clone();
        wrong_q.questions[0].qtype = Rtype::MX;
        assert!(!wrong_q.is_answer(&msg));

        // An empty-question error reply is accepted.
        let mut error_reply = reply.clone();
        error_reply.questions.clear();
        error_reply.header.rcode = Rcode::SERVFAIL;
        assert!(error_reply.is_answer(&msg));

        let mut empty_ok = reply;
        empty_ok.questions.clear();
        assert!(!empty_ok.is_answer(&msg));
    }

    #[test]
    fn questions_use_class_in() {
        let msg = query("example.com", Rtype::A);
        assert_eq!(msg.questions[0].qclass, Class::IN);
    }

    #[test]
    fn parse_fails_on_short_header() {
        assert_eq!(
            Message::parse(&[0; 11]),
            Err(ParseError::ShortInput)
        );
    }
}
