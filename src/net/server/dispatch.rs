//! Turning DNS requests into responses.
//!
//! A [`Dispatcher`] routes a request to the most specific zone whose
//! apex is a suffix of the queried name, falls back to recursion via a
//! configured [`Resolver`] when no zone matches, and otherwise refuses.
//! Opcodes other than QUERY go to a handler registry and fail with
//! NOTIMP when nothing is registered for them.
//!
//! [`serve_dgram`][Dispatcher::serve_dgram] plugs a dispatcher into a
//! datagram transport's listener, so one socket can both send queries
//! and answer them.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::base::iana::{Opcode, Rcode, Rtype};
use crate::base::{Message, Name};
use crate::net::client::dgram;
use crate::net::client::error::Error;
use crate::net::client::resolver::Resolver;
use crate::net::server::authority::{Lookup, ZoneLookup};
use crate::rdata::RecordData;

//------------ Dispatcher ----------------------------------------------------

/// A handler for one non-QUERY opcode.
pub type OpcodeHandler =
    Box<dyn Fn(&Message) -> Message + Send + Sync>;

/// Routes requests to zones, a resolver, or opcode handlers.
pub struct Dispatcher {
    /// The zones served authoritatively.
    zones: Vec<Arc<dyn ZoneLookup>>,

    /// Answers questions outside any zone, if recursion is offered.
    resolver: Option<Resolver>,

    /// Handlers for opcodes other than QUERY.
    handlers: HashMap<Opcode, OpcodeHandler>,
}

impl Dispatcher {
    /// Creates a dispatcher without zones or recursion.
    pub fn new() -> Self {
        Self {
            zones: Vec::new(),
            resolver: None,
            handlers: HashMap::new(),
        }
    }

    /// Adds a zone to serve authoritatively.
    pub fn add_zone(&mut self, zone: impl ZoneLookup + 'static) {
        self.zones.push(Arc::new(zone));
    }

    /// Offers recursion through the given resolver.
    ///
    /// Without a resolver, questions outside every zone are refused.
    pub fn set_resolver(&mut self, resolver: Resolver) {
        self.resolver = Some(resolver);
    }

    /// Registers a handler for a non-QUERY opcode.
    pub fn register_handler(
        &mut self,
        opcode: Opcode,
        handler: OpcodeHandler,
    ) {
        self.handlers.insert(opcode, handler);
    }

    /// Produces the response to a request.
    pub async fn handle(&self, request: &Message) -> Message {
        if request.header.opcode != Opcode::QUERY {
            return match self.handlers.get(&request.header.opcode) {
                Some(handler) => handler(request),
                None => {
                    debug!(
                        opcode = %request.header.opcode,
                        "no handler for opcode",
                    );
                    self.response_to(request, Rcode::NOTIMP)
                }
            };
        }

        let question = match request.first_question() {
            Some(question) => question.clone(),
            None => return self.response_to(request, Rcode::FORMERR),
        };

        // The most specific zone whose apex is a suffix of the name
        // answers for it.
        let zone = self
            .zones
            .iter()
            .filter(|zone| question.qname.ends_with(zone.origin()))
            .max_by_key(|zone| zone.origin().label_count());

        let mut response = self.response_to(request, Rcode::NOERROR);
        match zone {
            Some(zone) => {
                match zone.lookup(&question.qname, question.qtype) {
                    Lookup::Answer(records) => {
                        response.header.aa = true;
                        response.answers = records;
                        append_additional(&**zone, &mut response);
                    }
                    Lookup::Referral(records) => {
                        response.authority = records;
                        append_additional(&**zone, &mut response);
                    }
                    Lookup::NoData => {
                        // The name exists, so this is a NOERROR answer
                        // with nothing in it, not a name error.
                        response.header.aa = true;
                        response.authority.push(zone.soa_record());
                    }
                    Lookup::NxDomain => {
                        response.header.aa = true;
                        response.header.rcode = Rcode::NXDOMAIN;
                        response.authority.push(zone.soa_record());
                    }
                }
            }
            None => match &self.resolver {
                Some(resolver) if request.header.rd => {
                    match resolver.query(question).await {
                        Ok(reply) => {
                            response.answers = reply.answers;
                            response.authority = reply.authority;
                            response.additional = reply.additional;
                        }
                        Err(err) => {
                            response.header.rcode = relay_rcode(&err);
                        }
                    }
                }
                _ => response.header.rcode = Rcode::REFUSED,
            },
        }
        response
    }

    /// Builds an empty response mirroring the request.
    fn response_to(&self, request: &Message, rcode: Rcode) -> Message {
        let mut response = Message {
            header: request.header.answer_to(),
            questions: request.questions.clone(),
            ..Default::default()
        };
        response.header.ra = self.resolver.is_some();
        response.header.rcode = rcode;
        response
    }

    /// Serves requests arriving on a datagram transport.
    ///
    /// Takes over the transport's listener channel and answers every
    /// message on it. Runs until the transport goes away.
    pub async fn serve_dgram(self: Arc<Self>, conn: dgram::Connection) {
        let mut queries = conn.listen();
        while let Some((request, peer)) = queries.recv().await {
            let this = self.clone();
            let conn = conn.clone();
            tokio::spawn(async move {
                let response = this.handle(&request).await;
                if let Err(err) = conn.send_to(&response, peer).await {
                    warn!(%peer, error = %err, "sending response failed");
                }
            });
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulls the addresses of names the response points at into the
/// additional section.
///
/// MX exchanges, NS name servers and CNAME targets make the client come
/// back for the target's address; handing the zone's A and AAAA records
/// for those names along saves it the round trip. Records already
/// present in the response are not repeated.
fn append_additional(zone: &dyn ZoneLookup, response: &mut Message) {
    let targets: Vec<Name> = response
        .answers
        .iter()
        .chain(&response.authority)
        .filter_map(|record| match &record.data {
            RecordData::Mx(mx) => Some(mx.exchange.clone()),
            RecordData::Ns(ns) => Some(ns.nsdname.clone()),
            RecordData::Cname(cname) => Some(cname.cname.clone()),
            _ => None,
        })
        .collect();
    for target in targets {
        for rtype in [Rtype::A, Rtype::AAAA] {
            let records = match zone.lookup(&target, rtype) {
                Lookup::Answer(records) => records,
                _ => continue,
            };
            for record in records {
                if record.rtype() == rtype
                    && !response.answers.contains(&record)
                    && !response.additional.contains(&record)
                {
                    response.additional.push(record);
                }
            }
        }
    }
}

/// Maps a resolver error onto the rcode relayed to the client.
fn relay_rcode(err: &Error) -> Rcode {
    match err {
        Error::NameError => Rcode::NXDOMAIN,
        Error::Refused => Rcode::REFUSED,
        Error::NotImplemented => Rcode::NOTIMP,
        _ => Rcode::SERVFAIL,
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::iana::Rtype;
    use crate::base::{Name, Question, Record, Ttl};
    use crate::net::server::authority::Authority;
    use crate::rdata::rfc1035::{Mx, Ns, Soa, A};

    fn zone() -> Authority {
        let origin: Name = "example.com".parse().unwrap();
        let soa = Soa {
            mname: "ns1.example.com".parse().unwrap(),
            rname: "hostmaster.example.com".parse().unwrap(),
            serial: 2024010101,
            refresh: 7200,
            retry: 3600,
            expire: 86400,
            minimum: 300,
        };
        let mut zone = Authority::new(origin, soa);
        zone.insert(Record::new(
            "www.example.com".parse().unwrap(),
            Ttl::from_secs(3600),
            A::new([192, 0, 2, 10].into()).into(),
        ));
        zone
    }

    fn dispatcher() -> Dispatcher {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_zone(zone());
        dispatcher
    }

    fn request(name: &str, rtype: Rtype) -> Message {
        let mut msg = Message::query(Question::new(
            name.parse().unwrap(),
            rtype,
        ));
        msg.header.id = 0x700f;
        msg
    }

    #[tokio::test]
    async fn authoritative_answer_echoes_id() {
        let request = request("www.example.com", Rtype::A);
        let response = dispatcher().handle(&request).await;
        assert_eq!(response.header.id, 0x700f);
        assert!(response.header.qr);
        assert!(response.header.aa);
        assert!(!response.header.ra);
        assert_eq!(response.answers.len(), 1);
        assert!(response.is_answer(&request));
    }

    #[tokio::test]
    async fn missing_name_gets_nxdomain_with_soa() {
        let request = request("nope.example.com", Rtype::A);
        let response = dispatcher().handle(&request).await;
        assert_eq!(response.header.rcode, Rcode::NXDOMAIN);
        assert!(response.header.aa);
        assert_eq!(response.authority.len(), 1);
        assert_eq!(response.authority[0].rtype(), Rtype::SOA);
        assert_eq!(response.authority[0].ttl, Ttl::from_secs(300));
    }

    #[tokio::test]
    async fn wrong_type_for_existing_name_is_empty_noerror() {
        // www.example.com exists, but only with an A record.
        let request = request("www.example.com", Rtype::MX);
        let response = dispatcher().handle(&request).await;
        assert_eq!(response.header.rcode, Rcode::NOERROR);
        assert!(response.header.aa);
        assert!(response.answers.is_empty());
        assert_eq!(response.authority.len(), 1);
        assert_eq!(response.authority[0].rtype(), Rtype::SOA);
    }

    #[tokio::test]
    async fn mail_exchange_answer_carries_exchange_address() {
        let mut zone = zone();
        zone.insert(Record::new(
            "example.com".parse().unwrap(),
            Ttl::from_secs(3600),
            Mx::new(10, "mail.example.com".parse().unwrap()).into(),
        ));
        zone.insert(Record::new(
            "mail.example.com".parse().unwrap(),
            Ttl::from_secs(3600),
            A::new([192, 0, 2, 25].into()).into(),
        ));
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_zone(zone);

        let request = request("example.com", Rtype::MX);
        let response = dispatcher.handle(&request).await;
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.additional.len(), 1);
        assert_eq!(
            response.additional[0].owner,
            "mail.example.com".parse::<Name>().unwrap(),
        );
        assert_eq!(response.additional[0].rtype(), Rtype::A);
    }

    #[tokio::test]
    async fn referral_carries_nameserver_glue() {
        let mut zone = zone();
        zone.insert(Record::new(
            "sub.example.com".parse().unwrap(),
            Ttl::from_secs(3600),
            Ns::new("ns.sub.example.com".parse().unwrap()).into(),
        ));
        zone.insert(Record::new(
            "ns.sub.example.com".parse().unwrap(),
            Ttl::from_secs(3600),
            A::new([192, 0, 2, 53].into()).into(),
        ));
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_zone(zone);

        let request = request("deep.sub.example.com", Rtype::A);
        let response = dispatcher.handle(&request).await;
        assert!(response.answers.is_empty());
        assert_eq!(response.authority.len(), 1);
        assert_eq!(response.authority[0].rtype(), Rtype::NS);
        assert_eq!(response.additional.len(), 1);
        assert_eq!(
            response.additional[0].owner,
            "ns.sub.example.com".parse::<Name>().unwrap(),
        );
    }

    #[tokio::test]
    async fn out_of_zone_without_recursion_is_refused() {
        let request = request("elsewhere.test", Rtype::A);
        let response = dispatcher().handle(&request).await;
        assert_eq!(response.header.rcode, Rcode::REFUSED);
        assert!(!response.header.aa);
    }

    #[tokio::test]
    async fn unhandled_opcode_is_notimp() {
        let mut request = request("www.example.com", Rtype::A);
        request.header.opcode = Opcode::NOTIFY;
        let response = dispatcher().handle(&request).await;
        assert_eq!(response.header.rcode, Rcode::NOTIMP);
    }

    #[tokio::test]
    async fn registered_handler_answers_its_opcode() {
        let mut dispatcher = dispatcher();
        dispatcher.register_handler(
            Opcode::NOTIFY,
            Box::new(|request| Message {
                header: request.header.answer_to(),
                questions: request.questions.clone(),
                ..Default::default()
            }),
        );
        let mut request = request("example.com", Rtype::SOA);
        request.header.opcode = Opcode::NOTIFY;
        let response = dispatcher.handle(&request).await;
        assert_eq!(response.header.rcode, Rcode::NOERROR);
        assert_eq!(response.header.opcode, Opcode::NOTIFY);
        assert_eq!(response.header.id, request.header.id);
    }

    #[tokio::test]
    async fn empty_question_is_formerr() {
        let request = Message::default();
        let response = dispatcher().handle(&request).await;
        assert_eq!(response.header.rcode, Rcode::FORMERR);
    }

    #[tokio::test]
    async fn most_specific_zone_wins() {
        let mut dispatcher = dispatcher();
        let soa = Soa {
            mname: "ns1.sub.example.com".parse().unwrap(),
            rname: "hostmaster.sub.example.com".parse().unwrap(),
            serial: 1,
            refresh: 7200,
            retry: 3600,
            expire: 86400,
            minimum: 60,
        };
        let mut sub = Authority::new(
            "sub.example.com".parse().unwrap(),
            soa,
        );
        sub.insert(Record::new(
            "www.sub.example.com".parse().unwrap(),
            Ttl::from_secs(60),
            A::new([192, 0, 2, 99].into()).into(),
        ));
        dispatcher.add_zone(sub);

        let request = request("www.sub.example.com", Rtype::A);
        let response = dispatcher.handle(&request).await;
        match &response.answers[0].data {
            crate::rdata::RecordData::A(a) => {
                assert_eq!(a.addr.octets(), [192, 0, 2, 99]);
            }
            other => panic!("unexpected data: {:?}", other),
        }
    }
}
