//! Authoritative zone data.
//!
//! An [`Authority`] holds the records of one zone in memory, built up
//! programmatically. The [`ZoneLookup`] trait is the seam between zone
//! data and the request dispatcher; implementing it directly lets a
//! zone derive its answers from code instead of a record table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::base::iana::Rtype;
use crate::base::{Name, Record, Ttl};
use crate::rdata::rfc1035::Soa;
use crate::rdata::RecordData;

//------------ ZoneLookup ----------------------------------------------------

/// The outcome of looking a name up in a zone.
#[derive(Clone, Debug)]
pub enum Lookup {
    /// The zone holds these records for the name and type.
    Answer(Vec<Record>),

    /// The name lives in a delegated child zone.
    ///
    /// Carries the NS records of the delegation for the authority
    /// section; the response is not authoritative.
    Referral(Vec<Record>),

    /// The name exists but has no records of the asked-for type.
    ///
    /// Answered with an empty, authoritative NOERROR response rather
    /// than a name error.
    NoData,

    /// The zone is authoritative for the name and has nothing for it.
    NxDomain,
}

/// A source of authoritative answers for one zone.
pub trait ZoneLookup: Send + Sync {
    /// Returns the apex of the zone.
    fn origin(&self) -> &Name;

    /// Returns the zone's SOA record for negative answers.
    ///
    /// Its TTL is the SOA minimum, the negative caching TTL.
    fn soa_record(&self) -> Record;

    /// Looks up records for a name and type.
    fn lookup(&self, qname: &Name, qtype: Rtype) -> Lookup;
}

impl<T: ZoneLookup + ?Sized> ZoneLookup for Arc<T> {
    fn origin(&self) -> &Name {
        (**self).origin()
    }

    fn soa_record(&self) -> Record {
        (**self).soa_record()
    }

    fn lookup(&self, qname: &Name, qtype: Rtype) -> Lookup {
        (**self).lookup(qname, qtype)
    }
}

//------------ Authority -----------------------------------------------------

/// An in-memory authoritative zone.
#[derive(Clone, Debug)]
pub struct Authority {
    /// The apex of the zone.
    origin: Name,

    /// The zone's SOA data.
    soa: Soa,

    /// All records of the zone by owner name.
    records: HashMap<Name, Vec<Record>>,
}

impl Authority {
    /// Creates an empty zone.
    ///
    /// The SOA record is synthesized from `origin` and `soa`; it does
    /// not go into the record table separately.
    pub fn new(origin: Name, soa: Soa) -> Self {
        Self {
            origin,
            soa,
            records: HashMap::new(),
        }
    }

    /// Adds a record to the zone.
    pub fn insert(&mut self, record: Record) {
        self.records
            .entry(record.owner.clone())
            .or_default()
            .push(record);
    }

    /// Returns all records at a name matching a type.
    ///
    /// `ANY` matches every record at the name.
    fn records_at(&self, name: &Name, qtype: Rtype) -> Vec<Record> {
        self.records
            .get(name)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| {
                        qtype == Rtype::ANY || record.rtype() == qtype
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the CNAME record at a name, if there is one.
    fn cname_at(&self, name: &Name) -> Option<Record> {
        self.records.get(name).and_then(|records| {
            records
                .iter()
                .find(|record| record.rtype() == Rtype::CNAME)
                .cloned()
        })
    }

    /// Looks for a delegation on the path from the origin to `qname`.
    ///
    /// Walks the ancestors of `qname` strictly below the apex; NS
    /// records at such a name mean the searched name lives in a child
    /// zone this zone has cut away.
    fn delegation_for(&self, qname: &Name) -> Option<Vec<Record>> {
        let mut name = qname.clone();
        while name != self.origin {
            let ns = self.records_at(&name, Rtype::NS);
            if !ns.is_empty() {
                return Some(ns);
            }
            name = name.parent()?;
        }
        None
    }
}

impl ZoneLookup for Authority {
    fn origin(&self) -> &Name {
        &self.origin
    }

    fn soa_record(&self) -> Record {
        Record::new(
            self.origin.clone(),
            Ttl::from_secs(self.soa.minimum),
            RecordData::Soa(self.soa.clone()),
        )
    }

    fn lookup(&self, qname: &Name, qtype: Rtype) -> Lookup {
        let matched = self.records_at(qname, qtype);
        if !matched.is_empty() {
            return Lookup::Answer(matched);
        }

        // An alias answers for every type it does not carry itself.
        // One extra pass picks up the target's records so a client gets
        // the address along with the CNAME; the chain is never chased
        // further.
        if qtype != Rtype::CNAME {
            if let Some(cname) = self.cname_at(qname) {
                let mut answer = vec![cname.clone()];
                if let RecordData::Cname(ref data) = cname.data {
                    answer.extend(self.records_at(&data.cname, qtype));
                }
                return Lookup::Answer(answer);
            }
        }

        // The name itself exists, just not with the asked-for type.
        if self.records.contains_key(qname) {
            return Lookup::NoData;
        }

        if let Some(ns) = self.delegation_for(qname) {
            return Lookup::Referral(ns);
        }

        Lookup::NxDomain
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdata::rfc1035::{Cname, Mx, Ns, A};

    fn soa() -> Soa {
        Soa {
            mname: "ns1.example.com".parse().unwrap(),
            rname: "hostmaster.example.com".parse().unwrap(),
            serial: 2024010101,
            refresh: 7200,
            retry: 3600,
            expire: 86400,
            minimum: 300,
        }
    }

    fn zone() -> Authority {
        let origin: Name = "example.com".parse().unwrap();
        let mut zone = Authority::new(origin.clone(), soa());
        zone.insert(Record::new(
            "www.example.com".parse().unwrap(),
            Ttl::from_secs(3600),
            A::new([192, 0, 2, 10].into()).into(),
        ));
        zone.insert(Record::new(
            origin.clone(),
            Ttl::from_secs(3600),
            Mx::new(10, "mail.example.com".parse().unwrap()).into(),
        ));
        zone.insert(Record::new(
            "ftp.example.com".parse().unwrap(),
            Ttl::from_secs(3600),
            Cname::new("www.example.com".parse().unwrap()).into(),
        ));
        zone.insert(Record::new(
            "sub.example.com".parse().unwrap(),
            Ttl::from_secs(3600),
            Ns::new("ns.sub.example.com".parse().unwrap()).into(),
        ));
        zone
    }

    #[test]
    fn exact_match() {
        let zone = zone();
        let qname: Name = "www.example.com".parse().unwrap();
        match zone.lookup(&qname, Rtype::A) {
            Lookup::Answer(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].rtype(), Rtype::A);
            }
            other => panic!("unexpected lookup result: {:?}", other),
        }
    }

    #[test]
    fn any_matches_everything_at_name() {
        let mut zone = zone();
        zone.insert(Record::new(
            "www.example.com".parse().unwrap(),
            Ttl::from_secs(3600),
            A::new([192, 0, 2, 11].into()).into(),
        ));
        let qname: Name = "www.example.com".parse().unwrap();
        match zone.lookup(&qname, Rtype::ANY) {
            Lookup::Answer(records) => assert_eq!(records.len(), 2),
            other => panic!("unexpected lookup result: {:?}", other),
        }
    }

    #[test]
    fn cname_answers_with_one_extra_hop() {
        let zone = zone();
        let qname: Name = "ftp.example.com".parse().unwrap();
        match zone.lookup(&qname, Rtype::A) {
            Lookup::Answer(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].rtype(), Rtype::CNAME);
                assert_eq!(records[1].rtype(), Rtype::A);
            }
            other => panic!("unexpected lookup result: {:?}", other),
        }
    }

    #[test]
    fn delegated_name_gives_referral() {
        let zone = zone();
        let qname: Name = "deep.sub.example.com".parse().unwrap();
        match zone.lookup(&qname, Rtype::A) {
            Lookup::Referral(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].rtype(), Rtype::NS);
            }
            other => panic!("unexpected lookup result: {:?}", other),
        }
    }

    #[test]
    fn existing_name_with_other_types_is_nodata() {
        let zone = zone();
        // www.example.com only holds an A record.
        let qname: Name = "www.example.com".parse().unwrap();
        assert!(matches!(
            zone.lookup(&qname, Rtype::MX),
            Lookup::NoData
        ));
    }

    #[test]
    fn missing_name_is_nxdomain() {
        let zone = zone();
        let qname: Name = "nope.example.com".parse().unwrap();
        assert!(matches!(
            zone.lookup(&qname, Rtype::A),
            Lookup::NxDomain
        ));
    }

    #[test]
    fn soa_record_uses_minimum_as_ttl() {
        let zone = zone();
        let record = zone.soa_record();
        assert_eq!(record.ttl, Ttl::from_secs(300));
        assert_eq!(record.rtype(), Rtype::SOA);
    }

    /// A zone that computes addresses from the queried name.
    struct Workstations {
        origin: Name,
    }

    impl ZoneLookup for Workstations {
        fn origin(&self) -> &Name {
            &self.origin
        }

        fn soa_record(&self) -> Record {
            Record::new(
                self.origin.clone(),
                Ttl::from_secs(300),
                RecordData::Soa(soa()),
            )
        }

        fn lookup(&self, qname: &Name, qtype: Rtype) -> Lookup {
            if qtype != Rtype::A && qtype != Rtype::ANY {
                return Lookup::NxDomain;
            }
            let label = match qname.iter_labels().next() {
                Some(label) => label,
                None => return Lookup::NxDomain,
            };
            let host = String::from_utf8_lossy(label);
            let n: u8 = match host.strip_prefix("workstation") {
                Some(digits) => match digits.parse() {
                    Ok(n) => n,
                    Err(_) => return Lookup::NxDomain,
                },
                None => return Lookup::NxDomain,
            };
            Lookup::Answer(vec![Record::new(
                qname.clone(),
                Ttl::from_secs(60),
                A::new([172, 0, 2, n].into()).into(),
            )])
        }
    }

    #[test]
    fn derived_zone_computes_addresses() {
        let zone = Workstations {
            origin: "example.com".parse().unwrap(),
        };
        let qname: Name = "workstation5.example.com".parse().unwrap();
        match zone.lookup(&qname, Rtype::A) {
            Lookup::Answer(records) => {
                assert_eq!(
                    records[0].data,
                    A::new([172, 0, 2, 5].into()).into(),
                );
            }
            other => panic!("unexpected lookup result: {:?}", other),
        }
    }
}
