//! Accumulating the responses of a zone transfer.
//!
//! A server may deliver an AXFR as one message or spread it over any
//! number of messages on the same stream. Either way the transferred
//! zone is the concatenation of all answer sections; the transfer is
//! complete when the record mirroring the opening SOA arrives at the
//! end. Authority and additional sections carry nothing of the zone
//! and are ignored.

use crate::base::iana::Rtype;
use crate::base::{Message, Record};

//------------ XfrAccumulator ------------------------------------------------

/// Collects the records of a zone transfer across response messages.
#[derive(Debug, Default)]
pub struct XfrAccumulator {
    /// Everything transferred so far, opening SOA first.
    records: Vec<Record>,
}

impl XfrAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Default::default()
    }

    /// Takes in one response message.
    ///
    /// Returns whether the transfer is now complete: more than one
    /// record has arrived and the last one is the closing SOA. Both
    /// the opening and the closing SOA stay in the result.
    pub fn push_message(&mut self, msg: &Message) -> bool {
        self.records.extend(msg.answers.iter().cloned());
        self.is_complete()
    }

    /// Returns whether the closing SOA has arrived.
    pub fn is_complete(&self) -> bool {
        self.records.len() > 1
            && self
                .records
                .last()
                .map_or(false, |record| record.rtype() == Rtype::SOA)
    }

    /// Returns the transferred records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

//============ Tests =========================================================
