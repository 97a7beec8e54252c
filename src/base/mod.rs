//! The basic types and the wire codec.
//!
//! This module contains everything needed to represent DNS data and to
//! convert it from and to its binary wire format: domain names with
//! compression, the message header, questions, resource records, whole
//! messages, and the EDNS OPT pseudo record.

pub use self::charstr::CharStr;
pub use self::header::Header;
pub use self::iana::{Class, Opcode, Rcode, Rtype};
pub use self::message::{Message, MAX_UDP_PAYLOAD};
pub use self::name::Name;
pub use self::opt::OptRecord;
pub use self::question::Question;
pub use self::record::{Record, Ttl};

pub mod charstr;
pub mod header;
pub mod iana;
pub mod message;
pub mod name;
pub mod opt;
pub mod question;
pub mod record;
pub mod wire;
