//! IANA definitions for DNS.
//!
//! This module contains the numeric registries the protocol uses: record
//! types, classes, opcodes, and response codes. Each is a newtype over the
//! raw integer with constants for the well-known values, so unassigned
//! values coming off the wire are representable without loss.

#[macro_use]
mod macros;

pub use self::class::Class;
pub use self::opcode::Opcode;
pub use self::rcode::Rcode;
pub use self::rtype::Rtype;

mod class;
mod opcode;
mod rcode;
mod rtype;
