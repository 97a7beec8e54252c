//! Answering DNS requests.
//!
//! [`authority`] holds zone data and decides what a name resolves to;
//! [`dispatch`] wraps any number of zones, an optional resolver for
//! recursion, and an opcode handler registry into something that turns
//! a request message into a response message and can sit on a datagram
//! transport.

pub mod authority;
pub mod dispatch;
