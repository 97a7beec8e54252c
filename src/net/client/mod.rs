//! Sending DNS requests and receiving responses.
//!
//! The transports in [`dgram`] and [`stream`] move single messages over
//! UDP and TCP. On top of them, [`redundant`] retries a request over a
//! rotating server list, [`cache`] keeps positive answers around for
//! their TTL, and [`xfr`] reassembles zone transfers. The piece most
//! callers want is [`resolver::Resolver`], which wires all of this
//! together.

pub mod cache;
pub mod dgram;
pub mod error;
pub mod redundant;
pub mod resolver;
pub mod stream;
pub mod xfr;
