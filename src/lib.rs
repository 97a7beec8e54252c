//! A DNS library for Rust.
//!
//! This crate provides the building blocks for speaking DNS: a wire
//! codec for messages and the common record types, a caching stub
//! resolver, and an authoritative name server core. It is organized
//! into three modules:
//!
//! * [base] contains the fundamental types: domain names, questions,
//!   records, whole messages, and their wire format;
//! * [rdata] contains the data of the supported record types;
//! * [net] contains the transports, the resolver, and the server,
//!   all built on the [Tokio](https://tokio.rs/) async runtime.
//!
//! # Resolving
//!
//! The usual entry point is [`net::client::resolver::Resolver`]. Give
//! it the addresses of your upstream servers and ask it questions; it
//! retries over the servers, answers repeated questions from its
//! cache, and switches to TCP when an answer does not fit a datagram.
//!
//! # Serving
//!
//! [`net::server::dispatch::Dispatcher`] answers requests from zones
//! built with [`net::server::authority::Authority`] or anything else
//! implementing the [`ZoneLookup`][net::server::authority::ZoneLookup]
//! trait, and can relay questions it is not authoritative for through
//! a resolver.

pub mod base;
pub mod net;
pub mod rdata;
pub mod utils;
