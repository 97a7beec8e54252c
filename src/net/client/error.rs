//! Error type for client transports and the resolver.

use std::error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use crate::base::iana::Rcode;
use crate::base::wire::ParseError;

//------------ Error ---------------------------------------------------------

/// Error type for client transports and the resolver.
///
/// The type is `Clone` so a single result can be handed to every caller
/// joined onto the same in-flight query; io errors are wrapped in an
/// `Arc` for that reason.
///
/// The negative outcomes a server can report are distinct variants rather
/// than one catch-all, so "the name does not exist" is distinguishable
/// from "the server failed" and both from "no answer at all" (`Timeout`).
#[derive(Clone, Debug)]
pub enum Error {
    /// A received message could not be decoded.
    FormatError(ParseError),

    /// The server reported a failure on its side.
    ServerFailure,

    /// The server reported that the queried name does not exist.
    NameError,

    /// The server does not implement the requested operation.
    NotImplemented,

    /// The server refused to answer for policy reasons.
    Refused,

    /// No response arrived across the full retry schedule.
    Timeout,

    /// Binding a socket gave an error.
    Bind(Arc<std::io::Error>),

    /// Connecting a stream socket gave an error.
    Connect(Arc<std::io::Error>),

    /// Sending a message gave an error.
    Send(Arc<std::io::Error>),

    /// Receiving a message gave an error.
    Receive(Arc<std::io::Error>),

    /// The transaction ID space is exhausted.
    TransactionIdSpace,

    /// The connection was closed before the response arrived.
    ConnectionClosed,

    /// A message to be sent does not fit the transport.
    LongMessage,

    /// A reply arrived that does not match the query.
    WrongReplyForQuery,

    /// A zone transfer ended before its closing SOA record.
    IncompleteTransfer,
}

impl Error {
    /// Returns the error a response's rcode maps to, if any.
    pub fn from_rcode(rcode: Rcode) -> Option<Self> {
        match rcode {
            Rcode::FORMERR => Some(Error::FormatError(
                ParseError::form_error("peer reported a format error"),
            )),
            Rcode::SERVFAIL => Some(Error::ServerFailure),
            Rcode::NXDOMAIN => Some(Error::NameError),
            Rcode::NOTIMP => Some(Error::NotImplemented),
            Rcode::REFUSED => Some(Error::Refused),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Error::FormatError(err) => {
                write!(f, "malformed message: {}", err)
            }
            Error::ServerFailure => write!(f, "server failure"),
            Error::NameError => write!(f, "no such name"),
            Error::NotImplemented => write!(f, "not implemented by server"),
            Error::Refused => write!(f, "refused by server"),
            Error::Timeout => write!(f, "timeout waiting for response"),
            Error::Bind(_) => write!(f, "error binding socket"),
            Error::Connect(_) => write!(f, "error connecting"),
            Error::Send(_) => write!(f, "error sending message"),
            Error::Receive(_) => write!(f, "error receiving message"),
            Error::TransactionIdSpace => {
                write!(f, "no free transaction ID")
            }
            Error::ConnectionClosed => write!(f, "connection closed"),
            Error::LongMessage => {
                write!(f, "message does not fit the transport")
            }
            Error::WrongReplyForQuery => {
                write!(f, "reply does not match query")
            }
            Error::IncompleteTransfer => {
                write!(f, "zone transfer ended prematurely")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Bind(err)
            | Error::Connect(err)
            | Error::Send(err)
            | Error::Receive(err) => Some(err.as_ref()),
            Error::FormatError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::FormatError(err)
    }
}

impl From<crate::base::wire::ComposeError> for Error {
    fn from(_: crate::base::wire::ComposeError) -> Self {
        Error::LongMessage
    }
}
