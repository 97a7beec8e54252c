//! DNS response codes.

//------------ Rcode ---------------------------------------------------------

int_enum! {
    /// DNS response codes.
    ///
    /// The four bit rcode field of the message header states whether a
    /// request succeeded and, if not, why. Only the lower four bits of the
    /// wrapped value are ever put on the wire.
    =>
    Rcode, u8;

    /// No error condition.
    (NOERROR => 0, "NOERROR")

    /// The server was unable to interpret the query.
    (FORMERR => 1, "FORMERR")

    /// The server encountered an internal failure.
    (SERVFAIL => 2, "SERVFAIL")

    /// The queried name does not exist.
    ///
    /// Only meaningful in responses from an authoritative server.
    (NXDOMAIN => 3, "NXDOMAIN")

    /// The server does not support the requested kind of query.
    (NOTIMP => 4, "NOTIMP")

    /// The server refuses to perform the operation for policy reasons.
    (REFUSED => 5, "REFUSED")
}

impl Default for Rcode {
    fn default() -> Self {
        Rcode::NOERROR
    }
}
