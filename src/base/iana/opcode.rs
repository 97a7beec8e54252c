//! DNS operation codes.

//------------ Opcode --------------------------------------------------------

int_enum! {
    /// DNS operation codes.
    ///
    /// The opcode is a four bit field in the message header describing the
    /// kind of operation a message performs. Only the lower four bits of
    /// the wrapped value are ever put on the wire.
    =>
    Opcode, u8;

    /// A standard query.
    (QUERY => 0, "QUERY")

    /// An inverse query.
    ///
    /// (Obsolete.)
    (IQUERY => 1, "IQUERY")

    /// A server status request.
    (STATUS => 2, "STATUS")

    /// A zone change notification.
    (NOTIFY => 4, "NOTIFY")

    /// A dynamic update.
    (UPDATE => 5, "UPDATE")
}

impl Default for Opcode {
    fn default() -> Self {
        Opcode::QUERY
    }
}
