//! Resource record type values.

//------------ Rtype ---------------------------------------------------------

int_enum! {
    /// Resource record types.
    ///
    /// Every resource record carries a 16 bit type value indicating what
    /// kind of information it holds. A query carries the type it asks for.
    /// A few values, the query types at the top of the range, can only
    /// appear in questions.
    ///
    /// The assigned values are maintained in the IANA DNS parameters
    /// registry.
    =>
    Rtype, u16;

    /// A host address.
    (A => 1, "A")

    /// An authoritative name server.
    (NS => 2, "NS")

    /// The canonical name for an alias.
    (CNAME => 5, "CNAME")

    /// Marks the start of a zone of authority.
    (SOA => 6, "SOA")

    /// A mailbox domain name.
    ///
    /// (Experimental.)
    (MB => 7, "MB")

    /// A mail group member.
    ///
    /// (Experimental.)
    (MG => 8, "MG")

    /// A mail rename domain name.
    ///
    /// (Experimental.)
    (MR => 9, "MR")

    /// A null resource record.
    ///
    /// (Experimental.)
    (NULL => 10, "NULL")

    /// A well known service description.
    (WKS => 11, "WKS")

    /// A domain name pointer.
    (PTR => 12, "PTR")

    /// Host information.
    (HINFO => 13, "HINFO")

    /// Mailbox or mail list information.
    (MINFO => 14, "MINFO")

    /// Mail exchange.
    (MX => 15, "MX")

    /// Text strings.
    (TXT => 16, "TXT")

    /// Responsible person.
    (RP => 17, "RP")

    /// AFS database location.
    (AFSDB => 18, "AFSDB")

    /// An IPv6 host address.
    (AAAA => 28, "AAAA")

    /// Server selection.
    (SRV => 33, "SRV")

    /// Naming authority pointer.
    (NAPTR => 35, "NAPTR")

    /// An IPv6 address with a prefix delegation.
    ///
    /// (Historic – use AAAA.)
    (A6 => 38, "A6")

    /// Redirection for a subtree of the name space.
    (DNAME => 39, "DNAME")

    /// EDNS pseudo record type.
    (OPT => 41, "OPT")

    /// Sender policy framework.
    ///
    /// (Obsolete – use TXT.)
    (SPF => 99, "SPF")

    /// Transfer of an entire zone.
    ///
    /// (Query type.)
    (AXFR => 252, "AXFR")

    /// All records a server has available.
    ///
    /// (Query type.)
    (ANY => 255, "ANY")
}
