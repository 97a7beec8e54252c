//! DNS class values.

//------------ Class ---------------------------------------------------------

int_enum! {
    /// DNS class values.
    ///
    /// Essentially a relic: every record and query in practice uses the
    /// Internet class. The value does double duty in OPT pseudo records
    /// where the field carries the requestor's UDP payload size instead.
    =>
    Class, u16;

    /// The Internet.
    (IN => 1, "IN")

    /// The CHAOS network.
    (CH => 3, "CH")

    /// Hesiod.
    (HS => 4, "HS")

    /// Query class: no class.
    (NONE => 254, "NONE")

    /// Query class: any class.
    (ANY => 255, "ANY")
}
