//! Wire-level constants the engine itself is responsible for (`spec.md`
//! §6): the connection preamble is sent by the session, not the codec.

/// `"hrpc"` followed by version byte `0x04` and auth-kind byte `0x50`,
/// sent exactly once after TCP connect, before any framed message.
pub const CONNECTION_PREAMBLE: [u8; 6] = [0x68, 0x72, 0x70, 0x63, 0x04, 0x50];

/// The wire dialect chosen at session construction. `spec.md` §6: certain
/// methods are only valid against `V2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProtocolDialect {
    V1,
    V2,
}

/// Kerberos/SASL token acquisition is out of scope (`spec.md` §1); this is
/// only a hint threaded through to the fixed auth header the session sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum KerberosPreference {
    #[default]
    Disabled,
    Preferred,
    Required,
}
