//! The codec collaborator interface (`spec.md` §6).
//!
//! Per-object wire (de)serialization is explicitly out of scope for the
//! engine; this module only fixes the shape the engine talks to. A real
//! deployment supplies a `Codec` that understands the NameNode's Hadoop RPC
//! object tree. `crate::stub` provides a minimal implementation used by this
//! crate's own tests.

use std::fmt;

/// An opaque argument handed to `Codec::build_invocation`. The engine never
/// inspects these; only the codec and the eventual server do.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    I64(i64),
    U64(u64),
    Str(String),
    Bytes(Vec<u8>),
    StrList(Vec<String>),
}

/// An invocation object, mutated in place by `set_msgno` and then handed to
/// `serialize`. Carries enough for the codec to build a request frame; the
/// engine only ever reads `name` and writes `msgno`.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub name: &'static str,
    pub args: Vec<Value>,
    pub msgno: i64,
}

impl Invocation {
    pub fn new(name: &'static str, args: Vec<Value>) -> Self {
        Self { name, args, msgno: -1 }
    }
}

/// One variant per *object return* RPC in `spec.md` §6's method table. Used
/// only to assert tag agreement at demux time — the engine never looks past
/// the tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    BlockLocations,
    LocatedBlock,
    DirectoryListing,
    FileStatus,
    ContentSummary,
    DelegationToken,
    DatanodeReport,
    UpgradeProgress,
    ServerDefaults,
    FileLinkInfo,
    LinkTarget,
    Stats,
}

/// A server-reported protocol exception (`spec.md` §3, "protocol-exception
/// tag"). The engine treats the class name and message as opaque text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{class}: {message}")]
pub struct ProtocolException {
    pub class: String,
    pub message: String,
}

/// The tag the engine inspects. Every RPC kind expects one specific tag (or
/// the typed-null/protocol-exception escapes); any other tag arriving for
/// that msgno is a hard protocol violation (`spec.md` §4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseTag {
    Void,
    Bool,
    I64,
    Object(ObjectKind),
    NullTyped(ObjectKind),
    ProtocolException,
}

/// The decoded payload accompanying a `ResponseTag`.
#[derive(Clone, Debug)]
pub enum ResponseValue {
    Void,
    Bool(bool),
    I64(i64),
    /// Opaque codec-decoded bytes for an object-return RPC; the façade
    /// passes these through to the caller without interpreting them.
    Object(Vec<u8>),
    Null,
    Exception(ProtocolException),
}

/// One complete, demultiplexed response.
#[derive(Clone, Debug)]
pub struct Response {
    pub tag: ResponseTag,
    pub value: ResponseValue,
}

/// What `Codec::deserialize` reports about the front of the receive buffer.
pub enum DeserializeOutcome {
    /// Not enough bytes yet for a complete frame.
    Incomplete,
    /// The prefix cannot be a valid frame under this protocol.
    Invalid,
    /// A complete frame was parsed; `frame_size` bytes of the input were
    /// consumed by it.
    Parsed { msgno: i64, response: Response, frame_size: usize },
}

impl fmt::Debug for DeserializeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeserializeOutcome::Incomplete => write!(f, "Incomplete"),
            DeserializeOutcome::Invalid => write!(f, "Invalid"),
            DeserializeOutcome::Parsed { msgno, frame_size, .. } => {
                write!(f, "Parsed {{ msgno: {msgno}, frame_size: {frame_size} }}")
            }
        }
    }
}

/// The four (and a half) operations the engine calls into the codec.
/// `free` has no Rust counterpart: dropping the last owner of a `Response`
/// releases it, per `spec.md` §9's note that this is what an
/// ownership-checked language substitutes for a manual free.
pub trait Codec: Send + Sync {
    fn build_invocation(&self, name: &'static str, args: Vec<Value>) -> Invocation {
        Invocation::new(name, args)
    }

    fn set_msgno(&self, invocation: &mut Invocation, msgno: i64) {
        invocation.msgno = msgno;
    }

    fn serialize(&self, invocation: &Invocation) -> Vec<u8>;

    fn deserialize(&self, bytes: &[u8]) -> DeserializeOutcome;

    /// Serializes the fixed authentication-header object sent immediately
    /// after the connection preamble.
    fn build_auth_header(&self, username: &str) -> Vec<u8>;
}
