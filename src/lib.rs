//! RPC session engine for the HDFS NameNode protocol: a single
//! multiplexed TCP connection, message-number correlation, and a
//! synchronous call/await surface on top of it.
//!
//! This crate implements the transport and demultiplexing machinery only
//! (`spec.md` §1): framing a request, tracking it against its response by
//! message number, and handing the caller back either a decoded response
//! or an error. Object encoding/decoding for any specific wire dialect is
//! supplied externally through the [`codec::Codec`] trait.
//!
//! Call sequence for a single RPC:
//!
//! ```ignore
//! let session = Session::new(codec, SessionOptions::default());
//! session.connect("namenode.example", 8020)?;
//! session.authenticate("alice")?;
//! let value = facade::get_protocol_version(&session, vec![])?;
//! ```
//!
//! Any number of threads may share one `Arc<Session>` and call façade
//! functions concurrently; whichever thread happens to be free drives the
//! receive pump for everyone currently waiting (`spec.md` §4.4).

pub mod buffer;
pub mod codec;
pub mod error;
pub mod facade;
pub mod pending;
pub mod session;
pub mod slot;
pub mod stub;
pub mod wire;

pub use codec::{Codec, ObjectKind, ProtocolException, Response, ResponseTag, ResponseValue, Value};
pub use error::{RpcError, SessionError};
pub use facade::{ObjectValue, PrimitiveValue};
pub use session::{Session, SessionOptions};
pub use slot::ResponseSlot;
pub use wire::{KerberosPreference, ProtocolDialect};
