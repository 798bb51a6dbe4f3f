//! Error taxonomy (`spec.md` §7), grounded on `domodwyer-onc-rpc`'s
//! `errors.rs` — the pack's example of a `thiserror` enum for a wire
//! protocol crate (seen before the retrieval pack was lost this session;
//! see `DESIGN.md`).

use std::io;

/// Caller-initiated configuration errors: bad call sequencing, or a
/// transport-level failure from `connect`/`authenticate`/`invoke` itself.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session already connected")]
    AlreadyConnected,

    #[error("session not connected")]
    NotConnected,

    #[error("session already authenticated")]
    AlreadyAuthenticated,

    #[error("session not authenticated")]
    NotAuthenticated,

    #[error("authenticate() already attempted on this session")]
    AuthenticationAlreadyAttempted,

    #[error("session is dead")]
    Dead,

    #[error("response slot already bound to a session")]
    AlreadyBound,

    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("write failed: {0}")]
    Send(#[source] io::Error),
}

/// Everything a façade call can fail with: a local precondition violation, a
/// server-reported protocol exception, or the session having died while
/// this call was outstanding.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("protocol exception: {0}")]
    Protocol(#[from] crate::codec::ProtocolException),

    #[error("session died while this call was outstanding")]
    SessionDied,

    #[error("server returned an unexpected response tag for this call")]
    UnexpectedTag,

    #[error("{0} requires the v2 wire dialect")]
    UnsupportedDialect(&'static str),
}
