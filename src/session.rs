//! The session (`spec.md` §3 "Session", §4.1–§4.4): the component the rest
//! of this crate exists to support. Owns the socket, the state lock, the
//! send lock, the receive buffer, the pending table and the sequence
//! counter; exposes `connect`, `authenticate`, `invoke` and `destroy`, with
//! `await` living on [`crate::slot::ResponseSlot`] since it belongs to the
//! caller, not the session.
//!
//! Grounded on `semi-hsms-rs`/`semi_e37`'s `PrimitiveClient`/`HsmsClient`
//! split (`Arc<Self>` client, `RwLock`/`Mutex`-guarded connection state,
//! `rx`/`tx` framing functions) — see `DESIGN.md`. The receive-pump handoff
//! itself (§4.4) has no teacher analogue (the teacher runs a dedicated rx
//! thread instead of letting callers drive receives); it is original to
//! this crate, built directly from `spec.md` §4.3–§4.4.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, trace, warn};

use crate::buffer::RecvBuffer;
use crate::codec::{Codec, DeserializeOutcome, Response, Value};
use crate::error::SessionError;
use crate::pending::PendingTable;
use crate::slot::{ResponseSlot, SlotOutcome, SlotShared};
use crate::wire::{KerberosPreference, ProtocolDialect, CONNECTION_PREAMBLE};

/// Construction-time options. No file, environment, or CLI surface reads
/// these (`spec.md` §6 Non-goals) — they're supplied directly by the
/// embedding application, mirroring the teacher's `ParameterSettings`.
#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    pub dialect: ProtocolDialect,
    pub kerberos_preference: KerberosPreference,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { dialect: ProtocolDialect::V1, kerberos_preference: KerberosPreference::default() }
    }
}

struct SessionState {
    read_socket: Option<TcpStream>,
    authenticated: bool,
    auth_attempted: bool,
    dead: bool,
    receiver_owned: bool,
    next_msgno: i64,
    pending: PendingTable,
    on_destroy: Option<Box<dyn FnOnce() + Send>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            read_socket: None,
            authenticated: false,
            auth_attempted: false,
            dead: false,
            receiver_owned: false,
            next_msgno: 0,
            pending: PendingTable::new(),
            on_destroy: None,
        }
    }
}

pub struct Session {
    state: Mutex<SessionState>,
    send_socket: Mutex<Option<TcpStream>>,
    recv: Mutex<RecvBuffer>,
    codec: Arc<dyn Codec>,
    options: SessionOptions,
}

impl Session {
    /// `allocate + init` (`spec.md` §4.1): refs=1 (the returned `Arc`), no
    /// socket, not dead, not authenticated, counter 0, empty pending table,
    /// empty receive buffer.
    pub fn new(codec: Arc<dyn Codec>, options: SessionOptions) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SessionState::new()),
            send_socket: Mutex::new(None),
            recv: Mutex::new(RecvBuffer::new()),
            codec,
            options,
        })
    }

    pub fn dialect(&self) -> ProtocolDialect {
        self.options.dialect
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().unwrap().authenticated
    }

    pub fn is_dead(&self) -> bool {
        self.state.lock().unwrap().dead
    }

    /// `connect(host, port)` (`spec.md` §4.1). Fails if already connected;
    /// does not touch `dead`/`authenticated` either way.
    pub fn connect(self: &Arc<Self>, host: &str, port: u16) -> Result<(), SessionError> {
        {
            let state = self.state.lock().unwrap();
            if state.read_socket.is_some() {
                return Err(SessionError::AlreadyConnected);
            }
        }
        let addr = (host, port);
        let stream = TcpStream::connect(addr).map_err(SessionError::Connect)?;
        let write_half = stream.try_clone().map_err(SessionError::Connect)?;
        {
            let mut state = self.state.lock().unwrap();
            state.read_socket = Some(stream);
        }
        *self.send_socket.lock().unwrap() = Some(write_half);
        debug!(host, port, "connected to namenode");
        Ok(())
    }

    /// `authenticate(username)` (`spec.md` §4.1). Preconditions: socket
    /// present, not already authenticated. Writes the connection preamble
    /// and the codec's auth header under the send lock.
    ///
    /// This implementation resolves the §9 open question on ordering by
    /// taking the "equivalent" option the spec permits: at most one
    /// `authenticate()` attempt is ever allowed on a session (tracked
    /// independently of success), and `authenticated` is set only on a
    /// successful write — see `SPEC_FULL.md` §4.
    pub fn authenticate(self: &Arc<Self>, username: &str) -> Result<(), SessionError> {
        {
            let mut state = self.state.lock().unwrap();
            if state.read_socket.is_none() {
                return Err(SessionError::NotConnected);
            }
            if state.auth_attempted {
                return Err(SessionError::AuthenticationAlreadyAttempted);
            }
            state.auth_attempted = true;
        }

        let mut header = CONNECTION_PREAMBLE.to_vec();
        header.extend(self.codec.build_auth_header(username));

        let result = {
            let mut send_guard = self.send_socket.lock().unwrap();
            let socket = send_guard.as_mut().ok_or(SessionError::NotConnected)?;
            socket.write_all(&header).map_err(SessionError::Send)
        };

        if result.is_ok() {
            self.state.lock().unwrap().authenticated = true;
            debug!(username, "authenticated");
        } else {
            warn!(username, "authentication write failed");
        }
        result
    }

    /// `destroy(on-free callback)` (`spec.md` §4.1). Marks the session
    /// dead, rejects further invokes, and releases the caller's own
    /// reference by consuming `self`. The callback — along with socket
    /// teardown — runs from `Drop` once the very last `Arc<Session>`
    /// (caller's or any still-bound response slot's) goes away.
    pub fn destroy(self: Arc<Self>, on_destroy: impl FnOnce() + Send + 'static) {
        let mut state = self.state.lock().unwrap();
        state.dead = true;
        state.on_destroy = Some(Box::new(on_destroy));
        drop(state);
        debug!("session marked dead by destroy()");
        // `self` drops here.
    }

    /// `invoke` (`spec.md` §4.2).
    pub fn invoke(
        self: &Arc<Self>,
        name: &'static str,
        args: Vec<Value>,
        slot: &mut ResponseSlot,
    ) -> Result<(), SessionError> {
        if slot.is_bound() {
            return Err(SessionError::AlreadyBound);
        }

        let msgno = {
            let mut state = self.state.lock().unwrap();
            if state.dead {
                return Err(SessionError::Dead);
            }
            if state.read_socket.is_none() {
                return Err(SessionError::NotConnected);
            }
            if !state.authenticated {
                return Err(SessionError::NotAuthenticated);
            }
            let msgno = state.next_msgno;
            state.next_msgno += 1;
            slot.bind(self.clone());
            state.pending.insert(msgno, slot.shared().clone());
            msgno
        };

        let mut invocation = self.codec.build_invocation(name, args);
        self.codec.set_msgno(&mut invocation, msgno);
        let frame = self.codec.serialize(&invocation);

        trace!(name, msgno, bytes = frame.len(), "invoking");
        let mut send_guard = self.send_socket.lock().unwrap();
        let socket = send_guard.as_mut().ok_or(SessionError::NotConnected)?;
        socket.write_all(&frame).map_err(SessionError::Send)?;
        Ok(())
    }

    /// Entry to the receive pump (`spec.md` §4.4 "Entry"): at most one
    /// thread may hold the receiver role at a time.
    pub(crate) fn try_become_receiver(self: &Arc<Self>) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.receiver_owned {
            return false;
        }
        state.receiver_owned = true;
        true
    }

    /// The receive pump main loop (`spec.md` §4.4). Runs until either
    /// `goal` is completed (in which case the result is deposited directly
    /// into `goal_guard`, already held by the calling thread) or there is
    /// nothing left to do (EOF, a fatal protocol error, or no more
    /// outstanding callers).
    pub(crate) fn pump(
        self: &Arc<Self>,
        goal: &Arc<SlotShared>,
        goal_guard: &mut MutexGuard<'_, Option<SlotOutcome>>,
    ) {
        loop {
            let socket = {
                let state = self.state.lock().unwrap();
                if state.dead || Arc::strong_count(self) <= 1 {
                    break;
                }
                match state.read_socket.as_ref().map(TcpStream::try_clone) {
                    Some(Ok(s)) => s,
                    Some(Err(e)) => {
                        drop(state);
                        error!(error = %e, "failed to clone socket for receive pump");
                        self.fail(&format!("socket clone failed: {e}"));
                        break;
                    }
                    None => break,
                }
            };

            let outcome = {
                let recv = self.recv.lock().unwrap();
                self.codec.deserialize(recv.filled())
            };

            match outcome {
                DeserializeOutcome::Incomplete => {
                    let mut recv = self.recv.lock().unwrap();
                    let tail = recv.reserve_tail();
                    let mut socket = socket;
                    match socket.read(tail) {
                        Ok(0) => {
                            drop(recv);
                            debug!("peer closed connection");
                            self.fail("connection closed by peer");
                            break;
                        }
                        Ok(n) => {
                            recv.advance(n);
                            continue;
                        }
                        Err(e) => {
                            drop(recv);
                            error!(error = %e, "receive failed");
                            self.fail(&format!("read error: {e}"));
                            break;
                        }
                    }
                }
                DeserializeOutcome::Invalid => {
                    error!("invalid frame on the wire");
                    self.fail("invalid protocol frame");
                    break;
                }
                DeserializeOutcome::Parsed { msgno, response, frame_size } => {
                    self.recv.lock().unwrap().consume(frame_size);
                    let slot = {
                        let mut state = self.state.lock().unwrap();
                        state.pending.remove(msgno)
                    };
                    let Some(slot) = slot else {
                        error!(msgno, "response for unknown message number");
                        self.fail(&format!("response for unknown msgno {msgno}"));
                        break;
                    };
                    if Arc::ptr_eq(&slot, goal) {
                        **goal_guard = Some(SlotOutcome::Response(response));
                        self.finish_pump_ownership();
                        return;
                    } else {
                        trace!(msgno, "delivering response to a non-goal waiter");
                        slot.complete(response);
                        continue;
                    }
                }
            }
        }
        self.finish_pump_ownership();
    }

    /// Pump exit (`spec.md` §4.4 "Exit"): clear the receiver-owned flag and
    /// wake exactly one other pending waiter, if any, so it takes over
    /// driving the pump.
    fn finish_pump_ownership(self: &Arc<Self>) {
        let handoff = {
            let mut state = self.state.lock().unwrap();
            state.receiver_owned = false;
            state.pending.any()
        };
        if let Some(slot) = handoff {
            slot.nudge();
        }
    }

    /// A transport fatality (`spec.md` §7.3): mark the session dead, close
    /// both socket halves, and broadcast the session-died sentinel to
    /// every slot still outstanding — the production-use alternative to
    /// the source's abort, per `SPEC_FULL.md` §4.
    fn fail(self: &Arc<Self>, reason: &str) {
        let drained = {
            let mut state = self.state.lock().unwrap();
            if state.dead {
                return;
            }
            state.dead = true;
            if let Some(sock) = state.read_socket.take() {
                let _ = sock.shutdown(Shutdown::Both);
            }
            state.pending.drain()
        };
        *self.send_socket.lock().unwrap() = None;
        warn!(reason, waiters = drained.len(), "session died");
        for slot in drained {
            slot.complete_session_died();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let (socket, callback) = {
            let mut state = self.state.lock().unwrap();
            (state.read_socket.take(), state.on_destroy.take())
        };
        if let Some(sock) = socket {
            let _ = sock.shutdown(Shutdown::Both);
        }
        *self.send_socket.lock().unwrap() = None;
        if let Some(cb) = callback {
            cb();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Invocation, ResponseTag, ResponseValue};
    use std::io::Cursor;

    struct EchoCodec;

    impl Codec for EchoCodec {
        fn serialize(&self, invocation: &Invocation) -> Vec<u8> {
            let mut out = invocation.msgno.to_be_bytes().to_vec();
            out.extend_from_slice(invocation.name.as_bytes());
            out
        }

        fn deserialize(&self, bytes: &[u8]) -> DeserializeOutcome {
            if bytes.len() < 8 {
                return DeserializeOutcome::Incomplete;
            }
            let msgno = i64::from_be_bytes(bytes[0..8].try_into().unwrap());
            DeserializeOutcome::Parsed {
                msgno,
                response: Response { tag: ResponseTag::Void, value: ResponseValue::Void },
                frame_size: 8,
            }
        }

        fn build_auth_header(&self, username: &str) -> Vec<u8> {
            username.as_bytes().to_vec()
        }
    }

    #[test]
    fn new_session_starts_not_connected_not_authenticated() {
        let session = Session::new(Arc::new(EchoCodec), SessionOptions::default());
        assert!(!session.is_authenticated());
        assert!(!session.is_dead());
    }

    #[test]
    fn invoke_before_connect_fails() {
        let session = Session::new(Arc::new(EchoCodec), SessionOptions::default());
        let mut slot = ResponseSlot::new();
        let err = session.invoke("getProtocolVersion", vec![], &mut slot).unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
    }

    #[test]
    fn authenticate_before_connect_fails() {
        let session = Session::new(Arc::new(EchoCodec), SessionOptions::default());
        let err = session.authenticate("alice").unwrap_err();
        assert!(matches!(err, SessionError::NotConnected));
    }

    // Exercises the state machine and error taxonomy without a real socket.
    #[test]
    fn destroy_marks_dead_and_runs_callback_on_last_drop() {
        let session = Session::new(Arc::new(EchoCodec), SessionOptions::default());
        let ran = Arc::new(Mutex::new(false));
        let ran2 = ran.clone();
        let other_ref = session.clone();
        session.destroy(move || {
            *ran2.lock().unwrap() = true;
        });
        assert!(other_ref.is_dead());
        assert!(!*ran.lock().unwrap(), "callback must not run while other refs remain");
        drop(other_ref);
        assert!(*ran.lock().unwrap(), "callback must run once the last ref drops");
    }

    #[test]
    fn cursor_smoke_test_for_codec_framing() {
        let codec = EchoCodec;
        let inv = Invocation { name: "x", args: vec![], msgno: 7 };
        let bytes = codec.serialize(&inv);
        let mut cur = Cursor::new(&bytes);
        let mut buf = [0u8; 8];
        std::io::Read::read_exact(&mut cur, &mut buf).unwrap();
        assert_eq!(i64::from_be_bytes(buf), 7);
    }
}
