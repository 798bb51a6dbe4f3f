//! The response slot / future (`spec.md` §3 "Response slot", §4.3 "Await").
//!
//! Split in two, matching which thread is allowed to touch which half:
//!
//! - [`SlotShared`] is the monitor (mutex + condvar) the pending table holds
//!   an `Arc` to. The owning thread and the receive pump both touch it, so
//!   every field lives behind its mutex.
//! - [`ResponseSlot`] is private to the thread that called `invoke`: the
//!   session back-reference and the bound flag. Nothing but that thread ever
//!   reads or writes it, so it needs no synchronization of its own.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::codec::Response;
use crate::error::RpcError;
use crate::session::Session;

/// What ends up in a completed slot: a real demultiplexed response, or the
/// synthetic sentinel broadcast to every outstanding slot when the session
/// dies mid-call (`spec.md` §7.3's "MAY instead complete all outstanding
/// slots" alternative, chosen in `SPEC_FULL.md` §4).
///
/// `pub(crate)` rather than private: the receive pump (`Session::pump`)
/// deposits directly into an already-held `MutexGuard` on the goal path
/// (`spec.md` §4.4) without re-locking, which requires naming this type.
pub(crate) enum SlotOutcome {
    Response(Response),
    SessionDied,
}

/// The shared monitor half, reachable from the pending table.
pub struct SlotShared {
    pub(crate) result: Mutex<Option<SlotOutcome>>,
    cond: Condvar,
}

impl SlotShared {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { result: Mutex::new(None), cond: Condvar::new() })
    }

    /// Non-goal delivery path (`spec.md` §4.4): lock, store, broadcast,
    /// unlock. Completes the slot at most once; a second call is a bug in
    /// the pump, not a condition this type needs to guard against itself.
    pub fn complete(&self, response: Response) {
        let mut guard = self.result.lock().unwrap();
        *guard = Some(SlotOutcome::Response(response));
        self.cond.notify_all();
    }

    pub fn complete_session_died(&self) {
        let mut guard = self.result.lock().unwrap();
        *guard = Some(SlotOutcome::SessionDied);
        self.cond.notify_all();
    }

    /// Wakes exactly one replacement receiver at pump-exit handoff
    /// (`spec.md` §4.4 "Exit"). No new result — just a nudge to retry
    /// becoming the receiver.
    pub fn nudge(&self) {
        self.cond.notify_all();
    }
}

/// The private half: what `invoke` binds and `await` consumes.
pub struct ResponseSlot {
    shared: Arc<SlotShared>,
    session: Option<Arc<Session>>,
}

impl ResponseSlot {
    pub fn new() -> Self {
        Self { shared: SlotShared::new(), session: None }
    }

    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn shared(&self) -> &Arc<SlotShared> {
        &self.shared
    }

    /// Binds this slot to the session that will complete it. Called once,
    /// from `Session::invoke`, under the state lock.
    pub(crate) fn bind(&mut self, session: Arc<Session>) {
        debug_assert!(self.session.is_none(), "response slot bound twice");
        self.session = Some(session);
    }

    /// Blocks until this slot is completed, driving the receive pump
    /// ourselves if no other thread currently owns it (`spec.md` §4.3).
    pub fn await_response(self) -> Result<Response, RpcError> {
        let session = self.session.expect("await on an unbound response slot");
        let shared = self.shared;
        let mut guard = shared.result.lock().unwrap();
        loop {
            if let Some(outcome) = guard.take() {
                return match outcome {
                    SlotOutcome::Response(r) => Ok(r),
                    SlotOutcome::SessionDied => Err(RpcError::SessionDied),
                };
            }
            if session.try_become_receiver() {
                // We now drive the pump with our own slot as the goal. On
                // the goal path the pump deposits directly through
                // `guard` without a second lock (safe: we're the only
                // thread that could be racing it, and we're blocked here).
                session.pump(&shared, &mut guard);
                // Either we were the goal and `guard` now holds our
                // result, or the pump exited for another reason (EOF,
                // fatal) having already broadcast to every slot including
                // ours. Either way loop back to the take() above.
                continue;
            }
            guard = shared.cond.wait(guard).unwrap();
        }
    }
}

impl Default for ResponseSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ResponseTag, ResponseValue};

    #[test]
    fn complete_then_take_round_trips() {
        let shared = SlotShared::new();
        shared.complete(Response { tag: ResponseTag::Void, value: ResponseValue::Void });
        let mut guard = shared.result.lock().unwrap();
        assert!(matches!(guard.take(), Some(SlotOutcome::Response(_))));
    }

    #[test]
    fn complete_session_died_is_distinguishable() {
        let shared = SlotShared::new();
        shared.complete_session_died();
        let mut guard = shared.result.lock().unwrap();
        assert!(matches!(guard.take(), Some(SlotOutcome::SessionDied)));
    }
}
