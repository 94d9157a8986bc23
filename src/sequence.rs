use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Ticket handed to one dispatched call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Orders the calls that write one slice of state.
///
/// Each dispatch takes a fresh ticket; when the call settles its result is
/// applied only if no newer ticket has been issued (or the slice invalidated)
/// in the meantime. The later-dispatched call wins, regardless of which
/// response arrives last.
#[derive(Debug, Default)]
pub struct Sequencer {
    latest: AtomicU64,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Make every ticket issued so far stale.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// What became of a sequenced call's result.
///
/// A superseded call has no effect on state, whether it succeeded or failed,
/// so callers must not act on its outcome either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T> {
    Applied(T),
    Superseded,
}

impl<T> Settled<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// Number of calls of one state machine still waiting on the server.
///
/// Drives the `loading` flag: it stays set until the last outstanding call
/// settles, not merely the first.
#[derive(Debug, Default)]
pub struct InFlight(AtomicUsize);

impl InFlight {
    pub fn start(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark one call settled. Returns whether others are still outstanding.
    pub fn finish(&self) -> bool {
        let previous = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        previous > 1
    }

    pub fn any(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}
