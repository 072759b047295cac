//! Cancellable display delays
//!
//! Each [`TimerKind`] has at most one pending timer. Scheduling a kind again
//! supersedes the previous one, and every firing carries the token it was
//! scheduled with so a firing that raced a cancel can be recognised and
//! dropped.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Scripted opponent "thinking" pause
    AiTurn,
    /// Pause after both players are ready
    BattleStart,
    /// One tick of the disconnect countdown
    Countdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub token: u64,
}

/// Pending timers of one session
pub struct Timers {
    tx: mpsc::UnboundedSender<TimerFired>,
    pending: HashMap<TimerKind, (u64, JoinHandle<()>)>,
    next_token: u64,
}

impl Timers {
    /// Create the timer set and the receiver its firings arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let timers = Self {
            tx,
            pending: HashMap::new(),
            next_token: 0,
        };
        (timers, rx)
    }

    /// Schedule `kind` to fire after `delay`, replacing any pending one
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) -> u64 {
        self.cancel(kind);

        self.next_token += 1;
        let token = self.next_token;
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(TimerFired { kind, token });
        });

        self.pending.insert(kind, (token, task));
        token
    }

    /// Returns whether a timer was pending
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.pending.remove(&kind) {
            Some((_, task)) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, (_, task)) in self.pending.drain() {
            task.abort();
        }
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// Claim a firing. Stale firings (cancelled or superseded) return false.
    pub fn accept(&mut self, fired: TimerFired) -> bool {
        match self.pending.get(&fired.kind) {
            Some((token, _)) if *token == fired.token => {
                self.pending.remove(&fired.kind);
                true
            }
            _ => false,
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
