use anyhow::{Result, anyhow};
use gitbattle_battle::Action;
use tokio::sync::mpsc;

/// Local player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Confirm readiness in a room lobby
    Ready,
    Act(Action),
    /// Start a fresh PvE battle
    Reset,
    Leave,
}

/// Cloneable handle for feeding player input into a running game.
///
/// Sending fails once the game has ended.
#[derive(Debug, Clone)]
pub struct GameHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl GameHandle {
    pub fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Handle plus the receiver a runner consumes
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| anyhow!("Game session closed"))
    }

    pub fn ready(&self) -> Result<()> {
        self.send(Command::Ready)
    }

    pub fn act(&self, action: Action) -> Result<()> {
        self.send(Command::Act(action))
    }

    pub fn attack(&self) -> Result<()> {
        self.act(Action::Attack)
    }

    pub fn heal(&self) -> Result<()> {
        self.act(Action::Heal)
    }

    pub fn special(&self) -> Result<()> {
        self.act(Action::Special)
    }

    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    pub fn leave(&self) -> Result<()> {
        self.send(Command::Leave)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_in_order() {
        let (handle, mut rx) = GameHandle::channel();
        handle.ready().unwrap();
        handle.special().unwrap();
        handle.leave().unwrap();

        assert_eq!(rx.try_recv().unwrap(), Command::Ready);
        assert_eq!(rx.try_recv().unwrap(), Command::Act(Action::Special));
        assert_eq!(rx.try_recv().unwrap(), Command::Leave);
    }

    #[test]
    fn test_closed_session() {
        let (handle, rx) = GameHandle::channel();
        drop(rx);

        assert!(handle.is_closed());
        assert!(handle.attack().is_err());
    }
}
