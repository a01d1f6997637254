//! Outbound subscription command sinks.
//!
//! The registry hands every emitted [`SubCommand`] to a [`SubscriptionSink`].
//! Sinks never block: [`ChannelSink`] drops commands it cannot queue and logs
//! the loss.

use crate::subscription::SubCommand;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Destination of subscription deltas.
pub trait SubscriptionSink: Send + Sync {
    /// Forwards `commands` upstream. Must not block.
    fn send(&self, commands: Vec<SubCommand>);
}

impl<T: SubscriptionSink + ?Sized> SubscriptionSink for Arc<T> {
    fn send(&self, commands: Vec<SubCommand>) {
        (**self).send(commands);
    }
}

/// Sink that discards every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SubscriptionSink for NullSink {
    fn send(&self, _commands: Vec<SubCommand>) {}
}

/// Creates a bounded command channel.
///
/// # Arguments
/// * `capacity` - Maximum number of queued commands
#[must_use]
pub fn command_channel(capacity: usize) -> (ChannelSink, CommandReceiver) {
    let (sender, receiver) = bounded(capacity);
    (
        ChannelSink { inner: sender },
        CommandReceiver { inner: receiver },
    )
}

/// Sink half of a command channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    inner: Sender<SubCommand>,
}

impl SubscriptionSink for ChannelSink {
    fn send(&self, commands: Vec<SubCommand>) {
        for command in commands {
            match self.inner.try_send(command) {
                Ok(()) => {}
                Err(TrySendError::Full(command)) => {
                    warn!("command channel full, dropping {}", command);
                }
                Err(TrySendError::Disconnected(command)) => {
                    warn!("command channel disconnected, dropping {}", command);
                }
            }
        }
    }
}

/// Receiver half of a command channel.
#[derive(Debug)]
pub struct CommandReceiver {
    inner: Receiver<SubCommand>,
}

impl CommandReceiver {
    /// Non-blocking receive.
    #[inline]
    pub fn try_recv(&self) -> Option<SubCommand> {
        self.inner.try_recv().ok()
    }

    /// Receive with timeout.
    ///
    /// # Returns
    /// `Some(command)` if received within timeout, `None` otherwise.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SubCommand> {
        self.inner.recv_timeout(timeout).ok()
    }

    /// Drains all queued commands.
    pub fn drain(&self) -> impl Iterator<Item = SubCommand> + '_ {
        std::iter::from_fn(|| self.inner.try_recv().ok())
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no command is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{CategorySet, Interest};

    fn command(symbol: &str) -> SubCommand {
        SubCommand::subscribe(Interest::instrument(symbol), CategorySet::ALL)
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (sink, rx) = command_channel(8);
        sink.send(vec![command("ESZ3"), command("NQZ3")]);

        assert_eq!(rx.len(), 2);
        assert_eq!(rx.try_recv(), Some(command("ESZ3")));
        assert_eq!(
            rx.recv_timeout(Duration::from_millis(10)),
            Some(command("NQZ3"))
        );
        assert!(rx.is_empty());
        assert_eq!(rx.recv_timeout(Duration::from_millis(1)), None);
    }

    #[test]
    fn test_full_channel_drops() {
        let (sink, rx) = command_channel(1);
        sink.send(vec![command("ESZ3"), command("NQZ3")]);
        assert_eq!(rx.drain().collect::<Vec<_>>(), vec![command("ESZ3")]);
    }

    #[test]
    fn test_disconnected_channel_does_not_panic() {
        let (sink, rx) = command_channel(1);
        drop(rx);
        sink.send(vec![command("ESZ3")]);
        NullSink.send(vec![command("ESZ3")]);
    }
}
