//! # Deferred Command Inbox
//!
//! Some handlers run outside the collecting phase: `destroy` runs while a
//! removal is being applied, `draw_begin`/`draw_end` run on the render
//! thread. Their batches cannot be applied on the spot, so they are posted
//! here and applied at the start of the next applying phase.
//!
//! ```text
//! render thread ──┐
//!                 ├──► CommandInbox ──► next tick, before room batches
//! dispatchers  ───┘
//! ```

use crossbeam_channel::{unbounded, Receiver, Sender};
use noodle_core::CommandBatch;

/// Cloneable handle for posting deferred batches.
#[derive(Clone, Debug)]
pub struct CommandSender {
    sender: Sender<CommandBatch>,
}

impl CommandSender {
    /// Posts a batch. Empty batches are dropped.
    pub fn send(&self, batch: CommandBatch) {
        if batch.is_empty() {
            return;
        }
        if self.sender.send(batch).is_err() {
            tracing::debug!("command inbox closed, batch dropped");
        }
    }
}

/// Receiving end owned by the update loop.
#[derive(Debug)]
pub struct CommandInbox {
    sender: Sender<CommandBatch>,
    receiver: Receiver<CommandBatch>,
}

impl CommandInbox {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Returns a handle for posting into this inbox.
    #[must_use]
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Takes everything posted so far, in posting order, as one batch.
    pub fn drain(&self) -> CommandBatch {
        let mut batch = CommandBatch::new();
        for posted in self.receiver.try_iter() {
            batch.append(posted);
        }
        batch
    }

    /// Returns the number of batches waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for CommandInbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodle_core::{Command, ElementId, QuitStatus};

    #[test]
    fn test_drain_keeps_posting_order() {
        let inbox = CommandInbox::new();
        let sender = inbox.sender();

        sender.send(CommandBatch::from(vec![Command::set_x(ElementId::new(1), 3)]));
        sender.send(CommandBatch::new());
        sender.clone().send(CommandBatch::from(vec![Command::quit(QuitStatus::Normal)]));
        assert_eq!(inbox.pending(), 2);

        let drained = inbox.drain();
        let tags: Vec<_> = drained.iter().map(Command::tag).collect();
        assert_eq!(tags, vec!["alter_entity", "quit"]);
        assert!(inbox.drain().is_empty());
    }
}
