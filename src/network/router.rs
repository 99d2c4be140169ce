//! Typed message queues, one per content type.
//!
//! The original source's `MessageHandler` reuses the shard-block queue
//! for control messages (`add_control_message` pushes onto
//! `self.shard_blocks`); spec §4.6 and §9 call this out as a bug to
//! fix, not to reproduce. Each content type gets its own
//! `tokio::sync::mpsc::unbounded_channel` here.

use tokio::sync::mpsc;

use crate::network::message::{ContentType, Envelope};

pub struct MessageRouter {
    shard_block_tx: mpsc::UnboundedSender<Envelope>,
    main_block_tx: mpsc::UnboundedSender<Envelope>,
    control_tx: mpsc::UnboundedSender<Envelope>,
    transaction_tx: mpsc::UnboundedSender<Envelope>,
}

/// Consumer-side handles, one per content type. Each is a blocking,
/// single-consumer dequeue (spec §4.6).
pub struct MessageQueues {
    pub shard_block: mpsc::UnboundedReceiver<Envelope>,
    pub main_block: mpsc::UnboundedReceiver<Envelope>,
    pub control: mpsc::UnboundedReceiver<Envelope>,
    pub transaction: mpsc::UnboundedReceiver<Envelope>,
}

impl MessageRouter {
    pub fn new() -> (Self, MessageQueues) {
        let (shard_block_tx, shard_block_rx) = mpsc::unbounded_channel();
        let (main_block_tx, main_block_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (transaction_tx, transaction_rx) = mpsc::unbounded_channel();

        (
            Self {
                shard_block_tx,
                main_block_tx,
                control_tx,
                transaction_tx,
            },
            MessageQueues {
                shard_block: shard_block_rx,
                main_block: main_block_rx,
                control: control_rx,
                transaction: transaction_rx,
            },
        )
    }

    /// Routes a decoded envelope into the queue matching its content
    /// type. A send failure means the consumer side has been dropped;
    /// it is logged and the message is dropped, matching the
    /// "message is logged and dropped, connection remains open"
    /// handling of `ProtocolError` in spec §7.
    pub fn dispatch(&self, envelope: Envelope) {
        let content_type = envelope.content_type;
        let result = match content_type {
            ContentType::ShardBlock => self.shard_block_tx.send(envelope),
            ContentType::MainBlock => self.main_block_tx.send(envelope),
            ContentType::Control => self.control_tx.send(envelope),
            ContentType::Transaction => self.transaction_tx.send(envelope),
        };
        if result.is_err() {
            log::warn!("dropped {:?} message: consumer queue closed", content_type);
        }
    }
}
