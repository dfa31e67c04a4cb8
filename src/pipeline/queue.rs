//! Ordered hand-off between the sample producer and the row exporter.
//!
//! A single-producer, single-consumer FIFO over an unbounded crossbeam
//! channel. Rows come out in exactly the order they went in; nothing is
//! dropped or duplicated.
//!
//! Dropping the [`RowSender`] closes the queue. The receiver still drains
//! every row already pushed, then [`RowReceiver::pop`] returns `None`, so an
//! exporter waiting for rows that will never be produced does not block
//! forever.

use crate::error::{ExporterError, Result};
use crate::types::SampleRow;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Create a connected sender/receiver pair
pub fn handoff_queue() -> (RowSender, RowReceiver) {
    let (tx, rx) = unbounded();
    (RowSender { tx, pushed: 0 }, RowReceiver { rx, popped: 0 })
}

/// Producer side of the hand-off queue; not cloneable (single writer)
#[derive(Debug)]
pub struct RowSender {
    tx: Sender<SampleRow>,
    pushed: u64,
}

impl RowSender {
    /// Append a row to the tail of the queue; never blocks
    ///
    /// Fails only if the receiver is gone, i.e. the exporter stopped.
    pub fn push(&mut self, row: SampleRow) -> Result<()> {
        self.tx
            .send(row)
            .map_err(|_| ExporterError::Channel("row exporter is no longer receiving".to_string()))?;
        self.pushed += 1;
        Ok(())
    }

    /// Number of rows pushed so far
    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Close the queue explicitly (same as dropping the sender)
    pub fn close(self) {
        tracing::trace!("Hand-off queue closed after {} rows", self.pushed);
    }
}

/// Consumer side of the hand-off queue; not cloneable (single reader)
#[derive(Debug)]
pub struct RowReceiver {
    rx: Receiver<SampleRow>,
    popped: u64,
}

impl RowReceiver {
    /// Wait for the next row and remove it from the head of the queue
    ///
    /// Returns `None` once the sender is gone and every queued row has been
    /// taken.
    pub fn pop(&mut self) -> Option<SampleRow> {
        let row = self.rx.recv().ok()?;
        self.popped += 1;
        Some(row)
    }

    /// Take the next row if one is already queued
    pub fn try_pop(&mut self) -> Option<SampleRow> {
        let row = self.rx.try_recv().ok()?;
        self.popped += 1;
        Some(row)
    }

    /// Number of rows waiting in the queue
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Number of rows popped so far
    pub fn popped(&self) -> u64 {
        self.popped
    }
}
