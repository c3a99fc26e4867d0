//! Batching policy: groups temporally adjacent pushes into one edit unit.
//!
//! A drag gesture emits a push per pointer-move frame. Pushes that arrive
//! within the threshold of the previous push join the open batch, so the
//! whole gesture carries one `BatchId`.

use crate::id::BatchId;

/// Ephemeral batching state. Not part of exported history.
#[derive(Debug, Clone)]
pub struct Batcher {
    threshold_ms: u64,
    current: Option<BatchId>,
    last_action_ms: Option<u64>,
    /// Raw value of the most recently opened batch.
    last_opened: Option<u64>,
}

impl Batcher {
    pub fn new(threshold_ms: u32) -> Self {
        Self {
            threshold_ms: u64::from(threshold_ms),
            current: None,
            last_action_ms: None,
            last_opened: None,
        }
    }

    pub fn set_threshold(&mut self, threshold_ms: u32) {
        self.threshold_ms = u64::from(threshold_ms);
    }

    /// Batch id for a push at `now`, opening a new batch when none is open or
    /// the gap since the last push exceeds the threshold. Always records
    /// `now` as the last action time.
    pub fn assign(&mut self, now: u64) -> BatchId {
        let batch = match (self.current, self.last_action_ms) {
            (Some(open), Some(last)) if now.saturating_sub(last) <= self.threshold_ms => open,
            _ => self.open(now),
        };
        self.last_action_ms = Some(now);
        batch
    }

    /// Close the open batch; the next push starts a fresh one.
    pub fn close(&mut self) {
        if let Some(batch) = self.current.take() {
            log::trace!("closed {batch}");
        }
    }

    pub fn current(&self) -> Option<BatchId> {
        self.current
    }

    pub fn last_action_ms(&self) -> Option<u64> {
        self.last_action_ms
    }

    fn open(&mut self, now: u64) -> BatchId {
        // Two batches opened in the same millisecond must still differ.
        let raw = match self.last_opened {
            Some(prev) if prev >= now => prev + 1,
            _ => now,
        };
        self.last_opened = Some(raw);
        let batch = BatchId(raw);
        self.current = Some(batch);
        log::trace!("opened {batch}");
        batch
    }
}
