use std::collections::VecDeque;

use crate::types::{Envelope, Result, TransportError};

/// What to do with a new envelope when the queue is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Refuse the new envelope and surface `QueueFull` to the caller
    #[default]
    RejectNewest,
    /// Evict the oldest queued envelope to make room
    DropOldest,
}

/// FIFO buffer of envelopes awaiting transmission.
///
/// Envelopes enter at the tail while the transport is disconnected (or when a
/// transmission fails) and leave from the head during a flush. An envelope is
/// only removed after a successful handoff to the wire.
#[derive(Debug)]
pub struct OutboundQueue {
    buf: VecDeque<Envelope>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl OutboundQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            buf: VecDeque::new(),
            capacity,
            policy,
        }
    }

    /// Appends an envelope at the tail, subject to the overflow policy.
    pub fn enqueue(&mut self, envelope: Envelope) -> Result<()> {
        if self.buf.len() >= self.capacity {
            match self.policy {
                OverflowPolicy::RejectNewest => {
                    return Err(TransportError::QueueFull {
                        capacity: self.capacity,
                    });
                }
                OverflowPolicy::DropOldest => {
                    self.buf.pop_front();
                    tracing::warn!("Outbound queue full, dropping oldest envelope");
                }
            }
        }
        self.buf.push_back(envelope);
        Ok(())
    }

    /// Returns an envelope to the head of the queue. Used when a flush is
    /// interrupted mid-drain; bypasses the capacity check so an interrupted
    /// flush can never lose envelopes.
    pub fn requeue_front(&mut self, envelope: Envelope) {
        self.buf.push_front(envelope);
    }

    pub fn pop_front(&mut self) -> Option<Envelope> {
        self.buf.pop_front()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current contents in queue order, for checkpointing
    pub fn snapshot(&self) -> Vec<Envelope> {
        self.buf.iter().cloned().collect()
    }

    /// Replaces the contents with a checkpointed snapshot, truncating to
    /// capacity (oldest envelopes win).
    pub fn restore(&mut self, mut envelopes: Vec<Envelope>) {
        envelopes.truncate(self.capacity);
        self.buf = envelopes.into();
    }
}
