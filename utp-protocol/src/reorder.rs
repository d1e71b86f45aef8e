//! Inbound Packet Reordering
//!
//! DATA packets may arrive in any order; the application must see their
//! bytes in sequence order exactly once. Packets are buffered by sequence
//! number and a cursor tracks the next number expected contiguously: each
//! insertion releases the contiguous run starting at the cursor, and
//! out-of-order packets wait until the gap before them closes.

use crate::sequence::SeqNumber;
use bytes::Bytes;
use std::collections::HashMap;

/// Out-of-order buffer for inbound DATA payloads
pub struct InboundReorderer {
    /// Payloads waiting for the gap before them to close
    pending: HashMap<u16, Bytes>,
    /// Next sequence number expected contiguously
    cursor: SeqNumber,
}

impl InboundReorderer {
    /// Create a reorderer expecting `next_expected` as its first sequence
    /// number.
    pub fn new(next_expected: SeqNumber) -> Self {
        InboundReorderer {
            pending: HashMap::new(),
            cursor: next_expected,
        }
    }

    /// Insert a received payload and return every payload that is now
    /// contiguous from the cursor, in sequence order.
    ///
    /// Packets at sequence numbers the cursor has already passed are
    /// duplicates and are dropped.
    pub fn insert(&mut self, seq: SeqNumber, payload: Bytes) -> Vec<Bytes> {
        if seq.lt(self.cursor) {
            return Vec::new();
        }
        self.pending.insert(seq.as_raw(), payload);

        let mut released = Vec::new();
        while let Some(payload) = self.pending.remove(&self.cursor.as_raw()) {
            released.push(payload);
            self.cursor.increment();
        }
        released
    }

    /// Next sequence number expected contiguously
    pub fn next_expected(&self) -> SeqNumber {
        self.cursor
    }

    /// Whether every payload up to and including `seq` has been released
    pub fn is_complete_until(&self, seq: SeqNumber) -> bool {
        seq.lt(self.cursor)
    }

    /// Number of payloads still waiting for a gap to close
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
