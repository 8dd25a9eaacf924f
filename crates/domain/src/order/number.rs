//! Order number generation.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use uuid::Uuid;

const SEQUENCE_SPAN: u32 = 1_000_000;
const NODE_SPAN: u128 = 10_000;

/// Generates human-facing order numbers of the form
/// `FS<epoch-millis><node:4><sequence:6>`.
///
/// The node tag is drawn once per generator, so two processes minting in
/// the same millisecond still differ. Within a process the sequence makes
/// numbers unique until it wraps after a million orders in one
/// millisecond. The order store's uniqueness constraint is the backstop.
#[derive(Debug)]
pub struct OrderNumberGenerator {
    node: u16,
    sequence: AtomicU32,
}

impl OrderNumberGenerator {
    /// Creates a generator with a random node tag.
    pub fn new() -> Self {
        Self::with_node((Uuid::new_v4().as_u128() % NODE_SPAN) as u16)
    }

    /// Creates a generator with a fixed node tag (taken modulo 10000).
    pub fn with_node(node: u16) -> Self {
        Self {
            node: node % NODE_SPAN as u16,
            sequence: AtomicU32::new(0),
        }
    }

    /// Returns the node tag embedded in every number.
    pub fn node(&self) -> u16 {
        self.node
    }

    /// Mints the next order number at the current time.
    pub fn next(&self) -> String {
        self.next_at(Utc::now().timestamp_millis())
    }

    /// Mints the next order number for a given timestamp.
    pub fn next_at(&self, epoch_millis: i64) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) % SEQUENCE_SPAN;
        format!("FS{epoch_millis}{:04}{sequence:06}", self.node)
    }
}

impl Default for OrderNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}
