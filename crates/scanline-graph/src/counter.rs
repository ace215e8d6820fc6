//! Per-edge produced/consumed counters.
//!
//! Both counters only grow. Rows `consumed..produced` are live; a producer
//! may add rows only while the live span stays within the buffer's
//! `mask + 1` rows, otherwise it would overwrite a row its consumer still
//! needs. The counters are atomic so a threaded producer/consumer pair can
//! share one; the single-threaded executor uses the same predicate as a
//! debug check.

use scanline_core::BufferMask;
use std::sync::atomic::{AtomicU32, Ordering};

/// Row counters of one edge.
#[derive(Debug, Default)]
pub struct EdgeCounter {
    produced: AtomicU32,
    consumed: AtomicU32,
}

impl EdgeCounter {
    /// Both counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows written so far.
    #[inline]
    pub fn produced(&self) -> u32 {
        self.produced.load(Ordering::Acquire)
    }

    /// Lowest row the consumer may still read.
    #[inline]
    pub fn consumed(&self) -> u32 {
        self.consumed.load(Ordering::Acquire)
    }

    /// Rows that would be live after writing `rows` more.
    ///
    /// Rows the consumer has already skipped past are dead as soon as they
    /// are written, so the span starts at `min(consumed, produced)`.
    #[inline]
    pub fn span_after(&self, rows: u32) -> u64 {
        let produced = self.produced() as u64;
        let start = (self.consumed() as u64).min(produced);
        produced + rows as u64 - start
    }

    /// Whether writing `rows` more keeps every live row addressable.
    #[inline]
    pub fn can_produce(&self, rows: u32, mask: BufferMask) -> bool {
        match mask.rows() {
            Some(capacity) => self.span_after(rows) <= capacity,
            None => true,
        }
    }

    /// True while a producer must wait: `produced - consumed >= mask + 1`.
    #[inline]
    pub fn must_stall(&self, mask: BufferMask) -> bool {
        !self.can_produce(1, mask)
    }

    /// Records `rows` newly written rows.
    #[inline]
    pub fn publish(&self, rows: u32) {
        self.produced.fetch_add(rows, Ordering::AcqRel);
    }

    /// Marks every row below `row` as dead.
    #[inline]
    pub fn release_to(&self, row: u32) {
        self.consumed.fetch_max(row, Ordering::AcqRel);
    }

    /// Back to zero, for the next tile.
    pub fn reset(&self) {
        self.produced.store(0, Ordering::Release);
        self.consumed.store(0, Ordering::Release);
    }
}
