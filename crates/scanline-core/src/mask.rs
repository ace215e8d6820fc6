//! Row masks for circular line buffers.
//!
//! A line buffer holding `n` physical rows, with `n` a power of two, maps
//! logical row `i` to physical row `i & (n - 1)`. The value `n - 1` is the
//! buffer's *mask*. A buffer that holds every row of the image uses
//! [`BufferMask::Unbounded`] and addresses rows directly.
//!
//! [`select_buffer_mask`] picks the smallest mask that keeps `count` rows
//! live at once:
//!
//! | count      | mask        |
//! |------------|-------------|
//! | 0, 1       | 0           |
//! | 2          | 1           |
//! | 3..=4      | 3           |
//! | 5..=8      | 7           |
//! | unbounded  | unbounded   |
//!
//! # Example
//!
//! ```rust
//! use scanline_core::mask::{select_buffer_mask, BufferMask, LineCount};
//!
//! assert_eq!(select_buffer_mask(LineCount::Finite(7)), BufferMask::Bounded(7));
//! assert_eq!(select_buffer_mask(LineCount::Finite(8)), BufferMask::Bounded(7));
//! assert_eq!(select_buffer_mask(LineCount::Unbounded), BufferMask::Unbounded);
//! ```

/// Raw mask value with all bits set.
///
/// Interop encoding of [`BufferMask::Unbounded`]. Internally the explicit
/// enum is used so that a legitimately large bounded mask cannot be confused
/// with "no wraparound".
pub const BUFFER_MAX: u32 = u32::MAX;

/// Number of rows that must be live in a buffer at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCount {
    /// A bounded number of rows.
    Finite(u32),
    /// Every row of the image.
    Unbounded,
}

impl LineCount {
    /// Returns the finite count, or `None` if unbounded.
    #[inline]
    pub const fn finite(&self) -> Option<u32> {
        match self {
            Self::Finite(n) => Some(*n),
            Self::Unbounded => None,
        }
    }

    /// Larger of two counts; unbounded dominates.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.max(b)),
            _ => Self::Unbounded,
        }
    }
}

impl From<u32> for LineCount {
    fn from(n: u32) -> Self {
        Self::Finite(n)
    }
}

/// Wrap mask of a line buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferMask {
    /// Physical row is `i & mask`; `mask + 1` is a power of two.
    Bounded(u32),
    /// No wraparound; physical row is `i`.
    Unbounded,
}

impl BufferMask {
    /// Single-row buffer: every logical row aliases physical row 0.
    pub const SINGLE: BufferMask = BufferMask::Bounded(0);

    /// Maps a logical row index to its physical row.
    #[inline(always)]
    pub const fn wrap(&self, i: u32) -> u32 {
        match self {
            Self::Bounded(m) => i & *m,
            Self::Unbounded => i,
        }
    }

    /// Number of distinct physical rows, or `None` if unbounded.
    ///
    /// Returned as `u64` because a bounded mask of `u32::MAX` addresses
    /// 2^32 rows.
    #[inline]
    pub const fn rows(&self) -> Option<u64> {
        match self {
            Self::Bounded(m) => Some(*m as u64 + 1),
            Self::Unbounded => None,
        }
    }

    /// Physical rows needed to back this mask for an image of `height` rows.
    ///
    /// Row indices never exceed `height - 1`, so no more than `height` rows
    /// are ever touched even when the mask itself is larger.
    #[inline]
    pub fn physical_rows(&self, height: u32) -> u32 {
        match self.rows() {
            Some(rows) => rows.min(height as u64) as u32,
            None => height,
        }
    }

    /// Whether `i & mask` is a valid ring index, i.e. `mask + 1` is a power
    /// of two. Other bounded masks alias distinct rows.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        match self {
            Self::Bounded(m) => (*m as u64 + 1).is_power_of_two(),
            Self::Unbounded => true,
        }
    }

    /// Whether this mask keeps at least `count` rows live.
    #[inline]
    pub fn holds(&self, count: LineCount) -> bool {
        match (self, count) {
            (Self::Unbounded, _) => true,
            (Self::Bounded(_), LineCount::Unbounded) => false,
            (Self::Bounded(m), LineCount::Finite(n)) => (*m as u64 + 1) >= n as u64,
        }
    }

    /// Whether this mask is at least as large as `other`.
    ///
    /// A buffer with a larger mask can stand in for one with a smaller mask
    /// without breaking the wraparound contract.
    #[inline]
    pub fn covers(&self, other: BufferMask) -> bool {
        match (self, other) {
            (Self::Unbounded, _) => true,
            (Self::Bounded(_), Self::Unbounded) => false,
            (Self::Bounded(a), Self::Bounded(b)) => *a >= b,
        }
    }

    /// Interop encoding; unbounded becomes [`BUFFER_MAX`].
    #[inline]
    pub const fn to_raw(&self) -> u32 {
        match self {
            Self::Bounded(m) => *m,
            Self::Unbounded => BUFFER_MAX,
        }
    }

    /// Decodes a raw mask; [`BUFFER_MAX`] becomes unbounded.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        if raw == BUFFER_MAX {
            Self::Unbounded
        } else {
            Self::Bounded(raw)
        }
    }
}

impl Default for BufferMask {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl std::fmt::Display for BufferMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bounded(m) => write!(f, "{:#x}", m),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Converts a live line count to the smallest power-of-two buffer mask.
///
/// - `count <= 1` yields mask 0.
/// - Unbounded counts yield [`BufferMask::Unbounded`].
/// - Otherwise yields `next_power_of_two(count) - 1`, so a count that is
///   already a power of two gets exactly `count - 1`.
#[inline]
pub fn select_buffer_mask(count: LineCount) -> BufferMask {
    match count {
        LineCount::Unbounded => BufferMask::Unbounded,
        LineCount::Finite(n) if n <= 1 => BufferMask::SINGLE,
        LineCount::Finite(n) => BufferMask::Bounded(u32::MAX >> (n - 1).leading_zeros()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_counts() {
        assert_eq!(select_buffer_mask(LineCount::Finite(0)), BufferMask::Bounded(0));
        assert_eq!(select_buffer_mask(LineCount::Finite(1)), BufferMask::Bounded(0));
        assert_eq!(select_buffer_mask(LineCount::Finite(2)), BufferMask::Bounded(1));
        assert_eq!(select_buffer_mask(LineCount::Finite(3)), BufferMask::Bounded(3));
        assert_eq!(select_buffer_mask(LineCount::Finite(5)), BufferMask::Bounded(7));
        assert_eq!(select_buffer_mask(LineCount::Finite(7)), BufferMask::Bounded(7));
        assert_eq!(select_buffer_mask(LineCount::Finite(9)), BufferMask::Bounded(15));
    }

    #[test]
    fn test_mask_validity() {
        assert!(BufferMask::SINGLE.is_valid());
        assert!(BufferMask::Bounded(7).is_valid());
        assert!(!BufferMask::Bounded(u32::MAX - 1).is_valid());
        assert!(!BufferMask::Bounded(5).is_valid());
        assert!(BufferMask::Unbounded.is_valid());
        for n in 0..=4096u32 {
            assert!(select_buffer_mask(LineCount::Finite(n)).is_valid(), "count {n}");
        }
    }

    #[test]
    fn test_unbounded_propagates() {
        assert_eq!(select_buffer_mask(LineCount::Unbounded), BufferMask::Unbounded);
    }

    #[test]
    fn test_power_of_two_is_exact() {
        for shift in 1..=31u32 {
            let count = 1u32 << shift;
            assert_eq!(select_buffer_mask(LineCount::Finite(count)), BufferMask::Bounded(count - 1));
        }
    }

    #[test]
    fn test_smallest_sufficient_mask() {
        let samples = (2..=4096u32).chain([65_535, 65_537, (1 << 30) + 1, (1 << 31) - 1, 1 << 31]);
        for count in samples {
            let BufferMask::Bounded(m) = select_buffer_mask(LineCount::Finite(count)) else {
                panic!("finite count produced unbounded mask");
            };
            let rows = m as u64 + 1;
            assert!(rows.is_power_of_two(), "count {count}");
            assert!(rows >= count as u64, "count {count}");
            assert!(rows / 2 < count as u64, "count {count} over-allocated");
        }
    }

    #[test]
    fn test_largest_finite_count_is_not_the_sentinel() {
        assert_eq!(select_buffer_mask(LineCount::Finite(u32::MAX)), BufferMask::Bounded(u32::MAX));
        assert_ne!(select_buffer_mask(LineCount::Finite(u32::MAX)), BufferMask::Unbounded);
    }

    #[test]
    fn test_wrap_and_rows() {
        let mask = BufferMask::Bounded(7);
        assert_eq!(mask.wrap(9), 1);
        assert_eq!(mask.rows(), Some(8));
        assert_eq!(mask.physical_rows(5), 5);
        assert_eq!(mask.physical_rows(480), 8);
        assert_eq!(BufferMask::Unbounded.wrap(9), 9);
        assert_eq!(BufferMask::Unbounded.physical_rows(480), 480);
    }

    #[test]
    fn test_holds_and_covers() {
        let mask = BufferMask::Bounded(7);
        assert!(mask.holds(LineCount::Finite(8)));
        assert!(!mask.holds(LineCount::Finite(9)));
        assert!(!mask.holds(LineCount::Unbounded));
        assert!(mask.covers(BufferMask::Bounded(3)));
        assert!(!mask.covers(BufferMask::Unbounded));
        assert!(BufferMask::Unbounded.covers(mask));
    }

    #[test]
    fn test_raw_encoding() {
        assert_eq!(BufferMask::from_raw(BUFFER_MAX), BufferMask::Unbounded);
        assert_eq!(BufferMask::Unbounded.to_raw(), BUFFER_MAX);
        assert_eq!(BufferMask::from_raw(15), BufferMask::Bounded(15));
    }
}
