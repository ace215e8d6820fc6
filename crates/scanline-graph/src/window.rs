//! Vertical support windows and row/column ranges.
//!
//! A stage declares how many input rows around the current output row it
//! reads ([`SupportWindow`]) and how input rows map onto output rows
//! ([`VerticalScale`]). Together they give the half-open [`RowRange`] of
//! input rows one output row depends on.

use scanline_core::LineCount;

/// Half-open range of rows `top..bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RowRange {
    /// First row.
    pub top: u32,
    /// One past the last row.
    pub bottom: u32,
}

impl RowRange {
    /// Creates a range.
    #[inline]
    pub const fn new(top: u32, bottom: u32) -> Self {
        Self { top, bottom }
    }

    /// Number of rows.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// True if no rows are covered.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bottom <= self.top
    }

    /// Whether `row` is inside the range.
    #[inline]
    pub const fn contains(&self, row: u32) -> bool {
        row >= self.top && row < self.bottom
    }
}

/// Half-open range of columns `left..right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColRange {
    /// First column.
    pub left: u32,
    /// One past the last column.
    pub right: u32,
}

impl ColRange {
    /// Creates a range.
    #[inline]
    pub const fn new(left: u32, right: u32) -> Self {
        Self { left, right }
    }

    /// Number of columns.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }
}

/// Rows read above and below the row being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SupportWindow {
    /// A fixed number of rows before and after the center row.
    Rows {
        /// Rows above the center.
        before: u32,
        /// Rows below the center.
        after: u32,
    },
    /// The whole input plane.
    Unbounded,
}

impl SupportWindow {
    /// Reads only the center row.
    pub const POINT: Self = Self::Rows { before: 0, after: 0 };

    /// Window of `before` rows above and `after` rows below.
    #[inline]
    pub const fn rows(before: u32, after: u32) -> Self {
        Self::Rows { before, after }
    }

    /// Window of `radius` rows on each side.
    #[inline]
    pub const fn symmetric(radius: u32) -> Self {
        Self::Rows {
            before: radius,
            after: radius,
        }
    }

    /// True for whole-plane windows.
    #[inline]
    pub const fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// Rows read per output row, `before + 1 + after`.
    ///
    /// Single-stage estimate only; the scheduler's sizing pass is what
    /// actually determines buffer masks.
    pub fn lines(&self) -> LineCount {
        match *self {
            Self::Rows { before, after } => LineCount::Finite(before.saturating_add(after).saturating_add(1)),
            Self::Unbounded => LineCount::Unbounded,
        }
    }
}

impl Default for SupportWindow {
    fn default() -> Self {
        Self::POINT
    }
}

/// Ratio between input and output plane heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerticalScale {
    /// Input rows.
    pub input: u32,
    /// Output rows.
    pub output: u32,
}

impl VerticalScale {
    /// One input row per output row.
    pub const IDENTITY: Self = Self { input: 1, output: 1 };

    /// Scale mapping `input` rows onto `output` rows.
    #[inline]
    pub const fn new(input: u32, output: u32) -> Self {
        Self { input, output }
    }

    /// True when rows map one to one.
    #[inline]
    pub const fn is_identity(&self) -> bool {
        self.input == self.output
    }

    /// Input rows per output row.
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.input as f64 / self.output.max(1) as f64
    }

    /// Input row under the center of output row `i`.
    #[inline]
    pub fn source_row(&self, i: u32) -> u32 {
        if self.is_identity() || self.output == 0 {
            return i;
        }
        let center = (2 * i as u64 + 1) * self.input as u64 / (2 * self.output as u64);
        center.min(u32::MAX as u64) as u32
    }
}

impl Default for VerticalScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Support window plus vertical scale of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageSupport {
    /// Rows read around the center row.
    pub window: SupportWindow,
    /// Input to output row mapping.
    pub scale: VerticalScale,
}

impl StageSupport {
    /// Point window, identity scale.
    pub const POINT: Self = Self {
        window: SupportWindow::POINT,
        scale: VerticalScale::IDENTITY,
    };

    /// Creates a support declaration.
    #[inline]
    pub const fn new(window: SupportWindow, scale: VerticalScale) -> Self {
        Self { window, scale }
    }

    /// Input rows needed for output row `i`, clamped to `0..input_height`.
    pub fn rows_for(&self, i: u32, input_height: u32) -> RowRange {
        match self.window {
            SupportWindow::Unbounded => RowRange::new(0, input_height),
            SupportWindow::Rows { before, after } => {
                let center = self.scale.source_row(i).min(input_height.saturating_sub(1));
                let top = center.saturating_sub(before);
                let bottom = center.saturating_add(after).saturating_add(1).min(input_height);
                RowRange::new(top, bottom)
            }
        }
    }
}
