//! The stage interface driven by the scheduler.

use crate::window::{ColRange, RowRange, StageSupport, SupportWindow, VerticalScale};
use scanline_core::{ColorLineBuffer, ImageAttributes};

/// Scheduling properties of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FilterFlags {
    /// Keeps state between rows in its context; re-initialised per tile.
    pub has_state: bool,
    /// Needs every column of its input rows; disables column tiling.
    pub entire_row: bool,
    /// Needs every row of its input plane before producing any output.
    pub entire_plane: bool,
    /// Processes three planes together (e.g. a color matrix).
    pub color: bool,
}

impl FilterFlags {
    /// No special requirements.
    pub const NONE: Self = Self {
        has_state: false,
        entire_row: false,
        entire_plane: false,
        color: false,
    };

    /// Sets `has_state`.
    pub const fn with_state(mut self) -> Self {
        self.has_state = true;
        self
    }

    /// Sets `entire_row`.
    pub const fn with_entire_row(mut self) -> Self {
        self.entire_row = true;
        self
    }

    /// Sets `entire_plane`.
    pub const fn with_entire_plane(mut self) -> Self {
        self.entire_plane = true;
        self
    }

    /// Sets `color`.
    pub const fn with_color(mut self) -> Self {
        self.color = true;
        self
    }
}

/// One stage of a filter graph.
///
/// A stage maps an input plane set (edge `s`) onto an output plane set
/// (edge `s + 1`). The scheduler calls [`process`](Self::process) once per
/// group of [`simultaneous_lines`](Self::simultaneous_lines) output rows, in
/// increasing row order, after every input row named by
/// [`required_row_range`](Self::required_row_range) has been produced.
///
/// Row ranges must be non-decreasing in both ends as the output row grows.
///
/// # Contract
///
/// `process` may read input rows inside its required range and columns
/// inside [`required_col_range`](Self::required_col_range) only, and write
/// output rows `i..i + n` in columns `left..right` only. Reading anything
/// else is not detected and yields garbage from reused buffer rows.
pub trait ImageFilter: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Scheduling flags.
    fn flags(&self) -> FilterFlags {
        FilterFlags::NONE
    }

    /// Shape of the planes this stage produces.
    fn attributes(&self) -> ImageAttributes;

    /// Shape of the planes this stage consumes.
    fn input_attributes(&self) -> ImageAttributes {
        self.attributes()
    }

    /// Vertical support and scale.
    ///
    /// Defaults to a point window with the scale implied by the input and
    /// output heights.
    fn support(&self) -> StageSupport {
        StageSupport::new(
            SupportWindow::POINT,
            VerticalScale::new(self.input_attributes().height, self.attributes().height),
        )
    }

    /// Input rows needed to produce output row `i`.
    fn required_row_range(&self, i: u32) -> RowRange {
        let height = self.input_attributes().height;
        if self.flags().entire_plane {
            return RowRange::new(0, height);
        }
        self.support().rows_for(i, height)
    }

    /// Input columns needed to produce output columns `left..right`.
    fn required_col_range(&self, left: u32, right: u32) -> ColRange {
        let width = self.input_attributes().width;
        if self.flags().entire_row {
            return ColRange::new(0, width);
        }
        ColRange::new(left.min(width), right.min(width))
    }

    /// Output rows produced per call.
    fn simultaneous_lines(&self) -> u32 {
        1
    }

    /// Bytes of per-tile context.
    fn context_size(&self) -> usize {
        0
    }

    /// Bytes of scratch memory for a call covering `left..right`.
    fn tmp_size(&self, _left: u32, _right: u32) -> usize {
        0
    }

    /// Resets the context before the first row of a tile.
    fn init_context(&self, _ctx: &mut [u8]) {}

    /// Produces output rows `i..i + n`, where
    /// `n = min(simultaneous_lines, height - i)`, in columns `left..right`.
    #[allow(clippy::too_many_arguments)]
    fn process(
        &self,
        ctx: &mut [u8],
        src: &ColorLineBuffer<u8>,
        dst: &ColorLineBuffer<u8>,
        tmp: &mut [u8],
        i: u32,
        left: u32,
        right: u32,
    );
}

/// True if the stage needs its whole input plane before any output.
pub(crate) fn reads_entire_plane(filter: &dyn ImageFilter) -> bool {
    filter.flags().entire_plane || filter.support().window.is_unbounded()
}

/// Rows produced by a call starting at `row` on a plane of `height` rows.
#[inline]
pub(crate) fn lines_at(filter: &dyn ImageFilter, row: u32, height: u32) -> u32 {
    filter.simultaneous_lines().max(1).min(height - row)
}
