//! Whole-plane min/max normalization.
//!
//! Maps every plane onto `[0, 1]` using its own minimum and maximum. The
//! extremes are only known once the whole input plane exists, so this stage
//! reads the entire plane and the entire row; the scheduler makes its input
//! edge a full-frame barrier.

use crate::error::{OpsResult, require_float};
use scanline_core::{ColorLineBuffer, ImageAttributes, MAX_PLANES};
use scanline_graph::{FilterFlags, ImageFilter, StageSupport, SupportWindow, VerticalScale};
use tracing::{debug, trace};

// ctx layout (f32): [ready, min0, max0, min1, max1, ...]
const CONTEXT_FLOATS: usize = 1 + 2 * MAX_PLANES;

/// Normalizes each float plane to `[0, 1]`; flat planes become 0.
#[derive(Debug, Clone)]
pub struct NormalizePlane {
    attr: ImageAttributes,
}

impl NormalizePlane {
    /// Normalization over float planes.
    pub fn new(attr: ImageAttributes) -> OpsResult<Self> {
        require_float("plane normalization", &attr)?;
        debug!(width = attr.width, height = attr.height, "plane normalization");
        Ok(Self { attr })
    }

    fn scan(&self, ctx: &mut [f32], src: &ColorLineBuffer<f32>) {
        let width = self.attr.width;
        for p in 0..src.plane_count() {
            let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
            for row in 0..self.attr.height {
                // SAFETY: the whole plane is resident.
                for &v in unsafe { src[p].row_range(row, 0, width) } {
                    lo = lo.min(v);
                    hi = hi.max(v);
                }
            }
            ctx[1 + 2 * p] = lo;
            ctx[2 + 2 * p] = hi;
        }
        ctx[0] = 1.0;
        trace!(planes = src.plane_count(), "plane extremes ready");
    }
}

impl ImageFilter for NormalizePlane {
    fn name(&self) -> &str {
        "normalize_plane"
    }

    fn flags(&self) -> FilterFlags {
        FilterFlags::NONE.with_state().with_entire_row().with_entire_plane()
    }

    fn attributes(&self) -> ImageAttributes {
        self.attr
    }

    fn support(&self) -> StageSupport {
        StageSupport::new(SupportWindow::Unbounded, VerticalScale::IDENTITY)
    }

    fn context_size(&self) -> usize {
        CONTEXT_FLOATS * 4
    }

    fn init_context(&self, ctx: &mut [u8]) {
        ctx.fill(0);
    }

    fn process(
        &self,
        ctx: &mut [u8],
        src: &ColorLineBuffer<u8>,
        dst: &ColorLineBuffer<u8>,
        _tmp: &mut [u8],
        i: u32,
        left: u32,
        right: u32,
    ) {
        let src = src.reinterpret::<f32>();
        let dst = dst.reinterpret::<f32>();
        let ctx: &mut [f32] = bytemuck::cast_slice_mut(&mut ctx[..CONTEXT_FLOATS * 4]);
        if ctx[0] == 0.0 {
            self.scan(ctx, &src);
        }

        for p in 0..src.plane_count() {
            let (lo, hi) = (ctx[1 + 2 * p], ctx[2 + 2 * p]);
            let span = hi - lo;
            // SAFETY: row i of a resident plane; output row i.
            let (line, out) = unsafe { (src[p].row_range(i, left, right), dst[p].row_range_mut(i, left, right)) };
            for (o, v) in out.iter_mut().zip(line) {
                *o = if span > 0.0 { (*v - lo) / span } else { 0.0 };
            }
        }
    }
}
