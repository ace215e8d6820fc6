//! Vertical box blur.
//!
//! Averages `2 * radius + 1` rows centered on the output row. Rows past the
//! top or bottom edge repeat the edge row.

use crate::error::{OpsResult, require_float};
use scanline_core::{ColorLineBuffer, ImageAttributes};
use scanline_graph::{ImageFilter, StageSupport, SupportWindow, VerticalScale};
use tracing::debug;

/// Vertical box blur over float planes.
#[derive(Debug, Clone)]
pub struct VerticalBoxBlur {
    attr: ImageAttributes,
    radius: u32,
}

impl VerticalBoxBlur {
    /// Blur of `radius` rows on each side.
    ///
    /// # Errors
    ///
    /// [`OpsError::Unsupported`](crate::OpsError::Unsupported) for non-float
    /// planes.
    pub fn new(attr: ImageAttributes, radius: u32) -> OpsResult<Self> {
        require_float("vertical box blur", &attr)?;
        debug!(radius, height = attr.height, "vertical box blur");
        Ok(Self { attr, radius })
    }

    /// Rows on each side of the center.
    pub fn radius(&self) -> u32 {
        self.radius
    }
}

impl ImageFilter for VerticalBoxBlur {
    fn name(&self) -> &str {
        "vertical_box_blur"
    }

    fn attributes(&self) -> ImageAttributes {
        self.attr
    }

    fn support(&self) -> StageSupport {
        StageSupport::new(SupportWindow::symmetric(self.radius), VerticalScale::IDENTITY)
    }

    fn tmp_size(&self, left: u32, right: u32) -> usize {
        (right - left) as usize * 4
    }

    fn process(
        &self,
        _ctx: &mut [u8],
        src: &ColorLineBuffer<u8>,
        dst: &ColorLineBuffer<u8>,
        tmp: &mut [u8],
        i: u32,
        left: u32,
        right: u32,
    ) {
        let src = src.reinterpret::<f32>();
        let dst = dst.reinterpret::<f32>();
        let width = (right - left) as usize;
        let acc: &mut [f32] = bytemuck::cast_slice_mut(&mut tmp[..width * 4]);
        let last = self.attr.height as i64 - 1;
        let scale = 1.0 / (2 * self.radius + 1) as f32;

        for p in 0..src.plane_count() {
            acc.fill(0.0);
            for k in -(self.radius as i64)..=self.radius as i64 {
                let row = (i as i64 + k).clamp(0, last) as u32;
                // SAFETY: row is clamped into the declared window.
                let line = unsafe { src[p].row_range(row, left, right) };
                for (a, s) in acc.iter_mut().zip(line) {
                    *a += *s;
                }
            }
            // SAFETY: output row i, tile columns.
            let out = unsafe { dst[p].row_range_mut(i, left, right) };
            for (o, a) in out.iter_mut().zip(acc.iter()) {
                *o = *a * scale;
            }
        }
    }
}
