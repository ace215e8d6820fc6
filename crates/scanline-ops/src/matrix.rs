//! 3x3 matrix across the first three planes.
//!
//! A color stage: it reads all three planes of a row to produce each of
//! them. A fourth (alpha) plane is copied through.

use crate::error::{OpsResult, require_float};
use scanline_core::{ColorLineBuffer, ImageAttributes};
use scanline_graph::{FilterFlags, ImageFilter};
use tracing::debug;

/// Row-major 3x3 matrix applied per pixel to planes 0..3.
#[derive(Debug, Clone)]
pub struct PlaneMatrix {
    attr: ImageAttributes,
    m: [[f32; 3]; 3],
}

impl PlaneMatrix {
    /// Matrix stage over float planes.
    ///
    /// # Errors
    ///
    /// [`OpsError::Unsupported`](crate::OpsError::Unsupported) for non-float
    /// planes.
    pub fn new(attr: ImageAttributes, m: [[f32; 3]; 3]) -> OpsResult<Self> {
        require_float("plane matrix", &attr)?;
        debug!(?m, "plane matrix");
        Ok(Self { attr, m })
    }

    /// Identity matrix stage.
    pub fn identity(attr: ImageAttributes) -> OpsResult<Self> {
        Self::new(attr, [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// The matrix.
    pub fn matrix(&self) -> [[f32; 3]; 3] {
        self.m
    }
}

impl ImageFilter for PlaneMatrix {
    fn name(&self) -> &str {
        "plane_matrix"
    }

    fn flags(&self) -> FilterFlags {
        FilterFlags::NONE.with_color()
    }

    fn attributes(&self) -> ImageAttributes {
        self.attr
    }

    fn process(
        &self,
        _ctx: &mut [u8],
        src: &ColorLineBuffer<u8>,
        dst: &ColorLineBuffer<u8>,
        _tmp: &mut [u8],
        i: u32,
        left: u32,
        right: u32,
    ) {
        let src = src.reinterpret::<f32>();
        let dst = dst.reinterpret::<f32>();
        let m = &self.m;

        // SAFETY: point window on row i; src and dst are different edges.
        let (a, b, c, x, y, z) = unsafe {
            (
                src[0].row_range(i, left, right),
                src[1].row_range(i, left, right),
                src[2].row_range(i, left, right),
                dst[0].row_range_mut(i, left, right),
                dst[1].row_range_mut(i, left, right),
                dst[2].row_range_mut(i, left, right),
            )
        };
        for k in 0..a.len() {
            let (p, q, r) = (a[k], b[k], c[k]);
            x[k] = m[0][0] * p + m[0][1] * q + m[0][2] * r;
            y[k] = m[1][0] * p + m[1][1] * q + m[1][2] * r;
            z[k] = m[2][0] * p + m[2][1] * q + m[2][2] * r;
        }

        if src.plane_count() > 3 {
            // SAFETY: same row and columns, fourth plane.
            unsafe {
                dst[3]
                    .row_range_mut(i, left, right)
                    .copy_from_slice(src[3].row_range(i, left, right));
            }
        }
    }
}
