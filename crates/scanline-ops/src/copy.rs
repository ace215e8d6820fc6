//! Point copy.

use scanline_core::{ColorLineBuffer, ImageAttributes};
use scanline_graph::ImageFilter;

/// Copies every plane row by row; works for any pixel type.
#[derive(Debug, Clone)]
pub struct CopyFilter {
    attr: ImageAttributes,
}

impl CopyFilter {
    /// Copy stage for planes shaped like `attr`.
    pub fn new(attr: ImageAttributes) -> Self {
        Self { attr }
    }
}

impl ImageFilter for CopyFilter {
    fn name(&self) -> &str {
        "copy"
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
        let size = self.attr.pixel_type.size() as u32;
        for p in 0..src.plane_count() {
            // SAFETY: row i is inside the point window; columns are the tile's.
            unsafe {
                dst[p]
                    .row_range_mut(i, left * size, right * size)
                    .copy_from_slice(src[p].row_range(i, left * size, right * size));
            }
        }
    }
}
