//! Stages and buffers shared by the unit tests.

use crate::filter::{FilterFlags, ImageFilter};
use crate::window::{RowRange, StageSupport, SupportWindow, VerticalScale};
use scanline_core::{BufferMask, ColorLineBuffer, ImageAttributes, LineBuffer, PixelType};

/// Routes `tracing` output to the test harness; `RUST_LOG` selects levels.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) fn attr(width: u32, height: u32) -> ImageAttributes {
    ImageAttributes::new(width, height, PixelType::Float).unwrap()
}

/// Writes the sum of every input row in its window, per column.
#[derive(Clone)]
pub(crate) struct WindowFilter {
    input: ImageAttributes,
    output: ImageAttributes,
    window: SupportWindow,
    flags: FilterFlags,
    lines: u32,
    range: Option<fn(u32) -> RowRange>,
}

impl WindowFilter {
    pub(crate) fn new(attr: ImageAttributes, window: SupportWindow) -> Self {
        Self::resampling(attr, attr, window)
    }

    pub(crate) fn resampling(input: ImageAttributes, output: ImageAttributes, window: SupportWindow) -> Self {
        Self {
            input,
            output,
            window,
            flags: FilterFlags::NONE,
            lines: 1,
            range: None,
        }
    }

    pub(crate) fn with_flags(mut self, flags: FilterFlags) -> Self {
        self.flags = flags;
        self
    }

    pub(crate) fn with_lines(mut self, lines: u32) -> Self {
        self.lines = lines;
        self
    }

    pub(crate) fn with_range(mut self, range: fn(u32) -> RowRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Full-frame result of this stage, one plane.
    pub(crate) fn reference(&self, src: &[f32]) -> Vec<f32> {
        let width = self.output.width as usize;
        let mut out = vec![0.0; width * self.output.height as usize];
        for y in 0..self.output.height {
            let range = self.required_row_range(y);
            for x in 0..width {
                out[y as usize * width + x] =
                    (range.top..range.bottom).map(|r| src[r as usize * width + x]).sum();
            }
        }
        out
    }
}

impl ImageFilter for WindowFilter {
    fn name(&self) -> &str {
        "window"
    }

    fn flags(&self) -> FilterFlags {
        self.flags
    }

    fn attributes(&self) -> ImageAttributes {
        self.output
    }

    fn input_attributes(&self) -> ImageAttributes {
        self.input
    }

    fn support(&self) -> StageSupport {
        StageSupport::new(self.window, VerticalScale::new(self.input.height, self.output.height))
    }

    fn required_row_range(&self, i: u32) -> RowRange {
        match self.range {
            Some(range) => range(i),
            None if self.flags.entire_plane => RowRange::new(0, self.input.height),
            None => self.support().rows_for(i, self.input.height),
        }
    }

    fn simultaneous_lines(&self) -> u32 {
        self.lines
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
        let n = self.lines.min(self.output.height - i);
        for p in 0..src.plane_count() {
            for row in i..i + n {
                let range = self.required_row_range(row);
                // SAFETY: rows come from required_row_range, columns from the tile.
                unsafe {
                    let out = dst[p].row_range_mut(row, left, right);
                    out.fill(0.0);
                    for r in range.top..range.bottom {
                        for (o, s) in out.iter_mut().zip(src[p].row_range(r, left, right)) {
                            *o += *s;
                        }
                    }
                }
            }
        }
    }
}

/// A caller-owned plane set with one contiguous allocation per plane.
pub(crate) struct Frame {
    pub(crate) planes: Vec<Vec<f32>>,
    pub(crate) width: u32,
}

impl Frame {
    /// Planes holding `rows` rows each; `fill(p, x, y)` gives the values.
    pub(crate) fn new(planes: usize, width: u32, rows: u32, fill: impl Fn(usize, u32, u32) -> f32) -> Self {
        let planes = (0..planes)
            .map(|p| {
                (0..rows)
                    .flat_map(|y| (0..width).map(move |x| (x, y)))
                    .map(|(x, y)| fill(p, x, y))
                    .collect()
            })
            .collect();
        Self { planes, width }
    }

    pub(crate) fn buffer(&mut self, mask: BufferMask) -> ColorLineBuffer<u8> {
        let mut out = ColorLineBuffer::default();
        let stride = self.width as usize * 4;
        for (p, plane) in self.planes.iter_mut().enumerate() {
            out[p] = LineBuffer::from_slice(plane, stride, mask).as_bytes();
        }
        out
    }
}
