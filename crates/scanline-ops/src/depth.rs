//! Pixel type and bit depth conversion.
//!
//! Samples are decoded to normalized `f32` through the source
//! [`PixelFormat`] and encoded through the target one. Integer formats
//! honor their significant depth and range:
//!
//! | range   | black            | white                       |
//! |---------|------------------|-----------------------------|
//! | full    | 0                | `2^depth - 1`               |
//! | limited | `16 << (depth-8)`| `235 << (depth-8)`          |
//!
//! Float formats pass values through unchanged.

use crate::error::{OpsError, OpsResult};
use scanline_core::{AnyLineBuffer, ColorLineBuffer, ImageAttributes, PixelFormat};
use scanline_graph::ImageFilter;
use tracing::debug;

/// Affine map between stored codes and normalized values.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Levels {
    offset: f32,
    range: f32,
    max: f32,
}

impl Levels {
    fn new(format: &PixelFormat) -> OpsResult<Self> {
        if format.pixel_type.is_float() {
            if !format.full_range {
                return Err(OpsError::Unsupported(format!(
                    "limited range {} samples",
                    format.pixel_type
                )));
            }
            return Ok(Self {
                offset: 0.0,
                range: 1.0,
                max: f32::INFINITY,
            });
        }
        let max = format.max_code() as f32;
        if format.full_range {
            return Ok(Self { offset: 0.0, range: max, max });
        }
        if format.depth < 8 {
            return Err(OpsError::Unsupported(format!(
                "limited range needs at least 8 bits, got {}",
                format.depth
            )));
        }
        let shift = format.depth - 8;
        Ok(Self {
            offset: (16u32 << shift) as f32,
            range: (219u32 << shift) as f32,
            max,
        })
    }

    #[inline]
    fn decode(&self, code: f32) -> f32 {
        (code - self.offset) / self.range
    }

    #[inline]
    fn encode(&self, v: f32) -> f32 {
        (v * self.range + self.offset).round().clamp(0.0, self.max)
    }
}

/// Converts between pixel formats; the plane shape is unchanged.
#[derive(Debug, Clone)]
pub struct ConvertDepth {
    input: ImageAttributes,
    output: ImageAttributes,
    from: PixelFormat,
    to: PixelFormat,
    decode: Levels,
    encode: Levels,
}

impl ConvertDepth {
    /// Conversion of `input` planes holding `from` samples into `to`.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidParameter`] if `from` does not match the input
    ///   pixel type
    /// - [`OpsError::Unsupported`] for limited range floats or limited range
    ///   below 8 bits
    /// - [`OpsError::Core`] for a depth the storage type cannot hold
    pub fn new(input: ImageAttributes, from: PixelFormat, to: PixelFormat) -> OpsResult<Self> {
        from.validate()?;
        to.validate()?;
        if input.pixel_type != from.pixel_type {
            return Err(OpsError::InvalidParameter(format!(
                "source format {} does not match {} planes",
                from.pixel_type, input.pixel_type
            )));
        }
        let decode = Levels::new(&from)?;
        let encode = Levels::new(&to)?;
        let output = ImageAttributes::new(input.width, input.height, to.pixel_type)?;
        debug!(?from, ?to, "depth conversion");
        Ok(Self {
            input,
            output,
            from,
            to,
            decode,
            encode,
        })
    }

    /// Source format.
    pub fn from_format(&self) -> PixelFormat {
        self.from
    }

    /// Target format.
    pub fn to_format(&self) -> PixelFormat {
        self.to
    }
}

impl ImageFilter for ConvertDepth {
    fn name(&self) -> &str {
        "convert_depth"
    }

    fn attributes(&self) -> ImageAttributes {
        self.output
    }

    fn input_attributes(&self) -> ImageAttributes {
        self.input
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
        let values: &mut [f32] = bytemuck::cast_slice_mut(&mut tmp[..(right - left) as usize * 4]);

        for p in 0..src.plane_count() {
            // SAFETY: point window on row i, tile columns.
            unsafe {
                match AnyLineBuffer::from_bytes(src[p], self.from.pixel_type) {
                    AnyLineBuffer::Byte(b) => load(values, b.row_range(i, left, right), |c| c as f32),
                    AnyLineBuffer::Word(b) => load(values, b.row_range(i, left, right), |c| c as f32),
                    AnyLineBuffer::Half(b) => load(values, b.row_range(i, left, right), |c| c.to_f32()),
                    AnyLineBuffer::Float(b) => values.copy_from_slice(b.row_range(i, left, right)),
                }
            }
            let decode = self.decode;
            values.iter_mut().for_each(|v| *v = decode.decode(*v));

            let enc = self.encode;
            // SAFETY: output row i, tile columns.
            unsafe {
                match AnyLineBuffer::from_bytes(dst[p], self.to.pixel_type) {
                    AnyLineBuffer::Byte(b) => store(b.row_range_mut(i, left, right), values, |v| enc.encode(v) as u8),
                    AnyLineBuffer::Word(b) => store(b.row_range_mut(i, left, right), values, |v| enc.encode(v) as u16),
                    AnyLineBuffer::Half(b) => store(b.row_range_mut(i, left, right), values, half::f16::from_f32),
                    AnyLineBuffer::Float(b) => b.row_range_mut(i, left, right).copy_from_slice(values),
                }
            }
        }
    }
}

#[inline]
fn load<T: Copy>(values: &mut [f32], row: &[T], f: impl Fn(T) -> f32) {
    for (v, c) in values.iter_mut().zip(row) {
        *v = f(*c);
    }
}

#[inline]
fn store<T>(row: &mut [T], values: &[f32], f: impl Fn(f32) -> T) {
    for (c, v) in row.iter_mut().zip(values) {
        *c = f(*v);
    }
}
