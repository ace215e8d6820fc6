//! Owned test frames with deterministic content and plane digests.

use half::f16;
use scanline_core::{BufferMask, ColorLineBuffer, Element, ImageAttributes, LineStorage, PixelType, Result};
use sha2::{Digest, Sha256};

/// Planes of one image, backed by aligned storage.
///
/// A frame built with [`Frame::new`] holds every row. [`Frame::with_mask`]
/// builds a ring of rows for streamed runs.
pub struct Frame {
    attr: ImageAttributes,
    storage: LineStorage,
}

impl Frame {
    /// Zeroed full frame.
    pub fn new(attr: ImageAttributes, planes: usize) -> Result<Self> {
        Self::with_mask(attr, planes, BufferMask::Unbounded)
    }

    /// Zeroed frame holding the rows `mask` addresses.
    pub fn with_mask(attr: ImageAttributes, planes: usize, mask: BufferMask) -> Result<Self> {
        Ok(Self {
            attr,
            storage: LineStorage::new(&attr, planes, mask)?,
        })
    }

    /// Full frame filled with pseudo-random samples derived from `seed`.
    ///
    /// Integer samples cover every code; float samples lie in `[0, 1)`.
    pub fn pattern(attr: ImageAttributes, planes: usize, seed: u64) -> Result<Self> {
        let mut frame = Self::new(attr, planes)?;
        let size = attr.pixel_type.size();
        for p in 0..planes {
            for y in 0..attr.height {
                let row = frame.row_mut(p, y);
                for x in 0..attr.width {
                    let h = mix(seed ^ ((p as u64) << 56) ^ ((y as u64) << 28) ^ x as u64);
                    let at = &mut row[x as usize * size..(x as usize + 1) * size];
                    match attr.pixel_type {
                        PixelType::Byte => at[0] = h as u8,
                        PixelType::Word => at.copy_from_slice(bytemuck::bytes_of(&(h as u16))),
                        PixelType::Half => at.copy_from_slice(bytemuck::bytes_of(&f16::from_f32(unit(h)))),
                        PixelType::Float => at.copy_from_slice(bytemuck::bytes_of(&unit(h))),
                    }
                }
            }
        }
        Ok(frame)
    }

    /// Plane shape.
    pub fn attributes(&self) -> ImageAttributes {
        self.attr
    }

    /// Number of planes.
    pub fn plane_count(&self) -> usize {
        self.storage.plane_count()
    }

    /// Row mask of the backing storage.
    pub fn mask(&self) -> BufferMask {
        self.storage.mask()
    }

    /// Byte views for a run.
    pub fn buffer(&mut self) -> ColorLineBuffer<u8> {
        self.storage.buffer()
    }

    /// Sample bytes of logical row `y`, padding excluded.
    pub fn row(&self, plane: usize, y: u32) -> &[u8] {
        &self.storage.plane(plane).row(y)[..self.attr.row_bytes()]
    }

    /// Mutable sample bytes of logical row `y`.
    pub fn row_mut(&mut self, plane: usize, y: u32) -> &mut [u8] {
        let len = self.attr.row_bytes();
        &mut self.storage.plane_mut(plane).row_mut(y)[..len]
    }

    /// Typed copy of a whole plane, or `None` if `T` is not the sample type.
    pub fn samples<T: Element>(&self, plane: usize) -> Option<Vec<T>> {
        if T::PIXEL_TYPE != self.attr.pixel_type {
            return None;
        }
        Some(
            (0..self.attr.height)
                .flat_map(|y| bytemuck::cast_slice::<u8, T>(self.row(plane, y)).iter().copied())
                .collect(),
        )
    }

    /// SHA-256 of a plane's sample bytes, row by row, as lowercase hex.
    pub fn digest(&self, plane: usize) -> String {
        let mut hasher = Sha256::new();
        for y in 0..self.attr.height {
            hasher.update(self.row(plane, y));
        }
        hex::encode(hasher.finalize())
    }

    /// Digests of every plane.
    pub fn digests(&self) -> Vec<String> {
        (0..self.plane_count()).map(|p| self.digest(p)).collect()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("attr", &self.attr)
            .field("planes", &self.plane_count())
            .field("mask", &self.mask())
            .finish()
    }
}

// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn unit(h: u64) -> f32 {
    (h >> 40) as f32 / (1u64 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(pixel_type: PixelType) -> ImageAttributes {
        ImageAttributes::new(9, 4, pixel_type).unwrap()
    }

    #[test]
    fn test_pattern_is_deterministic() {
        let a = Frame::pattern(attr(PixelType::Float), 2, 7).unwrap();
        let b = Frame::pattern(attr(PixelType::Float), 2, 7).unwrap();
        let c = Frame::pattern(attr(PixelType::Float), 2, 8).unwrap();
        assert_eq!(a.digests(), b.digests());
        assert_ne!(a.digest(0), c.digest(0));
        assert_ne!(a.digest(0), a.digest(1));
    }

    #[test]
    fn test_float_pattern_in_unit_range() {
        let frame = Frame::pattern(attr(PixelType::Float), 1, 1).unwrap();
        let samples = frame.samples::<f32>(0).unwrap();
        assert_eq!(samples.len(), 36);
        assert!(samples.iter().all(|v| (0.0..1.0).contains(v)));
        assert!(frame.samples::<u16>(0).is_none());
    }

    #[test]
    fn test_digest_ignores_padding() {
        let mut frame = Frame::new(attr(PixelType::Byte), 1).unwrap();
        let before = frame.digest(0);
        // Padding past the 9 sample bytes is not hashed.
        frame.storage.plane_mut(0).row_mut(2)[40] = 1;
        assert_eq!(frame.digest(0), before);
        frame.row_mut(0, 2)[8] = 1;
        assert_ne!(frame.digest(0), before);
        assert_eq!(before.len(), 64);
    }

    #[test]
    fn test_ring_frame_wraps() {
        let mut frame = Frame::with_mask(attr(PixelType::Word), 1, BufferMask::Bounded(1)).unwrap();
        frame.row_mut(0, 3).fill(0xff);
        assert!(frame.row(0, 1).iter().all(|&b| b == 0xff));
        assert_eq!(frame.mask(), BufferMask::Bounded(1));
    }
}
