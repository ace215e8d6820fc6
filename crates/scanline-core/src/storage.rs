//! Owned backing memory for line buffers.
//!
//! [`LineStorage`] allocates the physical rows behind one pipeline edge:
//! up to four planes, each with `min(mask + 1, height)` rows of a 64-byte
//! aligned stride. Views handed out by [`LineStorage::buffer`] are plain
//! [`LineBuffer`]s and stay valid until the storage is dropped.

use crate::buffer::LineBuffer;
use crate::error::{Error, Result};
use crate::format::ImageAttributes;
use crate::mask::BufferMask;
use crate::plane::{ColorLineBuffer, MAX_PLANES};
use bytemuck::{Pod, Zeroable};

/// Row alignment in bytes.
pub const ALIGNMENT: usize = 64;

#[repr(C, align(64))]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Block([u8; ALIGNMENT]);

/// Rounds a row size up to [`ALIGNMENT`].
#[inline]
pub const fn aligned_stride(row_bytes: usize) -> usize {
    row_bytes.div_ceil(ALIGNMENT) * ALIGNMENT
}

/// Aligned rows for a single plane.
pub struct PlaneStorage {
    blocks: Vec<Block>,
    stride: usize,
    rows: u32,
    mask: BufferMask,
}

impl PlaneStorage {
    /// Allocates `mask.physical_rows(height)` zeroed rows of `row_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] on size overflow or allocator
    /// failure.
    pub fn new(row_bytes: usize, height: u32, mask: BufferMask) -> Result<Self> {
        let stride = aligned_stride(row_bytes);
        let rows = mask.physical_rows(height);
        let bytes = stride
            .checked_mul(rows as usize)
            .ok_or_else(|| Error::allocation_failed(usize::MAX, "plane size overflows usize"))?;
        let count = bytes / ALIGNMENT;

        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(count)
            .map_err(|e| Error::allocation_failed(bytes, e.to_string()))?;
        blocks.resize(count, Block::zeroed());

        Ok(Self {
            blocks,
            stride,
            rows,
            mask,
        })
    }

    /// Row stride in bytes.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of physical rows.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Total bytes held.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.blocks.len() * ALIGNMENT
    }

    /// Byte view over the rows.
    #[inline]
    pub fn buffer(&mut self) -> LineBuffer<u8> {
        LineBuffer::new(self.blocks.as_mut_ptr().cast::<u8>(), self.stride as isize, self.mask)
    }

    /// All rows as one contiguous byte slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    /// All rows as one contiguous mutable byte slice.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.blocks)
    }

    /// Physical row holding logical row `i`, padding included.
    ///
    /// # Panics
    ///
    /// Panics if the wrapped row is past the allocated rows.
    #[inline]
    pub fn row(&self, i: u32) -> &[u8] {
        let start = self.mask.wrap(i) as usize * self.stride;
        &self.as_bytes()[start..start + self.stride]
    }

    /// Mutable physical row holding logical row `i`, padding included.
    ///
    /// # Panics
    ///
    /// Panics if the wrapped row is past the allocated rows.
    #[inline]
    pub fn row_mut(&mut self, i: u32) -> &mut [u8] {
        let start = self.mask.wrap(i) as usize * self.stride;
        let stride = self.stride;
        &mut self.as_bytes_mut()[start..start + stride]
    }
}

/// Backing memory for every plane of one pipeline edge.
///
/// # Example
///
/// ```rust
/// use scanline_core::{BufferMask, ImageAttributes, LineStorage, PixelType};
///
/// let attr = ImageAttributes::new(100, 480, PixelType::Float).unwrap();
/// let mut storage = LineStorage::new(&attr, 3, BufferMask::Bounded(7)).unwrap();
/// assert_eq!(storage.rows(), 8);
///
/// let buf = storage.buffer();
/// assert_eq!(buf.plane_count(), 3);
/// assert_eq!(buf[0].stride(), 448); // 400 bytes rounded up to 64
/// ```
pub struct LineStorage {
    planes: Vec<PlaneStorage>,
    mask: BufferMask,
}

impl LineStorage {
    /// Allocates `planes` planes shaped by `attr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for more than [`MAX_PLANES`]
    /// planes, or [`Error::AllocationFailed`] if memory is unavailable.
    pub fn new(attr: &ImageAttributes, planes: usize, mask: BufferMask) -> Result<Self> {
        if planes == 0 || planes > MAX_PLANES {
            return Err(Error::invalid_dimensions(
                attr.width,
                attr.height,
                format!("{} planes requested, 1..={} supported", planes, MAX_PLANES),
            ));
        }
        let planes = (0..planes)
            .map(|_| PlaneStorage::new(attr.row_bytes(), attr.height, mask))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { planes, mask })
    }

    /// Row mask shared by all planes.
    #[inline]
    pub fn mask(&self) -> BufferMask {
        self.mask
    }

    /// Physical rows per plane.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.planes.first().map_or(0, PlaneStorage::rows)
    }

    /// Number of planes.
    #[inline]
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Total bytes across planes.
    pub fn byte_len(&self) -> usize {
        self.planes.iter().map(PlaneStorage::byte_len).sum()
    }

    /// Access a single plane's storage.
    pub fn plane(&self, index: usize) -> &PlaneStorage {
        &self.planes[index]
    }

    /// Mutable access to a single plane's storage.
    pub fn plane_mut(&mut self, index: usize) -> &mut PlaneStorage {
        &mut self.planes[index]
    }

    /// Byte views over all planes; unused slots are null.
    pub fn buffer(&mut self) -> ColorLineBuffer<u8> {
        let mut out = ColorLineBuffer::default();
        for (slot, plane) in self.planes.iter_mut().enumerate() {
            out[slot] = plane.buffer();
        }
        out
    }
}
