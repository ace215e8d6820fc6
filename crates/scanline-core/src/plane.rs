//! Multi-plane image buffer.
//!
//! [`ColorLineBuffer`] bundles four [`LineBuffer`] views, one per plane
//! (typically three color planes plus alpha). Unused planes are null views.
//! All populated planes share logical row numbering; each may carry its own
//! stride and mask.

use crate::buffer::LineBuffer;
use crate::pixel::Element;
use std::ops::{Index, IndexMut};

/// Maximum number of planes carried between stages.
pub const MAX_PLANES: usize = 4;

/// Four line buffers passed between stages as one unit.
///
/// # Example
///
/// ```rust
/// use scanline_core::{BufferMask, ColorLineBuffer, LineBuffer};
///
/// let mut y = vec![0f32; 64];
/// let mut u = vec![0f32; 64];
/// let mut v = vec![0f32; 64];
/// let mask = BufferMask::Bounded(3);
///
/// let yuv = ColorLineBuffer::new(
///     LineBuffer::from_slice(&mut y, 64, mask),
///     LineBuffer::from_slice(&mut u, 64, mask),
///     LineBuffer::from_slice(&mut v, 64, mask),
/// );
/// assert_eq!(yuv.plane_count(), 3);
/// assert!(yuv[3].is_null());
///
/// // Hand the planes to byte-oriented code and back.
/// let bytes = yuv.reinterpret::<u8>();
/// assert_eq!(bytes.reinterpret::<f32>(), yuv);
/// ```
#[repr(transparent)]
pub struct ColorLineBuffer<T> {
    planes: [LineBuffer<T>; MAX_PLANES],
}

impl<T> Clone for ColorLineBuffer<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ColorLineBuffer<T> {}

impl<T> PartialEq for ColorLineBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.planes == other.planes
    }
}

impl<T> Eq for ColorLineBuffer<T> {}

impl<T> std::fmt::Debug for ColorLineBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.planes.iter()).finish()
    }
}

impl<T> ColorLineBuffer<T> {
    /// Creates a three-plane buffer; the fourth plane is null.
    #[inline]
    pub const fn new(p0: LineBuffer<T>, p1: LineBuffer<T>, p2: LineBuffer<T>) -> Self {
        Self {
            planes: [p0, p1, p2, LineBuffer::null()],
        }
    }

    /// Creates a four-plane buffer.
    #[inline]
    pub const fn with_alpha(p0: LineBuffer<T>, p1: LineBuffer<T>, p2: LineBuffer<T>, alpha: LineBuffer<T>) -> Self {
        Self {
            planes: [p0, p1, p2, alpha],
        }
    }

    /// Creates a buffer with a single populated plane.
    #[inline]
    pub const fn single(p0: LineBuffer<T>) -> Self {
        Self {
            planes: [p0, LineBuffer::null(), LineBuffer::null(), LineBuffer::null()],
        }
    }

    /// Number of leading non-null planes.
    pub fn plane_count(&self) -> usize {
        self.planes.iter().take_while(|p| !p.is_null()).count()
    }

    /// Iterates over all four slots, null ones included.
    pub fn iter(&self) -> std::slice::Iter<'_, LineBuffer<T>> {
        self.planes.iter()
    }

    /// Returns the planes as a slice of four views.
    #[inline]
    pub fn as_slice(&self) -> &[LineBuffer<T>] {
        &self.planes
    }

    /// Returns the planes as a mutable slice of four views.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [LineBuffer<T>] {
        &mut self.planes
    }

    /// Re-types all four planes at once.
    ///
    /// Every plane keeps its address, stride and mask. Planes are never
    /// re-typed individually, so the aggregate always stays homogeneous.
    #[inline]
    pub fn reinterpret<U: Element>(self) -> ColorLineBuffer<U> {
        ColorLineBuffer {
            planes: self.planes.map(LineBuffer::reinterpret),
        }
    }
}

impl<T: Element> ColorLineBuffer<T> {
    /// Views all planes as opaque bytes.
    #[inline]
    pub fn as_bytes(self) -> ColorLineBuffer<u8> {
        self.reinterpret()
    }

    /// Re-types all planes after checking alignment of each.
    ///
    /// Either every plane is converted or none is.
    ///
    /// # Errors
    ///
    /// Returns the first plane's [`Error::UnsupportedLayout`](crate::Error::UnsupportedLayout).
    pub fn try_reinterpret<U: Element>(self) -> crate::Result<ColorLineBuffer<U>> {
        for plane in &self.planes {
            plane.try_reinterpret::<U>()?;
        }
        Ok(self.reinterpret())
    }
}

impl<T> Default for ColorLineBuffer<T> {
    fn default() -> Self {
        Self {
            planes: [LineBuffer::null(); MAX_PLANES],
        }
    }
}

impl<T> Index<usize> for ColorLineBuffer<T> {
    type Output = LineBuffer<T>;

    #[inline]
    fn index(&self, plane: usize) -> &LineBuffer<T> {
        &self.planes[plane]
    }
}

impl<T> IndexMut<usize> for ColorLineBuffer<T> {
    #[inline]
    fn index_mut(&mut self, plane: usize) -> &mut LineBuffer<T> {
        &mut self.planes[plane]
    }
}

impl<T> From<[LineBuffer<T>; MAX_PLANES]> for ColorLineBuffer<T> {
    fn from(planes: [LineBuffer<T>; MAX_PLANES]) -> Self {
        Self { planes }
    }
}

impl<T> From<ColorLineBuffer<T>> for [LineBuffer<T>; MAX_PLANES] {
    fn from(buf: ColorLineBuffer<T>) -> Self {
        buf.planes
    }
}

impl<T> From<LineBuffer<T>> for ColorLineBuffer<T> {
    fn from(plane: LineBuffer<T>) -> Self {
        Self::single(plane)
    }
}

impl<T> AsRef<[LineBuffer<T>]> for ColorLineBuffer<T> {
    fn as_ref(&self) -> &[LineBuffer<T>] {
        &self.planes
    }
}

impl<'a, T> IntoIterator for &'a ColorLineBuffer<T> {
    type Item = &'a LineBuffer<T>;
    type IntoIter = std::slice::Iter<'a, LineBuffer<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.planes.iter()
    }
}
