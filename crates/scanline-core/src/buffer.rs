//! Circular single-plane line buffer.
//!
//! [`LineBuffer`] is a non-owning view over a block of scanlines. It stores
//! a base address, a signed byte stride and a [`BufferMask`]; logical row
//! `i` lives at `base + (i & mask) * stride`. The view is `Copy` and never
//! frees memory: whoever allocated the rows (the scheduler, or the caller
//! for a full-frame buffer) owns them.
//!
//! # Memory Layout
//!
//! ```text
//! mask = 3 (4 physical rows)
//!
//! base ──► [ row 0, 4, 8,  ... ]
//!          [ row 1, 5, 9,  ... ]
//!          [ row 2, 6, 10, ... ]
//!          [ row 3, 7, 11, ... ]
//! ```
//!
//! A negative stride addresses a vertically flipped image: the base points
//! at the bottom row in memory.
//!
//! # Safety Contract
//!
//! Computing addresses is always safe. Dereferencing a row with
//! [`LineBuffer::row`] or [`LineBuffer::row_mut`] is `unsafe`: the caller
//! guarantees that the backing memory is live, that the stride and mask
//! match the allocation, and that no other live row aliases the same
//! physical row (`i1 & mask == i2 & mask`). Nothing on this path is checked
//! at runtime.

use crate::error::{Error, Result};
use crate::mask::BufferMask;
use crate::pixel::Element;
use std::fmt;
use std::marker::PhantomData;

/// Address-wrapping view over the scanlines of one plane.
///
/// # Example
///
/// ```rust
/// use scanline_core::{BufferMask, LineBuffer};
///
/// let mut rows = vec![0u16; 4 * 16];
/// let buf = LineBuffer::from_slice(&mut rows, 16 * 2, BufferMask::Bounded(3));
///
/// // Row 5 and row 1 share physical row 1.
/// assert_eq!(buf.at(5), buf.at(1));
///
/// unsafe { buf.row_mut(5, 16)[0] = 42 };
/// assert_eq!(unsafe { buf.row(1, 16)[0] }, 42);
/// ```
pub struct LineBuffer<T> {
    data: *mut u8,
    stride: isize,
    mask: BufferMask,
    _marker: PhantomData<*mut T>,
}

// SAFETY: a LineBuffer is an address triple. Sharing it across threads is
// no different from sharing a pointer; all dereferences are unsafe and the
// caller upholds the single-producer/single-consumer row discipline.
unsafe impl<T: Element> Send for LineBuffer<T> {}
unsafe impl<T: Element> Sync for LineBuffer<T> {}

impl<T> Clone for LineBuffer<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LineBuffer<T> {}

impl<T> LineBuffer<T> {
    /// Creates a null view. It must not be dereferenced.
    #[inline]
    pub const fn null() -> Self {
        Self {
            data: std::ptr::null_mut(),
            stride: 0,
            mask: BufferMask::SINGLE,
            _marker: PhantomData,
        }
    }

    /// Creates a view from a base pointer, byte stride and row mask.
    ///
    /// # Arguments
    ///
    /// * `data` - Pointer to logical row 0 (physical row 0)
    /// * `stride` - Distance between physical rows in bytes, may be negative
    /// * `mask` - Row wrap mask
    #[inline]
    pub const fn new(data: *mut T, stride: isize, mask: BufferMask) -> Self {
        Self {
            data: data as *mut u8,
            stride,
            mask,
            _marker: PhantomData,
        }
    }

    /// Returns the address of physical row 0.
    #[inline]
    pub fn data(&self) -> *mut T {
        self.data as *mut T
    }

    /// Returns the row stride in bytes.
    #[inline]
    pub fn stride(&self) -> isize {
        self.stride
    }

    /// Returns the row mask.
    #[inline]
    pub fn mask(&self) -> BufferMask {
        self.mask
    }

    /// Returns `true` for a null view.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    /// Returns the address of logical row `i`.
    ///
    /// No bounds checking is done beyond applying the mask.
    #[inline(always)]
    pub fn at(&self, i: u32) -> *mut T {
        let offset = self.mask.wrap(i) as isize * self.stride;
        self.data.wrapping_offset(offset) as *mut T
    }

    /// Re-types the view without touching address, stride or mask.
    ///
    /// The `Element` bound is the only layout check; alignment of the base
    /// and stride for `U` is the caller's responsibility. Use
    /// [`try_reinterpret`](Self::try_reinterpret) to verify it.
    #[inline]
    pub fn reinterpret<U: Element>(self) -> LineBuffer<U> {
        LineBuffer {
            data: self.data,
            stride: self.stride,
            mask: self.mask,
            _marker: PhantomData,
        }
    }
}

impl<T: Element> LineBuffer<T> {
    /// Creates a view over a caller-owned slice.
    ///
    /// The slice must hold every physical row the mask can address.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the stride is not a multiple of the
    /// element size.
    #[inline]
    pub fn from_slice(slice: &mut [T], stride: usize, mask: BufferMask) -> Self {
        debug_assert!(stride % std::mem::size_of::<T>() == 0, "stride not element aligned");
        debug_assert!(
            mask.rows().is_none_or(|rows| {
                (rows - 1).saturating_mul(stride as u64) < std::mem::size_of_val(slice) as u64
            }),
            "slice too small for mask"
        );
        Self::new(slice.as_mut_ptr(), stride as isize, mask)
    }

    /// Returns logical row `i` as a slice of `len` elements.
    ///
    /// # Safety
    ///
    /// The row must lie inside a live allocation of at least `len` elements,
    /// and no mutable reference to the same physical row may be live.
    #[inline(always)]
    pub unsafe fn row<'a>(&self, i: u32, len: usize) -> &'a [T] {
        // SAFETY: forwarded to the caller.
        unsafe { std::slice::from_raw_parts(self.at(i), len) }
    }

    /// Returns logical row `i` as a mutable slice of `len` elements.
    ///
    /// # Safety
    ///
    /// The row must lie inside a live allocation of at least `len` elements,
    /// and no other reference to the same physical row may be live.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn row_mut<'a>(&self, i: u32, len: usize) -> &'a mut [T] {
        // SAFETY: forwarded to the caller.
        unsafe { std::slice::from_raw_parts_mut(self.at(i), len) }
    }

    /// Returns elements `left..right` of logical row `i`.
    ///
    /// # Safety
    ///
    /// Same as [`row`](Self::row), for the sub-range only.
    #[inline(always)]
    pub unsafe fn row_range<'a>(&self, i: u32, left: u32, right: u32) -> &'a [T] {
        debug_assert!(left <= right);
        // SAFETY: forwarded to the caller.
        unsafe { std::slice::from_raw_parts(self.at(i).add(left as usize), (right - left) as usize) }
    }

    /// Returns elements `left..right` of logical row `i` mutably.
    ///
    /// Stages working on disjoint column tiles of the same row must use
    /// this instead of [`row_mut`](Self::row_mut) so their slices never
    /// overlap.
    ///
    /// # Safety
    ///
    /// Same as [`row_mut`](Self::row_mut), for the sub-range only.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn row_range_mut<'a>(&self, i: u32, left: u32, right: u32) -> &'a mut [T] {
        debug_assert!(left <= right);
        // SAFETY: forwarded to the caller.
        unsafe { std::slice::from_raw_parts_mut(self.at(i).add(left as usize), (right - left) as usize) }
    }

    /// Views the buffer as opaque bytes. Address, stride and mask are kept.
    #[inline]
    pub fn as_bytes(self) -> LineBuffer<u8> {
        self.reinterpret()
    }

    /// Re-types the view after checking alignment for `U`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedLayout`] if the base address or the
    /// stride is not aligned for `U`. A null view is accepted unchanged.
    pub fn try_reinterpret<U: Element>(self) -> Result<LineBuffer<U>> {
        if self.is_null() {
            return Ok(self.reinterpret());
        }
        let align = std::mem::align_of::<U>();
        if (self.data as usize) % align != 0 {
            return Err(Error::unsupported_layout(
                T::NAME,
                U::NAME,
                format!("base address not {}-byte aligned", align),
            ));
        }
        if self.stride.unsigned_abs() % std::mem::size_of::<U>() != 0 {
            return Err(Error::unsupported_layout(
                T::NAME,
                U::NAME,
                format!("stride {} not a multiple of {}", self.stride, std::mem::size_of::<U>()),
            ));
        }
        Ok(self.reinterpret())
    }
}

impl<T> Default for LineBuffer<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> PartialEq for LineBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data && self.stride == other.stride && self.mask == other.mask
    }
}

impl<T> Eq for LineBuffer<T> {}

impl<T> fmt::Debug for LineBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBuffer")
            .field("data", &self.data)
            .field("stride", &self.stride)
            .field("mask", &self.mask)
            .finish()
    }
}
