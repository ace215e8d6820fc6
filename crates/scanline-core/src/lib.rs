//! # scanline-core
//!
//! Core types for streaming scanline pipelines.
//!
//! This crate provides the addressing primitives every pipeline stage is
//! built on:
//!
//! - [`LineBuffer`] - Non-owning, address-wrapping view over one plane
//! - [`ColorLineBuffer`] - Four line buffers passed between stages as a unit
//! - [`BufferMask`], [`select_buffer_mask`] - Power-of-two row masks
//! - [`Element`], [`PixelType`] - The closed set of sample types
//! - [`AnyLineBuffer`], [`AnyColorBuffer`] - Byte views tagged with their sample type
//! - [`LineStorage`] - Aligned memory behind scheduler-owned buffers
//!
//! ## Design Philosophy
//!
//! A stage that needs rows `i - k ..= i + k` of its input does not need the
//! whole frame, only a window that slides down the image. Sizing each
//! window to a power of two lets every row lookup be a single AND:
//!
//! ```
//! use scanline_core::prelude::*;
//!
//! let mut rows = vec![0f32; 8 * 16];
//! let mask = select_buffer_mask(LineCount::Finite(7));
//! let buf = LineBuffer::from_slice(&mut rows, 16 * 4, mask);
//!
//! assert_eq!(mask, BufferMask::Bounded(7));
//! assert_eq!(buf.at(3), buf.at(11));
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! scanline-core (this crate)
//!    ^
//!    |
//!    +-- scanline-graph (filter trait, scheduler, execution)
//!           ^
//!           +-- scanline-ops (reference stages)
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Enable serialization for format and mask types

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod cast;
pub mod error;
pub mod format;
pub mod mask;
pub mod pixel;
pub mod plane;
pub mod storage;

// Re-exports for convenience
pub use buffer::LineBuffer;
pub use cast::{AnyColorBuffer, AnyLineBuffer};
pub use error::{Error, Result};
pub use format::{ImageAttributes, PixelFormat, PixelType};
pub use mask::{select_buffer_mask, BufferMask, LineCount, BUFFER_MAX};
pub use pixel::Element;
pub use plane::{ColorLineBuffer, MAX_PLANES};
pub use storage::{aligned_stride, LineStorage, PlaneStorage, ALIGNMENT};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use scanline_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::buffer::LineBuffer;
    pub use crate::cast::{AnyColorBuffer, AnyLineBuffer};
    pub use crate::error::{Error, Result};
    pub use crate::format::{ImageAttributes, PixelFormat, PixelType};
    pub use crate::mask::{select_buffer_mask, BufferMask, LineCount};
    pub use crate::pixel::Element;
    pub use crate::plane::ColorLineBuffer;
    pub use crate::storage::LineStorage;
}
