//! Error types for scanline-core operations.
//!
//! The per-row addressing path has no error states: misuse of a
//! [`LineBuffer`](crate::buffer::LineBuffer) is a caller contract violation.
//! Errors in this module are only produced while describing formats,
//! allocating line storage, or performing a checked reinterpretation.
//!
//! # Usage
//!
//! ```rust
//! use scanline_core::{Error, Result};
//!
//! fn check_plane(width: u32, height: u32) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(Error::invalid_dimensions(width, height, "empty plane"));
//!     }
//!     Ok(())
//! }
//! assert!(check_plane(0, 4).is_err());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up line buffers.
///
/// # Categories
///
/// - **Dimension errors**: [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Format errors**: [`UnsupportedFormat`](Error::UnsupportedFormat)
/// - **Layout errors**: [`UnsupportedLayout`](Error::UnsupportedLayout)
/// - **Allocation errors**: [`AllocationFailed`](Error::AllocationFailed)
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid plane dimensions.
    ///
    /// Returned when width or height is zero, or dimensions would overflow
    /// the buffer size computation.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Pixel format description is not representable.
    #[error("unsupported pixel format: {format}")]
    UnsupportedFormat {
        /// Format name or description
        format: String,
    },

    /// A buffer cannot be viewed as the requested element type.
    ///
    /// Produced by the checked reinterpretation path when the base address
    /// or stride does not satisfy the target alignment, or when a tagged
    /// buffer holds a different pixel type than requested.
    #[error("cannot reinterpret {from} buffer as {to}: {reason}")]
    UnsupportedLayout {
        /// Source element type
        from: &'static str,
        /// Requested element type
        to: &'static str,
        /// What made the layout incompatible
        reason: String,
    },

    /// Line storage allocation failed.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Bytes requested
        requested: usize,
        /// Failure reason
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::UnsupportedFormat`] error.
    #[inline]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates an [`Error::UnsupportedLayout`] error.
    #[inline]
    pub fn unsupported_layout(from: &'static str, to: &'static str, reason: impl Into<String>) -> Self {
        Self::UnsupportedLayout {
            from,
            to,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(requested: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is a layout error.
    #[inline]
    pub fn is_layout_error(&self) -> bool {
        matches!(self, Self::UnsupportedLayout { .. })
    }

    /// Returns `true` if this is an allocation error.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimensions() {
        let err = Error::invalid_dimensions(0, 480, "empty plane");
        let msg = err.to_string();
        assert!(msg.contains("0x480"));
        assert!(msg.contains("empty plane"));
    }

    #[test]
    fn test_unsupported_layout() {
        let err = Error::unsupported_layout("u8", "f32", "misaligned base");
        assert!(err.is_layout_error());
        assert!(err.to_string().contains("u8"));
        assert!(err.to_string().contains("f32"));
    }

    #[test]
    fn test_allocation_failed() {
        let err = Error::allocation_failed(1 << 40, "size overflow");
        assert!(err.is_allocation_error());
        assert!(!err.is_layout_error());
    }
}
