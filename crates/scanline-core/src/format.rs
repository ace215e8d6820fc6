//! Pixel types and per-plane formats.
//!
//! This module provides the closed set of sample types a scanline pipeline
//! can carry between stages, plus the descriptors attached to each stage's
//! output.
//!
//! # Types
//!
//! - [`PixelType`] - Storage type of one sample (byte, word, half, float)
//! - [`PixelFormat`] - Storage type plus significant depth and range
//! - [`ImageAttributes`] - Plane dimensions and pixel type produced by a stage
//!
//! # Usage
//!
//! ```rust
//! use scanline_core::format::{PixelFormat, PixelType};
//!
//! // 10-bit video stored in 16-bit words
//! let fmt = PixelFormat::new(PixelType::Word).with_depth(10).unwrap();
//! assert_eq!(fmt.pixel_type.size(), 2);
//! assert_eq!(fmt.max_code(), 1023);
//! ```

use crate::error::{Error, Result};

/// Storage type of a single sample.
///
/// Every buffer in a pipeline holds samples of exactly one of these types.
/// The set is closed: typed buffer access goes through
/// [`Element`](crate::pixel::Element), which is implemented for the matching
/// Rust types only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelType {
    /// 8-bit unsigned integer.
    Byte,
    /// 16-bit unsigned integer.
    Word,
    /// 16-bit half-precision float.
    Half,
    /// 32-bit single-precision float.
    #[default]
    Float,
}

impl PixelType {
    /// All pixel types, in ascending storage size.
    pub const ALL: [PixelType; 4] = [Self::Byte, Self::Word, Self::Half, Self::Float];

    /// Number of bytes per sample.
    #[inline]
    pub const fn size(&self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word | Self::Half => 2,
            Self::Float => 4,
        }
    }

    /// Number of storage bits per sample.
    #[inline]
    pub const fn bits(&self) -> u32 {
        (self.size() * 8) as u32
    }

    /// Whether this is a floating-point type.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Half | Self::Float)
    }

    /// Whether this is an integer type.
    #[inline]
    pub const fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Short name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Byte => "u8",
            Self::Word => "u16",
            Self::Half => "f16",
            Self::Float => "f32",
        }
    }
}

impl std::fmt::Display for PixelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Storage type plus interpretation of the stored codes.
///
/// Integer types may carry fewer significant bits than their storage
/// (`depth`), e.g. 10-bit video in 16-bit words. Float types always use
/// their native depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelFormat {
    /// Storage type.
    pub pixel_type: PixelType,
    /// Significant bits per sample.
    pub depth: u32,
    /// Full (PC) range if `true`, limited (TV) range otherwise.
    pub full_range: bool,
}

impl PixelFormat {
    /// Creates a full-range format at the native depth of `pixel_type`.
    pub const fn new(pixel_type: PixelType) -> Self {
        Self {
            pixel_type,
            depth: pixel_type.bits(),
            full_range: true,
        }
    }

    /// Returns this format with a different significant depth.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the depth is zero, exceeds the
    /// storage size, or differs from the native depth of a float type.
    pub fn with_depth(mut self, depth: u32) -> Result<Self> {
        let native = self.pixel_type.bits();
        if depth == 0 || depth > native {
            return Err(Error::unsupported_format(format!(
                "{}-bit depth in {} storage",
                depth, self.pixel_type
            )));
        }
        if self.pixel_type.is_float() && depth != native {
            return Err(Error::unsupported_format(format!(
                "{} must use native depth {}",
                self.pixel_type, native
            )));
        }
        self.depth = depth;
        Ok(self)
    }

    /// Re-checks a format whose fields were set directly.
    ///
    /// # Errors
    ///
    /// Same as [`with_depth`](Self::with_depth) for the current depth.
    pub fn validate(&self) -> Result<()> {
        self.with_depth(self.depth).map(drop)
    }

    /// Returns this format with limited (TV) range.
    pub const fn limited(mut self) -> Self {
        self.full_range = false;
        self
    }

    /// Largest integer code for the significant depth.
    ///
    /// Returns 0 for float types.
    #[inline]
    pub const fn max_code(&self) -> u32 {
        if self.pixel_type.is_float() {
            0
        } else {
            (1u32 << self.depth) - 1
        }
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::new(PixelType::default())
    }
}

impl From<PixelType> for PixelFormat {
    fn from(pixel_type: PixelType) -> Self {
        Self::new(pixel_type)
    }
}

/// Dimensions and sample type of the planes a stage produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageAttributes {
    /// Plane width in pixels.
    pub width: u32,
    /// Plane height in rows.
    pub height: u32,
    /// Sample type.
    pub pixel_type: PixelType,
}

impl ImageAttributes {
    /// Creates attributes, rejecting empty planes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: u32, height: u32, pixel_type: PixelType) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_dimensions(width, height, "plane must not be empty"));
        }
        Ok(Self {
            width,
            height,
            pixel_type,
        })
    }

    /// Bytes occupied by one row of samples, without padding.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.pixel_type.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_type_sizes() {
        assert_eq!(PixelType::Byte.size(), 1);
        assert_eq!(PixelType::Word.size(), 2);
        assert_eq!(PixelType::Half.size(), 2);
        assert_eq!(PixelType::Float.size(), 4);
        assert_eq!(PixelType::Word.bits(), 16);
    }

    #[test]
    fn test_is_float() {
        assert!(!PixelType::Byte.is_float());
        assert!(!PixelType::Word.is_float());
        assert!(PixelType::Half.is_float());
        assert!(PixelType::Float.is_float());
    }

    #[test]
    fn test_depth_validation() {
        let fmt = PixelFormat::new(PixelType::Word).with_depth(10).unwrap();
        assert_eq!(fmt.max_code(), 1023);
        assert!(PixelFormat::new(PixelType::Byte).with_depth(9).is_err());
        assert!(PixelFormat::new(PixelType::Word).with_depth(0).is_err());
        assert!(PixelFormat::new(PixelType::Float).with_depth(16).is_err());
        assert!(PixelFormat::new(PixelType::Half).with_depth(16).is_ok());
        assert!(fmt.validate().is_ok());
        let wide = PixelFormat {
            depth: 32,
            ..PixelFormat::new(PixelType::Word)
        };
        assert!(wide.validate().is_err());
    }

    #[test]
    fn test_limited_range() {
        let fmt = PixelFormat::new(PixelType::Byte).limited();
        assert!(!fmt.full_range);
        assert_eq!(fmt.max_code(), 255);
    }

    #[test]
    fn test_attributes() {
        let attr = ImageAttributes::new(640, 480, PixelType::Word).unwrap();
        assert_eq!(attr.row_bytes(), 1280);
        assert!(ImageAttributes::new(0, 480, PixelType::Word).is_err());
    }
}
