//! Runtime-tagged buffer views.
//!
//! Pipeline plumbing moves planes around as opaque bytes; stages that do
//! arithmetic need typed views. [`AnyLineBuffer`] and [`AnyColorBuffer`]
//! carry a [`PixelType`] tag next to the byte view so a typed view can be
//! recovered with a construction-time check instead of an unchecked cast.

use crate::buffer::LineBuffer;
use crate::error::{Error, Result};
use crate::format::PixelType;
use crate::pixel::Element;
use crate::plane::ColorLineBuffer;
use half::f16;

/// Single-plane view tagged with its sample type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnyLineBuffer {
    /// 8-bit integer samples.
    Byte(LineBuffer<u8>),
    /// 16-bit integer samples.
    Word(LineBuffer<u16>),
    /// 16-bit float samples.
    Half(LineBuffer<f16>),
    /// 32-bit float samples.
    Float(LineBuffer<f32>),
}

impl AnyLineBuffer {
    /// Tags a byte view with the sample type it holds.
    pub fn from_bytes(buf: LineBuffer<u8>, pixel_type: PixelType) -> Self {
        match pixel_type {
            PixelType::Byte => Self::Byte(buf),
            PixelType::Word => Self::Word(buf.reinterpret()),
            PixelType::Half => Self::Half(buf.reinterpret()),
            PixelType::Float => Self::Float(buf.reinterpret()),
        }
    }

    /// Sample type of the view.
    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::Byte(_) => PixelType::Byte,
            Self::Word(_) => PixelType::Word,
            Self::Half(_) => PixelType::Half,
            Self::Float(_) => PixelType::Float,
        }
    }

    /// Untyped byte view. Address, stride and mask are unchanged.
    pub fn as_bytes(&self) -> LineBuffer<u8> {
        match *self {
            Self::Byte(b) => b,
            Self::Word(b) => b.as_bytes(),
            Self::Half(b) => b.as_bytes(),
            Self::Float(b) => b.as_bytes(),
        }
    }

    /// Recovers the typed view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedLayout`] if `T` does not match the tag or
    /// the buffer is misaligned for `T`.
    pub fn downcast<T: Element>(&self) -> Result<LineBuffer<T>> {
        let ty = self.pixel_type();
        if ty != T::PIXEL_TYPE {
            return Err(Error::unsupported_layout(ty.name(), T::NAME, "pixel type mismatch"));
        }
        self.as_bytes().try_reinterpret()
    }
}

impl<T: Element> From<LineBuffer<T>> for AnyLineBuffer {
    fn from(buf: LineBuffer<T>) -> Self {
        Self::from_bytes(buf.as_bytes(), T::PIXEL_TYPE)
    }
}

/// Multi-plane byte view tagged with its sample type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnyColorBuffer {
    bytes: ColorLineBuffer<u8>,
    pixel_type: PixelType,
}

impl AnyColorBuffer {
    /// Tags a byte view with the sample type all its planes hold.
    pub fn new(bytes: ColorLineBuffer<u8>, pixel_type: PixelType) -> Self {
        Self { bytes, pixel_type }
    }

    /// Sample type of every plane.
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Untyped view of all planes.
    pub fn bytes(&self) -> ColorLineBuffer<u8> {
        self.bytes
    }

    /// Recovers the typed aggregate; all planes convert or none do.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedLayout`] on tag mismatch or misalignment.
    pub fn downcast<T: Element>(&self) -> Result<ColorLineBuffer<T>> {
        if self.pixel_type != T::PIXEL_TYPE {
            return Err(Error::unsupported_layout(
                self.pixel_type.name(),
                T::NAME,
                "pixel type mismatch",
            ));
        }
        self.bytes.try_reinterpret()
    }
}

impl<T: Element> From<ColorLineBuffer<T>> for AnyColorBuffer {
    fn from(buf: ColorLineBuffer<T>) -> Self {
        Self::new(buf.as_bytes(), T::PIXEL_TYPE)
    }
}
