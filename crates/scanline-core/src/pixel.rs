//! Sample element types.
//!
//! [`Element`] ties a Rust type to its [`PixelType`] tag. It is the
//! compile-time layout check used by buffer reinterpretation: a buffer can
//! only be re-typed to another `Element`, and every `Element` is
//! [`bytemuck::Pod`], so any bit pattern read through a reinterpreted view
//! is a valid value.
//!
//! | Rust type | [`PixelType`] |
//! |-----------|---------------|
//! | `u8`      | `Byte`        |
//! | `u16`     | `Word`        |
//! | `f16`     | `Half`        |
//! | `f32`     | `Float`       |
//!
//! `u8` doubles as the opaque byte view: every buffer can be seen as bytes.

use crate::format::PixelType;
use half::f16;

mod sealed {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for half::f16 {}
    impl Sealed for f32 {}
}

/// Sample type storable in a line buffer.
///
/// Sealed: implemented for `u8`, `u16`, `f16` and `f32` only.
///
/// # Example
///
/// ```
/// use scanline_core::{Element, PixelType};
///
/// assert_eq!(<u16 as Element>::PIXEL_TYPE, PixelType::Word);
/// let v: u8 = Element::from_f32(0.5);
/// assert_eq!(v, 128);
/// ```
pub trait Element: bytemuck::Pod + Default + Send + Sync + PartialOrd + sealed::Sealed + 'static {
    /// Runtime tag for this element type.
    const PIXEL_TYPE: PixelType;

    /// Short type name used in diagnostics.
    const NAME: &'static str;

    /// Convert to f32.
    ///
    /// Integers are normalized to [0.0, 1.0]; floats are returned as-is.
    fn to_f32(self) -> f32;

    /// Convert from f32.
    ///
    /// Integers expect [0.0, 1.0] and clamp; floats are converted directly.
    fn from_f32(v: f32) -> Self;
}

impl Element for u8 {
    const PIXEL_TYPE: PixelType = PixelType::Byte;
    const NAME: &'static str = "u8";

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / 255.0
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl Element for u16 {
    const PIXEL_TYPE: PixelType = PixelType::Word;
    const NAME: &'static str = "u16";

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / 65535.0
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        (v.clamp(0.0, 1.0) * 65535.0).round() as u16
    }
}

impl Element for f16 {
    const PIXEL_TYPE: PixelType = PixelType::Half;
    const NAME: &'static str = "f16";

    #[inline]
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        f16::from_f32(v)
    }
}

impl Element for f32 {
    const PIXEL_TYPE: PixelType = PixelType::Float;
    const NAME: &'static str = "f32";

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }
}
