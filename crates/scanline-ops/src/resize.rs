//! Vertical resampling.
//!
//! Changes plane height only. Each output row is a weighted sum of a run of
//! input rows; the taps are computed once at construction, so
//! [`required_row_range`](ImageFilter::required_row_range) reports exactly
//! the rows the weights touch.
//!
//! # Filters
//!
//! - [`ResampleFilter::Nearest`] - box, fastest
//! - [`ResampleFilter::Bilinear`] - triangle
//! - [`ResampleFilter::Bicubic`] - Mitchell-Netravali (B = C = 1/3)
//! - [`ResampleFilter::Lanczos3`] - windowed sinc, sharpest
//!
//! When shrinking, kernels are stretched by the ratio so every input row
//! contributes.

use crate::error::{OpsError, OpsResult, require_float};
use scanline_core::{ColorLineBuffer, ImageAttributes};
use scanline_graph::{ImageFilter, RowRange, StageSupport, SupportWindow, VerticalScale};
use tracing::debug;

/// Resampling kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleFilter {
    /// Nearest neighbor (box).
    Nearest,
    /// Bilinear (triangle).
    Bilinear,
    /// Bicubic (Mitchell-Netravali).
    #[default]
    Bicubic,
    /// Lanczos with a = 3.
    Lanczos3,
}

impl ResampleFilter {
    /// Kernel radius in input rows at unit scale.
    pub fn support(&self) -> f32 {
        match self {
            Self::Nearest => 0.5,
            Self::Bilinear => 1.0,
            Self::Bicubic => 2.0,
            Self::Lanczos3 => 3.0,
        }
    }

    /// Evaluates the kernel at distance `x`.
    #[inline]
    pub fn weight(&self, x: f32) -> f32 {
        match self {
            Self::Nearest => {
                if (-0.5..0.5).contains(&x) {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Bilinear => (1.0 - x.abs()).max(0.0),
            Self::Bicubic => mitchell(x),
            Self::Lanczos3 => lanczos(x, 3.0),
        }
    }
}

#[inline]
fn mitchell(x: f32) -> f32 {
    const B: f32 = 1.0 / 3.0;
    const C: f32 = 1.0 / 3.0;

    let ax = x.abs();
    if ax < 1.0 {
        ((12.0 - 9.0 * B - 6.0 * C) * ax * ax * ax + (-18.0 + 12.0 * B + 6.0 * C) * ax * ax + (6.0 - 2.0 * B)) / 6.0
    } else if ax < 2.0 {
        ((-B - 6.0 * C) * ax * ax * ax
            + (6.0 * B + 30.0 * C) * ax * ax
            + (-12.0 * B - 48.0 * C) * ax
            + (8.0 * B + 24.0 * C))
            / 6.0
    } else {
        0.0
    }
}

#[inline]
fn lanczos(x: f32, a: f32) -> f32 {
    let ax = x.abs();
    if ax < 1e-8 {
        1.0
    } else if ax < a {
        let pi_x = std::f32::consts::PI * ax;
        let pi_x_a = pi_x / a;
        (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
    } else {
        0.0
    }
}

/// Normalized weights for input rows `top..top + weights.len()`.
#[derive(Debug, Clone, PartialEq)]
struct RowTaps {
    top: u32,
    weights: Vec<f32>,
}

fn compute_taps(input: u32, output: u32, filter: ResampleFilter) -> Vec<RowTaps> {
    let ratio = input as f32 / output as f32;
    let scale = ratio.max(1.0);
    let radius = filter.support() * scale;
    let last = input as i64 - 1;

    (0..output)
        .map(|i| {
            let center = (i as f32 + 0.5) * ratio;
            let lo = ((center - radius).floor() as i64).clamp(0, last);
            let hi = ((center + radius).ceil() as i64).clamp(lo + 1, input as i64);

            let mut weights: Vec<f32> = (lo..hi)
                .map(|j| filter.weight((j as f32 + 0.5 - center) / scale))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum.abs() > 1e-8 {
                weights.iter_mut().for_each(|w| *w /= sum);
            } else {
                // Kernel missed every row center; take the row under it.
                let near = (center.floor() as i64).clamp(lo, hi - 1);
                weights.iter_mut().for_each(|w| *w = 0.0);
                weights[(near - lo) as usize] = 1.0;
            }
            RowTaps { top: lo as u32, weights }
        })
        .collect()
}

/// Resamples float planes to a new height.
#[derive(Debug, Clone)]
pub struct VerticalResize {
    input: ImageAttributes,
    output: ImageAttributes,
    filter: ResampleFilter,
    taps: Vec<RowTaps>,
}

impl VerticalResize {
    /// Resize from `input` to `height` rows.
    ///
    /// # Errors
    ///
    /// - [`OpsError::InvalidParameter`] if `height` is zero
    /// - [`OpsError::Unsupported`] for non-float planes
    pub fn new(input: ImageAttributes, height: u32, filter: ResampleFilter) -> OpsResult<Self> {
        require_float("vertical resize", &input)?;
        if height == 0 {
            return Err(OpsError::InvalidParameter("target height must be positive".into()));
        }
        let output = ImageAttributes::new(input.width, height, input.pixel_type)?;
        let taps = compute_taps(input.height, height, filter);
        debug!(from = input.height, to = height, ?filter, "vertical resize");
        Ok(Self {
            input,
            output,
            filter,
            taps,
        })
    }

    /// Kernel in use.
    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }
}

impl ImageFilter for VerticalResize {
    fn name(&self) -> &str {
        "vertical_resize"
    }

    fn attributes(&self) -> ImageAttributes {
        self.output
    }

    fn input_attributes(&self) -> ImageAttributes {
        self.input
    }

    fn support(&self) -> StageSupport {
        let ratio = self.input.height as f32 / self.output.height as f32;
        let reach = (self.filter.support() * ratio.max(1.0)).ceil() as u32;
        StageSupport::new(
            SupportWindow::symmetric(reach),
            VerticalScale::new(self.input.height, self.output.height),
        )
    }

    fn required_row_range(&self, i: u32) -> RowRange {
        let taps = &self.taps[i as usize];
        RowRange::new(taps.top, taps.top + taps.weights.len() as u32)
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
        let src = src.reinterpret::<f32>();
        let dst = dst.reinterpret::<f32>();
        let taps = &self.taps[i as usize];
        let acc: &mut [f32] = bytemuck::cast_slice_mut(&mut tmp[..(right - left) as usize * 4]);

        for p in 0..src.plane_count() {
            acc.fill(0.0);
            for (k, &w) in taps.weights.iter().enumerate() {
                // SAFETY: rows come from required_row_range(i).
                let line = unsafe { src[p].row_range(taps.top + k as u32, left, right) };
                for (a, s) in acc.iter_mut().zip(line) {
                    *a += w * *s;
                }
            }
            // SAFETY: output row i, tile columns.
            let out = unsafe { dst[p].row_range_mut(i, left, right) };
            out.copy_from_slice(acc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{frame, run};
    use approx::assert_relative_eq;
    use scanline_core::PixelType;
    use scanline_graph::SchedulerConfig;

    fn attr(w: u32, h: u32) -> ImageAttributes {
        ImageAttributes::new(w, h, PixelType::Float).unwrap()
    }

    #[test]
    fn test_kernels_peak_at_zero() {
        for f in [
            ResampleFilter::Nearest,
            ResampleFilter::Bilinear,
            ResampleFilter::Lanczos3,
        ] {
            assert_relative_eq!(f.weight(0.0), 1.0);
            assert_eq!(f.weight(f.support() + 0.01), 0.0);
        }
        // Mitchell is not interpolating.
        assert_relative_eq!(ResampleFilter::Bicubic.weight(0.0), 8.0 / 9.0, epsilon = 1e-6);
    }

    #[test]
    fn test_taps_are_monotonic_and_normalized() {
        for f in [
            ResampleFilter::Nearest,
            ResampleFilter::Bilinear,
            ResampleFilter::Bicubic,
            ResampleFilter::Lanczos3,
        ] {
            for (input, output) in [(100, 37), (37, 100), (8, 8), (5, 1)] {
                let taps = compute_taps(input, output, f);
                let mut prev = RowRange::new(0, 0);
                for t in &taps {
                    let range = RowRange::new(t.top, t.top + t.weights.len() as u32);
                    assert!(range.top >= prev.top && range.bottom >= prev.bottom);
                    assert!(range.bottom <= input && !range.is_empty());
                    assert_relative_eq!(t.weights.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
                    prev = range;
                }
            }
        }
    }

    #[test]
    fn test_bilinear_identity() {
        let r = VerticalResize::new(attr(6, 9), 9, ResampleFilter::Bilinear).unwrap();
        let mut src = frame(1, 6, 9, |_, x, y| (x + 10 * y) as f32);
        let dst: Vec<Vec<f32>> = run(r, &mut src, &SchedulerConfig::default()).unwrap();
        for (d, s) in dst[0].iter().zip(&src[0]) {
            assert_relative_eq!(d, s, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_bilinear_halving_ramp() {
        // Interior taps are 1/8, 3/8, 3/8, 1/8 around 2i + 1.
        let r = VerticalResize::new(attr(4, 16), 8, ResampleFilter::Bilinear).unwrap();
        assert_eq!(r.required_row_range(3), RowRange::new(5, 9));
        let mut src = frame(1, 4, 16, |_, _, y| y as f32);
        let dst: Vec<Vec<f32>> = run(r, &mut src, &SchedulerConfig::default()).unwrap();
        for i in 1..7u32 {
            assert_relative_eq!(dst[0][(i * 4) as usize], 2.0 * i as f32 + 0.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_constant_survives_every_kernel() {
        for f in [
            ResampleFilter::Nearest,
            ResampleFilter::Bilinear,
            ResampleFilter::Bicubic,
            ResampleFilter::Lanczos3,
        ] {
            for height in [5, 23, 41] {
                let r = VerticalResize::new(attr(3, 23), height, f).unwrap();
                let mut src = frame(2, 3, 23, |p, _, _| 0.5 + p as f32);
                let dst: Vec<Vec<f32>> = run(r, &mut src, &SchedulerConfig::default()).unwrap();
                for (p, plane) in dst.iter().enumerate() {
                    for v in plane {
                        assert_relative_eq!(*v, 0.5 + p as f32, epsilon = 1e-5);
                    }
                }
            }
        }
    }

    #[test]
    fn test_support_reports_scale() {
        let r = VerticalResize::new(attr(4, 100), 25, ResampleFilter::Bicubic).unwrap();
        let support = r.support();
        assert_eq!(support.scale, VerticalScale::new(100, 25));
        assert_eq!(support.window, SupportWindow::symmetric(8));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            VerticalResize::new(attr(4, 4), 0, ResampleFilter::Nearest),
            Err(OpsError::InvalidParameter(_))
        ));
        let bytes = ImageAttributes::new(4, 4, PixelType::Byte).unwrap();
        assert!(matches!(
            VerticalResize::new(bytes, 2, ResampleFilter::Nearest),
            Err(OpsError::Unsupported(_))
        ));
    }
}
