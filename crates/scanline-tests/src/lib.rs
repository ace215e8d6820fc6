//! Integration tests for scanline crates.
//!
//! This crate holds end-to-end tests that chain reference stages from
//! `scanline-ops` through the scheduler in `scanline-graph`, and the
//! [`FilterValidator`] harness that checks a graph gives identical bytes in
//! every execution mode.

pub mod frame;
pub mod validator;

pub use frame::Frame;
pub use validator::{FilterValidator, Validation, ValidationError};

#[cfg(test)]
mod tests {
    use super::*;
    use scanline_core::{BufferMask, ColorLineBuffer, ImageAttributes, PixelFormat, PixelType};
    use scanline_graph::{GraphBuilder, ImageFilter, SchedulerConfig, TileWidth};
    use scanline_ops::{
        ConvertDepth, CopyFilter, NormalizePlane, PlaneMatrix, ResampleFilter, VerticalBoxBlur, VerticalResize,
    };

    fn float(width: u32, height: u32) -> ImageAttributes {
        ImageAttributes::new(width, height, PixelType::Float).unwrap()
    }

    /// Blur, shrink and mix: the common streaming case.
    #[test]
    fn test_blur_resize_matrix_chain() {
        let src = float(200, 61);
        let small = float(200, 30);
        let graph = GraphBuilder::new(src, 3)
            .add(VerticalBoxBlur::new(src, 2).unwrap())
            .unwrap()
            .add(VerticalResize::new(src, 30, ResampleFilter::Lanczos3).unwrap())
            .unwrap()
            .add(PlaneMatrix::new(small, [[0.5, 0.25, 0.25], [0.0, 1.0, 0.0], [0.1, 0.2, 0.7]]).unwrap())
            .unwrap()
            .build()
            .unwrap();

        let report = FilterValidator::new(graph).validate().unwrap();
        assert_eq!(report.digests.len(), 3);
        assert_eq!(report.runs.len(), 9);
        assert_eq!(report.runs[2], "tiled/streamed");
    }

    /// 10-bit limited video in, 8-bit full range out, float in between.
    #[test]
    fn test_depth_round_trip_chain() {
        let words = ImageAttributes::new(150, 24, PixelType::Word).unwrap();
        let floats = float(150, 24);
        let ten_bit = PixelFormat::new(PixelType::Word).with_depth(10).unwrap().limited();
        let graph = GraphBuilder::new(words, 2)
            .add(ConvertDepth::new(words, ten_bit, PixelType::Float.into()).unwrap())
            .unwrap()
            .add(VerticalBoxBlur::new(floats, 1).unwrap())
            .unwrap()
            .add(ConvertDepth::new(floats, PixelType::Float.into(), PixelType::Byte.into()).unwrap())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(graph.output_attributes().pixel_type, PixelType::Byte);
        FilterValidator::new(graph).with_seed(3).validate().unwrap();
    }

    /// A whole-plane stage in the middle turns its input edge into a
    /// full-frame barrier; everything after it still streams.
    #[test]
    fn test_normalize_barrier_chain() {
        let src = float(96, 40);
        let graph = GraphBuilder::new(src, 1)
            .add(VerticalBoxBlur::new(src, 3).unwrap())
            .unwrap()
            .add(NormalizePlane::new(src).unwrap())
            .unwrap()
            .add(VerticalResize::new(src, 20, ResampleFilter::Bilinear).unwrap())
            .unwrap()
            .build()
            .unwrap();

        let schedule = graph.schedule(&SchedulerConfig::default()).unwrap();
        assert_eq!(schedule.barriers(), vec![1]);
        assert_eq!(schedule.edge(1).mask, BufferMask::Unbounded);
        assert!(matches!(schedule.edge(2).mask, BufferMask::Bounded(_)));
        assert_eq!(schedule.tiles().len(), 1);

        let report = FilterValidator::new(graph).validate().unwrap();
        assert_eq!(report.runs.len(), 9);
    }

    #[test]
    fn test_copy_every_pixel_type() {
        for pixel_type in PixelType::ALL {
            let attr = ImageAttributes::new(130, 7, pixel_type).unwrap();
            let graph = GraphBuilder::new(attr, 4)
                .add(CopyFilter::new(attr))
                .unwrap()
                .add(CopyFilter::new(attr))
                .unwrap()
                .build()
                .unwrap();
            let mut source = Frame::pattern(attr, 4, 11).unwrap();
            let expected = source.digests();

            let validator = FilterValidator::new(graph).with_seed(11);
            let report = validator.validate().unwrap();
            assert_eq!(report.digests, expected);

            let out = validator.full_frame(&mut source, &SchedulerConfig::default()).unwrap();
            assert_eq!(out.digests(), expected);
        }
    }

    /// Writes the first column of the tile it runs in.
    struct TileOrigin(ImageAttributes);

    impl ImageFilter for TileOrigin {
        fn name(&self) -> &str {
            "tile_origin"
        }

        fn attributes(&self) -> ImageAttributes {
            self.0
        }

        fn process(
            &self,
            _ctx: &mut [u8],
            _src: &ColorLineBuffer<u8>,
            dst: &ColorLineBuffer<u8>,
            _tmp: &mut [u8],
            i: u32,
            left: u32,
            right: u32,
        ) {
            // SAFETY: output row i, tile columns.
            unsafe { dst[0].row_range_mut(i, left, right) }.fill(left as u8);
        }
    }

    #[test]
    fn test_validator_reports_tile_dependence() {
        let attr = ImageAttributes::new(128, 4, PixelType::Byte).unwrap();
        let graph = GraphBuilder::new(attr, 1).add(TileOrigin(attr)).unwrap().build().unwrap();

        let err = FilterValidator::new(graph).validate().unwrap_err();
        match err {
            ValidationError::Mismatch { run, plane, expected, actual } => {
                assert_eq!(run, "tiled");
                assert_eq!(plane, 0);
                assert_ne!(expected, actual);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_streamed_matches_expected_values() {
        let src = float(64, 16);
        let graph = GraphBuilder::new(src, 1)
            .add(VerticalResize::new(src, 8, ResampleFilter::Bilinear).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let validator = FilterValidator::new(graph);

        let mut source = Frame::new(src, 1).unwrap();
        for y in 0..16 {
            let row: &mut [f32] = bytemuck::cast_slice_mut(source.row_mut(0, y));
            row.fill(y as f32);
        }
        let config = SchedulerConfig::default().with_tile_width(TileWidth::Full);
        let out = validator.streamed(&source, &config).unwrap();
        let values = out.samples::<f32>(0).unwrap();
        // Interior rows average 2i-1..=2i+2 with weights 1/8, 3/8, 3/8, 1/8.
        for i in 1..7 {
            assert!((values[i * 64] - (2.0 * i as f32 + 0.5)).abs() < 1e-5);
        }
    }
}
