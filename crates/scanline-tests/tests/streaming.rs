//! Streaming through bounded caller buffers.

use scanline_core::{BufferMask, ImageAttributes, LineCount, PixelType};
use scanline_graph::{ColRange, GraphBuilder, GraphError, PipelineState, RowRange, SchedulerConfig, TileWidth};
use scanline_ops::{CopyFilter, ResampleFilter, VerticalBoxBlur, VerticalResize};
use scanline_tests::{FilterValidator, Frame};
use std::cell::RefCell;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn float(width: u32, height: u32) -> ImageAttributes {
    ImageAttributes::new(width, height, PixelType::Float).unwrap()
}

#[test]
fn point_chain_needs_single_rows() {
    init_tracing();
    let attr = float(32, 100);
    let graph = GraphBuilder::new(attr, 3)
        .add(CopyFilter::new(attr))
        .unwrap()
        .add(CopyFilter::new(attr))
        .unwrap()
        .build()
        .unwrap();
    let schedule = graph.schedule(&SchedulerConfig::default()).unwrap();
    for edge in schedule.edges() {
        assert_eq!(edge.mask, BufferMask::SINGLE, "edge {}", edge.index);
    }
}

#[test]
fn blur_input_ring_is_eight_rows() {
    init_tracing();
    let attr = float(48, 480);
    let graph = GraphBuilder::new(attr, 1)
        .add(VerticalBoxBlur::new(attr, 2).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let schedule = graph.schedule(&SchedulerConfig::default()).unwrap();
    assert_eq!(schedule.input_mask(), BufferMask::Bounded(7));
    assert_eq!(schedule.output_mask(), BufferMask::SINGLE);
    assert_eq!(schedule.edge(0).live_lines, LineCount::Finite(5));

    let validator = FilterValidator::new(graph);
    let source = Frame::pattern(attr, 1, 99).unwrap();
    let config = SchedulerConfig::default();
    let streamed = validator.streamed(&source, &config).unwrap();
    let mut source = source;
    let full = validator.full_frame(&mut source, &config).unwrap();
    assert_eq!(streamed.digests(), full.digests());
}

#[test]
fn callbacks_fire_once_per_row_per_tile() {
    init_tracing();
    let attr = float(200, 50);
    let out = float(200, 25);
    let graph = GraphBuilder::new(attr, 2)
        .add(VerticalResize::new(attr, 25, ResampleFilter::Bicubic).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let config = SchedulerConfig::default()
        .with_tile_width(TileWidth::Fixed(100))
        .with_row_group(5);
    let schedule = graph.schedule(&config).unwrap();
    assert_eq!(schedule.tiles().len(), 2);
    assert_eq!(schedule.output_mask(), BufferMask::Bounded(7));

    let mut input = Frame::with_mask(attr, 2, schedule.input_mask()).unwrap();
    let mut output = Frame::with_mask(out, 2, schedule.output_mask()).unwrap();
    let unpacked = RefCell::new(Vec::<(u32, ColRange)>::new());
    let packed = RefCell::new(Vec::<(RowRange, ColRange)>::new());

    let mut exec = schedule
        .execution(input.buffer(), output.buffer())
        .with_unpack(|row, cols| {
            unpacked.borrow_mut().push((row, cols));
            Ok(())
        })
        .with_pack(|rows, cols| {
            packed.borrow_mut().push((rows, cols));
            Ok(())
        });
    exec.run().unwrap();
    assert_eq!(exec.state(), PipelineState::Complete);
    drop(exec);

    let unpacked = unpacked.into_inner();
    assert_eq!(unpacked.len(), 2 * 50);
    assert!(unpacked[..50].iter().enumerate().all(|(i, (row, _))| *row == i as u32));
    assert_eq!(unpacked[50].0, 0);

    let packed = packed.into_inner();
    assert_eq!(packed.len(), 2 * 5);
    assert_eq!(packed[0], (RowRange::new(0, 5), ColRange::new(0, 100)));
    assert_eq!(packed[9], (RowRange::new(20, 25), ColRange::new(100, 200)));
}

#[test]
fn undersized_ring_is_rejected() {
    let attr = float(16, 64);
    let graph = GraphBuilder::new(attr, 1)
        .add(VerticalBoxBlur::new(attr, 4).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let schedule = graph.schedule(&SchedulerConfig::default()).unwrap();
    assert_eq!(schedule.input_mask(), BufferMask::Bounded(15));

    let mut input = Frame::with_mask(attr, 1, BufferMask::Bounded(7)).unwrap();
    let mut output = Frame::new(attr, 1).unwrap();
    let err = schedule
        .execution(input.buffer(), output.buffer())
        .with_unpack(|_, _| Ok(()))
        .run()
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::BufferTooSmall {
            edge: 0,
            required: BufferMask::Bounded(15),
            actual: BufferMask::Bounded(7),
        }
    ));
}

#[test]
fn failing_unpack_stops_the_run() {
    let attr = float(16, 64);
    let graph = GraphBuilder::new(attr, 1)
        .add(CopyFilter::new(attr))
        .unwrap()
        .build()
        .unwrap();
    let schedule = graph.schedule(&SchedulerConfig::default()).unwrap();

    let mut input = Frame::with_mask(attr, 1, schedule.input_mask()).unwrap();
    let mut output = Frame::new(attr, 1).unwrap();
    let mut exec = schedule
        .execution(input.buffer(), output.buffer())
        .with_unpack(|row, _| {
            if row == 10 {
                return Err(GraphError::callback("decoder hit end of stream"));
            }
            Ok(())
        });
    for _ in 0..10 {
        assert!(exec.step().unwrap());
    }
    let err = exec.step().unwrap_err();
    assert_eq!(err.to_string(), "Callback failed: decoder hit end of stream");
    assert!(matches!(exec.step(), Err(GraphError::InvalidState(_))));
}
