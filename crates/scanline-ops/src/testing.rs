//! Full-frame helpers for stage tests.

use crate::OpsResult;
use scanline_core::{BufferMask, ColorLineBuffer, Element, LineBuffer};
use scanline_graph::{GraphBuilder, ImageFilter, SchedulerConfig};

/// `planes` planes of `width * height` samples from `f(plane, x, y)`.
pub(crate) fn frame<T: Element>(planes: usize, width: u32, height: u32, f: impl Fn(usize, u32, u32) -> T) -> Vec<Vec<T>> {
    (0..planes)
        .map(|p| {
            (0..height)
                .flat_map(|y| (0..width).map(move |x| (x, y)))
                .map(|(x, y)| f(p, x, y))
                .collect()
        })
        .collect()
}

/// Unbounded byte views over contiguous planes.
pub(crate) fn buffers<T: Element>(planes: &mut [Vec<T>], width: u32) -> ColorLineBuffer<u8> {
    let mut out = ColorLineBuffer::default();
    let stride = width as usize * std::mem::size_of::<T>();
    for (p, plane) in planes.iter_mut().enumerate() {
        out[p] = LineBuffer::from_slice(plane, stride, BufferMask::Unbounded).as_bytes();
    }
    out
}

/// Runs one stage over full frames.
pub(crate) fn run<S: Element, D: Element>(
    filter: impl ImageFilter + 'static,
    src: &mut [Vec<S>],
    config: &SchedulerConfig,
) -> OpsResult<Vec<Vec<D>>> {
    let input = filter.input_attributes();
    let output = filter.attributes();
    let planes = src.len();
    let graph = GraphBuilder::new(input, planes).add(filter)?.build()?;
    let schedule = graph.schedule(config)?;

    let mut dst = vec![vec![D::default(); (output.width * output.height) as usize]; planes];
    schedule.run(buffers(src, input.width), buffers(&mut dst, output.width))?;
    Ok(dst)
}
