//! Buffer sizing.
//!
//! The scheduler replays the pull of every output row without touching
//! pixels. For each write into an edge it records how many rows are live
//! at that moment: everything from the consumer's lowest still-needed row
//! up to the end of the write. The largest such span over the whole frame
//! is the edge's live-line count, which [`select_buffer_mask`] turns into
//! the edge's mask.
//!
//! Replaying the pull composes windows exactly, including scale changes and
//! multi-line producers, where summing `before + after` along the chain
//! would over- or under-estimate.
//!
//! An edge read by a stage that needs its whole input plane is unbounded;
//! that stage acts as a barrier and the edges after it are sized from their
//! own consumers only.

use crate::config::SchedulerConfig;
use crate::execute::Execution;
use crate::filter::{ImageFilter, lines_at, reads_entire_plane};
use crate::graph::FilterGraph;
use crate::tiling::{TilePlan, plan_tiles};
use crate::{GraphResult, PipelineState};
use scanline_core::{BufferMask, ColorLineBuffer, ImageAttributes, LineCount, aligned_stride, select_buffer_mask};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Sizing result for one edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePlan {
    /// Edge index; 0 is the caller's input, the last is the caller's output.
    pub index: usize,
    /// Shape of the planes on the edge.
    pub attributes: ImageAttributes,
    /// Rows that must be addressable at once.
    pub live_lines: LineCount,
    /// Mask derived from `live_lines`.
    pub mask: BufferMask,
    /// Physical rows per plane, `min(mask + 1, height)`.
    pub rows: u32,
    /// Backed by caller memory rather than scheduler storage.
    pub external: bool,
}

impl EdgePlan {
    /// Padded row stride of scheduler storage.
    pub fn stride(&self) -> usize {
        aligned_stride(self.attributes.row_bytes())
    }

    /// Bytes of scheduler storage per plane; zero for caller buffers.
    pub fn plane_bytes(&self) -> usize {
        if self.external {
            0
        } else {
            self.stride() * self.rows as usize
        }
    }
}

/// A graph with every edge sized and its column tiles planned.
pub struct Schedule {
    graph: FilterGraph,
    config: SchedulerConfig,
    edges: Vec<EdgePlan>,
    tiles: Vec<TilePlan>,
}

impl Schedule {
    #[instrument(skip_all, fields(stages = graph.len()))]
    pub(crate) fn new(graph: FilterGraph, config: SchedulerConfig) -> GraphResult<Self> {
        config.validate()?;

        let live = Simulation::run(&graph, config.row_group);
        let last = graph.len();
        let edges: Vec<EdgePlan> = live
            .into_iter()
            .enumerate()
            .map(|(index, lines)| {
                let barrier = index < last && reads_entire_plane(graph.stages()[index].as_ref());
                let live_lines = if barrier {
                    LineCount::Unbounded
                } else {
                    LineCount::Finite(lines)
                };
                let attributes = graph.edge_attributes(index);
                let mask = select_buffer_mask(live_lines);
                EdgePlan {
                    index,
                    attributes,
                    live_lines,
                    mask,
                    rows: mask.physical_rows(attributes.height),
                    external: index == 0 || index == last,
                }
            })
            .collect();

        for edge in &edges {
            debug!(
                edge = edge.index,
                live = ?edge.live_lines,
                mask = %edge.mask,
                rows = edge.rows,
                bytes = edge.plane_bytes() * graph.planes(),
                "sized edge"
            );
        }

        let tiles = plan_tiles(&graph, &edges, &config);
        debug!(tiles = tiles.len(), "planned column tiles");

        Ok(Self {
            graph,
            config,
            edges,
            tiles,
        })
    }

    /// Buffers are sized; nothing has run.
    pub fn state(&self) -> PipelineState {
        PipelineState::Sized
    }

    /// The scheduled graph.
    pub fn graph(&self) -> &FilterGraph {
        &self.graph
    }

    /// Configuration used for sizing.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Every edge, input first.
    pub fn edges(&self) -> &[EdgePlan] {
        &self.edges
    }

    /// Sizing of one edge.
    pub fn edge(&self, index: usize) -> &EdgePlan {
        &self.edges[index]
    }

    /// Smallest mask a streamed input buffer may have.
    pub fn input_mask(&self) -> BufferMask {
        self.edges[0].mask
    }

    /// Smallest mask a streamed output buffer may have.
    pub fn output_mask(&self) -> BufferMask {
        self.edges[self.edges.len() - 1].mask
    }

    /// Column tiles in left to right order.
    pub fn tiles(&self) -> &[TilePlan] {
        &self.tiles
    }

    /// Indices of stages that need their whole input plane.
    pub fn barriers(&self) -> Vec<usize> {
        self.graph
            .stages()
            .iter()
            .enumerate()
            .filter(|(_, s)| reads_entire_plane(s.as_ref()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Bytes of scheduler-owned storage one execution allocates.
    pub fn internal_bytes(&self) -> usize {
        self.edges.iter().map(EdgePlan::plane_bytes).sum::<usize>() * self.graph.planes()
    }

    /// Prepares a run over caller buffers.
    ///
    /// Without callbacks both buffers must hold every row; attach
    /// [`with_unpack`](Execution::with_unpack) or
    /// [`with_pack`](Execution::with_pack) to stream through smaller ones.
    pub fn execution(&self, input: ColorLineBuffer<u8>, output: ColorLineBuffer<u8>) -> Execution<'_> {
        Execution::new(self, input, output)
    }

    /// Runs the whole frame between two full-frame caller buffers.
    ///
    /// Column tiles run on the rayon pool when
    /// [`SchedulerConfig::parallel`] is set and the `parallel` feature is
    /// enabled.
    #[instrument(skip_all, fields(tiles = self.tiles.len(), parallel = self.config.parallel))]
    pub fn run(&self, input: ColorLineBuffer<u8>, output: ColorLineBuffer<u8>) -> GraphResult<()> {
        if self.config.parallel && self.tiles.len() > 1 {
            self.run_tiles_parallel(input, output)?;
        } else {
            self.execution(input, output).run()?;
        }
        info!(tiles = self.tiles.len(), rows = self.graph.output_attributes().height, "run complete");
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn run_tiles_parallel(&self, input: ColorLineBuffer<u8>, output: ColorLineBuffer<u8>) -> GraphResult<()> {
        use rayon::prelude::*;

        (0..self.tiles.len())
            .into_par_iter()
            .try_for_each(|tile| Execution::for_tiles(self, input, output, tile..tile + 1).run())
    }

    #[cfg(not(feature = "parallel"))]
    fn run_tiles_parallel(&self, input: ColorLineBuffer<u8>, output: ColorLineBuffer<u8>) -> GraphResult<()> {
        debug!("parallel feature disabled, running tiles in order");
        self.execution(input, output).run()
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("graph", &self.graph)
            .field("edges", &self.edges)
            .field("tiles", &self.tiles.len())
            .finish()
    }
}

/// Pixel-free replay of the pull order.
struct Simulation<'g> {
    stages: &'g [Arc<dyn ImageFilter>],
    heights: Vec<u32>,
    produced: Vec<u32>,
    consumed: Vec<u32>,
    live: Vec<u32>,
}

impl<'g> Simulation<'g> {
    /// Largest live span per edge.
    fn run(graph: &'g FilterGraph, row_group: u32) -> Vec<u32> {
        let edges = graph.len() + 1;
        let mut sim = Simulation {
            stages: graph.stages(),
            heights: (0..edges).map(|e| graph.edge_attributes(e).height).collect(),
            produced: vec![0; edges],
            consumed: vec![0; edges],
            live: vec![0; edges],
        };

        let sink = edges - 1;
        let height = sim.heights[sink];
        let mut row = 0;
        while row < height {
            let end = row.saturating_add(row_group).min(height);
            sim.release(sink, row);
            sim.pull(sink, end);
            row = end;
        }
        sim.live
    }

    fn release(&mut self, edge: usize, row: u32) {
        self.consumed[edge] = self.consumed[edge].max(row);
    }

    fn write(&mut self, edge: usize, rows: u32) {
        let start = self.consumed[edge].min(self.produced[edge]);
        let span = self.produced[edge] + rows - start;
        self.live[edge] = self.live[edge].max(span);
        self.produced[edge] += rows;
    }

    fn pull(&mut self, edge: usize, upto: u32) {
        if edge == 0 {
            while self.produced[0] < upto {
                self.write(0, 1);
            }
            return;
        }

        let stages = self.stages;
        let filter = stages[edge - 1].as_ref();
        let height = self.heights[edge];
        while self.produced[edge] < upto {
            let row = self.produced[edge];
            let n = lines_at(filter, row, height);
            let first = filter.required_row_range(row);
            let last = filter.required_row_range(row + n - 1);
            self.release(edge - 1, first.top);
            self.pull(edge - 1, last.bottom);
            self.write(edge, n);
        }
    }
}
