//! Column tiling.
//!
//! Splits the output rows into vertical strips so the rows live on every
//! edge at once fit in cache. Each strip maps its output columns back
//! through the chain via [`ImageFilter::required_col_range`], giving the
//! input columns every stage reads for that strip.
//!
//! ```text
//! edge 0  |---- in 0 ----|                      (widened by stage reach)
//! edge 1    |-- cols --|
//! edge N    |-- out 0 --|-- out 1 --|-- out 2 -|
//! ```

use crate::config::{SchedulerConfig, TileWidth};
use crate::filter::ImageFilter;
use crate::graph::FilterGraph;
use crate::schedule::EdgePlan;
use crate::window::ColRange;

/// Automatic tile widths are multiples of this many columns.
pub const TILE_ALIGNMENT: u32 = 64;

/// Narrowest automatic tile.
pub const MIN_TILE_WIDTH: u32 = 128;

/// Columns touched on every edge while producing one output strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePlan {
    columns: Vec<ColRange>,
}

impl TilePlan {
    /// Output columns of the strip.
    pub fn output(&self) -> ColRange {
        self.columns[self.columns.len() - 1]
    }

    /// Input columns read for the strip.
    pub fn input(&self) -> ColRange {
        self.columns[0]
    }

    /// Columns on edge `edge`.
    pub fn edge(&self, edge: usize) -> ColRange {
        self.columns[edge]
    }

    /// Columns on every edge, input first.
    pub fn columns(&self) -> &[ColRange] {
        &self.columns
    }
}

/// Bytes of the rows live on every edge at once, full width.
pub fn working_set(edges: &[EdgePlan], planes: usize) -> usize {
    edges
        .iter()
        .map(|e| e.attributes.row_bytes() * e.rows as usize * planes)
        .sum()
}

/// Output columns per tile under `config`.
pub(crate) fn tile_width(graph: &FilterGraph, edges: &[EdgePlan], config: &SchedulerConfig) -> u32 {
    let width = graph.output_attributes().width;
    if graph.stages().iter().any(|s| s.flags().entire_row) {
        return width;
    }
    match config.tile_width {
        TileWidth::Full => width,
        TileWidth::Fixed(w) => w.clamp(1, width),
        TileWidth::Auto => {
            let footprint = working_set(edges, graph.planes());
            if footprint <= config.cache_size {
                return width;
            }
            let scaled = (width as u128 * config.cache_size as u128 / footprint as u128) as u32;
            let aligned = scaled / TILE_ALIGNMENT * TILE_ALIGNMENT;
            aligned.max(MIN_TILE_WIDTH).min(width)
        }
    }
}

/// Splits the output into strips and propagates their columns upstream.
pub(crate) fn plan_tiles(graph: &FilterGraph, edges: &[EdgePlan], config: &SchedulerConfig) -> Vec<TilePlan> {
    let width = graph.output_attributes().width;
    let step = tile_width(graph, edges, config);

    let mut tiles = Vec::with_capacity(width.div_ceil(step) as usize);
    let mut left = 0;
    while left < width {
        let right = left.saturating_add(step).min(width);
        tiles.push(propagate(graph.stages(), ColRange::new(left, right)));
        left = right;
    }
    tiles
}

fn propagate(stages: &[std::sync::Arc<dyn ImageFilter>], output: ColRange) -> TilePlan {
    let mut columns = vec![ColRange::default(); stages.len() + 1];
    columns[stages.len()] = output;
    for (s, stage) in stages.iter().enumerate().rev() {
        let next = columns[s + 1];
        columns[s] = stage.required_col_range(next.left, next.right);
    }
    TilePlan { columns }
}
