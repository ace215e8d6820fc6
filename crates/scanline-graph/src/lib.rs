//! Filter graph scheduling and streaming execution.
//!
//! Chains [`ImageFilter`] stages into a pipeline that runs top to bottom
//! through bounded, power-of-two line buffers. Each edge between two stages
//! is sized from the rows its consumer must see at once, so a chain of
//! filters with different vertical reach never holds a full frame unless a
//! stage asks for one.
//!
//! # Architecture
//!
//! ```text
//! GraphBuilder ──build──> FilterGraph          (Unscheduled)
//!                             │ schedule(config)
//!                             v
//!                          Schedule            (Sized: EdgePlan per edge, TilePlan per tile)
//!                             │ execution(input, output)
//!                             v
//!                          Execution           (Running ... Complete)
//!                             └── pull: generate(edge, row)
//!                                    ├── required_row_range -> upstream first
//!                                    └── ImageFilter::process
//! ```
//!
//! Edge 0 is the caller's input buffer and edge N the caller's output
//! buffer. Internal edges are backed by scheduler-owned
//! [`LineStorage`](scanline_core::LineStorage).
//!
//! # Example
//!
//! ```ignore
//! use scanline_graph::{GraphBuilder, SchedulerConfig};
//!
//! let graph = GraphBuilder::new(source, 3)
//!     .add(blur)?
//!     .add(resize)?
//!     .build()?;
//! let schedule = graph.schedule(&SchedulerConfig::default())?;
//! println!("input needs mask {}", schedule.input_mask());
//! schedule.run(input, output)?;
//! ```

pub mod config;
pub mod counter;
pub mod execute;
pub mod filter;
pub mod graph;
pub mod schedule;
pub mod tiling;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{SchedulerConfig, TileWidth, DEFAULT_CACHE_SIZE};
pub use counter::EdgeCounter;
pub use execute::Execution;
pub use filter::{FilterFlags, ImageFilter};
pub use graph::{FilterGraph, GraphBuilder};
pub use schedule::{EdgePlan, Schedule};
pub use tiling::TilePlan;
pub use window::{ColRange, RowRange, StageSupport, SupportWindow, VerticalScale};

use scanline_core::{BufferMask, ImageAttributes};
use thiserror::Error;

/// Graph construction, scheduling and execution errors.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid graph configuration: {0}")]
    Configuration(String),

    #[error("Dimension mismatch at stage '{stage}': expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        stage: String,
        expected: ImageAttributes,
        actual: ImageAttributes,
    },

    #[error("Buffer for edge {edge} too small: mask {actual} does not cover {required}")]
    BufferTooSmall {
        edge: usize,
        required: BufferMask,
        actual: BufferMask,
    },

    #[error("Invalid pipeline state: {0}")]
    InvalidState(String),

    #[error("Callback failed: {0}")]
    Callback(String),

    #[error(transparent)]
    Core(#[from] scanline_core::Error),
}

impl GraphError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a callback error; for use inside unpack/pack closures.
    pub fn callback(msg: impl Into<String>) -> Self {
        Self::Callback(msg.into())
    }
}

/// Result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Lifecycle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Graph built, buffers not sized.
    Unscheduled,
    /// Every edge has a mask; nothing has run.
    Sized,
    /// Rows are being produced.
    Running,
    /// Every output row of every tile has been produced.
    Complete,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unscheduled => "unscheduled",
            Self::Sized => "sized",
            Self::Running => "running",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Common imports.
pub mod prelude {
    pub use crate::{
        ColRange, FilterFlags, FilterGraph, GraphBuilder, GraphError, GraphResult, ImageFilter,
        PipelineState, RowRange, Schedule, SchedulerConfig, StageSupport, SupportWindow, TileWidth,
        VerticalScale,
    };
}
