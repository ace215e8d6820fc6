//! # scanline-ops
//!
//! Reference stages for scanline filter graphs.
//!
//! Each stage implements [`ImageFilter`](scanline_graph::ImageFilter) and
//! declares its vertical reach, so the scheduler can size the buffers
//! between them. The arithmetic is kept simple on purpose; these stages
//! exist to exercise every scheduling path.
//!
//! # Modules
//!
//! - [`copy`] - Point copy of any pixel type
//! - [`blur`] - Vertical box blur (symmetric window)
//! - [`resize`] - Vertical resampling (scale ratio)
//! - [`depth`] - Pixel type and bit depth conversion
//! - [`matrix`] - 3x3 matrix across three planes (color stage)
//! - [`normalize`] - Whole-plane min/max normalization (barrier)
//!
//! # Example
//!
//! ```rust,ignore
//! use scanline_graph::{GraphBuilder, SchedulerConfig};
//! use scanline_ops::{VerticalBoxBlur, VerticalResize, ResampleFilter};
//!
//! let graph = GraphBuilder::new(source, 3)
//!     .add(VerticalBoxBlur::new(source, 2)?)?
//!     .add(VerticalResize::new(source, 540, ResampleFilter::Lanczos3)?)?
//!     .build()?;
//! let schedule = graph.schedule(&SchedulerConfig::default())?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod blur;
pub mod copy;
pub mod depth;
pub mod matrix;
pub mod normalize;
pub mod resize;

#[cfg(test)]
pub(crate) mod testing;

pub use blur::VerticalBoxBlur;
pub use copy::CopyFilter;
pub use depth::ConvertDepth;
pub use error::{OpsError, OpsResult};
pub use matrix::PlaneMatrix;
pub use normalize::NormalizePlane;
pub use resize::{ResampleFilter, VerticalResize};
