//! Equivalence checks between execution modes.
//!
//! A correct graph produces the same bytes whether it runs over full
//! frames in one pass, in column tiles, in parallel, in larger row groups,
//! or streamed through bounded caller buffers with unpack/pack callbacks.
//! [`FilterValidator`] runs a graph every way and compares SHA-256 plane
//! digests against the single-pass reference.
//!
//! # Example
//!
//! ```rust,ignore
//! let report = FilterValidator::new(graph).validate()?;
//! println!("{} runs agree: {:?}", report.runs.len(), report.digests);
//! ```

use crate::frame::Frame;
use scanline_graph::{FilterGraph, GraphError, SchedulerConfig, TileWidth};
use thiserror::Error;
use tracing::debug;

/// Why validation failed.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Scheduling or execution failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Frame allocation failed.
    #[error(transparent)]
    Core(#[from] scanline_core::Error),

    /// A run produced different bytes than the reference.
    #[error("run '{run}' differs on plane {plane}: expected {expected}, got {actual}")]
    Mismatch {
        /// Label of the failing run.
        run: String,
        /// First differing plane.
        plane: usize,
        /// Reference digest.
        expected: String,
        /// Digest of the failing run.
        actual: String,
    },
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// Reference digest per output plane.
    pub digests: Vec<String>,
    /// Labels of every run that matched, reference first.
    pub runs: Vec<String>,
}

/// Runs one graph in every execution mode and compares the results.
#[derive(Debug, Clone)]
pub struct FilterValidator {
    graph: FilterGraph,
    seed: u64,
    configs: Vec<(String, SchedulerConfig)>,
}

impl FilterValidator {
    /// Validator with the default set of configurations: fixed tiles,
    /// cache-driven tiles, parallel tiles and grouped rows.
    pub fn new(graph: FilterGraph) -> Self {
        let configs = vec![
            (
                "tiled".to_string(),
                SchedulerConfig::default().with_tile_width(TileWidth::Fixed(64)),
            ),
            (
                "auto".to_string(),
                SchedulerConfig::default()
                    .with_tile_width(TileWidth::Auto)
                    .with_cache_size(16 * 1024),
            ),
            (
                "parallel".to_string(),
                SchedulerConfig::default()
                    .with_tile_width(TileWidth::Fixed(64))
                    .with_parallel(true),
            ),
            (
                "grouped".to_string(),
                SchedulerConfig::default()
                    .with_tile_width(TileWidth::Full)
                    .with_row_group(4),
            ),
        ];
        Self { graph, seed: 0x5ca1_ab1e, configs }
    }

    /// Seed for the input pattern.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Adds another configuration to compare.
    pub fn with_config(mut self, label: impl Into<String>, config: SchedulerConfig) -> Self {
        self.configs.push((label.into(), config));
        self
    }

    /// The graph under test.
    pub fn graph(&self) -> &FilterGraph {
        &self.graph
    }

    /// Runs the reference, then every configuration over full frames and
    /// streamed.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Mismatch`] for the first run that disagrees, or
    /// the error of a run that failed outright.
    pub fn validate(&self) -> Result<Validation, ValidationError> {
        let planes = self.graph.planes();
        let mut source = Frame::pattern(self.graph.input_attributes(), planes, self.seed)?;

        let reference = SchedulerConfig::default().with_tile_width(TileWidth::Full);
        let digests = self.full_frame(&mut source, &reference)?.digests();
        let mut runs = vec!["reference".to_string()];

        for (label, config) in &self.configs {
            let full = self.full_frame(&mut source, config)?;
            compare(label, &digests, &full)?;
            runs.push(label.clone());

            let label = format!("{label}/streamed");
            let streamed = self.streamed(&source, config)?;
            compare(&label, &digests, &streamed)?;
            runs.push(label);
        }
        debug!(runs = runs.len(), stages = self.graph.len(), "graph validated");
        Ok(Validation { digests, runs })
    }

    /// Whole input and output frames, no callbacks.
    pub fn full_frame(&self, source: &mut Frame, config: &SchedulerConfig) -> Result<Frame, ValidationError> {
        let schedule = self.graph.schedule(config)?;
        let mut output = Frame::new(self.graph.output_attributes(), self.graph.planes())?;
        schedule.run(source.buffer(), output.buffer())?;
        Ok(output)
    }

    /// Caller buffers at exactly the schedule's masks, filled and drained
    /// by callbacks.
    pub fn streamed(&self, source: &Frame, config: &SchedulerConfig) -> Result<Frame, ValidationError> {
        let schedule = self.graph.schedule(config)?;
        let planes = self.graph.planes();
        let input_attr = self.graph.input_attributes();
        let output_attr = self.graph.output_attributes();
        let in_size = input_attr.pixel_type.size() as u32;
        let out_size = output_attr.pixel_type.size() as u32;

        let mut input = Frame::with_mask(input_attr, planes, schedule.input_mask())?;
        let mut staging = Frame::with_mask(output_attr, planes, schedule.output_mask())?;
        let mut result = Frame::new(output_attr, planes)?;
        let (input_buf, staging_buf, result_buf) = (input.buffer(), staging.buffer(), result.buffer());

        let mut exec = schedule
            .execution(input_buf, staging_buf)
            .with_unpack(move |row, cols| {
                let (left, right) = (cols.left * in_size, cols.right * in_size);
                for p in 0..planes {
                    let src = &source.row(p, row)[left as usize..right as usize];
                    // SAFETY: the ring holds this row until it is released.
                    unsafe { input_buf[p].row_range_mut(row, left, right) }.copy_from_slice(src);
                }
                Ok(())
            })
            .with_pack(move |rows, cols| {
                let (left, right) = (cols.left * out_size, cols.right * out_size);
                for y in rows.top..rows.bottom {
                    for p in 0..planes {
                        // SAFETY: finished rows stay in the ring until the next group.
                        unsafe {
                            result_buf[p]
                                .row_range_mut(y, left, right)
                                .copy_from_slice(staging_buf[p].row_range(y, left, right));
                        }
                    }
                }
                Ok(())
            });
        exec.run()?;
        drop(exec);
        Ok(result)
    }
}

fn compare(run: &str, expected: &[String], frame: &Frame) -> Result<(), ValidationError> {
    for (plane, (want, got)) in expected.iter().zip(frame.digests()).enumerate() {
        if *want != got {
            return Err(ValidationError::Mismatch {
                run: run.to_string(),
                plane,
                expected: want.clone(),
                actual: got,
            });
        }
    }
    Ok(())
}
