//! Filter chain construction and validation.

use crate::config::SchedulerConfig;
use crate::filter::ImageFilter;
use crate::schedule::Schedule;
use crate::{GraphError, GraphResult, PipelineState};
use scanline_core::{ImageAttributes, MAX_PLANES};
use std::sync::Arc;
use tracing::debug;

/// Collects stages and checks that neighbours agree on plane shapes.
///
/// # Example
///
/// ```ignore
/// let graph = GraphBuilder::new(source, 3)
///     .add(VerticalBoxBlur::new(source, 2)?)?
///     .build()?;
/// ```
pub struct GraphBuilder {
    source: ImageAttributes,
    planes: usize,
    stages: Vec<Arc<dyn ImageFilter>>,
}

impl GraphBuilder {
    /// Starts a chain reading `planes` planes shaped like `source`.
    pub fn new(source: ImageAttributes, planes: usize) -> Self {
        Self {
            source,
            planes,
            stages: Vec::new(),
        }
    }

    /// Shape produced by the chain so far.
    pub fn output_attributes(&self) -> ImageAttributes {
        self.stages.last().map_or(self.source, |s| s.attributes())
    }

    /// Appends a stage.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DimensionMismatch`] if the stage's input shape differs
    ///   from the current output shape.
    /// - [`GraphError::Configuration`] for a zero-sized plane, a color stage
    ///   on fewer than three planes, or a stage whose row requirements cannot
    ///   be met.
    pub fn add(self, filter: impl ImageFilter + 'static) -> GraphResult<Self> {
        self.add_shared(Arc::new(filter))
    }

    /// Appends a stage that is already shared.
    pub fn add_shared(mut self, filter: Arc<dyn ImageFilter>) -> GraphResult<Self> {
        let expected = self.output_attributes();
        let actual = filter.input_attributes();
        check_dimensions("source", &self.source)?;
        check_dimensions(filter.name(), &actual)?;
        check_dimensions(filter.name(), &filter.attributes())?;
        if expected != actual {
            return Err(GraphError::DimensionMismatch {
                stage: filter.name().to_string(),
                expected,
                actual,
            });
        }
        if filter.flags().color && self.planes < 3 {
            return Err(GraphError::config(format!(
                "color stage '{}' needs 3 planes, graph has {}",
                filter.name(),
                self.planes
            )));
        }
        check_row_requirements(filter.as_ref())?;

        debug!(
            stage = filter.name(),
            index = self.stages.len(),
            support = ?filter.support(),
            "added stage"
        );
        self.stages.push(filter);
        Ok(self)
    }

    /// Finishes the chain.
    ///
    /// # Errors
    ///
    /// [`GraphError::Configuration`] for an empty chain, a zero-sized source
    /// or a plane count outside `1..=4`.
    pub fn build(self) -> GraphResult<FilterGraph> {
        check_dimensions("source", &self.source)?;
        if self.stages.is_empty() {
            return Err(GraphError::config("filter chain is empty"));
        }
        if self.planes == 0 || self.planes > MAX_PLANES {
            return Err(GraphError::config(format!(
                "{} planes requested, 1..={} supported",
                self.planes, MAX_PLANES
            )));
        }
        Ok(FilterGraph {
            source: self.source,
            planes: self.planes,
            stages: self.stages,
        })
    }
}

fn check_dimensions(what: &str, attr: &ImageAttributes) -> GraphResult<()> {
    if attr.width == 0 || attr.height == 0 {
        return Err(GraphError::config(format!(
            "{what} plane is {}x{}",
            attr.width, attr.height
        )));
    }
    Ok(())
}

/// Rejects stages that ask for rows outside their input plane.
///
/// Only the first and last output rows are probed; ranges are required to be
/// monotonic, so everything in between lies inside those bounds.
fn check_row_requirements(filter: &dyn ImageFilter) -> GraphResult<()> {
    if filter.simultaneous_lines() == 0 {
        return Err(GraphError::config(format!(
            "stage '{}' produces zero lines per call",
            filter.name()
        )));
    }
    let input = filter.input_attributes().height;
    let output = filter.attributes().height;
    for row in [0, output - 1] {
        let range = filter.required_row_range(row);
        if range.is_empty() || range.bottom > input {
            return Err(GraphError::config(format!(
                "stage '{}' needs input rows {}..{} for row {}, input has {} rows",
                filter.name(),
                range.top,
                range.bottom,
                row,
                input
            )));
        }
    }
    Ok(())
}

/// A validated, immutable chain of stages.
///
/// Cloning is cheap; stages are shared.
#[derive(Clone)]
pub struct FilterGraph {
    source: ImageAttributes,
    planes: usize,
    stages: Vec<Arc<dyn ImageFilter>>,
}

impl FilterGraph {
    /// Shape of the caller's input planes.
    pub fn input_attributes(&self) -> ImageAttributes {
        self.source
    }

    /// Shape of the caller's output planes.
    pub fn output_attributes(&self) -> ImageAttributes {
        self.stages.last().map_or(self.source, |s| s.attributes())
    }

    /// Shape of edge `edge` (0 = input, `len()` = output).
    pub fn edge_attributes(&self, edge: usize) -> ImageAttributes {
        match edge {
            0 => self.source,
            e => self.stages[e - 1].attributes(),
        }
    }

    /// Planes carried on every edge.
    pub fn planes(&self) -> usize {
        self.planes
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false for a built graph.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The stages in order.
    pub fn stages(&self) -> &[Arc<dyn ImageFilter>] {
        &self.stages
    }

    /// A built graph has no buffer sizes yet.
    pub fn state(&self) -> PipelineState {
        PipelineState::Unscheduled
    }

    /// Sizes every edge and plans column tiles.
    ///
    /// # Errors
    ///
    /// [`GraphError::Configuration`] if `config` is invalid.
    pub fn schedule(&self, config: &SchedulerConfig) -> GraphResult<Schedule> {
        Schedule::new(self.clone(), config.clone())
    }
}

impl std::fmt::Debug for FilterGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterGraph")
            .field("source", &self.source)
            .field("planes", &self.planes)
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{WindowFilter, attr};
    use crate::{FilterFlags, RowRange, SupportWindow};
    use scanline_core::PixelType;

    #[test]
    fn test_empty_chain_rejected() {
        let err = GraphBuilder::new(attr(16, 16), 1).build().unwrap_err();
        assert!(matches!(err, GraphError::Configuration(_)));
    }

    #[test]
    fn test_plane_count_rejected() {
        let a = attr(16, 16);
        let err = GraphBuilder::new(a, 5)
            .add(WindowFilter::new(a, SupportWindow::POINT))
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::Configuration(_)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = GraphBuilder::new(attr(16, 16), 1)
            .add(WindowFilter::new(attr(16, 8), SupportWindow::POINT))
            .err()
            .unwrap();
        match err {
            GraphError::DimensionMismatch { expected, actual, .. } => {
                assert_eq!(expected.height, 16);
                assert_eq!(actual.height, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pixel_type_mismatch() {
        let bytes = ImageAttributes::new(16, 16, PixelType::Byte).unwrap();
        let result = GraphBuilder::new(bytes, 1).add(WindowFilter::new(attr(16, 16), SupportWindow::POINT));
        assert!(matches!(result, Err(GraphError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_color_stage_needs_three_planes() {
        let a = attr(16, 16);
        let color = WindowFilter::new(a, SupportWindow::POINT).with_flags(FilterFlags::NONE.with_color());
        assert!(GraphBuilder::new(a, 1).add(color.clone()).is_err());
        assert!(GraphBuilder::new(a, 3).add(color).is_ok());
    }

    #[test]
    fn test_out_of_plane_rows_rejected() {
        let a = attr(16, 16);
        let bad = WindowFilter::new(a, SupportWindow::POINT).with_range(|_| RowRange::new(0, 17));
        let err = GraphBuilder::new(a, 1).add(bad).err().unwrap();
        assert!(err.to_string().contains("input has 16 rows"));
    }

    #[test]
    fn test_zero_height_rejected() {
        let a = ImageAttributes {
            height: 0,
            ..attr(16, 16)
        };
        let err = GraphBuilder::new(a, 1)
            .add(WindowFilter::new(a, SupportWindow::POINT))
            .err()
            .unwrap();
        assert!(matches!(err, GraphError::Configuration(_)));
        assert!(err.to_string().contains("16x0"));
    }

    #[test]
    fn test_zero_width_rejected() {
        let a = ImageAttributes {
            width: 0,
            ..attr(16, 16)
        };
        let err = GraphBuilder::new(a, 1)
            .add(WindowFilter::new(a, SupportWindow::POINT))
            .err()
            .unwrap();
        assert!(matches!(err, GraphError::Configuration(_)));
        assert!(GraphBuilder::new(a, 1).build().is_err());
    }

    #[test]
    fn test_zero_sized_stage_output_rejected() {
        let a = attr(16, 16);
        let empty = ImageAttributes { height: 0, ..a };
        let shrink = WindowFilter::resampling(a, empty, SupportWindow::POINT);
        let err = GraphBuilder::new(a, 1).add(shrink).err().unwrap();
        assert!(err.to_string().contains("window plane is 16x0"));
    }

    #[test]
    fn test_chain_shapes() {
        let a = attr(16, 16);
        let graph = GraphBuilder::new(a, 2)
            .add(WindowFilter::new(a, SupportWindow::POINT))
            .unwrap()
            .add(WindowFilter::new(a, SupportWindow::symmetric(2)))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.planes(), 2);
        assert_eq!(graph.edge_attributes(2), a);
        assert_eq!(graph.state(), PipelineState::Unscheduled);
        assert!(format!("{graph:?}").contains("window"));
    }
}
