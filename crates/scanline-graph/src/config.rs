//! Scheduler configuration.

use crate::{GraphError, GraphResult};

/// Default working-set budget for automatic tiling (1 MiB, a typical L2).
pub const DEFAULT_CACHE_SIZE: usize = 1024 * 1024;

/// Column tiling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileWidth {
    /// One tile spanning the whole row.
    Full,
    /// Tiles of a fixed number of output columns; the last may be narrower.
    Fixed(u32),
    /// Derived from [`SchedulerConfig::cache_size`].
    #[default]
    Auto,
}

/// Knobs for sizing and running a schedule.
///
/// # Example
///
/// ```
/// use scanline_graph::{SchedulerConfig, TileWidth};
///
/// let config = SchedulerConfig::default()
///     .with_tile_width(TileWidth::Fixed(256))
///     .with_row_group(2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    /// Column tiling policy.
    pub tile_width: TileWidth,
    /// Working-set budget in bytes for [`TileWidth::Auto`].
    pub cache_size: usize,
    /// Output rows pulled per step.
    pub row_group: u32,
    /// Run column tiles on the rayon pool when no callbacks are used.
    pub parallel: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tile_width: TileWidth::Auto,
            cache_size: DEFAULT_CACHE_SIZE,
            row_group: 1,
            parallel: false,
        }
    }
}

impl SchedulerConfig {
    /// Sets the tiling policy.
    pub fn with_tile_width(mut self, tile_width: TileWidth) -> Self {
        self.tile_width = tile_width;
        self
    }

    /// Sets the cache budget.
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Sets the output row group.
    pub fn with_row_group(mut self, row_group: u32) -> Self {
        self.row_group = row_group;
        self
    }

    /// Enables parallel tiles.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Rejects values the scheduler cannot work with.
    ///
    /// # Errors
    ///
    /// [`GraphError::Configuration`] for a zero row group or a zero fixed
    /// tile width.
    pub fn validate(&self) -> GraphResult<()> {
        if self.row_group == 0 {
            return Err(GraphError::config("row_group must be at least 1"));
        }
        if self.tile_width == TileWidth::Fixed(0) {
            return Err(GraphError::config("fixed tile width must be at least 1"));
        }
        Ok(())
    }
}
