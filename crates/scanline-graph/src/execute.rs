//! Pull-driven execution of a schedule.
//!
//! The sink asks for the next group of output rows. Asking edge `e` for rows
//! up to `r` makes the stage producing `e` first ask its own input edge for
//! the rows its window needs, recursively down to edge 0, and only then
//! call [`ImageFilter::process`]. Producers therefore always run before
//! consumers, and every edge only ever holds the rows sizing accounted for.
//!
//! Before a stage asks for more input it releases every input row below the
//! top of its current window. The [`EdgeCounter`] of each edge checks (in
//! debug builds) that no write lands on a row that is still live.

use crate::counter::EdgeCounter;
use crate::filter::lines_at;
use crate::schedule::Schedule;
use crate::window::{ColRange, RowRange};
use crate::{GraphError, GraphResult, PipelineState};
use scanline_core::{BufferMask, ColorLineBuffer, LineBuffer, LineCount, LineStorage, MAX_PLANES, PlaneStorage};
use std::ops::Range;
use tracing::{debug, trace};

type UnpackFn<'a> = Box<dyn FnMut(u32, ColRange) -> GraphResult<()> + 'a>;
type PackFn<'a> = Box<dyn FnMut(RowRange, ColRange) -> GraphResult<()> + 'a>;

/// One run of a [`Schedule`] over caller buffers.
///
/// # Example
///
/// ```ignore
/// let mut exec = schedule
///     .execution(input, output)
///     .with_unpack(|row, cols| {
///         decoder.read_row(row, cols)?; // fills input row `row`
///         Ok(())
///     })
///     .with_pack(|rows, cols| {
///         encoder.write_rows(rows, cols)?; // drains output rows
///         Ok(())
///     });
/// exec.run()?;
/// ```
pub struct Execution<'a> {
    schedule: &'a Schedule,
    input: ColorLineBuffer<u8>,
    output: ColorLineBuffer<u8>,
    unpack: Option<UnpackFn<'a>>,
    pack: Option<PackFn<'a>>,
    tiles: Range<usize>,
    tile: usize,
    next_row: u32,
    storage: Vec<LineStorage>,
    buffers: Vec<ColorLineBuffer<u8>>,
    masks: Vec<BufferMask>,
    counters: Vec<EdgeCounter>,
    contexts: Vec<Scratch>,
    scratch: Vec<Scratch>,
    state: PipelineState,
    failed: bool,
}

/// Aligned per-stage bytes, exposed at their requested length.
struct Scratch {
    storage: PlaneStorage,
    len: usize,
}

impl Scratch {
    fn new(len: usize) -> GraphResult<Self> {
        Ok(Self {
            storage: PlaneStorage::new(len, 1, BufferMask::SINGLE)?,
            len,
        })
    }

    #[inline]
    fn bytes(&mut self) -> &mut [u8] {
        &mut self.storage.as_bytes_mut()[..self.len]
    }
}

impl<'a> Execution<'a> {
    pub(crate) fn new(schedule: &'a Schedule, input: ColorLineBuffer<u8>, output: ColorLineBuffer<u8>) -> Self {
        Self::for_tiles(schedule, input, output, 0..schedule.tiles().len())
    }

    pub(crate) fn for_tiles(
        schedule: &'a Schedule,
        input: ColorLineBuffer<u8>,
        output: ColorLineBuffer<u8>,
        tiles: Range<usize>,
    ) -> Self {
        Self {
            schedule,
            input,
            output,
            unpack: None,
            pack: None,
            tile: tiles.start,
            tiles,
            next_row: 0,
            storage: Vec::new(),
            buffers: Vec::new(),
            masks: Vec::new(),
            counters: Vec::new(),
            contexts: Vec::new(),
            scratch: Vec::new(),
            state: PipelineState::Sized,
            failed: false,
        }
    }

    /// Calls `f(row, columns)` once per input row per tile, right before the
    /// row is first read. The input buffer then only needs
    /// [`Schedule::input_mask`].
    pub fn with_unpack<F>(mut self, f: F) -> Self
    where
        F: FnMut(u32, ColRange) -> GraphResult<()> + 'a,
    {
        self.unpack = Some(Box::new(f));
        self
    }

    /// Calls `f(rows, columns)` once per completed output row group. The
    /// output buffer then only needs [`Schedule::output_mask`].
    pub fn with_pack<F>(mut self, f: F) -> Self
    where
        F: FnMut(RowRange, ColRange) -> GraphResult<()> + 'a,
    {
        self.pack = Some(Box::new(f));
        self
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Index of the tile being produced.
    pub fn current_tile(&self) -> usize {
        self.tile
    }

    /// Next output row of the current tile.
    pub fn next_row(&self) -> u32 {
        self.next_row
    }

    /// Produces the next output row group.
    ///
    /// Returns `Ok(false)` once every row of every tile is done.
    ///
    /// # Errors
    ///
    /// - [`GraphError::BufferTooSmall`] or [`GraphError::Configuration`] on
    ///   the first step if a caller buffer cannot serve the schedule.
    /// - Any error returned by a callback. The execution is unusable
    ///   afterwards and further steps return [`GraphError::InvalidState`].
    pub fn step(&mut self) -> GraphResult<bool> {
        if self.failed {
            return Err(GraphError::InvalidState("execution failed earlier".into()));
        }
        let result = match self.state {
            PipelineState::Complete => return Ok(false),
            PipelineState::Unscheduled => return Err(GraphError::InvalidState("graph not scheduled".into())),
            PipelineState::Sized => self.prepare().and_then(|_| self.step_rows()),
            PipelineState::Running => self.step_rows(),
        };
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    /// Steps until complete.
    #[tracing::instrument(skip_all, fields(tiles = self.tiles.len()))]
    pub fn run(&mut self) -> GraphResult<()> {
        while self.step()? {}
        Ok(())
    }

    fn prepare(&mut self) -> GraphResult<()> {
        let schedule = self.schedule;
        let graph = schedule.graph();
        let planes = graph.planes();
        let last = graph.len();

        if self.tiles.is_empty() {
            return Err(GraphError::InvalidState("no tiles to run".into()));
        }
        self.check_caller_buffer(0, self.input, self.unpack.is_some())?;
        self.check_caller_buffer(last, self.output, self.pack.is_some())?;

        self.buffers = Vec::with_capacity(last + 1);
        self.masks = Vec::with_capacity(last + 1);
        self.buffers.push(restrict(self.input, planes));
        self.masks.push(if self.unpack.is_some() {
            schedule.edge(0).mask
        } else {
            BufferMask::Unbounded
        });
        for edge in &schedule.edges()[1..last] {
            let mut storage = LineStorage::new(&edge.attributes, planes, edge.mask)?;
            self.buffers.push(storage.buffer());
            self.masks.push(edge.mask);
            self.storage.push(storage);
        }
        self.buffers.push(restrict(self.output, planes));
        self.masks.push(if self.pack.is_some() {
            schedule.edge(last).mask
        } else {
            BufferMask::Unbounded
        });

        self.counters = (0..=last).map(|_| EdgeCounter::new()).collect();
        self.contexts = graph
            .stages()
            .iter()
            .map(|s| Scratch::new(s.context_size()))
            .collect::<GraphResult<_>>()?;
        self.scratch = graph
            .stages()
            .iter()
            .enumerate()
            .map(|(s, stage)| {
                let size = schedule.tiles()[self.tiles.clone()]
                    .iter()
                    .map(|t| {
                        let cols = t.edge(s + 1);
                        stage.tmp_size(cols.left, cols.right)
                    })
                    .max()
                    .unwrap_or(0);
                Scratch::new(size)
            })
            .collect::<GraphResult<_>>()?;

        for (stage, ctx) in graph.stages().iter().zip(self.contexts.iter_mut()) {
            stage.init_context(ctx.bytes());
        }

        debug!(
            internal_bytes = self.storage.iter().map(LineStorage::byte_len).sum::<usize>(),
            tiles = self.tiles.len(),
            "execution prepared"
        );
        self.state = PipelineState::Running;
        self.begin_tile(false);
        Ok(())
    }

    /// Checks that a caller buffer has every plane, a ring-shaped mask and
    /// enough rows.
    fn check_caller_buffer(&self, edge: usize, buf: ColorLineBuffer<u8>, streamed: bool) -> GraphResult<()> {
        let plan = self.schedule.edge(edge);
        let side = if edge == 0 { "input" } else { "output" };
        let frame = LineCount::Finite(plan.attributes.height);

        for p in 0..self.schedule.graph().planes() {
            let plane = buf[p];
            if plane.is_null() {
                return Err(GraphError::config(format!("{side} plane {p} is null")));
            }
            let actual = plane.mask();
            if !actual.is_valid() {
                return Err(GraphError::config(format!(
                    "{side} plane {p} mask {actual} is not one less than a power of two"
                )));
            }
            let fits = actual.holds(frame) || (streamed && actual.covers(plan.mask));
            if !fits {
                return Err(GraphError::BufferTooSmall {
                    edge,
                    required: if streamed { plan.mask } else { BufferMask::Unbounded },
                    actual,
                });
            }
        }
        Ok(())
    }

    fn begin_tile(&mut self, reinit: bool) {
        self.next_row = 0;
        for counter in &self.counters {
            counter.reset();
        }
        if reinit {
            let stages = self.schedule.graph().stages();
            for (stage, ctx) in stages.iter().zip(self.contexts.iter_mut()) {
                if stage.flags().has_state {
                    let bytes = ctx.bytes();
                    bytes.fill(0);
                    stage.init_context(bytes);
                }
            }
        }
        trace!(tile = self.tile, columns = ?self.schedule.tiles()[self.tile].output(), "begin tile");
    }

    fn step_rows(&mut self) -> GraphResult<bool> {
        let schedule = self.schedule;
        let sink = schedule.graph().len();
        let height = schedule.edge(sink).attributes.height;
        let top = self.next_row;
        let end = top.saturating_add(schedule.config().row_group).min(height);

        self.counters[sink].release_to(top);
        self.generate(sink, end)?;
        if let Some(pack) = self.pack.as_mut() {
            pack(RowRange::new(top, end), schedule.tiles()[self.tile].output())?;
        }
        self.next_row = end;

        if end == height {
            self.tile += 1;
            if self.tile == self.tiles.end {
                self.state = PipelineState::Complete;
                debug!(tiles = self.tiles.len(), rows = height, "execution complete");
                return Ok(false);
            }
            self.begin_tile(true);
        }
        Ok(true)
    }

    /// Makes rows `..upto` of `edge` available.
    fn generate(&mut self, edge: usize, upto: u32) -> GraphResult<()> {
        if edge == 0 {
            return self.unpack_to(upto);
        }

        let schedule = self.schedule;
        let stage = edge - 1;
        let filter = schedule.graph().stages()[stage].as_ref();
        let height = schedule.edge(edge).attributes.height;
        let cols = schedule.tiles()[self.tile].edge(edge);

        while self.counters[edge].produced() < upto {
            let row = self.counters[edge].produced();
            let n = lines_at(filter, row, height);
            let first = filter.required_row_range(row);
            let last = filter.required_row_range(row + n - 1);
            debug_assert!(last.bottom <= schedule.edge(stage).attributes.height);

            self.counters[stage].release_to(first.top);
            self.generate(stage, last.bottom)?;

            debug_assert!(
                self.counters[edge].can_produce(n, self.masks[edge]),
                "edge {edge}: writing rows {row}..{} would overwrite live rows",
                row + n
            );
            trace!(stage = filter.name(), row, lines = n, "process");
            filter.process(
                self.contexts[stage].bytes(),
                &self.buffers[stage],
                &self.buffers[edge],
                self.scratch[stage].bytes(),
                row,
                cols.left,
                cols.right,
            );
            self.counters[edge].publish(n);
        }
        Ok(())
    }

    fn unpack_to(&mut self, upto: u32) -> GraphResult<()> {
        let counter = &self.counters[0];
        let Some(unpack) = self.unpack.as_mut() else {
            let produced = counter.produced();
            if upto > produced {
                counter.publish(upto - produced);
            }
            return Ok(());
        };

        let cols = self.schedule.tiles()[self.tile].input();
        while counter.produced() < upto {
            let row = counter.produced();
            debug_assert!(counter.can_produce(1, self.masks[0]));
            unpack(row, cols)?;
            counter.publish(1);
        }
        Ok(())
    }
}

/// Nulls every plane past `planes` so stages see exactly the graph's planes.
fn restrict(buf: ColorLineBuffer<u8>, planes: usize) -> ColorLineBuffer<u8> {
    let mut out = buf;
    for p in planes..MAX_PLANES {
        out[p] = LineBuffer::null();
    }
    out
}
