//! Random walk carving of a single layer.
//!
//! The walk extends a single path from a starting cell, one orthogonal step at a
//! time, never entering an occupied slot. Before branching it floods the empty
//! space from the first candidate target: if the other candidates can't be
//! reached that way, taking any of them would wall off part of the lattice for
//! good, so the walk backs up instead. Dead ends are rolled back the same way.
//! The layer is done once every slot, or every slot bar one, is occupied.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use tracing::{debug, info, trace};

use crate::cells::{Cell, CellDescriptor, CoordinateSmallVec, Direction, DirectionSmallVec,
                   GridCoordinate, PrimitiveKind};
use crate::config::{FloatRange, LayerConfig};
use crate::errors::*;
use error_chain::bail;
use crate::lattice::{Lattice, LatticeError};
use crate::units::{Height, LayerIndex, Width};
use crate::visuals::Visuals;
use crate::waves::WaveProcessor;

const START_ELEVATION: f32 = 0.1;
const ROTATIONS: [u16; 3] = [90, 180, 270];

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum GenerationState {
    Processing,
    /// The lattice is full, or full bar one slot.
    Success,
    /// The step budget ran out first.
    Exhausted,
    /// A rollback was needed at the starting cell.
    Fail,
}

impl GenerationState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        self != GenerationState::Processing
    }
}

/// What a single call to `LayerGenerator::step` did.
#[derive(PartialEq, Copy, Clone, Debug)]
pub enum StepEvent {
    Carved {
        from: GridCoordinate,
        to: GridCoordinate,
        direction: Direction,
    },
    /// Branching here would have cut the empty space in two.
    SplitRejected {
        removed: GridCoordinate,
        back_to: GridCoordinate,
    },
    DeadEnd {
        removed: GridCoordinate,
        back_to: GridCoordinate,
    },
    Finished(GenerationState),
}

#[derive(PartialEq, Copy, Clone, Debug)]
pub struct GenerationReport {
    pub state: GenerationState,
    pub steps: u64,
    pub blocks: usize,
    pub size: usize,
    pub start: GridCoordinate,
}

impl GenerationReport {
    pub fn fill_ratio(&self) -> f32 {
        if self.size == 0 {
            0.0
        } else {
            self.blocks as f32 / self.size as f32
        }
    }

    /// Turn a non successful report into the matching error for `layer`.
    pub fn into_result(self, layer: LayerIndex) -> Result<GenerationReport> {
        match self.state {
            GenerationState::Success => Ok(self),
            GenerationState::Fail => bail!(ErrorKind::GenerationFailed(layer.0)),
            GenerationState::Processing | GenerationState::Exhausted => {
                bail!(ErrorKind::GenerationExhausted(layer.0, self.steps))
            }
        }
    }
}

pub struct LayerGenerator {
    config: LayerConfig,
    lattice: Lattice,
    waves: WaveProcessor,
    rng: XorShiftRng,
    pointer: GridCoordinate,
    start: GridCoordinate,
    step: u64,
    state: GenerationState,
}

impl LayerGenerator {
    /// Seed the generator from `config` and place the starting cell.
    pub fn new(config: LayerConfig, visuals: &mut dyn Visuals) -> Result<LayerGenerator> {
        config.validate()?;
        let mut rng = XorShiftRng::seed_from_u64(config.seed);
        let start = match config.start_coordinate() {
            Some(start) => start,
            None => {
                let x = rng.gen_range(0..config.width as i32);
                let y = rng.gen_range(0..config.height as i32);
                GridCoordinate::new(x, y)
            }
        };

        let lattice = Lattice::new(Width(config.width), Height(config.height));
        let waves = WaveProcessor::for_lattice(&lattice);
        let mut generator = LayerGenerator {
            config,
            lattice,
            waves,
            rng,
            pointer: start,
            start,
            step: 0,
            state: GenerationState::Processing,
        };

        info!(seed = generator.config.seed,
              width = generator.config.width,
              height = generator.config.height,
              start = %start,
              "generating maze layer");

        generator.place(start, FloatRange::constant(START_ELEVATION), visuals)?;
        generator.step = 1;
        Ok(generator)
    }

    /// Continue carving on an existing lattice from `pointer`, which must be
    /// occupied and hold at most one connection. Nothing is placed.
    pub fn resume(config: LayerConfig, lattice: Lattice, pointer: GridCoordinate) -> Result<LayerGenerator> {
        if lattice.get(pointer).is_none() {
            return Err(LatticeError::MissingCell(pointer).into());
        }
        let rng = XorShiftRng::seed_from_u64(config.seed);
        let waves = WaveProcessor::for_lattice(&lattice);
        Ok(LayerGenerator {
            config,
            lattice,
            waves,
            rng,
            pointer,
            start: pointer,
            step: 0,
            state: GenerationState::Processing,
        })
    }

    #[inline]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn into_lattice(self) -> Lattice {
        self.lattice
    }

    #[inline]
    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    #[inline]
    pub fn pointer(&self) -> GridCoordinate {
        self.pointer
    }

    #[inline]
    pub fn start(&self) -> GridCoordinate {
        self.start
    }

    #[inline]
    pub fn state(&self) -> GenerationState {
        self.state
    }

    /// Steps charged so far, including split test flood fills.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn report(&self) -> GenerationReport {
        GenerationReport {
            state: self.state,
            steps: self.step,
            blocks: self.lattice.blocks_count(),
            size: self.lattice.size(),
            start: self.start,
        }
    }

    /// Run `step` until a terminal state.
    pub fn generate(&mut self, visuals: &mut dyn Visuals) -> Result<GenerationReport> {
        while !self.state.is_terminal() {
            self.step(visuals)?;
        }
        let report = self.report();
        debug!(state = ?report.state,
               steps = report.steps,
               blocks = report.blocks,
               size = report.size,
               "layer generation finished");
        Ok(report)
    }

    /// Advance the walk by one carve or one rollback.
    pub fn step(&mut self, visuals: &mut dyn Visuals) -> Result<StepEvent> {
        if self.state.is_terminal() {
            return Ok(StepEvent::Finished(self.state));
        }

        if let Some(max_steps) = self.config.success.steps.upper_bound() {
            if self.step >= max_steps {
                return Ok(self.finish(GenerationState::Exhausted));
            }
        }

        let available = self.available_directions();

        if available.len() > 1 {
            let targets = available.iter()
                                   .map(|dir| self.pointer.offset(*dir))
                                   .collect::<CoordinateSmallVec>();
            if self.has_split(&targets) {
                return match self.roll_back(visuals)? {
                    Some((removed, back_to)) => {
                        trace!(removed = %removed, back_to = %back_to, "split rejected");
                        Ok(StepEvent::SplitRejected { removed, back_to })
                    }
                    None => Ok(self.finish(GenerationState::Fail)),
                };
            }
        }

        let direction = match available.choose(&mut self.rng) {
            Some(dir) => *dir,
            None => {
                let (blocks, size) = (self.lattice.blocks_count(), self.lattice.size());
                if blocks == size || blocks + 1 == size {
                    return Ok(self.finish(GenerationState::Success));
                }
                return match self.roll_back(visuals)? {
                    Some((removed, back_to)) => Ok(StepEvent::DeadEnd { removed, back_to }),
                    None => Ok(self.finish(GenerationState::Fail)),
                };
            }
        };

        let from = self.pointer;
        let to = from.offset(direction);
        if let Some(cell) = self.lattice.get_mut(from) {
            cell.mark_explored(direction);
        }
        let elevation = self.config.platform_elevation;
        self.place(to, elevation, visuals)?;
        self.lattice.connect(to, from)?;
        self.pointer = to;
        self.step += 1;

        Ok(StepEvent::Carved { from, to, direction })
    }

    fn finish(&mut self, state: GenerationState) -> StepEvent {
        self.state = state;
        StepEvent::Finished(state)
    }

    // Directions from the pointer into empty slots not yet tried from it.
    fn available_directions(&self) -> DirectionSmallVec {
        let cell = match self.lattice.get(self.pointer) {
            Some(cell) => cell,
            None => return DirectionSmallVec::new(),
        };
        Direction::ALL
            .iter()
            .cloned()
            .filter(|dir| !cell.is_explored(*dir) && self.lattice.is_vacant(self.pointer.offset(*dir)))
            .collect()
    }

    // Flood the empty space from the first target and see whether it touches
    // every other target. Each frontier's size is charged to the step counter.
    fn has_split(&mut self, targets: &[GridCoordinate]) -> bool {
        debug_assert!(targets.len() > 1);
        let lattice = &self.lattice;
        let mut contacts = targets.len() - 1;
        let mut charged = 0u64;
        let mut split = true;

        self.waves.clear();
        for wave in self.waves.compute_waves(&targets[..1], |coord| lattice.is_vacant(coord)) {
            charged += wave.cells.len() as u64;
            if wave.index == 0 {
                continue;
            }
            let reached = wave.cells.iter().filter(|coord| targets[1..].contains(*coord)).count();
            contacts = contacts.saturating_sub(reached);
            if contacts == 0 {
                split = false;
                break;
            }
        }

        self.step += charged;
        split
    }

    // Remove the pointer's cell and step back along its one connection.
    // None when the pointer has nowhere to go back to; the cell then stays.
    fn roll_back(&mut self, visuals: &mut dyn Visuals) -> Result<Option<(GridCoordinate, GridCoordinate)>> {
        let removed = self.pointer;
        let back_to = {
            let cell = self.lattice.get(removed).ok_or(LatticeError::MissingCell(removed))?;
            // The walk's tip only ever holds the connection it was carved through
            debug_assert!(cell.connection_count() <= 1,
                          "rolling back {} with {} connections",
                          removed,
                          cell.connection_count());
            match cell.connected_directions().first() {
                Some(dir) => removed.offset(*dir),
                None => return Ok(None),
            }
        };

        if let Some(old) = self.lattice.set(removed, None)? {
            if let Some(handle) = old.visual {
                visuals.remove_cell(handle);
            }
        }
        self.pointer = back_to;
        self.step += 1;
        Ok(Some((removed, back_to)))
    }

    fn place(&mut self, coord: GridCoordinate, elevation: FloatRange, visuals: &mut dyn Visuals) -> Result<()> {
        let descriptor = random_descriptor(&mut self.rng, elevation);
        let mut cell = Cell::new(descriptor);
        cell.visual = Some(visuals.place_cell(coord, &descriptor));
        self.lattice.set(coord, Some(cell))?;
        Ok(())
    }
}

/// Cosmetics for a freshly carved platform, drawn in a fixed order from the
/// layer's own generator.
pub fn random_descriptor<R: Rng>(rng: &mut R, elevation: FloatRange) -> CellDescriptor {
    let hue = rng.gen::<f32>();
    let rotation_degrees = *ROTATIONS.choose(rng).unwrap_or(&ROTATIONS[0]);
    let scale = rng.gen_range(0.5..0.75);
    let elevation = elevation.sample(rng);
    CellDescriptor {
        kind: PrimitiveKind::Platform,
        elevation,
        scale,
        rotation_degrees,
        hue,
    }
}
