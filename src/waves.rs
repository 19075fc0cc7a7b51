//! Breadth first "wave" propagation over a rectangular lattice.
//!
//! A wave is the sequence of frontiers reached from a set of sources: frontier
//! `k` holds every coordinate at `k` hops from the nearest source, where a hop
//! is an orthogonal step accepted by a caller supplied predicate. Frontiers are
//! produced lazily so callers can stop as soon as they have their answer.

use bit_set::BitSet;

use crate::cells::{Direction, GridCoordinate};
use crate::lattice::Lattice;
use crate::units::{Height, Width};


/// One frontier of a wave.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Wave {
    /// Hop distance from the sources.
    pub index: usize,
    pub cells: Vec<GridCoordinate>,
}

/// Reusable wave propagation state for lattices of one particular size.
///
/// The visited set persists between computations until `clear` is called, so
/// several waves can share it (for example to label connected regions one
/// after another) and it can be inspected once a wave has been consumed.
#[derive(Clone, Debug)]
pub struct WaveProcessor {
    width: usize,
    height: usize,
    visited: BitSet,
}

impl WaveProcessor {
    pub fn new(width: Width, height: Height) -> WaveProcessor {
        let (Width(w), Height(h)) = (width, height);
        WaveProcessor {
            width: w,
            height: h,
            visited: BitSet::with_capacity(w * h),
        }
    }

    pub fn for_lattice(lattice: &Lattice) -> WaveProcessor {
        WaveProcessor::new(Width(lattice.width()), Height(lattice.height()))
    }

    /// Forget every visited coordinate. Keeps the allocation.
    pub fn clear(&mut self) {
        self.visited.clear();
    }

    #[inline]
    pub fn is_visited(&self, coord: GridCoordinate) -> bool {
        self.index_of(coord).map_or(false, |i| self.visited.contains(i))
    }

    #[inline]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Waves from `sources` where a coordinate may be entered when
    /// `passable(coord)` holds. Frontier 0 is the deduplicated sources themselves,
    /// passable or not. Sources outside the processor's extents are ignored.
    pub fn compute_waves<'p, F>(&'p mut self,
                                sources: &[GridCoordinate],
                                mut passable: F)
                                -> Waves<'p, impl FnMut(GridCoordinate, GridCoordinate) -> bool>
        where F: FnMut(GridCoordinate) -> bool
    {
        self.compute_waves_along(sources, move |_, to| passable(to))
    }

    /// Waves from `sources` where a step from `from` to its orthogonal neighbour
    /// `to` is taken when `crossable(from, to)` holds. Use this to walk an
    /// existing connection graph rather than open space.
    pub fn compute_waves_along<F>(&mut self, sources: &[GridCoordinate], crossable: F) -> Waves<'_, F>
        where F: FnMut(GridCoordinate, GridCoordinate) -> bool
    {
        let mut first = Vec::with_capacity(sources.len());
        for &source in sources {
            if let Some(i) = self.index_of(source) {
                if !first.contains(&source) {
                    self.visited.insert(i);
                    first.push(source);
                }
            }
        }

        Waves {
            processor: self,
            crossable,
            frontier: first,
            index: 0,
        }
    }

    #[inline]
    fn index_of(&self, coord: GridCoordinate) -> Option<usize> {
        if coord.x >= 0 && coord.y >= 0 && (coord.x as usize) < self.width &&
           (coord.y as usize) < self.height {
            Some(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }
}

/// Lazy iterator over the frontiers of one wave computation.
pub struct Waves<'p, F> {
    processor: &'p mut WaveProcessor,
    crossable: F,
    // The frontier to hand out next; its successors are only computed on demand.
    frontier: Vec<GridCoordinate>,
    index: usize,
}

impl<'p, F> Waves<'p, F>
    where F: FnMut(GridCoordinate, GridCoordinate) -> bool
{
    fn expand(&mut self, from: &[GridCoordinate]) -> Vec<GridCoordinate> {
        let mut next = Vec::new();
        for &coord in from {
            for dir in Direction::ALL.iter() {
                let neighbour = coord.offset(*dir);
                if let Some(i) = self.processor.index_of(neighbour) {
                    if !self.processor.visited.contains(i) && (self.crossable)(coord, neighbour) {
                        self.processor.visited.insert(i);
                        next.push(neighbour);
                    }
                }
            }
        }
        // Lattice scan order, so wave contents are reproducible
        next.sort_unstable_by_key(|c| (c.y, c.x));
        next
    }
}

impl<'p, F> Iterator for Waves<'p, F>
    where F: FnMut(GridCoordinate, GridCoordinate) -> bool
{
    type Item = Wave;

    fn next(&mut self) -> Option<Self::Item> {
        if self.frontier.is_empty() {
            return None;
        }
        let current = std::mem::take(&mut self.frontier);
        self.frontier = self.expand(&current);
        let wave = Wave {
            index: self.index,
            cells: current,
        };
        self.index += 1;
        Some(wave)
    }
}
