use crate::cells::{Cell, CoordinateSmallVec, Direction, GridCoordinate};
use crate::units::{Height, Width};

use itertools::Itertools;
use petgraph::graph::{NodeIndex, UnGraph};
use smallvec::SmallVec;
use std::error;
use std::fmt;


/// A fixed size `width * height` array of optional cells together with the
/// connection graph between orthogonally adjacent occupied cells.
///
/// Connections are always mutual: if the cell at `a` holds `b` in the slot for
/// direction `d` then the cell at `b` holds `a` in the slot for `d.opposite()`.
/// Every mutating operation either keeps that true or is rejected before
/// touching anything.
#[derive(PartialEq, Clone, Debug)]
pub struct Lattice {
    cells: Vec<Option<Cell>>,
    width: usize,
    height: usize,
    blocks_count: usize,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum LatticeError {
    OutOfBounds(GridCoordinate),
    NotAdjacent(GridCoordinate, GridCoordinate),
    MissingCell(GridCoordinate),
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LatticeError::OutOfBounds(c) => write!(f, "{} is outside the lattice", c),
            LatticeError::NotAdjacent(a, b) => {
                write!(f, "{} and {} are not orthogonal neighbours", a, b)
            }
            LatticeError::MissingCell(c) => write!(f, "no cell at {}", c),
        }
    }
}

impl error::Error for LatticeError {}

pub type NeighbourSmallVec<'a> = SmallVec<[(GridCoordinate, Option<&'a Cell>); 4]>;

impl Lattice {
    /// An empty lattice.
    ///
    /// Panics if either extent does not fit a signed 32 bit coordinate.
    pub fn new(width: Width, height: Height) -> Lattice {
        let (Width(w), Height(h)) = (width, height);
        assert!(w <= i32::MAX as usize && h <= i32::MAX as usize,
                "lattice extents {}x{} overflow the coordinate type", w, h);
        Lattice {
            cells: vec![None; w * h],
            width: w,
            height: h,
            blocks_count: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of slots, occupied or not.
    #[inline]
    pub fn size(&self) -> usize {
        self.width * self.height
    }

    /// Number of occupied slots.
    #[inline]
    pub fn blocks_count(&self) -> usize {
        self.blocks_count
    }

    #[inline]
    pub fn is_inside(&self, coord: GridCoordinate) -> bool {
        coord.x >= 0 && coord.y >= 0 && (coord.x as usize) < self.width &&
        (coord.y as usize) < self.height
    }

    /// Inside the lattice and unoccupied, i.e. carveable.
    #[inline]
    pub fn is_vacant(&self, coord: GridCoordinate) -> bool {
        self.index_of(coord).map_or(false, |i| self.cells[i].is_none())
    }

    /// Row major index of a coordinate, None when outside the lattice.
    #[inline]
    pub fn index_of(&self, coord: GridCoordinate) -> Option<usize> {
        if self.is_inside(coord) {
            Some(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn coordinate_of(&self, index: usize) -> GridCoordinate {
        GridCoordinate::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Cell at `coord`. Anything outside the lattice is simply absent.
    #[inline]
    pub fn get(&self, coord: GridCoordinate) -> Option<&Cell> {
        self.index_of(coord).and_then(|i| self.cells[i].as_ref())
    }

    /// Mutable access to a cell's descriptor and carving flags. Connection slots
    /// stay under the lattice's control.
    #[inline]
    pub fn get_mut(&mut self, coord: GridCoordinate) -> Option<&mut Cell> {
        match self.index_of(coord) {
            Some(i) => self.cells[i].as_mut(),
            None => None,
        }
    }

    /// Replace the slot at `coord`, returning whatever occupied it before.
    ///
    /// A previous occupant has all of its connections torn down (on the
    /// neighbours too) before it is handed back. A new cell always enters the
    /// lattice unconnected.
    pub fn set(&mut self, coord: GridCoordinate, cell: Option<Cell>) -> Result<Option<Cell>, LatticeError> {
        let index = self.index_of(coord).ok_or(LatticeError::OutOfBounds(coord))?;

        let previous = if self.cells[index].is_some() {
            for dir in Direction::ALL.iter() {
                self.break_slot(coord, *dir);
            }
            self.blocks_count -= 1;
            self.cells[index].take()
        } else {
            None
        };

        if let Some(mut new_cell) = cell {
            for dir in Direction::ALL.iter() {
                new_cell.set_connection(*dir, None);
            }
            self.cells[index] = Some(new_cell);
            self.blocks_count += 1;
        }

        Ok(previous)
    }

    /// Connect two orthogonally adjacent occupied cells. Connecting an already
    /// connected pair changes nothing.
    pub fn connect(&mut self, a: GridCoordinate, b: GridCoordinate) -> Result<(), LatticeError> {
        let dir_a_to_b = a.direction_to(b).ok_or(LatticeError::NotAdjacent(a, b))?;
        if self.get(a).is_none() {
            return Err(LatticeError::MissingCell(a));
        }
        if self.get(b).is_none() {
            return Err(LatticeError::MissingCell(b));
        }

        self.break_slot(a, dir_a_to_b);
        if let Some(cell_a) = self.get_mut(a) {
            cell_a.set_connection(dir_a_to_b, Some(b));
        }
        if let Some(cell_b) = self.get_mut(b) {
            cell_b.set_connection(dir_a_to_b.opposite(), Some(a));
        }
        Ok(())
    }

    /// Remove the connection between two neighbouring cells.
    /// Returns true if a connection existed. A missing endpoint is not an error,
    /// there is simply nothing to disconnect.
    pub fn disconnect(&mut self, a: GridCoordinate, b: GridCoordinate) -> Result<bool, LatticeError> {
        let dir_a_to_b = a.direction_to(b).ok_or(LatticeError::NotAdjacent(a, b))?;
        if self.get(a).is_none() || self.get(b).is_none() {
            return Ok(false);
        }
        let was_connected = self.is_connected(a, b);
        self.break_slot(a, dir_a_to_b);
        Ok(was_connected)
    }

    /// Are the cells at `a` and `b` connected to each other?
    pub fn is_connected(&self, a: GridCoordinate, b: GridCoordinate) -> bool {
        match (a.direction_to(b), self.get(a)) {
            (Some(dir), Some(cell)) => cell.connection(dir) == Some(b),
            _ => false,
        }
    }

    pub fn connection_count(&self, coord: GridCoordinate) -> usize {
        self.get(coord).map_or(0, Cell::connection_count)
    }

    pub fn has_any_connection(&self, coord: GridCoordinate) -> bool {
        self.connection_count(coord) > 0
    }

    /// Orthogonal neighbours of `coord` inside the lattice, in slot order.
    /// Unoccupied slots are only reported when `include_absent` is set.
    pub fn neighbours(&self, coord: GridCoordinate, include_absent: bool) -> NeighbourSmallVec<'_> {
        self.neighbours_where(coord, include_absent, |_| true)
    }

    /// As `neighbours`, with occupied neighbours additionally filtered by `pickup`.
    pub fn neighbours_where<P>(&self,
                               coord: GridCoordinate,
                               include_absent: bool,
                               pickup: P)
                               -> NeighbourSmallVec<'_>
        where P: Fn(&Cell) -> bool
    {
        Direction::ALL
            .iter()
            .map(|dir| coord.offset(*dir))
            .filter(|neighbour| self.is_inside(*neighbour))
            .filter_map(|neighbour| match self.get(neighbour) {
                Some(cell) if pickup(cell) => Some((neighbour, Some(cell))),
                Some(_) => None,
                None if include_absent => Some((neighbour, None)),
                None => None,
            })
            .collect()
    }

    /// Coordinates of orthogonal neighbours that are inside and unoccupied.
    pub fn vacant_neighbours(&self, coord: GridCoordinate) -> CoordinateSmallVec {
        Direction::ALL
            .iter()
            .map(|dir| coord.offset(*dir))
            .filter(|neighbour| self.is_vacant(*neighbour))
            .collect()
    }

    /// Every slot coordinate in row major scan order.
    pub fn iter(&self) -> impl Iterator<Item = GridCoordinate> {
        (0..self.height as i32)
            .cartesian_product(0..self.width as i32)
            .map(|(y, x)| GridCoordinate::new(x, y))
    }

    /// Occupied cells in row major scan order.
    pub fn occupied(&self) -> impl Iterator<Item = (GridCoordinate, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, slot)| slot.as_ref().map(|cell| (self.coordinate_of(i), cell)))
    }

    /// Occupied cells without a single connection.
    pub fn isolated_cells(&self) -> Vec<GridCoordinate> {
        self.occupied()
            .filter(|&(_, cell)| cell.connection_count() == 0)
            .map(|(coord, _)| coord)
            .collect()
    }

    /// Occupied cells reachable through exactly one connection.
    pub fn dead_ends(&self) -> Vec<GridCoordinate> {
        self.occupied()
            .filter(|&(_, cell)| cell.connection_count() == 1)
            .map(|(coord, _)| coord)
            .collect()
    }

    /// Each connection once, as (cell, cell to its right or above).
    pub fn links(&self) -> Vec<(GridCoordinate, GridCoordinate)> {
        self.occupied()
            .flat_map(|(coord, cell)| {
                [Direction::Right, Direction::Up]
                    .iter()
                    .filter_map(|dir| cell.connection(*dir))
                    .map(|other| (coord, other))
                    .collect::<SmallVec<[(GridCoordinate, GridCoordinate); 2]>>()
            })
            .collect()
    }

    #[inline]
    pub fn links_count(&self) -> usize {
        self.links().len()
    }

    /// Export the connection topology as an undirected graph with one node per
    /// occupied cell (weighted by its coordinate) and one edge per connection.
    pub fn connection_graph(&self) -> UnGraph<GridCoordinate, ()> {
        let mut graph = UnGraph::with_capacity(self.blocks_count, self.blocks_count * 2);
        let mut node_of: Vec<Option<NodeIndex>> = vec![None; self.size()];
        for (coord, _) in self.occupied() {
            if let Some(i) = self.index_of(coord) {
                node_of[i] = Some(graph.add_node(coord));
            }
        }
        for (a, b) in self.links() {
            let nodes = (self.index_of(a).and_then(|i| node_of[i]),
                         self.index_of(b).and_then(|i| node_of[i]));
            if let (Some(na), Some(nb)) = nodes {
                graph.add_edge(na, nb, ());
            }
        }
        graph
    }

    /// Check the mutual connection invariant over the whole lattice: every
    /// connection points at an occupied orthogonal neighbour which points back.
    pub fn connections_are_symmetric(&self) -> bool {
        self.occupied().all(|(coord, cell)| {
            Direction::ALL.iter().all(|dir| match cell.connection(*dir) {
                None => true,
                Some(other) => {
                    other == coord.offset(*dir) &&
                    self.get(other).map_or(false,
                                           |o| o.connection(dir.opposite()) == Some(coord))
                }
            })
        })
    }

    // Clear the slot `dir` on the cell at `coord` and the matching slot on the
    // neighbour it points at, if any.
    fn break_slot(&mut self, coord: GridCoordinate, dir: Direction) {
        let target = self.get(coord).and_then(|cell| cell.connection(dir));
        if let Some(cell) = self.get_mut(coord) {
            cell.set_connection(dir, None);
        }
        if let Some(other) = target {
            if let Some(other_cell) = self.get_mut(other) {
                if other_cell.connection(dir.opposite()) == Some(coord) {
                    other_cell.set_connection(dir.opposite(), None);
                }
            }
        }
    }
}
