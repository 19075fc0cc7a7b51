use smallvec::SmallVec;
use std::convert::From;
use std::fmt;

/// Integer position of a slot in a lattice. Signed so that stepping off any edge
/// is representable and simply looks up as "absent".
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub struct GridCoordinate {
    pub x: i32,
    pub y: i32,
}

impl GridCoordinate {
    pub fn new(x: i32, y: i32) -> GridCoordinate {
        GridCoordinate { x, y }
    }

    /// The coordinate one step away in `dir`. Never fails, the result may lie
    /// outside any particular lattice.
    #[inline]
    pub fn offset(self, dir: Direction) -> GridCoordinate {
        let (dx, dy) = dir.offset();
        GridCoordinate::new(self.x + dx, self.y + dy)
    }

    /// The direction leading from `self` to `other` when they are orthogonal
    /// unit-distance neighbours.
    #[inline]
    pub fn direction_to(self, other: GridCoordinate) -> Option<Direction> {
        Direction::from_offset(other.x - self.x, other.y - self.y)
    }
}

impl From<(i32, i32)> for GridCoordinate {
    fn from(x_y_pair: (i32, i32)) -> GridCoordinate {
        GridCoordinate::new(x_y_pair.0, x_y_pair.1)
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}|{}", self.x, self.y)
    }
}

pub type CoordinateSmallVec = SmallVec<[GridCoordinate; 4]>;
pub type DirectionSmallVec = SmallVec<[Direction; 4]>;

/// The four orthogonal directions. The declaration order is the connection slot order.
/// `Up` is towards +y.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];

    /// Connection slot of this direction.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Up => 1,
            Direction::Right => 2,
            Direction::Down => 3,
        }
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Direction> {
        Direction::ALL.get(index).cloned()
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
        }
    }

    #[inline]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Up => (0, 1),
            Direction::Right => (1, 0),
            Direction::Down => (0, -1),
        }
    }

    /// Inverse of `offset`. Anything other than a unit orthogonal step, including
    /// the zero offset, has no direction.
    pub fn from_offset(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (-1, 0) => Some(Direction::Left),
            (0, 1) => Some(Direction::Up),
            (1, 0) => Some(Direction::Right),
            (0, -1) => Some(Direction::Down),
            _ => None,
        }
    }
}

/// Geometry category of a cell. Opaque to the carving algorithm.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum PrimitiveKind {
    Platform,
    Tower,
}

/// Everything a renderer needs to instantiate a cell's visual. Only `elevation`
/// is read back by the core, when placing cells in 3D for layer linking.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct CellDescriptor {
    pub kind: PrimitiveKind,
    pub elevation: f32,
    pub scale: f32,
    pub rotation_degrees: u16,
    pub hue: f32,
}

impl Default for CellDescriptor {
    fn default() -> CellDescriptor {
        CellDescriptor {
            kind: PrimitiveKind::Platform,
            elevation: 0.0,
            scale: 1.0,
            rotation_degrees: 0,
            hue: 0.0,
        }
    }
}

/// Opaque token handed out by a `Visuals` collaborator when a cell is placed.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug)]
pub struct VisualHandle(pub u64);

/// An occupied lattice slot.
#[derive(PartialEq, Clone, Debug)]
pub struct Cell {
    pub descriptor: CellDescriptor,
    pub visual: Option<VisualHandle>,
    connections: [Option<GridCoordinate>; 4],
    // Carving-time bookkeeping: directions already tried from this cell.
    explored: [bool; 4],
}

impl Cell {
    pub fn new(descriptor: CellDescriptor) -> Cell {
        Cell {
            descriptor,
            visual: None,
            connections: [None; 4],
            explored: [false; 4],
        }
    }

    #[inline]
    pub fn connection(&self, dir: Direction) -> Option<GridCoordinate> {
        self.connections[dir.index()]
    }

    #[inline]
    pub fn connections(&self) -> &[Option<GridCoordinate>; 4] {
        &self.connections
    }

    #[inline]
    pub fn is_vacant(&self, dir: Direction) -> bool {
        self.connections[dir.index()].is_none()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.iter().filter(|c| c.is_some()).count()
    }

    /// Directions in slot order that hold a connection.
    pub fn connected_directions(&self) -> DirectionSmallVec {
        Direction::ALL
            .iter()
            .cloned()
            .filter(|dir| self.connections[dir.index()].is_some())
            .collect()
    }

    #[inline]
    pub fn is_explored(&self, dir: Direction) -> bool {
        self.explored[dir.index()]
    }

    #[inline]
    pub fn mark_explored(&mut self, dir: Direction) {
        self.explored[dir.index()] = true;
    }

    // Slots are only written by the lattice so the symmetric invariant holds.
    #[inline]
    pub(crate) fn set_connection(&mut self, dir: Direction, target: Option<GridCoordinate>) {
        self.connections[dir.index()] = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_index_round_trip() {
        for (i, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
            assert_eq!(Direction::from_index(i), Some(*dir));
        }
        assert_eq!(Direction::from_index(4), None);
        assert_eq!(Direction::from_index(usize::MAX), None);
    }

    #[test]
    fn opposite_directions() {
        assert_eq!(Direction::Left.opposite(), Direction::Right);
        assert_eq!(Direction::Right.opposite(), Direction::Left);
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Down.opposite(), Direction::Up);
        for dir in Direction::ALL.iter() {
            assert_eq!(dir.opposite().opposite(), *dir);
            let (dx, dy) = dir.offset();
            let (ox, oy) = dir.opposite().offset();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn offsets_map_back_to_directions() {
        for dir in Direction::ALL.iter() {
            let (dx, dy) = dir.offset();
            assert_eq!(Direction::from_offset(dx, dy), Some(*dir));
        }
        assert_eq!(Direction::from_offset(0, 0), None);
        assert_eq!(Direction::from_offset(1, 1), None);
        assert_eq!(Direction::from_offset(-1, 1), None);
        assert_eq!(Direction::from_offset(2, 0), None);
        assert_eq!(Direction::from_offset(0, -2), None);
    }

    #[test]
    fn coordinate_direction_to() {
        let gc = |x, y| GridCoordinate::new(x, y);
        assert_eq!(gc(1, 1).direction_to(gc(0, 1)), Some(Direction::Left));
        assert_eq!(gc(1, 1).direction_to(gc(1, 2)), Some(Direction::Up));
        assert_eq!(gc(1, 1).direction_to(gc(2, 1)), Some(Direction::Right));
        assert_eq!(gc(1, 1).direction_to(gc(1, 0)), Some(Direction::Down));
        assert_eq!(gc(1, 1).direction_to(gc(1, 1)), None);
        assert_eq!(gc(1, 1).direction_to(gc(2, 2)), None);
        assert_eq!(gc(0, 0).offset(Direction::Down), gc(0, -1));
    }

    #[test]
    fn new_cell_is_unconnected_and_unexplored() {
        let mut cell = Cell::new(CellDescriptor::default());
        assert_eq!(cell.connection_count(), 0);
        assert!(cell.connected_directions().is_empty());
        for dir in Direction::ALL.iter() {
            assert!(cell.is_vacant(*dir));
            assert!(!cell.is_explored(*dir));
        }
        cell.mark_explored(Direction::Up);
        assert!(cell.is_explored(Direction::Up));
        assert!(!cell.is_explored(Direction::Down));
    }
}
