//! Seams towards whatever draws the maze. The core never renders anything, it
//! only announces cells being placed and removed and asks where cells sit in
//! world space.

use crate::cells::{CellDescriptor, GridCoordinate, VisualHandle};
use crate::lattice::Lattice;
use crate::linker::LayerLink;
use crate::utils::{fnv_hashset, FnvHashSet};


/// Receives the visual side effects of generation.
pub trait Visuals {
    /// A cell was placed at `coord`. The returned handle is stored on the cell
    /// and handed back to `remove_cell` if the cell is ever rolled back.
    fn place_cell(&mut self, coord: GridCoordinate, descriptor: &CellDescriptor) -> VisualHandle;

    fn remove_cell(&mut self, handle: VisualHandle);

    /// The single connector chosen between two stacked layers.
    fn place_layer_link(&mut self, _link: &LayerLink) {}
}

#[derive(PartialEq, Copy, Clone, Debug, Default)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Point3 {
        Point3 { x, y, z }
    }

    pub fn distance(&self, other: &Point3) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Maps lattice coordinates to world positions.
pub trait Placement {
    fn position_of(&self, lattice: &Lattice, coord: GridCoordinate, consider_elevation: bool) -> Point3;
}

/// Cells laid out on a horizontal plane at `origin.y`, one `cell_size` apart,
/// with the lattice's y axis running along world z. Cell centres sit half a cell
/// in from the origin corner.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct GridPlacement {
    pub origin: Point3,
    pub cell_size: f32,
}

impl GridPlacement {
    pub fn new(origin: Point3, cell_size: f32) -> GridPlacement {
        GridPlacement { origin, cell_size }
    }
}

impl Default for GridPlacement {
    fn default() -> GridPlacement {
        GridPlacement::new(Point3::default(), 1.0)
    }
}

impl Placement for GridPlacement {
    fn position_of(&self, lattice: &Lattice, coord: GridCoordinate, consider_elevation: bool) -> Point3 {
        let elevation = if consider_elevation {
            lattice.get(coord).map_or(0.0, |cell| cell.descriptor.elevation)
        } else {
            0.0
        };
        Point3::new((coord.x as f32 + 0.5) * self.cell_size + self.origin.x,
                    elevation + self.origin.y,
                    (coord.y as f32 + 0.5) * self.cell_size + self.origin.z)
    }
}

/// Headless `Visuals`: hands out sequential handles and keeps track of which
/// are still alive.
#[derive(Debug)]
pub struct HandleCounter {
    next: u64,
    live: FnvHashSet<VisualHandle>,
    links: Vec<LayerLink>,
}

impl HandleCounter {
    pub fn new() -> HandleCounter {
        HandleCounter {
            next: 0,
            live: fnv_hashset(64),
            links: Vec::new(),
        }
    }

    /// Handles placed and not yet removed.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: VisualHandle) -> bool {
        self.live.contains(&handle)
    }

    /// Total handles ever handed out.
    pub fn placed_count(&self) -> u64 {
        self.next
    }

    pub fn layer_links(&self) -> &[LayerLink] {
        &self.links
    }
}

impl Default for HandleCounter {
    fn default() -> HandleCounter {
        HandleCounter::new()
    }
}

impl Visuals for HandleCounter {
    fn place_cell(&mut self, _: GridCoordinate, _: &CellDescriptor) -> VisualHandle {
        let handle = VisualHandle(self.next);
        self.next += 1;
        self.live.insert(handle);
        handle
    }

    fn remove_cell(&mut self, handle: VisualHandle) {
        self.live.remove(&handle);
    }

    fn place_layer_link(&mut self, link: &LayerLink) {
        self.links.push(*link);
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::cells::Cell;
    use crate::units::{Height, Width};

    #[test]
    fn distances_between_points() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn grid_placement_centres_cells() {
        let mut l = Lattice::new(Width(2), Height(2));
        let mut descriptor = CellDescriptor::default();
        descriptor.elevation = 0.5;
        l.set(GridCoordinate::new(1, 0), Some(Cell::new(descriptor))).expect("inside");

        let placement = GridPlacement::new(Point3::new(10.0, 2.0, 0.0), 2.0);
        let flat = placement.position_of(&l, GridCoordinate::new(1, 0), false);
        assert_eq!(flat, Point3::new(13.0, 2.0, 1.0));
        let raised = placement.position_of(&l, GridCoordinate::new(1, 0), true);
        assert_eq!(raised, Point3::new(13.0, 2.5, 1.0));

        // An empty slot has no elevation to consider
        let empty = placement.position_of(&l, GridCoordinate::new(0, 1), true);
        assert_eq!(empty, Point3::new(11.0, 2.0, 3.0));
    }

    #[test]
    fn handle_counter_tracks_live_handles() {
        let mut visuals = HandleCounter::new();
        let coord = GridCoordinate::new(0, 0);
        let a = visuals.place_cell(coord, &CellDescriptor::default());
        let b = visuals.place_cell(coord, &CellDescriptor::default());
        assert!(a != b);
        assert_eq!(visuals.live_count(), 2);
        visuals.remove_cell(a);
        assert!(!visuals.is_live(a));
        assert!(visuals.is_live(b));
        assert_eq!(visuals.live_count(), 1);
        assert_eq!(visuals.placed_count(), 2);
    }
}
