//! Distances and paths over a lattice's connection graph.
//!
//! Everything here walks existing connections only, never open space, by
//! running waves along `Lattice::is_connected`.

use itertools::Itertools;
use smallvec::SmallVec;

use crate::cells::GridCoordinate;
use crate::displays::CellBodyDisplay;
use crate::lattice::Lattice;
use crate::utils::{self, FnvHashMap, FnvHashSet};
use crate::waves::WaveProcessor;


#[derive(Debug, Clone)]
pub struct Distances {
    start_coordinate: GridCoordinate,
    distances: FnvHashMap<GridCoordinate, u32>,
    max_distance: u32,
}

impl Distances {
    /// Connection hop counts from `start_coordinate` to every cell reachable
    /// from it. None if there is no cell at the start.
    pub fn new(lattice: &Lattice, start_coordinate: GridCoordinate) -> Option<Distances> {
        lattice.get(start_coordinate)?;

        let mut distances = utils::fnv_hashmap(lattice.blocks_count());
        let mut max = 0;
        let mut waves = WaveProcessor::for_lattice(lattice);
        for wave in waves.compute_waves_along(&[start_coordinate], |a, b| lattice.is_connected(a, b)) {
            let distance = wave.index as u32;
            for coord in wave.cells {
                distances.insert(coord, distance);
            }
            max = distance;
        }

        Some(Distances {
            start_coordinate,
            distances,
            max_distance: max,
        })
    }

    #[inline(always)]
    pub fn start(&self) -> GridCoordinate {
        self.start_coordinate
    }

    #[inline(always)]
    pub fn max(&self) -> u32 {
        self.max_distance
    }

    #[inline(always)]
    pub fn distance_from_start_to(&self, coord: GridCoordinate) -> Option<u32> {
        self.distances.get(&coord).cloned()
    }

    /// Number of cells reached, the start included.
    #[inline]
    pub fn reached_count(&self) -> usize {
        self.distances.len()
    }

    /// Cells at the maximum distance, in row major order.
    pub fn furthest_points(&self) -> SmallVec<[GridCoordinate; 8]> {
        let furthest_distance = self.max();
        self.distances
            .iter()
            .filter(|&(_, distance)| *distance == furthest_distance)
            .map(|(coord, _)| *coord)
            .sorted_by_key(|c| (c.y, c.x))
            .collect()
    }
}

impl CellBodyDisplay for Distances {
    fn render_cell_body(&self, coord: GridCoordinate) -> String {
        if let Some(d) = self.distances.get(&coord) {
            // centre align, padding 3, lowercase hexadecimal
            format!("{:^3x}", d)
        } else {
            String::from("   ")
        }
    }
}

#[derive(Debug)]
pub struct StartEndPointsDisplay {
    start_coordinates: SmallVec<[GridCoordinate; 4]>,
    end_coordinates: SmallVec<[GridCoordinate; 4]>,
}

impl StartEndPointsDisplay {
    pub fn new(starts: &[GridCoordinate], ends: &[GridCoordinate]) -> StartEndPointsDisplay {
        StartEndPointsDisplay {
            start_coordinates: starts.iter().cloned().collect(),
            end_coordinates: ends.iter().cloned().collect(),
        }
    }
}

impl CellBodyDisplay for StartEndPointsDisplay {
    fn render_cell_body(&self, coord: GridCoordinate) -> String {
        if self.start_coordinates.contains(&coord) {
            String::from(" S ")
        } else if self.end_coordinates.contains(&coord) {
            String::from(" E ")
        } else {
            String::from("   ")
        }
    }
}

#[derive(Debug)]
pub struct PathDisplay {
    on_path_coordinates: FnvHashSet<GridCoordinate>,
}

impl PathDisplay {
    pub fn new(path: &[GridCoordinate]) -> Self {
        PathDisplay { on_path_coordinates: path.iter().cloned().collect() }
    }
}

impl CellBodyDisplay for PathDisplay {
    fn render_cell_body(&self, coord: GridCoordinate) -> String {
        if self.on_path_coordinates.contains(&coord) {
            String::from(" . ")
        } else {
            String::from("   ")
        }
    }
}

/// Path from the start of `distances_from_start` to `end_point`, both ends
/// included. None when the end isn't reachable.
pub fn shortest_path(lattice: &Lattice,
                     distances_from_start: &Distances,
                     end_point: GridCoordinate)
                     -> Option<Vec<GridCoordinate>> {
    let mut current_distance = distances_from_start.distance_from_start_to(end_point)?;
    let mut path = vec![end_point];
    let mut current_coord = end_point;

    while current_distance > 0 {
        let closer = lattice.get(current_coord)?
            .connections()
            .iter()
            .filter_map(|link| *link)
            .find(|link| {
                distances_from_start.distance_from_start_to(*link) == Some(current_distance - 1)
            });

        match closer {
            Some(coord) => {
                current_coord = coord;
                current_distance -= 1;
                path.push(current_coord);
            }
            // The distances don't belong to this lattice any more
            None => return None,
        }
    }

    path.reverse();
    Some(path)
}

/// Longest path of a perfect maze, found from the cell furthest away from the
/// first occupied cell. On a maze with loops or islands this is merely a long
/// path within the first cell's region.
pub fn longest_path(lattice: &Lattice) -> Option<Vec<GridCoordinate>> {
    let (arbitrary_start_point, _) = lattice.occupied().next()?;
    let first_distances = Distances::new(lattice, arbitrary_start_point)?;

    let long_path_start_coordinate = *first_distances.furthest_points().first()?;
    let distances_from_start = Distances::new(lattice, long_path_start_coordinate)?;
    let end_point = *distances_from_start.furthest_points().first()?;

    shortest_path(lattice, &distances_from_start, end_point)
}

/// Groups of cells reachable from one another, each in wave order, groups
/// ordered by their first cell in row major order.
pub fn connected_regions(lattice: &Lattice) -> Vec<Vec<GridCoordinate>> {
    let mut waves = WaveProcessor::for_lattice(lattice);
    let mut regions = vec![];
    for (coord, _) in lattice.occupied() {
        if waves.is_visited(coord) {
            continue;
        }
        // The visited set carries over, so later regions skip earlier ones
        let region = waves.compute_waves_along(&[coord], |a, b| lattice.is_connected(a, b))
                          .flat_map(|wave| wave.cells)
                          .collect::<Vec<_>>();
        regions.push(region);
    }
    regions
}

/// Every occupied cell can reach every other one. Trivially true when there
/// are fewer than two cells.
pub fn is_fully_connected(lattice: &Lattice) -> bool {
    match lattice.occupied().next() {
        None => true,
        Some((first, _)) => {
            Distances::new(lattice, first).map_or(false, |d| d.reached_count() == lattice.blocks_count())
        }
    }
}
