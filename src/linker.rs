use tracing::debug;

use crate::cells::{Direction, GridCoordinate};
use crate::errors::*;
use error_chain::bail;
use crate::lattice::Lattice;
use crate::units::LayerIndex;
use crate::visuals::Placement;


/// The one connector chosen between a layer and the layer above it.
///
/// The lower cell's `lower_direction` slot faces the upper cell's
/// `upper_direction` slot, which is always the opposite direction. Neither
/// lattice records the link; both slots stay vacant in their own layer.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct LayerLink {
    pub lower_layer: LayerIndex,
    pub lower: GridCoordinate,
    pub lower_direction: Direction,
    pub upper: GridCoordinate,
    pub upper_direction: Direction,
    /// World space distance between the two cells, elevation included.
    pub distance: f32,
}

impl LayerLink {
    #[inline]
    pub fn upper_layer(&self) -> LayerIndex {
        LayerIndex(self.lower_layer.0 + 1)
    }
}

/// One layer as the linker sees it.
#[derive(Copy, Clone)]
pub struct LayerView<'a> {
    pub index: LayerIndex,
    pub lattice: &'a Lattice,
    pub placement: &'a dyn Placement,
}

impl<'a> LayerView<'a> {
    pub fn new(index: LayerIndex, lattice: &'a Lattice, placement: &'a dyn Placement) -> LayerView<'a> {
        LayerView { index, lattice, placement }
    }
}

/// Pick the closest pair of cells with facing vacant slots between `lower` and
/// the layer directly above it.
///
/// Every occupied lower cell is scanned column by column (x, then y), each of
/// its vacant slots in slot order. A slot in direction `d` pairs with the upper
/// cell at the coordinate one step in `d`, provided that cell exists and its
/// `d.opposite()` slot is vacant too. The first pair at the smallest distance
/// wins.
pub fn link_layers(lower: &LayerView<'_>, upper: &LayerView<'_>) -> Result<LayerLink> {
    let mut best: Option<LayerLink> = None;

    for x in 0..lower.lattice.width() as i32 {
        for y in 0..lower.lattice.height() as i32 {
            let coord = GridCoordinate::new(x, y);
            let cell = match lower.lattice.get(coord) {
                Some(cell) => cell,
                None => continue,
            };

            for dir in Direction::ALL.iter().filter(|dir| cell.is_vacant(**dir)) {
                let above = coord.offset(*dir);
                let facing = dir.opposite();
                let compatible = upper.lattice
                                      .get(above)
                                      .map_or(false, |upper_cell| upper_cell.is_vacant(facing));
                if !compatible {
                    continue;
                }

                let from = lower.placement.position_of(lower.lattice, coord, true);
                let to = upper.placement.position_of(upper.lattice, above, true);
                let distance = from.distance(&to);
                if best.map_or(true, |link| distance < link.distance) {
                    best = Some(LayerLink {
                        lower_layer: lower.index,
                        lower: coord,
                        lower_direction: *dir,
                        upper: above,
                        upper_direction: facing,
                        distance,
                    });
                }
            }
        }
    }

    match best {
        Some(link) => {
            debug!(lower = %link.lower,
                   upper = %link.upper,
                   distance = link.distance,
                   "linked layer {} to {}",
                   lower.index.0,
                   upper.index.0);
            Ok(link)
        }
        None => bail!(ErrorKind::LinkingUnavailable(lower.index.0, upper.index.0)),
    }
}
