use std::fmt;

use crate::cells::GridCoordinate;
use crate::lattice::Lattice;


/// Supplies the three character body of each cell when a lattice is printed.
pub trait CellBodyDisplay {
    fn render_cell_body(&self, coord: GridCoordinate) -> String;
}

/// Text rendering of a lattice, top row (highest y) first. Walls are drawn
/// wherever two slots are not connected, so an empty slot is boxed in on all
/// sides and filled with `VACANT_BODY`.
pub struct LatticeDisplay<'a> {
    lattice: &'a Lattice,
    overlay: Option<&'a dyn CellBodyDisplay>,
}

const VACANT_BODY: &str = "░░░";
const DEFAULT_BODY: &str = "   ";

impl<'a> LatticeDisplay<'a> {
    pub fn new(lattice: &'a Lattice) -> LatticeDisplay<'a> {
        LatticeDisplay { lattice, overlay: None }
    }

    pub fn with_overlay(lattice: &'a Lattice, overlay: &'a dyn CellBodyDisplay) -> LatticeDisplay<'a> {
        LatticeDisplay {
            lattice,
            overlay: Some(overlay),
        }
    }

    // Display rows count down from the top, lattice y counts up from the bottom.
    fn coordinate_at(&self, column: usize, row: usize) -> GridCoordinate {
        GridCoordinate::new(column as i32, (self.lattice.height() - 1 - row) as i32)
    }

    // Wall along the top edge of display cell (column, row); row == height is
    // the bottom boundary.
    fn horizontal_wall(&self, column: usize, row: usize) -> bool {
        if row == 0 || row == self.lattice.height() {
            return true;
        }
        let above = self.coordinate_at(column, row - 1);
        let below = self.coordinate_at(column, row);
        !self.lattice.is_connected(above, below)
    }

    // Wall along the left edge of display cell (column, row); column == width
    // is the right boundary.
    fn vertical_wall(&self, column: usize, row: usize) -> bool {
        if column == 0 || column == self.lattice.width() {
            return true;
        }
        let left = self.coordinate_at(column - 1, row);
        let right = self.coordinate_at(column, row);
        !self.lattice.is_connected(left, right)
    }

    fn corner(&self, column: usize, row: usize) -> &'static str {
        let (width, height) = (self.lattice.width(), self.lattice.height());
        let left = column > 0 && self.horizontal_wall(column - 1, row);
        let right = column < width && self.horizontal_wall(column, row);
        let up = row > 0 && self.vertical_wall(column, row - 1);
        let down = row < height && self.vertical_wall(column, row);

        match (left, right, up, down) {
            (true, true, true, true) => "┼",
            (true, true, true, false) => "┴",
            (true, true, false, true) => "┬",
            (true, false, true, true) => "┤",
            (false, true, true, true) => "├",
            (true, true, false, false) => "─",
            (false, false, true, true) => "│",
            (false, true, true, false) => "└",
            (true, false, false, true) => "┐",
            (true, false, true, false) => "┘",
            (false, true, false, true) => "┌",
            (true, false, false, false) => "╴",
            (false, true, false, false) => "╶",
            (false, false, true, false) => "╵",
            (false, false, false, true) => "╷",
            (false, false, false, false) => " ",
        }
    }

    fn body(&self, coord: GridCoordinate) -> String {
        if self.lattice.get(coord).is_none() {
            return String::from(VACANT_BODY);
        }
        match self.overlay {
            Some(overlay) => overlay.render_cell_body(coord),
            None => String::from(DEFAULT_BODY),
        }
    }
}

impl<'a> fmt::Display for LatticeDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (width, height) = (self.lattice.width(), self.lattice.height());
        if width == 0 || height == 0 {
            return Ok(());
        }

        let mut output = String::new();
        for row in 0..height + 1 {
            output.push_str(self.corner(0, row));
            for column in 0..width {
                output.push_str(if self.horizontal_wall(column, row) { "───" } else { "   " });
                output.push_str(self.corner(column + 1, row));
            }
            output.push('\n');

            if row < height {
                for column in 0..width {
                    output.push_str(if self.vertical_wall(column, row) { "│" } else { " " });
                    output.push_str(&self.body(self.coordinate_at(column, row)));
                }
                output.push_str("│\n");
            }
        }

        write!(f, "{}", output)
    }
}

impl fmt::Display for Lattice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", LatticeDisplay::new(self))
    }
}
