//! **temple_mazes** generates multi storey mazes: each floor is carved by a
//! self-avoiding random walk that refuses to cut the remaining space in two,
//! and neighbouring floors are joined by their closest pair of facing cells.

pub mod cells;
pub mod config;
pub mod displays;
pub mod errors;
pub mod generators;
pub mod lattice;
pub mod linker;
pub mod pathing;
pub mod stack;
pub mod units;
pub mod visuals;
pub mod waves;
mod utils;
