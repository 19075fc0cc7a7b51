use docopt::Docopt;
use serde_derive::Deserialize;
use std::{
    fs::File,
    io,
    io::prelude::*,
};
use temple_mazes::{
    config::{MazeConfig, StepRange},
    displays::LatticeDisplay,
    pathing::{self, Distances, PathDisplay},
    stack::{Layer, MazeStack},
    units::{Height, Width},
    visuals::HandleCounter,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Temple mazes

Usage:
    temple_driver -h | --help
    temple_driver [--config=<path>] [--seed=<n>] [--layers=<n>] [(--grid-size=<n>|[--grid-width=<w> --grid-height=<h>])] [--max-steps=<n>] [--no-propagate] [--show-distances|--show-path] [--text-out=<path>] [--verbose|--quiet]

Options:
    -h --help              Show this screen.
    --config=<path>        TOML maze configuration. Grid and layer options are ignored when given.
    --seed=<n>             Master seed, overrides the configuration's.
    --layers=<n>           Number of stacked layers [default: 3].
    --grid-size=<n>        Each layer is n * n.
    --grid-width=<w>       The layer width in a w*h layer [default: 8].
    --grid-height=<h>      The layer height in a w*h layer [default: 8].
    --max-steps=<n>        Step budget for every layer, unbounded if not given.
    --no-propagate         Use each layer's own seed instead of deriving it from the master seed.
    --show-distances       Show the connection distance from each layer's starting cell to every cell.
    --show-path            Show the longest path of each layer.
    --text-out=<path>      Output file path for the textual rendering, stdout if not given.
    --verbose              Log generation details.
    --quiet                Only log warnings and errors.
";
#[derive(Debug, Deserialize)]
struct MazeArgs {
    flag_config: String,
    flag_seed: Option<u64>,
    flag_layers: usize,
    flag_grid_size: Option<usize>,
    flag_grid_width: usize,
    flag_grid_height: usize,
    flag_max_steps: Option<u64>,
    flag_no_propagate: bool,
    flag_show_distances: bool,
    flag_show_path: bool,
    flag_text_out: String,
    flag_verbose: bool,
    flag_quiet: bool,
}

mod errors {
    // Library errors are chained in through `links`, so `?` works on both.
    use error_chain::*;
    error_chain! {

        links {
            Maze(::temple_mazes::errors::Error, ::temple_mazes::errors::ErrorKind);
        }

        foreign_links {
            DocOptFailure(::docopt::Error);
            Io(::std::io::Error);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {

    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;

    init_logging(&args);

    let config = maze_config_from_args(&args)?;
    info!(seed = config.seed, layers = config.layers.len(), "building maze");

    let mut visuals = HandleCounter::new();
    let stack = MazeStack::build(&config, &mut visuals)?;
    let supports = stack.plan_supports(&config);

    let mut output = String::new();
    for layer in stack.layers() {
        output.push_str(&render_layer(layer, &args));
    }

    for link in stack.links() {
        output.push_str(&format!("Link {} -> {}: {} {:?} to {} {:?} (distance {:.3})\n",
                                 link.lower_layer.0,
                                 link.upper_layer().0,
                                 link.lower,
                                 link.lower_direction,
                                 link.upper,
                                 link.upper_direction,
                                 link.distance));
    }
    output.push_str(&format!("Towers: {}\n", join_coordinates(&supports.towers)));
    for (i, columns) in supports.columns.iter().enumerate() {
        output.push_str(&format!("Columns on layer {}: {}\n", i, join_coordinates(columns)));
    }

    if args.flag_text_out.is_empty() {
        print!("{}", output);
    } else {
        write_text_to_file(&output, &args.flag_text_out)
            .chain_err(|| format!("Failed to write maze to text file {}", args.flag_text_out))?;
    }

    if let Err(e) = stack.require_complete() {
        info!("maze is incomplete: {}", e);
    }
    Ok(())
}

fn init_logging(args: &MazeArgs) {
    let level = if args.flag_verbose {
        "debug"
    } else if args.flag_quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Either the configuration file with command line overrides applied, or
/// uniform layers described by the grid options.
fn maze_config_from_args(args: &MazeArgs) -> Result<MazeConfig> {
    let mut config = if !args.flag_config.is_empty() {
        MazeConfig::load(&args.flag_config)?
    } else {
        let (width, height) = if let Some(square_grid_size) = args.flag_grid_size {
            (square_grid_size, square_grid_size)
        } else {
            (args.flag_grid_width, args.flag_grid_height)
        };
        MazeConfig::uniform(args.flag_seed.unwrap_or(0), args.flag_layers, Width(width), Height(height))
    };

    if let Some(seed) = args.flag_seed {
        config.seed = seed;
    }
    if args.flag_no_propagate {
        config.propagate_seed = false;
    }
    if let Some(max_steps) = args.flag_max_steps {
        for layer in &mut config.layers {
            layer.success.steps = StepRange::up_to(max_steps);
        }
    }

    config.validate()?;
    Ok(config)
}

fn render_layer(layer: &Layer, args: &MazeArgs) -> String {
    let report = &layer.report;
    let heading = format!("Layer {} (seed {}): {:?}, {}/{} cells, {} steps, start {}\n",
                          layer.index.0,
                          layer.seed,
                          report.state,
                          report.blocks,
                          report.size,
                          report.steps,
                          report.start);

    let body = if args.flag_show_distances {
        match Distances::new(&layer.lattice, report.start) {
            Some(distances) => LatticeDisplay::with_overlay(&layer.lattice, &distances).to_string(),
            None => layer.lattice.to_string(),
        }
    } else if args.flag_show_path {
        match pathing::longest_path(&layer.lattice) {
            Some(path) => {
                let display_path = PathDisplay::new(&path);
                LatticeDisplay::with_overlay(&layer.lattice, &display_path).to_string()
            }
            None => layer.lattice.to_string(),
        }
    } else {
        layer.lattice.to_string()
    };

    format!("{}{}\n", heading, body)
}

fn join_coordinates(coords: &[temple_mazes::cells::GridCoordinate]) -> String {
    if coords.is_empty() {
        return String::from("none");
    }
    coords.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
}

fn write_text_to_file(data: &str, file_name: &str) -> io::Result<()> {
    let mut f = File::create(file_name)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}
