// Create the Error, ErrorKind, ResultExt, and Result types.
// Result is a typedef of std `Result` with the error type our own `Error`.
// Lattice errors convert with `?` through the foreign link.
use error_chain::*;

use crate::lattice::LatticeError;

error_chain! {

    foreign_links {
        Lattice(LatticeError);
        Io(::std::io::Error);
        Toml(::toml::de::Error);
    }

    errors {
        GenerationExhausted(layer: usize, steps: u64) {
            description("step budget exhausted before the layer was complete")
            display("layer {} stopped after {} steps without completing", layer, steps)
        }
        GenerationFailed(layer: usize) {
            description("carving backtracked past its starting cell")
            display("layer {} could not be carved from its starting cell", layer)
        }
        LinkingUnavailable(lower: usize, upper: usize) {
            description("no compatible vacant edge pair between two layers")
            display("can't connect layer {} to {}", lower, upper)
        }
        InvalidConfig(reason: String) {
            description("invalid maze configuration")
            display("invalid maze configuration: {}", reason)
        }
    }
}
