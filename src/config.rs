//! Maze and layer settings, deserialisable from TOML.
//!
//! ```toml
//! seed = 42
//! propagate_seed = true
//! max_towers = 3
//! max_columns_per_layer = [0, 4]
//!
//! [[layers]]
//! width = 8
//! height = 8
//!
//! [[layers]]
//! width = 8
//! height = 8
//! altitude = 2.0
//! success = { steps = { from = 0, to = 200000 } }
//! ```

use rand::Rng;
use serde_derive::Deserialize;
use std::fs;
use std::path::Path;

use crate::cells::GridCoordinate;
use crate::errors::*;
use error_chain::bail;
use crate::units::{Height, LayerIndex, Width};

/// Upper limit on a single layer's width * height.
pub const MAX_LAYER_CELLS: usize = 1 << 24;

/// A closed range of floats. `from == to` is a constant.
#[derive(Deserialize, PartialEq, Copy, Clone, Debug)]
pub struct FloatRange {
    pub from: f32,
    pub to: f32,
}

impl FloatRange {
    pub fn new(from: f32, to: f32) -> FloatRange {
        FloatRange { from, to }
    }

    pub fn constant(value: f32) -> FloatRange {
        FloatRange::new(value, value)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.from < self.to {
            rng.gen_range(self.from..=self.to)
        } else {
            self.from
        }
    }
}

/// Step count bounds of a layer's generation. `to == -1` leaves it unbounded.
/// `from` is reserved: it is validated against `to` but nothing reads it.
#[derive(Deserialize, Eq, PartialEq, Copy, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct StepRange {
    #[serde(default)]
    pub from: i64,
    #[serde(default = "unbounded")]
    pub to: i64,
}

fn unbounded() -> i64 {
    -1
}

impl StepRange {
    pub fn unbounded() -> StepRange {
        StepRange { from: 0, to: unbounded() }
    }

    pub fn up_to(max: u64) -> StepRange {
        StepRange { from: 0, to: max as i64 }
    }

    #[inline]
    pub fn upper_bound(&self) -> Option<u64> {
        if self.to < 0 {
            None
        } else {
            Some(self.to as u64)
        }
    }
}

impl Default for StepRange {
    fn default() -> StepRange {
        StepRange::unbounded()
    }
}

#[derive(Deserialize, PartialEq, Copy, Clone, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct SuccessConditions {
    #[serde(default)]
    pub steps: StepRange,
    /// Reserved: reported against, never used to stop generation.
    #[serde(default)]
    pub fill_percent: f32,
}

#[derive(Deserialize, PartialEq, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct LayerConfig {
    #[serde(default)]
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    #[serde(default = "default_platform_elevation")]
    pub platform_elevation: FloatRange,
    #[serde(default)]
    pub success: SuccessConditions,
    /// Fixed starting cell instead of a random one.
    #[serde(default)]
    pub start: Option<(i32, i32)>,
    /// Height of the layer's floor in world space.
    #[serde(default)]
    pub altitude: f32,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
}

fn default_platform_elevation() -> FloatRange {
    FloatRange::new(0.25, 1.0)
}

fn default_cell_size() -> f32 {
    1.0
}

impl LayerConfig {
    pub fn new(seed: u64, width: Width, height: Height) -> LayerConfig {
        LayerConfig {
            seed,
            width: width.0,
            height: height.0,
            platform_elevation: default_platform_elevation(),
            success: SuccessConditions::default(),
            start: None,
            altitude: 0.0,
            cell_size: default_cell_size(),
        }
    }

    pub fn with_start(mut self, start: GridCoordinate) -> LayerConfig {
        self.start = Some((start.x, start.y));
        self
    }

    pub fn with_steps(mut self, steps: StepRange) -> LayerConfig {
        self.success.steps = steps;
        self
    }

    pub fn with_altitude(mut self, altitude: f32) -> LayerConfig {
        self.altitude = altitude;
        self
    }

    pub fn start_coordinate(&self) -> Option<GridCoordinate> {
        self.start.map(GridCoordinate::from)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!(ErrorKind::InvalidConfig(format!("layer extents {}x{} are empty",
                                                   self.width, self.height)));
        }
        let too_large = self.width > i32::MAX as usize || self.height > i32::MAX as usize ||
                        self.width.checked_mul(self.height).map_or(true, |size| size > MAX_LAYER_CELLS);
        if too_large {
            bail!(ErrorKind::InvalidConfig(format!("layer extents {}x{} are too large",
                                                   self.width, self.height)));
        }
        let elevation = self.platform_elevation;
        if !elevation.from.is_finite() || !elevation.to.is_finite() {
            bail!(ErrorKind::InvalidConfig(format!("elevation range {}..{} is not finite",
                                                   elevation.from, elevation.to)));
        }
        if !self.altitude.is_finite() {
            bail!(ErrorKind::InvalidConfig(format!("altitude {} is not finite", self.altitude)));
        }
        if self.platform_elevation.from > self.platform_elevation.to {
            bail!(ErrorKind::InvalidConfig(format!("elevation range {}..{} is inverted",
                                                   self.platform_elevation.from,
                                                   self.platform_elevation.to)));
        }
        let steps = self.success.steps;
        if steps.to < -1 || steps.from < 0 || (steps.to >= 0 && steps.from > steps.to) {
            bail!(ErrorKind::InvalidConfig(format!("step range {}..{} is invalid",
                                                   steps.from, steps.to)));
        }
        if !(0.0..=1.0).contains(&self.success.fill_percent) {
            bail!(ErrorKind::InvalidConfig(format!("fill percent {} is not within 0..1",
                                                   self.success.fill_percent)));
        }
        if let Some((x, y)) = self.start {
            if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
                bail!(ErrorKind::InvalidConfig(format!("start {}|{} is outside the layer", x, y)));
            }
        }
        if !(self.cell_size > 0.0) || !self.cell_size.is_finite() {
            bail!(ErrorKind::InvalidConfig(format!("cell size {} must be positive", self.cell_size)));
        }
        Ok(())
    }
}

#[derive(Deserialize, PartialEq, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct MazeConfig {
    #[serde(default)]
    pub seed: u64,
    /// Derive each layer's seed from `seed` and its index.
    #[serde(default = "default_propagate_seed")]
    pub propagate_seed: bool,
    /// Bottom floor first.
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub max_towers: usize,
    #[serde(default)]
    pub max_columns_per_layer: Vec<usize>,
    /// Reserved for the renderer's population pass.
    #[serde(default)]
    pub people_percent: f32,
}

fn default_propagate_seed() -> bool {
    true
}

impl MazeConfig {
    /// `layer_count` identical layers stacked two units apart.
    pub fn uniform(seed: u64, layer_count: usize, width: Width, height: Height) -> MazeConfig {
        let layers = (0..layer_count)
            .map(|i| LayerConfig::new(0, width, height).with_altitude(i as f32 * 2.0))
            .collect();
        MazeConfig {
            seed,
            propagate_seed: true,
            layers,
            max_towers: 0,
            max_columns_per_layer: vec![0; layer_count],
            people_percent: 0.0,
        }
    }

    pub fn from_toml_str(text: &str) -> Result<MazeConfig> {
        let config: MazeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<MazeConfig> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .chain_err(|| format!("Failed to read maze configuration {}", path.display()))?;
        MazeConfig::from_toml_str(&text)
            .chain_err(|| format!("Failed to load maze configuration {}", path.display()))
    }

    /// Seed used by the layer at `index`.
    pub fn layer_seed(&self, index: LayerIndex) -> u64 {
        if self.propagate_seed {
            self.seed.wrapping_add(index.0 as u64 + 1)
        } else {
            self.layers.get(index.0).map_or(0, |layer| layer.seed)
        }
    }

    /// Column cap for a layer; layers without an entry get none.
    pub fn max_columns(&self, index: LayerIndex) -> usize {
        self.max_columns_per_layer.get(index.0).cloned().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            bail!(ErrorKind::InvalidConfig("no layers".to_string()));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.validate().chain_err(|| format!("layer {}", i))?;
        }
        if !(0.0..=1.0).contains(&self.people_percent) {
            bail!(ErrorKind::InvalidConfig(format!("people percent {} is not within 0..1",
                                                   self.people_percent)));
        }
        if !self.max_columns_per_layer.is_empty() &&
           self.max_columns_per_layer.len() != self.layers.len() {
            bail!(ErrorKind::InvalidConfig(format!("{} column limits for {} layers",
                                                   self.max_columns_per_layer.len(),
                                                   self.layers.len())));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    const SAMPLE: &str = r#"
seed = 42
max_towers = 3
max_columns_per_layer = [0, 4]

[[layers]]
width = 8
height = 6
start = [1, 2]

[[layers]]
width = 8
height = 6
altitude = 2.0
platform_elevation = { from = 0.1, to = 0.2 }
success = { steps = { from = 10, to = 5000 }, fill_percent = 0.9 }
"#;

    #[test]
    fn parses_a_full_configuration() {
        let config = MazeConfig::from_toml_str(SAMPLE).expect("valid config");
        assert_eq!(config.seed, 42);
        assert!(config.propagate_seed);
        assert_eq!(config.max_towers, 3);
        assert_eq!(config.layers.len(), 2);

        let bottom = &config.layers[0];
        assert_eq!((bottom.width, bottom.height), (8, 6));
        assert_eq!(bottom.start_coordinate(), Some(GridCoordinate::new(1, 2)));
        assert_eq!(bottom.success.steps.upper_bound(), None);
        assert_eq!(bottom.platform_elevation, FloatRange::new(0.25, 1.0));
        assert_eq!(bottom.cell_size, 1.0);

        let top = &config.layers[1];
        assert_eq!(top.altitude, 2.0);
        assert_eq!(top.success.steps, StepRange { from: 10, to: 5000 });
        assert_eq!(top.success.steps.upper_bound(), Some(5000));
        assert_eq!(top.success.fill_percent, 0.9);
        assert_eq!(top.platform_elevation, FloatRange::new(0.1, 0.2));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = "seed = 1\nflavour = \"mint\"\n[[layers]]\nwidth = 2\nheight = 2\n";
        assert!(MazeConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn layer_seeds_propagate_from_the_master_seed() {
        let mut config = MazeConfig::from_toml_str(SAMPLE).expect("valid config");
        assert_eq!(config.layer_seed(LayerIndex(0)), 43);
        assert_eq!(config.layer_seed(LayerIndex(1)), 44);

        config.seed = u64::MAX;
        assert_eq!(config.layer_seed(LayerIndex(0)), 0);

        config.propagate_seed = false;
        config.layers[1].seed = 7;
        assert_eq!(config.layer_seed(LayerIndex(0)), 0);
        assert_eq!(config.layer_seed(LayerIndex(1)), 7);
    }

    #[test]
    fn column_limits_default_to_zero() {
        let mut config = MazeConfig::uniform(0, 2, Width(3), Height(3));
        config.max_columns_per_layer = vec![];
        assert_eq!(config.max_columns(LayerIndex(1)), 0);
        config.max_columns_per_layer = vec![1, 5];
        assert_eq!(config.max_columns(LayerIndex(1)), 5);
        assert_eq!(config.max_columns(LayerIndex(9)), 0);
    }

    #[test]
    fn invalid_layers_are_rejected() {
        let base = LayerConfig::new(0, Width(4), Height(4));
        assert!(base.validate().is_ok());

        let mut empty = base.clone();
        empty.width = 0;
        assert!(empty.validate().is_err());

        let mut inverted = base.clone();
        inverted.platform_elevation = FloatRange::new(1.0, 0.5);
        assert!(inverted.validate().is_err());

        let bad_steps = base.clone().with_steps(StepRange { from: 0, to: -2 });
        assert!(bad_steps.validate().is_err());

        let backwards_steps = base.clone().with_steps(StepRange { from: 10, to: 5 });
        assert!(backwards_steps.validate().is_err());

        let outside = base.clone().with_start(GridCoordinate::new(4, 0));
        assert!(outside.validate().is_err());

        let mut flat = base.clone();
        flat.cell_size = 0.0;
        assert!(flat.validate().is_err());

        let mut endless = base.clone();
        endless.cell_size = f32::INFINITY;
        assert!(endless.validate().is_err());

        let mut unbounded_elevation = base.clone();
        unbounded_elevation.platform_elevation = FloatRange::new(0.0, f32::INFINITY);
        assert!(unbounded_elevation.validate().is_err());

        let mut undefined_elevation = base.clone();
        undefined_elevation.platform_elevation = FloatRange::new(f32::NAN, f32::NAN);
        assert!(undefined_elevation.validate().is_err());

        let mut overfilled = base.clone();
        overfilled.success.fill_percent = 1.5;
        assert!(overfilled.validate().is_err());

        let floating = base.clone().with_altitude(f32::NAN);
        assert!(floating.validate().is_err());

        let huge = LayerConfig::new(0, Width(i32::MAX as usize), Height(i32::MAX as usize));
        assert!(huge.validate().is_err());

        let just_over = LayerConfig::new(0, Width(MAX_LAYER_CELLS / 2), Height(3));
        assert!(just_over.validate().is_err());
        let largest = LayerConfig::new(0, Width(MAX_LAYER_CELLS / 2), Height(2));
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn non_finite_toml_values_are_rejected() {
        let layer = "[[layers]]\nwidth = 4\nheight = 4\n";
        for extra in &["platform_elevation = { from = 0.0, to = inf }",
                       "platform_elevation = { from = nan, to = nan }",
                       "altitude = -inf",
                       "cell_size = inf"] {
            let text = format!("{}{}\n", layer, extra);
            assert!(MazeConfig::from_toml_str(&text).is_err(), "{} should be rejected", extra);
        }
    }

    #[test]
    fn invalid_mazes_are_rejected() {
        let mut config = MazeConfig::uniform(0, 2, Width(3), Height(3));
        assert!(config.validate().is_ok());

        config.people_percent = 1.5;
        assert!(config.validate().is_err());
        config.people_percent = 0.5;

        config.max_columns_per_layer = vec![1, 2, 3];
        assert!(config.validate().is_err());
        config.max_columns_per_layer = vec![1, 2];

        config.layers.clear();
        match config.validate() {
            Err(Error(ErrorKind::InvalidConfig(_), _)) => {}
            other => panic!("expected an invalid config error, got {:?}", other),
        }
    }

    #[test]
    fn float_range_sampling() {
        let mut rng = XorShiftRng::seed_from_u64(3);
        let constant = FloatRange::constant(0.1);
        let range = FloatRange::new(0.25, 1.0);
        for _ in 0..100 {
            assert_eq!(constant.sample(&mut rng), 0.1);
            let v = range.sample(&mut rng);
            assert!(v >= 0.25 && v <= 1.0);
        }
    }
}
