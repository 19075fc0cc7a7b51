//! Several layers generated one after the other, bottom first, and joined
//! pairwise by a single link each.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use tracing::{info, warn};

use crate::cells::GridCoordinate;
use crate::config::MazeConfig;
use crate::errors::*;
use error_chain::bail;
use crate::generators::{GenerationReport, GenerationState, LayerGenerator};
use crate::lattice::Lattice;
use crate::linker::{link_layers, LayerLink, LayerView};
use crate::units::LayerIndex;
use crate::visuals::{GridPlacement, Point3, Visuals};


/// One generated floor.
#[derive(Clone, Debug)]
pub struct Layer {
    pub index: LayerIndex,
    /// Seed the layer was actually generated with.
    pub seed: u64,
    pub lattice: Lattice,
    pub report: GenerationReport,
    pub placement: GridPlacement,
}

impl Layer {
    pub fn view(&self) -> LayerView<'_> {
        LayerView::new(self.index, &self.lattice, &self.placement)
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.report.state == GenerationState::Success
    }
}

#[derive(Clone, Debug)]
pub struct MazeStack {
    layers: Vec<Layer>,
    links: Vec<LayerLink>,
}

impl MazeStack {
    /// Generate every configured layer and link each one to the layer above.
    ///
    /// A layer that stops short of success, or a pair of layers without a
    /// compatible slot pair, is logged and skipped over; the rest of the
    /// stack is still built. Use `require_complete` to turn those into errors.
    pub fn build(config: &MazeConfig, visuals: &mut dyn Visuals) -> Result<MazeStack> {
        config.validate()?;

        let mut layers = Vec::with_capacity(config.layers.len());
        for (i, layer_config) in config.layers.iter().enumerate() {
            let index = LayerIndex(i);
            let mut layer_config = layer_config.clone();
            layer_config.seed = config.layer_seed(index);
            let placement = GridPlacement::new(Point3::new(0.0, layer_config.altitude, 0.0),
                                               layer_config.cell_size);
            let seed = layer_config.seed;

            let mut generator = LayerGenerator::new(layer_config, visuals)
                .chain_err(|| format!("Failed to start layer {}", i))?;
            let report = generator.generate(visuals)?;
            if let Err(e) = report.into_result(index) {
                warn!("{}", e);
            }
            layers.push(Layer {
                index,
                seed,
                lattice: generator.into_lattice(),
                report,
                placement,
            });
        }

        let mut links = Vec::with_capacity(layers.len().saturating_sub(1));
        for pair in layers.windows(2) {
            match link_layers(&pair[0].view(), &pair[1].view()) {
                Ok(link) => {
                    visuals.place_layer_link(&link);
                    links.push(link);
                }
                Err(Error(ErrorKind::LinkingUnavailable(lower, upper), _)) => {
                    warn!("can't connect layer {} to {}", lower, upper);
                }
                Err(e) => return Err(e),
            }
        }

        info!(layers = layers.len(), links = links.len(), "maze stack built");
        Ok(MazeStack { layers, links })
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: LayerIndex) -> Option<&Layer> {
        self.layers.get(index.0)
    }

    /// Links that could be made, bottom pair first.
    #[inline]
    pub fn links(&self) -> &[LayerLink] {
        &self.links
    }

    /// The link from `lower` to the layer directly above it.
    pub fn link_above(&self, lower: LayerIndex) -> Option<&LayerLink> {
        self.links.iter().find(|link| link.lower_layer == lower)
    }

    /// Every layer succeeded and every adjacent pair is linked.
    pub fn require_complete(&self) -> Result<()> {
        for layer in &self.layers {
            layer.report.into_result(layer.index)?;
        }
        for i in 1..self.layers.len() {
            if self.link_above(LayerIndex(i - 1)).is_none() {
                bail!(ErrorKind::LinkingUnavailable(i - 1, i));
            }
        }
        Ok(())
    }

    pub fn clearance(&self) -> ColumnClearance {
        ColumnClearance::compute(self.layers.iter().map(|layer| &layer.lattice))
    }

    pub fn plan_supports(&self, config: &MazeConfig) -> SupportPlan {
        self.clearance().plan_supports(config)
    }
}

/// Per coordinate of the bottom layer: how many layers, counted upwards from
/// the bottom, are empty there before the first occupied one.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct ColumnClearance {
    width: usize,
    height: usize,
    layer_count: usize,
    // x major, matching the scan order of the queries below
    counts: Vec<usize>,
}

impl ColumnClearance {
    pub fn compute<'a, I>(layers: I) -> ColumnClearance
        where I: IntoIterator<Item = &'a Lattice>
    {
        let layers = layers.into_iter().collect::<Vec<_>>();
        let (width, height) = layers.first().map_or((0, 0), |l| (l.width(), l.height()));

        let mut counts = Vec::with_capacity(width * height);
        for x in 0..width as i32 {
            for y in 0..height as i32 {
                let coord = GridCoordinate::new(x, y);
                let clear = layers.iter().take_while(|l| l.get(coord).is_none()).count();
                counts.push(clear);
            }
        }

        ColumnClearance {
            width,
            height,
            layer_count: layers.len(),
            counts,
        }
    }

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn at(&self, coord: GridCoordinate) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 || coord.x as usize >= self.width || coord.y as usize >= self.height {
            return None;
        }
        self.counts.get(coord.x as usize * self.height + coord.y as usize).cloned()
    }

    /// (coordinate, clearance) pairs, x major.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoordinate, usize)> + '_ {
        let height = self.height.max(1);
        self.counts.iter().enumerate().map(move |(i, clear)| {
            (GridCoordinate::new((i / height) as i32, (i % height) as i32), *clear)
        })
    }

    /// Coordinates empty on every layer, where a tower can stand.
    pub fn full_columns(&self) -> Vec<GridCoordinate> {
        self.sites_with(self.layer_count)
    }

    /// Occupied coordinates of `layer` with nothing under them on any lower
    /// layer, where a support column can go.
    pub fn column_sites(&self, layer: LayerIndex) -> Vec<GridCoordinate> {
        if layer.0 >= self.layer_count {
            return vec![];
        }
        self.sites_with(layer.0)
    }

    fn sites_with(&self, clearance: usize) -> Vec<GridCoordinate> {
        self.iter().filter(|&(_, clear)| clear == clearance).map(|(coord, _)| coord).collect()
    }

    /// Pick tower and column sites at random, up to the configured limits.
    /// Draws come from a generator seeded with the maze's master seed.
    pub fn plan_supports(&self, config: &MazeConfig) -> SupportPlan {
        let mut rng = XorShiftRng::seed_from_u64(config.seed);

        let mut towers = self.full_columns();
        towers.shuffle(&mut rng);
        towers.truncate(config.max_towers);

        let columns = (0..self.layer_count)
            .map(|i| {
                let mut sites = self.column_sites(LayerIndex(i));
                sites.shuffle(&mut rng);
                sites.truncate(config.max_columns(LayerIndex(i)));
                sites
            })
            .collect();

        SupportPlan { towers, columns }
    }
}

/// Where decorative supports go.
#[derive(Eq, PartialEq, Clone, Debug, Default)]
pub struct SupportPlan {
    pub towers: Vec<GridCoordinate>,
    /// Indexed by layer.
    pub columns: Vec<Vec<GridCoordinate>>,
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::cells::{Cell, CellDescriptor};
    use crate::config::LayerConfig;
    use crate::units::{Height, Width};
    use crate::visuals::HandleCounter;

    fn gc(x: i32, y: i32) -> GridCoordinate {
        GridCoordinate::new(x, y)
    }

    fn lattice_with(w: usize, h: usize, coords: &[GridCoordinate]) -> Lattice {
        let mut l = Lattice::new(Width(w), Height(h));
        for coord in coords {
            l.set(*coord, Some(Cell::new(CellDescriptor::default()))).expect("inside");
        }
        l
    }

    // Three 2x2 floors: (0,0) on the ground, (1,0) one up, (1,1) on top and
    // (0,1) empty all the way.
    fn staircase() -> Vec<Lattice> {
        vec![lattice_with(2, 2, &[gc(0, 0)]),
             lattice_with(2, 2, &[gc(1, 0)]),
             lattice_with(2, 2, &[gc(1, 1)])]
    }

    fn three_floor_config(seed: u64) -> MazeConfig {
        MazeConfig::uniform(seed, 3, Width(4), Height(4))
    }

    #[test]
    fn layers_use_propagated_seeds() {
        let config = three_floor_config(11);
        let mut visuals = HandleCounter::new();
        let stack = MazeStack::build(&config, &mut visuals).expect("stack");
        assert_eq!(stack.layers().len(), 3);

        for layer in stack.layers() {
            assert_eq!(layer.seed, 11 + layer.index.0 as u64 + 1);
            // Same lattice as generating the layer on its own with that seed
            let single = LayerConfig::new(layer.seed, Width(4), Height(4));
            let mut own_visuals = HandleCounter::new();
            let mut generator = LayerGenerator::new(single, &mut own_visuals).expect("layer");
            generator.generate(&mut own_visuals).expect("generation");
            assert_eq!(generator.lattice().occupied().map(|(c, _)| c).collect::<Vec<_>>(),
                       layer.lattice.occupied().map(|(c, _)| c).collect::<Vec<_>>());
            assert_eq!(generator.lattice().links(), layer.lattice.links());
            assert!(layer.is_complete());
        }
        assert_eq!(stack.layer(LayerIndex(1)).map(|l| l.placement.origin.y), Some(2.0));
    }

    #[test]
    fn links_join_facing_vacant_slots() {
        let config = three_floor_config(3);
        let mut visuals = HandleCounter::new();
        let stack = MazeStack::build(&config, &mut visuals).expect("stack");

        assert_eq!(visuals.layer_links(), stack.links());
        assert!(stack.links().len() <= 2);
        for link in stack.links() {
            let lower = &stack.layers()[link.lower_layer.0].lattice;
            let upper = &stack.layers()[link.upper_layer().0].lattice;
            assert!(lower.get(link.lower).expect("lower cell").is_vacant(link.lower_direction));
            assert!(upper.get(link.upper).expect("upper cell").is_vacant(link.upper_direction));
            assert_eq!(link.lower.offset(link.lower_direction), link.upper);
            assert_eq!(link.lower_direction.opposite(), link.upper_direction);
            assert_eq!(stack.link_above(link.lower_layer), Some(link));
        }
        assert!(stack.link_above(LayerIndex(2)).is_none());
    }

    #[test]
    fn builds_are_deterministic() {
        let config = three_floor_config(99);
        let first = MazeStack::build(&config, &mut HandleCounter::new()).expect("stack");
        let second = MazeStack::build(&config, &mut HandleCounter::new()).expect("stack");
        for (a, b) in first.layers().iter().zip(second.layers()) {
            assert_eq!(a.lattice, b.lattice);
            assert_eq!(a.report, b.report);
        }
        assert_eq!(first.links(), second.links());
        assert_eq!(first.plan_supports(&config), second.plan_supports(&config));
    }

    #[test]
    fn incomplete_layers_are_kept_but_reported() {
        let mut config = three_floor_config(5);
        config.layers[1].success.steps = crate::config::StepRange::up_to(1);
        let stack = MazeStack::build(&config, &mut HandleCounter::new()).expect("stack");
        assert_eq!(stack.layers()[1].report.state, GenerationState::Exhausted);
        assert_eq!(stack.layers()[1].lattice.blocks_count(), 1);
        match stack.require_complete() {
            Err(Error(ErrorKind::GenerationExhausted(1, 1), _)) => {}
            other => panic!("expected layer 1 to be reported, got {:?}", other),
        }
    }

    #[test]
    fn invalid_configs_build_nothing() {
        let mut config = three_floor_config(0);
        config.layers.clear();
        let mut visuals = HandleCounter::new();
        assert!(MazeStack::build(&config, &mut visuals).is_err());
        assert_eq!(visuals.placed_count(), 0);
    }

    #[test]
    fn non_finite_elevations_fail_before_generation() {
        let mut config = three_floor_config(4);
        config.layers[2].platform_elevation = crate::config::FloatRange::new(0.0, f32::INFINITY);
        let mut visuals = HandleCounter::new();
        assert!(MazeStack::build(&config, &mut visuals).is_err());
        assert_eq!(visuals.placed_count(), 0);
    }

    #[test]
    fn clearance_counts_empty_layers_from_the_bottom() {
        let floors = staircase();
        let clearance = ColumnClearance::compute(&floors);
        assert_eq!(clearance.layer_count(), 3);
        assert_eq!(clearance.at(gc(0, 0)), Some(0));
        assert_eq!(clearance.at(gc(1, 0)), Some(1));
        assert_eq!(clearance.at(gc(1, 1)), Some(2));
        assert_eq!(clearance.at(gc(0, 1)), Some(3));
        assert_eq!(clearance.at(gc(2, 0)), None);
        assert_eq!(clearance.iter().map(|(c, _)| c).collect::<Vec<_>>(),
                   vec![gc(0, 0), gc(0, 1), gc(1, 0), gc(1, 1)]);

        assert_eq!(clearance.full_columns(), vec![gc(0, 1)]);
        assert_eq!(clearance.column_sites(LayerIndex(0)), vec![gc(0, 0)]);
        assert_eq!(clearance.column_sites(LayerIndex(1)), vec![gc(1, 0)]);
        assert_eq!(clearance.column_sites(LayerIndex(2)), vec![gc(1, 1)]);
        assert!(clearance.column_sites(LayerIndex(3)).is_empty());
    }

    #[test]
    fn an_occupied_floor_blocks_everything_above() {
        // Something on the ground floor hides the empty slots above it
        let floors = vec![lattice_with(2, 1, &[gc(0, 0)]), lattice_with(2, 1, &[])];
        let clearance = ColumnClearance::compute(&floors);
        assert_eq!(clearance.at(gc(0, 0)), Some(0));
        assert_eq!(clearance.at(gc(1, 0)), Some(2));
        assert!(clearance.column_sites(LayerIndex(1)).is_empty());
    }

    #[test]
    fn no_layers_no_clearance() {
        let clearance = ColumnClearance::compute(Vec::<&Lattice>::new());
        assert_eq!(clearance.iter().count(), 0);
        assert!(clearance.full_columns().is_empty());
    }

    #[test]
    fn support_plans_respect_limits() {
        let floors = staircase();
        let clearance = ColumnClearance::compute(&floors);
        let mut config = three_floor_config(1);

        config.max_towers = 0;
        config.max_columns_per_layer = vec![0, 0, 0];
        let plan = clearance.plan_supports(&config);
        assert!(plan.towers.is_empty());
        assert_eq!(plan.columns, vec![vec![], vec![], vec![]]);

        config.max_towers = 5;
        config.max_columns_per_layer = vec![1, 0, 4];
        let plan = clearance.plan_supports(&config);
        assert_eq!(plan.towers, vec![gc(0, 1)]);
        assert_eq!(plan.columns, vec![vec![gc(0, 0)], vec![], vec![gc(1, 1)]]);
    }

    #[test]
    fn support_plans_pick_distinct_sites() {
        // An empty top floor over a full 3x3 ground: all nine are column sites
        // for the ground and there are no tower sites
        let everywhere = (0..3).flat_map(|x| (0..3).map(move |y| gc(x, y))).collect::<Vec<_>>();
        let floors = vec![lattice_with(3, 3, &everywhere), lattice_with(3, 3, &[])];
        let clearance = ColumnClearance::compute(&floors);
        let mut config = MazeConfig::uniform(8, 2, Width(3), Height(3));
        config.max_towers = 3;
        config.max_columns_per_layer = vec![4, 4];

        let plan = clearance.plan_supports(&config);
        assert!(plan.towers.is_empty());
        assert_eq!(plan.columns[0].len(), 4);
        assert!(plan.columns[1].is_empty());
        let mut distinct = plan.columns[0].clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), 4);
        assert_eq!(plan, clearance.plan_supports(&config));
    }
}
