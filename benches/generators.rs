use criterion::{criterion_group, criterion_main, Criterion};
use temple_mazes::{
    config::{LayerConfig, MazeConfig, StepRange},
    generators::LayerGenerator,
    stack::MazeStack,
    units::{Height, Width},
    visuals::HandleCounter,
};

fn generate_layer(config: &LayerConfig) {
    let mut visuals = HandleCounter::new();
    let mut generator = LayerGenerator::new(config.clone(), &mut visuals).unwrap();
    generator.generate(&mut visuals).unwrap();
}

fn bench_layer_4x4(c: &mut Criterion) {
    let config = LayerConfig::new(17, Width(4), Height(4));
    c.bench_function("layer_4x4", move |b| b.iter(|| generate_layer(&config)));
}

fn bench_layer_8x8_capped(c: &mut Criterion) {
    let config = LayerConfig::new(17, Width(8), Height(8)).with_steps(StepRange::up_to(50_000));
    c.bench_function("layer_8x8_capped", move |b| b.iter(|| generate_layer(&config)));
}

fn bench_stack_3x4x4(c: &mut Criterion) {
    let config = MazeConfig::uniform(5, 3, Width(4), Height(4));
    c.bench_function("stack_3x4x4", move |b| {
        b.iter(|| MazeStack::build(&config, &mut HandleCounter::new()).unwrap())
    });
}

criterion_group!(benches, bench_layer_4x4, bench_layer_8x8_capped, bench_stack_3x4x4);
criterion_main!(benches);
