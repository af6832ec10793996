use caoa::{
    evaluator::{DecodingStrategy, DelayMeasure, ScheduleEvaluator, DEFAULT_MAX_SHIFT},
    instance_gen::{generate_instance, InstanceOptions},
    model::Problem,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluator");

    for entities in [20, 100, 500] {
        let mut rng = ChaCha8Rng::seed_from_u64(entities as u64);
        let options = InstanceOptions {
            entities,
            resources: 10,
            visits_per_entity: 4,
            sequenced: true,
            ..InstanceOptions::default()
        };
        let (visits, capacities) = generate_instance(&options, &mut rng);
        let problem = Problem::new(visits, capacities).unwrap();
        let priorities: Vec<f64> = (0..problem.len()).map(|_| rng.gen()).collect();

        for (name, strategy) in [
            ("rank", DecodingStrategy::Rank),
            (
                "time_shift",
                DecodingStrategy::TimeShift {
                    max_shift: DEFAULT_MAX_SHIFT,
                },
            ),
        ] {
            let evaluator = ScheduleEvaluator::new(&problem, strategy, DelayMeasure::Completion);

            group.bench_with_input(
                BenchmarkId::new(name, problem.len()),
                &priorities,
                |b, priorities| b.iter(|| evaluator.evaluate(black_box(priorities))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
