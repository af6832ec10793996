use caoa::{
    evaluator::ScheduleEvaluator,
    instance_gen::{generate_instance, InstanceOptions},
    model::Problem,
    optimizer::{optimize, Bounds, CaoaOptions},
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimizer");
    group.sample_size(10);
    group.sampling_mode(criterion::SamplingMode::Flat);

    let options = InstanceOptions {
        entities: 40,
        resources: 6,
        ..InstanceOptions::default()
    };
    let (visits, capacities) = generate_instance(&options, &mut ChaCha8Rng::seed_from_u64(7));
    let problem = Problem::new(visits, capacities).unwrap();
    let evaluator = ScheduleEvaluator::port(&problem);
    let bounds = Bounds::uniform(problem.len(), 0.0, 1.0).unwrap();

    let configs = vec![
        CaoaOptions {
            population_size: 30,
            number_of_iterations: 50,
            report_interval: 0,
            seed: Some(1),
            parallel: false,
            ..CaoaOptions::default()
        },
        CaoaOptions {
            population_size: 30,
            number_of_iterations: 50,
            report_interval: 0,
            seed: Some(1),
            parallel: true,
            ..CaoaOptions::default()
        },
    ];

    for config in configs {
        group.bench_with_input(
            BenchmarkId::new(
                format!(
                    "caoa_{}",
                    if config.parallel {
                        "parallel"
                    } else {
                        "single"
                    }
                ),
                format!("{}/{}", problem.len(), config.number_of_iterations),
            ),
            &config,
            |b, config| b.iter(|| optimize(&evaluator, &bounds, config)),
        );
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
