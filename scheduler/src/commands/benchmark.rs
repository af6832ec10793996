use std::path::PathBuf;

use anyhow::Result;
use caoa::{
    objective::{Benchmark, BenchmarkFunction},
    optimizer::{optimize, Bounds},
};
use clap::{Args, ValueEnum};
use log::info;

use super::{convergence_csv, write_file, OptimizerArgs};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Function {
    /// Sum of squares, unimodal
    Sphere,
    /// Cosine modulated sum of squares, multimodal
    Rastrigin,
}

impl From<Function> for BenchmarkFunction {
    fn from(function: Function) -> Self {
        match function {
            Function::Sphere => BenchmarkFunction::Sphere,
            Function::Rastrigin => BenchmarkFunction::Rastrigin,
        }
    }
}

#[derive(Args, Debug)]
pub struct BenchmarkArgs {
    #[arg(short, long, value_enum, default_value_t = Function::Sphere)]
    function: Function,

    #[arg(short, long, default_value_t = 30)]
    dimension: usize,

    #[command(flatten)]
    optimizer: OptimizerArgs,

    /// Best fitness per iteration as CSV
    #[arg(long)]
    convergence_out: Option<PathBuf>,
}

pub fn run(args: BenchmarkArgs) -> Result<()> {
    let function = BenchmarkFunction::from(args.function);
    let objective = Benchmark::new(function, args.dimension);
    let (lower, upper) = function.search_range();
    info!("{function:?} in {} dimensions on [{lower}, {upper}]", args.dimension);

    let bounds = Bounds::uniform(args.dimension, lower, upper)?;
    let outcome = optimize(&objective, &bounds, &args.optimizer.options())?;

    println!("Best fitness: {}", outcome.best_fitness);
    println!(
        "Evaluations: {}, respawns: {}, seed: {}",
        outcome.evaluations, outcome.respawns, outcome.seed
    );

    if let Some(path) = &args.convergence_out {
        write_file(path, &convergence_csv(&outcome.convergence)?)?;
    }

    Ok(())
}
