#![forbid(unsafe_code)]
use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use log::{debug, error};

mod commands;

use commands::{
    audit::AuditArgs, benchmark::BenchmarkArgs, evaluate::EvaluateArgs, generate::GenerateArgs,
    optimize::OptimizeArgs,
};

#[derive(Debug, Parser)]
#[command(author, version)]
/// Berth and job-shop scheduler driven by the crocodile ambush optimizer
struct App {
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a low delay schedule for a visit table
    Optimize(OptimizeArgs),
    /// Simulate one constant priority vector and list the most delayed visits
    Evaluate(EvaluateArgs),
    /// Report planned overlaps that exceed resource capacity
    Audit(AuditArgs),
    /// Run the optimizer on an analytic test function
    Benchmark(BenchmarkArgs),
    /// Write a random visit table and capacity table
    Generate(GenerateArgs),
}

fn main() {
    let args: App = App::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    debug!("{args:?}");

    if let Err(err) = match args.command {
        Commands::Optimize(args) => commands::optimize::run(args),
        Commands::Evaluate(args) => commands::evaluate::run(args),
        Commands::Audit(args) => commands::audit::run(args),
        Commands::Benchmark(args) => commands::benchmark::run(args),
        Commands::Generate(args) => commands::generate::run(args),
    } {
        error!("An error occurred: {:#}", err);
        std::process::exit(1);
    }
}
