use std::path::PathBuf;

use anyhow::Result;
use caoa::evaluator::ScheduleEvaluator;
use clap::Args;
use log::info;

use super::{ledger_csv, worst_delays, write_file, DecodingArgs, ProblemArgs};

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    problem: ProblemArgs,

    #[command(flatten)]
    decoding: DecodingArgs,

    /// Priority given to every visit
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    priority: f64,

    /// Number of delayed visits to list
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Ledger CSV of the simulated schedule
    #[arg(long)]
    schedule_out: Option<PathBuf>,
}

pub fn run(args: EvaluateArgs) -> Result<()> {
    let problem = args.problem.load()?;
    let evaluator = ScheduleEvaluator::new(
        &problem,
        args.decoding.strategy()?,
        args.decoding.delay_measure(),
    );

    let schedule = evaluator.evaluate_detailed(&vec![args.priority; problem.len()])?;
    let delayed = schedule.entries.iter().filter(|e| e.delay > 0.0).count();
    info!("{delayed} of {} visits are delayed", schedule.entries.len());

    println!("Total delay: {}", schedule.total_delay);
    println!("Delayed visits: {delayed}/{}", schedule.entries.len());
    for line in worst_delays(&problem, &schedule, args.top) {
        println!("  {line}");
    }

    if let Some(path) = &args.schedule_out {
        write_file(path, &ledger_csv(&problem, &schedule)?)?;
    }

    Ok(())
}
