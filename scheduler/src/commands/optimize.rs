use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::{Context, Result};
use caoa::{
    evaluator::ScheduleEvaluator,
    optimizer::{optimize, Bounds, CaoaOutcome},
};
use clap::Args;
use log::info;
use serde::Serialize;

use super::{
    convergence_csv, ledger_csv, worst_delays, write_file, DecodingArgs, OptimizerArgs,
    ProblemArgs,
};

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    #[command(flatten)]
    problem: ProblemArgs,

    #[command(flatten)]
    decoding: DecodingArgs,

    #[command(flatten)]
    optimizer: OptimizerArgs,

    /// Lower bound of every priority
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    lower: f64,

    /// Upper bound of every priority
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    upper: f64,

    /// Ledger CSV of the best schedule
    #[arg(long)]
    schedule_out: Option<PathBuf>,

    /// Best fitness per iteration as CSV
    #[arg(long)]
    convergence_out: Option<PathBuf>,

    /// Outcome and ledger as JSON
    #[arg(long)]
    json_out: Option<PathBuf>,
}

#[derive(Serialize)]
struct LedgerRow<'a> {
    entity_id: &'a str,
    resource_id: &'a str,
    row: usize,
    server: usize,
    ready_time: f64,
    physical_ready: f64,
    start: f64,
    finish: f64,
    waiting: f64,
    due_time: f64,
    delay: f64,
}

#[derive(Serialize)]
struct Report<'a> {
    outcome: &'a CaoaOutcome,
    total_delay: f64,
    baseline_delay: f64,
    schedule: Vec<LedgerRow<'a>>,
}

pub fn run(args: OptimizeArgs) -> Result<()> {
    let problem = args.problem.load()?;
    let evaluator = ScheduleEvaluator::new(
        &problem,
        args.decoding.strategy()?,
        args.decoding.delay_measure(),
    );
    info!(
        "decoding {:?}, delay measured at {:?}",
        evaluator.strategy(),
        evaluator.delay_measure()
    );

    let bounds = Bounds::uniform(problem.len(), args.lower, args.upper)?;
    let neutral = vec![(args.lower + args.upper) / 2.0; problem.len()];
    let baseline_delay = evaluator.evaluate(&neutral)?;
    info!("total delay with neutral priorities: {baseline_delay}");

    let outcome = optimize(&evaluator, &bounds, &args.optimizer.options())?;
    let schedule = evaluator.evaluate_detailed(&outcome.best_position)?;

    println!("Total delay: {}", schedule.total_delay);
    println!("Neutral priorities: {baseline_delay}");
    println!(
        "Evaluations: {}, respawns: {}, seed: {}",
        outcome.evaluations, outcome.respawns, outcome.seed
    );
    for line in worst_delays(&problem, &schedule, 5) {
        println!("  {line}");
    }

    if let Some(path) = &args.schedule_out {
        write_file(path, &ledger_csv(&problem, &schedule)?)?;
    }

    if let Some(path) = &args.convergence_out {
        write_file(path, &convergence_csv(&outcome.convergence)?)?;
    }

    if let Some(path) = &args.json_out {
        let report = Report {
            outcome: &outcome,
            total_delay: schedule.total_delay,
            baseline_delay,
            schedule: schedule
                .entries
                .iter()
                .map(|entry| {
                    let visit = &problem.visits()[entry.visit];
                    LedgerRow {
                        entity_id: &visit.entity_id,
                        resource_id: &visit.resource_id,
                        row: visit.row,
                        server: entry.server,
                        ready_time: visit.ready_time,
                        physical_ready: entry.physical_ready,
                        start: entry.start,
                        finish: entry.finish,
                        waiting: entry.waiting,
                        due_time: visit.due_time,
                        delay: entry.delay,
                    }
                })
                .collect(),
        };

        let writer = File::create(path)
            .with_context(|| format!("Could not create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(writer), &report)?;
        info!("wrote {}", path.display());
    }

    Ok(())
}
