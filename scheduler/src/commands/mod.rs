use std::{
    borrow::Cow,
    fmt::Write,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use caoa::{
    evaluator::{DecodingStrategy, DelayMeasure, Schedule},
    model::Problem,
    optimizer::{AcceptancePolicy, CaoaOptions, LeaderPolicy, Perturbation},
};
use clap::{Args, ValueEnum};
use log::{info, trace};
use visit_table_parser::{parse_capacity_table, parse_visit_table, structs::CapacityTable};

pub mod audit;
pub mod benchmark;
pub mod evaluate;
pub mod generate;
pub mod optimize;

#[derive(Args, Debug)]
pub struct ProblemArgs {
    /// Visit table (CSV with header)
    #[arg(required = true)]
    pub visits: PathBuf,

    /// Capacity table (CSV), resources missing from it get a single server
    #[arg(short, long)]
    pub capacities: Option<PathBuf>,
}

impl ProblemArgs {
    pub fn load(&self) -> Result<Problem> {
        let contents = fs::read_to_string(&self.visits)
            .with_context(|| format!("Could not read {}", self.visits.display()))?;
        trace!("visit table contents: {contents}");
        let visits = parse_visit_table(&contents)
            .with_context(|| format!("Could not parse {}", self.visits.display()))?;

        let capacities = match &self.capacities {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Could not read {}", path.display()))?;
                parse_capacity_table(&contents)
                    .with_context(|| format!("Could not parse {}", path.display()))?
            }
            None => CapacityTable::default(),
        };

        let problem = Problem::from_tables(&visits, &capacities)?;
        info!(
            "loaded {} visits of {} entities on {} resources",
            problem.len(),
            problem.entity_ids().len(),
            problem.resource_ids().len()
        );

        Ok(problem)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Decoding {
    /// Gene slots are entity turns (job-shop data)
    Rank,
    /// Priorities pull visits forward in the queue (port data)
    TimeShift,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Delay {
    /// Finish time past the due time
    Completion,
    /// Start time past the due time
    Berthing,
}

#[derive(Args, Debug)]
pub struct DecodingArgs {
    #[arg(long, value_enum, default_value_t = Decoding::TimeShift)]
    pub decoding: Decoding,

    /// Largest pull-forward of time-shift decoding, in time units of the table
    #[arg(long, default_value_t = caoa::evaluator::DEFAULT_MAX_SHIFT)]
    pub max_shift: f64,

    /// Defaults to completion for rank decoding and berthing for time-shift
    #[arg(long, value_enum)]
    pub delay: Option<Delay>,
}

impl DecodingArgs {
    pub fn strategy(&self) -> Result<DecodingStrategy> {
        match self.decoding {
            Decoding::Rank => Ok(DecodingStrategy::Rank),
            Decoding::TimeShift => {
                if !self.max_shift.is_finite() || self.max_shift < 0.0 {
                    bail!("max shift must be a finite non-negative number");
                }
                Ok(DecodingStrategy::TimeShift {
                    max_shift: self.max_shift,
                })
            }
        }
    }

    pub fn delay_measure(&self) -> DelayMeasure {
        match (self.delay, self.decoding) {
            (Some(Delay::Completion), _) | (None, Decoding::Rank) => DelayMeasure::Completion,
            (Some(Delay::Berthing), _) | (None, Decoding::TimeShift) => DelayMeasure::Berthing,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Leader {
    GlobalBest,
    FitnessProximity,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Acceptance {
    Greedy,
    Exploratory,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PerturbationArg {
    Scalar,
    PerDimension,
}

#[derive(Args, Debug)]
pub struct OptimizerArgs {
    #[arg(short = 'n', long, default_value_t = 50)]
    pub population: usize,

    #[arg(short, long, default_value_t = 100)]
    pub iterations: usize,

    #[arg(long, default_value_t = 0.5)]
    pub alpha: f64,

    #[arg(long, default_value_t = 0.1)]
    pub beta: f64,

    #[arg(long, default_value_t = 0.8)]
    pub gamma: f64,

    #[arg(long, default_value_t = 1e-4)]
    pub delta: f64,

    #[arg(long, default_value_t = 100.0)]
    pub initial_energy: f64,

    #[arg(long, value_enum, default_value_t = Leader::GlobalBest)]
    pub leader: Leader,

    #[arg(long, value_enum, default_value_t = Acceptance::Greedy)]
    pub acceptance: Acceptance,

    #[arg(long, value_enum, default_value_t = PerturbationArg::Scalar)]
    pub perturbation: PerturbationArg,

    /// Evaluate candidates on all cores
    #[arg(short, long)]
    pub parallel: bool,

    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Progress line every that many iterations, 0 disables it
    #[arg(long, default_value_t = 10)]
    pub report_interval: usize,
}

impl OptimizerArgs {
    pub fn options(&self) -> CaoaOptions {
        CaoaOptions {
            population_size: self.population,
            number_of_iterations: self.iterations,
            alpha: self.alpha,
            beta: self.beta,
            gamma: self.gamma,
            delta: self.delta,
            initial_energy: self.initial_energy,
            leader_policy: match self.leader {
                Leader::GlobalBest => LeaderPolicy::GlobalBest,
                Leader::FitnessProximity => LeaderPolicy::FitnessProximity,
            },
            acceptance_policy: match self.acceptance {
                Acceptance::Greedy => AcceptancePolicy::Greedy,
                Acceptance::Exploratory => AcceptancePolicy::Exploratory,
            },
            perturbation: match self.perturbation {
                PerturbationArg::Scalar => Perturbation::Scalar,
                PerturbationArg::PerDimension => Perturbation::PerDimension,
            },
            parallel: self.parallel,
            report_interval: self.report_interval,
            seed: self.seed,
        }
    }
}

/// Quotes `value` when it holds a comma or a quote. Line breaks cannot be read
/// back by the table parser, so they are refused.
pub(crate) fn csv_field(value: &str) -> Result<Cow<'_, str>> {
    if value.contains(&['\n', '\r'][..]) {
        bail!("`{}` contains a line break", value.escape_debug());
    }

    if value.contains(&[',', '"'][..]) {
        Ok(Cow::Owned(format!("\"{}\"", value.replace('"', "\"\""))))
    } else {
        Ok(Cow::Borrowed(value))
    }
}

pub(crate) fn ledger_csv(problem: &Problem, schedule: &Schedule) -> Result<String> {
    let mut csv = String::from(
        "entity_id,resource_id,server,ready_time,physical_ready,start,finish,waiting,due_time,delay\n",
    );

    for entry in &schedule.entries {
        let visit = &problem.visits()[entry.visit];
        writeln!(
            csv,
            "{},{},{},{},{},{},{},{},{},{}",
            csv_field(&visit.entity_id)?,
            csv_field(&visit.resource_id)?,
            entry.server,
            visit.ready_time,
            entry.physical_ready,
            entry.start,
            entry.finish,
            entry.waiting,
            visit.due_time,
            entry.delay
        )?;
    }

    Ok(csv)
}

pub(crate) fn convergence_csv(convergence: &[f64]) -> Result<String> {
    let mut csv = String::from("iteration,best_fitness\n");
    for (iteration, fitness) in convergence.iter().enumerate() {
        writeln!(csv, "{},{fitness}", iteration + 1)?;
    }

    Ok(csv)
}

pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Could not write {}", path.display()))?;
    info!("wrote {}", path.display());

    Ok(())
}

/// Up to `count` delayed visits, most delayed first.
pub(crate) fn worst_delays(problem: &Problem, schedule: &Schedule, count: usize) -> Vec<String> {
    let mut delayed: Vec<_> = schedule
        .entries
        .iter()
        .filter(|entry| entry.delay > 0.0)
        .collect();
    delayed.sort_by(|a, b| b.delay.total_cmp(&a.delay));

    delayed
        .into_iter()
        .take(count)
        .map(|entry| {
            let visit = &problem.visits()[entry.visit];
            format!(
                "{} at {} (row {}): start {}, finish {}, due {}, delay {}",
                visit.entity_id,
                visit.resource_id,
                visit.row,
                entry.start,
                entry.finish,
                visit.due_time,
                entry.delay
            )
        })
        .collect()
}
