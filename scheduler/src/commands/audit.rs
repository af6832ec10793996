use std::{fmt::Write, path::PathBuf};

use anyhow::Result;
use caoa::audit::{find_conflicts, planned_intervals, Conflict};
use caoa::model::Problem;
use clap::Args;
use log::warn;

use super::{csv_field, write_file, ProblemArgs};

#[derive(Args, Debug)]
pub struct AuditArgs {
    #[command(flatten)]
    problem: ProblemArgs,

    /// Conflict report as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn conflict_csv(problem: &Problem, conflicts: &[Conflict]) -> Result<String> {
    let mut csv = String::from("resource_id,time,occupancy,capacity,entities\n");

    for conflict in conflicts {
        let entities: Vec<String> = conflict
            .visits
            .iter()
            .map(|&visit| {
                let visit = &problem.visits()[visit];
                format!("{}(row {})", visit.entity_id, visit.row)
            })
            .collect();

        writeln!(
            csv,
            "{},{},{},{},{}",
            csv_field(&conflict.resource_id)?,
            conflict.time,
            conflict.occupancy,
            conflict.capacity,
            csv_field(&entities.join(" | "))?
        )?;
    }

    Ok(csv)
}

pub fn run(args: AuditArgs) -> Result<()> {
    let problem = args.problem.load()?;
    let conflicts = find_conflicts(&problem, &planned_intervals(&problem));

    if conflicts.is_empty() {
        println!("No planned conflicts found");
    } else {
        warn!("{} planned conflicts found", conflicts.len());
        println!("{} planned conflicts found", conflicts.len());
        for conflict in conflicts.iter().take(5) {
            println!(
                "  {} at {}: {} visits on {} servers",
                conflict.resource_id, conflict.time, conflict.occupancy, conflict.capacity
            );
        }
    }

    if let Some(path) = &args.output {
        write_file(path, &conflict_csv(&problem, &conflicts)?)?;
    }

    Ok(())
}
