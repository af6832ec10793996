use std::{fmt::Write, path::PathBuf};

use anyhow::Result;
use caoa::{
    instance_gen::{generate_instance, InstanceOptions},
    model::{Capacity, Visit},
};
use clap::Args;
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{csv_field, write_file};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long, required = true)]
    visits_out: PathBuf,

    #[arg(long, required = true)]
    capacities_out: PathBuf,

    #[arg(long, default_value_t = 8)]
    entities: usize,

    #[arg(long, default_value_t = 3)]
    resources: usize,

    #[arg(long, default_value_t = 3)]
    visits_per_entity: usize,

    #[arg(long, default_value_t = 2)]
    max_capacity: i64,

    /// Latest first ready time
    #[arg(long, default_value_t = 48.0)]
    horizon: f64,

    /// Number the visits of every entity and add transfer times
    #[arg(long)]
    sequenced: bool,

    #[arg(short, long)]
    seed: Option<u64>,
}

fn optional(value: Option<impl ToString>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

fn visits_csv(visits: &[Visit]) -> Result<String> {
    let mut csv = String::from(
        "entity_id,resource_id,ready_time,duration,due_time,transfer_time,sequence_index\n",
    );

    for visit in visits {
        writeln!(
            csv,
            "{},{},{},{},{},{},{}",
            csv_field(&visit.entity_id)?,
            csv_field(&visit.resource_id)?,
            visit.ready_time,
            visit.duration,
            visit.due_time,
            optional(visit.transfer_time),
            optional(visit.sequence_index)
        )?;
    }

    Ok(csv)
}

fn capacities_csv(capacities: &[Capacity]) -> Result<String> {
    let mut csv = String::from("resource_id,server_count\n");
    for capacity in capacities {
        writeln!(
            csv,
            "{},{}",
            csv_field(&capacity.resource_id)?,
            capacity.server_count
        )?;
    }

    Ok(csv)
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let options = InstanceOptions {
        entities: args.entities,
        resources: args.resources,
        visits_per_entity: args.visits_per_entity,
        max_capacity: args.max_capacity,
        horizon: args.horizon,
        sequenced: args.sequenced,
    };

    let (visits, capacities) = generate_instance(&options, &mut ChaCha8Rng::seed_from_u64(seed));
    info!(
        "generated {} visits on {} resources (seed {seed})",
        visits.len(),
        capacities.len()
    );

    write_file(&args.visits_out, &visits_csv(&visits)?)?;
    write_file(&args.capacities_out, &capacities_csv(&capacities)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use caoa::model::Problem;
    use visit_table_parser::{parse_capacity_table, parse_visit_table};

    use super::*;

    #[test]
    fn generated_tables_read_back() {
        let options = InstanceOptions {
            sequenced: true,
            ..InstanceOptions::default()
        };
        let (visits, capacities) = generate_instance(&options, &mut ChaCha8Rng::seed_from_u64(4));

        let visit_table = parse_visit_table(&visits_csv(&visits).unwrap()).unwrap();
        let capacity_table = parse_capacity_table(&capacities_csv(&capacities).unwrap()).unwrap();
        let problem = Problem::from_tables(&visit_table, &capacity_table).unwrap();

        assert_eq!(problem.len(), visits.len());
        for (read, written) in problem.visits().iter().zip(&visits) {
            assert_eq!(read.entity_id, written.entity_id);
            assert_eq!(read.ready_time, written.ready_time);
            assert_eq!(read.transfer_time, written.transfer_time);
            assert_eq!(read.sequence_index, written.sequence_index);
        }
    }

    #[test]
    fn absent_optionals_are_empty_cells() {
        let csv = visits_csv(&[Visit::new(1, "A", "P", 0.0, 1.5, 2.0)]).unwrap();

        assert_eq!(csv.lines().nth(1), Some("A,P,0,1.5,2,,"));
    }
}
