use rand::Rng;

use crate::model::{Capacity, Time, Visit};

#[derive(Debug, Clone)]
pub struct InstanceOptions {
    pub entities: usize,
    pub resources: usize,
    pub visits_per_entity: usize,
    pub max_capacity: i64,
    /// Latest time an entity may become ready for its first visit.
    pub horizon: Time,
    /// Number each entity's visits with a sequence index and add transfer times.
    pub sequenced: bool,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            entities: 8,
            resources: 3,
            visits_per_entity: 3,
            max_capacity: 2,
            horizon: 48.0,
            sequenced: false,
        }
    }
}

// one decimal keeps generated tables readable
fn tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Random visit and capacity tables. Every entity travels along its visits
/// one after another, with a tight but reachable due time per visit.
pub fn generate_instance<R: Rng + ?Sized>(
    options: &InstanceOptions,
    rng: &mut R,
) -> (Vec<Visit>, Vec<Capacity>) {
    let resources = options.resources.max(1);
    let horizon = options.horizon.max(0.0);

    let mut visits = Vec::with_capacity(options.entities * options.visits_per_entity);

    for entity in 0..options.entities {
        let entity_id = format!("E{:02}", entity + 1);
        let mut cursor = tenths(rng.gen_range(0.0..=horizon));

        for leg in 0..options.visits_per_entity {
            let resource_id = format!("R{}", rng.gen_range(0..resources) + 1);
            let duration = tenths(rng.gen_range(1.0..12.0));
            let due_time = tenths(cursor + duration + rng.gen_range(0.0..6.0));

            let mut visit = Visit::new(
                visits.len() + 1,
                entity_id.clone(),
                resource_id,
                cursor,
                duration,
                due_time,
            );

            let mut transfer_time = 0.0;
            if options.sequenced {
                transfer_time = tenths(rng.gen_range(0.0..4.0));
                visit = visit
                    .with_sequence_index(leg as u32 + 1)
                    .with_transfer_time(transfer_time);
            }

            cursor = tenths(cursor + duration + transfer_time + rng.gen_range(0.0..8.0));
            visits.push(visit);
        }
    }

    let capacities = (0..resources)
        .map(|resource| {
            Capacity::new(
                resource + 1,
                format!("R{}", resource + 1),
                rng.gen_range(1..=options.max_capacity.max(1)),
            )
        })
        .collect();

    (visits, capacities)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::model::Problem;

    #[test]
    fn generated_instances_validate() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for sequenced in [false, true] {
            let options = InstanceOptions {
                entities: 20,
                resources: 4,
                visits_per_entity: 5,
                sequenced,
                ..InstanceOptions::default()
            };
            let (visits, capacities) = generate_instance(&options, &mut rng);

            assert_eq!(visits.len(), 100);
            assert_eq!(capacities.len(), 4);
            assert!(capacities
                .iter()
                .all(|capacity| (1..=2).contains(&capacity.server_count)));
            assert_eq!(
                visits.iter().all(|visit| visit.sequence_index.is_some()),
                sequenced
            );

            let problem = Problem::new(visits, capacities).unwrap();
            assert_eq!(problem.entity_ids().len(), 20);
        }
    }

    #[test]
    fn same_seed_same_instance() {
        let options = InstanceOptions::default();

        let first = generate_instance(&options, &mut ChaCha8Rng::seed_from_u64(9));
        let second = generate_instance(&options, &mut ChaCha8Rng::seed_from_u64(9));

        assert_eq!(first, second);
    }

    #[test]
    fn degenerate_options() {
        let options = InstanceOptions {
            resources: 0,
            max_capacity: 0,
            horizon: 0.0,
            ..InstanceOptions::default()
        };
        let (visits, capacities) = generate_instance(&options, &mut ChaCha8Rng::seed_from_u64(3));

        assert!(visits.iter().all(|visit| visit.resource_id == "R1"));
        assert_eq!(capacities, vec![Capacity::new(1, "R1", 1)]);
    }
}
