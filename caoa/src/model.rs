use std::cmp::Ordering;

use hashbrown::{HashMap, HashSet};
use log::{debug, warn};
use serde::Serialize;
use visit_table_parser::structs::{CapacityRecord, CapacityTable, VisitRecord, VisitTable};

use crate::error::ValidationError;

/// Absolute time, in whatever unit the input tables use (hours for port data).
pub type Time = f64;

/// One resource occupying piece of work of an entity: a port call of a ship or
/// an operation of a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visit {
    pub row: usize,
    pub entity_id: String,
    pub resource_id: String,
    pub ready_time: Time,
    pub duration: Time,
    pub due_time: Time,
    pub transfer_time: Option<Time>,
    pub sequence_index: Option<u32>,
}

impl Visit {
    pub fn new(
        row: usize,
        entity_id: impl Into<String>,
        resource_id: impl Into<String>,
        ready_time: Time,
        duration: Time,
        due_time: Time,
    ) -> Self {
        Self {
            row,
            entity_id: entity_id.into(),
            resource_id: resource_id.into(),
            ready_time,
            duration,
            due_time,
            transfer_time: None,
            sequence_index: None,
        }
    }

    pub fn with_transfer_time(mut self, transfer_time: Time) -> Self {
        self.transfer_time = Some(transfer_time);
        self
    }

    pub fn with_sequence_index(mut self, sequence_index: u32) -> Self {
        self.sequence_index = Some(sequence_index);
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let row = self.row;

        let finite_fields = [
            ("ready_time", Some(self.ready_time)),
            ("duration", Some(self.duration)),
            ("due_time", Some(self.due_time)),
            ("transfer_time", self.transfer_time),
        ];
        for (field, value) in finite_fields {
            if value.map_or(false, |value| !value.is_finite()) {
                return Err(ValidationError::NonFinite { row, field });
            }
        }

        if self.duration < 0.0 {
            return Err(ValidationError::Negative {
                row,
                field: "duration",
            });
        }
        if self.transfer_time.unwrap_or(0.0) < 0.0 {
            return Err(ValidationError::Negative {
                row,
                field: "transfer_time",
            });
        }

        if self.due_time < self.ready_time {
            return Err(ValidationError::DueBeforeReady {
                row,
                ready_time: self.ready_time,
                due_time: self.due_time,
            });
        }

        Ok(())
    }
}

impl From<&VisitRecord> for Visit {
    fn from(record: &VisitRecord) -> Self {
        Self {
            row: record.line,
            entity_id: record.entity_id.clone(),
            resource_id: record.resource_id.clone(),
            ready_time: record.ready_time,
            duration: record.duration,
            due_time: record.due_time,
            transfer_time: record.transfer_time,
            sequence_index: record.sequence_index,
        }
    }
}

/// Number of identical parallel servers (berths, machines) of a resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capacity {
    pub row: usize,
    pub resource_id: String,
    pub server_count: i64,
}

impl Capacity {
    pub fn new(row: usize, resource_id: impl Into<String>, server_count: i64) -> Self {
        Self {
            row,
            resource_id: resource_id.into(),
            server_count,
        }
    }
}

impl From<&CapacityRecord> for Capacity {
    fn from(record: &CapacityRecord) -> Self {
        Self {
            row: record.line,
            resource_id: record.resource_id.clone(),
            server_count: record.server_count,
        }
    }
}

/// Validated visits and capacities, with entity and resource ids interned to
/// dense indices for the simulation.
///
/// Resources that are referenced by a visit but missing from the capacity
/// table get a single server.
#[derive(Debug, Clone)]
pub struct Problem {
    visits: Vec<Visit>,
    entity_ids: Vec<String>,
    resource_ids: Vec<String>,
    capacities: Vec<usize>,
    visit_entity: Vec<usize>,
    visit_resource: Vec<usize>,
    // per entity, all visits in the order they have to be served
    chains: Vec<Vec<usize>>,
    // per entity, only the visits carrying a sequence index
    sequenced_chains: Vec<Vec<usize>>,
    // gene slot -> entity, used by rank decoding
    gene_slots: Vec<usize>,
}

impl Problem {
    pub fn new(visits: Vec<Visit>, capacities: Vec<Capacity>) -> Result<Self, ValidationError> {
        if visits.is_empty() {
            return Err(ValidationError::NoVisits);
        }

        for visit in &visits {
            visit.validate()?;
        }

        let mut capacity_by_resource: HashMap<&str, usize> = HashMap::new();
        for capacity in &capacities {
            if capacity.server_count <= 0 {
                return Err(ValidationError::NonPositiveCapacity {
                    row: capacity.row,
                    resource_id: capacity.resource_id.clone(),
                    server_count: capacity.server_count,
                });
            }

            let previous = capacity_by_resource
                .insert(capacity.resource_id.as_str(), capacity.server_count as usize);
            if previous.is_some() {
                return Err(ValidationError::DuplicateCapacity {
                    row: capacity.row,
                    resource_id: capacity.resource_id.clone(),
                });
            }
        }

        let mut entity_ids: Vec<String> = visits.iter().map(|v| v.entity_id.clone()).collect();
        entity_ids.sort_by(|a, b| natural_order(a, b));
        entity_ids.dedup();

        let entity_index: HashMap<&str, usize> = entity_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.as_str(), index))
            .collect();

        let mut resource_ids: Vec<String> = vec![];
        let mut resource_index: HashMap<&str, usize> = HashMap::new();
        let mut visit_entity = Vec::with_capacity(visits.len());
        let mut visit_resource = Vec::with_capacity(visits.len());

        for visit in &visits {
            visit_entity.push(entity_index[visit.entity_id.as_str()]);

            let next_index = resource_ids.len();
            let resource = *resource_index
                .entry(visit.resource_id.as_str())
                .or_insert(next_index);
            if resource == next_index {
                resource_ids.push(visit.resource_id.clone());
            }
            visit_resource.push(resource);
        }

        let mut demand = vec![0; resource_ids.len()];
        for &resource in &visit_resource {
            demand[resource] += 1;
        }

        // servers beyond the number of visits at a resource are never claimed
        let resource_capacities: Vec<usize> = resource_ids
            .iter()
            .zip(&demand)
            .map(|(id, &visits_here)| {
                let servers = match capacity_by_resource.get(id.as_str()) {
                    Some(&servers) => servers,
                    None => {
                        warn!("resource `{id}` has no capacity entry, assuming a single server");
                        1
                    }
                };
                if servers > visits_here {
                    debug!("resource `{id}`: {servers} servers for {visits_here} visits");
                }
                servers.min(visits_here)
            })
            .collect();

        for capacity in &capacities {
            if !resource_index.contains_key(capacity.resource_id.as_str()) {
                debug!(
                    "capacity entry for `{}` is not referenced by any visit",
                    capacity.resource_id
                );
            }
        }
        drop(entity_index);
        drop(resource_index);

        let mut chains: Vec<Vec<usize>> = vec![vec![]; entity_ids.len()];
        let mut seen_sequences: Vec<HashSet<u32>> = vec![HashSet::new(); entity_ids.len()];
        for (index, visit) in visits.iter().enumerate() {
            let entity = visit_entity[index];

            if let Some(sequence_index) = visit.sequence_index {
                if !seen_sequences[entity].insert(sequence_index) {
                    return Err(ValidationError::DuplicateSequence {
                        row: visit.row,
                        entity_id: visit.entity_id.clone(),
                        sequence_index,
                    });
                }
            }

            chains[entity].push(index);
        }

        for chain in chains.iter_mut() {
            chain.sort_by(|&a, &b| {
                let (a_visit, b_visit) = (&visits[a], &visits[b]);
                a_visit
                    .sequence_index
                    .unwrap_or(u32::MAX)
                    .cmp(&b_visit.sequence_index.unwrap_or(u32::MAX))
                    .then(a_visit.ready_time.total_cmp(&b_visit.ready_time))
                    .then(a.cmp(&b))
            });
        }

        let sequenced_chains: Vec<Vec<usize>> = chains
            .iter()
            .map(|chain| {
                chain
                    .iter()
                    .copied()
                    .filter(|&index| visits[index].sequence_index.is_some())
                    .collect()
            })
            .collect();

        let gene_slots = chains
            .iter()
            .enumerate()
            .flat_map(|(entity, chain)| std::iter::repeat(entity).take(chain.len()))
            .collect();

        Ok(Self {
            visits,
            entity_ids,
            resource_ids,
            capacities: resource_capacities,
            visit_entity,
            visit_resource,
            chains,
            sequenced_chains,
            gene_slots,
        })
    }

    pub fn from_tables(
        visits: &VisitTable,
        capacities: &CapacityTable,
    ) -> Result<Self, ValidationError> {
        Self::new(
            visits.records.iter().map(Visit::from).collect(),
            capacities.records.iter().map(Capacity::from).collect(),
        )
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn entity_ids(&self) -> &[String] {
        &self.entity_ids
    }

    pub fn resource_ids(&self) -> &[String] {
        &self.resource_ids
    }

    /// Server count per resource index.
    pub fn capacities(&self) -> &[usize] {
        &self.capacities
    }

    pub fn entity_of(&self, visit: usize) -> usize {
        self.visit_entity[visit]
    }

    pub fn resource_of(&self, visit: usize) -> usize {
        self.visit_resource[visit]
    }

    pub fn chain(&self, entity: usize) -> &[usize] {
        &self.chains[entity]
    }

    pub fn sequenced_chain(&self, entity: usize) -> &[usize] {
        &self.sequenced_chains[entity]
    }

    pub fn gene_slots(&self) -> &[usize] {
        &self.gene_slots
    }
}

/// Numeric ids ("2" before "10") first, everything else lexicographically.
fn natural_order(a: &str, b: &str) -> Ordering {
    let key = |id: &str| id.parse::<u64>().map_or((1, 0), |number| (0, number));
    key(a).cmp(&key(b)).then_with(|| a.cmp(b))
}
