use log::debug;
use serde::Serialize;

use crate::{
    evaluator::Schedule,
    model::{Problem, Time},
};

/// Time a visit holds a server of its resource, `[start, finish)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub visit: usize,
    pub start: Time,
    pub finish: Time,
}

/// An instant at which more visits occupy a resource than it has servers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub resource_id: String,
    pub time: Time,
    pub occupancy: usize,
    pub capacity: usize,
    /// Visit indices active at `time`, ascending.
    pub visits: Vec<usize>,
}

/// Intervals as planned in the input, every visit served right at its ready time.
pub fn planned_intervals(problem: &Problem) -> Vec<Interval> {
    problem
        .visits()
        .iter()
        .enumerate()
        .map(|(visit, record)| Interval {
            visit,
            start: record.ready_time,
            finish: record.ready_time + record.duration,
        })
        .collect()
}

pub fn ledger_intervals(schedule: &Schedule) -> Vec<Interval> {
    schedule
        .entries
        .iter()
        .map(|entry| Interval {
            visit: entry.visit,
            start: entry.start,
            finish: entry.finish,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    // departures sort first so back-to-back visits do not overlap
    Departure,
    Arrival,
}

/// Sweeps the intervals of every resource and reports each arrival that
/// pushes occupancy above capacity. Zero-length intervals never occupy a
/// server.
pub fn find_conflicts(problem: &Problem, intervals: &[Interval]) -> Vec<Conflict> {
    let mut events_per_resource: Vec<Vec<(Time, EventKind, usize)>> =
        vec![vec![]; problem.resource_ids().len()];

    for interval in intervals.iter().filter(|interval| interval.finish > interval.start) {
        let events = &mut events_per_resource[problem.resource_of(interval.visit)];
        events.push((interval.start, EventKind::Arrival, interval.visit));
        events.push((interval.finish, EventKind::Departure, interval.visit));
    }

    let mut conflicts = vec![];

    for (resource, mut events) in events_per_resource.into_iter().enumerate() {
        events.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let capacity = problem.capacities()[resource];
        let resource_id = &problem.resource_ids()[resource];
        let mut active: Vec<usize> = vec![];
        let conflicts_before = conflicts.len();

        for (time, kind, visit) in events {
            match kind {
                EventKind::Departure => active.retain(|&active_visit| active_visit != visit),
                EventKind::Arrival => {
                    active.push(visit);

                    if active.len() > capacity {
                        let mut visits = active.clone();
                        visits.sort_unstable();

                        conflicts.push(Conflict {
                            resource_id: resource_id.clone(),
                            time,
                            occupancy: active.len(),
                            capacity,
                            visits,
                        });
                    }
                }
            }
        }

        if conflicts.len() > conflicts_before {
            debug!(
                "{resource_id}: {} conflicts",
                conflicts.len() - conflicts_before
            );
        }
    }

    conflicts
}
