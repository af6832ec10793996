use super::Decoder;
use crate::model::{Problem, Time};

/// Port decoding: a priority pulls a visit forward in the queue by up to
/// `max_shift` time units (`queue_time = ready_time - priority * max_shift`).
///
/// A sequenced visit only claims a turn for its entity, the entity's earliest
/// pending sequenced visit is served in its place.
#[derive(Debug, Clone, Copy)]
pub struct TimeShiftDecoder {
    pub max_shift: Time,
}

impl TimeShiftDecoder {
    pub fn queue_time(&self, ready_time: Time, priority: f64) -> Time {
        ready_time - priority * self.max_shift
    }
}

impl Decoder for TimeShiftDecoder {
    fn decode(&self, problem: &Problem, priorities: &[f64]) -> Vec<usize> {
        let visits = problem.visits();
        let queue_times: Vec<Time> = visits
            .iter()
            .zip(priorities)
            .map(|(visit, &priority)| self.queue_time(visit.ready_time, priority))
            .collect();

        let mut order: Vec<usize> = (0..visits.len()).collect();
        order.sort_by(|&a, &b| queue_times[a].total_cmp(&queue_times[b]).then(a.cmp(&b)));

        let mut next_sequenced = vec![0; problem.entity_ids().len()];

        order
            .into_iter()
            .map(|index| {
                if visits[index].sequence_index.is_none() {
                    return index;
                }

                let entity = problem.entity_of(index);
                let visit = problem.sequenced_chain(entity)[next_sequenced[entity]];
                next_sequenced[entity] += 1;
                visit
            })
            .collect()
    }
}
