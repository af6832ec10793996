use super::Decoder;
use crate::model::Problem;

/// Random-key decoding for job-shop data.
///
/// Every entity owns as many gene slots as it has visits. Sorting the slots by
/// priority yields a sequence of entity turns, and each turn runs that
/// entity's next visit of its chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankDecoder;

impl Decoder for RankDecoder {
    fn decode(&self, problem: &Problem, priorities: &[f64]) -> Vec<usize> {
        let mut slots: Vec<usize> = (0..priorities.len()).collect();
        slots.sort_by(|&a, &b| priorities[a].total_cmp(&priorities[b]).then(a.cmp(&b)));

        let gene_slots = problem.gene_slots();
        let mut next_in_chain = vec![0; problem.entity_ids().len()];

        slots
            .into_iter()
            .map(|slot| {
                let entity = gene_slots[slot];
                let visit = problem.chain(entity)[next_in_chain[entity]];
                next_in_chain[entity] += 1;
                visit
            })
            .collect()
    }
}
