use rand::Rng;
use serde::Serialize;

use super::population::{GlobalBest, Population};

/// How the point every candidate moves toward is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LeaderPolicy {
    /// Best vector seen so far in the run.
    #[default]
    GlobalBest,
    /// Current candidate with the highest `1 / (1 + |fitness|)`. It stays put
    /// for the iteration.
    FitnessProximity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leader {
    pub position: Vec<f64>,
    /// Candidate excluded from movement, if the leader is a population member.
    pub candidate: Option<usize>,
}

impl LeaderPolicy {
    pub fn select(&self, population: &Population, best: &GlobalBest) -> Leader {
        match self {
            LeaderPolicy::GlobalBest => Leader {
                position: best.position.clone(),
                candidate: None,
            },
            LeaderPolicy::FitnessProximity => {
                let mut leader = 0;
                let mut leader_score = f64::NEG_INFINITY;

                for (index, candidate) in population.candidates.iter().enumerate() {
                    let score = 1.0 / (1.0 + candidate.fitness.abs());
                    if score > leader_score {
                        leader = index;
                        leader_score = score;
                    }
                }

                Leader {
                    position: population.candidates[leader].position.clone(),
                    candidate: Some(leader),
                }
            }
        }
    }
}

/// Fate of a proposed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Keep,
    /// Throw the candidate away and draw a fresh one.
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AcceptancePolicy {
    /// Only moves improving by more than `delta` are taken.
    #[default]
    Greedy,
    /// Every move is taken unless it worsens by more than `delta`, which
    /// restarts the candidate.
    Exploratory,
}

impl AcceptancePolicy {
    pub fn judge(&self, current: f64, proposed: f64, delta: f64) -> Verdict {
        match self {
            AcceptancePolicy::Greedy => {
                if proposed < current && current - proposed > delta {
                    Verdict::Accept
                } else {
                    Verdict::Keep
                }
            }
            AcceptancePolicy::Exploratory => {
                if proposed - current > delta {
                    Verdict::Restart
                } else {
                    Verdict::Accept
                }
            }
        }
    }
}

/// Shape of the random term `beta * (1 - 2r)` of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Perturbation {
    /// One `r` shared by all dimensions.
    #[default]
    Scalar,
    PerDimension,
}

impl Perturbation {
    /// `x + alpha * (leader - x) + beta * (1 - 2r)`, unclamped.
    pub fn propose<R: Rng + ?Sized>(
        &self,
        position: &[f64],
        leader: &[f64],
        alpha: f64,
        beta: f64,
        rng: &mut R,
    ) -> Vec<f64> {
        let shared: f64 = match self {
            Perturbation::Scalar => rng.gen(),
            Perturbation::PerDimension => 0.0,
        };

        position
            .iter()
            .zip(leader)
            .map(|(&x, &target)| {
                let r = match self {
                    Perturbation::Scalar => shared,
                    Perturbation::PerDimension => rng.gen(),
                };
                x + alpha * (target - x) + beta * (1.0 - 2.0 * r)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::optimizer::population::Candidate;

    fn population(fitnesses: &[f64]) -> Population {
        Population {
            candidates: fitnesses
                .iter()
                .enumerate()
                .map(|(index, &fitness)| Candidate {
                    position: vec![index as f64],
                    fitness,
                    energy: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn global_best_leader() {
        let best = GlobalBest {
            position: vec![9.0],
            fitness: 0.5,
        };
        let leader = LeaderPolicy::GlobalBest.select(&population(&[3.0, 1.0]), &best);

        assert_eq!(leader.position, vec![9.0]);
        assert_eq!(leader.candidate, None);
    }

    #[test]
    fn fitness_proximity_leader() {
        let best = GlobalBest {
            position: vec![9.0],
            fitness: 0.5,
        };

        let leader = LeaderPolicy::FitnessProximity.select(&population(&[3.0, -1.0, 2.0]), &best);
        assert_eq!(leader.candidate, Some(1));
        assert_eq!(leader.position, vec![1.0]);

        // first candidate wins ties
        let leader = LeaderPolicy::FitnessProximity.select(&population(&[4.0, 2.0, -2.0]), &best);
        assert_eq!(leader.candidate, Some(1));
    }

    #[test]
    fn greedy_acceptance() {
        let policy = AcceptancePolicy::Greedy;

        assert_eq!(policy.judge(10.0, 9.0, 1e-4), Verdict::Accept);
        assert_eq!(policy.judge(10.0, 10.0 - 1e-6, 1e-4), Verdict::Keep);
        assert_eq!(policy.judge(10.0, 11.0, 1e-4), Verdict::Keep);
    }

    #[test]
    fn exploratory_acceptance() {
        let policy = AcceptancePolicy::Exploratory;

        assert_eq!(policy.judge(10.0, 9.0, 1e-4), Verdict::Accept);
        assert_eq!(policy.judge(10.0, 10.0 + 1e-6, 1e-4), Verdict::Accept);
        assert_eq!(policy.judge(10.0, 11.0, 1e-4), Verdict::Restart);
    }

    #[test]
    fn movement_toward_leader() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // without noise the move covers alpha of the distance
        let proposed = Perturbation::Scalar.propose(&[0.0, 10.0], &[10.0, 0.0], 0.5, 0.0, &mut rng);
        assert_eq!(proposed, vec![5.0, 5.0]);

        for perturbation in [Perturbation::Scalar, Perturbation::PerDimension] {
            let proposed = perturbation.propose(&[0.0; 8], &[0.0; 8], 0.5, 0.1, &mut rng);
            assert!(proposed.iter().all(|x| x.abs() <= 0.1));
        }

        let proposed = Perturbation::Scalar.propose(&[0.0; 8], &[0.0; 8], 0.5, 0.1, &mut rng);
        assert!(proposed.iter().all(|&x| x == proposed[0]));
    }
}
