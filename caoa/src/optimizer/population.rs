use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;

use super::{
    bounds::Bounds,
    policy::{Leader, Verdict},
    CaoaOptions,
};
use crate::{error::EvaluationError, objective::Objective};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub position: Vec<f64>,
    pub fitness: f64,
    pub energy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    pub candidates: Vec<Candidate>,
}

/// Best vector seen during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalBest {
    pub position: Vec<f64>,
    pub fitness: f64,
}

impl GlobalBest {
    /// Takes over `position` if it is strictly better.
    pub fn offer(&mut self, position: &[f64], fitness: f64) -> bool {
        if fitness < self.fitness {
            self.position = position.to_vec();
            self.fitness = fitness;
            true
        } else {
            false
        }
    }
}

pub(crate) fn fitness_of<O: Objective + ?Sized>(
    objective: &O,
    position: &[f64],
) -> Result<f64, EvaluationError> {
    let fitness = objective.evaluate(position)?;

    if fitness.is_finite() {
        Ok(fitness)
    } else {
        Err(EvaluationError::NonFiniteFitness(fitness))
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

impl Population {
    /// Draws `size` uniform candidates, then evaluates them. Positions come
    /// from `rng` in order, so the result does not depend on `parallel`.
    pub fn initialize<O, R>(
        objective: &O,
        bounds: &Bounds,
        size: usize,
        initial_energy: f64,
        parallel: bool,
        rng: &mut R,
    ) -> Result<Self, EvaluationError>
    where
        O: Objective + ?Sized,
        R: Rng + ?Sized,
    {
        let positions: Vec<Vec<f64>> = (0..size).map(|_| bounds.sample(rng)).collect();

        let evaluate = |position: Vec<f64>| {
            fitness_of(objective, &position).map(|fitness| Candidate {
                position,
                fitness,
                energy: initial_energy,
            })
        };

        let candidates = if parallel {
            positions
                .into_par_iter()
                .map(evaluate)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            positions
                .into_iter()
                .map(evaluate)
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self { candidates })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Lowest fitness, first candidate on ties.
    pub fn best(&self) -> Option<(usize, &Candidate)> {
        self.candidates
            .iter()
            .enumerate()
            .fold(None, |best, (index, candidate)| match best {
                Some((_, current)) if current.fitness <= candidate.fitness => best,
                _ => Some((index, candidate)),
            })
    }

    pub fn mean_fitness(&self) -> f64 {
        if self.candidates.is_empty() {
            return f64::NAN;
        }

        self.candidates.iter().map(|c| c.fitness).sum::<f64>() / self.candidates.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StepOutcome {
    pub evaluations: usize,
    /// State the candidate reached before it ran out of energy.
    pub pre_respawn: Option<(Vec<f64>, f64)>,
}

/// One candidate's share of an iteration: move, accept, drain and respawn.
pub(crate) fn step_candidate<O, R>(
    candidate: &mut Candidate,
    leader: &Leader,
    objective: &O,
    bounds: &Bounds,
    options: &CaoaOptions,
    rng: &mut R,
) -> Result<StepOutcome, EvaluationError>
where
    O: Objective + ?Sized,
    R: Rng + ?Sized,
{
    let mut proposed = options.perturbation.propose(
        &candidate.position,
        &leader.position,
        options.alpha,
        options.beta,
        rng,
    );
    bounds.clamp(&mut proposed);
    let proposed_fitness = fitness_of(objective, &proposed)?;
    let mut evaluations = 1;

    let verdict = options
        .acceptance_policy
        .judge(candidate.fitness, proposed_fitness, options.delta);

    let moved = match verdict {
        Verdict::Accept => {
            let moved = distance(&candidate.position, &proposed);
            candidate.position = proposed;
            candidate.fitness = proposed_fitness;
            moved
        }
        Verdict::Keep => 0.0,
        Verdict::Restart => {
            let fresh = bounds.sample(rng);
            let fitness = fitness_of(objective, &fresh)?;
            evaluations += 1;

            let moved = distance(&candidate.position, &fresh);
            candidate.position = fresh;
            candidate.fitness = fitness;
            moved
        }
    };

    candidate.energy -= options.gamma * moved;

    if candidate.energy > 0.0 {
        return Ok(StepOutcome {
            evaluations,
            pre_respawn: None,
        });
    }

    let depleted = (
        std::mem::replace(&mut candidate.position, bounds.sample(rng)),
        candidate.fitness,
    );
    candidate.fitness = fitness_of(objective, &candidate.position)?;
    candidate.energy = options.initial_energy;
    evaluations += 1;

    Ok(StepOutcome {
        evaluations,
        pre_respawn: Some(depleted),
    })
}
