pub mod rank;
pub mod time_shift;

use log::trace;
use serde::Serialize;

pub use rank::RankDecoder;
pub use time_shift::TimeShiftDecoder;

use crate::{
    error::EvaluationError,
    model::{Problem, Time},
    objective::Objective,
    timeline::ResourceTimeline,
};

/// Default pull-forward window of time-shift decoding, one day in hours.
pub const DEFAULT_MAX_SHIFT: Time = 24.0;

/// Turns a priority vector into an execution order.
pub trait Decoder {
    /// Returns every visit index exactly once. `priorities` has already been
    /// checked to hold one finite value per visit.
    fn decode(&self, problem: &Problem, priorities: &[f64]) -> Vec<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodingStrategy {
    Rank,
    TimeShift { max_shift: Time },
}

impl Decoder for DecodingStrategy {
    fn decode(&self, problem: &Problem, priorities: &[f64]) -> Vec<usize> {
        match *self {
            DecodingStrategy::Rank => RankDecoder.decode(problem, priorities),
            DecodingStrategy::TimeShift { max_shift } => {
                TimeShiftDecoder { max_shift }.decode(problem, priorities)
            }
        }
    }
}

/// Which instant of a visit is compared against its due time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayMeasure {
    /// Tardiness, `finish - due_time`.
    #[default]
    Completion,
    /// Berthing lateness, `start - due_time`.
    Berthing,
}

/// One simulated visit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub visit: usize,
    pub server: usize,
    pub physical_ready: Time,
    pub start: Time,
    pub finish: Time,
    pub waiting: Time,
    pub delay: Time,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    /// In execution order.
    pub entries: Vec<LedgerEntry>,
    pub total_delay: Time,
}

/// Deterministic discrete-event simulation of a priority vector.
///
/// Every call starts from fresh resource and entity state, so one evaluator
/// can be shared between threads.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleEvaluator<'a> {
    problem: &'a Problem,
    strategy: DecodingStrategy,
    delay_measure: DelayMeasure,
}

impl<'a> ScheduleEvaluator<'a> {
    pub fn new(
        problem: &'a Problem,
        strategy: DecodingStrategy,
        delay_measure: DelayMeasure,
    ) -> Self {
        Self {
            problem,
            strategy,
            delay_measure,
        }
    }

    pub fn job_shop(problem: &'a Problem) -> Self {
        Self::new(problem, DecodingStrategy::Rank, DelayMeasure::Completion)
    }

    pub fn port(problem: &'a Problem) -> Self {
        Self::new(
            problem,
            DecodingStrategy::TimeShift {
                max_shift: DEFAULT_MAX_SHIFT,
            },
            DelayMeasure::Berthing,
        )
    }

    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    pub fn strategy(&self) -> DecodingStrategy {
        self.strategy
    }

    pub fn delay_measure(&self) -> DelayMeasure {
        self.delay_measure
    }

    /// Total delay of the schedule `priorities` decodes to.
    pub fn evaluate(&self, priorities: &[f64]) -> Result<Time, EvaluationError> {
        self.simulate(priorities, |_| {})
    }

    pub fn evaluate_detailed(&self, priorities: &[f64]) -> Result<Schedule, EvaluationError> {
        let mut entries = Vec::with_capacity(self.problem.len());
        let total_delay = self.simulate(priorities, |entry| entries.push(entry))?;

        Ok(Schedule {
            entries,
            total_delay,
        })
    }

    pub fn decode(&self, priorities: &[f64]) -> Result<Vec<usize>, EvaluationError> {
        if priorities.len() != self.problem.len() {
            return Err(EvaluationError::LengthMismatch {
                expected: self.problem.len(),
                actual: priorities.len(),
            });
        }

        if let Some((index, &value)) = priorities
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(EvaluationError::NonFinitePriority { index, value });
        }

        Ok(self.strategy.decode(self.problem, priorities))
    }

    fn simulate<F: FnMut(LedgerEntry)>(
        &self,
        priorities: &[f64],
        mut record: F,
    ) -> Result<Time, EvaluationError> {
        let order = self.decode(priorities)?;

        let mut timeline = ResourceTimeline::new(self.problem.capacities());
        let mut availability = vec![Time::MIN; self.problem.entity_ids().len()];
        let mut total_delay = 0.0;

        for visit_index in order {
            let visit = &self.problem.visits()[visit_index];
            let entity = self.problem.entity_of(visit_index);
            let resource = self.problem.resource_of(visit_index);

            let physical_ready = availability[entity].max(visit.ready_time);
            let claim = timeline.claim(resource, physical_ready, visit.duration);

            let measured = match self.delay_measure {
                DelayMeasure::Completion => claim.finish,
                DelayMeasure::Berthing => claim.start,
            };
            let delay = (measured - visit.due_time).max(0.0);
            let available = claim.finish + visit.transfer_time.unwrap_or(0.0);

            if !(claim.finish.is_finite() && delay.is_finite() && available.is_finite()) {
                return Err(EvaluationError::NonFiniteTime { row: visit.row });
            }

            availability[entity] = available;
            total_delay += delay;

            trace!(
                "row {}: {} at {} server {}, start {}, finish {}, delay {delay}",
                visit.row,
                visit.entity_id,
                visit.resource_id,
                claim.server,
                claim.start,
                claim.finish
            );

            record(LedgerEntry {
                visit: visit_index,
                server: claim.server,
                physical_ready,
                start: claim.start,
                finish: claim.finish,
                waiting: claim.start - physical_ready,
                delay,
            });
        }

        if !total_delay.is_finite() {
            return Err(EvaluationError::NonFiniteFitness(total_delay));
        }

        Ok(total_delay)
    }
}

impl Objective for ScheduleEvaluator<'_> {
    fn dimension(&self) -> usize {
        self.problem.len()
    }

    fn evaluate(&self, position: &[f64]) -> Result<f64, EvaluationError> {
        self.simulate(position, |_| {})
    }
}
