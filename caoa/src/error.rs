use thiserror::Error;

/// Rejection of the input tables before any optimization starts.
///
/// Every variant names the offending row, which is the line number of the
/// source table when the problem was loaded from a file.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Visit table is empty")]
    NoVisits,
    #[error("Row {row}: `{field}` is not a finite number")]
    NonFinite { row: usize, field: &'static str },
    #[error("Row {row}: `{field}` must not be negative")]
    Negative { row: usize, field: &'static str },
    #[error("Row {row}: due time {due_time} is before ready time {ready_time}")]
    DueBeforeReady {
        row: usize,
        ready_time: f64,
        due_time: f64,
    },
    #[error("Row {row}: entity `{entity_id}` uses sequence index {sequence_index} twice")]
    DuplicateSequence {
        row: usize,
        entity_id: String,
        sequence_index: u32,
    },
    #[error("Row {row}: resource `{resource_id}` has non-positive capacity {server_count}")]
    NonPositiveCapacity {
        row: usize,
        resource_id: String,
        server_count: i64,
    },
    #[error("Row {row}: capacity of resource `{resource_id}` is listed twice")]
    DuplicateCapacity { row: usize, resource_id: String },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Expected {expected} priorities, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Priority at index {index} is not finite ({value})")]
    NonFinitePriority { index: usize, value: f64 },
    #[error("Row {row}: simulated time is not finite")]
    NonFiniteTime { row: usize },
    #[error("Objective returned a non-finite fitness ({0})")]
    NonFiniteFitness(f64),
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Invalid optimizer options: {0}")]
    InvalidOptions(String),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
