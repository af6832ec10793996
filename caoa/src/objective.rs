use std::f64::consts::PI;

use serde::Serialize;

use crate::error::EvaluationError;

/// Something the optimizer can minimize.
pub trait Objective: Sync {
    /// Length of the position vectors this objective accepts.
    fn dimension(&self) -> usize;

    /// Fitness of `position`, lower is better.
    fn evaluate(&self, position: &[f64]) -> Result<f64, EvaluationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BenchmarkFunction {
    /// Unimodal, minimum 0 at the origin.
    Sphere,
    /// Multimodal, minimum 0 at the origin.
    Rastrigin,
}

impl BenchmarkFunction {
    /// Customary search range per dimension.
    pub fn search_range(&self) -> (f64, f64) {
        match self {
            BenchmarkFunction::Sphere => (-100.0, 100.0),
            BenchmarkFunction::Rastrigin => (-5.12, 5.12),
        }
    }
}

/// Analytic test function, used to exercise the optimizer without a schedule.
#[derive(Debug, Clone, Copy)]
pub struct Benchmark {
    pub function: BenchmarkFunction,
    pub dimension: usize,
}

impl Benchmark {
    pub fn new(function: BenchmarkFunction, dimension: usize) -> Self {
        Self {
            function,
            dimension,
        }
    }
}

impl Objective for Benchmark {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn evaluate(&self, position: &[f64]) -> Result<f64, EvaluationError> {
        if position.len() != self.dimension {
            return Err(EvaluationError::LengthMismatch {
                expected: self.dimension,
                actual: position.len(),
            });
        }

        let fitness = match self.function {
            BenchmarkFunction::Sphere => position.iter().map(|x| x * x).sum::<f64>(),
            BenchmarkFunction::Rastrigin => {
                10.0 * position.len() as f64
                    + position
                        .iter()
                        .map(|x| x * x - 10.0 * (2.0 * PI * x).cos())
                        .sum::<f64>()
            }
        };

        Ok(fitness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_values() {
        let sphere = Benchmark::new(BenchmarkFunction::Sphere, 3);

        assert_eq!(sphere.evaluate(&[0.0, 0.0, 0.0]).unwrap(), 0.0);
        assert_eq!(sphere.evaluate(&[1.0, -2.0, 3.0]).unwrap(), 14.0);
    }

    #[test]
    fn rastrigin_values() {
        let rastrigin = Benchmark::new(BenchmarkFunction::Rastrigin, 2);

        assert!(rastrigin.evaluate(&[0.0, 0.0]).unwrap().abs() < 1e-12);
        // integer coordinates sit on the cosine peaks
        assert!((rastrigin.evaluate(&[1.0, 2.0]).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn wrong_dimension() {
        let sphere = Benchmark::new(BenchmarkFunction::Sphere, 2);

        assert_eq!(
            sphere.evaluate(&[1.0]),
            Err(EvaluationError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn search_ranges() {
        assert_eq!(BenchmarkFunction::Sphere.search_range(), (-100.0, 100.0));
        assert_eq!(BenchmarkFunction::Rastrigin.search_range(), (-5.12, 5.12));
    }
}
