use rand::Rng;
use serde::Serialize;

use crate::error::OptimizeError;

/// Per dimension search box of the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, OptimizeError> {
        if lower.len() != upper.len() {
            return Err(OptimizeError::InvalidOptions(format!(
                "{} lower bounds but {} upper bounds",
                lower.len(),
                upper.len()
            )));
        }

        for (dimension, (&low, &high)) in lower.iter().zip(&upper).enumerate() {
            if !(low.is_finite() && high.is_finite() && (high - low).is_finite()) {
                return Err(OptimizeError::InvalidOptions(format!(
                    "bounds of dimension {dimension} are not finite ({low}, {high})"
                )));
            }
            if low > high {
                return Err(OptimizeError::InvalidOptions(format!(
                    "lower bound {low} exceeds upper bound {high} in dimension {dimension}"
                )));
            }
        }

        Ok(Self { lower, upper })
    }

    pub fn uniform(dimension: usize, lower: f64, upper: f64) -> Result<Self, OptimizeError> {
        Self::new(vec![lower; dimension], vec![upper; dimension])
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// Uniform draw inside the box.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(&low, &high)| rng.gen_range(low..=high))
            .collect()
    }

    pub fn clamp(&self, position: &mut [f64]) {
        for ((value, &low), &high) in position.iter_mut().zip(&self.lower).zip(&self.upper) {
            *value = value.clamp(low, high);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn samples_stay_inside() {
        let bounds = Bounds::new(vec![0.0, -1.0, 3.0], vec![1.0, 1.0, 3.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for _ in 0..100 {
            let sample = bounds.sample(&mut rng);
            assert_eq!(sample.len(), 3);
            assert!((0.0..=1.0).contains(&sample[0]));
            assert!((-1.0..=1.0).contains(&sample[1]));
            assert_eq!(sample[2], 3.0);
        }
    }

    #[test]
    fn clamp_values() {
        let bounds = Bounds::uniform(3, 0.0, 1.0).unwrap();
        let mut position = vec![-0.5, 0.25, 7.0];

        bounds.clamp(&mut position);

        assert_eq!(position, vec![0.0, 0.25, 1.0]);
    }

    #[test]
    fn invalid_bounds() {
        assert!(Bounds::new(vec![0.0], vec![1.0, 2.0]).is_err());
        assert!(Bounds::uniform(2, 1.0, 0.0).is_err());
        assert!(Bounds::uniform(2, f64::NEG_INFINITY, 0.0).is_err());
        assert!(Bounds::uniform(1, -f64::MAX, f64::MAX).is_err());
        assert!(Bounds::uniform(0, 0.0, 1.0).is_ok());
    }
}
