use rand::Rng;

use crate::OptimizeError;

/// Closed box `[lower_i, upper_i]` for every parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    ranges: Vec<(f64, f64)>,
}

impl Bounds {
    pub fn new(ranges: Vec<(f64, f64)>) -> Result<Self, OptimizeError> {
        if ranges.is_empty() {
            return Err(OptimizeError::EmptyBounds);
        }
        for (index, &(lower, upper)) in ranges.iter().enumerate() {
            if !(lower.is_finite() && upper.is_finite() && lower <= upper) {
                return Err(OptimizeError::InvalidBound {
                    index,
                    lower,
                    upper,
                });
            }
        }
        Ok(Self { ranges })
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[(f64, f64)] {
        &self.ranges
    }

    pub fn width(&self, index: usize) -> f64 {
        let (lower, upper) = self.ranges[index];
        upper - lower
    }

    pub fn clamp_gene(&self, index: usize, value: f64) -> f64 {
        let (lower, upper) = self.ranges[index];
        value.clamp(lower, upper)
    }

    /// Project `values` onto the box in place.
    pub fn project(&self, values: &mut [f64]) {
        for (index, value) in values.iter_mut().enumerate() {
            *value = self.clamp_gene(index, *value);
        }
    }

    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.ranges.len()
            && values
                .iter()
                .zip(&self.ranges)
                .all(|(v, &(lower, upper))| (lower..=upper).contains(v))
    }

    pub fn check_dimension(&self, values: &[f64]) -> Result<(), OptimizeError> {
        if values.len() != self.ranges.len() {
            return Err(OptimizeError::DimensionMismatch {
                expected: self.ranges.len(),
                actual: values.len(),
            });
        }
        Ok(())
    }

    /// Uniform sample inside the box.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.ranges
            .iter()
            .map(|&(lower, upper)| rng.random_range(lower..=upper))
            .collect()
    }
}
