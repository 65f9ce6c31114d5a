//! Bounds for genome values
//!
//! Genes are kept inside their declared intervals by wrapping around rather than
//! clamping, so a perturbation that overshoots one edge re-enters from the other
//! instead of piling up on the boundary value.

use serde::{Deserialize, Serialize};

/// Wrap `value` into `[lo, hi]` using the unit-inclusive modulus `hi - lo + 1`.
///
/// Intended for discrete, integer-like axes: for integral `value` the result is
/// an integer in `[lo, hi]` and the function is periodic with period
/// `hi - lo + 1`. Non-integral input lands in `[lo, hi + 1)`.
///
/// ```
/// use deepmd_tuner::genome::bounds::wrap;
///
/// let wrapped: Vec<f64> = (0..8).map(|x| wrap(1.0, 6.0, x as f64)).collect();
/// assert_eq!(wrapped, vec![6.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 1.0]);
/// ```
pub fn wrap(lo: f64, hi: f64, value: f64) -> f64 {
    (value - lo).rem_euclid(1.0 + hi - lo) + lo
}

/// Map an arbitrary real gene onto an index in `0..count`.
///
/// Equivalent to `floor(gene) mod count` with a non-negative remainder.
pub fn categorical_index(gene: f64, count: usize) -> usize {
    debug_assert!(count > 0, "categorical axis needs at least one option");
    let last = count.saturating_sub(1);
    let index = wrap(0.0, last as f64, gene.floor());
    if index.is_finite() {
        (index as usize).min(last)
    } else {
        0
    }
}

/// Bounds for a single dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
}

impl Bounds {
    /// Create new bounds
    ///
    /// # Panics
    /// Panics if min > max
    pub fn new(min: f64, max: f64) -> Self {
        assert!(
            min <= max,
            "Invalid bounds: min ({}) must be <= max ({})",
            min,
            max
        );
        Self { min, max }
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Check if a value is within bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Wrap a continuous value back into `[min, max]` using the plain width
    pub fn wrap_continuous(&self, value: f64) -> f64 {
        let width = self.range();
        if width <= 0.0 || !value.is_finite() {
            return self.min;
        }
        let wrapped = self.min + (value - self.min).rem_euclid(width);
        // rem_euclid may round up to `width`
        wrapped.min(self.max)
    }
}

/// Multi-dimensional bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBounds {
    /// Bounds for each dimension
    pub bounds: Vec<Bounds>,
}

impl MultiBounds {
    /// Create new multi-dimensional bounds
    pub fn new(bounds: Vec<Bounds>) -> Self {
        Self { bounds }
    }

    /// Get number of dimensions
    pub fn dimension(&self) -> usize {
        self.bounds.len()
    }

    /// Get bounds for a specific dimension
    pub fn get(&self, index: usize) -> Option<&Bounds> {
        self.bounds.get(index)
    }

    /// Wrap every value back into its dimension's interval
    pub fn wrap_vec(&self, values: &mut [f64]) {
        for (value, b) in values.iter_mut().zip(self.bounds.iter()) {
            *value = b.wrap_continuous(*value);
        }
    }

    /// Check if all values are within bounds
    pub fn contains_vec(&self, values: &[f64]) -> bool {
        values.len() == self.bounds.len()
            && values
                .iter()
                .zip(self.bounds.iter())
                .all(|(&v, b)| b.contains(v))
    }
}

impl FromIterator<Bounds> for MultiBounds {
    fn from_iter<I: IntoIterator<Item = Bounds>>(iter: I) -> Self {
        Self {
            bounds: iter.into_iter().collect(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_matches_unit_inclusive_modulus() {
        let wrapped: Vec<f64> = (0..16).map(|x| wrap(1.0, 6.0, x as f64)).collect();
        assert_eq!(
            wrapped,
            vec![6.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_wrap_negative_values() {
        // -1 is one below lo=0, so it lands on hi
        assert_eq!(wrap(0.0, 4.0, -1.0), 4.0);
        assert_eq!(wrap(0.0, 4.0, -5.0), 0.0);
        assert_eq!(wrap(0.0, 4.0, -6.0), 4.0);
    }

    #[test]
    fn test_categorical_index() {
        assert_eq!(categorical_index(0.5, 3), 0);
        assert_eq!(categorical_index(2.2, 5), 2);
        assert_eq!(categorical_index(4.9, 5), 4);
        assert_eq!(categorical_index(5.0, 5), 0);
        assert_eq!(categorical_index(-0.1, 5), 4);
        assert_eq!(categorical_index(-5.5, 3), 0);
        assert_eq!(categorical_index(f64::NAN, 3), 0);
    }

    #[test]
    #[should_panic(expected = "Invalid bounds")]
    fn test_bounds_invalid() {
        Bounds::new(5.0, -5.0);
    }

    #[test]
    fn test_bounds_contains() {
        let b = Bounds::new(-5.0, 5.0);
        assert!(b.contains(0.0));
        assert!(b.contains(-5.0));
        assert!(b.contains(5.0));
        assert!(!b.contains(-5.1));
        assert!(!b.contains(5.1));
    }

    #[test]
    fn test_wrap_continuous_reenters_from_opposite_edge() {
        let b = Bounds::new(2.0, 6.0);
        assert!((b.wrap_continuous(6.5) - 2.5).abs() < 1e-12);
        assert!((b.wrap_continuous(1.5) - 5.5).abs() < 1e-12);
        assert!((b.wrap_continuous(3.0) - 3.0).abs() < 1e-12);
        assert!((b.wrap_continuous(14.25) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_continuous_degenerate_interval() {
        let b = Bounds::new(1.0, 1.0);
        assert_eq!(b.wrap_continuous(7.0), 1.0);
        let b = Bounds::new(0.0, 1.0);
        assert_eq!(b.wrap_continuous(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_wrap_continuous_small_scale() {
        let b = Bounds::new(3.51e-8, 0.0001);
        for v in [-0.5, -1e-4, 0.0, 2e-4, 0.37] {
            assert!(b.contains(b.wrap_continuous(v)));
        }
    }

    #[test]
    fn test_multi_bounds_wrap_vec() {
        let mb = MultiBounds::new(vec![Bounds::new(0.0, 1.0), Bounds::new(-10.0, 10.0)]);
        let mut values = vec![1.25, -12.0];
        mb.wrap_vec(&mut values);
        assert!((values[0] - 0.25).abs() < 1e-12);
        assert!((values[1] - 8.0).abs() < 1e-12);
        assert!(mb.contains_vec(&values));
    }

    #[test]
    fn test_multi_bounds_contains_vec_checks_length() {
        let mb = MultiBounds::new(vec![Bounds::new(-5.0, 5.0); 3]);
        assert!(mb.contains_vec(&[0.0, 0.0, 0.0]));
        assert!(!mb.contains_vec(&[0.0, 0.0]));
        assert!(!mb.contains_vec(&[-6.0, 0.0, 0.0]));
    }
}
