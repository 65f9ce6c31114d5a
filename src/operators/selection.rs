//! Selection operators
//!
//! Parent selection for the tuning loop. Selection pressure comes from the
//! survivor truncation in NSGA-II, so parents are drawn uniformly.

use rand::Rng;

use crate::error::{OperatorError, OperatorResult};
use crate::operators::traits::SelectionOperator;

/// Random selection (uniform, with replacement)
#[derive(Clone, Debug, Default)]
pub struct RandomSelection;

impl RandomSelection {
    /// Create a new random selection
    pub fn new() -> Self {
        Self
    }
}

impl SelectionOperator for RandomSelection {
    fn select<R: Rng>(&self, len: usize, rng: &mut R) -> OperatorResult<usize> {
        if len == 0 {
            return Err(OperatorError::SelectionFailed(
                "cannot select from an empty population".to_string(),
            ));
        }
        Ok(rng.gen_range(0..len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_selection_selects_valid_index() {
        let mut rng = StdRng::seed_from_u64(0);
        let selection = RandomSelection::new();

        for _ in 0..100 {
            let idx = selection.select(10, &mut rng).unwrap();
            assert!(idx < 10);
        }
    }

    #[test]
    fn test_select_many_with_replacement() {
        let mut rng = StdRng::seed_from_u64(1);
        let selection = RandomSelection::new();

        let picks = selection.select_many(2, 50, &mut rng).unwrap();
        assert_eq!(picks.len(), 50);
        assert!(picks.contains(&0));
        assert!(picks.contains(&1));
    }

    #[test]
    fn test_random_selection_covers_population() {
        let mut rng = StdRng::seed_from_u64(2);
        let selection = RandomSelection::new();
        let mut counts = [0usize; 5];

        for idx in selection.select_many(5, 5000, &mut rng).unwrap() {
            counts[idx] += 1;
        }
        for count in counts {
            assert!(count > 800, "uniform selection is badly skewed: {counts:?}");
        }
    }

    #[test]
    fn test_empty_population_is_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let result = RandomSelection::new().select_many(0, 3, &mut rng);
        assert!(matches!(result, Err(OperatorError::SelectionFailed(_))));
    }
}
