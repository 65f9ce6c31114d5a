//! NSGA-II survivor selection
//!
//! Non-dominated sorting, crowding distance and truncation for two-objective
//! minimization.
//!
//! Reference: Deb, K., Pratap, A., Agarwal, S., & Meyarivan, T. (2002).
//! A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II.
//! IEEE Transactions on Evolutionary Computation, 6(2).

use std::cmp::Ordering;

use crate::error::{EvoResult, EvolutionError};
use crate::population::individual::Individual;

/// Fast non-dominated sort
///
/// Assigns `rank` on every individual and returns fronts where `front[0]` is
/// the Pareto-optimal front. Invalid individuals all read as the sentinel pair,
/// so they end up together in the last front.
pub fn fast_non_dominated_sort(population: &mut [Individual]) -> Vec<Vec<usize>> {
    let n = population.len();
    if n == 0 {
        return vec![];
    }

    // domination_count[i] = number of individuals that dominate i
    let mut domination_count = vec![0usize; n];
    // dominated_set[i] = set of individuals that i dominates
    let mut dominated_set: Vec<Vec<usize>> = vec![vec![]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if population[i].dominates(&population[j]) {
                dominated_set[i].push(j);
                domination_count[j] += 1;
            } else if population[j].dominates(&population[i]) {
                dominated_set[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts: Vec<Vec<usize>> = vec![];
    let mut current_front: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    let mut rank = 0;
    while !current_front.is_empty() {
        for &i in &current_front {
            population[i].rank = rank;
        }

        let mut next_front = vec![];
        for &i in &current_front {
            for &j in &dominated_set[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next_front.push(j);
                }
            }
        }
        next_front.sort_unstable();

        fronts.push(current_front);
        current_front = next_front;
        rank += 1;
    }

    fronts
}

/// Calculate crowding distance for a front
///
/// Boundary individuals on each objective get infinite distance. An objective
/// whose range is zero across the front adds nothing to interior individuals.
pub fn calculate_crowding_distance(population: &mut [Individual], front: &[usize]) {
    let n = front.len();
    if n <= 2 {
        for &i in front {
            population[i].crowding_distance = f64::INFINITY;
        }
        return;
    }

    for &i in front {
        population[i].crowding_distance = 0.0;
    }

    for obj in 0..2 {
        let mut sorted_indices: Vec<usize> = front.to_vec();
        // stable, so ties keep their pool order
        sorted_indices.sort_by(|&a, &b| {
            population[a].objectives()[obj].total_cmp(&population[b].objectives()[obj])
        });

        population[sorted_indices[0]].crowding_distance = f64::INFINITY;
        population[sorted_indices[n - 1]].crowding_distance = f64::INFINITY;

        let obj_min = population[sorted_indices[0]].objectives()[obj];
        let obj_max = population[sorted_indices[n - 1]].objectives()[obj];
        let obj_range = obj_max - obj_min;

        if obj_range > 0.0 {
            for i in 1..(n - 1) {
                let idx = sorted_indices[i];
                let prev_val = population[sorted_indices[i - 1]].objectives()[obj];
                let next_val = population[sorted_indices[i + 1]].objectives()[obj];
                population[idx].crowding_distance += (next_val - prev_val) / obj_range;
            }
        }
    }
}

/// Rank the whole pool and compute crowding distance on every front
pub fn rank_and_crowd(population: &mut [Individual]) -> Vec<Vec<usize>> {
    let fronts = fast_non_dominated_sort(population);
    for front in &fronts {
        calculate_crowding_distance(population, front);
    }
    fronts
}

/// Crowded comparison operator
///
/// Lower rank first; within a rank, larger crowding distance first.
pub fn crowded_ordering(a: &Individual, b: &Individual) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| b.crowding_distance.total_cmp(&a.crowding_distance))
}

/// Keep exactly `n` survivors from the merged pool
///
/// The pool is ranked and crowded from scratch; survivors keep those
/// annotations and come out in crowded order.
pub fn select_survivors(mut pool: Vec<Individual>, n: usize) -> EvoResult<Vec<Individual>> {
    if pool.len() < n {
        return Err(EvolutionError::Configuration(format!(
            "cannot keep {} survivors from a pool of {}",
            n,
            pool.len()
        )));
    }

    rank_and_crowd(&mut pool);
    pool.sort_by(crowded_ordering);
    pool.truncate(n);
    Ok(pool)
}

/// Get the Pareto front (rank 0 individuals)
pub fn pareto_front(population: &[Individual]) -> Vec<&Individual> {
    population.iter().filter(|ind| ind.rank == 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::traits::Fitness;
    use crate::genome::real_vector::Genome;
    use uuid::Uuid;

    fn individual(objectives: [f64; 2]) -> Individual {
        let fitness = Fitness::from_objectives(objectives).unwrap();
        Individual::with_fitness(Genome::new(vec![0.0; 7]), Uuid::new_v4(), 0, fitness)
    }

    fn invalid() -> Individual {
        Individual::with_fitness(
            Genome::new(vec![0.0; 7]),
            Uuid::new_v4(),
            0,
            Fitness::invalid("failed"),
        )
    }

    #[test]
    fn test_fast_non_dominated_sort() {
        let mut population = vec![
            individual([1.0, 4.0]),
            individual([2.0, 3.0]),
            individual([3.0, 2.0]),
            individual([4.0, 1.0]),
            individual([3.0, 3.0]),
        ];

        let fronts = fast_non_dominated_sort(&mut population);

        // First 4 are mutually non-dominated
        assert_eq!(fronts[0].len(), 4);
        // [3,3] is dominated by [2,3] and [3,2]
        assert_eq!(fronts[1], vec![4]);

        for &i in &fronts[0] {
            assert_eq!(population[i].rank, 0);
        }
        assert_eq!(population[4].rank, 1);
    }

    #[test]
    fn test_two_front_scenario() {
        // A(1,5), B(3,2) | C(4,6)
        let mut population = vec![
            individual([1.0, 5.0]),
            individual([3.0, 2.0]),
            individual([4.0, 6.0]),
        ];

        let fronts = fast_non_dominated_sort(&mut population);
        assert_eq!(fronts, vec![vec![0, 1], vec![2]]);

        let survivors = select_survivors(population, 2).unwrap();
        let objectives: Vec<_> = survivors.iter().map(Individual::objectives).collect();
        assert!(objectives.contains(&[1.0, 5.0]));
        assert!(objectives.contains(&[3.0, 2.0]));
    }

    #[test]
    fn test_invalid_individuals_fall_to_last_front() {
        let mut population = vec![invalid(), individual([1e6, 1e6]), invalid()];
        let fronts = fast_non_dominated_sort(&mut population);

        assert_eq!(fronts, vec![vec![1], vec![0, 2]]);
        assert_eq!(population[0].rank, 1);
        assert_eq!(population[2].rank, 1);
    }

    #[test]
    fn test_crowding_distance() {
        let mut population = vec![
            individual([0.0, 10.0]),
            individual([5.0, 5.0]),
            individual([10.0, 0.0]),
        ];

        let front: Vec<usize> = (0..population.len()).collect();
        calculate_crowding_distance(&mut population, &front);

        assert!(population[0].crowding_distance.is_infinite());
        assert!(population[2].crowding_distance.is_infinite());
        // (10 - 0) / 10 on each objective
        assert!((population[1].crowding_distance - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_crowding_small_fronts_are_infinite() {
        let mut population = vec![individual([1.0, 2.0]), individual([2.0, 1.0])];
        calculate_crowding_distance(&mut population, &[0, 1]);
        assert!(population.iter().all(|i| i.crowding_distance.is_infinite()));
    }

    #[test]
    fn test_crowding_zero_range_contributes_nothing() {
        let mut population = vec![
            individual([1.0, 3.0]),
            individual([1.0, 3.0]),
            individual([1.0, 3.0]),
            individual([1.0, 3.0]),
        ];
        let front: Vec<usize> = (0..population.len()).collect();
        calculate_crowding_distance(&mut population, &front);

        let finite: Vec<f64> = population
            .iter()
            .map(|i| i.crowding_distance)
            .filter(|d| d.is_finite())
            .collect();
        assert_eq!(finite, vec![0.0, 0.0]);
    }

    #[test]
    fn test_crowding_of_invalid_front_does_not_panic() {
        let mut population = vec![invalid(), invalid(), invalid()];
        rank_and_crowd(&mut population);
        assert!(population.iter().all(|i| !i.crowding_distance.is_nan()));
    }

    #[test]
    fn test_crowded_ordering() {
        let mut a = individual([1.0, 1.0]);
        a.rank = 0;
        a.crowding_distance = 2.0;

        let mut b = individual([2.0, 2.0]);
        b.rank = 1;
        b.crowding_distance = 3.0;

        let mut c = individual([1.5, 1.5]);
        c.rank = 0;
        c.crowding_distance = 1.0;

        assert_eq!(crowded_ordering(&a, &b), Ordering::Less);
        assert_eq!(crowded_ordering(&a, &c), Ordering::Less);
        assert_eq!(crowded_ordering(&c, &a), Ordering::Greater);
        assert_eq!(crowded_ordering(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_select_survivors_prefers_spread() {
        let pool = vec![
            individual([0.0, 10.0]),
            individual([4.9, 5.1]),
            individual([5.0, 5.0]),
            individual([10.0, 0.0]),
            individual([20.0, 20.0]),
        ];

        let survivors = select_survivors(pool, 3).unwrap();
        let objectives: Vec<_> = survivors.iter().map(Individual::objectives).collect();

        assert_eq!(survivors.len(), 3);
        assert!(objectives.contains(&[0.0, 10.0]));
        assert!(objectives.contains(&[10.0, 0.0]));
        assert!(!objectives.contains(&[20.0, 20.0]));
    }

    #[test]
    fn test_select_survivors_sorted_by_key() {
        let pool: Vec<Individual> = (0..10)
            .map(|i| individual([i as f64, (10 - i) as f64 + (i % 3) as f64]))
            .collect();

        let survivors = select_survivors(pool, 6).unwrap();
        assert_eq!(survivors.len(), 6);
        for pair in survivors.windows(2) {
            assert_ne!(crowded_ordering(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_select_survivors_pool_too_small() {
        let pool = vec![individual([1.0, 1.0])];
        assert!(select_survivors(pool, 2).is_err());
    }

    #[test]
    fn test_pareto_front() {
        let mut population = vec![
            individual([1.0, 5.0]),
            individual([3.0, 2.0]),
            individual([4.0, 6.0]),
        ];
        rank_and_crowd(&mut population);
        assert_eq!(pareto_front(&population).len(), 2);
    }
}
