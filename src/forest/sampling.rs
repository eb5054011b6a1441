//! Seeded sampling used while growing trees and splitting datasets.
//!
//! Every random draw in the crate goes through a [`Xoshiro256PlusPlus`]
//! generator created from an explicit seed.

use rand::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Independent generator for the `tree_index`-th tree of a forest.
pub(crate) fn tree_rng(seed: u64, tree_index: usize) -> Xoshiro256PlusPlus {
    // seed_from_u64 expands the seed with SplitMix64.
    Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(tree_index as u64))
}

/// Draws `n_rows` row indices with replacement.
pub(crate) fn bootstrap_rows<R: Rng>(n_rows: usize, rng: &mut R) -> Vec<usize> {
    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
}

/// All feature indices in a random visiting order.
pub(crate) fn shuffled_features<R: Rng>(n_features: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    order.shuffle(rng);
    order
}

/// Shuffles row indices and splits them into `(train, test)`.
///
/// The test side gets `ceil(n_rows * test_fraction)` rows.
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n_rows).collect();
    order.shuffle(&mut rng);

    let fraction = test_fraction.clamp(0.0, 1.0);
    let n_test = ((n_rows as f64) * fraction).ceil() as usize;
    let n_test = n_test.min(n_rows);

    let train = order.split_off(n_test);
    (train, order)
}
