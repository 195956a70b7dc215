//! Fair shuffling for question pools and option order.

use rand::Rng;

/// Return a uniformly permuted copy of `items` (Fisher–Yates).
///
/// The input slice is left untouched.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }
    out
}
