//! Uniform random permutations.

use rand::Rng;

/// In-place Fisher–Yates shuffle.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// The indices `1..=count` in uniformly random order.
pub fn shuffled_indices<R: Rng + ?Sized>(count: u32, rng: &mut R) -> Vec<u32> {
    let mut indices: Vec<u32> = (1..=count).collect();
    shuffle(&mut indices, rng);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut items: Vec<u32> = (0..20).collect();
        shuffle(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn indices_are_one_based_and_complete() {
        let mut rng = StdRng::seed_from_u64(9);
        let indices = shuffled_indices(12, &mut rng);
        assert_eq!(indices.len(), 12);
        let set: HashSet<u32> = indices.into_iter().collect();
        assert_eq!(set, (1..=12).collect());
        assert!(shuffled_indices(0, &mut rng).is_empty());
    }

    #[test]
    fn every_position_is_reachable() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut firsts = HashSet::new();
        for _ in 0..200 {
            firsts.insert(shuffled_indices(4, &mut rng)[0]);
        }
        assert_eq!(firsts.len(), 4);
    }
}
