//! Lexicographic permutation enumeration.

/// Step `perm` to the next permutation in lexicographic order.
///
/// Returns `false` and leaves `perm` untouched when it is already the last
/// (descending) permutation.
pub fn next_permutation(perm: &mut [usize]) -> bool {
    if perm.len() < 2 {
        return false;
    }

    // Largest k with perm[k] < perm[k + 1].
    let Some(k) = (0..perm.len() - 1).rev().find(|&k| perm[k] < perm[k + 1]) else {
        return false;
    };

    // Largest l > k with perm[k] < perm[l]; k + 1 always qualifies.
    let l = (k + 1..perm.len())
        .rev()
        .find(|&l| perm[k] < perm[l])
        .unwrap_or(k + 1);

    perm.swap(k, l);
    perm[k + 1..].reverse();
    true
}

/// Walks every permutation of `0..n` in lexicographic order.
///
/// Starts at the identity. [`advance`](Self::advance) moves in place, so the
/// solver can enumerate n! permutations without allocating; the
/// [`Iterator`] impl clones each permutation and is meant for small n.
#[derive(Debug, Clone)]
pub struct PermutationGenerator {
    current: Vec<usize>,
    exhausted: bool,
    started: bool,
}

impl PermutationGenerator {
    /// Generator positioned at `[0, 1, ..., n - 1]`.
    pub fn new(n: usize) -> Self {
        Self {
            current: (0..n).collect(),
            exhausted: false,
            started: false,
        }
    }

    /// The permutation the generator is positioned at.
    pub fn current(&self) -> &[usize] {
        &self.current
    }

    /// Move to the next permutation. Once this returns `false` the
    /// generator stays exhausted.
    pub fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if !next_permutation(&mut self.current) {
            self.exhausted = true;
        }
        !self.exhausted
    }

    /// Whether the last permutation has been passed.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Iterator for PermutationGenerator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if !self.started {
            self.started = true;
            return Some(self.current.clone());
        }
        if self.advance() {
            Some(self.current.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn factorial(n: usize) -> usize {
        (1..=n).product()
    }

    #[test]
    fn test_starts_at_identity() {
        let gen = PermutationGenerator::new(4);
        assert_eq!(gen.current(), &[0, 1, 2, 3]);
        assert!(!gen.is_exhausted());
    }

    #[test]
    fn test_three_elements_in_order() {
        let all: Vec<Vec<usize>> = PermutationGenerator::new(3).collect();
        assert_eq!(
            all,
            vec![
                vec![0, 1, 2],
                vec![0, 2, 1],
                vec![1, 0, 2],
                vec![1, 2, 0],
                vec![2, 0, 1],
                vec![2, 1, 0],
            ]
        );
    }

    #[test]
    fn test_visits_each_permutation_once_in_order() {
        for n in 0..=6 {
            let all: Vec<Vec<usize>> = PermutationGenerator::new(n).collect();
            assert_eq!(all.len(), factorial(n), "n = {n}");

            let unique: HashSet<_> = all.iter().cloned().collect();
            assert_eq!(unique.len(), all.len());

            for pair in all.windows(2) {
                assert!(pair[0] < pair[1], "not lexicographic: {:?}", pair);
            }
            for perm in &all {
                let mut sorted = perm.clone();
                sorted.sort_unstable();
                assert_eq!(sorted, (0..n).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_advance_n_factorial_minus_one_times_then_exhausted() {
        let n = 5;
        let mut gen = PermutationGenerator::new(n);
        for _ in 0..factorial(n) - 1 {
            assert!(gen.advance());
        }
        assert_eq!(gen.current(), &[4, 3, 2, 1, 0]);
        assert!(!gen.advance());
        assert!(gen.is_exhausted());
        assert!(!gen.advance());
        assert_eq!(gen.current(), &[4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_next_permutation_on_last_is_noop() {
        let mut perm = vec![2, 1, 0];
        assert!(!next_permutation(&mut perm));
        assert_eq!(perm, vec![2, 1, 0]);
    }

    #[test]
    fn test_next_permutation_reverses_suffix() {
        let mut perm = vec![0, 3, 2, 1];
        assert!(next_permutation(&mut perm));
        assert_eq!(perm, vec![1, 0, 2, 3]);
    }
}
