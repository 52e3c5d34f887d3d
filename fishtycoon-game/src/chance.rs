//! Weighted random selection among catch candidates.
//!
//! Weights are always renormalized to sum to one before the cumulative
//! comparison, so bonus adjustments never change the overall catch
//! probability, only the mix.
use rand::Rng;
use smallvec::SmallVec;

/// A normalized, ordered set of candidates ready to be drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChanceTable {
    entries: SmallVec<[(usize, f64); 8]>,
    fallback: usize,
}

impl ChanceTable {
    /// Normalize `(key, weight)` pairs. Negative or non-finite weights count as zero;
    /// when every weight is zero the candidates are drawn uniformly.
    /// Returns `None` for an empty candidate list.
    #[must_use]
    pub fn normalized<I>(weights: I) -> Option<Self>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut entries: SmallVec<[(usize, f64); 8]> = weights
            .into_iter()
            .map(|(key, weight)| {
                let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
                (key, weight)
            })
            .collect();
        if entries.is_empty() {
            return None;
        }

        let total: f64 = entries.iter().map(|(_, weight)| weight).sum();
        if total > 0.0 {
            for (_, weight) in &mut entries {
                *weight /= total;
            }
        } else {
            let uniform = 1.0 / crate::numbers::usize_to_f64(entries.len());
            for (_, weight) in &mut entries {
                *weight = uniform;
            }
        }

        // The most likely candidate (the lowest rarity) absorbs float slack.
        let fallback = entries
            .iter()
            .fold(None::<(usize, f64)>, |best, &(key, weight)| match best {
                Some((_, best_weight)) if best_weight >= weight => best,
                _ => Some((key, weight)),
            })
            .map_or(entries[0].0, |(key, _)| key);

        Some(Self { entries, fallback })
    }

    /// Sum of the normalized weights; one within float tolerance.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, weight)| weight).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized weight of a candidate key.
    #[must_use]
    pub fn weight_of(&self, key: usize) -> Option<f64> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, weight)| *weight)
    }

    #[must_use]
    pub const fn fallback(&self) -> usize {
        self.fallback
    }

    /// Select by cumulative sum: the first candidate whose running total reaches `draw`.
    #[must_use]
    pub fn resolve(&self, draw: f64) -> usize {
        let mut cumulative = 0.0;
        for (key, weight) in &self.entries {
            cumulative += weight;
            if draw <= cumulative {
                return *key;
            }
        }
        self.fallback
    }

    /// Draw uniformly in `[0, 1)` and resolve.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.resolve(rng.gen_range(0.0..1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn empty_candidates_yield_none() {
        assert!(ChanceTable::normalized(std::iter::empty()).is_none());
    }

    #[test]
    fn weights_are_renormalized() {
        let table = ChanceTable::normalized([(0, 0.6), (1, 0.3), (2, 0.3)]).unwrap();
        assert!((table.total() - 1.0).abs() < 1e-12);
        assert!((table.weight_of(0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cumulative_comparison_is_inclusive() {
        let table = ChanceTable::normalized([(7, 0.5), (9, 0.5)]).unwrap();
        assert_eq!(table.resolve(0.0), 7);
        assert_eq!(table.resolve(0.5), 7);
        assert_eq!(table.resolve(0.500_001), 9);
    }

    #[test]
    fn overshoot_falls_back_to_most_common() {
        let table = ChanceTable::normalized([(0, 0.1), (1, 0.7), (2, 0.2)]).unwrap();
        assert_eq!(table.fallback(), 1);
        assert_eq!(table.resolve(1.5), 1);
    }

    #[test]
    fn zero_weights_become_uniform() {
        let table = ChanceTable::normalized([(0, 0.0), (1, -2.0), (2, f64::NAN)]).unwrap();
        assert!((table.weight_of(2).unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((table.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn draws_follow_weights() {
        let table = ChanceTable::normalized([(0, 0.9), (1, 0.1)]).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let rare = (0..10_000).filter(|_| table.pick(&mut rng) == 1).count();
        assert!((700..1_300).contains(&rare), "rare draws {rare}");
    }
}
