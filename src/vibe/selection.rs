//! Cumulative-weight option selection.
//!
//! Selection is split into a random draw and a pure walk so the walk can be
//! tested with fixed draws:
//!
//! ```text
//! total = Σ weight            (u64, no overflow for ≤ 64 u32 weights)
//! r     ∈ [0, total)           draw()
//! pick  = first option where r < running sum
//! ```

use rand::Rng;

use crate::vibe_check::OptionRecord;

/// Sums the weights of `options`.
#[inline]
pub fn total_weight(options: &[OptionRecord]) -> u64 {
    options.iter().map(|o| u64::from(o.weight)).sum()
}

/// Draws `r` uniformly from `[0, total)`.
///
/// Returns `None` when `total` is zero, since no option can be selected.
#[inline]
pub fn draw<R: Rng + ?Sized>(rng: &mut R, total: u64) -> Option<u64> {
    (total > 0).then(|| rng.gen_range(0..total))
}

/// Walks `options` in slice order and returns the first one whose running
/// weight sum exceeds `r`.
///
/// Zero-weight options never advance the sum, so they can never be returned.
/// Returns `None` if `r >= total_weight(options)`.
pub fn select_weighted(options: &[OptionRecord], r: u64) -> Option<&OptionRecord> {
    let mut sum = 0u64;
    for option in options {
        sum += u64::from(option.weight);
        if r < sum {
            return Some(option);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VibeCheckId, VibeOptionId};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn options(weights: &[u32]) -> Vec<OptionRecord> {
        let check = VibeCheckId::new();
        weights
            .iter()
            .enumerate()
            .map(|(i, &weight)| OptionRecord {
                id: VibeOptionId::new(),
                vibe_check_id: check,
                name: format!("opt-{}", i),
                weight,
                position: i as u32,
                payload: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_total_weight() {
        assert_eq!(total_weight(&options(&[1, 1, 2])), 4);
        assert_eq!(total_weight(&options(&[])), 0);
        assert_eq!(
            total_weight(&options(&[u32::MAX, u32::MAX])),
            2 * u64::from(u32::MAX)
        );
    }

    #[test]
    fn test_select_walks_cumulative_ranges() {
        let opts = options(&[1, 1, 2]);
        assert_eq!(select_weighted(&opts, 0).unwrap().name, "opt-0");
        assert_eq!(select_weighted(&opts, 1).unwrap().name, "opt-1");
        assert_eq!(select_weighted(&opts, 2).unwrap().name, "opt-2");
        assert_eq!(select_weighted(&opts, 3).unwrap().name, "opt-2");
        assert!(select_weighted(&opts, 4).is_none());
    }

    #[test]
    fn test_select_skips_zero_weight() {
        let opts = options(&[0, 3, 0, 1]);
        for r in 0..3 {
            assert_eq!(select_weighted(&opts, r).unwrap().name, "opt-1");
        }
        assert_eq!(select_weighted(&opts, 3).unwrap().name, "opt-3");
    }

    #[test]
    fn test_draw_zero_total_is_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(draw(&mut rng, 0).is_none());
    }

    #[test]
    fn test_draw_is_reproducible_with_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let draws_a: Vec<_> = (0..20).map(|_| draw(&mut a, 1000)).collect();
        let draws_b: Vec<_> = (0..20).map(|_| draw(&mut b, 1000)).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn test_fair_frequencies_for_1_1_2() {
        let opts = options(&[1, 1, 2]);
        let total = total_weight(&opts);
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0usize; 3];
        let n = 40_000;

        for _ in 0..n {
            let r = draw(&mut rng, total).unwrap();
            let picked = select_weighted(&opts, r).unwrap();
            counts[picked.position as usize] += 1;
        }

        let freq: Vec<f64> = counts.iter().map(|&c| c as f64 / n as f64).collect();
        assert!((freq[0] - 0.25).abs() < 0.02, "freq = {:?}", freq);
        assert!((freq[1] - 0.25).abs() < 0.02, "freq = {:?}", freq);
        assert!((freq[2] - 0.50).abs() < 0.02, "freq = {:?}", freq);
    }

    proptest! {
        #[test]
        fn prop_every_draw_selects_positive_weight(
            weights in prop::collection::vec(0u32..10, 1..12),
            seed in any::<u64>(),
        ) {
            let opts = options(&weights);
            let total = total_weight(&opts);
            let mut rng = StdRng::seed_from_u64(seed);
            match draw(&mut rng, total) {
                None => prop_assert_eq!(total, 0),
                Some(r) => {
                    let picked = select_weighted(&opts, r);
                    prop_assert!(picked.is_some());
                    prop_assert!(picked.unwrap().weight > 0);
                }
            }
        }

        #[test]
        fn prop_each_option_owns_exactly_its_weight(
            weights in prop::collection::vec(0u32..8, 1..8),
        ) {
            let opts = options(&weights);
            let total = total_weight(&opts);
            let mut hits = vec![0u64; opts.len()];
            for r in 0..total {
                let picked = select_weighted(&opts, r).unwrap();
                hits[picked.position as usize] += 1;
            }
            for (i, &w) in weights.iter().enumerate() {
                prop_assert_eq!(hits[i], u64::from(w));
            }
            prop_assert!(select_weighted(&opts, total).is_none());
        }
    }
}
