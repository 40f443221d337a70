/**
 * Choose which items to ask based on their difficulty scores.
 *
 * Every unlocked item carries a score: 1000 when first unlocked, shrinking with each
 * correct answer and growing with each mistake. Items are drawn without replacement
 * with probability proportional to that score, so items the learner struggles with
 * come up more often than items they already know.
 *
 * Version: October 2026
 */
use rand::thread_rng;
use rand::Rng;

/// Draw `count` distinct keys from `pool`, weighted by the paired score.
///
/// The result has exactly `min(count, pool.len())` entries. If every weight is zero the
/// draw is uniform. Weights must be finite and non-negative.
pub fn select<K: Clone, R: Rng + ?Sized>(pool: &[(K, f64)], count: usize, rng: &mut R) -> Vec<K> {
    let mut remaining: Vec<(K, f64)> = pool.to_vec();
    let mut chosen = Vec::with_capacity(count.min(remaining.len()));

    while chosen.len() < count && !remaining.is_empty() {
        let r: f64 = rng.gen();
        let index = pick_index(&remaining, r);
        chosen.push(remaining.remove(index).0);
    }
    chosen
}

/// Same as `select` but with the thread-local generator.
pub fn select_with_thread_rng<K: Clone>(pool: &[(K, f64)], count: usize) -> Vec<K> {
    select(pool, count, &mut thread_rng())
}

/// Walk the normalized distribution of `remaining` until the cumulative probability
/// reaches `r`, which must lie in `[0, 1)`.
fn pick_index<K>(remaining: &[(K, f64)], r: f64) -> usize {
    let total: f64 = remaining.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        let index = (r * remaining.len() as f64) as usize;
        return index.min(remaining.len() - 1);
    }

    let mut acc = 0.0;
    for (i, (_, weight)) in remaining.iter().enumerate() {
        acc += weight / total;
        if r <= acc {
            return i;
        }
    }
    // Rounding can leave the cumulative sum a hair below `r`.
    remaining.len() - 1
}
