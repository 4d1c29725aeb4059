//! Date-seeded selection of the daily grid.
//!
//! Every process that holds the same pool (same contents, same order) picks
//! the same entries for a given date, so players see one shared grid without
//! any coordination. The transform is `frac(sin(seed + offset) * 10000)`;
//! changing it changes which games future grids contain, so it must stay
//! fixed for already-published dates to remain reproducible.

use chrono::NaiveDate;

/// Upper bound on hash draws per pool entry before falling back to a scan.
const DRAWS_PER_CANDIDATE: usize = 64;

/// Milliseconds since the Unix epoch at UTC midnight of `date`.
pub fn date_seed(date: NaiveDate) -> f64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
        .unwrap_or_default()
}

/// Deterministic pseudo-random value in `[0, 1)` derived from `x`.
pub fn seeded_random(x: f64) -> f64 {
    let v = x.sin() * 10000.0;
    v - v.floor()
}

/// Pick up to `count` distinct entries from `pool` for `date`.
///
/// Returns `min(count, pool.len())` entries. The draw loop rejects indices
/// already taken and advances the offset on every draw; if the draw bound is
/// hit first, remaining slots take the lowest unchosen indices in order.
pub fn select<T: Clone>(pool: &[T], date: NaiveDate, count: usize) -> Vec<T> {
    let target = count.min(pool.len());
    let seed = date_seed(date);

    let mut taken = vec![false; pool.len()];
    let mut chosen = Vec::with_capacity(target);
    let max_draws = pool.len().saturating_mul(DRAWS_PER_CANDIDATE);
    let mut offset = 0usize;

    while chosen.len() < target && offset < max_draws {
        let r = seeded_random(seed + offset as f64);
        let idx = ((r * pool.len() as f64).floor() as usize).min(pool.len() - 1);
        if !taken[idx] {
            taken[idx] = true;
            chosen.push(idx);
        }
        offset += 1;
    }

    if chosen.len() < target {
        let missing = taken
            .iter()
            .enumerate()
            .filter(|(_, t)| !**t)
            .map(|(idx, _)| idx)
            .take(target - chosen.len());
        chosen.extend(missing.collect::<Vec<_>>());
    }

    chosen.into_iter().map(|idx| pool[idx].clone()).collect()
}
