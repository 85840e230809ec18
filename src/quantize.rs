//! Histogram-style value binning for style tables.
//!
//! Two pure algorithms over a list of magnitudes: equal-count binning
//! ([`compute_boundaries`]) and tiered percentile binning with a fixed
//! palette ([`compute_percent_boundaries`]), plus a linear color ramp
//! ([`compute_colors`]).

use crate::models::Abgr;

/// Ceiling on tail re-chunk rounds. The merge/re-chunk loop normally settles
/// in a handful of rounds; the cap guards inputs where the produced chunk
/// count oscillates without reaching the target.
const MAX_REBIN_ROUNDS: usize = 64;

/// Fixed six-step palette used by percentile binning, lowest bin first.
pub fn percent_palette() -> Vec<Abgr> {
    vec![
        Abgr::new(255, 255, 0, 0),
        Abgr::new(255, 255, 199, 0),
        Abgr::new(255, 103, 250, 0),
        Abgr::new(255, 15, 249, 167),
        Abgr::new(255, 17, 140, 255),
        Abgr::new(255, 0, 0, 255),
    ]
}

const PERCENTS: [f64; 6] = [0.05, 0.10, 0.15, 0.25, 0.50, 1.0];

/// Moves values from the front of each chunk's successor while the boundary
/// values collide on truncated-integer comparison, so equal values never
/// straddle two bins. Emptied chunks are dropped.
fn compress(chunks: &mut Vec<Vec<f64>>) {
    for i in 0..chunks.len().saturating_sub(1) {
        if chunks[i].is_empty() {
            continue;
        }
        loop {
            let Some(&end) = chunks[i].last() else { break };
            let Some(&front) = chunks[i + 1].first() else {
                break;
            };
            if end as i64 != front as i64 {
                break;
            }
            chunks[i + 1].remove(0);
            chunks[i].push(front);
        }
    }
    chunks.retain(|chunk| !chunk.is_empty());
}

/// Splits sorted values into chunks of the ideal size for `bins`, then merges
/// chunks whose boundary values collide. Returns the (possibly reduced)
/// target bin count together with the chunks.
fn chunk_up(sorted: &[f64], bins: usize) -> (usize, Vec<Vec<f64>>) {
    let mut distinct = sorted.to_vec();
    distinct.dedup();
    let bins = bins.min(distinct.len());
    if bins == 0 {
        return (0, Vec::new());
    }

    let ideal = ((sorted.len() as f64 / bins as f64).round() as usize).max(1);
    let mut chunks: Vec<Vec<f64>> = sorted.chunks(ideal).map(|c| c.to_vec()).collect();

    // One short tail chunk can be left over; fold it into the last kept chunk.
    if chunks.len() > bins {
        if let Some(tail) = chunks.pop() {
            if let Some(last) = chunks.last_mut() {
                last.extend(tail);
            }
        }
    }

    loop {
        let before = chunks.len();
        compress(&mut chunks);
        if chunks.len() == before {
            break;
        }
    }

    (bins, chunks)
}

/// Split magnitudes into at most `bins` contiguous, inclusive
/// `(lower, upper)` ranges holding roughly equal element counts.
///
/// Values sharing a truncated-integer representation always land in the same
/// bin, so fewer ranges than requested can come back (all-identical input
/// collapses to one). Each range after the first starts at the previous
/// range's maximum plus one, so the ranges partition `[min, max]` without
/// gaps or overlaps. An empty input yields no ranges.
pub fn compute_boundaries(values: &[f64], bins: usize) -> Vec<(f64, f64)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let (mut target, mut chunks) = chunk_up(&sorted, bins);

    // Merging can leave fewer chunks than asked for. Re-chunk everything
    // after the first chunk with one less bin, lowering the target as the
    // data forces it, until the count settles.
    let mut rounds = 0;
    while target != chunks.len() && rounds < MAX_REBIN_ROUNDS {
        rounds += 1;
        if chunks.len() < 2 {
            break;
        }
        let before_len = chunks.len();
        let before_target = target;

        let tail: Vec<f64> = chunks[1..].concat();
        let (reduced, new_chunks) = chunk_up(&tail, target - 1);
        if reduced + 1 < target {
            target = reduced + 1;
        }
        chunks.truncate(1);
        chunks.extend(new_chunks);

        if chunks.len() == before_len && target == before_target {
            break;
        }
    }

    let mut boundaries = Vec::with_capacity(chunks.len());
    let Some(first) = chunks.first() else {
        return boundaries;
    };
    boundaries.push((first[0], first[first.len() - 1]));
    for i in 1..chunks.len() {
        let prev_max = chunks[i - 1][chunks[i - 1].len() - 1];
        let max = chunks[i][chunks[i].len() - 1];
        boundaries.push((prev_max + 1.0, max));
    }
    boundaries
}

/// Six percentile-flavored bins with the fixed palette.
///
/// Small scalars get hand-tuned unit-width tiers; from 100 up, cut points at
/// 5/10/15/25/50% of `max_boundary` define the bins, with a final bin from
/// `max_boundary` to `scalar` rounded up. The `(4,6)`/`(6,10)` overlap in
/// the `<= 50` tier reproduces the established output of this ramp; keep it
/// until the render service changes.
pub fn compute_percent_boundaries(max_boundary: f64, scalar: f64) -> (Vec<Abgr>, Vec<(f64, f64)>) {
    let colors = percent_palette();
    let mut boundaries: Vec<(f64, f64)> = Vec::with_capacity(6);

    if scalar <= 10.0 {
        boundaries.extend([(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0), (5.0, 5.0)]);
        boundaries.push((6.0, scalar.trunc()));
    } else if scalar <= 30.0 {
        boundaries.extend([(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0), (5.0, 7.0)]);
        boundaries.push((8.0, scalar.trunc()));
    } else if scalar <= 50.0 {
        boundaries.extend([(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 6.0), (6.0, 10.0)]);
        boundaries.push((11.0, scalar.trunc()));
    } else if scalar < 100.0 {
        boundaries.extend([(1.0, 1.0), (2.0, 2.0), (3.0, 5.0), (6.0, 10.0), (11.0, 25.0)]);
        boundaries.push((26.0, scalar.trunc()));
    } else {
        for i in 0..PERCENTS.len() - 1 {
            let lower = if i == 0 {
                1.0
            } else {
                (PERCENTS[i] * max_boundary).trunc()
            };
            let upper = (PERCENTS[i + 1] * max_boundary).trunc();
            if upper == lower + 1.0 {
                boundaries.push((lower, lower));
            } else {
                boundaries.push((lower, upper - 1.0));
            }
        }
        boundaries.push((max_boundary.trunc(), scalar.ceil()));
    }

    (colors, boundaries)
}

/// Linear ramp of `count` colors from `start` to `end`, endpoints exact.
pub fn compute_colors(start: Abgr, end: Abgr, count: usize) -> Vec<Abgr> {
    match count {
        0 => return Vec::new(),
        1 => return vec![start],
        _ => {}
    }

    let lerp = |a: u8, b: u8, t: f64| -> u8 {
        let v = a as f64 + (b as f64 - a as f64) * t;
        v.round().clamp(0.0, 255.0) as u8
    };

    let mut colors = Vec::with_capacity(count);
    colors.push(start);
    let steps = (count - 1) as f64;
    for i in 1..count - 1 {
        let t = i as f64 / steps;
        colors.push(Abgr::new(
            lerp(start.alpha, end.alpha, t),
            lerp(start.blue, end.blue, t),
            lerp(start.green, end.green, t),
            lerp(start.red, end.red, t),
        ));
    }
    colors.push(end);
    colors
}
