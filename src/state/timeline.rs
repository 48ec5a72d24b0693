//! Derivations over a timer's sub-interval layout
//!
//! Everything here is a pure function of `(duration, intervals, elapsed)`;
//! the countdown engine and the clock projection both build on these.

/// Cumulative checkpoint offsets for an ordered list of sub-interval lengths.
///
/// An empty input yields no checkpoints: the whole duration is one implicit
/// block. For non-empty input the result is strictly increasing and its last
/// element equals the sum of the intervals.
pub fn compute_checkpoints(intervals: &[u32]) -> Vec<u32> {
    let mut running_total = 0;
    intervals
        .iter()
        .map(|interval| {
            running_total += interval;
            running_total
        })
        .collect()
}

/// Seconds elapsed since the countdown started.
pub fn elapsed(duration: u32, time_left: u32) -> u32 {
    duration.saturating_sub(time_left)
}

/// The smallest checkpoint strictly after `elapsed`, if any remains.
pub fn next_checkpoint(checkpoints: &[u32], elapsed: u32) -> Option<u32> {
    checkpoints.iter().copied().find(|&stamp| stamp > elapsed)
}

/// Fill percentage of one block in `[0, 100]`.
///
/// 0 until the block starts, 100 once `elapsed` reaches the block's end,
/// linear in between.
pub fn block_fill_fraction(block: usize, checkpoints: &[u32], elapsed: u32) -> f64 {
    if block >= checkpoints.len() {
        return 0.0;
    }
    let start = if block == 0 { 0 } else { checkpoints[block - 1] };
    let end = checkpoints[block];
    if elapsed <= start {
        0.0
    } else if elapsed >= end {
        100.0
    } else {
        (elapsed - start) as f64 / (end - start) as f64 * 100.0
    }
}

/// True iff `elapsed` lands exactly on a checkpoint boundary, excluding the
/// start (a no-op) and the full duration (reported as completion instead).
pub fn is_checkpoint_instant(checkpoints: &[u32], duration: u32, elapsed: u32) -> bool {
    elapsed != 0 && elapsed != duration && checkpoints.contains(&elapsed)
}

/// Format seconds as "MM:SS".
pub fn format_mmss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
