// Rollup (sampling granularity) selection.
// The metrics API returns at most `max_data_points` points per metric, so the
// rollup must grow with the window. Data older than 24 hours is only kept at
// 1-minute granularity or coarser (backend retention policy).

use tracing::warn;

use crate::models::TimeWindow;

/// Result-count ceiling of the monitoring metrics API.
pub const MAX_DATA_POINTS: u64 = 600;

const RECENT_ROLLUPS_SECS: [u32; 5] = [1, 5, 60, 300, 3600];
const HISTORICAL_ROLLUPS_SECS: [u32; 3] = [60, 300, 3600];

const RECENT_HORIZON_SECS: i64 = 24 * 60 * 60;

/// Candidate rollups, finest first, for a window starting at `start_time_unix`.
pub fn rollup_candidates(start_time_unix: i64, now_unix: i64) -> &'static [u32] {
    if now_unix - start_time_unix < RECENT_HORIZON_SECS {
        &RECENT_ROLLUPS_SECS
    } else {
        &HISTORICAL_ROLLUPS_SECS
    }
}

/// Finest rollup `g` with `window_secs / g < max_data_points`.
///
/// When even the coarsest candidate exceeds the ceiling, the coarsest is
/// returned and the backend truncates the result; this keeps the choice
/// monotonic in window length.
pub fn select_rollup(window: &TimeWindow, max_data_points: u64, now_unix: i64) -> u32 {
    let candidates = rollup_candidates(window.start_time_unix, now_unix);
    let window_secs = window.duration_secs();

    if let Some(&rollup) = candidates
        .iter()
        .find(|&&g| window_secs / u64::from(g) < max_data_points)
    {
        return rollup;
    }

    let coarsest = candidates[candidates.len() - 1];
    warn!(
        window_secs,
        max_data_points,
        rollup_secs = coarsest,
        "window too long for any rollup; results will be truncated"
    );
    coarsest
}
