//! Exponential backoff.

use std::time::Duration;

/// Delay to wait after the `attempt`-th failed attempt (1-based).
///
/// `base * 2^attempt`, capped at `max`. Attempt 0 never waits.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(Duration::MAX).min(max)
}
