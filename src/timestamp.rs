//! Wall-clock timestamp formatting shared by block construction.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the epoch as a decimal string, matching the
/// original source's `str(time.time())` (e.g. `"1734129936.8752465"`).
pub fn now() -> String {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the epoch");
    format!(
        "{}.{:07}",
        elapsed.as_secs(),
        elapsed.subsec_nanos() / 100
    )
}
