//! Ledger timestamps: unix seconds with a trailing `Z`, e.g. `1771220592Z`.

use std::time::{SystemTime, UNIX_EPOCH};

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Current time in the format stored in `created_at` and `updated_at`.
pub fn now_epoch_z() -> String {
    format!("{}Z", epoch_secs())
}
