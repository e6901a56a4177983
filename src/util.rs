use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

fn stable_hash(key: impl Hash) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Deterministic value in `[0, 1)` derived from `key`.
pub fn stable_unit(key: impl Hash) -> f64 {
    (stable_hash(key) >> 11) as f64 / (1u64 << 53) as f64
}

/// Deterministic offset in `[-1, 1]²` derived from `key`.
pub fn stable_pair(key: impl Hash) -> (f64, f64) {
    let hash = stable_hash(key);
    let x = (hash & 0xffff_ffff) as f64 / u32::MAX as f64;
    let y = ((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

pub fn format_millis(duration: Duration) -> String {
    if duration >= Duration::from_secs(1) {
        format!("{:.2} s", duration.as_secs_f64())
    } else {
        format!("{} ms", duration.as_millis())
    }
}
