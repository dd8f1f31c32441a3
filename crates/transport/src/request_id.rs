use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A correlation id for error responses. Not a UUID — a monotonic counter
/// salted with process-start-relative time is all §7 asks for ("a
/// correlation id in the body"), and it avoids a dependency the rest of
/// this crate has no other use for.
pub fn next() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("req-{nanos:x}-{seq}")
}
