use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_THREAD_ID: AtomicU32 = AtomicU32::new(1);

thread_local! {
  static THREAD_ID: u32 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed).max(1);
}

/// Stable, nonzero per-thread identifier.
///
/// Ids come from a process-wide counter, claimed once per thread on first
/// use, so records carry small, collision-free `tid` values instead of an
/// opaque hash. After the first call this is a thread-local read.
pub fn current_thread_id_u32() -> u32 {
  THREAD_ID.with(|id| *id)
}

/// Wall-clock milliseconds since the Unix epoch.
#[inline]
pub fn now_millis() -> u64 {
  chrono::Utc::now().timestamp_millis() as u64
}

/// Wall-clock nanoseconds since the Unix epoch. Falls back to millisecond
/// precision if the nanosecond timestamp would overflow (year 2262).
#[inline]
pub fn now_nanos() -> u64 {
  let now = chrono::Utc::now();
  now
    .timestamp_nanos_opt()
    .map(|n| n as u64)
    .unwrap_or_else(|| now.timestamp_millis() as u64 * 1_000_000)
}
