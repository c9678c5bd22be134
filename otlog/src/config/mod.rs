mod __test__;

use std::time::Duration;

use crate::level::Level;

/// Bounds for the sync formatter stack buffer.
pub const BUFFER_MIN: usize = 256;
pub const BUFFER_MAX: usize = 65536;

/// Upper bound on the async queue capacity.
pub const QUEUE_MAX: usize = 1 << 20;

/// Upper bound on the drain batch size.
pub const BATCH_MAX: usize = 1024;

/// Rule applied when the async queue is full.
///
/// - `Drop`: discard the new entry, count it in `logs_dropped`.
/// - `Block`: the producer waits for a free slot (released promptly on
///   shutdown).
/// - `Sample`: reject entries below `Error`; for `Error` and above evict the
///   oldest below-`Error` entry, or drop when none exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackpressurePolicy {
  #[default]
  Drop,
  Block,
  Sample,
}

/// Construction-time logger parameters.
///
/// A `Config` is captured by value when a logger is built and never mutated
/// afterwards; there is no runtime reconfiguration surface. The `const fn`
/// builders allow configs to live in `const` items.
#[derive(Debug, Clone)]
pub struct Config {
  /// Minimum level to emit; records below it are dropped before formatting.
  pub level: Level,
  /// Per-record field cap; wider payloads are truncated silently.
  pub max_fields: u16,
  /// Sync formatter stack buffer size, `256..=65536` bytes.
  pub buffer_size: usize,
  /// Route records through the async pipeline instead of the sync writer.
  pub async_mode: bool,
  /// Bounded queue capacity for async mode, `1..=2^20` entries.
  pub async_queue_size: usize,
  /// Drain batch upper bound, `1..=1024`. This is the single authoritative
  /// batch knob; the drainer has no private constant.
  pub batch_size: usize,
  /// When false every emit call is a no-op.
  pub enable_logging: bool,
  /// Enables the wide-word escape fast path.
  pub enable_simd: bool,
  /// Queue-full rule for async mode.
  pub backpressure: BackpressurePolicy,
  /// Drain tick interval for async mode. 1 ms keeps latency low; raise it to
  /// trade latency for fewer sink writes.
  pub flush_interval: Duration,
  /// Keys redacted for the lifetime of the logger, unioned with the runtime
  /// redaction set.
  pub redacted_keys: &'static [&'static str],
}

impl Config {
  pub const fn new() -> Self {
    Self {
      level: Level::Info,
      max_fields: 32,
      buffer_size: 8192,
      async_mode: false,
      async_queue_size: 8192,
      batch_size: 64,
      enable_logging: true,
      enable_simd: true,
      backpressure: BackpressurePolicy::Drop,
      flush_interval: Duration::from_millis(1),
      redacted_keys: &[],
    }
  }

  pub const fn with_level(mut self, level: Level) -> Self {
    self.level = level;
    self
  }

  pub const fn with_max_fields(mut self, max_fields: u16) -> Self {
    self.max_fields = max_fields;
    self
  }

  pub const fn with_buffer_size(mut self, buffer_size: usize) -> Self {
    self.buffer_size = buffer_size;
    self
  }

  pub const fn with_async_mode(mut self, async_mode: bool) -> Self {
    self.async_mode = async_mode;
    self
  }

  pub const fn with_async_queue_size(mut self, async_queue_size: usize) -> Self {
    self.async_queue_size = async_queue_size;
    self
  }

  pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
    self.batch_size = batch_size;
    self
  }

  pub const fn with_enable_logging(mut self, enable_logging: bool) -> Self {
    self.enable_logging = enable_logging;
    self
  }

  pub const fn with_enable_simd(mut self, enable_simd: bool) -> Self {
    self.enable_simd = enable_simd;
    self
  }

  pub const fn with_backpressure(mut self, policy: BackpressurePolicy) -> Self {
    self.backpressure = policy;
    self
  }

  pub const fn with_flush_interval(mut self, flush_interval: Duration) -> Self {
    self.flush_interval = flush_interval;
    self
  }

  pub const fn with_redacted_keys(mut self, keys: &'static [&'static str]) -> Self {
    self.redacted_keys = keys;
    self
  }

  /// Debug-time range checks for every parameter.
  pub fn validate(&self) {
    debug_assert!(self.max_fields > 0, "max_fields must be > 0");
    debug_assert!(
      (BUFFER_MIN..=BUFFER_MAX).contains(&self.buffer_size),
      "buffer_size out of 256..=65536"
    );
    debug_assert!(
      (1..=QUEUE_MAX).contains(&self.async_queue_size),
      "async_queue_size out of 1..=2^20"
    );
    debug_assert!(
      (1..=BATCH_MAX).contains(&self.batch_size),
      "batch_size out of 1..=1024"
    );
    debug_assert!(
      self.flush_interval > Duration::ZERO,
      "flush_interval must be non-zero"
    );
  }

  /// Clamped copy for release builds, where out-of-range parameters must not
  /// take the process down.
  pub(crate) fn normalized(mut self) -> Self {
    self.max_fields = self.max_fields.max(1);
    self.buffer_size = self.buffer_size.clamp(BUFFER_MIN, BUFFER_MAX);
    self.async_queue_size = self.async_queue_size.clamp(1, QUEUE_MAX);
    self.batch_size = self.batch_size.clamp(1, BATCH_MAX);
    if self.flush_interval.is_zero() {
      self.flush_interval = Duration::from_millis(1);
    }
    self
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::new()
  }
}
