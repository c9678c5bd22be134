#[cfg(test)]
mod __test__ {

  use std::time::Duration;

  use crate::config::{BackpressurePolicy, Config, BATCH_MAX, BUFFER_MAX, BUFFER_MIN, QUEUE_MAX};
  use crate::level::Level;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.level, Level::Info);
    assert_eq!(config.max_fields, 32);
    assert_eq!(config.buffer_size, 8192);
    assert!(!config.async_mode);
    assert_eq!(config.batch_size, 64);
    assert!(config.enable_logging);
    assert!(config.enable_simd);
    assert_eq!(config.backpressure, BackpressurePolicy::Drop);
    assert_eq!(config.flush_interval, Duration::from_millis(1));
    assert!(config.redacted_keys.is_empty());
    config.validate();
  }

  #[test]
  fn test_const_builders() {
    const CONFIG: Config = Config::new()
      .with_level(Level::Warn)
      .with_max_fields(3)
      .with_buffer_size(1024)
      .with_async_mode(true)
      .with_async_queue_size(16)
      .with_batch_size(8)
      .with_backpressure(BackpressurePolicy::Sample)
      .with_flush_interval(Duration::from_millis(5))
      .with_redacted_keys(&["password"]);

    assert_eq!(CONFIG.level, Level::Warn);
    assert_eq!(CONFIG.max_fields, 3);
    assert_eq!(CONFIG.buffer_size, 1024);
    assert!(CONFIG.async_mode);
    assert_eq!(CONFIG.async_queue_size, 16);
    assert_eq!(CONFIG.batch_size, 8);
    assert_eq!(CONFIG.backpressure, BackpressurePolicy::Sample);
    assert_eq!(CONFIG.redacted_keys, &["password"]);
    CONFIG.validate();
  }

  #[test]
  fn test_normalized_clamps_ranges() {
    let config = Config::new()
      .with_max_fields(0)
      .with_buffer_size(0)
      .with_async_queue_size(0)
      .with_batch_size(0)
      .with_flush_interval(Duration::ZERO)
      .normalized();

    assert_eq!(config.max_fields, 1);
    assert_eq!(config.buffer_size, BUFFER_MIN);
    assert_eq!(config.async_queue_size, 1);
    assert_eq!(config.batch_size, 1);
    assert_eq!(config.flush_interval, Duration::from_millis(1));

    let config = Config::new()
      .with_buffer_size(usize::MAX)
      .with_async_queue_size(usize::MAX)
      .with_batch_size(usize::MAX)
      .normalized();

    assert_eq!(config.buffer_size, BUFFER_MAX);
    assert_eq!(config.async_queue_size, QUEUE_MAX);
    assert_eq!(config.batch_size, BATCH_MAX);
  }
}
