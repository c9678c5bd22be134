#[cfg(test)]
mod __test__ {

  use crate::level::Level;

  #[test]
  fn test_ordering_matches_ordinals() {
    assert!(Level::Trace < Level::Debug);
    assert!(Level::Debug < Level::Info);
    assert!(Level::Info < Level::Warn);
    assert!(Level::Warn < Level::Error);
    assert!(Level::Error < Level::Fatal);
    assert_eq!(Level::Fatal as u8, 5);
  }

  #[test]
  fn test_upper_and_mixed_renderings() {
    assert_eq!(Level::Trace.as_upper_str(), "TRACE");
    assert_eq!(Level::Info.as_upper_str(), "INFO");
    assert_eq!(Level::Fatal.as_upper_str(), "FATAL");
    assert_eq!(Level::Trace.as_mixed_str(), "Trace");
    assert_eq!(Level::Warn.as_mixed_str(), "Warn");
    assert_eq!(Level::Error.as_mixed_str(), "Error");
  }

  #[test]
  fn test_otel_severity_mapping() {
    assert_eq!(Level::Trace.otel_severity(), 1);
    assert_eq!(Level::Debug.otel_severity(), 5);
    assert_eq!(Level::Info.otel_severity(), 9);
    assert_eq!(Level::Warn.otel_severity(), 13);
    assert_eq!(Level::Error.otel_severity(), 17);
    assert_eq!(Level::Fatal.otel_severity(), 21);
  }

  #[test]
  fn test_from_u8_round_trip_and_saturation() {
    for level in [
      Level::Trace,
      Level::Debug,
      Level::Info,
      Level::Warn,
      Level::Error,
      Level::Fatal,
    ] {
      assert_eq!(Level::from_u8(level as u8), level);
    }
    assert_eq!(Level::from_u8(6), Level::Info);
    assert_eq!(Level::from_u8(255), Level::Info);
  }

  #[test]
  fn test_from_tracing_level() {
    assert_eq!(Level::from_tracing_level(&tracing::Level::TRACE), Level::Trace);
    assert_eq!(Level::from_tracing_level(&tracing::Level::INFO), Level::Info);
    assert_eq!(Level::from_tracing_level(&tracing::Level::ERROR), Level::Error);
  }

  #[test]
  fn test_serde_renders_lowercase() {
    assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
    let parsed: Level = serde_json::from_str("\"fatal\"").unwrap();
    assert_eq!(parsed, Level::Fatal);
  }

  #[test]
  fn test_display_is_upper() {
    assert_eq!(Level::Debug.to_string(), "DEBUG");
  }
}
