//! # Level Module
//!
//! Record severity and its projections: the wire renderings, the
//! OpenTelemetry severity-number mapping, and the conversion from
//! `tracing` levels used by the bridge layer.

mod __test__;

use serde::{Deserialize, Serialize};

/// Log severity with compact `u8` representation.
///
/// # Ordering
///
/// Ordinals are fixed (`0..=5`) and `Ord` follows them, which makes the
/// ordering the filter predicate: a record is dropped before any
/// formatting work when `record_level < logger_level`.
///
/// # Renderings
///
/// Two fixed textual projections exist, both `&'static str`:
/// uppercase ([`Level::as_upper_str`], what the wire formats and
/// `severity_text` carry) and mixed case ([`Level::as_mixed_str`], for
/// human-facing surfaces).
///
/// # Serialization
///
/// Serde renders lowercase names (`"info"`, `"fatal"`) so level values in
/// config files and metric snapshots read naturally.
///
/// # Example
///
/// ```rust
/// use otlog::Level;
///
/// assert!(Level::Warn > Level::Info);
/// assert_eq!(Level::Warn.as_upper_str(), "WARN");
/// assert_eq!(Level::Warn.otel_severity(), 13);
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Trace = 0,
  Debug = 1,
  Info = 2,
  Warn = 3,
  Error = 4,
  Fatal = 5,
}

impl Level {
  /// Uppercase rendering used on the wire (`"INFO"`).
  #[inline]
  pub const fn as_upper_str(self) -> &'static str {
    match self {
      Level::Trace => "TRACE",
      Level::Debug => "DEBUG",
      Level::Info => "INFO",
      Level::Warn => "WARN",
      Level::Error => "ERROR",
      Level::Fatal => "FATAL",
    }
  }

  /// Mixed-case rendering (`"Info"`).
  #[inline]
  pub const fn as_mixed_str(self) -> &'static str {
    match self {
      Level::Trace => "Trace",
      Level::Debug => "Debug",
      Level::Info => "Info",
      Level::Warn => "Warn",
      Level::Error => "Error",
      Level::Fatal => "Fatal",
    }
  }

  /// OpenTelemetry severity number for this level.
  ///
  /// trace→1, debug→5, info→9, warn→13, error→17, fatal→21.
  #[inline]
  pub const fn otel_severity(self) -> u8 {
    match self {
      Level::Trace => 1,
      Level::Debug => 5,
      Level::Info => 9,
      Level::Warn => 13,
      Level::Error => 17,
      Level::Fatal => 21,
    }
  }

  /// Convert from a raw ordinal. Unknown values saturate to [`Level::Info`].
  #[inline]
  pub const fn from_u8(value: u8) -> Level {
    match value {
      0 => Level::Trace,
      1 => Level::Debug,
      2 => Level::Info,
      3 => Level::Warn,
      4 => Level::Error,
      5 => Level::Fatal,
      _ => Level::Info,
    }
  }

  /// Map a `tracing` level onto ours. `tracing` has no fatal level, so the
  /// mapping never produces [`Level::Fatal`].
  #[inline]
  pub fn from_tracing_level(level: &tracing::Level) -> Level {
    if *level == tracing::Level::TRACE {
      Level::Trace
    } else if *level == tracing::Level::DEBUG {
      Level::Debug
    } else if *level == tracing::Level::INFO {
      Level::Info
    } else if *level == tracing::Level::WARN {
      Level::Warn
    } else {
      Level::Error
    }
  }
}

impl std::fmt::Display for Level {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_upper_str())
  }
}
