//! # otlog
//!
//! High-throughput structured logging with zero allocation on the emit
//! path. Records are assembled as JSON in a fixed stack buffer and written
//! either synchronously under a mutex or through a bounded queue drained by
//! a timer-driven batch writer. Output is the compact house format or an
//! OpenTelemetry-shaped record, with W3C trace/span correlation and
//! per-field redaction built in.
//!
//! ```rust
//! use otlog::{fields, Config, Level, Logger};
//!
//! let logger = Logger::new(Config::new().with_level(Level::Debug), Vec::<u8>::new()).unwrap();
//! logger.info("user logged in", &fields!["user_id" => 4211u64, "mfa" => true]);
//! ```

pub mod async_pipeline;
pub mod bridge;
pub mod config;
pub mod error;
pub mod field;
pub mod json;
pub mod level;
pub mod logger;
pub mod otel;
pub mod otlp;
pub mod redaction;
pub mod sink;
pub mod task;
pub mod trace_context;
pub mod utils;

pub use async_pipeline::{AsyncPipeline, MetricsSnapshot};
pub use bridge::LoggerLayer;
pub use config::{BackpressurePolicy, Config};
pub use error::Error;
pub use field::{Field, FieldValue, RedactTag};
pub use level::Level;
pub use logger::Logger;
pub use otel::{InstrumentationScope, LogRecord, OtelFormat, OtelLogger, Resource};
pub use redaction::RedactionPolicy;
pub use sink::{SharedSink, Sink};
pub use task::{Span, TaskContext};
pub use trace_context::{TraceContext, TraceFlags};
