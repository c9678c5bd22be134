//! # OTel Module
//!
//! OpenTelemetry-shaped logging: the [`Resource`] / [`InstrumentationScope`]
//! metadata model, the owned [`LogRecord`] used for OTLP batches, and
//! [`OtelLogger`] with its two line formats.
//!
//! The two schemas are deliberately distinct and named:
//! - [`OtelFormat::OtelCompact`]: the house compact line plus
//!   `severity_number` and service identity keys; cheap, grep-friendly.
//! - [`OtelFormat::Otel`]: a full OTel LogRecord object per line
//!   (`timeUnixNano`, `body`, `attributes`, `resource`, `scope`).
//!
//! Resource and scope JSON never change after construction, so both are
//! rendered once and memcpy'd into every record.


use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::async_pipeline::{MetricsSnapshot, MAX_ENTRY_BYTES};
use crate::config::{Config, BUFFER_MAX};
use crate::error::Error;
use crate::field::{self, Field, FieldValue};
use crate::json::{self, append_json_str, BufferFull, RecordBuffer};
use crate::level::Level;
use crate::logger::{current_ids, RecordWriter};
use crate::redaction::RedactionPolicy;
use crate::sink::Sink;
use crate::task;
use crate::utils;

/// Attribute cap on an OTel log record.
pub const MAX_ATTRIBUTES: usize = 1024;

const REDACTED_VALUE: &str = "[REDACTED]";

/// Entity producing records: service identity plus process/host/OS info.
/// Only `service.name` is mandatory; `detect` fills what the environment
/// offers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
  pub service_name: String,
  pub service_version: Option<String>,
  pub service_namespace: Option<String>,
  pub service_instance_id: Option<String>,
  pub process_pid: Option<u32>,
  pub process_executable: Option<String>,
  pub process_command: Option<String>,
  pub process_runtime: Option<String>,
  pub host_name: Option<String>,
  pub host_id: Option<String>,
  pub host_arch: Option<String>,
  pub os_type: Option<String>,
  pub os_name: Option<String>,
  pub os_version: Option<String>,
}

impl Default for Resource {
  fn default() -> Self {
    Self::new("unknown_service")
  }
}

impl Resource {
  pub fn new(service_name: impl Into<String>) -> Self {
    let mut service_name = service_name.into();
    debug_assert!(!service_name.is_empty(), "service name must be non-empty");
    if service_name.is_empty() {
      service_name = "unknown_service".to_owned();
    }
    Self {
      service_name,
      service_version: None,
      service_namespace: None,
      service_instance_id: None,
      process_pid: None,
      process_executable: None,
      process_command: None,
      process_runtime: None,
      host_name: None,
      host_id: None,
      host_arch: None,
      os_type: None,
      os_name: None,
      os_version: None,
    }
  }

  /// Fill process/host/OS fields from the environment.
  pub fn detect(service_name: impl Into<String>) -> Self {
    let mut resource = Self::new(service_name);
    resource.process_pid = Some(std::process::id());
    resource.process_executable = std::env::current_exe()
      .ok()
      .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()));
    resource.process_runtime = Some("rust".to_owned());
    resource.host_name = Some(gethostname::gethostname().to_string_lossy().into_owned());
    resource.host_arch = Some(std::env::consts::ARCH.to_owned());
    resource.os_type = Some(std::env::consts::OS.to_owned());
    resource
  }

  pub fn with_service_version(mut self, version: impl Into<String>) -> Self {
    self.service_version = Some(version.into());
    self
  }

  pub fn with_service_namespace(mut self, namespace: impl Into<String>) -> Self {
    self.service_namespace = Some(namespace.into());
    self
  }

  pub fn with_service_instance_id(mut self, instance_id: impl Into<String>) -> Self {
    self.service_instance_id = Some(instance_id.into());
    self
  }

  /// Render the OTLP attribute array (`[{"key":…,"value":{…}}…]`) for every
  /// non-null field. Called once per logger/batch, never per record.
  pub(crate) fn attributes_json(&self) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    out.push(b'[');
    let mut first = true;

    let mut string_attr = |out: &mut Vec<u8>, key: &str, value: &str, first: &mut bool| {
      if !*first {
        out.push(b',');
      }
      *first = false;
      out.extend_from_slice(b"{\"key\":");
      append_json_str(out, key);
      out.extend_from_slice(b",\"value\":{\"stringValue\":");
      append_json_str(out, value);
      out.extend_from_slice(b"}}");
    };

    string_attr(&mut out, "service.name", &self.service_name, &mut first);
    let optional = [
      ("service.version", &self.service_version),
      ("service.namespace", &self.service_namespace),
      ("service.instance.id", &self.service_instance_id),
      ("process.executable.name", &self.process_executable),
      ("process.command", &self.process_command),
      ("process.runtime.name", &self.process_runtime),
      ("host.name", &self.host_name),
      ("host.id", &self.host_id),
      ("host.arch", &self.host_arch),
      ("os.type", &self.os_type),
      ("os.name", &self.os_name),
      ("os.version", &self.os_version),
    ];
    for (key, value) in optional {
      if let Some(value) = value {
        string_attr(&mut out, key, value, &mut first);
      }
    }
    if let Some(pid) = self.process_pid {
      if !first {
        out.push(b',');
      }
      out.extend_from_slice(b"{\"key\":\"process.pid\",\"value\":{\"intValue\":\"");
      let mut scratch = itoa::Buffer::new();
      out.extend_from_slice(scratch.format(pid).as_bytes());
      out.extend_from_slice(b"\"}}");
    }
    out.push(b']');
    out
  }
}

/// The instrumentation library that produced a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationScope {
  pub name: String,
  pub version: Option<String>,
  pub schema_url: Option<String>,
}

impl InstrumentationScope {
  pub fn new(name: impl Into<String>) -> Self {
    let mut name = name.into();
    debug_assert!(!name.is_empty(), "scope name must be non-empty");
    if name.is_empty() {
      name = env!("CARGO_PKG_NAME").to_owned();
    }
    Self {
      name,
      version: None,
      schema_url: None,
    }
  }

  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = Some(version.into());
    self
  }

  pub fn with_schema_url(mut self, schema_url: impl Into<String>) -> Self {
    self.schema_url = Some(schema_url.into());
    self
  }

  /// `{"name":…,"version":…?}` rendered once at construction.
  pub(crate) fn scope_json(&self) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(b"{\"name\":");
    append_json_str(&mut out, &self.name);
    if let Some(version) = &self.version {
      out.extend_from_slice(b",\"version\":");
      append_json_str(&mut out, version);
    }
    out.push(b'}');
    out
  }
}

impl Default for InstrumentationScope {
  fn default() -> Self {
    Self::new(env!("CARGO_PKG_NAME")).with_version(env!("CARGO_PKG_VERSION"))
  }
}

/// Record body: a string in the common case, or a bare primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Body {
  Str(String),
  I64(i64),
  F64(f64),
  Bool(bool),
}

/// Owned attribute value for batch records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
  Str(String),
  I64(i64),
  U64(u64),
  F64(f64),
  Bool(bool),
  Null,
  Redacted,
}

impl AttrValue {
  fn from_field(value: FieldValue<'_>, redacted: bool) -> Self {
    if redacted {
      return AttrValue::Redacted;
    }
    match value {
      FieldValue::Str(s) => AttrValue::Str(s.to_owned()),
      FieldValue::I64(v) => AttrValue::I64(v),
      FieldValue::U64(v) => AttrValue::U64(v),
      FieldValue::F64(v) => AttrValue::F64(v),
      FieldValue::Bool(v) => AttrValue::Bool(v),
      FieldValue::Null => AttrValue::Null,
      FieldValue::Redacted { .. } => AttrValue::Redacted,
    }
  }
}

/// Owned OTel log record, the unit the OTLP serializer batches.
///
/// Invariants: timestamps are nonzero, `severity_number` is `0..=24`, a
/// string body is non-empty, attributes are capped at [`MAX_ATTRIBUTES`].
#[derive(Debug, Clone)]
pub struct LogRecord {
  pub timestamp_ns: u64,
  pub observed_timestamp_ns: u64,
  pub severity_number: u8,
  pub severity_text: Option<&'static str>,
  pub body: Body,
  pub attributes: Vec<(String, AttrValue)>,
  pub trace_id_hex: Option<[u8; 32]>,
  pub span_id_hex: Option<[u8; 16]>,
  pub flags: Option<u8>,
}

impl LogRecord {
  pub fn new(level: Level, body: impl Into<String>) -> Self {
    let now = utils::now_nanos();
    let body = body.into();
    debug_assert!(!body.is_empty(), "record body must be non-empty");
    Self {
      timestamp_ns: now,
      observed_timestamp_ns: now,
      severity_number: level.otel_severity(),
      severity_text: Some(level.as_upper_str()),
      body: Body::Str(body),
      attributes: Vec::new(),
      trace_id_hex: None,
      span_id_hex: None,
      flags: None,
    }
  }

  pub fn with_attribute(mut self, key: impl Into<String>, value: AttrValue) -> Self {
    if self.attributes.len() < MAX_ATTRIBUTES {
      self.attributes.push((key.into(), value));
    }
    self
  }

  pub fn with_trace(mut self, ctx: &crate::trace_context::TraceContext) -> Self {
    self.trace_id_hex = Some(*ctx.trace_id_hex());
    self.span_id_hex = Some(*ctx.span_id_hex());
    self.flags = Some(ctx.flags().0);
    self
  }
}

/// Which line schema an [`OtelLogger`] emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtelFormat {
  /// Compact line plus `severity_number` and service identity.
  OtelCompact,
  /// Full OTel LogRecord object per line.
  Otel,
}

/// OTel-shaped logger sharing the compact logger's buffer and writer
/// discipline.
pub struct OtelLogger<S: Sink> {
  config: Config,
  format: OtelFormat,
  resource: Resource,
  scope: InstrumentationScope,
  redaction: Arc<RedactionPolicy>,
  writer: RecordWriter<S>,
  // pre-rendered fragments, memcpy'd per record
  resource_block: Vec<u8>,
  scope_block: Vec<u8>,
  service_pairs: Vec<u8>,
}

impl<S: Sink> OtelLogger<S> {
  pub fn new(
    config: Config,
    format: OtelFormat,
    resource: Resource,
    scope: InstrumentationScope,
    sink: S,
  ) -> Result<Self, Error> {
    config.validate();
    let config = config.normalized();
    let redaction = Arc::new(RedactionPolicy::new(config.redacted_keys));
    let writer = RecordWriter::new(&config, sink)?;

    let mut resource_block = Vec::with_capacity(256);
    resource_block.extend_from_slice(b"\"resource\":{\"attributes\":");
    resource_block.extend_from_slice(&resource.attributes_json());
    resource_block.push(b'}');

    let mut scope_block = Vec::with_capacity(64);
    scope_block.extend_from_slice(b"\"scope\":");
    scope_block.extend_from_slice(&scope.scope_json());

    let mut service_pairs = Vec::with_capacity(64);
    service_pairs.extend_from_slice(b"\"service.name\":");
    append_json_str(&mut service_pairs, &resource.service_name);
    if let Some(version) = &resource.service_version {
      service_pairs.extend_from_slice(b",\"service.version\":");
      append_json_str(&mut service_pairs, version);
    }

    Ok(Self {
      config,
      format,
      resource,
      scope,
      redaction,
      writer,
      resource_block,
      scope_block,
      service_pairs,
    })
  }

  #[inline]
  pub fn config(&self) -> &Config {
    &self.config
  }

  #[inline]
  pub fn format(&self) -> OtelFormat {
    self.format
  }

  #[inline]
  pub fn resource(&self) -> &Resource {
    &self.resource
  }

  #[inline]
  pub fn scope(&self) -> &InstrumentationScope {
    &self.scope
  }

  #[inline]
  pub fn redaction(&self) -> &Arc<RedactionPolicy> {
    &self.redaction
  }

  pub fn metrics(&self) -> Option<MetricsSnapshot> {
    self.writer.metrics()
  }

  #[inline]
  pub fn enabled(&self, level: Level) -> bool {
    self.config.enable_logging && level >= self.config.level
  }

  /// Emit one record in the configured schema. Same contract as the compact
  /// logger: infallible, overflow drops the record whole.
  pub fn log(&self, level: Level, msg: &str, fields: &[Field]) {
    if !self.enabled(level) {
      return;
    }

    let mut storage = [0u8; BUFFER_MAX];
    let cap = if self.writer.is_queued() {
      self.config.buffer_size.min(MAX_ENTRY_BYTES)
    } else {
      self.config.buffer_size
    };
    let mut buf = RecordBuffer::new(&mut storage[..cap]);

    let outcome = match self.format {
      OtelFormat::OtelCompact => self.format_otel_compact(&mut buf, level, msg, fields),
      OtelFormat::Otel => self.format_otel(&mut buf, level, msg, fields),
    };
    if outcome.is_err() {
      return;
    }
    self.writer.dispatch(buf.as_slice(), level);
  }

  #[inline]
  pub fn trace(&self, msg: &str, fields: &[Field]) {
    self.log(Level::Trace, msg, fields);
  }

  #[inline]
  pub fn debug(&self, msg: &str, fields: &[Field]) {
    self.log(Level::Debug, msg, fields);
  }

  #[inline]
  pub fn info(&self, msg: &str, fields: &[Field]) {
    self.log(Level::Info, msg, fields);
  }

  #[inline]
  pub fn warn(&self, msg: &str, fields: &[Field]) {
    self.log(Level::Warn, msg, fields);
  }

  #[inline]
  pub fn error(&self, msg: &str, fields: &[Field]) {
    self.log(Level::Error, msg, fields);
  }

  #[inline]
  pub fn fatal(&self, msg: &str, fields: &[Field]) {
    self.log(Level::Fatal, msg, fields);
  }

  pub fn flush(&self) {
    self.writer.flush();
  }

  pub fn shutdown(self) {
    self.writer.shutdown();
  }

  /// Build an owned [`LogRecord`] from a call-shaped payload, applying the
  /// same truncation and redaction as the line formatters. This is the
  /// bridge into OTLP batch export.
  pub fn make_record(&self, level: Level, msg: &str, fields: &[Field]) -> LogRecord {
    let mut record = LogRecord::new(level, msg);
    let (trace_hex, span_hex, flags) = task::with_current(|ctx| {
      (
        *ctx.trace_context().trace_id_hex(),
        *ctx.trace_context().span_id_hex(),
        ctx.trace_context().flags().0,
      )
    });
    record.trace_id_hex = Some(trace_hex);
    record.span_id_hex = Some(span_hex);
    record.flags = Some(flags);
    for f in field::truncate(fields, self.config.max_fields) {
      let redacted = self.redaction.is_redacted(f.key());
      record
        .attributes
        .push((f.key().to_owned(), AttrValue::from_field(f.value(), redacted)));
    }
    record
  }

  fn format_otel_compact(
    &self,
    buf: &mut RecordBuffer<'_>,
    level: Level,
    msg: &str,
    fields: &[Field],
  ) -> Result<(), BufferFull> {
    let wide = self.config.enable_simd;
    let (trace_hex, span_hex) = current_ids();

    buf.put_bytes(b"{\"level\":\"")?;
    buf.put_bytes(level.as_upper_str().as_bytes())?;
    buf.put_bytes(b"\",\"msg\":")?;
    json::put_json_str(buf, msg, wide)?;
    buf.put_bytes(b",\"ts\":")?;
    buf.put_u64(utils::now_millis())?;
    buf.put_bytes(b",\"tid\":")?;
    buf.put_u64(utils::current_thread_id_u32() as u64)?;
    buf.put_bytes(b",\"severity_number\":")?;
    buf.put_u64(level.otel_severity() as u64)?;
    buf.put_bytes(b",\"trace\":\"")?;
    buf.put_bytes(&trace_hex)?;
    buf.put_bytes(b"\",\"span\":\"")?;
    buf.put_bytes(&span_hex)?;
    buf.put_bytes(b"\",")?;
    buf.put_bytes(&self.service_pairs)?;

    for f in field::truncate(fields, self.config.max_fields) {
      buf.put_byte(b',')?;
      json::put_json_str(buf, f.key(), wide)?;
      buf.put_byte(b':')?;
      crate::logger::put_compact_value(buf, f, &self.redaction, wide)?;
    }

    buf.put_bytes(b"}\n")
  }

  fn format_otel(
    &self,
    buf: &mut RecordBuffer<'_>,
    level: Level,
    msg: &str,
    fields: &[Field],
  ) -> Result<(), BufferFull> {
    let wide = self.config.enable_simd;
    let ts_ns = utils::now_nanos();
    let (trace_hex, span_hex, flags) = task::with_current(|ctx| {
      (
        *ctx.trace_context().trace_id_hex(),
        match ctx.current_span() {
          Some(span_id) => crate::trace_context::span_id_to_hex(&span_id),
          None => *ctx.trace_context().span_id_hex(),
        },
        ctx.trace_context().flags().0,
      )
    });

    buf.put_bytes(b"{\"timeUnixNano\":\"")?;
    buf.put_u64(ts_ns)?;
    buf.put_bytes(b"\",\"observedTimeUnixNano\":\"")?;
    buf.put_u64(ts_ns)?;
    buf.put_bytes(b"\",\"severityNumber\":")?;
    buf.put_u64(level.otel_severity() as u64)?;
    buf.put_bytes(b",\"severityText\":\"")?;
    buf.put_bytes(level.as_upper_str().as_bytes())?;
    buf.put_bytes(b"\",\"body\":{\"stringValue\":")?;
    json::put_json_str(buf, msg, wide)?;
    buf.put_bytes(b"},\"attributes\":[")?;

    let mut first = true;
    for f in field::truncate(fields, self.config.max_fields) {
      if !first {
        buf.put_byte(b',')?;
      }
      first = false;
      buf.put_bytes(b"{\"key\":")?;
      json::put_json_str(buf, f.key(), wide)?;
      buf.put_bytes(b",\"value\":")?;
      self.put_otel_attr_value(buf, f, wide)?;
      buf.put_bytes(b"}")?;
    }

    buf.put_bytes(b"],\"traceId\":\"")?;
    buf.put_bytes(&trace_hex)?;
    buf.put_bytes(b"\",\"spanId\":\"")?;
    buf.put_bytes(&span_hex)?;
    buf.put_bytes(b"\",\"flags\":")?;
    buf.put_u64(flags as u64)?;
    buf.put_byte(b',')?;
    buf.put_bytes(&self.resource_block)?;
    buf.put_byte(b',')?;
    buf.put_bytes(&self.scope_block)?;
    buf.put_bytes(b"}\n")
  }

  /// OTel attribute value object. Integers are quoted decimals per the
  /// OTLP/JSON encoding; null and redacted collapse to the sentinel value
  /// object.
  fn put_otel_attr_value(
    &self,
    buf: &mut RecordBuffer<'_>,
    f: &Field,
    wide: bool,
  ) -> Result<(), BufferFull> {
    let redacted = self.redaction.is_redacted(f.key());
    if redacted {
      buf.put_bytes(b"{\"stringValue\":\"")?;
      buf.put_bytes(REDACTED_VALUE.as_bytes())?;
      return buf.put_bytes(b"\"}");
    }
    match f.value() {
      FieldValue::Str(s) => {
        buf.put_bytes(b"{\"stringValue\":")?;
        json::put_json_str(buf, s, wide)?;
        buf.put_byte(b'}')
      },
      FieldValue::I64(v) => {
        buf.put_bytes(b"{\"intValue\":\"")?;
        buf.put_i64(v)?;
        buf.put_bytes(b"\"}")
      },
      FieldValue::U64(v) => {
        buf.put_bytes(b"{\"intValue\":\"")?;
        buf.put_u64(v)?;
        buf.put_bytes(b"\"}")
      },
      FieldValue::F64(v) => {
        buf.put_bytes(b"{\"doubleValue\":")?;
        buf.put_f64_5(v)?;
        buf.put_byte(b'}')
      },
      FieldValue::Bool(true) => buf.put_bytes(b"{\"boolValue\":true}"),
      FieldValue::Bool(false) => buf.put_bytes(b"{\"boolValue\":false}"),
      FieldValue::Null | FieldValue::Redacted { .. } => {
        buf.put_bytes(b"{\"stringValue\":\"")?;
        buf.put_bytes(REDACTED_VALUE.as_bytes())?;
        buf.put_bytes(b"\"}")
      },
    }
  }
}
