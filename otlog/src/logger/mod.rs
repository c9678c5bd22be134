//! # Logger Module
//!
//! The synchronous pipeline and the house wire format: one JSON object per
//! record, `\n`-terminated,
//!
//! ```text
//! {"level":"INFO","msg":"...","trace":"<32hex>","span":"<16hex>","ts":<ms>,"tid":<n>,"<k>":<v>,...}
//! ```
//!
//! Assembly happens in a stack buffer of `Config::buffer_size` bytes with no
//! lock held; the writer mutex guards exactly one `write` of the finished
//! slice. A record that overflows the buffer is dropped whole; partial
//! records are never observable. With `Config::async_mode` the same
//! assembly runs on the caller thread and the finished slice is handed to
//! the async pipeline instead.
//!
//! This is the plain compact schema; the OTel-flavored compact schema
//! (which adds `severity_number` and service identity) lives in
//! [`crate::otel`].


use std::borrow::Cow;
use std::sync::{Arc, Mutex};

use crate::async_pipeline::{AsyncPipeline, MetricsSnapshot, MAX_ENTRY_BYTES};
use crate::config::{Config, BUFFER_MAX};
use crate::error::Error;
use crate::field::{self, Field, FieldValue, RedactTag};
use crate::json::{self, BufferFull, RecordBuffer};
use crate::level::Level;
use crate::redaction::RedactionPolicy;
use crate::sink::Sink;
use crate::task::{self, Span};
use crate::trace_context::{self, span_id_to_hex, TraceContext, SPAN_ID_BYTES, TRACE_ID_BYTES};
use crate::utils;

/// Where finished records go: the sync mutex writer or the async queue.
pub(crate) enum RecordWriter<S: Sink> {
  Direct(Mutex<S>),
  Queued(AsyncPipeline<S>),
}

impl<S: Sink> RecordWriter<S> {
  pub(crate) fn new(config: &Config, sink: S) -> Result<Self, Error> {
    if config.async_mode {
      Ok(RecordWriter::Queued(AsyncPipeline::spawn(sink, config)?))
    } else {
      Ok(RecordWriter::Direct(Mutex::new(sink)))
    }
  }

  /// One atomic write per record. Sink errors are swallowed.
  pub(crate) fn dispatch(&self, bytes: &[u8], level: Level) {
    match self {
      RecordWriter::Direct(sink) => {
        if let Ok(mut sink) = sink.lock() {
          let _ = sink.write(bytes);
        }
      },
      RecordWriter::Queued(pipeline) => pipeline.enqueue(bytes, level),
    }
  }

  pub(crate) fn flush(&self) {
    match self {
      RecordWriter::Direct(sink) => {
        if let Ok(mut sink) = sink.lock() {
          let _ = sink.flush();
        }
      },
      RecordWriter::Queued(pipeline) => pipeline.flush_pending(),
    }
  }

  pub(crate) fn shutdown(self) {
    match self {
      RecordWriter::Direct(sink) => {
        if let Ok(mut sink) = sink.lock() {
          let _ = sink.flush();
        }
      },
      RecordWriter::Queued(pipeline) => pipeline.shutdown(),
    }
  }

  pub(crate) fn metrics(&self) -> Option<MetricsSnapshot> {
    match self {
      RecordWriter::Direct(_) => None,
      RecordWriter::Queued(pipeline) => Some(pipeline.metrics()),
    }
  }

  pub(crate) fn is_queued(&self) -> bool {
    matches!(self, RecordWriter::Queued(_))
  }
}

/// Compact-format logger over an arbitrary byte sink.
pub struct Logger<S: Sink> {
  config: Config,
  redaction: Arc<RedactionPolicy>,
  writer: RecordWriter<S>,
}

impl<S: Sink> Logger<S> {
  /// Capture the config, build the redaction policy, and take ownership of
  /// the sink. In async mode this spawns the drainer thread; that setup is
  /// the only fallible step.
  pub fn new(config: Config, sink: S) -> Result<Self, Error> {
    config.validate();
    let config = config.normalized();
    let redaction = Arc::new(RedactionPolicy::new(config.redacted_keys));
    let writer = RecordWriter::new(&config, sink)?;
    Ok(Self {
      config,
      redaction,
      writer,
    })
  }

  #[inline]
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Handle for mutating the runtime redaction key set.
  #[inline]
  pub fn redaction(&self) -> &Arc<RedactionPolicy> {
    &self.redaction
  }

  /// Async pipeline counters; `None` in sync mode.
  pub fn metrics(&self) -> Option<MetricsSnapshot> {
    self.writer.metrics()
  }

  /// Level filter, applied before any formatting work.
  #[inline]
  pub fn enabled(&self, level: Level) -> bool {
    self.config.enable_logging && level >= self.config.level
  }

  /// Emit one record. Infallible: overflow drops the record, sink errors
  /// are swallowed, queue-full follows the backpressure policy.
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

    let (trace_hex, span_hex) = current_ids();
    let outcome = format_compact(
      &mut buf,
      level,
      msg,
      &trace_hex,
      &span_hex,
      utils::now_millis(),
      utils::current_thread_id_u32(),
      fields,
      &self.redaction,
      &self.config,
    );
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

  /// Open a span: derive a child context from this thread's task context
  /// (parented on the innermost active span) and push it on the span stack.
  pub fn span_start(&self, name: impl Into<Cow<'static, str>>) -> Span {
    let name = name.into();
    task::with_current(|ctx| {
      // The parent is the innermost active span, falling back to the task's
      // own span.
      let parent = ctx
        .current_span()
        .unwrap_or(*ctx.trace_context().span_id());
      let child = TraceContext::from_ids(
        *ctx.trace_context().trace_id(),
        trace_context::fresh_span_id(),
        ctx.trace_context().flags(),
        Some(parent),
      );
      // Stack overflow leaves the span untracked but still usable.
      let tracked = ctx.push_span(*child.span_id()).is_ok();
      Span::begin(name, child, Some(parent), tracked)
    })
  }

  /// Close a span: emit one info record carrying its duration, then pop it
  /// from the span stack. Ends must pair LIFO with starts.
  pub fn span_end(&self, span: Span) {
    let end_ns = utils::now_nanos();
    let duration_ns = end_ns.saturating_sub(span.start_time_ns());

    // Logged before the pop so the record still carries the span's own id.
    self.log(
      Level::Info,
      span.name(),
      &[
        Field::u64("duration_ns", duration_ns),
        Field::u64("start_ns", span.start_time_ns()),
        Field::u64("end_ns", end_ns),
      ],
    );

    if span.tracked() {
      let popped = task::with_current(|ctx| ctx.pop_span());
      debug_assert!(
        popped == Some(span.span_id()),
        "span_end must pair LIFO with span_start"
      );
    }
  }

  /// Flush the sink (sync) or drain everything queued (async).
  pub fn flush(&self) {
    self.writer.flush();
  }

  /// Tear down: final drain in async mode, then drop the sink.
  pub fn shutdown(self) {
    self.writer.shutdown();
  }
}

/// This thread's trace/span hex pair: the innermost active span when one
/// exists, the task's own span otherwise.
pub(crate) fn current_ids() -> ([u8; TRACE_ID_BYTES * 2], [u8; SPAN_ID_BYTES * 2]) {
  task::with_current(|ctx| {
    let trace_hex = *ctx.trace_context().trace_id_hex();
    let span_hex = match ctx.current_span() {
      Some(span_id) => span_id_to_hex(&span_id),
      None => *ctx.trace_context().span_id_hex(),
    };
    (trace_hex, span_hex)
  })
}

/// Assemble one compact record into `buf`. Any `Err` means overflow and the
/// caller drops the record.
#[allow(clippy::too_many_arguments)]
pub(crate) fn format_compact(
  buf: &mut RecordBuffer<'_>,
  level: Level,
  msg: &str,
  trace_hex: &[u8; TRACE_ID_BYTES * 2],
  span_hex: &[u8; SPAN_ID_BYTES * 2],
  ts_millis: u64,
  thread_id: u32,
  fields: &[Field],
  redaction: &RedactionPolicy,
  config: &Config,
) -> Result<(), BufferFull> {
  let wide = config.enable_simd;

  buf.put_bytes(b"{\"level\":\"")?;
  buf.put_bytes(level.as_upper_str().as_bytes())?;
  buf.put_bytes(b"\",\"msg\":")?;
  json::put_json_str(buf, msg, wide)?;
  buf.put_bytes(b",\"trace\":\"")?;
  buf.put_bytes(trace_hex)?;
  buf.put_bytes(b"\",\"span\":\"")?;
  buf.put_bytes(span_hex)?;
  buf.put_bytes(b"\",\"ts\":")?;
  buf.put_u64(ts_millis)?;
  buf.put_bytes(b",\"tid\":")?;
  buf.put_u64(thread_id as u64)?;

  for field in field::truncate(fields, config.max_fields) {
    buf.put_byte(b',')?;
    json::put_json_str(buf, field.key(), wide)?;
    buf.put_byte(b':')?;
    put_compact_value(buf, field, redaction, wide)?;
  }

  buf.put_bytes(b"}\n")
}

pub(crate) fn put_compact_value(
  buf: &mut RecordBuffer<'_>,
  field: &Field,
  redaction: &RedactionPolicy,
  wide: bool,
) -> Result<(), BufferFull> {
  let value = field.value();
  if redaction.is_redacted(field.key()) {
    let hint = match value {
      FieldValue::Redacted { hint, .. } => hint,
      _ => None,
    };
    return put_redacted_sentinel(buf, value.redact_tag(), hint, wide);
  }
  match value {
    FieldValue::Str(s) => json::put_json_str(buf, s, wide),
    FieldValue::I64(v) => buf.put_i64(v),
    FieldValue::U64(v) => buf.put_u64(v),
    FieldValue::F64(v) => buf.put_f64_5(v),
    FieldValue::Bool(true) => buf.put_bytes(b"true"),
    FieldValue::Bool(false) => buf.put_bytes(b"false"),
    FieldValue::Null => buf.put_bytes(b"null"),
    FieldValue::Redacted { tag, hint } => put_redacted_sentinel(buf, tag, hint, wide),
  }
}

/// `"[REDACTED:<tag>]"` or `"[REDACTED:<tag>:<hint>]"`. The original value
/// bytes never reach the buffer.
fn put_redacted_sentinel(
  buf: &mut RecordBuffer<'_>,
  tag: RedactTag,
  hint: Option<&str>,
  wide: bool,
) -> Result<(), BufferFull> {
  buf.put_bytes(b"\"[REDACTED:")?;
  buf.put_bytes(tag.as_str().as_bytes())?;
  if let Some(hint) = hint {
    buf.put_byte(b':')?;
    json::escape_into(hint.as_bytes(), buf, wide)?;
  }
  buf.put_bytes(b"]\"")
}
