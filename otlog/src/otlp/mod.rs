//! OTLP/JSON batch serializer: wraps a batch of [`LogRecord`]s in the
//! `resourceLogs` / `scopeLogs` / `logRecords` envelope expected by an OTLP
//! log ingest endpoint. The simplified contract of this core is that one
//! batch shares a single resource and a single scope.
//!
//! This is an export-path serializer, not the hot path; it writes into a
//! growable buffer.

mod __test__;

use smallvec::SmallVec;

use crate::json::append_json_str;
use crate::otel::{AttrValue, Body, InstrumentationScope, LogRecord, Resource};

/// Serialize a batch into a fresh buffer.
pub fn serialize_batch(
  resource: &Resource,
  scope: &InstrumentationScope,
  records: &[LogRecord],
) -> Vec<u8> {
  // 256 bytes of envelope per record is a comfortable starting estimate.
  let mut out = Vec::with_capacity(512 + records.len() * 256);
  serialize_batch_into(resource, scope, records, &mut out);
  out
}

/// Serialize a batch, appending to `out`.
pub fn serialize_batch_into(
  resource: &Resource,
  scope: &InstrumentationScope,
  records: &[LogRecord],
  out: &mut Vec<u8>,
) {
  out.extend_from_slice(b"{\"resourceLogs\":[{\"resource\":{\"attributes\":");
  out.extend_from_slice(&resource.attributes_json());
  out.extend_from_slice(b"},\"scopeLogs\":[{\"scope\":");
  out.extend_from_slice(&scope.scope_json());
  if let Some(schema_url) = &scope.schema_url {
    out.extend_from_slice(b",\"schemaUrl\":");
    append_json_str(out, schema_url);
  }
  out.extend_from_slice(b",\"logRecords\":[");
  for (i, record) in records.iter().enumerate() {
    if i > 0 {
      out.push(b',');
    }
    serialize_record(record, out);
  }
  out.extend_from_slice(b"]}]}]}");
}

fn serialize_record(record: &LogRecord, out: &mut Vec<u8>) {
  let mut scratch = itoa::Buffer::new();

  out.extend_from_slice(b"{\"timeUnixNano\":\"");
  out.extend_from_slice(scratch.format(record.timestamp_ns).as_bytes());
  out.extend_from_slice(b"\",\"observedTimeUnixNano\":\"");
  out.extend_from_slice(scratch.format(record.observed_timestamp_ns).as_bytes());
  out.extend_from_slice(b"\",\"severityNumber\":");
  out.extend_from_slice(scratch.format(record.severity_number).as_bytes());
  if let Some(text) = record.severity_text {
    out.extend_from_slice(b",\"severityText\":");
    append_json_str(out, text);
  }
  out.extend_from_slice(b",\"body\":");
  serialize_body(&record.body, out);

  out.extend_from_slice(b",\"attributes\":[");
  for (i, (key, value)) in record.attributes.iter().enumerate() {
    if i > 0 {
      out.push(b',');
    }
    out.extend_from_slice(b"{\"key\":");
    append_json_str(out, key);
    out.extend_from_slice(b",\"value\":");
    serialize_attr_value(value, out);
    out.push(b'}');
  }
  out.push(b']');

  // Emitted unconditionally: a consumer can rely on the key being present.
  out.extend_from_slice(b",\"droppedAttributesCount\":0");

  if let Some(trace_id_hex) = &record.trace_id_hex {
    out.extend_from_slice(b",\"traceId\":\"");
    out.extend_from_slice(trace_id_hex);
    out.push(b'"');
  }
  if let Some(span_id_hex) = &record.span_id_hex {
    out.extend_from_slice(b",\"spanId\":\"");
    out.extend_from_slice(span_id_hex);
    out.push(b'"');
  }
  if let Some(flags) = record.flags {
    out.extend_from_slice(b",\"flags\":");
    out.extend_from_slice(scratch.format(flags).as_bytes());
  }
  out.push(b'}');
}

fn serialize_body(body: &Body, out: &mut Vec<u8>) {
  let mut scratch = itoa::Buffer::new();
  match body {
    Body::Str(s) => {
      out.extend_from_slice(b"{\"stringValue\":");
      append_json_str(out, s);
      out.push(b'}');
    },
    Body::I64(v) => {
      out.extend_from_slice(b"{\"intValue\":\"");
      out.extend_from_slice(scratch.format(*v).as_bytes());
      out.extend_from_slice(b"\"}");
    },
    Body::F64(v) => {
      out.extend_from_slice(b"{\"doubleValue\":");
      append_float(*v, out);
      out.push(b'}');
    },
    Body::Bool(true) => out.extend_from_slice(b"{\"boolValue\":true}"),
    Body::Bool(false) => out.extend_from_slice(b"{\"boolValue\":false}"),
  }
}

fn serialize_attr_value(value: &AttrValue, out: &mut Vec<u8>) {
  let mut scratch = itoa::Buffer::new();
  match value {
    AttrValue::Str(s) => {
      out.extend_from_slice(b"{\"stringValue\":");
      append_json_str(out, s);
      out.push(b'}');
    },
    AttrValue::I64(v) => {
      out.extend_from_slice(b"{\"intValue\":\"");
      out.extend_from_slice(scratch.format(*v).as_bytes());
      out.extend_from_slice(b"\"}");
    },
    AttrValue::U64(v) => {
      out.extend_from_slice(b"{\"intValue\":\"");
      out.extend_from_slice(scratch.format(*v).as_bytes());
      out.extend_from_slice(b"\"}");
    },
    AttrValue::F64(v) => {
      out.extend_from_slice(b"{\"doubleValue\":");
      append_float(*v, out);
      out.push(b'}');
    },
    AttrValue::Bool(true) => out.extend_from_slice(b"{\"boolValue\":true}"),
    AttrValue::Bool(false) => out.extend_from_slice(b"{\"boolValue\":false}"),
    AttrValue::Null | AttrValue::Redacted => {
      out.extend_from_slice(b"{\"stringValue\":\"[REDACTED]\"}");
    },
  }
}

/// Fixed five fractional digits, matching the line formatters.
fn append_float(value: f64, out: &mut Vec<u8>) {
  use std::fmt::Write;
  let mut rendered: SmallVec<[u8; 32]> = SmallVec::new();
  struct SmallVecWriter<'a>(&'a mut SmallVec<[u8; 32]>);
  impl Write for SmallVecWriter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
      self.0.extend_from_slice(s.as_bytes());
      Ok(())
    }
  }
  if write!(SmallVecWriter(&mut rendered), "{value:.5}").is_ok() {
    out.extend_from_slice(&rendered);
  } else {
    out.push(b'0');
  }
}
