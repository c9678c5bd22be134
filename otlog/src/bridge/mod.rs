//! Bridge from the `tracing` ecosystem: a `tracing_subscriber::Layer` that
//! forwards every `tracing` event into a [`Logger`], so applications
//! already instrumented with `tracing` macros emit through this pipeline
//! without touching call sites.
//!
//! The visitor pulls the `message` field as the record message and carries
//! scalar fields across; the event's target rides along as a `target`
//! field. String fields are owned for the duration of the call: this path
//! trades a couple of small allocations for drop-in compatibility.


use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{Event as TracingEvent, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::field::{Field, FieldValue};
use crate::level::Level;
use crate::logger::Logger;
use crate::sink::Sink;

/// Layer forwarding `tracing` events into a shared [`Logger`].
pub struct LoggerLayer<S: Sink> {
  logger: Arc<Logger<S>>,
}

impl<S: Sink> LoggerLayer<S> {
  pub fn new(logger: Arc<Logger<S>>) -> Self {
    Self { logger }
  }
}

impl<Sub, S> Layer<Sub> for LoggerLayer<S>
where
  Sub: Subscriber + for<'a> LookupSpan<'a>,
  S: Sink,
{
  fn on_event(&self, event: &TracingEvent<'_>, _ctx: Context<'_, Sub>) {
    let level = Level::from_tracing_level(event.metadata().level());
    if !self.logger.enabled(level) {
      return;
    }

    let mut visitor = EventVisitor::default();
    event.record(&mut visitor);
    let msg = visitor.message.as_deref().unwrap_or("");

    let mut fields: SmallVec<[Field; 8]> = SmallVec::new();
    fields.push(Field::str("target", event.metadata().target()));
    for (key, value) in &visitor.fields {
      fields.push(Field::new(
        key.as_str(),
        match value {
          BridgeValue::Str(s) => FieldValue::Str(s.as_str()),
          BridgeValue::I64(v) => FieldValue::I64(*v),
          BridgeValue::U64(v) => FieldValue::U64(*v),
          BridgeValue::F64(v) => FieldValue::F64(*v),
          BridgeValue::Bool(v) => FieldValue::Bool(*v),
        },
      ));
    }

    self.logger.log(level, msg, &fields);
  }
}

enum BridgeValue {
  Str(String),
  I64(i64),
  U64(u64),
  F64(f64),
  Bool(bool),
}

/// Visitor splitting the `message` field from the structured remainder.
#[derive(Default)]
struct EventVisitor {
  message: Option<String>,
  fields: SmallVec<[(String, BridgeValue); 8]>,
}

impl tracing::field::Visit for EventVisitor {
  fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
    if field.name() == "message" {
      self.message = Some(value.to_owned());
    } else {
      self
        .fields
        .push((field.name().to_owned(), BridgeValue::Str(value.to_owned())));
    }
  }

  fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
    self.fields.push((field.name().to_owned(), BridgeValue::I64(value)));
  }

  fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
    self.fields.push((field.name().to_owned(), BridgeValue::U64(value)));
  }

  fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
    self.fields.push((field.name().to_owned(), BridgeValue::F64(value)));
  }

  fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
    self.fields.push((field.name().to_owned(), BridgeValue::Bool(value)));
  }

  fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
    if field.name() == "message" {
      if self.message.is_none() {
        self.message = Some(format!("{value:?}"));
      }
    } else {
      self
        .fields
        .push((field.name().to_owned(), BridgeValue::Str(format!("{value:?}"))));
    }
  }
}
