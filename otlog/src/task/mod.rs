//! # Task Module
//!
//! Per-thread correlation state. Every thread owns at most one
//! [`TaskContext`], reachable through a thread-local slot; it carries the
//! thread's trace context and a bounded stack of active span ids. The stack
//! is a fixed array: pushing past 32 spans is an invariant violation, not
//! an allocation.
//!
//! Spans move new → active → ended: `Logger::span_start` builds an active
//! [`Span`] and pushes its id, `Logger::span_end` pops it (LIFO pairing is
//! on the caller) and records a non-negative duration.


use std::borrow::Cow;
use std::cell::RefCell;

use crate::error::Error;
use crate::trace_context::{TraceContext, SPAN_ID_BYTES};
use crate::utils;

/// Fixed span-stack depth. Deeper nesting fails the push.
pub const SPAN_STACK_CAPACITY: usize = 32;

pub type SpanId = [u8; SPAN_ID_BYTES];

/// Per-thread correlation context. Mutated only by the owning thread.
#[derive(Debug, Clone)]
pub struct TaskContext {
  trace_context: TraceContext,
  span_stack: [SpanId; SPAN_STACK_CAPACITY],
  depth: usize,
  task_id: u64,
  parent_task_id: Option<u64>,
}

impl TaskContext {
  pub fn new(trace_context: TraceContext) -> Self {
    Self {
      trace_context,
      span_stack: [[0u8; SPAN_ID_BYTES]; SPAN_STACK_CAPACITY],
      depth: 0,
      task_id: u64::from_be_bytes(*trace_context.span_id()),
      parent_task_id: None,
    }
  }

  /// Child task context: same trace id via child derivation, this task
  /// recorded as the parent.
  pub fn create_child_context(&self, sampled: bool) -> Self {
    let child_trace = self.trace_context.create_child(sampled);
    Self {
      task_id: u64::from_be_bytes(*child_trace.span_id()),
      parent_task_id: Some(self.task_id),
      trace_context: child_trace,
      span_stack: [[0u8; SPAN_ID_BYTES]; SPAN_STACK_CAPACITY],
      depth: 0,
    }
  }

  pub fn push_span(&mut self, span_id: SpanId) -> Result<(), Error> {
    if self.depth == SPAN_STACK_CAPACITY {
      return Err(Error::InvariantViolation("span stack overflow"));
    }
    self.span_stack[self.depth] = span_id;
    self.depth += 1;
    Ok(())
  }

  pub fn pop_span(&mut self) -> Option<SpanId> {
    if self.depth == 0 {
      return None;
    }
    self.depth -= 1;
    Some(self.span_stack[self.depth])
  }

  /// Top of the span stack without removing it.
  pub fn current_span(&self) -> Option<SpanId> {
    if self.depth == 0 {
      None
    } else {
      Some(self.span_stack[self.depth - 1])
    }
  }

  #[inline]
  pub fn depth(&self) -> usize {
    self.depth
  }

  #[inline]
  pub fn trace_context(&self) -> &TraceContext {
    &self.trace_context
  }

  #[inline]
  pub fn task_id(&self) -> u64 {
    self.task_id
  }

  #[inline]
  pub fn parent_task_id(&self) -> Option<u64> {
    self.parent_task_id
  }
}

thread_local! {
  static CURRENT: RefCell<Option<TaskContext>> = const { RefCell::new(None) };
}

/// Run `f` against this thread's task context, creating a sampled root
/// context on first use.
pub fn with_current<R>(f: impl FnOnce(&mut TaskContext) -> R) -> R {
  CURRENT.with(|slot| {
    let mut slot = slot.borrow_mut();
    let ctx = slot.get_or_insert_with(|| TaskContext::new(TraceContext::generate(true)));
    f(ctx)
  })
}

/// Install a context on this thread, returning the previous one.
pub fn set_current(ctx: TaskContext) -> Option<TaskContext> {
  CURRENT.with(|slot| slot.borrow_mut().replace(ctx))
}

/// Remove and return this thread's context.
pub fn take_current() -> Option<TaskContext> {
  CURRENT.with(|slot| slot.borrow_mut().take())
}

/// An active span. Created by `Logger::span_start`, consumed by
/// `Logger::span_end`.
#[derive(Debug, Clone)]
pub struct Span {
  trace_context: TraceContext,
  name: Cow<'static, str>,
  start_time_ns: u64,
  thread_id: u32,
  parent_span_id: Option<SpanId>,
  tracked: bool,
}

impl Span {
  pub(crate) fn begin(
    name: Cow<'static, str>,
    trace_context: TraceContext,
    parent_span_id: Option<SpanId>,
    tracked: bool,
  ) -> Self {
    debug_assert!(
      !name.is_empty() && name.len() <= 255,
      "span name must be 1..=255 bytes"
    );
    Self {
      trace_context,
      name,
      start_time_ns: utils::now_nanos(),
      thread_id: utils::current_thread_id_u32(),
      parent_span_id,
      tracked,
    }
  }

  /// False when the span stack was full at start; such a span is usable but
  /// must not pop the stack at end.
  #[inline]
  pub(crate) fn tracked(&self) -> bool {
    self.tracked
  }

  #[inline]
  pub fn name(&self) -> &str {
    &self.name
  }

  #[inline]
  pub fn trace_context(&self) -> &TraceContext {
    &self.trace_context
  }

  #[inline]
  pub fn start_time_ns(&self) -> u64 {
    self.start_time_ns
  }

  #[inline]
  pub fn thread_id(&self) -> u32 {
    self.thread_id
  }

  /// Numeric span id, big-endian projection of the id bytes.
  #[inline]
  pub fn id(&self) -> u64 {
    u64::from_be_bytes(*self.trace_context.span_id())
  }

  /// Numeric parent span id, when this span has a parent.
  #[inline]
  pub fn parent(&self) -> Option<u64> {
    self.parent_span_id.map(u64::from_be_bytes)
  }

  /// Numeric task id: the trace id's low 8 bytes.
  pub fn task(&self) -> u64 {
    let trace_id = self.trace_context.trace_id();
    let mut low = [0u8; 8];
    low.copy_from_slice(&trace_id[8..16]);
    u64::from_be_bytes(low)
  }

  #[inline]
  pub(crate) fn span_id(&self) -> SpanId {
    *self.trace_context.span_id()
  }
}
