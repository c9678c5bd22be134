//! # Async Pipeline Module
//!
//! The asynchronous write path. Records are formatted on the caller's
//! thread (keeping per-thread state like thread ids and timestamps local)
//! and enqueued as pre-formatted [`Entry`] slots; a dedicated drainer thread
//! wakes on a fixed tick, pops a batch in FIFO order, concatenates it, and
//! issues a single sink write.
//!
//! The bounded queue has two internal shapes, one per backpressure family:
//! a lock-free ring (`crossbeam_queue::ArrayQueue`) when the policy is
//! `Drop`, where push never blocks and never takes a lock, and a guarded
//! deque with a condvar for `Block` and `Sample`, which need waiting and
//! eviction respectively.
//!
//! Lifecycle is init → running → stopping → stopped. `shutdown` flips the
//! stop flag (blocked producers observe it and bail), asks the drainer to
//! do a final synchronous drain, and joins it. There are no transitions
//! back.


use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use crossbeam_queue::ArrayQueue;
use serde::Serialize;

use crate::config::{BackpressurePolicy, Config};
use crate::error::Error;
use crate::level::Level;
use crate::sink::Sink;
use crate::utils;

/// Fixed per-entry slot size. Records longer than this are dropped before
/// they reach the queue.
pub const MAX_ENTRY_BYTES: usize = 2048;

/// How long a blocked producer waits between checks of the stop flag.
const BLOCK_RECHECK: Duration = Duration::from_millis(10);

/// A pre-formatted record occupying one queue slot.
///
/// Carries the serialized bytes plus its level (for the sample policy) and
/// its enqueue timestamp (for observability downstream).
#[derive(Clone)]
pub struct Entry {
  data: [u8; MAX_ENTRY_BYTES],
  len: u16,
  timestamp_ns: u64,
  level: Level,
}

impl Entry {
  /// `None` when `bytes` is empty or exceeds the slot size.
  pub fn new(bytes: &[u8], level: Level, timestamp_ns: u64) -> Option<Self> {
    if bytes.is_empty() || bytes.len() > MAX_ENTRY_BYTES {
      return None;
    }
    let mut data = [0u8; MAX_ENTRY_BYTES];
    data[..bytes.len()].copy_from_slice(bytes);
    Some(Self {
      data,
      len: bytes.len() as u16,
      timestamp_ns,
      level,
    })
  }

  #[inline]
  pub fn as_slice(&self) -> &[u8] {
    &self.data[..self.len as usize]
  }

  #[inline]
  pub fn level(&self) -> Level {
    self.level
  }

  #[inline]
  pub fn timestamp_ns(&self) -> u64 {
    self.timestamp_ns
  }
}

impl std::fmt::Debug for Entry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Entry")
      .field("len", &self.len)
      .field("level", &self.level)
      .field("timestamp_ns", &self.timestamp_ns)
      .finish()
  }
}

/// Why a push did not publish an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
  /// Rejected by the backpressure policy; counted in `logs_dropped`.
  Rejected,
  /// The pipeline is stopping; nothing is published.
  ShutDown,
}

enum QueueInner {
  Ring(ArrayQueue<Entry>),
  Guarded {
    deque: Mutex<VecDeque<Entry>>,
    not_full: Condvar,
  },
}

/// Bounded FIFO of pre-formatted entries with a construction-time
/// backpressure policy.
pub struct EntryQueue {
  capacity: usize,
  policy: BackpressurePolicy,
  inner: QueueInner,
  should_stop: AtomicBool,
}

impl EntryQueue {
  pub fn new(capacity: usize, policy: BackpressurePolicy) -> Self {
    debug_assert!(capacity > 0, "queue capacity must be > 0");
    let capacity = capacity.max(1);
    let inner = match policy {
      BackpressurePolicy::Drop => QueueInner::Ring(ArrayQueue::new(capacity)),
      BackpressurePolicy::Block | BackpressurePolicy::Sample => QueueInner::Guarded {
        deque: Mutex::new(VecDeque::with_capacity(capacity)),
        not_full: Condvar::new(),
      },
    };
    Self {
      capacity,
      policy,
      inner,
      should_stop: AtomicBool::new(false),
    }
  }

  /// Publish an entry per the active policy. `Ok(Some(_))` carries an entry
  /// the `Sample` policy evicted to make room. Only the `Block` policy ever
  /// suspends, and a blocked producer returns promptly once shutdown
  /// begins.
  pub fn push(&self, entry: Entry) -> Result<Option<Entry>, PushError> {
    if self.should_stop.load(Ordering::Acquire) {
      return Err(PushError::ShutDown);
    }
    match &self.inner {
      QueueInner::Ring(queue) => queue
        .push(entry)
        .map(|()| None)
        .map_err(|_| PushError::Rejected),
      QueueInner::Guarded { deque, not_full } => {
        let mut queue = deque.lock().map_err(|_| PushError::ShutDown)?;
        match self.policy {
          BackpressurePolicy::Block => {
            while queue.len() >= self.capacity {
              if self.should_stop.load(Ordering::Acquire) {
                return Err(PushError::ShutDown);
              }
              let (guard, _timeout) = not_full
                .wait_timeout(queue, BLOCK_RECHECK)
                .map_err(|_| PushError::ShutDown)?;
              queue = guard;
            }
            queue.push_back(entry);
            Ok(None)
          },
          BackpressurePolicy::Sample => {
            if queue.len() < self.capacity {
              queue.push_back(entry);
              return Ok(None);
            }
            if entry.level() < Level::Error {
              return Err(PushError::Rejected);
            }
            // Error and above earn a slot by evicting the oldest
            // below-Error entry.
            match queue.iter().position(|e| e.level() < Level::Error) {
              Some(index) => {
                let evicted = queue.remove(index);
                queue.push_back(entry);
                Ok(evicted)
              },
              None => Err(PushError::Rejected),
            }
          },
          BackpressurePolicy::Drop => Err(PushError::Rejected),
        }
      },
    }
  }

  /// Remove up to `max` entries in FIFO order, appending them to `out`.
  /// Wakes any blocked producers when slots free up.
  pub fn pop_batch(&self, max: usize, out: &mut Vec<Entry>) -> usize {
    match &self.inner {
      QueueInner::Ring(queue) => {
        let mut popped = 0;
        while popped < max {
          match queue.pop() {
            Some(entry) => {
              out.push(entry);
              popped += 1;
            },
            None => break,
          }
        }
        popped
      },
      QueueInner::Guarded { deque, not_full } => {
        let mut queue = match deque.lock() {
          Ok(guard) => guard,
          Err(_) => return 0,
        };
        let popped = max.min(queue.len());
        for _ in 0..popped {
          if let Some(entry) = queue.pop_front() {
            out.push(entry);
          }
        }
        if popped > 0 {
          not_full.notify_all();
        }
        popped
      },
    }
  }

  pub fn len(&self) -> usize {
    match &self.inner {
      QueueInner::Ring(queue) => queue.len(),
      QueueInner::Guarded { deque, .. } => deque.lock().map(|q| q.len()).unwrap_or(0),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  #[inline]
  pub fn policy(&self) -> BackpressurePolicy {
    self.policy
  }

  /// Flip the stop flag and wake blocked producers so they observe it.
  pub fn begin_shutdown(&self) {
    self.should_stop.store(true, Ordering::Release);
    if let QueueInner::Guarded { deque, not_full } = &self.inner {
      let _guard = deque.lock();
      not_full.notify_all();
    }
  }

  pub fn is_shutting_down(&self) -> bool {
    self.should_stop.load(Ordering::Acquire)
  }
}

/// Pipeline counters. Monotonically nondecreasing except the depth gauge;
/// all relaxed atomics, never contended on the hot path.
#[derive(Debug, Default)]
pub struct Metrics {
  pub logs_written: AtomicU64,
  pub logs_dropped: AtomicU64,
  pub flush_count: AtomicU64,
  pub queue_depth: AtomicUsize,
}

impl Metrics {
  #[inline]
  pub fn record_written(&self, count: u64) {
    self.logs_written.fetch_add(count, Ordering::Relaxed);
  }

  #[inline]
  pub fn record_dropped(&self) {
    self.logs_dropped.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  pub fn record_flush(&self) {
    self.flush_count.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  pub fn set_queue_depth(&self, depth: usize) {
    self.queue_depth.store(depth, Ordering::Relaxed);
  }

  pub fn snapshot(&self) -> MetricsSnapshot {
    MetricsSnapshot {
      logs_written: self.logs_written.load(Ordering::Relaxed),
      logs_dropped: self.logs_dropped.load(Ordering::Relaxed),
      flush_count: self.flush_count.load(Ordering::Relaxed),
      queue_depth: self.queue_depth.load(Ordering::Relaxed),
    }
  }
}

/// Point-in-time copy of the pipeline counters, serializable for health
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
  pub logs_written: u64,
  pub logs_dropped: u64,
  pub flush_count: u64,
  pub queue_depth: usize,
}

enum Control {
  Flush(Sender<()>),
  Stop,
}

struct PipelineShared<S: Sink> {
  queue: EntryQueue,
  metrics: Metrics,
  sink: Mutex<S>,
  batch_size: usize,
}

impl<S: Sink> PipelineShared<S> {
  /// Pop one batch, concatenate, single write. Returns how many entries
  /// were drained.
  fn drain_batch(&self, batch: &mut Vec<Entry>, flush_buf: &mut Vec<u8>) -> usize {
    batch.clear();
    let drained = self.queue.pop_batch(self.batch_size, batch);
    self.metrics.set_queue_depth(self.queue.len());
    if drained == 0 {
      return 0;
    }
    flush_buf.clear();
    for entry in batch.iter() {
      flush_buf.extend_from_slice(entry.as_slice());
    }
    if let Ok(mut sink) = self.sink.lock() {
      // Best effort: write failures are swallowed.
      let _ = sink.write(flush_buf);
    }
    self.metrics.record_flush();
    self.metrics.record_written(drained as u64);
    drained
  }

  fn drain_all(&self, batch: &mut Vec<Entry>, flush_buf: &mut Vec<u8>) {
    while self.drain_batch(batch, flush_buf) > 0 {}
  }
}

/// Handle to the async write path: a bounded entry queue plus (in managed
/// mode) the drainer thread that owns the tick loop.
pub struct AsyncPipeline<S: Sink> {
  shared: Arc<PipelineShared<S>>,
  control_tx: Option<Sender<Control>>,
  drainer: Option<JoinHandle<()>>,
}

impl<S: Sink> AsyncPipeline<S> {
  /// Managed mode: spawn the drainer thread. Thread-spawn failure is the
  /// one setup error this path can surface.
  pub fn spawn(sink: S, config: &Config) -> Result<Self, Error> {
    let shared = Arc::new(PipelineShared {
      queue: EntryQueue::new(config.async_queue_size, config.backpressure),
      metrics: Metrics::default(),
      sink: Mutex::new(sink),
      batch_size: config.batch_size,
    });

    let (control_tx, control_rx) = bounded::<Control>(4);
    let ticker = tick(config.flush_interval);
    let drainer_shared = Arc::clone(&shared);
    let handle = std::thread::Builder::new()
      .name("otlog-drain".into())
      .spawn(move || drain_loop(drainer_shared, ticker, control_rx))
      .map_err(Error::Io)?;

    Ok(Self {
      shared,
      control_tx: Some(control_tx),
      drainer: Some(handle),
    })
  }

  /// Borrowed-loop mode: no thread is spawned; the caller drives
  /// [`AsyncPipeline::drain_once`] from its own scheduler.
  pub fn with_manual_drain(sink: S, config: &Config) -> Self {
    Self {
      shared: Arc::new(PipelineShared {
        queue: EntryQueue::new(config.async_queue_size, config.backpressure),
        metrics: Metrics::default(),
        sink: Mutex::new(sink),
        batch_size: config.batch_size,
      }),
      control_tx: None,
      drainer: None,
    }
  }

  /// Queue a pre-formatted record. Never fails; rejected or oversized
  /// records are counted in `logs_dropped`.
  pub fn enqueue(&self, bytes: &[u8], level: Level) {
    let Some(entry) = Entry::new(bytes, level, utils::now_nanos()) else {
      self.shared.metrics.record_dropped();
      return;
    };
    match self.shared.queue.push(entry) {
      Ok(evicted) => {
        // an eviction is a dropped record too
        if evicted.is_some() {
          self.shared.metrics.record_dropped();
        }
        self.shared.metrics.set_queue_depth(self.shared.queue.len());
      },
      Err(_) => self.shared.metrics.record_dropped(),
    }
  }

  /// Drain one batch inline (borrowed-loop drive). Also usable in managed
  /// mode, where it contends only on the sink mutex.
  pub fn drain_once(&self) -> usize {
    let mut batch = Vec::with_capacity(self.shared.batch_size);
    let mut flush_buf = Vec::with_capacity(self.shared.batch_size * MAX_ENTRY_BYTES);
    self.shared.drain_batch(&mut batch, &mut flush_buf)
  }

  /// Drain everything currently queued. In managed mode this rendezvouses
  /// with the drainer thread; in manual mode it drains inline.
  pub fn flush_pending(&self) {
    if let Some(control_tx) = &self.control_tx {
      let (ack_tx, ack_rx) = bounded::<()>(0);
      if control_tx.send(Control::Flush(ack_tx)).is_ok() {
        let _ = ack_rx.recv_timeout(Duration::from_secs(5));
        return;
      }
    }
    let mut batch = Vec::with_capacity(self.shared.batch_size);
    let mut flush_buf = Vec::with_capacity(self.shared.batch_size * MAX_ENTRY_BYTES);
    self.shared.drain_all(&mut batch, &mut flush_buf);
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  pub fn queue_len(&self) -> usize {
    self.shared.queue.len()
  }

  /// Stop flag → final synchronous drain → join. Idempotent via `Drop`.
  pub fn shutdown(mut self) {
    self.stop_and_join();
  }

  fn stop_and_join(&mut self) {
    self.shared.queue.begin_shutdown();
    if let Some(control_tx) = self.control_tx.take() {
      let _ = control_tx.send(Control::Stop);
    }
    if let Some(handle) = self.drainer.take() {
      let _ = handle.join();
    } else {
      // Manual mode: the final drain happens here.
      let mut batch = Vec::with_capacity(self.shared.batch_size);
      let mut flush_buf = Vec::with_capacity(self.shared.batch_size * MAX_ENTRY_BYTES);
      self.shared.drain_all(&mut batch, &mut flush_buf);
    }
  }
}

impl<S: Sink> Drop for AsyncPipeline<S> {
  fn drop(&mut self) {
    self.stop_and_join();
  }
}

/// The drainer loop: tick-driven batch drains, with flush and stop requests
/// multiplexed over a control channel. Runs until `Stop` (or the control
/// channel disconnecting), then performs the final drain.
fn drain_loop<S: Sink>(
  shared: Arc<PipelineShared<S>>,
  ticker: Receiver<std::time::Instant>,
  control: Receiver<Control>,
) {
  let mut batch = Vec::with_capacity(shared.batch_size);
  let mut flush_buf = Vec::with_capacity(shared.batch_size * MAX_ENTRY_BYTES);

  loop {
    select! {
      recv(ticker) -> _ => {
        shared.drain_batch(&mut batch, &mut flush_buf);
      },
      recv(control) -> message => {
        match message {
          Ok(Control::Flush(ack)) => {
            shared.drain_all(&mut batch, &mut flush_buf);
            let _ = ack.send(());
          },
          Ok(Control::Stop) | Err(_) => {
            shared.drain_all(&mut batch, &mut flush_buf);
            break;
          },
        }
      },
    }
  }
}
