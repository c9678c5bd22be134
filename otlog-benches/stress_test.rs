use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use otlog::{fields, BackpressurePolicy, Config, Level, Logger};

/// Swallows everything so the numbers measure the pipeline, not the disk.
struct NullSink;

impl std::io::Write for NullSink {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

fn main() {
  println!("otlog stress test");
  println!("=================");
  println!();

  sync_throughput();
  async_throughput(BackpressurePolicy::Drop);
  async_throughput(BackpressurePolicy::Block);
  multithreaded_sync();

  println!("done");
}

fn sync_throughput() {
  println!("sync logger, single thread:");
  let logger = Logger::new(Config::new(), NullSink).unwrap();

  let total = 500_000u64;
  let start = Instant::now();
  for i in 0..total {
    logger.info(
      "stress test message",
      &fields!["i" => i, "ok" => true, "ratio" => 0.25],
    );
  }
  let elapsed = start.elapsed();
  println!(
    "  {} records in {:?} ({:.0} records/sec)",
    total,
    elapsed,
    total as f64 / elapsed.as_secs_f64()
  );
  println!();
}

fn async_throughput(policy: BackpressurePolicy) {
  println!("async logger, {policy:?} policy, single thread:");
  let config = Config::new()
    .with_async_mode(true)
    .with_async_queue_size(65_536)
    .with_batch_size(512)
    .with_backpressure(policy)
    .with_flush_interval(Duration::from_millis(1));
  let logger = Logger::new(config, NullSink).unwrap();

  let total = 500_000u64;
  let start = Instant::now();
  for i in 0..total {
    logger.log(Level::Info, "stress test message", &fields!["i" => i]);
  }
  let enqueue_elapsed = start.elapsed();
  logger.flush();
  let drained_elapsed = start.elapsed();

  let metrics = logger.metrics().unwrap();
  println!(
    "  enqueue: {} records in {:?} ({:.0} records/sec)",
    total,
    enqueue_elapsed,
    total as f64 / enqueue_elapsed.as_secs_f64()
  );
  println!(
    "  drained after {:?}: written={} dropped={} flushes={}",
    drained_elapsed, metrics.logs_written, metrics.logs_dropped, metrics.flush_count
  );
  logger.shutdown();
  println!();
}

fn multithreaded_sync() {
  println!("sync logger, 8 producer threads:");
  let logger = Arc::new(Logger::new(Config::new(), NullSink).unwrap());

  let threads = 8u64;
  let per_thread = 100_000u64;
  let start = Instant::now();
  let handles: Vec<_> = (0..threads)
    .map(|t| {
      let logger = Arc::clone(&logger);
      thread::spawn(move || {
        for i in 0..per_thread {
          logger.info("contended message", &fields!["t" => t, "i" => i]);
        }
      })
    })
    .collect();
  for handle in handles {
    handle.join().unwrap();
  }
  let elapsed = start.elapsed();
  let total = threads * per_thread;
  println!(
    "  {} records in {:?} ({:.0} records/sec aggregate)",
    total,
    elapsed,
    total as f64 / elapsed.as_secs_f64()
  );
  println!();
}
