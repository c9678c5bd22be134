use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use otlog::{fields, BackpressurePolicy, Config, Logger};

fn configure_criterion() -> Criterion {
  Criterion::default()
    .sample_size(30)
    .measurement_time(Duration::from_secs(5))
    .warm_up_time(Duration::from_secs(2))
    .noise_threshold(0.05)
}

/// Swallows everything; the numbers measure the pipeline, not the disk.
struct NullSink;

impl std::io::Write for NullSink {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

fn async_config(policy: BackpressurePolicy) -> Config {
  Config::new()
    .with_async_mode(true)
    .with_async_queue_size(8192)
    .with_batch_size(256)
    .with_backpressure(policy)
    .with_flush_interval(Duration::from_millis(1))
}

fn bench_async_enqueue(c: &mut Criterion) {
  let mut group = c.benchmark_group("async_enqueue");
  group.throughput(Throughput::Elements(1));

  for (name, policy) in [
    ("drop", BackpressurePolicy::Drop),
    ("block", BackpressurePolicy::Block),
    ("sample", BackpressurePolicy::Sample),
  ] {
    group.bench_function(BenchmarkId::from_parameter(name), |b| {
      let logger = Logger::new(async_config(policy), NullSink).unwrap();
      b.iter(|| {
        logger.info(
          "async benchmark message",
          &fields!["request_id" => 918273645u64, "hit" => true],
        )
      });
      logger.shutdown();
    });
  }
  group.finish();
}

fn bench_sync_vs_async(c: &mut Criterion) {
  let mut group = c.benchmark_group("sync_vs_async");
  group.throughput(Throughput::Elements(1));

  let sync_logger = Logger::new(Config::new(), NullSink).unwrap();
  group.bench_function("sync", |b| {
    b.iter(|| sync_logger.info("comparison message", &fields!["n" => 7u64]));
  });

  let async_logger = Logger::new(async_config(BackpressurePolicy::Drop), NullSink).unwrap();
  group.bench_function("async", |b| {
    b.iter(|| async_logger.info("comparison message", &fields!["n" => 7u64]));
  });
  async_logger.shutdown();

  group.finish();
}

criterion_group! {
  name = benches;
  config = configure_criterion();
  targets = bench_async_enqueue, bench_sync_vs_async
}
criterion_main!(benches);
