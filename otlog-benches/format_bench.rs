use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use otlog::json::{escape_scalar, escape_wide, RecordBuffer};
use otlog::{fields, Config, Logger};

// Configure Criterion for stable numbers
fn configure_criterion() -> Criterion {
  Criterion::default()
    .sample_size(50)
    .measurement_time(Duration::from_secs(5))
    .warm_up_time(Duration::from_secs(2))
    .noise_threshold(0.05)
}

fn escape_inputs() -> Vec<(&'static str, Vec<u8>)> {
  let clean = "The quick brown fox jumps over the lazy dog. ".repeat(16);
  let sparse = "value=\"quoted\" path=C:\\temp\\x ".repeat(16);
  let dense: Vec<u8> = (0..512u32).map(|i| (i % 0x20) as u8).collect();
  vec![
    ("clean_ascii", clean.into_bytes()),
    ("sparse_escapes", sparse.into_bytes()),
    ("dense_controls", dense),
  ]
}

fn bench_escape(c: &mut Criterion) {
  let mut group = c.benchmark_group("escape");
  for (name, input) in escape_inputs() {
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_with_input(BenchmarkId::new("scalar", name), &input, |b, input| {
      let mut storage = vec![0u8; input.len() * 6 + 64];
      b.iter(|| {
        let mut buf = RecordBuffer::new(&mut storage);
        escape_scalar(input, &mut buf).unwrap();
        buf.len()
      });
    });

    group.bench_with_input(BenchmarkId::new("wide", name), &input, |b, input| {
      let mut storage = vec![0u8; input.len() * 6 + 64];
      b.iter(|| {
        let mut buf = RecordBuffer::new(&mut storage);
        escape_wide(input, &mut buf).unwrap();
        buf.len()
      });
    });
  }
  group.finish();
}

/// Swallows everything; isolates formatting cost from sink cost.
struct NullSink;

impl std::io::Write for NullSink {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

fn bench_sync_log(c: &mut Criterion) {
  let mut group = c.benchmark_group("sync_log");

  let logger = Logger::new(Config::new(), NullSink).unwrap();
  group.bench_function("no_fields", |b| {
    b.iter(|| logger.info("benchmark message with a realistic length", &[]));
  });

  group.bench_function("three_fields", |b| {
    b.iter(|| {
      logger.info(
        "benchmark message with a realistic length",
        &fields![
          "user_id" => 123456u64,
          "latency_ms" => 12.75,
          "cache_hit" => true,
        ],
      )
    });
  });

  group.bench_function("filtered_out", |b| {
    b.iter(|| logger.debug("never formatted", &[]));
  });

  group.finish();
}

criterion_group! {
  name = benches;
  config = configure_criterion();
  targets = bench_escape, bench_sync_log
}
criterion_main!(benches);
