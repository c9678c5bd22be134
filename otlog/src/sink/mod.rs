
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Byte sink contract: append-only, best-effort. The logger issues one
/// `write` per record (sync) or per drained batch (async) and swallows
/// errors; sinks must not panic.
///
/// Any `std::io::Write + Send` type is a sink via the blanket impl, which
/// maps the contract onto `write_all` so a record is never split.
pub trait Sink: Send + 'static {
  fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl<W: Write + Send + 'static> Sink for W {
  fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
    Write::write_all(self, bytes)?;
    Ok(bytes.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Write::flush(self)
  }
}

/// Clonable in-memory sink. One clone goes into the logger, the others keep
/// observing what was written, including how many writes it took (what the
/// atomicity tests assert on).
#[derive(Debug, Clone, Default)]
pub struct SharedSink {
  data: Arc<Mutex<Vec<u8>>>,
  writes: Arc<AtomicUsize>,
}

impl SharedSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contents(&self) -> Vec<u8> {
    match self.data.lock() {
      Ok(data) => data.clone(),
      Err(_) => Vec::new(),
    }
  }

  pub fn contents_utf8(&self) -> String {
    String::from_utf8_lossy(&self.contents()).into_owned()
  }

  /// Completed `\n`-terminated lines seen so far.
  pub fn lines(&self) -> Vec<String> {
    self
      .contents_utf8()
      .split_terminator('\n')
      .map(str::to_owned)
      .collect()
  }

  /// Number of `write` calls the sink has received.
  pub fn write_count(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  pub fn clear(&self) {
    if let Ok(mut data) = self.data.lock() {
      data.clear();
    }
    self.writes.store(0, Ordering::SeqCst);
  }
}

impl Write for SharedSink {
  fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
    self.writes.fetch_add(1, Ordering::SeqCst);
    match self.data.lock() {
      Ok(mut data) => {
        data.extend_from_slice(bytes);
        Ok(bytes.len())
      },
      Err(_) => Err(io::Error::new(io::ErrorKind::Other, "sink poisoned")),
    }
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}
