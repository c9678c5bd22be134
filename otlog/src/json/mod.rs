//! # JSON Module
//!
//! Allocation-free JSON building blocks shared by every formatter: a fixed
//! [`RecordBuffer`] cursor over caller-provided storage, base-10 and
//! fixed-point numeric encoders, and the string escaper.
//!
//! The escaper exists twice. [`escape_scalar`] scans byte-by-byte but emits
//! safe bytes in whole runs. [`escape_wide`] walks the input in 8-byte words
//! and uses SWAR bit tricks to answer "does this word contain a quote,
//! backslash, or control byte" in a handful of ALU ops; clean words are
//! copied whole and dirty words fall back to the scalar path. Both produce
//! byte-identical output for every input: the wide detector may report
//! false positives near a word boundary (they only cost a scalar pass),
//! never false negatives.

mod __test__;

use std::fmt;

/// The record did not fit its fixed buffer. The caller drops the whole
/// record; partial emission is never observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFull;

/// Append-only cursor over a fixed byte buffer.
///
/// Every `put_*` either writes fully or returns [`BufferFull`]; the caller
/// treats any failure as "drop the record".
pub struct RecordBuffer<'a> {
  buf: &'a mut [u8],
  len: usize,
}

impl<'a> RecordBuffer<'a> {
  #[inline]
  pub fn new(buf: &'a mut [u8]) -> Self {
    Self { buf, len: 0 }
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  #[inline]
  pub fn remaining(&self) -> usize {
    self.buf.len() - self.len
  }

  #[inline]
  pub fn as_slice(&self) -> &[u8] {
    &self.buf[..self.len]
  }

  #[inline]
  pub fn clear(&mut self) {
    self.len = 0;
  }

  #[inline]
  pub fn put_byte(&mut self, byte: u8) -> Result<(), BufferFull> {
    if self.len == self.buf.len() {
      return Err(BufferFull);
    }
    self.buf[self.len] = byte;
    self.len += 1;
    Ok(())
  }

  #[inline]
  pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferFull> {
    let end = self.len.checked_add(bytes.len()).ok_or(BufferFull)?;
    if end > self.buf.len() {
      return Err(BufferFull);
    }
    self.buf[self.len..end].copy_from_slice(bytes);
    self.len = end;
    Ok(())
  }

  /// Base-10 unsigned integer.
  #[inline]
  pub fn put_u64(&mut self, value: u64) -> Result<(), BufferFull> {
    let mut scratch = itoa::Buffer::new();
    self.put_bytes(scratch.format(value).as_bytes())
  }

  /// Base-10 signed integer.
  #[inline]
  pub fn put_i64(&mut self, value: i64) -> Result<(), BufferFull> {
    let mut scratch = itoa::Buffer::new();
    self.put_bytes(scratch.format(value).as_bytes())
  }

  /// Fixed-point float with exactly five fractional digits (`3.14` →
  /// `3.14000`). Non-finite values fail so the record is dropped rather than
  /// emitting invalid JSON.
  pub fn put_f64_5(&mut self, value: f64) -> Result<(), BufferFull> {
    debug_assert!(value.is_finite(), "float field must be finite");
    if !value.is_finite() {
      return Err(BufferFull);
    }
    use std::fmt::Write;
    let mut adapter = FmtAdapter { buf: self };
    write!(adapter, "{value:.5}").map_err(|_| BufferFull)
  }
}

/// `core::fmt` shim so fixed-precision float formatting lands directly in
/// the record buffer without an intermediate string.
struct FmtAdapter<'a, 'b> {
  buf: &'b mut RecordBuffer<'a>,
}

impl fmt::Write for FmtAdapter<'_, '_> {
  #[inline]
  fn write_str(&mut self, s: &str) -> fmt::Result {
    self.buf.put_bytes(s.as_bytes()).map_err(|_| fmt::Error)
  }
}

const HEX_LOWER: &[u8; 16] = b"0123456789abcdef";

/// The two-character escape for a byte, if it has one.
#[inline]
const fn short_escape(byte: u8) -> Option<&'static [u8; 2]> {
  match byte {
    b'"' => Some(b"\\\""),
    b'\\' => Some(b"\\\\"),
    b'\n' => Some(b"\\n"),
    b'\r' => Some(b"\\r"),
    b'\t' => Some(b"\\t"),
    0x08 => Some(b"\\b"),
    0x0C => Some(b"\\f"),
    _ => None,
  }
}

#[inline]
const fn needs_escape(byte: u8) -> bool {
  byte < 0x20 || byte == b'"' || byte == b'\\'
}

#[inline]
fn put_unicode_escape(out: &mut RecordBuffer<'_>, byte: u8) -> Result<(), BufferFull> {
  out.put_bytes(&[
    b'\\',
    b'u',
    b'0',
    b'0',
    HEX_LOWER[(byte >> 4) as usize],
    HEX_LOWER[(byte & 0x0F) as usize],
  ])
}

/// Scalar escape path: emit runs of safe bytes between escapes.
///
/// UTF-8 multibyte sequences have every byte >= 0x80 and pass through
/// verbatim inside a safe run.
pub fn escape_scalar(src: &[u8], out: &mut RecordBuffer<'_>) -> Result<(), BufferFull> {
  let mut run_start = 0;
  for (i, &byte) in src.iter().enumerate() {
    if !needs_escape(byte) {
      continue;
    }
    out.put_bytes(&src[run_start..i])?;
    match short_escape(byte) {
      Some(seq) => out.put_bytes(seq)?,
      None => put_unicode_escape(out, byte)?,
    }
    run_start = i + 1;
  }
  out.put_bytes(&src[run_start..])
}

const WORD_BYTES: usize = 8;
const ONES: u64 = 0x0101_0101_0101_0101;
const HIGHS: u64 = 0x8080_8080_8080_8080;

/// One reduction over an 8-byte word: true when any lane is `< 0x20`, `"`
/// or `\`. Borrow propagation across lanes can flag a clean neighbor of a
/// dirty lane (false positive, handled by the scalar fallback); a lane that
/// actually needs escaping is always flagged.
#[inline]
fn word_needs_escape(word: u64) -> bool {
  let ctl = word.wrapping_sub(ONES.wrapping_mul(0x20)) & !word & HIGHS;
  let q = word ^ ONES.wrapping_mul(b'"' as u64);
  let quote = q.wrapping_sub(ONES) & !q & HIGHS;
  let s = word ^ ONES.wrapping_mul(b'\\' as u64);
  let slash = s.wrapping_sub(ONES) & !s & HIGHS;
  (ctl | quote | slash) != 0
}

/// Wide escape path: 8-byte SWAR words, clean words copied whole, dirty
/// words routed through [`escape_scalar`], scalar tail.
pub fn escape_wide(src: &[u8], out: &mut RecordBuffer<'_>) -> Result<(), BufferFull> {
  let mut chunks = src.chunks_exact(WORD_BYTES);
  for chunk in &mut chunks {
    let mut word_bytes = [0u8; WORD_BYTES];
    word_bytes.copy_from_slice(chunk);
    if word_needs_escape(u64::from_le_bytes(word_bytes)) {
      escape_scalar(chunk, out)?;
    } else {
      out.put_bytes(chunk)?;
    }
  }
  escape_scalar(chunks.remainder(), out)
}

/// Escape with the path selected by the logger's SIMD toggle.
#[inline]
pub fn escape_into(src: &[u8], out: &mut RecordBuffer<'_>, wide: bool) -> Result<(), BufferFull> {
  if wide {
    escape_wide(src, out)
  } else {
    escape_scalar(src, out)
  }
}

/// Quoted, escaped JSON string.
#[inline]
pub fn put_json_str(out: &mut RecordBuffer<'_>, s: &str, wide: bool) -> Result<(), BufferFull> {
  out.put_byte(b'"')?;
  escape_into(s.as_bytes(), out, wide)?;
  out.put_byte(b'"')
}

/// Growable-buffer escape for construction-time rendering (cached resource
/// and scope JSON, the OTLP envelope). Not used on the log path.
pub fn escape_append(src: &[u8], out: &mut Vec<u8>) {
  let mut run_start = 0;
  for (i, &byte) in src.iter().enumerate() {
    if !needs_escape(byte) {
      continue;
    }
    out.extend_from_slice(&src[run_start..i]);
    match short_escape(byte) {
      Some(seq) => out.extend_from_slice(seq),
      None => out.extend_from_slice(&[
        b'\\',
        b'u',
        b'0',
        b'0',
        HEX_LOWER[(byte >> 4) as usize],
        HEX_LOWER[(byte & 0x0F) as usize],
      ]),
    }
    run_start = i + 1;
  }
  out.extend_from_slice(&src[run_start..]);
}

/// Quoted variant of [`escape_append`].
pub fn append_json_str(out: &mut Vec<u8>, s: &str) {
  out.push(b'"');
  escape_append(s.as_bytes(), out);
  out.push(b'"');
}
