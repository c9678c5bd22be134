//! W3C-style trace correlation: 128-bit trace ids, 64-bit span ids, a flags
//! byte, and cached lowercase-hex projections so formatters copy bytes
//! instead of re-encoding on every record.

mod __test__;

use rand::RngCore;

pub const TRACE_ID_BYTES: usize = 16;
pub const SPAN_ID_BYTES: usize = 8;

const HEX_LOWER: &[u8; 16] = b"0123456789abcdef";

/// The 8-bit trace flags field. Bit 0 is the sampled flag; the remaining
/// bits are reserved and stay zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TraceFlags(pub u8);

impl TraceFlags {
  pub const SAMPLED: u8 = 0x01;

  #[inline]
  pub const fn new(sampled: bool) -> Self {
    Self(if sampled { Self::SAMPLED } else { 0 })
  }

  #[inline]
  pub const fn sampled(self) -> bool {
    self.0 & Self::SAMPLED != 0
  }
}

/// Trace correlation state attached to records.
///
/// Invariants: `trace_id` and `span_id` are never all-zero; the hex caches
/// are always the lowercase-hex projection of the id bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceContext {
  version: u8,
  trace_id: [u8; TRACE_ID_BYTES],
  span_id: [u8; SPAN_ID_BYTES],
  flags: TraceFlags,
  trace_id_hex: [u8; TRACE_ID_BYTES * 2],
  span_id_hex: [u8; SPAN_ID_BYTES * 2],
  parent_span_hex: Option<[u8; SPAN_ID_BYTES * 2]>,
}

impl TraceContext {
  /// Generate a fresh root context from CSPRNG bytes.
  pub fn generate(sampled: bool) -> Self {
    let mut rng = rand::rng();
    let mut trace_id = [0u8; TRACE_ID_BYTES];
    rng.fill_bytes(&mut trace_id);
    patch_all_zero(&mut trace_id);
    let span_id = generate_span_id(&mut rng);
    Self::from_ids(trace_id, span_id, TraceFlags::new(sampled), None)
  }

  /// Build a context from explicit ids, caching the hex projections.
  pub fn from_ids(
    trace_id: [u8; TRACE_ID_BYTES],
    span_id: [u8; SPAN_ID_BYTES],
    flags: TraceFlags,
    parent_span_id: Option<[u8; SPAN_ID_BYTES]>,
  ) -> Self {
    debug_assert!(trace_id.iter().any(|&b| b != 0), "trace id must not be all-zero");
    debug_assert!(span_id.iter().any(|&b| b != 0), "span id must not be all-zero");
    Self {
      version: 0x00,
      trace_id,
      span_id,
      flags,
      trace_id_hex: trace_id_to_hex(&trace_id),
      span_id_hex: span_id_to_hex(&span_id),
      parent_span_hex: parent_span_id.map(|id| span_id_to_hex(&id)),
    }
  }

  /// Derive a child: same trace id, fresh span id, this context's span id
  /// recorded as the parent.
  pub fn create_child(&self, sampled: bool) -> Self {
    let mut rng = rand::rng();
    let span_id = generate_span_id(&mut rng);
    Self::from_ids(
      self.trace_id,
      span_id,
      TraceFlags::new(sampled),
      Some(self.span_id),
    )
  }

  #[inline]
  pub const fn version(&self) -> u8 {
    self.version
  }

  #[inline]
  pub const fn trace_id(&self) -> &[u8; TRACE_ID_BYTES] {
    &self.trace_id
  }

  #[inline]
  pub const fn span_id(&self) -> &[u8; SPAN_ID_BYTES] {
    &self.span_id
  }

  #[inline]
  pub const fn flags(&self) -> TraceFlags {
    self.flags
  }

  /// Cached lowercase-hex trace id, 32 ASCII bytes.
  #[inline]
  pub const fn trace_id_hex(&self) -> &[u8; TRACE_ID_BYTES * 2] {
    &self.trace_id_hex
  }

  /// Cached lowercase-hex span id, 16 ASCII bytes.
  #[inline]
  pub const fn span_id_hex(&self) -> &[u8; SPAN_ID_BYTES * 2] {
    &self.span_id_hex
  }

  #[inline]
  pub const fn parent_span_hex(&self) -> Option<&[u8; SPAN_ID_BYTES * 2]> {
    self.parent_span_hex.as_ref()
  }

  /// W3C `traceparent` header value: `00-<trace>-<span>-<flags>`.
  pub fn traceparent(&self) -> TraceParent {
    let mut buf = [0u8; TRACEPARENT_LEN];
    buf[0] = HEX_LOWER[(self.version >> 4) as usize];
    buf[1] = HEX_LOWER[(self.version & 0x0F) as usize];
    buf[2] = b'-';
    buf[3..35].copy_from_slice(&self.trace_id_hex);
    buf[35] = b'-';
    buf[36..52].copy_from_slice(&self.span_id_hex);
    buf[52] = b'-';
    buf[53] = HEX_LOWER[(self.flags.0 >> 4) as usize];
    buf[54] = HEX_LOWER[(self.flags.0 & 0x0F) as usize];
    TraceParent { buf }
  }
}

pub const TRACEPARENT_LEN: usize = 55;

/// Stack-rendered W3C traceparent header value.
#[derive(Debug, Clone, Copy)]
pub struct TraceParent {
  buf: [u8; TRACEPARENT_LEN],
}

impl TraceParent {
  #[inline]
  pub fn as_str(&self) -> &str {
    // The buffer is built exclusively from '-' and lowercase hex.
    unsafe { std::str::from_utf8_unchecked(&self.buf) }
  }
}

impl std::fmt::Display for TraceParent {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Head-sampling decision from the trace id's last byte.
///
/// `threshold = rate_percent * 256 / 100`; rate 0 never samples, rate 100
/// always does.
#[inline]
pub fn should_sample(trace_id: &[u8; TRACE_ID_BYTES], rate_percent: u8) -> bool {
  if rate_percent == 0 {
    return false;
  }
  if rate_percent >= 100 {
    return true;
  }
  let threshold = (rate_percent as u16) * 256 / 100;
  (trace_id[TRACE_ID_BYTES - 1] as u16) < threshold
}

/// Patch an all-zero id by setting its least-significant byte to 1, keeping
/// the never-all-zero invariant even against a pathological RNG draw.
#[inline]
pub(crate) fn patch_all_zero(id: &mut [u8]) {
  if id.iter().all(|&b| b == 0) {
    id[id.len() - 1] = 1;
  }
}

pub(crate) fn generate_span_id(rng: &mut impl RngCore) -> [u8; SPAN_ID_BYTES] {
  let mut span_id = [0u8; SPAN_ID_BYTES];
  rng.fill_bytes(&mut span_id);
  patch_all_zero(&mut span_id);
  span_id
}

/// Fresh random span id from the thread's CSPRNG.
pub(crate) fn fresh_span_id() -> [u8; SPAN_ID_BYTES] {
  generate_span_id(&mut rand::rng())
}

pub(crate) fn trace_id_to_hex(id: &[u8; TRACE_ID_BYTES]) -> [u8; TRACE_ID_BYTES * 2] {
  let mut hex = [0u8; TRACE_ID_BYTES * 2];
  encode_hex(id, &mut hex);
  hex
}

pub(crate) fn span_id_to_hex(id: &[u8; SPAN_ID_BYTES]) -> [u8; SPAN_ID_BYTES * 2] {
  let mut hex = [0u8; SPAN_ID_BYTES * 2];
  encode_hex(id, &mut hex);
  hex
}

#[inline]
fn encode_hex(src: &[u8], dst: &mut [u8]) {
  debug_assert_eq!(dst.len(), src.len() * 2);
  for (i, &byte) in src.iter().enumerate() {
    dst[i * 2] = HEX_LOWER[(byte >> 4) as usize];
    dst[i * 2 + 1] = HEX_LOWER[(byte & 0x0F) as usize];
  }
}
