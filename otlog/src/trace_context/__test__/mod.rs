#[cfg(test)]
mod __test__ {

  use crate::trace_context::{
    patch_all_zero, should_sample, span_id_to_hex, trace_id_to_hex, TraceContext, TraceFlags,
  };

  #[test]
  fn test_generated_ids_are_never_zero() {
    for _ in 0..64 {
      let ctx = TraceContext::generate(true);
      assert!(ctx.trace_id().iter().any(|&b| b != 0));
      assert!(ctx.span_id().iter().any(|&b| b != 0));
      assert!(ctx.parent_span_hex().is_none());
      assert_eq!(ctx.version(), 0x00);
    }
  }

  #[test]
  fn test_patch_all_zero_sets_last_byte() {
    let mut id = [0u8; 8];
    patch_all_zero(&mut id);
    assert_eq!(id, [0, 0, 0, 0, 0, 0, 0, 1]);

    let mut id = [0u8, 0, 5, 0, 0, 0, 0, 0];
    patch_all_zero(&mut id);
    assert_eq!(id[2], 5);
    assert_eq!(id[7], 0);
  }

  #[test]
  fn test_hex_projection_is_lowercase_and_fixed_width() {
    let trace_id = [
      0x00, 0x01, 0x2A, 0xFF, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66,
      0x77,
    ];
    let hex = trace_id_to_hex(&trace_id);
    assert_eq!(&hex, b"00012affdeadbeef0011223344556677");

    let span_id = [0xAB, 0xCD, 0xEF, 0x01, 0x23, 0x45, 0x67, 0x89];
    assert_eq!(&span_id_to_hex(&span_id), b"abcdef0123456789");
  }

  #[test]
  fn test_cached_hex_matches_formatted_bytes() {
    let ctx = TraceContext::generate(false);
    let expected: String = ctx.trace_id().iter().map(|b| format!("{b:02x}")).collect();
    assert_eq!(std::str::from_utf8(ctx.trace_id_hex()).unwrap(), expected);
    let expected: String = ctx.span_id().iter().map(|b| format!("{b:02x}")).collect();
    assert_eq!(std::str::from_utf8(ctx.span_id_hex()).unwrap(), expected);
  }

  #[test]
  fn test_create_child_keeps_trace_and_links_parent() {
    let parent = TraceContext::generate(true);
    let child = parent.create_child(true);

    assert_eq!(child.trace_id(), parent.trace_id());
    assert_ne!(child.span_id(), parent.span_id());
    assert_eq!(child.parent_span_hex(), Some(parent.span_id_hex()));
    assert!(child.flags().sampled());

    let unsampled = parent.create_child(false);
    assert!(!unsampled.flags().sampled());
  }

  #[test]
  fn test_sampling_rate_extremes() {
    let mut trace_id = [0u8; 16];
    trace_id[15] = 0x00;
    assert!(!should_sample(&trace_id, 0));
    assert!(should_sample(&trace_id, 100));
    trace_id[15] = 0xFF;
    assert!(!should_sample(&trace_id, 0));
    assert!(should_sample(&trace_id, 100));
  }

  #[test]
  fn test_sampling_threshold_uses_last_byte() {
    // rate 50 -> threshold 128: last byte 127 samples, 128 does not
    let mut trace_id = [1u8; 16];
    trace_id[15] = 127;
    assert!(should_sample(&trace_id, 50));
    trace_id[15] = 128;
    assert!(!should_sample(&trace_id, 50));

    // rate 25 -> threshold 64
    trace_id[15] = 63;
    assert!(should_sample(&trace_id, 25));
    trace_id[15] = 64;
    assert!(!should_sample(&trace_id, 25));
  }

  #[test]
  fn test_traceparent_shape() {
    let ctx = TraceContext::from_ids([0xAA; 16], [0xBB; 8], TraceFlags::new(true), None);
    let header = ctx.traceparent();
    assert_eq!(
      header.as_str(),
      "00-aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa-bbbbbbbbbbbbbbbb-01"
    );

    let ctx = TraceContext::from_ids([0xAA; 16], [0xBB; 8], TraceFlags::new(false), None);
    assert!(ctx.traceparent().as_str().ends_with("-00"));
  }

  #[test]
  fn test_flags_bit_zero_is_sampled() {
    assert!(TraceFlags::new(true).sampled());
    assert!(!TraceFlags::new(false).sampled());
    assert_eq!(TraceFlags::new(true).0, 0x01);
    assert_eq!(TraceFlags::new(false).0, 0x00);
  }
}
