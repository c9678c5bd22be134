#[cfg(test)]
mod __test__ {

  use crate::json::{
    escape_scalar, escape_wide, put_json_str, BufferFull, RecordBuffer,
  };

  fn scalar(src: &[u8]) -> Vec<u8> {
    let mut storage = vec![0u8; 6 * src.len() + 64];
    let mut buf = RecordBuffer::new(&mut storage);
    escape_scalar(src, &mut buf).unwrap();
    buf.as_slice().to_vec()
  }

  fn wide(src: &[u8]) -> Vec<u8> {
    let mut storage = vec![0u8; 6 * src.len() + 64];
    let mut buf = RecordBuffer::new(&mut storage);
    escape_wide(src, &mut buf).unwrap();
    buf.as_slice().to_vec()
  }

  #[test]
  fn test_short_escapes() {
    assert_eq!(scalar(b"say \"hi\""), b"say \\\"hi\\\"");
    assert_eq!(scalar(b"a\\b"), b"a\\\\b");
    assert_eq!(scalar(b"line\nbreak\tand\rcarriage"), b"line\\nbreak\\tand\\rcarriage");
    assert_eq!(scalar(&[0x08, 0x0C]), b"\\b\\f");
  }

  #[test]
  fn test_control_bytes_use_lowercase_unicode_escapes() {
    assert_eq!(scalar(&[0x00]), b"\\u0000");
    assert_eq!(scalar(&[0x01, 0x08, 0x0C, 0x1F]), b"\\u0001\\b\\f\\u001f");
    assert_eq!(scalar(&[0x1E]), b"\\u001e");
  }

  #[test]
  fn test_utf8_passes_through_verbatim() {
    let src = "héllo wörld — ∆ 日本語".as_bytes();
    assert_eq!(scalar(src), src);
    assert_eq!(wide(src), src);
  }

  #[test]
  fn test_scalar_and_wide_agree() {
    let mut long_mixed = Vec::new();
    for i in 0..1024u32 {
      long_mixed.push((i % 256) as u8);
      long_mixed.extend_from_slice("plain ascii ".as_bytes());
      long_mixed.extend_from_slice("日本\u{1F600}".as_bytes());
    }

    let corpus: Vec<Vec<u8>> = vec![
      Vec::new(),
      b"plain ascii with no escapes at all".to_vec(),
      b"\"\\\n\r\t\x08\x0C".to_vec(),
      (0x00..0x20u8).collect(),
      (0x00..=0xFFu8).collect(),
      b"exactly8".to_vec(),
      b"exactly8\"then a quote right after the boundary".to_vec(),
      b"seven b".to_vec(),
      long_mixed,
    ];

    for input in corpus {
      assert_eq!(scalar(&input), wide(&input), "mismatch for {input:?}");
    }
  }

  #[test]
  fn test_wide_detects_escape_in_every_lane() {
    for lane in 0..8 {
      let mut input = vec![b'a'; 16];
      input[lane] = b'"';
      assert_eq!(scalar(&input), wide(&input));
      let mut input = vec![b'x'; 16];
      input[8 + lane] = 0x02;
      assert_eq!(scalar(&input), wide(&input));
    }
  }

  #[test]
  fn test_put_json_str_quotes_and_escapes() {
    let mut storage = [0u8; 64];
    let mut buf = RecordBuffer::new(&mut storage);
    put_json_str(&mut buf, "a\"b", true).unwrap();
    assert_eq!(buf.as_slice(), b"\"a\\\"b\"");
  }

  #[test]
  fn test_buffer_overflow_is_an_error() {
    let mut storage = [0u8; 4];
    let mut buf = RecordBuffer::new(&mut storage);
    assert_eq!(buf.put_bytes(b"12345"), Err(BufferFull));
    assert!(buf.put_bytes(b"1234").is_ok());
    assert_eq!(buf.put_byte(b'5'), Err(BufferFull));
    assert_eq!(buf.remaining(), 0);
  }

  #[test]
  fn test_escape_overflow_propagates() {
    let mut storage = [0u8; 3];
    let mut buf = RecordBuffer::new(&mut storage);
    assert_eq!(escape_scalar(b"\"\"", &mut buf), Err(BufferFull));
  }

  #[test]
  fn test_integers_base_10() {
    let mut storage = [0u8; 64];
    let mut buf = RecordBuffer::new(&mut storage);
    buf.put_u64(0).unwrap();
    buf.put_byte(b' ').unwrap();
    buf.put_u64(u64::MAX).unwrap();
    buf.put_byte(b' ').unwrap();
    buf.put_i64(-42).unwrap();
    assert_eq!(buf.as_slice(), b"0 18446744073709551615 -42");
  }

  #[test]
  fn test_float_has_exactly_five_fraction_digits() {
    let cases: &[(f64, &str)] = &[
      (3.14, "3.14000"),
      (0.0, "0.00000"),
      (-2.5, "-2.50000"),
      (42.0, "42.00000"),
      (0.999999, "1.00000"),
      (1234.000004, "1234.00000"),
    ];
    for (value, expected) in cases {
      let mut storage = [0u8; 64];
      let mut buf = RecordBuffer::new(&mut storage);
      buf.put_f64_5(*value).unwrap();
      assert_eq!(
        std::str::from_utf8(buf.as_slice()).unwrap(),
        *expected,
        "for {value}"
      );
    }
  }

  #[test]
  fn test_escape_append_matches_scalar() {
    let input: Vec<u8> = (0x00..=0x7Fu8).collect();
    let mut grown = Vec::new();
    crate::json::escape_append(&input, &mut grown);
    assert_eq!(grown, scalar(&input));

    let mut quoted = Vec::new();
    crate::json::append_json_str(&mut quoted, "a\"b\\c");
    assert_eq!(quoted, b"\"a\\\"b\\\\c\"");
  }
}
