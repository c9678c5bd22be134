#[cfg(test)]
mod __test__ {

  use serde_json::Value;

  use crate::level::Level;
  use crate::otel::{AttrValue, InstrumentationScope, LogRecord, Resource};
  use crate::otlp::serialize_batch;

  fn sample_records() -> Vec<LogRecord> {
    vec![
      LogRecord::new(Level::Info, "first")
        .with_attribute("k", AttrValue::Str("v".to_owned()))
        .with_attribute("n", AttrValue::U64(12)),
      LogRecord::new(Level::Error, "second").with_attribute("pii", AttrValue::Redacted),
    ]
  }

  #[test]
  fn test_envelope_shape() {
    let resource = Resource::new("svc").with_service_version("2.0.0");
    let scope = InstrumentationScope::new("svc::mod").with_version("0.1.0");
    let out = serialize_batch(&resource, &scope, &sample_records());

    let parsed: Value = serde_json::from_slice(&out).unwrap();
    let resource_logs = parsed["resourceLogs"].as_array().unwrap();
    assert_eq!(resource_logs.len(), 1);

    let resource_attrs = resource_logs[0]["resource"]["attributes"].as_array().unwrap();
    assert!(resource_attrs.iter().any(|a| a["key"] == "service.name"));
    assert!(resource_attrs.iter().any(|a| a["key"] == "service.version"));

    let scope_logs = resource_logs[0]["scopeLogs"].as_array().unwrap();
    assert_eq!(scope_logs.len(), 1);
    assert_eq!(scope_logs[0]["scope"]["name"], "svc::mod");

    let log_records = scope_logs[0]["logRecords"].as_array().unwrap();
    assert_eq!(log_records.len(), 2);
    assert_eq!(log_records[0]["body"]["stringValue"], "first");
    assert_eq!(log_records[0]["severityNumber"], 9);
    assert_eq!(log_records[1]["severityNumber"], 17);
    assert_eq!(log_records[1]["severityText"], "ERROR");
  }

  #[test]
  fn test_dropped_attributes_count_is_always_present() {
    let resource = Resource::new("svc");
    let scope = InstrumentationScope::new("scope");

    // one record with trace correlation, one without
    let ctx = crate::trace_context::TraceContext::generate(true);
    let records = vec![
      LogRecord::new(Level::Info, "with trace").with_trace(&ctx),
      LogRecord::new(Level::Info, "without trace"),
    ];
    let out = serialize_batch(&resource, &scope, &records);
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    let log_records = parsed["resourceLogs"][0]["scopeLogs"][0]["logRecords"]
      .as_array()
      .unwrap();

    for record in log_records {
      assert_eq!(record["droppedAttributesCount"], 0);
    }
    assert!(log_records[0]["traceId"].is_string());
    assert!(log_records[0]["flags"].is_u64());
    assert!(log_records[1].get("traceId").is_none());
  }

  #[test]
  fn test_attribute_value_encodings() {
    let resource = Resource::new("svc");
    let scope = InstrumentationScope::new("scope");
    let records = vec![LogRecord::new(Level::Info, "m")
      .with_attribute("s", AttrValue::Str("x".to_owned()))
      .with_attribute("i", AttrValue::I64(-3))
      .with_attribute("u", AttrValue::U64(3))
      .with_attribute("f", AttrValue::F64(0.25))
      .with_attribute("b", AttrValue::Bool(true))
      .with_attribute("nothing", AttrValue::Null)];

    let out = serialize_batch(&resource, &scope, &records);
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    let attrs = parsed["resourceLogs"][0]["scopeLogs"][0]["logRecords"][0]["attributes"]
      .as_array()
      .unwrap();

    assert_eq!(attrs[0]["value"]["stringValue"], "x");
    assert_eq!(attrs[1]["value"]["intValue"], "-3");
    assert_eq!(attrs[2]["value"]["intValue"], "3");
    assert_eq!(attrs[3]["value"]["doubleValue"], 0.25);
    assert_eq!(attrs[4]["value"]["boolValue"], true);
    assert_eq!(attrs[5]["value"]["stringValue"], "[REDACTED]");
  }

  #[test]
  fn test_timestamps_are_quoted_strings() {
    let resource = Resource::new("svc");
    let scope = InstrumentationScope::new("scope");
    let out = serialize_batch(&resource, &scope, &[LogRecord::new(Level::Info, "m")]);
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    let record = &parsed["resourceLogs"][0]["scopeLogs"][0]["logRecords"][0];

    let time: u64 = record["timeUnixNano"].as_str().unwrap().parse().unwrap();
    assert!(time > 0);
    assert!(record["observedTimeUnixNano"].is_string());
  }

  #[test]
  fn test_empty_batch_is_valid_json() {
    let resource = Resource::new("svc");
    let scope = InstrumentationScope::new("scope");
    let out = serialize_batch(&resource, &scope, &[]);
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    let log_records = parsed["resourceLogs"][0]["scopeLogs"][0]["logRecords"]
      .as_array()
      .unwrap();
    assert!(log_records.is_empty());
  }

  #[test]
  fn test_schema_url_on_scope_logs() {
    let resource = Resource::new("svc");
    let scope = InstrumentationScope::new("scope")
      .with_schema_url("https://opentelemetry.io/schemas/1.21.0");
    let out = serialize_batch(&resource, &scope, &[]);
    let parsed: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(
      parsed["resourceLogs"][0]["scopeLogs"][0]["schemaUrl"],
      "https://opentelemetry.io/schemas/1.21.0"
    );
  }
}
