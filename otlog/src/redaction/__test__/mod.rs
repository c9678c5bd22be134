#[cfg(test)]
mod __test__ {

  use crate::redaction::RedactionPolicy;

  #[test]
  fn test_static_keys_always_redact() {
    let policy = RedactionPolicy::new(&["password", "ssn"]);
    assert!(policy.is_redacted("password"));
    assert!(policy.is_redacted("ssn"));
    assert!(!policy.is_redacted("username"));
  }

  #[test]
  fn test_runtime_keys_union_with_static() {
    let policy = RedactionPolicy::new(&["password"]);
    assert!(!policy.is_redacted("api_key"));

    policy.add_key("api_key");
    assert!(policy.is_redacted("api_key"));
    assert!(policy.is_redacted("password"));
    assert_eq!(policy.runtime_len(), 1);

    policy.remove_key("api_key");
    assert!(!policy.is_redacted("api_key"));
    assert_eq!(policy.runtime_len(), 0);
  }

  #[test]
  fn test_removing_a_static_key_has_no_effect() {
    let policy = RedactionPolicy::new(&["password"]);
    policy.remove_key("password");
    assert!(policy.is_redacted("password"));
  }

  #[test]
  fn test_clear_runtime() {
    let policy = RedactionPolicy::new(&[]);
    policy.add_key("a");
    policy.add_key("b");
    assert_eq!(policy.runtime_len(), 2);
    policy.clear_runtime();
    assert_eq!(policy.runtime_len(), 0);
    assert!(!policy.is_redacted("a"));
    assert!(!policy.is_redacted("b"));
  }

  #[test]
  fn test_empty_policy_redacts_nothing() {
    let policy = RedactionPolicy::new(&[]);
    assert!(!policy.is_redacted(""));
    assert!(!policy.is_redacted("anything"));
  }
}
