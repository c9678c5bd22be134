use thiserror::Error;

/// Errors surfaced from construction and teardown paths.
///
/// The `log` call itself is infallible: formatter overflow drops the record,
/// sink write failures are swallowed, and a full queue is resolved by the
/// configured backpressure policy. Only setup (sink/queue/drainer) and
/// explicit invariant breaks report through this type.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invariant violation: {0}")]
  InvariantViolation(&'static str),

  #[error("async pipeline is shut down")]
  PipelineShutDown,

  #[error(transparent)]
  Io(#[from] std::io::Error),
}
