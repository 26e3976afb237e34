// onion/src/core/control.rs

//! Outcome of a pipeline run (and of every `next.run()` inside it).

/// What the downstream part of a chain reported back.
///
/// A handler receives this from `next.run().await` and usually returns it
/// unchanged, but it may also replace it (e.g. after recovering from a failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every layer delegated and the end of the chain was reached.
  /// This is also what an empty pipeline resolves to.
  Completed,
  /// Some layer returned without calling its `next`.
  Stopped,
}

impl PipelineResult {
  pub fn is_completed(&self) -> bool {
    matches!(self, PipelineResult::Completed)
  }
}
