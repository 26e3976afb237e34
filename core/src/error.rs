// onion/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OnionError {
  #[error("Layer '{layer}' (index {index}) has no handler")]
  InvalidHandler { layer: String, index: usize },

  #[error("Layer not found: {layer}")]
  LayerNotFound { layer: String },

  #[error("Layer already exists: {layer}")]
  DuplicateLayer { layer: String },

  #[error("next() called multiple times by layer '{layer}' (index {index})")]
  NextCalledMultipleTimes { layer: String, index: usize },

  #[error("Error in user-provided handler. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal onion error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for OnionError {
  fn from(err: AnyhowError) -> Self {
    // An OnionError that travelled through anyhow is unwrapped rather than nested.
    match err.downcast::<OnionError>() {
      Ok(onion_err) => onion_err,
      Err(source) => OnionError::HandlerError { source },
    }
  }
}

pub type OnionResult<T, E = OnionError> = std::result::Result<T, E>;
