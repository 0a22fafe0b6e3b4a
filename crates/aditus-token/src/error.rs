//! Error types for the aditus-token codec.
//!
//! Every variant means the same thing to the gate: the presented payload is
//! malformed and the scan is denied `invalid-credential`. The split exists
//! for logging, not for control flow.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("payload is not valid base64: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("payload structure is invalid: {0}")]
  Json(#[from] serde_json::Error),

  #[error("payload carries an invalid matricule: {0:?}")]
  InvalidMatricule(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
