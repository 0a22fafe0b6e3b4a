//! Error types for `aditus-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid matricule: {0:?}")]
  InvalidMatricule(String),

  #[error("invalid academic year: {0:?}")]
  InvalidAcademicYear(String),

  #[error("unknown scan method: {0:?}")]
  UnknownScanMethod(String),

  #[error("unknown student status: {0:?}")]
  UnknownStudentStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
