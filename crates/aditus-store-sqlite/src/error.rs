//! Error type for `aditus-store-sqlite`.
//!
//! Internal to the crate: the trait impls translate into the core's
//! [`RegistryError`](aditus_core::registry::RegistryError) /
//! [`LedgerError`](aditus_core::ledger::LedgerError) at the boundary.

use aditus_core::{
  ledger::LedgerError, registry::RegistryError, student::Matricule,
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] aditus_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An admitted record already exists for this (exam, student) pair.
  #[error("student {matricule} already admitted to exam {exam_id}")]
  DuplicateScan { exam_id: Uuid, matricule: Matricule },
}

impl Error {
  pub(crate) fn into_ledger(self) -> LedgerError {
    match self {
      Self::DuplicateScan { exam_id, matricule } => {
        LedgerError::DuplicateScan { exam_id, matricule }
      }
      other => LedgerError::Backend(other.to_string()),
    }
  }

  pub(crate) fn into_registry(self) -> RegistryError {
    RegistryError::Unavailable(self.to_string())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
