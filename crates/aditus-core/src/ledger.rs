//! The Access Ledger — append-only record of every scan attempt.
//!
//! Records are never updated; the ledger is the single source of truth for
//! "already processed" checks. The at-most-one-admission invariant is
//! enforced by the storage backend's uniqueness constraint, not by
//! application logic, so it survives concurrent scans from independent
//! gate processes.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::student::Matricule;

// ─── Scan metadata ───────────────────────────────────────────────────────────

/// How the presenter was identified at the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMethod {
  Credential,
  Matricule,
  Manual,
}

impl ScanMethod {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Credential => "credential",
      Self::Matricule => "matricule",
      Self::Manual => "manual",
    }
  }
}

/// Whether the scan opened the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
  Admitted,
  Denied,
}

impl Outcome {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admitted => "admitted",
      Self::Denied => "denied",
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// One scan attempt, as persisted. Once written, no field ever changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRecord {
  pub record_id:   Uuid,
  pub exam_id:     Uuid,
  /// `None` when the presenter could not be identified; such records are
  /// never deduplicated.
  pub matricule:   Option<Matricule>,
  pub method:      ScanMethod,
  pub outcome:     Outcome,
  pub reasons:     Vec<String>,
  /// Operator name of the scan station that recorded the attempt.
  pub recorded_by: String,
  /// Server-assigned; never accepted from callers.
  pub scanned_at:  DateTime<Utc>,
}

/// Input to [`AccessLedger::record`]. `record_id` and `scanned_at` are
/// assigned by the ledger.
#[derive(Debug, Clone)]
pub struct NewAccessRecord {
  pub exam_id:     Uuid,
  pub matricule:   Option<Matricule>,
  pub method:      ScanMethod,
  pub outcome:     Outcome,
  pub reasons:     Vec<String>,
  pub recorded_by: String,
}

/// Per-exam attendance counters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScanTally {
  pub admitted: u64,
  pub denied:   u64,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LedgerError {
  /// An admitted record already exists for this (exam, student) pair.
  /// Benign under concurrency: the caller re-reads the surviving record
  /// and responds `already-admitted`.
  #[error("student {matricule} already admitted to exam {exam_id}")]
  DuplicateScan { exam_id: Uuid, matricule: Matricule },

  #[error("ledger backend error: {0}")]
  Backend(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the scan-outcome store.
///
/// All methods return `Send` futures so the trait can be consumed from
/// multi-threaded async runtimes (tokio with axum).
pub trait AccessLedger: Send + Sync {
  /// Persist one attempt. Fails with [`LedgerError::DuplicateScan`] when an
  /// admitted record for the same identified (exam, student) pair already
  /// exists; the check and the insert are atomic in the backend.
  fn record(
    &self,
    input: NewAccessRecord,
  ) -> impl Future<Output = LedgerResult<AccessRecord>> + Send + '_;

  /// Cheap replay rejection, consulted before eligibility is computed.
  fn has_admitted<'a>(
    &'a self,
    exam_id: Uuid,
    matricule: &'a Matricule,
  ) -> impl Future<Output = LedgerResult<bool>> + Send + 'a;

  /// The surviving admitted record for a pair, if any. Used to answer a
  /// lost [`LedgerError::DuplicateScan`] race with the winner's data.
  fn admitted_record<'a>(
    &'a self,
    exam_id: Uuid,
    matricule: &'a Matricule,
  ) -> impl Future<Output = LedgerResult<Option<AccessRecord>>> + Send + 'a;

  /// Every attempt for an exam, newest first.
  fn records_for_exam(
    &self,
    exam_id: Uuid,
  ) -> impl Future<Output = LedgerResult<Vec<AccessRecord>>> + Send + '_;

  /// Admitted/denied counters for an exam.
  fn tally(
    &self,
    exam_id: Uuid,
  ) -> impl Future<Output = LedgerResult<ScanTally>> + Send + '_;
}
