//! Collaborator traits for the external registries the gate queries.
//!
//! Student, payment, enrollment and schedule data are owned elsewhere; the
//! core reads them by identity on every scan and never caches the answers.
//! A failed lookup is a [`RegistryError`] and the gate fails closed on it.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  exam::ExamSession,
  ledger::AccessLedger,
  student::{AcademicYear, Matricule, Student},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RegistryError {
  /// The lookup could not be completed (backend down, I/O failure, corrupt
  /// row). Admission must never default to open on this.
  #[error("registry unavailable: {0}")]
  Unavailable(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

// ─── Student Registry ────────────────────────────────────────────────────────

pub trait StudentRegistry: Send + Sync {
  /// Point read by identity key. `None` when the matricule is unknown.
  fn get_by_matricule<'a>(
    &'a self,
    matricule: &'a Matricule,
  ) -> impl Future<Output = RegistryResult<Option<Student>>> + Send + 'a;

  /// Mint a fresh access secret for a student, invalidating every
  /// previously issued credential. Returns the new secret.
  fn rotate_secret<'a>(
    &'a self,
    matricule: &'a Matricule,
  ) -> impl Future<Output = RegistryResult<Option<Uuid>>> + Send + 'a;
}

// ─── Payment Registry ────────────────────────────────────────────────────────

pub trait PaymentRegistry: Send + Sync {
  /// Whether a settled payment exists for the student in the given year.
  fn is_settled<'a>(
    &'a self,
    matricule: &'a Matricule,
    year: &'a AcademicYear,
  ) -> impl Future<Output = RegistryResult<bool>> + Send + 'a;
}

// ─── Enrollment Registry ─────────────────────────────────────────────────────

pub trait EnrollmentRegistry: Send + Sync {
  /// Whether an exam-authorized enrollment exists for
  /// (student, course unit, year).
  fn is_exam_authorized<'a>(
    &'a self,
    matricule: &'a Matricule,
    unit_code: &'a str,
    year: &'a AcademicYear,
  ) -> impl Future<Output = RegistryResult<bool>> + Send + 'a;
}

// ─── Exam Schedule ───────────────────────────────────────────────────────────

pub trait ExamSchedule: Send + Sync {
  /// Point read by exam id. `None` is a caller error (unknown exam), not a
  /// denial verdict.
  fn get_exam(
    &self,
    exam_id: Uuid,
  ) -> impl Future<Output = RegistryResult<Option<ExamSession>>> + Send + '_;
}

// ─── Audit Trail ─────────────────────────────────────────────────────────────

/// Category of an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
  Scan,
  Credential,
  System,
}

impl AuditKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Scan => "scan",
      Self::Credential => "credential",
      Self::System => "system",
    }
  }
}

/// Fire-and-forget audit sink. Append failure must never block or alter an
/// admission decision; callers log it and move on.
pub trait AuditTrail: Send + Sync {
  fn append<'a>(
    &'a self,
    actor: &'a str,
    kind: AuditKind,
    description: &'a str,
    details: serde_json::Value,
  ) -> impl Future<Output = RegistryResult<()>> + Send + 'a;
}

// ─── Umbrella ────────────────────────────────────────────────────────────────

/// Everything the gate needs behind one state type. Blanket-implemented for
/// any backend that provides all the collaborator traits.
pub trait Backend:
  StudentRegistry
  + PaymentRegistry
  + EnrollmentRegistry
  + ExamSchedule
  + AccessLedger
  + AuditTrail
{
}

impl<T> Backend for T where
  T: StudentRegistry
    + PaymentRegistry
    + EnrollmentRegistry
    + ExamSchedule
    + AccessLedger
    + AuditTrail
{
}
