//! The eligibility evaluator — the pure decision function at the heart of
//! the gate.
//!
//! `evaluate` combines the facts gathered from the external registries with
//! the exam's admission window and an injected clock. It never reads wall
//! time, never touches a registry and never writes anything, so it can be
//! called speculatively (the preview path) with no side effects.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

use crate::{exam::ExamSession, student::StudentStatus};

// ─── Facts ───────────────────────────────────────────────────────────────────

/// Registry state gathered fresh for one scan. Never cached across scans:
/// payment and authorization are mutable by administrators while exams run.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityFacts {
  pub status:          StudentStatus,
  /// A settled payment record exists for the exam's academic year.
  pub payment_settled: bool,
  /// An exam-authorized enrollment exists for (student, unit, year).
  pub exam_authorized: bool,
}

// ─── Denial reasons ──────────────────────────────────────────────────────────

/// Every way a scan can be refused. The `Display` strings are stable: they
/// are stored in the ledger, returned to scan stations and asserted on by
/// tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
  /// Student status is anything other than active.
  Status(StudentStatus),
  PaymentUnsettled,
  NotAuthorized,
  TooEarly,
  TooLate,
  /// Credential failed decode, secret match or freshness.
  InvalidCredential,
  UnknownMatricule,
  AlreadyAdmitted,
  /// A registry lookup failed; the gate fails closed.
  EvaluationUnavailable,
}

impl fmt::Display for DenialReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Status(s) => write!(f, "status:{}", s.as_str()),
      Self::PaymentUnsettled => f.write_str("payment-unsettled"),
      Self::NotAuthorized => f.write_str("not-authorized"),
      Self::TooEarly => f.write_str("too-early"),
      Self::TooLate => f.write_str("too-late"),
      Self::InvalidCredential => f.write_str("invalid-credential"),
      Self::UnknownMatricule => f.write_str("unknown-matricule"),
      Self::AlreadyAdmitted => f.write_str("already-admitted"),
      Self::EvaluationUnavailable => f.write_str("evaluation-unavailable"),
    }
  }
}

impl Serialize for DenialReason {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

// ─── Verdict ─────────────────────────────────────────────────────────────────

/// The outcome of one evaluation: admitted iff no reasons accumulated.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
  pub admitted: bool,
  pub reasons:  Vec<DenialReason>,
}

impl Verdict {
  pub fn admit() -> Self {
    Self { admitted: true, reasons: Vec::new() }
  }

  pub fn deny(reasons: Vec<DenialReason>) -> Self {
    debug_assert!(!reasons.is_empty());
    Self { admitted: false, reasons }
  }

  pub fn deny_one(reason: DenialReason) -> Self {
    Self::deny(vec![reason])
  }

  /// Reasons rendered to their stable strings, for the ledger.
  pub fn reason_strings(&self) -> Vec<String> {
    self.reasons.iter().map(ToString::to_string).collect()
  }
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

/// Evaluate every admission check and accumulate every failing reason.
///
/// No short-circuiting: a student who is suspended AND unpaid AND
/// unauthorized AND late learns all four at once. Reason order is stable:
/// status, payment, authorization, timing.
pub fn evaluate(
  facts: &EligibilityFacts,
  exam: &ExamSession,
  now: DateTime<Utc>,
  tolerance: Duration,
) -> Verdict {
  let mut reasons = Vec::new();

  if facts.status != StudentStatus::Active {
    reasons.push(DenialReason::Status(facts.status));
  }
  if !facts.payment_settled {
    reasons.push(DenialReason::PaymentUnsettled);
  }
  if !facts.exam_authorized {
    reasons.push(DenialReason::NotAuthorized);
  }

  let (open, close) = exam.admission_window(tolerance);
  if now < open {
    reasons.push(DenialReason::TooEarly);
  } else if now > close {
    reasons.push(DenialReason::TooLate);
  }

  if reasons.is_empty() {
    Verdict::admit()
  } else {
    Verdict::deny(reasons)
  }
}
