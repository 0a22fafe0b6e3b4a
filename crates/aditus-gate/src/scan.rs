//! The Scan Orchestrator — the single entry point invoked per physical
//! scan event.
//!
//! One pass per request: Received → Identified | Unidentified → Evaluated →
//! Recorded → Responded. Nothing here is persisted except through the
//! Access Ledger, and eligibility facts are read fresh from the registries
//! on every pass — payment and authorization are mutable by administrators
//! while exams run.

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use aditus_core::{
  eligibility::{self, DenialReason, EligibilityFacts, Verdict},
  exam::ExamSession,
  ledger::{AccessLedger as _, LedgerError, NewAccessRecord, Outcome, ScanMethod},
  registry::{
    AuditKind, AuditTrail as _, Backend, EnrollmentRegistry as _,
    ExamSchedule as _, PaymentRegistry as _, RegistryError,
    StudentRegistry as _,
  },
  student::{Matricule, Student},
};

use crate::{AppState, auth::Operator, error::Error};

// ─── Request / response types ────────────────────────────────────────────────

/// Raw input from a scan station.
#[derive(Debug, Deserialize)]
pub struct ScanBody {
  pub method:     ScanMethod,
  /// Required when `method` is `credential`.
  pub credential: Option<String>,
  /// Required when `method` is `matricule` or `manual`.
  pub matricule:  Option<String>,
}

/// Masked display fields shown at the door. Deliberately excludes payment
/// data and the access secret.
#[derive(Debug, Serialize)]
pub struct StudentCard {
  pub matricule: String,
  pub full_name: String,
  pub program:   String,
  pub level:     String,
}

impl StudentCard {
  pub(crate) fn from_student(student: &Student) -> Self {
    Self {
      matricule: student.matricule.to_string(),
      full_name: student.full_name.clone(),
      program:   student.program.clone(),
      level:     student.level.clone(),
    }
  }
}

/// The structured result returned to the scan station. Every denial
/// carries its complete reason list; there are no silent denials.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
  pub admitted:   bool,
  pub reasons:    Vec<String>,
  pub student:    Option<StudentCard>,
  pub record_id:  Option<Uuid>,
  pub scanned_at: DateTime<Utc>,
}

// ─── Identification ──────────────────────────────────────────────────────────

pub(crate) enum Identification {
  Identified(Student),
  /// No student could be certified for this presentation; the attempt is
  /// still recorded for audit.
  Unidentified(DenialReason),
}

/// Resolve a presentation to a student, or to the denial reason that will
/// be recorded against the unidentified attempt.
///
/// A registry failure here fails closed as `evaluation-unavailable`: an
/// identity the registry could not confirm is not an identity.
pub(crate) async fn identify<S: Backend>(
  store: &S,
  body: &ScanBody,
  now: DateTime<Utc>,
  credential_validity: Duration,
) -> Result<Identification, Error> {
  match body.method {
    ScanMethod::Credential => {
      let payload = body
        .credential
        .as_deref()
        .ok_or_else(|| Error::BadRequest("credential payload required".into()))?;
      Ok(identify_by_credential(store, payload, now, credential_validity).await)
    }
    ScanMethod::Matricule | ScanMethod::Manual => {
      let raw = body
        .matricule
        .as_deref()
        .ok_or_else(|| Error::BadRequest("matricule required".into()))?;
      Ok(identify_by_matricule(store, raw).await)
    }
  }
}

async fn identify_by_credential<S: Backend>(
  store: &S,
  payload: &str,
  now: DateTime<Utc>,
  validity: Duration,
) -> Identification {
  let claims = match aditus_token::decode(payload) {
    Ok(claims) => claims,
    Err(err) => {
      tracing::debug!(%err, "credential failed to decode");
      return Identification::Unidentified(DenialReason::InvalidCredential);
    }
  };

  let student = match store.get_by_matricule(&claims.matricule).await {
    Ok(Some(student)) => student,
    // An unknown matricule inside a well-formed payload is a stale or
    // forged credential, not an unknown-matricule scan.
    Ok(None) => {
      return Identification::Unidentified(DenialReason::InvalidCredential);
    }
    Err(err) => return unavailable(err),
  };

  // Rotation changes the digest; replayed pre-rotation credentials and
  // expired ones both die here.
  if !claims.matches_secret(&student.access_secret)
    || !claims.is_fresh(now, validity)
  {
    return Identification::Unidentified(DenialReason::InvalidCredential);
  }

  Identification::Identified(student)
}

async fn identify_by_matricule<S: Backend>(
  store: &S,
  raw: &str,
) -> Identification {
  let matricule = match raw.parse::<Matricule>() {
    Ok(m) => m,
    Err(_) => {
      return Identification::Unidentified(DenialReason::UnknownMatricule);
    }
  };

  match store.get_by_matricule(&matricule).await {
    Ok(Some(student)) => Identification::Identified(student),
    Ok(None) => Identification::Unidentified(DenialReason::UnknownMatricule),
    Err(err) => unavailable(err),
  }
}

fn unavailable(err: RegistryError) -> Identification {
  tracing::warn!(%err, "registry unavailable during identification");
  Identification::Unidentified(DenialReason::EvaluationUnavailable)
}

// ─── Fact gathering ──────────────────────────────────────────────────────────

/// Read the eligibility facts for (student, exam) fresh from the
/// registries.
pub(crate) async fn gather_facts<S: Backend>(
  store: &S,
  student: &Student,
  exam: &ExamSession,
) -> Result<EligibilityFacts, RegistryError> {
  let payment_settled = store
    .is_settled(&student.matricule, &exam.academic_year)
    .await?;
  let exam_authorized = store
    .is_exam_authorized(&student.matricule, &exam.unit_code, &exam.academic_year)
    .await?;

  Ok(EligibilityFacts {
    status: student.status,
    payment_settled,
    exam_authorized,
  })
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `POST /exams/{exam_id}/scan` — the recording scan path.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Path(exam_id): Path<Uuid>,
  operator: Operator,
  Json(body): Json<ScanBody>,
) -> Result<Json<ScanResponse>, Error>
where
  S: Backend + Clone + Send + Sync + 'static,
{
  if !state.limiter.allow(&operator.name) {
    return Err(Error::RateLimited);
  }

  let exam = state
    .store
    .get_exam(exam_id)
    .await
    .map_err(Error::Registry)?
    .ok_or(Error::ExamNotFound(exam_id))?;

  let now = Utc::now();
  let identification =
    identify(&*state.store, &body, now, state.credential_validity()).await?;

  let response = match identification {
    Identification::Unidentified(reason) => {
      record_and_respond(
        &state,
        &exam,
        None,
        body.method,
        Verdict::deny_one(reason),
        &operator,
      )
      .await?
    }
    Identification::Identified(student) => {
      // Cheap replay rejection before any eligibility work. Responding
      // directly (no second record) keeps the ledger invariant intact;
      // this is a benign no-op, not an error.
      let already = state
        .store
        .has_admitted(exam_id, &student.matricule)
        .await
        .map_err(Error::Ledger)?;
      if already {
        already_admitted_response(&state, &exam, &student, now).await?
      } else {
        let verdict = match gather_facts(&*state.store, &student, &exam).await
        {
          Ok(facts) => {
            eligibility::evaluate(&facts, &exam, now, state.exam_tolerance())
          }
          Err(err) => {
            // Fail closed: admission never defaults to open on
            // infrastructure failure.
            tracing::warn!(%err, "registry unavailable during evaluation");
            Verdict::deny_one(DenialReason::EvaluationUnavailable)
          }
        };

        match record_and_respond(
          &state,
          &exam,
          Some(&student),
          body.method,
          verdict,
          &operator,
        )
        .await
        {
          Ok(response) => response,
          // Lost the race against a concurrent scan of the same
          // credential at another door: answer with the winner's record.
          Err(Error::Ledger(LedgerError::DuplicateScan { .. })) => {
            already_admitted_response(&state, &exam, &student, now).await?
          }
          Err(other) => return Err(other),
        }
      }
    }
  };

  audit_scan(&state, &operator, &exam, &response).await;
  Ok(Json(response))
}

// ─── Flow helpers ────────────────────────────────────────────────────────────

async fn record_and_respond<S: Backend>(
  state: &AppState<S>,
  exam: &ExamSession,
  student: Option<&Student>,
  method: ScanMethod,
  verdict: Verdict,
  operator: &Operator,
) -> Result<ScanResponse, Error>
where
  S: Clone + Send + Sync + 'static,
{
  let outcome = if verdict.admitted {
    Outcome::Admitted
  } else {
    Outcome::Denied
  };

  let record = state
    .store
    .record(NewAccessRecord {
      exam_id:     exam.exam_id,
      matricule:   student.map(|s| s.matricule.clone()),
      method,
      outcome,
      reasons:     verdict.reason_strings(),
      recorded_by: operator.name.clone(),
    })
    .await
    .map_err(Error::Ledger)?;

  Ok(ScanResponse {
    admitted:   verdict.admitted,
    reasons:    verdict.reason_strings(),
    student:    student.map(StudentCard::from_student),
    record_id:  Some(record.record_id),
    scanned_at: record.scanned_at,
  })
}

async fn already_admitted_response<S: Backend>(
  state: &AppState<S>,
  exam: &ExamSession,
  student: &Student,
  now: DateTime<Utc>,
) -> Result<ScanResponse, Error>
where
  S: Clone + Send + Sync + 'static,
{
  let existing = state
    .store
    .admitted_record(exam.exam_id, &student.matricule)
    .await
    .map_err(Error::Ledger)?;

  Ok(ScanResponse {
    admitted:   false,
    reasons:    vec![DenialReason::AlreadyAdmitted.to_string()],
    student:    Some(StudentCard::from_student(student)),
    record_id:  existing.as_ref().map(|r| r.record_id),
    scanned_at: existing.map(|r| r.scanned_at).unwrap_or(now),
  })
}

/// Mirror the scan outcome into the Audit Trail. Fire-and-forget: an audit
/// failure is logged and never blocks the decision already made.
async fn audit_scan<S: Backend>(
  state: &AppState<S>,
  operator: &Operator,
  exam: &ExamSession,
  response: &ScanResponse,
) where
  S: Clone + Send + Sync + 'static,
{
  let description = match (&response.student, response.admitted) {
    (Some(card), true) => {
      format!("scan admitted {} to {}", card.matricule, exam.unit_code)
    }
    (Some(card), false) => {
      format!("scan denied {} for {}", card.matricule, exam.unit_code)
    }
    (None, _) => format!("scan denied unidentified presenter for {}", exam.unit_code),
  };

  let details = json!({
    "exam_id": exam.exam_id,
    "matricule": response.student.as_ref().map(|c| c.matricule.clone()),
    "admitted": response.admitted,
    "reasons": response.reasons,
    "record_id": response.record_id,
  });

  if let Err(err) = state
    .store
    .append(&operator.name, AuditKind::Scan, &description, details)
    .await
  {
    tracing::warn!(%err, "audit append failed; decision unaffected");
  }
}
