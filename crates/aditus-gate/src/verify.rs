//! Public verification endpoint — a preview-only twin of the scan path.
//!
//! External kiosks call this to ask "would this credential be admitted"
//! without consuming the one-time admission slot. It never writes the
//! ledger, so it can be called any number of times before the real scan.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aditus_core::{
  eligibility::{self, DenialReason},
  ledger::{AccessLedger as _, ScanMethod},
  registry::{Backend, ExamSchedule as _},
};

use crate::{
  AppState,
  error::Error,
  scan::{Identification, ScanBody, gather_facts, identify},
};

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub credential: String,
  pub exam_id:    Uuid,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
  pub valid:  bool,
  /// The complete denial reason list joined with `"; "`, absent when valid.
  pub reason: Option<String>,
}

fn denied(reason: impl ToString) -> VerifyResponse {
  VerifyResponse { valid: false, reason: Some(reason.to_string()) }
}

/// `POST /verify` — unauthenticated, non-mutating.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<VerifyBody>,
) -> Result<Json<VerifyResponse>, Error>
where
  S: Backend + Clone + Send + Sync + 'static,
{
  let exam = state
    .store
    .get_exam(body.exam_id)
    .await
    .map_err(Error::Registry)?
    .ok_or(Error::ExamNotFound(body.exam_id))?;

  let now = Utc::now();
  let probe = ScanBody {
    method:     ScanMethod::Credential,
    credential: Some(body.credential),
    matricule:  None,
  };

  let student =
    match identify(&*state.store, &probe, now, state.credential_validity())
      .await?
    {
      Identification::Identified(student) => student,
      Identification::Unidentified(reason) => {
        return Ok(Json(denied(reason)));
      }
    };

  // The preview answers honestly about the consumed slot without touching
  // it.
  match state.store.has_admitted(exam.exam_id, &student.matricule).await {
    Ok(true) => return Ok(Json(denied(DenialReason::AlreadyAdmitted))),
    Ok(false) => {}
    Err(err) => {
      tracing::warn!(%err, "ledger unavailable during preview");
      return Ok(Json(denied(DenialReason::EvaluationUnavailable)));
    }
  }

  let verdict = match gather_facts(&*state.store, &student, &exam).await {
    Ok(facts) => {
      eligibility::evaluate(&facts, &exam, now, state.exam_tolerance())
    }
    Err(err) => {
      tracing::warn!(%err, "registry unavailable during preview");
      return Ok(Json(denied(DenialReason::EvaluationUnavailable)));
    }
  };

  if verdict.admitted {
    Ok(Json(VerifyResponse { valid: true, reason: None }))
  } else {
    Ok(Json(denied(verdict.reason_strings().join("; "))))
  }
}
