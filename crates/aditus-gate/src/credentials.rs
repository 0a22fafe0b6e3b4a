//! Credential issuing and access-secret rotation — registrar operations.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use aditus_core::{
  registry::{AuditKind, AuditTrail as _, Backend, StudentRegistry as _},
  student::Matricule,
};

use crate::{AppState, auth::Operator, error::Error, scan::StudentCard};

#[derive(Debug, Serialize)]
pub struct IssuedCredential {
  pub student:   StudentCard,
  /// The opaque payload to print as a QR code.
  pub payload:   String,
  pub issued_at: DateTime<Utc>,
}

/// `POST /students/{matricule}/credential` — mint a fresh payload bound to
/// the student's current access secret.
pub async fn issue<S>(
  State(state): State<AppState<S>>,
  Path(matricule): Path<String>,
  operator: Operator,
) -> Result<Json<IssuedCredential>, Error>
where
  S: Backend + Clone + Send + Sync + 'static,
{
  operator.require_registrar()?;

  let matricule: Matricule = matricule
    .parse()
    .map_err(|_| Error::BadRequest("invalid matricule".into()))?;

  let student = state
    .store
    .get_by_matricule(&matricule)
    .await
    .map_err(Error::Registry)?
    .ok_or_else(|| Error::StudentNotFound(matricule.to_string()))?;

  let issued_at = Utc::now();
  let payload =
    aditus_token::encode(&student.matricule, &student.access_secret, issued_at);

  audit(
    &state,
    &operator,
    format!("credential issued for {matricule}"),
    json!({ "matricule": matricule }),
  )
  .await;

  Ok(Json(IssuedCredential {
    student: StudentCard::from_student(&student),
    payload,
    issued_at,
  }))
}

/// `POST /students/{matricule}/rotate-secret` — invalidate every
/// outstanding credential for a student.
pub async fn rotate<S>(
  State(state): State<AppState<S>>,
  Path(matricule): Path<String>,
  operator: Operator,
) -> Result<StatusCode, Error>
where
  S: Backend + Clone + Send + Sync + 'static,
{
  operator.require_registrar()?;

  let matricule: Matricule = matricule
    .parse()
    .map_err(|_| Error::BadRequest("invalid matricule".into()))?;

  state
    .store
    .rotate_secret(&matricule)
    .await
    .map_err(Error::Registry)?
    .ok_or_else(|| Error::StudentNotFound(matricule.to_string()))?;

  audit(
    &state,
    &operator,
    format!("access secret rotated for {matricule}"),
    json!({ "matricule": matricule }),
  )
  .await;

  Ok(StatusCode::NO_CONTENT)
}

async fn audit<S: Backend>(
  state: &AppState<S>,
  operator: &Operator,
  description: String,
  details: serde_json::Value,
) where
  S: Clone + Send + Sync + 'static,
{
  if let Err(err) = state
    .store
    .append(&operator.name, AuditKind::Credential, &description, details)
    .await
  {
    tracing::warn!(%err, "audit append failed");
  }
}
