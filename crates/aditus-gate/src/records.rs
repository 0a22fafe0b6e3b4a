//! Read endpoints over the Access Ledger for one exam.

use axum::{
  Json,
  extract::{Path, State},
};
use uuid::Uuid;

use aditus_core::{
  ledger::{AccessLedger as _, AccessRecord, ScanTally},
  registry::{Backend, ExamSchedule as _},
};

use crate::{AppState, auth::Operator, error::Error};

/// `GET /exams/{exam_id}/records` — every attempt, newest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path(exam_id): Path<Uuid>,
  _operator: Operator,
) -> Result<Json<Vec<AccessRecord>>, Error>
where
  S: Backend + Clone + Send + Sync + 'static,
{
  ensure_exam(&state, exam_id).await?;

  let records = state
    .store
    .records_for_exam(exam_id)
    .await
    .map_err(Error::Ledger)?;
  Ok(Json(records))
}

/// `GET /exams/{exam_id}/tally` — admitted/denied counters.
pub async fn tally<S>(
  State(state): State<AppState<S>>,
  Path(exam_id): Path<Uuid>,
  _operator: Operator,
) -> Result<Json<ScanTally>, Error>
where
  S: Backend + Clone + Send + Sync + 'static,
{
  ensure_exam(&state, exam_id).await?;

  let tally = state.store.tally(exam_id).await.map_err(Error::Ledger)?;
  Ok(Json(tally))
}

async fn ensure_exam<S: Backend>(
  state: &AppState<S>,
  exam_id: Uuid,
) -> Result<(), Error>
where
  S: Clone + Send + Sync + 'static,
{
  state
    .store
    .get_exam(exam_id)
    .await
    .map_err(Error::Registry)?
    .ok_or(Error::ExamNotFound(exam_id))?;
  Ok(())
}
