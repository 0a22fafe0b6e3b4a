//! HTTP layer for the Aditus exam-admission gate.
//!
//! Exposes an axum [`Router`] implementing the scan, preview, credential
//! and ledger-read endpoints, backed by any
//! [`Backend`](aditus_core::registry::Backend).

pub mod auth;
pub mod credentials;
pub mod error;
pub mod ratelimit;
pub mod records;
pub mod scan;
pub mod verify;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{get, post},
};
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use aditus_core::registry::Backend;
use auth::{AuthConfig, OperatorEntry};
use ratelimit::RateLimiter;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_tolerance_minutes() -> i64 { 30 }
fn default_validity_minutes() -> i64 { 30 }
fn default_scan_rate_limit() -> u32 { 50 }

/// Runtime server configuration, deserialised from `config.toml` plus
/// `ADITUS_*` environment overrides.
///
/// The exam-window tolerance and the credential validity are deliberately
/// two independent knobs: one widens the door, the other ages the QR code.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,

  #[serde(default = "default_tolerance_minutes")]
  pub exam_window_tolerance_minutes: i64,

  #[serde(default = "default_validity_minutes")]
  pub credential_validity_minutes: i64,

  #[serde(default = "default_scan_rate_limit")]
  pub scan_rate_limit_per_minute: u32,

  pub operators: Vec<OperatorEntry>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Backend> {
  pub store:   Arc<S>,
  pub config:  Arc<ServerConfig>,
  pub auth:    Arc<AuthConfig>,
  pub limiter: Arc<RateLimiter>,
}

impl<S: Backend> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let auth = AuthConfig { operators: config.operators.clone() };
    let limiter = RateLimiter::new(config.scan_rate_limit_per_minute);
    Self {
      store:   Arc::new(store),
      auth:    Arc::new(auth),
      limiter: Arc::new(limiter),
      config:  Arc::new(config),
    }
  }

  pub fn exam_tolerance(&self) -> Duration {
    Duration::minutes(self.config.exam_window_tolerance_minutes)
  }

  pub fn credential_validity(&self) -> Duration {
    Duration::minutes(self.config.credential_validity_minutes)
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the gate.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: Backend + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/healthz", get(health))
    .route("/verify", post(verify::handler::<S>))
    .route("/exams/{exam_id}/scan", post(scan::handler::<S>))
    .route("/exams/{exam_id}/records", get(records::list::<S>))
    .route("/exams/{exam_id}/tally", get(records::tally::<S>))
    .route(
      "/students/{matricule}/credential",
      post(credentials::issue::<S>),
    )
    .route(
      "/students/{matricule}/rotate-secret",
      post(credentials::rotate::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
  Json(json!({ "status": "ok" }))
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use chrono::{Days, NaiveTime, Utc};
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use aditus_core::{
    exam::ExamSession,
    ledger::{AccessLedger, AccessRecord, LedgerResult, NewAccessRecord, ScanTally},
    registry::{
      AuditKind, AuditTrail, EnrollmentRegistry, ExamSchedule,
      PaymentRegistry, RegistryError, RegistryResult, StudentRegistry,
    },
    student::{AcademicYear, Matricule, Student, StudentStatus},
  };
  use aditus_store_sqlite::{NewExam, NewStudent, SqliteStore};

  use crate::auth::Role;

  // ── Fixtures ───────────────────────────────────────────────────────────────

  fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn test_config(scan_rate_limit: u32) -> ServerConfig {
    ServerConfig {
      host: "127.0.0.1".to_string(),
      port: 8090,
      store_path: PathBuf::from(":memory:"),
      exam_window_tolerance_minutes: 30,
      credential_validity_minutes: 30,
      scan_rate_limit_per_minute: scan_rate_limit,
      operators: vec![
        OperatorEntry {
          name:          "station-1".into(),
          password_hash: hash("scan-pass"),
          role:          Role::Proctor,
        },
        OperatorEntry {
          name:          "registrar".into(),
          password_hash: hash("admin-pass"),
          role:          Role::Registrar,
        },
      ],
    }
  }

  async fn make_state(scan_rate_limit: u32) -> (AppState<SqliteStore>, SqliteStore) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(store.clone(), test_config(scan_rate_limit));
    (state, store)
  }

  fn matricule(s: &str) -> Matricule { s.parse().unwrap() }

  fn year() -> AcademicYear { "2024-2025".parse().unwrap() }

  async fn seed_student(store: &SqliteStore, m: &str) -> Student {
    store
      .add_student(NewStudent {
        matricule: matricule(m),
        full_name: "Alice Liddell".into(),
        status:    StudentStatus::Active,
        program:   "IG".into(),
        level:     "L1".into(),
      })
      .await
      .unwrap()
  }

  /// An exam whose admission window covers the whole of today.
  async fn seed_exam_today(store: &SqliteStore) -> ExamSession {
    store
      .add_exam(NewExam {
        unit_code:     "IG101".into(),
        unit_title:    "Introduction to Computing".into(),
        academic_year: year(),
        date:          Utc::now().date_naive(),
        starts_at:     NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        ends_at:       NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        room:          Some("B204".into()),
        proctor:       Some("dr-okafor".into()),
      })
      .await
      .unwrap()
  }

  /// A fully eligible student + today's exam.
  async fn seed_eligible(store: &SqliteStore, m: &str) -> (Student, ExamSession) {
    let student = seed_student(store, m).await;
    let exam = seed_exam_today(store).await;
    store
      .set_payment(&student.matricule, &year(), true)
      .await
      .unwrap();
    store
      .set_enrollment(&student.matricule, "IG101", &year(), true)
      .await
      .unwrap();
    (student, exam)
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn send<S>(
    state: AppState<S>,
    method: &str,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Option<Value>,
  ) -> (StatusCode, Value)
  where
    S: Backend + Clone + Send + Sync + 'static,
  {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, pass)) = auth {
      builder =
        builder.header(header::AUTHORIZATION, auth_header(user, pass));
    }
    let request = match body {
      Some(value) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(value.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn scan(
    state: &AppState<SqliteStore>,
    exam_id: Uuid,
    body: Value,
  ) -> (StatusCode, Value) {
    send(
      state.clone(),
      "POST",
      &format!("/exams/{exam_id}/scan"),
      Some(("station-1", "scan-pass")),
      Some(body),
    )
    .await
  }

  async fn issue_credential(
    state: &AppState<SqliteStore>,
    m: &str,
  ) -> String {
    let (status, body) = send(
      state.clone(),
      "POST",
      &format!("/students/{m}/credential"),
      Some(("registrar", "admin-pass")),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["payload"].as_str().unwrap().to_string()
  }

  // ── Health and auth ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn healthz_is_public() {
    let (state, _) = make_state(50).await;
    let (status, body) = send(state, "GET", "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  #[tokio::test]
  async fn scan_without_auth_is_401() {
    let (state, store) = make_state(50).await;
    let exam = seed_exam_today(&store).await;

    let (status, _) = send(
      state,
      "POST",
      &format!("/exams/{}/scan", exam.exam_id),
      None,
      Some(json!({ "method": "matricule", "matricule": "ETU-001" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn proctor_cannot_issue_credentials() {
    let (state, store) = make_state(50).await;
    seed_student(&store, "ETU-001").await;

    let (status, _) = send(
      state,
      "POST",
      "/students/ETU-001/credential",
      Some(("station-1", "scan-pass")),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  // ── Scan path ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_exam_is_404_not_a_denial() {
    let (state, store) = make_state(50).await;
    seed_student(&store, "ETU-001").await;

    let (status, _) = scan(
      &state,
      Uuid::new_v4(),
      json!({ "method": "matricule", "matricule": "ETU-001" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn credential_scan_admits_then_short_circuits() {
    let (state, store) = make_state(50).await;
    let (_, exam) = seed_eligible(&store, "ETU-001").await;
    let payload = issue_credential(&state, "ETU-001").await;

    let (status, body) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "credential", "credential": payload }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], json!(true));
    assert_eq!(body["reasons"], json!([]));
    assert_eq!(body["student"]["matricule"], "ETU-001");

    // Second presentation of the same credential: benign no-op denial.
    let (status, body) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "credential", "credential": payload }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], json!(false));
    assert_eq!(body["reasons"], json!(["already-admitted"]));

    // Exactly one ledger row.
    let records = store.records_for_exam(exam.exam_id).await.unwrap();
    assert_eq!(records.len(), 1);
  }

  #[tokio::test]
  async fn matricule_scan_admits() {
    let (state, store) = make_state(50).await;
    let (_, exam) = seed_eligible(&store, "ETU-001").await;

    let (status, body) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "matricule", "matricule": "ETU-001" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], json!(true));
  }

  #[tokio::test]
  async fn unknown_matricule_is_recorded_unidentified() {
    let (state, store) = make_state(50).await;
    let exam = seed_exam_today(&store).await;

    let (status, body) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "matricule", "matricule": "GHOST-999" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], json!(false));
    assert_eq!(body["reasons"], json!(["unknown-matricule"]));
    assert_eq!(body["student"], Value::Null);

    // The attempt is still in the ledger, keyed to no student.
    let records = store.records_for_exam(exam.exam_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].matricule.is_none());
  }

  #[tokio::test]
  async fn malformed_credential_is_recorded_unidentified() {
    let (state, store) = make_state(50).await;
    let exam = seed_exam_today(&store).await;

    let (status, body) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "credential", "credential": "!!!garbage!!!" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reasons"], json!(["invalid-credential"]));

    let records = store.records_for_exam(exam.exam_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].matricule.is_none());
  }

  #[tokio::test]
  async fn rotation_invalidates_outstanding_credentials() {
    let (state, store) = make_state(50).await;
    let (_, exam) = seed_eligible(&store, "ETU-001").await;
    let payload = issue_credential(&state, "ETU-001").await;

    let (status, _) = send(
      state.clone(),
      "POST",
      "/students/ETU-001/rotate-secret",
      Some(("registrar", "admin-pass")),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "credential", "credential": payload }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reasons"], json!(["invalid-credential"]));
  }

  #[tokio::test]
  async fn stale_credential_is_denied() {
    let (state, store) = make_state(50).await;
    let (student, exam) = seed_eligible(&store, "ETU-001").await;

    // Issued 31 minutes ago, one past the default validity window.
    let stale = aditus_token::encode(
      &student.matricule,
      &student.access_secret,
      Utc::now() - chrono::Duration::minutes(31),
    );

    let (status, body) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "credential", "credential": stale }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reasons"], json!(["invalid-credential"]));
  }

  #[tokio::test]
  async fn denial_reasons_are_complete() {
    let (state, store) = make_state(50).await;
    let exam = seed_exam_today(&store).await;
    store
      .add_student(NewStudent {
        matricule: matricule("ETU-002"),
        full_name: "Bob Martin".into(),
        status:    StudentStatus::Suspended,
        program:   "IG".into(),
        level:     "L1".into(),
      })
      .await
      .unwrap();
    // No payment, no enrollment.

    let (status, body) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "matricule", "matricule": "ETU-002" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body["reasons"],
      json!(["status:suspended", "payment-unsettled", "not-authorized"])
    );
  }

  #[tokio::test]
  async fn out_of_window_scans_are_denied() {
    let (state, store) = make_state(50).await;
    let student = seed_student(&store, "ETU-001").await;
    store
      .set_payment(&student.matricule, &year(), true)
      .await
      .unwrap();
    store
      .set_enrollment(&student.matricule, "IG101", &year(), true)
      .await
      .unwrap();

    let future = store
      .add_exam(NewExam {
        unit_code:     "IG101".into(),
        unit_title:    "Introduction to Computing".into(),
        academic_year: year(),
        date:          Utc::now().date_naive() + Days::new(2),
        starts_at:     NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        ends_at:       NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        room:          None,
        proctor:       None,
      })
      .await
      .unwrap();
    let past = store
      .add_exam(NewExam {
        unit_code:     "IG101".into(),
        unit_title:    "Introduction to Computing".into(),
        academic_year: year(),
        date:          Utc::now().date_naive() - Days::new(2),
        starts_at:     NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        ends_at:       NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        room:          None,
        proctor:       None,
      })
      .await
      .unwrap();

    let (_, body) = scan(
      &state,
      future.exam_id,
      json!({ "method": "matricule", "matricule": "ETU-001" }),
    )
    .await;
    assert_eq!(body["reasons"], json!(["too-early"]));

    let (_, body) = scan(
      &state,
      past.exam_id,
      json!({ "method": "matricule", "matricule": "ETU-001" }),
    )
    .await;
    assert_eq!(body["reasons"], json!(["too-late"]));
  }

  #[tokio::test]
  async fn scan_rate_limit_returns_429() {
    let (state, store) = make_state(2).await;
    let (_, exam) = seed_eligible(&store, "ETU-001").await;

    for _ in 0..2 {
      let (status, _) = scan(
        &state,
        exam.exam_id,
        json!({ "method": "matricule", "matricule": "GHOST-1" }),
      )
      .await;
      assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "matricule", "matricule": "GHOST-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Rejected attempts leave no ledger rows.
    let records = store.records_for_exam(exam.exam_id).await.unwrap();
    assert_eq!(records.len(), 2);
  }

  // ── Preview path ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn preview_never_consumes_the_admission_slot() {
    let (state, store) = make_state(50).await;
    let (_, exam) = seed_eligible(&store, "ETU-001").await;
    let payload = issue_credential(&state, "ETU-001").await;

    for _ in 0..3 {
      let (status, body) = send(
        state.clone(),
        "POST",
        "/verify",
        None,
        Some(json!({ "credential": payload, "exam_id": exam.exam_id })),
      )
      .await;
      assert_eq!(status, StatusCode::OK);
      assert_eq!(body["valid"], json!(true));
      assert_eq!(body["reason"], Value::Null);
    }

    // No ledger writes happened.
    assert!(store.records_for_exam(exam.exam_id).await.unwrap().is_empty());

    // The real scan still succeeds afterwards.
    let (_, body) = scan(
      &state,
      exam.exam_id,
      json!({ "method": "credential", "credential": payload }),
    )
    .await;
    assert_eq!(body["admitted"], json!(true));

    // And the preview now reports the consumed slot.
    let (_, body) = send(
      state.clone(),
      "POST",
      "/verify",
      None,
      Some(json!({ "credential": payload, "exam_id": exam.exam_id })),
    )
    .await;
    assert_eq!(body["valid"], json!(false));
    assert_eq!(body["reason"], "already-admitted");
  }

  #[tokio::test]
  async fn preview_reports_the_full_reason_list() {
    let (state, store) = make_state(50).await;
    let student = seed_student(&store, "ETU-001").await;
    let exam = seed_exam_today(&store).await;
    // No payment, no enrollment.
    let payload = aditus_token::encode(
      &student.matricule,
      &student.access_secret,
      Utc::now(),
    );

    let (_, body) = send(
      state,
      "POST",
      "/verify",
      None,
      Some(json!({ "credential": payload, "exam_id": exam.exam_id })),
    )
    .await;
    assert_eq!(body["valid"], json!(false));
    assert_eq!(body["reason"], "payment-unsettled; not-authorized");
  }

  // ── Ledger reads ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn records_and_tally_reads() {
    let (state, store) = make_state(50).await;
    let (_, exam) = seed_eligible(&store, "ETU-001").await;

    scan(
      &state,
      exam.exam_id,
      json!({ "method": "matricule", "matricule": "ETU-001" }),
    )
    .await;
    scan(
      &state,
      exam.exam_id,
      json!({ "method": "matricule", "matricule": "GHOST-1" }),
    )
    .await;

    let (status, body) = send(
      state.clone(),
      "GET",
      &format!("/exams/{}/records", exam.exam_id),
      Some(("station-1", "scan-pass")),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
      state,
      "GET",
      &format!("/exams/{}/tally", exam.exam_id),
      Some(("station-1", "scan-pass")),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], json!(1));
    assert_eq!(body["denied"], json!(1));
  }

  // ── Fail closed ────────────────────────────────────────────────────────────

  /// A backend whose payment registry is down; everything else delegates
  /// to a real in-memory store.
  #[derive(Clone)]
  struct FailingPayments {
    inner: SqliteStore,
  }

  impl StudentRegistry for FailingPayments {
    async fn get_by_matricule(
      &self,
      matricule: &Matricule,
    ) -> RegistryResult<Option<Student>> {
      self.inner.get_by_matricule(matricule).await
    }

    async fn rotate_secret(
      &self,
      matricule: &Matricule,
    ) -> RegistryResult<Option<Uuid>> {
      self.inner.rotate_secret(matricule).await
    }
  }

  impl PaymentRegistry for FailingPayments {
    async fn is_settled(
      &self,
      _matricule: &Matricule,
      _year: &AcademicYear,
    ) -> RegistryResult<bool> {
      Err(RegistryError::Unavailable("payment registry offline".into()))
    }
  }

  impl EnrollmentRegistry for FailingPayments {
    async fn is_exam_authorized(
      &self,
      matricule: &Matricule,
      unit_code: &str,
      year: &AcademicYear,
    ) -> RegistryResult<bool> {
      self.inner.is_exam_authorized(matricule, unit_code, year).await
    }
  }

  impl ExamSchedule for FailingPayments {
    async fn get_exam(
      &self,
      exam_id: Uuid,
    ) -> RegistryResult<Option<ExamSession>> {
      self.inner.get_exam(exam_id).await
    }
  }

  impl AccessLedger for FailingPayments {
    async fn record(
      &self,
      input: NewAccessRecord,
    ) -> LedgerResult<AccessRecord> {
      self.inner.record(input).await
    }

    async fn has_admitted(
      &self,
      exam_id: Uuid,
      matricule: &Matricule,
    ) -> LedgerResult<bool> {
      self.inner.has_admitted(exam_id, matricule).await
    }

    async fn admitted_record(
      &self,
      exam_id: Uuid,
      matricule: &Matricule,
    ) -> LedgerResult<Option<AccessRecord>> {
      self.inner.admitted_record(exam_id, matricule).await
    }

    async fn records_for_exam(
      &self,
      exam_id: Uuid,
    ) -> LedgerResult<Vec<AccessRecord>> {
      self.inner.records_for_exam(exam_id).await
    }

    async fn tally(&self, exam_id: Uuid) -> LedgerResult<ScanTally> {
      self.inner.tally(exam_id).await
    }
  }

  impl AuditTrail for FailingPayments {
    async fn append(
      &self,
      actor: &str,
      kind: AuditKind,
      description: &str,
      details: Value,
    ) -> RegistryResult<()> {
      self.inner.append(actor, kind, description, details).await
    }
  }

  #[tokio::test]
  async fn registry_failure_fails_closed() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let (_, exam) = seed_eligible(&store, "ETU-001").await;
    let state =
      AppState::new(FailingPayments { inner: store.clone() }, test_config(50));

    let (status, body) = send(
      state,
      "POST",
      &format!("/exams/{}/scan", exam.exam_id),
      Some(("station-1", "scan-pass")),
      Some(json!({ "method": "matricule", "matricule": "ETU-001" })),
    )
    .await;

    // Denied, never admitted, and the denial is on the record.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admitted"], json!(false));
    assert_eq!(body["reasons"], json!(["evaluation-unavailable"]));

    let records = store.records_for_exam(exam.exam_id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reasons, vec!["evaluation-unavailable"]);
  }
}
