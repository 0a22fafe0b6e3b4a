//! [`SqliteStore`] — the SQLite implementation of the Access Ledger and the
//! registry collaborators.

use std::path::Path;

use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use aditus_core::{
  exam::ExamSession,
  ledger::{
    AccessLedger, AccessRecord, LedgerResult, NewAccessRecord, ScanTally,
  },
  registry::{
    AuditKind, AuditTrail, EnrollmentRegistry, ExamSchedule, PaymentRegistry,
    RegistryResult, StudentRegistry,
  },
  student::{AcademicYear, Matricule, Student, StudentStatus},
};

use crate::{
  Error, Result,
  encode::{
    RawAccessRecord, RawExam, RawStudent, encode_date, encode_dt,
    encode_method, encode_outcome, encode_reasons, encode_time, encode_uuid,
    decode_dt, decode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Aditus store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Seeding (the external collaborators' data-entry surface) ────────────────

/// Input to [`SqliteStore::add_student`]. The access secret and creation
/// timestamp are minted by the store.
#[derive(Debug, Clone)]
pub struct NewStudent {
  pub matricule: Matricule,
  pub full_name: String,
  pub status:    StudentStatus,
  pub program:   String,
  pub level:     String,
}

/// Input to [`SqliteStore::add_exam`]. The exam id is minted by the store.
#[derive(Debug, Clone)]
pub struct NewExam {
  pub unit_code:     String,
  pub unit_title:    String,
  pub academic_year: AcademicYear,
  pub date:          NaiveDate,
  pub starts_at:     NaiveTime,
  pub ends_at:       NaiveTime,
  pub room:          Option<String>,
  pub proctor:       Option<String>,
}

impl SqliteStore {
  /// Create a student record with a freshly minted access secret.
  pub async fn add_student(&self, input: NewStudent) -> Result<Student> {
    let student = Student {
      matricule:     input.matricule,
      full_name:     input.full_name,
      status:        input.status,
      program:       input.program,
      level:         input.level,
      access_secret: Uuid::new_v4(),
      created_at:    Utc::now(),
    };

    let matricule_str = student.matricule.to_string();
    let full_name     = student.full_name.clone();
    let status_str    = student.status.as_str().to_owned();
    let program       = student.program.clone();
    let level         = student.level.clone();
    let secret_str    = encode_uuid(student.access_secret);
    let created_str   = encode_dt(student.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO students (
             matricule, full_name, status, program, level,
             access_secret, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            matricule_str,
            full_name,
            status_str,
            program,
            level,
            secret_str,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(student)
  }

  /// Schedule an exam session.
  pub async fn add_exam(&self, input: NewExam) -> Result<ExamSession> {
    let exam = ExamSession {
      exam_id:       Uuid::new_v4(),
      unit_code:     input.unit_code,
      unit_title:    input.unit_title,
      academic_year: input.academic_year,
      date:          input.date,
      starts_at:     input.starts_at,
      ends_at:       input.ends_at,
      room:          input.room,
      proctor:       input.proctor,
    };

    let exam_id_str = encode_uuid(exam.exam_id);
    let unit_code   = exam.unit_code.clone();
    let unit_title  = exam.unit_title.clone();
    let year_str    = exam.academic_year.to_string();
    let date_str    = encode_date(exam.date);
    let starts_str  = encode_time(exam.starts_at);
    let ends_str    = encode_time(exam.ends_at);
    let room        = exam.room.clone();
    let proctor     = exam.proctor.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO exams (
             exam_id, unit_code, unit_title, academic_year,
             date, starts_at, ends_at, room, proctor
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            exam_id_str,
            unit_code,
            unit_title,
            year_str,
            date_str,
            starts_str,
            ends_str,
            room,
            proctor,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(exam)
  }

  /// Record or update the payment flag for (student, year).
  pub async fn set_payment(
    &self,
    matricule: &Matricule,
    year: &AcademicYear,
    settled: bool,
  ) -> Result<()> {
    let matricule_str = matricule.to_string();
    let year_str = year.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO payments (matricule, academic_year, settled)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (matricule, academic_year)
           DO UPDATE SET settled = excluded.settled",
          rusqlite::params![matricule_str, year_str, settled],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Record or update the exam authorization for (student, unit, year).
  pub async fn set_enrollment(
    &self,
    matricule: &Matricule,
    unit_code: &str,
    year: &AcademicYear,
    exam_authorized: bool,
  ) -> Result<()> {
    let matricule_str = matricule.to_string();
    let unit = unit_code.to_owned();
    let year_str = year.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO enrollments (matricule, unit_code, academic_year, exam_authorized)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (matricule, unit_code, academic_year)
           DO UPDATE SET exam_authorized = excluded.exam_authorized",
          rusqlite::params![matricule_str, unit, year_str, exam_authorized],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Inner queries ───────────────────────────────────────────────────────────

/// Owned column strings for one `access_records` row, movable into a
/// connection closure.
struct AccessRow {
  record_id:   String,
  exam_id:     String,
  matricule:   Option<String>,
  method:      String,
  outcome:     String,
  reasons:     String,
  recorded_by: String,
  scanned_at:  String,
}

impl AccessRow {
  fn from_record(record: &AccessRecord) -> Result<Self> {
    Ok(Self {
      record_id:   encode_uuid(record.record_id),
      exam_id:     encode_uuid(record.exam_id),
      matricule:   record.matricule.as_ref().map(ToString::to_string),
      method:      encode_method(record.method).to_owned(),
      outcome:     encode_outcome(record.outcome).to_owned(),
      reasons:     encode_reasons(&record.reasons)?,
      recorded_by: record.recorded_by.clone(),
      scanned_at:  encode_dt(record.scanned_at),
    })
  }

  fn insert(self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO access_records (
         record_id, exam_id, matricule, method, outcome,
         reasons, recorded_by, scanned_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      rusqlite::params![
        self.record_id,
        self.exam_id,
        self.matricule,
        self.method,
        self.outcome,
        self.reasons,
        self.recorded_by,
        self.scanned_at,
      ],
    )?;
    Ok(())
  }
}

fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

impl SqliteStore {
  async fn fetch_student(
    &self,
    matricule: &Matricule,
  ) -> Result<Option<Student>> {
    let matricule_str = matricule.to_string();

    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT matricule, full_name, status, program, level,
                      access_secret, created_at
               FROM students WHERE matricule = ?1",
              rusqlite::params![matricule_str],
              |row| {
                Ok(RawStudent {
                  matricule:     row.get(0)?,
                  full_name:     row.get(1)?,
                  status:        row.get(2)?,
                  program:       row.get(3)?,
                  level:         row.get(4)?,
                  access_secret: row.get(5)?,
                  created_at:    row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStudent::into_student).transpose()
  }

  async fn rotate_secret_inner(
    &self,
    matricule: &Matricule,
  ) -> Result<Option<Uuid>> {
    let new_secret = Uuid::new_v4();
    let secret_str = encode_uuid(new_secret);
    let matricule_str = matricule.to_string();

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE students SET access_secret = ?1 WHERE matricule = ?2",
          rusqlite::params![secret_str, matricule_str],
        )?)
      })
      .await?;

    Ok((changed > 0).then_some(new_secret))
  }

  async fn payment_settled(
    &self,
    matricule: &Matricule,
    year: &AcademicYear,
  ) -> Result<bool> {
    let matricule_str = matricule.to_string();
    let year_str = year.to_string();

    let settled: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT settled FROM payments
               WHERE matricule = ?1 AND academic_year = ?2",
              rusqlite::params![matricule_str, year_str],
              |row| row.get(0),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(settled)
  }

  async fn enrollment_authorized(
    &self,
    matricule: &Matricule,
    unit_code: &str,
    year: &AcademicYear,
  ) -> Result<bool> {
    let matricule_str = matricule.to_string();
    let unit = unit_code.to_owned();
    let year_str = year.to_string();

    let authorized: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT exam_authorized FROM enrollments
               WHERE matricule = ?1 AND unit_code = ?2 AND academic_year = ?3",
              rusqlite::params![matricule_str, unit, year_str],
              |row| row.get(0),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(authorized)
  }

  async fn fetch_exam(&self, exam_id: Uuid) -> Result<Option<ExamSession>> {
    let exam_id_str = encode_uuid(exam_id);

    let raw: Option<RawExam> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT exam_id, unit_code, unit_title, academic_year,
                      date, starts_at, ends_at, room, proctor
               FROM exams WHERE exam_id = ?1",
              rusqlite::params![exam_id_str],
              |row| {
                Ok(RawExam {
                  exam_id:       row.get(0)?,
                  unit_code:     row.get(1)?,
                  unit_title:    row.get(2)?,
                  academic_year: row.get(3)?,
                  date:          row.get(4)?,
                  starts_at:     row.get(5)?,
                  ends_at:       row.get(6)?,
                  room:          row.get(7)?,
                  proctor:       row.get(8)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawExam::into_exam).transpose()
  }

  async fn record_inner(
    &self,
    input: NewAccessRecord,
  ) -> Result<AccessRecord> {
    let record = AccessRecord {
      record_id:   Uuid::new_v4(),
      exam_id:     input.exam_id,
      matricule:   input.matricule,
      method:      input.method,
      outcome:     input.outcome,
      reasons:     input.reasons,
      recorded_by: input.recorded_by,
      scanned_at:  Utc::now(),
    };

    match record.matricule.clone() {
      Some(matricule) => self.insert_identified(record, matricule).await,
      // Nothing to deduplicate against: every unidentified attempt is its
      // own row.
      None => self.insert_unchecked(record).await,
    }
  }

  async fn insert_identified(
    &self,
    record: AccessRecord,
    matricule: Matricule,
  ) -> Result<AccessRecord> {
    let row = AccessRow::from_record(&record)?;
    let exam_id_str = row.exam_id.clone();
    let matricule_str = matricule.to_string();

    let result: std::result::Result<bool, tokio_rusqlite::Error> = self
      .conn
      .call(move |conn| {
        // Admission is a one-time event: any attempt for a pair that
        // already holds an admitted row is rejected before insert. The
        // partial UNIQUE index backstops the admitted/admitted race from
        // other gate processes sharing the file.
        let already: bool = conn
          .query_row(
            "SELECT 1 FROM access_records
             WHERE exam_id = ?1 AND matricule = ?2 AND outcome = 'admitted'",
            rusqlite::params![exam_id_str, matricule_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if already {
          return Ok(false);
        }
        row.insert(conn)?;
        Ok(true)
      })
      .await;

    match result {
      Ok(true) => Ok(record),
      Ok(false) => Err(Error::DuplicateScan {
        exam_id: record.exam_id,
        matricule,
      }),
      Err(ref e) if is_unique_violation(e) => Err(Error::DuplicateScan {
        exam_id: record.exam_id,
        matricule,
      }),
      Err(e) => Err(e.into()),
    }
  }

  async fn insert_unchecked(
    &self,
    record: AccessRecord,
  ) -> Result<AccessRecord> {
    let row = AccessRow::from_record(&record)?;
    self
      .conn
      .call(move |conn| {
        row.insert(conn)?;
        Ok(())
      })
      .await?;
    Ok(record)
  }

  async fn admitted_row(
    &self,
    exam_id: Uuid,
    matricule: &Matricule,
  ) -> Result<Option<AccessRecord>> {
    let exam_id_str = encode_uuid(exam_id);
    let matricule_str = matricule.to_string();

    let raw: Option<RawAccessRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT record_id, exam_id, matricule, method, outcome,
                      reasons, recorded_by, scanned_at
               FROM access_records
               WHERE exam_id = ?1 AND matricule = ?2 AND outcome = 'admitted'",
              rusqlite::params![exam_id_str, matricule_str],
              access_record_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccessRecord::into_record).transpose()
  }

  async fn records_inner(&self, exam_id: Uuid) -> Result<Vec<AccessRecord>> {
    let exam_id_str = encode_uuid(exam_id);

    let raws: Vec<RawAccessRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT record_id, exam_id, matricule, method, outcome,
                  reasons, recorded_by, scanned_at
           FROM access_records
           WHERE exam_id = ?1
           ORDER BY scanned_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![exam_id_str], access_record_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccessRecord::into_record).collect()
  }

  async fn tally_inner(&self, exam_id: Uuid) -> Result<ScanTally> {
    let exam_id_str = encode_uuid(exam_id);

    let (admitted, denied): (i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT
             COUNT(*) FILTER (WHERE outcome = 'admitted'),
             COUNT(*) FILTER (WHERE outcome = 'denied')
           FROM access_records WHERE exam_id = ?1",
          rusqlite::params![exam_id_str],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(ScanTally { admitted: admitted as u64, denied: denied as u64 })
  }

  async fn append_audit(
    &self,
    actor: &str,
    kind: AuditKind,
    description: &str,
    details: serde_json::Value,
  ) -> Result<()> {
    let entry_id_str = encode_uuid(Uuid::new_v4());
    let actor = actor.to_owned();
    let kind_str = kind.as_str().to_owned();
    let action = description.to_owned();
    let details_str = details.to_string();
    let recorded_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_log (entry_id, actor, kind, action, details, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            entry_id_str,
            actor,
            kind_str,
            action,
            details_str,
            recorded_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The most recent audit entries, newest first. Operational read; not
  /// part of the core traits.
  pub async fn recent_audit_entries(
    &self,
    limit: usize,
  ) -> Result<Vec<AuditEntry>> {
    let limit = limit as i64;

    let raws: Vec<(String, String, String, String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, actor, kind, action, details, recorded_at
           FROM audit_log
           ORDER BY recorded_at DESC, rowid DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok((
              row.get(0)?,
              row.get(1)?,
              row.get(2)?,
              row.get(3)?,
              row.get(4)?,
              row.get(5)?,
            ))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(entry_id, actor, kind, action, details, recorded_at)| {
        Ok(AuditEntry {
          entry_id: decode_uuid(&entry_id)?,
          actor,
          kind,
          action,
          details: serde_json::from_str(&details)?,
          recorded_at: decode_dt(&recorded_at)?,
        })
      })
      .collect()
  }
}

/// One row of the audit log, as read back for operational inspection.
#[derive(Debug, Clone)]
pub struct AuditEntry {
  pub entry_id:    Uuid,
  pub actor:       String,
  pub kind:        String,
  pub action:      String,
  pub details:     serde_json::Value,
  pub recorded_at: chrono::DateTime<Utc>,
}

fn access_record_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawAccessRecord> {
  Ok(RawAccessRecord {
    record_id:   row.get(0)?,
    exam_id:     row.get(1)?,
    matricule:   row.get(2)?,
    method:      row.get(3)?,
    outcome:     row.get(4)?,
    reasons:     row.get(5)?,
    recorded_by: row.get(6)?,
    scanned_at:  row.get(7)?,
  })
}

// ─── Trait impls ─────────────────────────────────────────────────────────────

impl StudentRegistry for SqliteStore {
  async fn get_by_matricule(
    &self,
    matricule: &Matricule,
  ) -> RegistryResult<Option<Student>> {
    self
      .fetch_student(matricule)
      .await
      .map_err(Error::into_registry)
  }

  async fn rotate_secret(
    &self,
    matricule: &Matricule,
  ) -> RegistryResult<Option<Uuid>> {
    self
      .rotate_secret_inner(matricule)
      .await
      .map_err(Error::into_registry)
  }
}

impl PaymentRegistry for SqliteStore {
  async fn is_settled(
    &self,
    matricule: &Matricule,
    year: &AcademicYear,
  ) -> RegistryResult<bool> {
    self
      .payment_settled(matricule, year)
      .await
      .map_err(Error::into_registry)
  }
}

impl EnrollmentRegistry for SqliteStore {
  async fn is_exam_authorized(
    &self,
    matricule: &Matricule,
    unit_code: &str,
    year: &AcademicYear,
  ) -> RegistryResult<bool> {
    self
      .enrollment_authorized(matricule, unit_code, year)
      .await
      .map_err(Error::into_registry)
  }
}

impl ExamSchedule for SqliteStore {
  async fn get_exam(
    &self,
    exam_id: Uuid,
  ) -> RegistryResult<Option<ExamSession>> {
    self.fetch_exam(exam_id).await.map_err(Error::into_registry)
  }
}

impl AccessLedger for SqliteStore {
  async fn record(
    &self,
    input: NewAccessRecord,
  ) -> LedgerResult<AccessRecord> {
    self.record_inner(input).await.map_err(Error::into_ledger)
  }

  async fn has_admitted(
    &self,
    exam_id: Uuid,
    matricule: &Matricule,
  ) -> LedgerResult<bool> {
    self
      .admitted_row(exam_id, matricule)
      .await
      .map(|r| r.is_some())
      .map_err(Error::into_ledger)
  }

  async fn admitted_record(
    &self,
    exam_id: Uuid,
    matricule: &Matricule,
  ) -> LedgerResult<Option<AccessRecord>> {
    self
      .admitted_row(exam_id, matricule)
      .await
      .map_err(Error::into_ledger)
  }

  async fn records_for_exam(
    &self,
    exam_id: Uuid,
  ) -> LedgerResult<Vec<AccessRecord>> {
    self.records_inner(exam_id).await.map_err(Error::into_ledger)
  }

  async fn tally(&self, exam_id: Uuid) -> LedgerResult<ScanTally> {
    self.tally_inner(exam_id).await.map_err(Error::into_ledger)
  }
}

impl AuditTrail for SqliteStore {
  async fn append(
    &self,
    actor: &str,
    kind: AuditKind,
    description: &str,
    details: serde_json::Value,
  ) -> RegistryResult<()> {
    self
      .append_audit(actor, kind, description, details)
      .await
      .map_err(Error::into_registry)
  }
}
