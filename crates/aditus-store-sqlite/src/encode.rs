//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates and times in their ISO
//! forms, reason lists as compact JSON arrays. UUIDs are stored as
//! hyphenated lowercase strings.

use aditus_core::{
  exam::ExamSession,
  ledger::{AccessRecord, Outcome, ScanMethod},
  student::{AcademicYear, Matricule, Student, StudentStatus},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate / NaiveTime ───────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<StudentStatus> {
  Ok(s.parse::<StudentStatus>()?)
}

pub fn encode_method(m: ScanMethod) -> &'static str { m.as_str() }

pub fn decode_method(s: &str) -> Result<ScanMethod> {
  match s {
    "credential" => Ok(ScanMethod::Credential),
    "matricule" => Ok(ScanMethod::Matricule),
    "manual" => Ok(ScanMethod::Manual),
    other => Err(aditus_core::Error::UnknownScanMethod(other.to_string()).into()),
  }
}

pub fn encode_outcome(o: Outcome) -> &'static str { o.as_str() }

pub fn decode_outcome(s: &str) -> Result<Outcome> {
  match s {
    "admitted" => Ok(Outcome::Admitted),
    "denied" => Ok(Outcome::Denied),
    other => Err(Error::DateParse(format!("unknown outcome: {other:?}"))),
  }
}

// ─── Reason lists ────────────────────────────────────────────────────────────

pub fn encode_reasons(reasons: &[String]) -> Result<String> {
  Ok(serde_json::to_string(reasons)?)
}

pub fn decode_reasons(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `students` row.
pub struct RawStudent {
  pub matricule:     String,
  pub full_name:     String,
  pub status:        String,
  pub program:       String,
  pub level:         String,
  pub access_secret: String,
  pub created_at:    String,
}

impl RawStudent {
  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      matricule:     self.matricule.parse::<Matricule>()?,
      full_name:     self.full_name,
      status:        decode_status(&self.status)?,
      program:       self.program,
      level:         self.level,
      access_secret: decode_uuid(&self.access_secret)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `exams` row.
pub struct RawExam {
  pub exam_id:       String,
  pub unit_code:     String,
  pub unit_title:    String,
  pub academic_year: String,
  pub date:          String,
  pub starts_at:     String,
  pub ends_at:       String,
  pub room:          Option<String>,
  pub proctor:       Option<String>,
}

impl RawExam {
  pub fn into_exam(self) -> Result<ExamSession> {
    Ok(ExamSession {
      exam_id:       decode_uuid(&self.exam_id)?,
      unit_code:     self.unit_code,
      unit_title:    self.unit_title,
      academic_year: self.academic_year.parse::<AcademicYear>()?,
      date:          decode_date(&self.date)?,
      starts_at:     decode_time(&self.starts_at)?,
      ends_at:       decode_time(&self.ends_at)?,
      room:          self.room,
      proctor:       self.proctor,
    })
  }
}

/// Raw strings read directly from an `access_records` row.
pub struct RawAccessRecord {
  pub record_id:   String,
  pub exam_id:     String,
  pub matricule:   Option<String>,
  pub method:      String,
  pub outcome:     String,
  pub reasons:     String,
  pub recorded_by: String,
  pub scanned_at:  String,
}

impl RawAccessRecord {
  pub fn into_record(self) -> Result<AccessRecord> {
    let matricule = self
      .matricule
      .as_deref()
      .map(str::parse::<Matricule>)
      .transpose()?;

    Ok(AccessRecord {
      record_id: decode_uuid(&self.record_id)?,
      exam_id: decode_uuid(&self.exam_id)?,
      matricule,
      method: decode_method(&self.method)?,
      outcome: decode_outcome(&self.outcome)?,
      reasons: decode_reasons(&self.reasons)?,
      recorded_by: self.recorded_by,
      scanned_at: decode_dt(&self.scanned_at)?,
    })
  }
}
