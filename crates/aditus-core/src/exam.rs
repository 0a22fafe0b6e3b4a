//! Exam session types.
//!
//! Sessions are owned by the external Exam Schedule; the core reads them and
//! trusts the scheduling invariants (end after start, no room overlap on a
//! date) enforced at creation time.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::student::AcademicYear;

/// A scheduled examination sitting for one course unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
  pub exam_id:       Uuid,
  /// Course-unit code (e.g. `"IG101"`).
  pub unit_code:     String,
  pub unit_title:    String,
  pub academic_year: AcademicYear,
  pub date:          NaiveDate,
  pub starts_at:     NaiveTime,
  pub ends_at:       NaiveTime,
  pub room:          Option<String>,
  pub proctor:       Option<String>,
}

impl ExamSession {
  /// Scheduled start as a UTC instant.
  pub fn starts(&self) -> DateTime<Utc> {
    self.date.and_time(self.starts_at).and_utc()
  }

  /// Scheduled end as a UTC instant.
  pub fn ends(&self) -> DateTime<Utc> {
    self.date.and_time(self.ends_at).and_utc()
  }

  /// The admission window, widened symmetrically by `tolerance` on each
  /// side. Both bounds are inclusive.
  pub fn admission_window(
    &self,
    tolerance: Duration,
  ) -> (DateTime<Utc>, DateTime<Utc>) {
    (self.starts() - tolerance, self.ends() + tolerance)
  }
}
