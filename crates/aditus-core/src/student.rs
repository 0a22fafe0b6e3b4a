//! Student identity types.
//!
//! Students are owned by the external Student Registry; the core only reads
//! them. The registry is also the sole owner of the access secret — a random
//! value minted at creation and rotatable independently of every public
//! field.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Matricule ───────────────────────────────────────────────────────────────

/// Globally unique, immutable student identity key.
///
/// Uppercase letters, digits and dashes only; validated on parse so a
/// malformed scan input can never masquerade as an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matricule(String);

impl Matricule {
  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for Matricule {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    if s.is_empty()
      || !s
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
      return Err(Error::InvalidMatricule(s.to_string()));
    }
    Ok(Self(s.to_string()))
  }
}

impl fmt::Display for Matricule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Academic year ───────────────────────────────────────────────────────────

/// An academic year in `YYYY-YYYY` form; the second year must be the first
/// plus one (e.g. `2024-2025`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcademicYear(String);

impl AcademicYear {
  pub fn as_str(&self) -> &str { &self.0 }
}

impl FromStr for AcademicYear {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let invalid = || Error::InvalidAcademicYear(s.to_string());

    let (start, end) = s.split_once('-').ok_or_else(invalid)?;
    if start.len() != 4 || end.len() != 4 {
      return Err(invalid());
    }
    let start: u32 = start.parse().map_err(|_| invalid())?;
    let end: u32 = end.parse().map_err(|_| invalid())?;
    if end != start + 1 {
      return Err(invalid());
    }
    Ok(Self(s.to_string()))
  }
}

impl fmt::Display for AcademicYear {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Administrative standing of a student. Only `Active` students are ever
/// admitted to an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
  Active,
  Suspended,
  Excluded,
  Graduated,
}

impl StudentStatus {
  /// The stable string stored in the database and echoed in denial reasons.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Suspended => "suspended",
      Self::Excluded => "excluded",
      Self::Graduated => "graduated",
    }
  }
}

impl FromStr for StudentStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "active" => Ok(Self::Active),
      "suspended" => Ok(Self::Suspended),
      "excluded" => Ok(Self::Excluded),
      "graduated" => Ok(Self::Graduated),
      other => Err(Error::UnknownStudentStatus(other.to_string())),
    }
  }
}

// ─── Student ─────────────────────────────────────────────────────────────────

/// A student record as read from the Student Registry.
///
/// `access_secret` never leaves the trust boundary: credentials embed a
/// digest reference to it, not the value itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
  pub matricule:     Matricule,
  pub full_name:     String,
  pub status:        StudentStatus,
  /// Program of study code (e.g. `"IG"`).
  pub program:       String,
  /// Level code within the program (e.g. `"L1"`).
  pub level:         String,
  pub access_secret: Uuid,
  pub created_at:    DateTime<Utc>,
}
