//! SQL schema for the Aditus SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS students (
    matricule     TEXT PRIMARY KEY,
    full_name     TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'active',  -- active|suspended|excluded|graduated
    program       TEXT NOT NULL,
    level         TEXT NOT NULL,
    access_secret TEXT NOT NULL UNIQUE,
    created_at    TEXT NOT NULL                    -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS payments (
    matricule     TEXT NOT NULL REFERENCES students(matricule),
    academic_year TEXT NOT NULL,
    settled       INTEGER NOT NULL DEFAULT 0,
    UNIQUE (matricule, academic_year)
);

CREATE TABLE IF NOT EXISTS enrollments (
    matricule       TEXT NOT NULL REFERENCES students(matricule),
    unit_code       TEXT NOT NULL,
    academic_year   TEXT NOT NULL,
    exam_authorized INTEGER NOT NULL DEFAULT 0,
    UNIQUE (matricule, unit_code, academic_year)
);

CREATE TABLE IF NOT EXISTS exams (
    exam_id       TEXT PRIMARY KEY,
    unit_code     TEXT NOT NULL,
    unit_title    TEXT NOT NULL,
    academic_year TEXT NOT NULL,
    date          TEXT NOT NULL,   -- ISO 8601 date
    starts_at     TEXT NOT NULL,   -- HH:MM:SS
    ends_at       TEXT NOT NULL,   -- HH:MM:SS
    room          TEXT,
    proctor       TEXT
);

-- Scan attempts are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS access_records (
    record_id   TEXT PRIMARY KEY,
    exam_id     TEXT NOT NULL REFERENCES exams(exam_id),
    matricule   TEXT,              -- NULL for unidentified presenters
    method      TEXT NOT NULL,     -- credential|matricule|manual
    outcome     TEXT NOT NULL,     -- admitted|denied
    reasons     TEXT NOT NULL DEFAULT '[]',
    recorded_by TEXT NOT NULL,
    scanned_at  TEXT NOT NULL      -- ISO 8601 UTC; server-assigned
);

-- At most one admission per (exam, student); unidentified rows are exempt.
CREATE UNIQUE INDEX IF NOT EXISTS access_admitted_once
    ON access_records(exam_id, matricule)
    WHERE outcome = 'admitted' AND matricule IS NOT NULL;

CREATE TABLE IF NOT EXISTS audit_log (
    entry_id    TEXT PRIMARY KEY,
    actor       TEXT NOT NULL,
    kind        TEXT NOT NULL,     -- scan|credential|system
    action      TEXT NOT NULL,
    details     TEXT NOT NULL DEFAULT '{}',
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS access_exam_idx    ON access_records(exam_id, scanned_at);
CREATE INDEX IF NOT EXISTS access_student_idx ON access_records(matricule, outcome);
CREATE INDEX IF NOT EXISTS payments_year_idx  ON payments(academic_year, settled);
CREATE INDEX IF NOT EXISTS audit_time_idx     ON audit_log(recorded_at, kind);

PRAGMA user_version = 1;
";
