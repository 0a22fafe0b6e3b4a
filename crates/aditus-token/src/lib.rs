//! Credential codec for Aditus.
//!
//! Turns a student's matricule, access secret and an issue timestamp into
//! the opaque payload printed as a QR code, and reverses that operation on
//! presentation. Pure synchronous; no HTTP, database or clock access —
//! freshness and registry state are the caller's concern.
//!
//! The payload embeds a SHA-256 digest of the access secret, never the
//! secret itself: someone who photographs a QR code learns nothing they can
//! use after the secret is rotated, and nothing about the secret either.
//! This is a physical-world deterrent against casual replay, not a
//! cryptographic credential.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::Utc;
//! use uuid::Uuid;
//!
//! let matricule = "ETU-2024-001".parse().unwrap();
//! let secret = Uuid::new_v4();
//! let payload = aditus_token::encode(&matricule, &secret, Utc::now());
//! let claims = aditus_token::decode(&payload).unwrap();
//! assert!(claims.matches_secret(&secret));
//! ```

pub mod error;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use aditus_core::student::Matricule;
pub use error::{Error, Result};

// ─── Wire form ───────────────────────────────────────────────────────────────

/// The JSON structure inside the base64 payload. Field names are part of
/// the wire format; printed credentials in the field depend on them.
#[derive(Serialize, Deserialize)]
struct Wire {
  matricule: String,
  secret:    String,
  issued_at: DateTime<Utc>,
}

// ─── Claims ──────────────────────────────────────────────────────────────────

/// The decoded, syntactically valid content of a presented credential.
///
/// Syntactic validity is all this type promises: whether the secret
/// reference matches the student's current secret and whether the issue
/// time is still fresh are separate checks made at the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
  pub matricule:  Matricule,
  pub secret_ref: String,
  pub issued_at:  DateTime<Utc>,
}

impl Claims {
  /// Whether this credential was minted from `secret`. Rotation changes
  /// the digest, so pre-rotation credentials fail here.
  pub fn matches_secret(&self, secret: &Uuid) -> bool {
    self.secret_ref == secret_ref(secret)
  }

  /// Whether the credential's age at `now` is within `validity`.
  pub fn is_fresh(&self, now: DateTime<Utc>, validity: Duration) -> bool {
    now.signed_duration_since(self.issued_at) <= validity
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Hex SHA-256 digest of an access secret — the only form of the secret
/// that ever appears in a payload.
pub fn secret_ref(secret: &Uuid) -> String {
  hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Build the opaque payload for a credential issued at `issued_at`.
pub fn encode(
  matricule: &Matricule,
  secret: &Uuid,
  issued_at: DateTime<Utc>,
) -> String {
  let wire = Wire {
    matricule: matricule.to_string(),
    secret:    secret_ref(secret),
    issued_at,
  };
  // A struct of strings and a timestamp cannot fail to serialize.
  let json = serde_json::to_vec(&wire).expect("wire form is serializable");
  B64.encode(json)
}

/// Parse a presented payload back into [`Claims`].
///
/// Every structural failure — bad base64, bad UTF-8, wrong JSON shape, a
/// matricule that fails validation — is a malformed payload; callers map
/// all of them to the `invalid-credential` denial.
pub fn decode(payload: &str) -> Result<Claims> {
  let bytes = B64.decode(payload.trim())?;
  let wire: Wire = serde_json::from_slice(&bytes)?;
  let matricule = wire
    .matricule
    .parse::<Matricule>()
    .map_err(|_| Error::InvalidMatricule(wire.matricule))?;

  Ok(Claims {
    matricule,
    secret_ref: wire.secret,
    issued_at: wire.issued_at,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn matricule() -> Matricule { "ETU-2024-001".parse().unwrap() }

  fn issued() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 2, 8, 0, 0).unwrap()
  }

  #[test]
  fn round_trip() {
    let secret = Uuid::new_v4();
    let payload = encode(&matricule(), &secret, issued());
    let claims = decode(&payload).unwrap();

    assert_eq!(claims.matricule, matricule());
    assert_eq!(claims.issued_at, issued());
    assert!(claims.matches_secret(&secret));
  }

  #[test]
  fn payload_never_contains_the_raw_secret() {
    let secret = Uuid::new_v4();
    let payload = encode(&matricule(), &secret, issued());
    let json = String::from_utf8(B64.decode(&payload).unwrap()).unwrap();
    assert!(!json.contains(&secret.to_string()));
  }

  #[test]
  fn rotated_secret_no_longer_matches() {
    let old_secret = Uuid::new_v4();
    let payload = encode(&matricule(), &old_secret, issued());
    let claims = decode(&payload).unwrap();

    let new_secret = Uuid::new_v4();
    assert!(claims.matches_secret(&old_secret));
    assert!(!claims.matches_secret(&new_secret));
  }

  #[test]
  fn freshness_window_is_inclusive() {
    let secret = Uuid::new_v4();
    let claims = decode(&encode(&matricule(), &secret, issued())).unwrap();
    let validity = Duration::minutes(30);

    assert!(claims.is_fresh(issued() + Duration::minutes(30), validity));
    assert!(!claims.is_fresh(
      issued() + Duration::minutes(30) + Duration::seconds(1),
      validity
    ));
  }

  #[test]
  fn garbage_is_malformed() {
    assert!(decode("!!!not-base64!!!").is_err());

    // Valid base64, not JSON.
    assert!(decode(&B64.encode(b"hello")).is_err());

    // Valid JSON, wrong shape.
    assert!(decode(&B64.encode(br#"{"matricule":"A1"}"#)).is_err());
  }

  #[test]
  fn invalid_matricule_inside_payload_is_malformed() {
    let json =
      br#"{"matricule":"not valid","secret":"ab","issued_at":"2024-06-02T08:00:00Z"}"#;
    let err = decode(&B64.encode(json)).unwrap_err();
    assert!(matches!(err, Error::InvalidMatricule(_)));
  }
}
