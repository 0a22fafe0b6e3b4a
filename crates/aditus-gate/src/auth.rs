//! HTTP Basic-auth extractor resolving the operator's capability role.
//!
//! Capabilities are resolved once at the request boundary and handed to the
//! handlers as a plain enum — no permission lookups ever happen
//! mid-algorithm.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;

use crate::{AppState, error::Error};
use aditus_core::registry::Backend;

// ─── Roles ───────────────────────────────────────────────────────────────────

/// Capability set of a gate operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// May run recording scans and read exam records.
  Proctor,
  /// Everything a proctor may do, plus credential issuing and secret
  /// rotation.
  Registrar,
}

/// One accepted operator account, as configured.
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorEntry {
  pub name:          String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub role:          Role,
}

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub operators: Vec<OperatorEntry>,
}

/// The authenticated operator for one request.
#[derive(Debug, Clone)]
pub struct Operator {
  pub name: String,
  pub role: Role,
}

impl Operator {
  /// Fail with 403 unless the operator holds the registrar capability.
  pub fn require_registrar(&self) -> Result<(), Error> {
    match self.role {
      Role::Registrar => Ok(()),
      Role::Proctor => Err(Error::Forbidden),
    }
  }
}

// ─── Verification ────────────────────────────────────────────────────────────

/// Verify credentials directly from headers and resolve the operator.
pub fn verify_auth(
  headers: &HeaderMap,
  config: &AuthConfig,
) -> Result<Operator, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let entry = config
    .operators
    .iter()
    .find(|op| op.name == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash =
    PasswordHash::new(&entry.password_hash).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(Operator { name: entry.name.clone(), role: entry.role })
}

impl<S> FromRequestParts<AppState<S>> for Operator
where
  S: Backend + Clone + Send + Sync + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth)
  }
}
