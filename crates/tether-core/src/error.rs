//! Error types for `tether-core`.

use thiserror::Error;

use crate::contact::ContactId;

#[derive(Debug, Error)]
pub enum Error {
  /// A call into the storage port failed. The backend's error is carried
  /// through untouched.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("primary contact not found: {0}")]
  PrimaryNotFound(ContactId),

  /// A contact referenced as a cluster primary is itself a secondary.
  #[error("contact {0} is referenced as a primary but is linked to another contact")]
  NotPrimary(ContactId),

  #[error("at least one of email or phone number must be provided")]
  MissingIdentifier,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
