//! Error type for `tether-store-sqlite`.

use tether_core::contact::ContactId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown link precedence: {0:?}")]
  UnknownLinkPrecedence(String),

  /// Attempted to update a contact that does not exist or is soft-deleted.
  #[error("contact not found: {0}")]
  ContactNotFound(ContactId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
