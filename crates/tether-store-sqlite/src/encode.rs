//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width
//! so that lexical order in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use tether_core::contact::{Contact, ContactId, LinkPrecedence};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── LinkPrecedence ──────────────────────────────────────────────────────────

pub fn encode_link_precedence(p: LinkPrecedence) -> &'static str {
  match p {
    LinkPrecedence::Primary => "primary",
    LinkPrecedence::Secondary => "secondary",
  }
}

pub fn decode_link_precedence(s: &str) -> Result<LinkPrecedence> {
  match s {
    "primary" => Ok(LinkPrecedence::Primary),
    "secondary" => Ok(LinkPrecedence::Secondary),
    other => Err(Error::UnknownLinkPrecedence(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawContact::from_row`].
pub const CONTACT_COLUMNS: &str = "id, email, phone_number, linked_id, \
                                   link_precedence, created_at, updated_at, deleted_at";

/// Raw values read directly from a `contacts` row.
pub struct RawContact {
  pub id:              i64,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub linked_id:       Option<i64>,
  pub link_precedence: String,
  pub created_at:      String,
  pub updated_at:      String,
  pub deleted_at:      Option<String>,
}

impl RawContact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      email:           row.get(1)?,
      phone_number:    row.get(2)?,
      linked_id:       row.get(3)?,
      link_precedence: row.get(4)?,
      created_at:      row.get(5)?,
      updated_at:      row.get(6)?,
      deleted_at:      row.get(7)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    Ok(Contact {
      id:              ContactId(self.id),
      email:           self.email,
      phone_number:    self.phone_number,
      linked_id:       self.linked_id.map(ContactId),
      link_precedence: decode_link_precedence(&self.link_precedence)?,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
      deleted_at:      self.deleted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
