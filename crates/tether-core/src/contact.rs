//! Contact — the single persisted entity.
//!
//! A contact carries at most one email and one phone number. Contacts that
//! refer to the same person form a cluster: one `primary` (the oldest) and
//! any number of `secondary` contacts whose `linked_id` points at it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned integer identifier of a contact.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContactId(pub i64);

impl fmt::Display for ContactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Whether a contact is the canonical member of its cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
  Primary,
  Secondary,
}

/// A persisted contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              ContactId,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  /// Set iff `link_precedence` is [`LinkPrecedence::Secondary`].
  pub linked_id:       Option<ContactId>,
  pub link_precedence: LinkPrecedence,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  /// Soft-delete marker. Stores never return contacts with this set.
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    self.link_precedence == LinkPrecedence::Primary
  }

  /// The id of the cluster primary this contact belongs to.
  pub fn primary_id(&self) -> ContactId {
    match self.link_precedence {
      LinkPrecedence::Primary => self.id,
      LinkPrecedence::Secondary => self.linked_id.unwrap_or(self.id),
    }
  }

  /// `true` if the contact carries exactly this email and phone number.
  pub fn matches_both(&self, email: &str, phone_number: &str) -> bool {
    self.email.as_deref() == Some(email)
      && self.phone_number.as_deref() == Some(phone_number)
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContactStore::create_contact`].
/// `id`, `created_at` and `updated_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
}

impl NewContact {
  /// A new cluster primary.
  pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Primary,
      linked_id: None,
    }
  }

  /// A new secondary attached to `primary_id`.
  pub fn secondary(
    email: Option<String>,
    phone_number: Option<String>,
    primary_id: ContactId,
  ) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Secondary,
      linked_id: Some(primary_id),
    }
  }
}

/// Partial update applied by [`crate::store::ContactStore::update_contact`].
/// `None` fields are left untouched; `updated_at` is always bumped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactUpdate {
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub linked_id:       Option<ContactId>,
  pub link_precedence: Option<LinkPrecedence>,
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl ContactUpdate {
  /// Demote a primary under `primary_id`.
  pub fn demote_to(primary_id: ContactId) -> Self {
    Self {
      linked_id: Some(primary_id),
      link_precedence: Some(LinkPrecedence::Secondary),
      ..Default::default()
    }
  }

  /// Soft-delete the contact.
  pub fn soft_delete(at: DateTime<Utc>) -> Self {
    Self { deleted_at: Some(at), ..Default::default() }
  }
}
