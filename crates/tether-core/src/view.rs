//! The consolidated read model returned for every resolution.

use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactId};

/// The computed view of one identity cluster — never stored, always derived.
///
/// `emails[0]` and `phone_numbers[0]` are the primary's own values when it
/// has them. Later entries follow the secondaries in ascending `created_at`
/// order; each value appears once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
  pub primary_contact_id:    ContactId,
  pub emails:                Vec<String>,
  pub phone_numbers:         Vec<String>,
  pub secondary_contact_ids: Vec<ContactId>,
}

impl ClusterView {
  /// A freshly created primary with no secondaries.
  pub fn singleton(primary: &Contact) -> Self { Self::assemble(primary, &[]) }

  /// Build the view from a primary and its secondaries. `secondaries` must
  /// already be in ascending `created_at` order.
  pub fn assemble(primary: &Contact, secondaries: &[Contact]) -> Self {
    let mut emails = Vec::new();
    let mut phone_numbers = Vec::new();

    for contact in std::iter::once(primary).chain(secondaries) {
      push_unique(&mut emails, contact.email.as_deref());
      push_unique(&mut phone_numbers, contact.phone_number.as_deref());
    }

    Self {
      primary_contact_id: primary.id,
      emails,
      phone_numbers,
      secondary_contact_ids: secondaries.iter().map(|c| c.id).collect(),
    }
  }
}

fn push_unique(values: &mut Vec<String>, value: Option<&str>) {
  if let Some(v) = value
    && !values.iter().any(|existing| existing == v)
  {
    values.push(v.to_owned());
  }
}
