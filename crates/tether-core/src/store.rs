//! The `ContactStore` port.
//!
//! The trait is implemented by storage backends (e.g. `tether-store-sqlite`).
//! The resolver and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::contact::{Contact, ContactId, ContactUpdate, NewContact};

/// Abstraction over a contact store backend.
///
/// Every read excludes soft-deleted contacts. Multi-row reads are ordered by
/// ascending `created_at`, ties broken by ascending `id`.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a contact by id. Returns `None` if not found.
  fn get_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Retrieve every contact whose id is in `ids`. Unknown ids are skipped.
  fn get_contacts<'a>(
    &'a self,
    ids: &'a [ContactId],
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + 'a;

  /// All contacts whose `linked_id` is `primary_id`.
  fn get_linked_contacts(
    &self,
    primary_id: ContactId,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// The earliest-created contact with exactly this email, if any.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + 'a;

  /// The earliest-created contact with exactly this phone number, if any.
  fn find_by_phone_number<'a>(
    &'a self,
    phone_number: &'a str,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + 'a;

  /// Every contact whose email equals `email` or whose phone number equals
  /// `phone_number`.
  fn find_by_email_or_phone_number<'a>(
    &'a self,
    email: &'a str,
    phone_number: &'a str,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist a new contact and return it with its assigned id and
  /// timestamps.
  fn create_contact(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Apply a partial update and return the updated contact.
  ///
  /// Returns an error if no non-deleted contact has this id.
  fn update_contact(
    &self,
    id: ContactId,
    update: ContactUpdate,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Re-point every contact linked to `old_linked_id` at `new_linked_id`.
  /// Returns the number of contacts touched.
  fn relink_contacts(
    &self,
    old_linked_id: ContactId,
    new_linked_id: ContactId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
