//! [`SqliteStore`] — the SQLite implementation of [`ContactStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use tether_core::{
  contact::{Contact, ContactId, ContactUpdate, NewContact},
  store::ContactStore,
};

use crate::{
  Error, Result,
  encode::{CONTACT_COLUMNS, RawContact, encode_dt, encode_link_precedence},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tether contact store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for SqliteStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SqliteStore").finish_non_exhaustive()
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT` over live contacts with the given `WHERE` fragment and
  /// return the decoded rows in seniority order.
  async fn select_many(
    &self,
    condition: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<Contact>> {
    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE ({condition}) AND deleted_at IS NULL
           ORDER BY created_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }

  /// Like [`Self::select_many`] but keeps only the oldest row.
  async fn select_first(
    &self,
    condition: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Option<Contact>> {
    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts
           WHERE ({condition}) AND deleted_at IS NULL
           ORDER BY created_at ASC, id ASC
           LIMIT 1"
        );
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params_from_iter(params),
              RawContact::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }
}

fn text(s: &str) -> rusqlite::types::Value { rusqlite::types::Value::Text(s.to_owned()) }

fn integer(id: ContactId) -> rusqlite::types::Value { rusqlite::types::Value::Integer(id.0) }

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    self.select_first("id = ?1".to_owned(), vec![integer(id)]).await
  }

  async fn get_contacts(&self, ids: &[ContactId]) -> Result<Vec<Contact>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    self
      .select_many(
        format!("id IN ({placeholders})"),
        ids.iter().copied().map(integer).collect(),
      )
      .await
  }

  async fn get_linked_contacts(&self, primary_id: ContactId) -> Result<Vec<Contact>> {
    self
      .select_many("linked_id = ?1".to_owned(), vec![integer(primary_id)])
      .await
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Contact>> {
    self.select_first("email = ?1".to_owned(), vec![text(email)]).await
  }

  async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<Contact>> {
    self
      .select_first("phone_number = ?1".to_owned(), vec![text(phone_number)])
      .await
  }

  async fn find_by_email_or_phone_number(
    &self,
    email:        &str,
    phone_number: &str,
  ) -> Result<Vec<Contact>> {
    self
      .select_many(
        "email = ?1 OR phone_number = ?2".to_owned(),
        vec![text(email), text(phone_number)],
      )
      .await
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create_contact(&self, input: NewContact) -> Result<Contact> {
    let now        = encode_dt(Utc::now());
    let precedence = encode_link_precedence(input.link_precedence);
    let linked_id  = input.linked_id.map(|id| id.0);

    let raw: RawContact = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO contacts (
             email, phone_number, linked_id, link_precedence, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
           RETURNING {CONTACT_COLUMNS}"
        );
        Ok(conn.query_row(
          &sql,
          rusqlite::params![
            input.email,
            input.phone_number,
            linked_id,
            precedence,
            now,
          ],
          RawContact::from_row,
        )?)
      })
      .await?;

    raw.into_contact()
  }

  async fn update_contact(&self, id: ContactId, update: ContactUpdate) -> Result<Contact> {
    let now        = encode_dt(Utc::now());
    let precedence = update.link_precedence.map(encode_link_precedence);
    let linked_id  = update.linked_id.map(|id| id.0);
    let deleted_at = update.deleted_at.map(encode_dt);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "UPDATE contacts SET
             email           = COALESCE(?2, email),
             phone_number    = COALESCE(?3, phone_number),
             linked_id       = COALESCE(?4, linked_id),
             link_precedence = COALESCE(?5, link_precedence),
             deleted_at      = COALESCE(?6, deleted_at),
             updated_at      = ?7
           WHERE id = ?1 AND deleted_at IS NULL
           RETURNING {CONTACT_COLUMNS}"
        );
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![
                id.0,
                update.email,
                update.phone_number,
                linked_id,
                precedence,
                deleted_at,
                now,
              ],
              RawContact::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.ok_or(Error::ContactNotFound(id))?.into_contact()
  }

  async fn relink_contacts(
    &self,
    old_linked_id: ContactId,
    new_linked_id: ContactId,
  ) -> Result<usize> {
    let now = encode_dt(Utc::now());

    let touched = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE contacts SET linked_id = ?2, updated_at = ?3
           WHERE linked_id = ?1 AND deleted_at IS NULL",
          rusqlite::params![old_linked_id.0, new_linked_id.0, now],
        )?)
      })
      .await?;

    Ok(touched)
  }
}
