//! [`IdentityResolver`] — maps an incoming (email, phone number) pair onto an
//! identity cluster, creating, extending or merging clusters as needed.
//!
//! The resolver holds no state besides the injected store. Every call is an
//! independent read → decide → write sequence; making that sequence atomic
//! with respect to concurrent calls is the caller's or the store's concern.

use crate::{
  Error, Result,
  contact::{Contact, ContactId, ContactUpdate, NewContact},
  store::ContactStore,
  view::ClusterView,
};

/// The identifying fields of one resolution request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifyRequest {
  pub email:        Option<String>,
  pub phone_number: Option<String>,
}

/// The single field a one-key lookup matches on.
#[derive(Debug, Clone, Copy)]
enum MatchKey<'a> {
  Email(&'a str),
  PhoneNumber(&'a str),
}

/// Resolves contact data onto identity clusters through a [`ContactStore`].
#[derive(Debug, Clone)]
pub struct IdentityResolver<S> {
  store: S,
}

impl<S: ContactStore> IdentityResolver<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Dispatch to the email-only, phone-only or combined resolution depending
  /// on which fields are present.
  pub async fn identify(&self, request: &IdentifyRequest) -> Result<ClusterView> {
    match (request.email.as_deref(), request.phone_number.as_deref()) {
      (Some(email), Some(phone_number)) => {
        self
          .identify_by_email_and_phone_number(email, phone_number)
          .await
      }
      (Some(email), None) => self.identify_by_email(email).await,
      (None, Some(phone_number)) => {
        self.identify_by_phone_number(phone_number).await
      }
      (None, None) => Err(Error::MissingIdentifier),
    }
  }

  pub async fn identify_by_email(&self, email: &str) -> Result<ClusterView> {
    self.identify_by_key(MatchKey::Email(email)).await
  }

  pub async fn identify_by_phone_number(
    &self,
    phone_number: &str,
  ) -> Result<ClusterView> {
    self.identify_by_key(MatchKey::PhoneNumber(phone_number)).await
  }

  /// Resolve a request carrying both fields. This is the only path that can
  /// add a secondary to an existing cluster or merge two clusters.
  pub async fn identify_by_email_and_phone_number(
    &self,
    email: &str,
    phone_number: &str,
  ) -> Result<ClusterView> {
    let matches = self
      .store
      .find_by_email_or_phone_number(email, phone_number)
      .await
      .map_err(store_error("find_by_email_or_phone_number"))?;

    if matches.is_empty() {
      let contact = self
        .create(NewContact::primary(
          Some(email.to_owned()),
          Some(phone_number.to_owned()),
        ))
        .await?;
      tracing::info!(contact_id = %contact.id, "created primary contact");
      return Ok(ClusterView::singleton(&contact));
    }

    if let Some(exact) = matches.iter().find(|c| c.matches_both(email, phone_number)) {
      tracing::debug!(contact_id = %exact.id, "request matches an existing contact");
      return self.cluster_view(exact.primary_id()).await;
    }

    let primary_ids = distinct_primary_ids(&matches);
    match primary_ids.as_slice() {
      [primary_id] => {
        let contact = self
          .create(NewContact::secondary(
            Some(email.to_owned()),
            Some(phone_number.to_owned()),
            *primary_id,
          ))
          .await?;
        tracing::info!(
          contact_id = %contact.id,
          primary_id = %primary_id,
          "created secondary contact"
        );
        self.cluster_view(*primary_id).await
      }
      _ => {
        let survivor = self.merge(&primary_ids).await?;
        self.cluster_view(survivor).await
      }
    }
  }

  // ── Internals ───────────────────────────────────────────────────────────

  async fn identify_by_key(&self, key: MatchKey<'_>) -> Result<ClusterView> {
    let existing = match key {
      MatchKey::Email(email) => self
        .store
        .find_by_email(email)
        .await
        .map_err(store_error("find_by_email"))?,
      MatchKey::PhoneNumber(phone_number) => self
        .store
        .find_by_phone_number(phone_number)
        .await
        .map_err(store_error("find_by_phone_number"))?,
    };

    match existing {
      Some(contact) => self.cluster_view(contact.primary_id()).await,
      None => {
        let input = match key {
          MatchKey::Email(email) => NewContact::primary(Some(email.to_owned()), None),
          MatchKey::PhoneNumber(phone_number) => {
            NewContact::primary(None, Some(phone_number.to_owned()))
          }
        };
        let contact = self.create(input).await?;
        tracing::info!(contact_id = %contact.id, "created primary contact");
        Ok(ClusterView::singleton(&contact))
      }
    }
  }

  /// Merge the two oldest of the given primaries: the oldest survives, the
  /// second is demoted and its secondaries are re-pointed at the survivor.
  /// Returns the survivor's id.
  async fn merge(&self, primary_ids: &[ContactId]) -> Result<ContactId> {
    let primaries = self
      .store
      .get_contacts(primary_ids)
      .await
      .map_err(store_error("get_contacts"))?;

    if let Some(missing) = primary_ids
      .iter()
      .find(|id| !primaries.iter().any(|c| c.id == **id))
    {
      tracing::error!(contact_id = %missing, "primary referenced by a match is missing");
      return Err(Error::PrimaryNotFound(*missing));
    }
    if let Some(linked) = primaries.iter().find(|c| !c.is_primary()) {
      tracing::error!(contact_id = %linked.id, "merge candidate is not a primary");
      return Err(Error::NotPrimary(linked.id));
    }

    let (survivor, demoted) = match primaries.as_slice() {
      [survivor, demoted, rest @ ..] => {
        if !rest.is_empty() {
          tracing::warn!(
            survivor = %survivor.id,
            unmerged = rest.len(),
            "request bridges more than two clusters; merging the oldest two"
          );
        }
        (survivor, demoted)
      }
      _ => return Err(Error::PrimaryNotFound(primary_ids[0])),
    };

    self
      .store
      .update_contact(demoted.id, ContactUpdate::demote_to(survivor.id))
      .await
      .map_err(store_error("update_contact"))?;
    let relinked = self
      .store
      .relink_contacts(demoted.id, survivor.id)
      .await
      .map_err(store_error("relink_contacts"))?;

    tracing::info!(
      survivor = %survivor.id,
      demoted = %demoted.id,
      relinked,
      "merged identity clusters"
    );
    Ok(survivor.id)
  }

  /// Read the cluster rooted at `primary_id` and assemble its view.
  async fn cluster_view(&self, primary_id: ContactId) -> Result<ClusterView> {
    let primary = self
      .store
      .get_contact(primary_id)
      .await
      .map_err(store_error("get_contact"))?
      .ok_or(Error::PrimaryNotFound(primary_id))?;
    if !primary.is_primary() {
      return Err(Error::NotPrimary(primary.id));
    }

    let secondaries = self
      .store
      .get_linked_contacts(primary.id)
      .await
      .map_err(store_error("get_linked_contacts"))?;

    Ok(ClusterView::assemble(&primary, &secondaries))
  }

  async fn create(&self, input: NewContact) -> Result<Contact> {
    self
      .store
      .create_contact(input)
      .await
      .map_err(store_error("create_contact"))
  }
}

/// Distinct cluster primaries referenced by `contacts`, in first-seen order.
fn distinct_primary_ids(contacts: &[Contact]) -> Vec<ContactId> {
  let mut ids = Vec::new();
  for id in contacts.iter().map(Contact::primary_id) {
    if !ids.contains(&id) {
      ids.push(id);
    }
  }
  ids
}

/// Log a failed store call and wrap the backend error.
fn store_error<E>(operation: &'static str) -> impl FnOnce(E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  move |e| {
    tracing::error!(operation, error = %e, "store call failed");
    Error::Store(Box::new(e))
  }
}
