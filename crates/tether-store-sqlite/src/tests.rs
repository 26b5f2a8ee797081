//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::Utc;
use tether_core::{
  contact::{ContactId, ContactUpdate, LinkPrecedence, NewContact},
  resolver::IdentityResolver,
  store::ContactStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn primary(email: Option<&str>, phone_number: Option<&str>) -> NewContact {
  NewContact::primary(email.map(str::to_owned), phone_number.map(str::to_owned))
}

// ─── Create / get ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_contact() {
  let s = store().await;

  let created = s
    .create_contact(primary(Some("a@x.com"), Some("123")))
    .await
    .unwrap();
  assert_eq!(created.link_precedence, LinkPrecedence::Primary);
  assert_eq!(created.linked_id, None);
  assert_eq!(created.created_at, created.updated_at);
  assert!(created.deleted_at.is_none());

  let fetched = s.get_contact(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn ids_are_assigned_in_creation_order() {
  let s = store().await;
  let a = s.create_contact(primary(Some("a@x.com"), None)).await.unwrap();
  let b = s.create_contact(primary(Some("b@x.com"), None)).await.unwrap();
  assert!(b.id > a.id);
  assert!(b.created_at >= a.created_at);
}

#[tokio::test]
async fn get_contact_missing_returns_none() {
  let s = store().await;
  assert!(s.get_contact(ContactId(42)).await.unwrap().is_none());
}

#[tokio::test]
async fn contact_without_identifiers_is_rejected() {
  let s = store().await;
  let err = s.create_contact(primary(None, None)).await.unwrap_err();
  assert!(matches!(err, crate::Error::Database(_)));
}

#[tokio::test]
async fn secondary_without_link_is_rejected() {
  let s = store().await;
  let mut input = primary(Some("a@x.com"), None);
  input.link_precedence = LinkPrecedence::Secondary;
  assert!(s.create_contact(input).await.is_err());
}

#[tokio::test]
async fn get_contacts_returns_oldest_first_and_skips_unknown() {
  let s = store().await;
  let a = s.create_contact(primary(Some("a@x.com"), None)).await.unwrap();
  let b = s.create_contact(primary(Some("b@x.com"), None)).await.unwrap();

  let rows = s
    .get_contacts(&[b.id, ContactId(999), a.id])
    .await
    .unwrap();
  let ids: Vec<_> = rows.iter().map(|c| c.id).collect();
  assert_eq!(ids, [a.id, b.id]);

  assert!(s.get_contacts(&[]).await.unwrap().is_empty());
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_by_email_is_exact_and_returns_oldest() {
  let s = store().await;
  let first = s.create_contact(primary(Some("a@x.com"), Some("1"))).await.unwrap();
  s.create_contact(primary(Some("a@x.com"), Some("2"))).await.unwrap();

  let found = s.find_by_email("a@x.com").await.unwrap().unwrap();
  assert_eq!(found.id, first.id);

  assert!(s.find_by_email("A@x.com").await.unwrap().is_none());
  assert!(s.find_by_email("a@x.co").await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_phone_number_is_exact() {
  let s = store().await;
  let c = s.create_contact(primary(None, Some("123"))).await.unwrap();

  assert_eq!(s.find_by_phone_number("123").await.unwrap().unwrap().id, c.id);
  assert!(s.find_by_phone_number("1234").await.unwrap().is_none());
}

#[tokio::test]
async fn find_by_email_or_phone_number_matches_either() {
  let s = store().await;
  let by_email = s.create_contact(primary(Some("a@x.com"), None)).await.unwrap();
  s.create_contact(primary(Some("b@x.com"), Some("555"))).await.unwrap();
  let by_phone = s.create_contact(primary(None, Some("999"))).await.unwrap();

  let rows = s
    .find_by_email_or_phone_number("a@x.com", "999")
    .await
    .unwrap();
  let ids: Vec<_> = rows.iter().map(|c| c.id).collect();
  assert_eq!(ids, [by_email.id, by_phone.id]);
}

#[tokio::test]
async fn get_linked_contacts_lists_secondaries() {
  let s = store().await;
  let p = s.create_contact(primary(Some("a@x.com"), None)).await.unwrap();
  let s1 = s
    .create_contact(NewContact::secondary(None, Some("1".into()), p.id))
    .await
    .unwrap();
  let s2 = s
    .create_contact(NewContact::secondary(None, Some("2".into()), p.id))
    .await
    .unwrap();
  s.create_contact(primary(Some("other@x.com"), None)).await.unwrap();

  let linked = s.get_linked_contacts(p.id).await.unwrap();
  let ids: Vec<_> = linked.iter().map(|c| c.id).collect();
  assert_eq!(ids, [s1.id, s2.id]);
  assert!(linked.iter().all(|c| c.linked_id == Some(p.id)));
}

// ─── Updates ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_contact_demotes_and_bumps_updated_at() {
  let s = store().await;
  let a = s.create_contact(primary(Some("a@x.com"), None)).await.unwrap();
  let b = s.create_contact(primary(None, Some("999"))).await.unwrap();

  let demoted = s
    .update_contact(b.id, ContactUpdate::demote_to(a.id))
    .await
    .unwrap();

  assert_eq!(demoted.link_precedence, LinkPrecedence::Secondary);
  assert_eq!(demoted.linked_id, Some(a.id));
  assert_eq!(demoted.phone_number.as_deref(), Some("999"));
  assert_eq!(demoted.created_at, b.created_at);
  assert!(demoted.updated_at >= b.updated_at);
}

#[tokio::test]
async fn update_missing_contact_errors() {
  let s = store().await;
  let err = s
    .update_contact(ContactId(7), ContactUpdate::demote_to(ContactId(1)))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::ContactNotFound(ContactId(7))));
}

#[tokio::test]
async fn relink_contacts_repoints_all_children() {
  let s = store().await;
  let a = s.create_contact(primary(Some("a@x.com"), None)).await.unwrap();
  let b = s.create_contact(primary(Some("b@x.com"), None)).await.unwrap();
  for phone in ["1", "2"] {
    s.create_contact(NewContact::secondary(None, Some(phone.into()), b.id))
      .await
      .unwrap();
  }
  s.update_contact(b.id, ContactUpdate::demote_to(a.id))
    .await
    .unwrap();

  let touched = s.relink_contacts(b.id, a.id).await.unwrap();

  assert_eq!(touched, 2);
  assert!(s.get_linked_contacts(b.id).await.unwrap().is_empty());
  assert_eq!(s.get_linked_contacts(a.id).await.unwrap().len(), 3);
}

// ─── Soft delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn soft_deleted_contacts_are_invisible() {
  let s = store().await;
  let p = s.create_contact(primary(Some("a@x.com"), Some("123"))).await.unwrap();
  let child = s
    .create_contact(NewContact::secondary(Some("b@x.com".into()), None, p.id))
    .await
    .unwrap();

  s.update_contact(child.id, ContactUpdate::soft_delete(Utc::now()))
    .await
    .unwrap();
  s.update_contact(p.id, ContactUpdate::soft_delete(Utc::now()))
    .await
    .unwrap();

  assert!(s.get_contact(p.id).await.unwrap().is_none());
  assert!(s.get_contacts(&[p.id]).await.unwrap().is_empty());
  assert!(s.get_linked_contacts(p.id).await.unwrap().is_empty());
  assert!(s.find_by_email("a@x.com").await.unwrap().is_none());
  assert!(s.find_by_phone_number("123").await.unwrap().is_none());
  assert!(
    s.find_by_email_or_phone_number("b@x.com", "123")
      .await
      .unwrap()
      .is_empty()
  );
  assert_eq!(s.relink_contacts(p.id, ContactId(99)).await.unwrap(), 0);

  let err = s
    .update_contact(p.id, ContactUpdate::soft_delete(Utc::now()))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::ContactNotFound(_)));
}

// ─── Resolver end to end ─────────────────────────────────────────────────────

#[tokio::test]
async fn resolver_email_only_creates_primary() {
  let r = IdentityResolver::new(store().await);

  let view = r.identify_by_email("a@x.com").await.unwrap();

  assert_eq!(view.emails, ["a@x.com"]);
  assert!(view.phone_numbers.is_empty());
  assert!(view.secondary_contact_ids.is_empty());
}

#[tokio::test]
async fn resolver_exact_match_creates_nothing() {
  let r = IdentityResolver::new(store().await);
  let p = r
    .store()
    .create_contact(primary(Some("a@x.com"), Some("123")))
    .await
    .unwrap();

  let first = r
    .identify_by_email_and_phone_number("a@x.com", "123")
    .await
    .unwrap();
  let second = r
    .identify_by_email_and_phone_number("a@x.com", "123")
    .await
    .unwrap();

  assert_eq!(first, second);
  assert_eq!(first.primary_contact_id, p.id);
  assert_eq!(
    r.store()
      .find_by_email_or_phone_number("a@x.com", "123")
      .await
      .unwrap()
      .len(),
    1
  );
}

#[tokio::test]
async fn resolver_new_phone_creates_secondary() {
  let r = IdentityResolver::new(store().await);
  let p = r
    .store()
    .create_contact(primary(Some("a@x.com"), Some("123")))
    .await
    .unwrap();

  let view = r
    .identify_by_email_and_phone_number("a@x.com", "456")
    .await
    .unwrap();

  assert_eq!(view.primary_contact_id, p.id);
  assert_eq!(view.phone_numbers, ["123", "456"]);
  let secondary = r
    .store()
    .get_contact(view.secondary_contact_ids[0])
    .await
    .unwrap()
    .unwrap();
  assert_eq!(secondary.linked_id, Some(p.id));
  assert_eq!(secondary.link_precedence, LinkPrecedence::Secondary);
}

#[tokio::test]
async fn resolver_merges_and_flattens_clusters() {
  let r = IdentityResolver::new(store().await);
  let a = r
    .store()
    .create_contact(primary(Some("a@x.com"), None))
    .await
    .unwrap();
  let b = r
    .store()
    .create_contact(primary(None, Some("999")))
    .await
    .unwrap();
  let b_child = r
    .identify_by_email_and_phone_number("b@x.com", "999")
    .await
    .unwrap()
    .secondary_contact_ids[0];

  let view = r
    .identify_by_email_and_phone_number("a@x.com", "999")
    .await
    .unwrap();

  assert_eq!(view.primary_contact_id, a.id);
  assert_eq!(view.secondary_contact_ids, [b.id, b_child]);
  assert_eq!(view.emails, ["a@x.com", "b@x.com"]);
  assert_eq!(view.phone_numbers, ["999"]);

  for id in [b.id, b_child] {
    let c = r.store().get_contact(id).await.unwrap().unwrap();
    assert_eq!(c.linked_id, Some(a.id));
    assert_eq!(c.link_precedence, LinkPrecedence::Secondary);
  }
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn contacts_survive_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tether.db");

  let created = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.create_contact(primary(Some("a@x.com"), Some("123")))
      .await
      .unwrap()
  };

  let reopened = SqliteStore::open(&path).await.unwrap();
  let fetched = reopened.get_contact(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}
