//! Handler for `POST /identify`.
//!
//! Body: `{"email"?: string, "phoneNumber"?: number | string}`. At least one
//! field must be present and non-empty. Returns `{"contact": ClusterView}`.

use std::sync::{Arc, LazyLock};

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tether_core::{resolver::IdentifyRequest, store::ContactStore, view::ClusterView};

use crate::{ApiState, error::ApiError};

static EMAIL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

static PHONE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\+?[0-9]+$").expect("valid regex"));

/// A phone number as clients send it: either a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PhoneNumberInput {
  Number(u64),
  Text(String),
}

impl PhoneNumberInput {
  fn into_string(self) -> String {
    match self {
      Self::Number(n) => n.to_string(),
      Self::Text(s) => s,
    }
  }
}

/// JSON body accepted by `POST /identify`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyBody {
  pub email:        Option<String>,
  pub phone_number: Option<PhoneNumberInput>,
}

impl IdentifyBody {
  /// Normalise and validate into a resolver request.
  pub fn into_request(self) -> Result<IdentifyRequest, ApiError> {
    let email = self.email.filter(|e| !e.is_empty());
    let phone_number = self
      .phone_number
      .map(PhoneNumberInput::into_string)
      .filter(|p| !p.is_empty());

    if let Some(e) = &email
      && !EMAIL_RE.is_match(e)
    {
      return Err(ApiError::BadRequest(format!("invalid email: {e:?}")));
    }
    if let Some(p) = &phone_number
      && !PHONE_RE.is_match(p)
    {
      return Err(ApiError::BadRequest(format!("invalid phoneNumber: {p:?}")));
    }
    if email.is_none() && phone_number.is_none() {
      return Err(ApiError::BadRequest(
        "at least one of email or phoneNumber must be provided".to_owned(),
      ));
    }

    Ok(IdentifyRequest { email, phone_number })
  }
}

#[derive(Debug, Serialize)]
pub struct IdentifyResponse {
  pub contact: ClusterView,
}

/// `POST /identify`
pub async fn handler<S>(
  State(state): State<Arc<ApiState<S>>>,
  body: Result<Json<IdentifyBody>, JsonRejection>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: ContactStore,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let request = body.into_request()?;

  let _gate = state.write_gate.lock().await;
  let contact = state.resolver.identify(&request).await?;
  tracing::debug!(primary_id = %contact.primary_contact_id, "identified contact");

  Ok(Json(IdentifyResponse { contact }))
}
