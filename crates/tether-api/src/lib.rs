//! JSON REST API for Tether.
//!
//! Exposes an axum [`Router`] backed by any [`ContactStore`].
//! Transport, tracing layers and process lifecycle are the caller's
//! responsibility.
//!
//! | Method | Path        | Notes                                   |
//! |--------|-------------|-----------------------------------------|
//! | `POST` | `/identify` | Body: [`identify::IdentifyBody`]        |
//! | `GET`  | `/health`   | Liveness probe; always `{"status":"ok"}` |

pub mod error;
pub mod identify;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use serde_json::{Value, json};
use tether_core::{resolver::IdentityResolver, store::ContactStore};
use tokio::sync::Mutex;

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub resolver:   IdentityResolver<S>,
  /// Held for the whole of each resolution so that two requests in this
  /// process never interleave their reads and writes.
  pub write_gate: Mutex<()>,
}

impl<S: ContactStore> ApiState<S> {
  pub fn new(store: S) -> Self {
    Self { resolver: IdentityResolver::new(store), write_gate: Mutex::new(()) }
  }
}

/// Build the API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: S) -> Router<()>
where
  S: ContactStore + 'static,
{
  Router::new()
    .route("/identify", post(identify::handler::<S>))
    .route("/health", get(health))
    .with_state(Arc::new(ApiState::new(store)))
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Router tests ────────────────────────────────────────────────────────────
