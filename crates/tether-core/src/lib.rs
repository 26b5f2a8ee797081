//! Core types and the identity-reconciliation logic for Tether.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage is reached only through the [`store::ContactStore`] port, which
//! the hosting process constructs and injects into the
//! [`resolver::IdentityResolver`].

pub mod contact;
pub mod error;
pub mod resolver;
pub mod store;
pub mod view;

pub use error::{Error, Result};
