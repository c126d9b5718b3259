//! Sijil MPI - a master patient index service.
//!
//! The service mediates identity-changing writes to a downstream clinical
//! FHIR store: it validates incoming `Parameters` documents against a closed
//! profile family, enforces the identity business rules, binds one-time
//! confirmation codes to workflow tasks, and commits every state change as a
//! single transaction bundle. The engine itself is stateless; all durable
//! state lives in the clinical store.

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod logging;
pub mod services;
pub mod state;

pub use error::{Error, Result};
