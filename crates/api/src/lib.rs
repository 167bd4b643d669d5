//! Items field API server library.
//!
//! A reference host for the items field: it boots a field registry, serves
//! field metadata and widget views, and runs submissions through the
//! fill/validate/persist round trip against an in-memory record store.
//! Exposed as a library so integration tests and the binary entrypoint
//! share the same building blocks.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod store;
