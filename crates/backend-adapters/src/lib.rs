//! # backend-adapters
//!
//! Implementations of the `domains` ports. The Fomí backend is one hosted
//! service, so a single adapter struct per variant covers auth, relational
//! data and object storage together:
//!
//! - [`rest`] (feature `backend-rest`): the production adapter, speaking
//!   the backend's HTTP surface (relational endpoint with filter/embed
//!   query parameters, token-based auth endpoint, bucket object storage).
//! - [`memory`] (feature `memory`): a complete in-process backend for
//!   tests and the offline demo, with seeding helpers and failure
//!   injection.

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "backend-rest")]
pub mod rest;
