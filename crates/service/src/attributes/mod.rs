//! Attribute gateway: authorize, canonicalize, then read or write the table.
//!
//! Same layering as the other service modules: domain types, errors, and a
//! service that depends only on the [`Authorizer`](crate::authz::Authorizer)
//! and [`KeyValueStore`](crate::storage::KeyValueStore) traits.

pub mod domain;
pub mod errors;
pub mod service;

pub use domain::AttributeRecord;
pub use errors::AttributeError;
pub use service::AttributeService;
