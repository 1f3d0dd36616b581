//! Service layer for custom attributes.
//! - Canonicalizes resource identifiers into storage keys.
//! - Gates every read and write behind the delegated authorizer.
//! - Keeps storage and authorization behind traits so either can be swapped.

pub mod attributes;
pub mod authz;
pub mod canonical;
pub mod runtime;
pub mod storage;
