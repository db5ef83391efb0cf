//! Integration tests against fixture subentries.

pub mod resolution;
pub mod subschema_ldif;
