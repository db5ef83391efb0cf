//! LDAPv3 schema definitions and the registry that resolves them.
//!
//! This module provides the RFC 4512 definition parser, the five schema
//! record kinds with their serializers, and the registry that indexes them
//! and follows the references between them.
//!
//! # Key Types
//!
//! - [`SubSchema`] - Registry of every element published by a subschema subentry
//! - [`ObjectClass`], [`AttributeType`], [`LdapSyntax`], [`MatchingRule`],
//!   [`MatchingRuleUse`] - Parsed definitions
//! - [`AttributeSet`] - Mandatory and permitted attributes of a set of object classes
//!
//! # Examples
//!
//! ```rust
//! use ldap_schema::schema::{ObjectClass, SchemaElement};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let oc: ObjectClass = "( 1.3.6.1.1.3.1 NAME 'uidObject' DESC 'RFC2377: uid object' SUP top AUXILIARY MUST uid )".parse()?;
//! assert_eq!(oc.must, vec!["uid"]);
//! assert_eq!(
//!     oc.to_text(),
//!     "( 1.3.6.1.1.3.1 NAME 'uidObject' DESC 'RFC2377: uid object' SUP top AUXILIARY MUST uid )"
//! );
//! # Ok(())
//! # }
//! ```

mod parser;
pub mod registry;
pub mod resolver;
pub mod types;
mod writer;


// Re-export the main types for convenience
pub use registry::{ElementIndex, Registered, SkippedDefinition, SubSchema, SubSchemaBuilder};
pub use resolver::AttributeSet;
pub use types::{
    AttributeType, EXTENSIBLE_OBJECT_OID, ElementKind, ExtensionMap, ExtensionValue, Inheriting,
    LdapSyntax, MatchingRule, MatchingRuleUse, ObjectClass, ObjectClassKind, SchemaElement, Usage,
};
