//! LDAPv3 subschema parsing and resolution for Rust.
//!
//! Turns the definition strings published by a directory's subschema
//! subentry (RFC 4512) into a cross-referenced, read-only schema model that
//! answers the questions a directory-aware application asks: which attributes
//! an entry of given object classes must and may carry, what the effective
//! syntax of an attribute is, and whether a class derives from another.
//!
//! # Core Components
//!
//! - [`SubSchema`] - Registry of parsed schema elements with lookup and resolution
//! - [`SchemaElement`] - Parsing and serialization shared by all element kinds
//! - [`SubschemaSource`] - Seam for whatever fetches the raw subentry values
//!
//! # Quick Start
//!
//! ```rust
//! use ldap_schema::{AttributeType, SubSchema};
//! use std::collections::HashMap;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut attrs = HashMap::new();
//! attrs.insert("attributeTypes", vec![
//!     "( 2.5.4.41 NAME 'name' EQUALITY caseIgnoreMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15{32768} )",
//!     "( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )",
//! ]);
//!
//! let schema = SubSchema::from_entry("cn=Subschema", attrs);
//! let cn = schema.get::<AttributeType>("commonName")?;
//! assert_eq!(
//!     schema.inherited_syntax(cn)?,
//!     Some("1.3.6.1.4.1.1466.115.121.1.15")
//! );
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod schema;
pub mod source;

// Re-export commonly used types for convenience
pub use error::{ParseError, ParseErrorKind, ParseResult, SchemaError, SchemaResult};
pub use schema::{
    AttributeSet, AttributeType, ElementKind, ExtensionMap, ExtensionValue, LdapSyntax,
    MatchingRule, MatchingRuleUse, ObjectClass, ObjectClassKind, SchemaElement, SubSchema,
    SubSchemaBuilder, Usage,
};
pub use source::{LdifSource, RawSubentry, SubschemaSource};
