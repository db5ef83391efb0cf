//! Sources of raw subschema subentry values.
//!
//! The registry does not talk to a directory itself. A [`SubschemaSource`]
//! hands it the subentry's DN and attribute values, already fetched; the
//! transport behind it (an LDAP search, a file, a cache) is the source's
//! business.
//!
//! # Examples
//!
//! ```rust
//! use ldap_schema::source::{RawSubentry, SubschemaSource};
//! use ldap_schema::{SchemaResult, SubSchema};
//!
//! struct Fixed;
//!
//! impl SubschemaSource for Fixed {
//!     fn fetch(&self) -> SchemaResult<RawSubentry> {
//!         let mut entry = RawSubentry::new("cn=Subschema");
//!         entry.push_value("ldapSyntaxes", "( 1.3.6.1.4.1.1466.115.121.1.15 DESC 'Directory String' )");
//!         Ok(entry)
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = SubSchema::from_source(&Fixed)?;
//! assert_eq!(schema.subschema_dn(), Some("cn=Subschema"));
//! # Ok(())
//! # }
//! ```

pub mod ldif;

pub use ldif::LdifSource;

use crate::error::SchemaResult;
use std::collections::HashMap;

/// DN and raw attribute values of a fetched subschema subentry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSubentry {
    pub dn: String,
    pub attributes: HashMap<String, Vec<Vec<u8>>>,
}

impl RawSubentry {
    /// Subentry with no attributes yet.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Append one value to an attribute, keeping value order.
    pub fn push_value(&mut self, attribute: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.attributes
            .entry(attribute.into())
            .or_default()
            .push(value.into());
    }
}

/// Supplies the raw values of one subschema subentry.
pub trait SubschemaSource {
    /// Read the subentry. Called once per registry build.
    fn fetch(&self) -> SchemaResult<RawSubentry>;
}

impl SubschemaSource for RawSubentry {
    fn fetch(&self) -> SchemaResult<RawSubentry> {
        Ok(self.clone())
    }
}
