//! Mandatory and permitted attribute resolution for object classes.
//!
//! Given the object classes of an entry, walks each class's superior chain
//! and merges the `MUST` and `MAY` lists of every class reached. An attribute
//! that is mandatory anywhere in the merged set is reported only as
//! mandatory.

use super::registry::SubSchema;
use super::types::{AttributeType, ObjectClass, ObjectClassKind, SchemaElement};
use crate::error::{SchemaError, SchemaResult};

use log::{debug, trace};
use std::collections::{BTreeMap, HashSet};

/// Attribute types allowed on an entry, keyed by attribute type OID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet<'s> {
    /// Mandatory attribute types
    pub must: BTreeMap<String, &'s AttributeType>,
    /// Permitted attribute types that are not mandatory
    pub may: BTreeMap<String, &'s AttributeType>,
    /// An `extensibleObject` class was reached, so any attribute is permitted
    pub extensible: bool,
}

impl<'s> AttributeSet<'s> {
    /// True when `key` (OID or name) is mandatory.
    pub fn requires(&self, key: &str) -> bool {
        self.must.values().any(|at| at.is_identified_by(key))
    }

    /// True when `key` (OID or name) may appear, either because it is listed
    /// or because the set is extensible.
    pub fn permits(&self, key: &str) -> bool {
        self.extensible
            || self.requires(key)
            || self.may.values().any(|at| at.is_identified_by(key))
    }
}

impl SubSchema {
    /// Mandatory and permitted attribute types of an entry carrying `classes`.
    ///
    /// Each class and all of its superiors are visited once, even when several
    /// requested classes share ancestors. A `MUST` or `MAY` reference to an
    /// undefined attribute type fails with
    /// [`SchemaError::AttributeResolution`] naming the class that introduced it.
    pub fn mandatory_and_permitted<'s>(
        &'s self,
        classes: &[&'s ObjectClass],
    ) -> SchemaResult<AttributeSet<'s>> {
        let mut set = AttributeSet::default();
        let mut visited: HashSet<String> = HashSet::new();

        for &requested in classes {
            for class in self.superior_chain(requested)? {
                if !visited.insert(class.oid.to_ascii_lowercase()) {
                    continue;
                }
                trace!("Collecting attributes of object class {}", class.display_name());

                if self.is_extensible(class) {
                    set.extensible = true;
                }

                for reference in &class.must {
                    let at = self.resolve_attribute(reference, class)?;
                    set.may.remove(&at.oid);
                    set.must.insert(at.oid.clone(), at);
                }
                for reference in &class.may {
                    let at = self.resolve_attribute(reference, class)?;
                    if !set.must.contains_key(&at.oid) {
                        set.may.insert(at.oid.clone(), at);
                    }
                }
            }
        }

        debug!(
            "Resolved {} object classes to {} mandatory and {} permitted attribute types",
            classes.len(),
            set.must.len(),
            set.may.len()
        );
        Ok(set)
    }

    /// Like [`SubSchema::mandatory_and_permitted`], taking class names or OIDs.
    pub fn attribute_types_for(&self, classes: &[&str]) -> SchemaResult<AttributeSet<'_>> {
        let classes = classes
            .iter()
            .map(|key| self.get::<ObjectClass>(key))
            .collect::<SchemaResult<Vec<_>>>()?;
        self.mandatory_and_permitted(&classes)
    }

    /// The most specific structural class among `classes`.
    ///
    /// A structural class that is a superior of another listed structural
    /// class is passed over. Returns `None` when no class is structural.
    pub fn structural_object_class<'s>(
        &'s self,
        classes: &[&'s ObjectClass],
    ) -> SchemaResult<Option<&'s ObjectClass>> {
        let structural: Vec<&ObjectClass> = classes
            .iter()
            .copied()
            .filter(|class| class.kind == ObjectClassKind::Structural)
            .collect();

        for &candidate in &structural {
            let mut is_superior = false;
            for &other in &structural {
                if std::ptr::eq(other, candidate)
                    || other.oid.eq_ignore_ascii_case(&candidate.oid)
                {
                    continue;
                }
                if self.derives_from(other, &candidate.oid)? {
                    is_superior = true;
                    break;
                }
            }
            if !is_superior {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn resolve_attribute(
        &self,
        reference: &str,
        class: &ObjectClass,
    ) -> SchemaResult<&AttributeType> {
        self.find::<AttributeType>(reference)
            .ok_or_else(|| SchemaError::attribute_resolution(reference, class.display_name()))
    }
}
