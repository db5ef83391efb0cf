//! Schema registry built from the values of a subschema subentry.
//!
//! This module provides [`SubSchema`], which parses every published
//! definition once, indexes the records of each kind by OID and by
//! case-folded name, and answers lookups and superior-chain walks on demand.
//! References between records are never resolved while building; a dangling
//! reference only surfaces when a query follows it.

use super::types::{
    AttributeType, EXTENSIBLE_OBJECT_OID, ElementKind, Inheriting, LdapSyntax, MatchingRule,
    MatchingRuleUse, ObjectClass, SchemaElement,
};
use crate::error::{ParseError, ParseErrorKind, SchemaError, SchemaResult};
use crate::source::SubschemaSource;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use log::{debug, info, trace, warn};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Index key for OIDs and names. Numeric OIDs are unaffected by case folding.
fn fold(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

/// Records of one kind, indexed by OID and by name.
#[derive(Debug, Clone)]
pub struct ElementIndex<T> {
    records: Vec<T>,
    by_oid: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl<T> Default for ElementIndex<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            by_oid: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T: SchemaElement> ElementIndex<T> {
    /// Insert a record. A record with an OID already present replaces the
    /// earlier one in place and the earlier record is returned. Names always
    /// point at the most recently inserted record carrying them.
    fn insert(&mut self, record: T) -> Option<T> {
        let oid_key = fold(record.oid());
        let (position, replaced) = match self.by_oid.get(&oid_key) {
            Some(&position) => {
                let previous = std::mem::replace(&mut self.records[position], record);
                self.by_name.retain(|_, slot| *slot != position);
                (position, Some(previous))
            }
            None => {
                self.records.push(record);
                let position = self.records.len() - 1;
                self.by_oid.insert(oid_key, position);
                (position, None)
            }
        };
        for name in self.records[position].names() {
            self.by_name.insert(fold(name), position);
        }
        replaced
    }

    fn position(&self, key: &str) -> Option<usize> {
        let key = fold(key);
        self.by_oid
            .get(&key)
            .or_else(|| self.by_name.get(&key))
            .copied()
    }

    /// Look up by OID or case-insensitive name.
    pub fn lookup(&self, key: &str) -> Option<&T> {
        self.position(key).map(|position| &self.records[position])
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no record of this kind was loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Selects the index holding one record kind inside a [`SubSchema`].
pub trait Registered: SchemaElement {
    fn index(schema: &SubSchema) -> &ElementIndex<Self>;
}

macro_rules! registered {
    ($record:ty, $field:ident) => {
        impl Registered for $record {
            fn index(schema: &SubSchema) -> &ElementIndex<Self> {
                &schema.$field
            }
        }
    };
}

registered!(ObjectClass, object_classes);
registered!(AttributeType, attribute_types);
registered!(LdapSyntax, ldap_syntaxes);
registered!(MatchingRule, matching_rules);
registered!(MatchingRuleUse, matching_rule_uses);

/// A definition that could not be parsed and was left out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDefinition {
    pub kind: ElementKind,
    pub error: ParseError,
}

/// Options for building a [`SubSchema`].
///
/// # Examples
///
/// ```rust
/// use ldap_schema::SubSchemaBuilder;
/// use std::collections::HashMap;
///
/// let mut attrs = HashMap::new();
/// attrs.insert("objectClasses", vec!["( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )"]);
///
/// let schema = SubSchemaBuilder::new()
///     .subschema_dn("cn=Subschema")
///     .build(attrs);
/// assert_eq!(schema.subschema_dn(), Some("cn=Subschema"));
/// ```
#[derive(Debug, Clone)]
pub struct SubSchemaBuilder {
    subschema_dn: Option<String>,
    extensible_class: String,
}

impl Default for SubSchemaBuilder {
    fn default() -> Self {
        Self {
            subschema_dn: None,
            extensible_class: "extensibleObject".to_string(),
        }
    }
}

impl SubSchemaBuilder {
    /// Builder with the default extensible class name.
    pub fn new() -> Self {
        Self::default()
    }

    /// DN of the subentry the values were read from. Kept for callers, never interpreted.
    pub fn subschema_dn(mut self, dn: impl Into<String>) -> Self {
        self.subschema_dn = Some(dn.into());
        self
    }

    /// Name or OID of the object class that permits any attribute.
    pub fn extensible_class(mut self, name_or_oid: impl Into<String>) -> Self {
        self.extensible_class = name_or_oid.into();
        self
    }

    /// Parse and index every definition in `attrs`.
    ///
    /// Keys are subentry attribute names (`objectClasses`, `attributeTypes`,
    /// `ldapSyntaxes`, `matchingRules`, `matchingRuleUse`), matched ignoring
    /// ASCII case; other keys are ignored. Definitions that fail to parse are
    /// recorded in [`SubSchema::skipped`].
    pub fn build<I, K, V>(self, attrs: I) -> SubSchema
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<[u8]>,
    {
        let mut schema = SubSchema {
            subschema_dn: self.subschema_dn,
            extensible_class: self.extensible_class,
            object_classes: ElementIndex::default(),
            attribute_types: ElementIndex::default(),
            ldap_syntaxes: ElementIndex::default(),
            matching_rules: ElementIndex::default(),
            matching_rule_uses: ElementIndex::default(),
            skipped: Vec::new(),
        };

        for (name, values) in attrs {
            let Some(kind) = ElementKind::from_attribute_name(name.as_ref()) else {
                trace!("Ignoring subentry attribute {}", name.as_ref());
                continue;
            };
            for value in values {
                schema.load(kind, value.as_ref());
            }
        }

        info!(
            "Loaded subschema {}: {} object classes, {} attribute types, {} syntaxes, {} matching rules, {} matching rule uses, {} skipped",
            schema.subschema_dn.as_deref().unwrap_or("<unnamed>"),
            schema.object_classes.len(),
            schema.attribute_types.len(),
            schema.ldap_syntaxes.len(),
            schema.matching_rules.len(),
            schema.matching_rule_uses.len(),
            schema.skipped.len()
        );
        schema
    }
}

/// In-memory model of a directory's schema.
///
/// Built once from a snapshot of subentry values and read-only afterwards, so
/// a built registry can be shared between threads without locking.
///
/// # Examples
///
/// ```rust
/// use ldap_schema::{ObjectClass, SubSchema};
/// use std::collections::HashMap;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut attrs = HashMap::new();
/// attrs.insert("objectClasses", vec![
///     "( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )",
///     "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) )",
/// ]);
/// attrs.insert("attributeTypes", vec![
///     "( 2.5.4.0 NAME 'objectClass' EQUALITY objectIdentifierMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.38 )",
///     "( 2.5.4.41 NAME 'name' EQUALITY caseIgnoreMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15{32768} )",
///     "( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )",
///     "( 2.5.4.4 NAME ( 'sn' 'surname' ) SUP name )",
/// ]);
///
/// let schema = SubSchema::build(attrs);
/// let person = schema.get::<ObjectClass>("PERSON")?;
/// let attrs = schema.mandatory_and_permitted(&[person])?;
/// assert_eq!(attrs.must.len(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SubSchema {
    subschema_dn: Option<String>,
    extensible_class: String,
    object_classes: ElementIndex<ObjectClass>,
    attribute_types: ElementIndex<AttributeType>,
    ldap_syntaxes: ElementIndex<LdapSyntax>,
    matching_rules: ElementIndex<MatchingRule>,
    matching_rule_uses: ElementIndex<MatchingRuleUse>,
    skipped: Vec<SkippedDefinition>,
}

impl SubSchema {
    /// Build a registry with default options.
    pub fn build<I, K, V>(attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<[u8]>,
    {
        SubSchemaBuilder::new().build(attrs)
    }

    /// Build a registry from the values of the subentry named `dn`.
    pub fn from_entry<I, K, V>(dn: impl Into<String>, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<[u8]>,
    {
        SubSchemaBuilder::new().subschema_dn(dn).build(attrs)
    }

    /// Fetch the subentry from `source` and build a registry from it.
    pub fn from_source<S: SubschemaSource + ?Sized>(source: &S) -> SchemaResult<Self> {
        let entry = source.fetch()?;
        debug!("Fetched subschema subentry {}", entry.dn);
        Ok(Self::from_entry(entry.dn, entry.attributes))
    }

    fn load(&mut self, kind: ElementKind, raw: &[u8]) {
        let text = match std::str::from_utf8(raw) {
            Ok(text) => text,
            Err(e) => {
                let lossy = String::from_utf8_lossy(raw);
                let error = ParseError::new(&lossy, e.valid_up_to(), ParseErrorKind::InvalidUtf8);
                self.skip(kind, error);
                return;
            }
        };
        let result = match kind {
            ElementKind::ObjectClass => Self::insert_parsed(&mut self.object_classes, text),
            ElementKind::AttributeType => Self::insert_parsed(&mut self.attribute_types, text),
            ElementKind::LdapSyntax => Self::insert_parsed(&mut self.ldap_syntaxes, text),
            ElementKind::MatchingRule => Self::insert_parsed(&mut self.matching_rules, text),
            ElementKind::MatchingRuleUse => {
                Self::insert_parsed(&mut self.matching_rule_uses, text)
            }
        };
        if let Err(error) = result {
            self.skip(kind, error);
        }
    }

    fn insert_parsed<T: SchemaElement>(
        index: &mut ElementIndex<T>,
        text: &str,
    ) -> Result<(), ParseError> {
        let record = T::parse(text)?;
        if let Some(previous) = index.insert(record) {
            warn!(
                "Duplicate {} OID {}: replaced earlier definition",
                T::KIND,
                previous.oid()
            );
        }
        Ok(())
    }

    fn skip(&mut self, kind: ElementKind, error: ParseError) {
        warn!("Skipping malformed {} definition: {}", kind, error);
        self.skipped.push(SkippedDefinition { kind, error });
    }

    /// DN of the subentry this registry was built from, if known.
    pub fn subschema_dn(&self) -> Option<&str> {
        self.subschema_dn.as_deref()
    }

    /// Definitions that failed to parse during construction.
    pub fn skipped(&self) -> &[SkippedDefinition] {
        &self.skipped
    }

    /// Look up an element by OID or case-insensitive name.
    pub fn get<T: Registered>(&self, key: &str) -> SchemaResult<&T> {
        self.find(key)
            .ok_or_else(|| SchemaError::not_found(T::KIND, key))
    }

    /// Like [`SubSchema::get`], returning `None` on a miss.
    pub fn find<T: Registered>(&self, key: &str) -> Option<&T> {
        T::index(self).lookup(key)
    }

    /// All elements of one kind, in insertion order.
    pub fn list_all<T: Registered>(&self) -> &[T] {
        T::index(self).records()
    }

    pub(crate) fn is_extensible(&self, class: &ObjectClass) -> bool {
        class.oid == EXTENSIBLE_OBJECT_OID
            || class.is_identified_by(&self.extensible_class)
    }

    /// The element followed by every element reachable through `SUP`,
    /// depth-first in declaration order, each exactly once.
    ///
    /// Fails with [`SchemaError::Cycle`] when a superior reference leads back
    /// to an element on the current path, and with
    /// [`SchemaError::UnresolvedReference`] when a superior is not defined.
    pub fn superior_chain<'s, T>(&'s self, element: &'s T) -> SchemaResult<Vec<&'s T>>
    where
        T: Registered + Inheriting,
    {
        let index = T::index(self);
        let mut chain = vec![element];
        let mut seen: HashSet<String> = HashSet::from([fold(element.oid())]);
        let mut path: Vec<(&T, usize)> = vec![(element, 0)];

        while let Some(frame) = path.last_mut() {
            let (current, next) = *frame;
            let Some(reference) = current.superiors().get(next) else {
                path.pop();
                continue;
            };
            frame.1 += 1;

            let superior = index.lookup(reference).ok_or_else(|| {
                SchemaError::unresolved(T::KIND, reference, current.display_name())
            })?;
            let key = fold(superior.oid());

            if let Some(start) = path.iter().position(|(p, _)| fold(p.oid()) == key) {
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|(p, _)| p.display_name().to_string())
                    .collect();
                cycle.push(superior.display_name().to_string());
                return Err(SchemaError::Cycle {
                    kind: T::KIND,
                    chain: cycle,
                });
            }

            if seen.insert(key) {
                trace!(
                    "{} {} inherits from {}",
                    T::KIND,
                    current.display_name(),
                    superior.display_name()
                );
                chain.push(superior);
                path.push((superior, 0));
            }
        }

        Ok(chain)
    }

    /// True when `ancestor` names `element` itself or one of its superiors.
    pub fn derives_from<T>(&self, element: &T, ancestor: &str) -> SchemaResult<bool>
    where
        T: Registered + Inheriting,
    {
        Ok(self
            .superior_chain(element)?
            .iter()
            .any(|e| e.is_identified_by(ancestor)))
    }

    /// Elements that name `element` directly in their `SUP` clause.
    pub fn subordinates<'s, T>(&'s self, element: &T) -> Vec<&'s T>
    where
        T: Registered + Inheriting,
    {
        let index = T::index(self);
        let key = fold(element.oid());
        index
            .records()
            .iter()
            .filter(|candidate| {
                candidate.superiors().iter().any(|reference| {
                    index
                        .lookup(reference)
                        .is_some_and(|superior| fold(superior.oid()) == key)
                })
            })
            .collect()
    }

    /// First value of `field` along the attribute type's superior chain.
    fn inherited<'s>(
        &'s self,
        attribute: &'s AttributeType,
        field: impl Fn(&AttributeType) -> Option<&String>,
    ) -> SchemaResult<Option<&'s str>> {
        let mut current = attribute;
        let mut path = vec![current];
        loop {
            if let Some(value) = field(current) {
                return Ok(Some(value.as_str()));
            }
            let Some(reference) = &current.sup else {
                return Ok(None);
            };
            let superior = self.attribute_types.lookup(reference).ok_or_else(|| {
                SchemaError::unresolved(
                    ElementKind::AttributeType,
                    reference,
                    current.display_name(),
                )
            })?;
            if path.iter().any(|p| fold(p.oid()) == fold(superior.oid())) {
                let mut chain: Vec<String> =
                    path.iter().map(|p| p.display_name().to_string()).collect();
                chain.push(superior.display_name().to_string());
                return Err(SchemaError::Cycle {
                    kind: ElementKind::AttributeType,
                    chain,
                });
            }
            path.push(superior);
            current = superior;
        }
    }

    /// Syntax OID of an attribute type, inherited from its superiors when unset.
    pub fn inherited_syntax<'s>(
        &'s self,
        attribute: &'s AttributeType,
    ) -> SchemaResult<Option<&'s str>> {
        self.inherited(attribute, |at| at.syntax.as_ref())
    }

    /// Equality matching rule, inherited from superiors when unset.
    pub fn inherited_equality<'s>(
        &'s self,
        attribute: &'s AttributeType,
    ) -> SchemaResult<Option<&'s str>> {
        self.inherited(attribute, |at| at.equality.as_ref())
    }

    /// Ordering matching rule, inherited from superiors when unset.
    pub fn inherited_ordering<'s>(
        &'s self,
        attribute: &'s AttributeType,
    ) -> SchemaResult<Option<&'s str>> {
        self.inherited(attribute, |at| at.ordering.as_ref())
    }

    /// Substrings matching rule, inherited from superiors when unset.
    pub fn inherited_substr<'s>(
        &'s self,
        attribute: &'s AttributeType,
    ) -> SchemaResult<Option<&'s str>> {
        self.inherited(attribute, |at| at.substr.as_ref())
    }

    /// Effective syntax of an attribute type, resolved against the registry.
    ///
    /// `Ok(None)` when neither the attribute nor any superior declares a syntax.
    pub fn syntax_of(&self, attribute: &AttributeType) -> SchemaResult<Option<&LdapSyntax>> {
        let Some(oid) = self.inherited_syntax(attribute)? else {
            return Ok(None);
        };
        self.ldap_syntaxes
            .lookup(oid)
            .map(Some)
            .ok_or_else(|| {
                SchemaError::unresolved(ElementKind::LdapSyntax, oid, attribute.display_name())
            })
    }

    /// Effective equality matching rule of an attribute type.
    pub fn equality_rule_of(
        &self,
        attribute: &AttributeType,
    ) -> SchemaResult<Option<&MatchingRule>> {
        let Some(rule) = self.inherited_equality(attribute)? else {
            return Ok(None);
        };
        self.matching_rules
            .lookup(rule)
            .map(Some)
            .ok_or_else(|| {
                SchemaError::unresolved(ElementKind::MatchingRule, rule, attribute.display_name())
            })
    }

    /// Definition strings keyed by subentry attribute name, for re-publishing
    /// the schema. Kinds without elements are left out.
    pub fn to_record_mapping(&self) -> BTreeMap<String, Vec<String>> {
        fn texts<T: SchemaElement>(index: &ElementIndex<T>) -> Vec<String> {
            index.records().iter().map(T::to_text).collect()
        }

        let mut mapping = BTreeMap::new();
        for kind in ElementKind::ALL {
            let values = match kind {
                ElementKind::ObjectClass => texts(&self.object_classes),
                ElementKind::AttributeType => texts(&self.attribute_types),
                ElementKind::LdapSyntax => texts(&self.ldap_syntaxes),
                ElementKind::MatchingRule => texts(&self.matching_rules),
                ElementKind::MatchingRuleUse => texts(&self.matching_rule_uses),
            };
            if !values.is_empty() {
                mapping.insert(kind.attribute_name().to_string(), values);
            }
        }
        mapping
    }

    /// Short content hash of the canonical definitions.
    ///
    /// Equal for two registries whose records serialize identically, so a
    /// caller can tell whether a re-fetched schema changed.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (attribute, values) in self.to_record_mapping() {
            hasher.update(attribute.as_bytes());
            for value in values {
                hasher.update(b"\n");
                hasher.update(value.as_bytes());
            }
            hasher.update(b"\n\n");
        }
        let hash = hasher.finalize();
        BASE64.encode(&hash[..8])
    }
}
