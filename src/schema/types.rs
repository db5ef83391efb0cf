//! Core record types for LDAPv3 schema elements.
//!
//! This module contains the five element kinds published in a subschema
//! subentry (RFC 4512 section 4.1): object classes, attribute types, LDAP
//! syntaxes, matching rules and matching rule uses, together with the small
//! enums and the extension map they share.

use super::parser;
use crate::error::ParseResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// OID of the object class that permits any user attribute (RFC 4512 section 4.3).
pub const EXTENSIBLE_OBJECT_OID: &str = "1.3.6.1.4.1.1466.101.120.111";

/// The five kinds of schema element a subschema subentry publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    ObjectClass,
    AttributeType,
    LdapSyntax,
    MatchingRule,
    MatchingRuleUse,
}

impl ElementKind {
    /// All kinds, in the order a subentry conventionally lists them.
    pub const ALL: [ElementKind; 5] = [
        ElementKind::LdapSyntax,
        ElementKind::MatchingRule,
        ElementKind::MatchingRuleUse,
        ElementKind::AttributeType,
        ElementKind::ObjectClass,
    ];

    /// Name of the subentry attribute holding definitions of this kind.
    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::ObjectClass => "objectClasses",
            Self::AttributeType => "attributeTypes",
            Self::LdapSyntax => "ldapSyntaxes",
            Self::MatchingRule => "matchingRules",
            Self::MatchingRuleUse => "matchingRuleUse",
        }
    }

    /// Map a subentry attribute name to its kind, ignoring ASCII case.
    pub fn from_attribute_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.attribute_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ObjectClass => "ObjectClass",
            Self::AttributeType => "AttributeType",
            Self::LdapSyntax => "LDAPSyntax",
            Self::MatchingRule => "MatchingRule",
            Self::MatchingRuleUse => "MatchingRuleUse",
        };
        f.write_str(label)
    }
}

/// Attribute type usage (RFC 4512 `USAGE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Usage {
    /// Ordinary user attribute
    #[default]
    UserApplications,
    /// Operational attribute private to one server
    DirectoryOperation,
    /// Operational attribute shared between servers
    DistributedOperation,
    /// Operational attribute specific to a DSA
    #[serde(rename = "dSAOperation")]
    DsaOperation,
}

impl Usage {
    /// Keyword as written after `USAGE`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserApplications => "userApplications",
            Self::DirectoryOperation => "directoryOperation",
            Self::DistributedOperation => "distributedOperation",
            Self::DsaOperation => "dSAOperation",
        }
    }

    /// Parse a `USAGE` keyword. Matching is case-sensitive.
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "userApplications" => Some(Self::UserApplications),
            "directoryOperation" => Some(Self::DirectoryOperation),
            "distributedOperation" => Some(Self::DistributedOperation),
            "dSAOperation" => Some(Self::DsaOperation),
            _ => None,
        }
    }
}

/// Object class kind (RFC 4512 `ABSTRACT` / `STRUCTURAL` / `AUXILIARY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectClassKind {
    Abstract,
    #[default]
    Structural,
    Auxiliary,
}

impl ObjectClassKind {
    /// Keyword written in an object class definition.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abstract => "ABSTRACT",
            Self::Structural => "STRUCTURAL",
            Self::Auxiliary => "AUXILIARY",
        }
    }
}

/// Value of one `X-` extension clause.
///
/// The written shape is kept: `X-ORIGIN 'a'` is [`ExtensionValue::Single`]
/// while `X-ORIGIN ( 'a' )` is a one-element [`ExtensionValue::Multi`], and
/// each serializes back the way it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionValue {
    Single(String),
    Multi(Vec<String>),
}

impl ExtensionValue {
    /// Values in written order, one for a single value.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multi(values) => values,
        }
    }
}

/// Ordered `X-` extensions of a schema element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionMap(Vec<(String, ExtensionValue)>);

impl ExtensionMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an extension, keeping the position of a replaced keyword.
    pub fn insert(&mut self, keyword: impl Into<String>, value: ExtensionValue) {
        let keyword = keyword.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == keyword) {
            Some(slot) => slot.1 = value,
            None => self.0.push((keyword, value)),
        }
    }

    /// Value of an extension. Keywords are compared exactly.
    pub fn get(&self, keyword: &str) -> Option<&ExtensionValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == keyword)
            .map(|(_, value)| value)
    }

    /// Values of an extension; empty when the keyword is absent.
    pub fn values(&self, keyword: &str) -> &[String] {
        self.get(keyword).map(ExtensionValue::values).unwrap_or(&[])
    }

    /// True when the keyword is present.
    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    /// Extensions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExtensionValue)> {
        self.0.iter().map(|(keyword, value)| (keyword.as_str(), value))
    }

    /// Number of extensions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the element carries no extensions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ExtensionValue)> for ExtensionMap {
    fn from_iter<I: IntoIterator<Item = (K, ExtensionValue)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (keyword, value) in iter {
            map.insert(keyword, value);
        }
        map
    }
}

/// Behaviour shared by the five record kinds.
pub trait SchemaElement: Sized + Clone + fmt::Display {
    /// Which namespace of the registry the element lives in.
    const KIND: ElementKind;

    /// Numeric OID or descriptor identifying the element.
    fn oid(&self) -> &str;

    /// Short names from the `NAME` clause.
    fn names(&self) -> &[String];

    fn description(&self) -> Option<&str>;

    fn extensions(&self) -> &ExtensionMap;

    /// Parse one RFC 4512 definition string.
    fn parse(definition: &str) -> ParseResult<Self>;

    /// Serialize back to definition-string form.
    fn to_text(&self) -> String {
        self.to_string()
    }

    /// First name, or the OID for elements without one.
    fn display_name(&self) -> &str {
        self.names().first().map(String::as_str).unwrap_or(self.oid())
    }

    /// True when `key` is this element's OID or one of its names, ignoring ASCII case.
    fn is_identified_by(&self, key: &str) -> bool {
        let key = key.trim();
        self.oid().eq_ignore_ascii_case(key)
            || self.names().iter().any(|name| name.eq_ignore_ascii_case(key))
    }

    /// Values of the `X-ORIGIN` extension.
    fn x_origin(&self) -> &[String] {
        self.extensions().values("X-ORIGIN")
    }
}

/// Elements that name superior elements of the same kind through `SUP`.
pub trait Inheriting: SchemaElement {
    fn superiors(&self) -> &[String];
}

/// An attribute type definition (RFC 4512 section 4.1.2).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeType {
    pub oid: String,
    pub names: Vec<String>,
    pub desc: Option<String>,
    pub obsolete: bool,
    /// Superior attribute type, by OID or name
    pub sup: Option<String>,
    pub equality: Option<String>,
    pub ordering: Option<String>,
    pub substr: Option<String>,
    /// Syntax OID; inherited from `sup` when absent
    pub syntax: Option<String>,
    /// Suggested maximum length from `SYNTAX oid{len}`
    pub syntax_len: Option<u32>,
    pub single_value: bool,
    pub collective: bool,
    pub no_user_modification: bool,
    pub usage: Usage,
    pub extensions: ExtensionMap,
}

/// An object class definition (RFC 4512 section 4.1.1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectClass {
    pub oid: String,
    pub names: Vec<String>,
    pub desc: Option<String>,
    pub obsolete: bool,
    /// Superior classes, by OID or name
    pub sup: Vec<String>,
    pub kind: ObjectClassKind,
    /// Mandatory attribute types
    pub must: Vec<String>,
    /// Permitted attribute types
    pub may: Vec<String>,
    pub extensions: ExtensionMap,
}

/// An LDAP syntax description (RFC 4512 section 4.1.5).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LdapSyntax {
    pub oid: String,
    pub desc: Option<String>,
    pub extensions: ExtensionMap,
}

impl LdapSyntax {
    /// `X-NOT-HUMAN-READABLE 'TRUE'`
    pub fn not_human_readable(&self) -> bool {
        self.flag_extension("X-NOT-HUMAN-READABLE")
    }

    /// `X-BINARY-TRANSFER-REQUIRED 'TRUE'`
    pub fn binary_transfer_required(&self) -> bool {
        self.flag_extension("X-BINARY-TRANSFER-REQUIRED")
    }

    fn flag_extension(&self, keyword: &str) -> bool {
        matches!(self.extensions.values(keyword), [value] if value.eq_ignore_ascii_case("TRUE"))
    }
}

/// A matching rule description (RFC 4512 section 4.1.3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingRule {
    pub oid: String,
    pub names: Vec<String>,
    pub desc: Option<String>,
    pub obsolete: bool,
    /// Assertion syntax OID
    pub syntax: String,
    pub extensions: ExtensionMap,
}

/// A matching rule use description (RFC 4512 section 4.1.4).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingRuleUse {
    pub oid: String,
    pub names: Vec<String>,
    pub desc: Option<String>,
    pub obsolete: bool,
    /// Attribute types the rule applies to
    pub applies: Vec<String>,
    pub extensions: ExtensionMap,
}

macro_rules! schema_element {
    ($record:ty, $kind:ident, names: |$n:ident| $names:expr, parse: $parse:path) => {
        impl SchemaElement for $record {
            const KIND: ElementKind = ElementKind::$kind;

            fn oid(&self) -> &str {
                &self.oid
            }

            fn names(&self) -> &[String] {
                let $n = self;
                $names
            }

            fn description(&self) -> Option<&str> {
                self.desc.as_deref()
            }

            fn extensions(&self) -> &ExtensionMap {
                &self.extensions
            }

            fn parse(definition: &str) -> ParseResult<Self> {
                $parse(definition)
            }
        }

        impl std::str::FromStr for $record {
            type Err = crate::error::ParseError;

            fn from_str(definition: &str) -> Result<Self, Self::Err> {
                <Self as SchemaElement>::parse(definition)
            }
        }
    };
}

schema_element!(
    AttributeType,
    AttributeType,
    names: |r| &r.names,
    parse: parser::parse_attribute_type
);
schema_element!(ObjectClass, ObjectClass, names: |r| &r.names, parse: parser::parse_object_class);
schema_element!(LdapSyntax, LdapSyntax, names: |_r| &[], parse: parser::parse_ldap_syntax);
schema_element!(
    MatchingRule,
    MatchingRule,
    names: |r| &r.names,
    parse: parser::parse_matching_rule
);
schema_element!(
    MatchingRuleUse,
    MatchingRuleUse,
    names: |r| &r.names,
    parse: parser::parse_matching_rule_use
);

impl Inheriting for ObjectClass {
    fn superiors(&self) -> &[String] {
        &self.sup
    }
}

impl Inheriting for AttributeType {
    fn superiors(&self) -> &[String] {
        self.sup.as_slice()
    }
}
