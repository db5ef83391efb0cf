//! Error types for schema parsing and resolution.
//!
//! Parsing failures are reported per definition through [`ParseError`] and are
//! never fatal to building a [`SubSchema`](crate::SubSchema). Resolution
//! failures are reported through [`SchemaError`] by the query that hit them.

use crate::schema::types::ElementKind;

/// Main error type for registry lookups and resolution.
///
/// Every variant except [`SchemaError::Parse`] is produced by a read-side
/// query against an already built registry; the registry itself stays usable
/// after any of them.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A single definition string does not conform to the grammar
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Direct lookup found no element of the requested kind
    #[error("{kind} not found: {key}")]
    NotFound { kind: ElementKind, key: String },

    /// A superior chain revisits an element already on the current walk
    #[error("Cycle in {kind} superior chain: {}", chain.join(" -> "))]
    Cycle { kind: ElementKind, chain: Vec<String> },

    /// A MUST or MAY reference names an attribute type absent from the schema
    #[error("Attribute type '{reference}' required by object class '{object_class}' is not defined")]
    AttributeResolution {
        reference: String,
        object_class: String,
    },

    /// A SUP, EQUALITY, ORDERING, SUBSTR or SYNTAX reference does not resolve
    #[error("{kind} '{reference}' referenced by '{referrer}' is not defined")]
    UnresolvedReference {
        kind: ElementKind,
        reference: String,
        referrer: String,
    },

    /// The LDIF source could not be read
    #[error("LDIF error at line {line}: {message}")]
    Ldif { line: usize, message: String },

    /// I/O failure while reading a schema source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to parse one RFC 4512 definition string.
///
/// Carries the full definition, the byte offset at which parsing stopped and
/// the fragment found there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} at offset {offset} near '{fragment}' in \"{definition}\"")]
pub struct ParseError {
    /// The complete definition text as supplied
    pub definition: String,
    /// Byte offset into `definition` where parsing failed
    pub offset: usize,
    /// The token or text found at `offset`
    pub fragment: String,
    /// What went wrong
    pub reason: ParseErrorKind,
}

/// Grammar violations detected by the definition parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("definition must start with '('")]
    MissingOpenParen,

    #[error("definition must end with ')'")]
    MissingCloseParen,

    #[error("unexpected input after closing ')'")]
    TrailingInput,

    #[error("missing OID")]
    MissingOid,

    #[error("malformed OID '{0}'")]
    MalformedOid(String),

    #[error("unknown keyword '{0}'")]
    UnknownKeyword(String),

    #[error("keyword '{0}' appears more than once")]
    DuplicateKeyword(String),

    #[error("conflicting object class kind '{0}'")]
    ConflictingKind(String),

    #[error("keyword '{0}' requires a value")]
    MissingValue(String),

    #[error("invalid value for '{keyword}': {detail}")]
    InvalidValue { keyword: String, detail: String },

    #[error("empty value list for '{0}'")]
    EmptyList(String),

    #[error("unterminated quoted string")]
    UnterminatedString,

    #[error("required clause '{0}' is missing")]
    MissingClause(String),

    #[error("definition is not valid UTF-8")]
    InvalidUtf8,
}

// Convenience methods for creating common errors
impl SchemaError {
    /// Create a not found error
    pub fn not_found(kind: ElementKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Create an unresolved attribute reference error
    pub fn attribute_resolution(
        reference: impl Into<String>,
        object_class: impl Into<String>,
    ) -> Self {
        Self::AttributeResolution {
            reference: reference.into(),
            object_class: object_class.into(),
        }
    }

    /// Create an unresolved reference error
    pub fn unresolved(
        kind: ElementKind,
        reference: impl Into<String>,
        referrer: impl Into<String>,
    ) -> Self {
        Self::UnresolvedReference {
            kind,
            reference: reference.into(),
            referrer: referrer.into(),
        }
    }

    /// Create an LDIF format error
    pub fn ldif(line: usize, message: impl Into<String>) -> Self {
        Self::Ldif {
            line,
            message: message.into(),
        }
    }
}

impl ParseError {
    /// Build an error for `definition`, taking the fragment that starts at `offset`.
    pub fn new(definition: &str, offset: usize, reason: ParseErrorKind) -> Self {
        let fragment = definition
            .get(offset..)
            .unwrap_or_default()
            .chars()
            .take(24)
            .collect();
        Self {
            definition: definition.to_string(),
            offset,
            fragment,
            reason,
        }
    }
}

/// Result of a registry operation.
pub type SchemaResult<T> = Result<T, SchemaError>;
/// Result of parsing one definition string.
pub type ParseResult<T> = Result<T, ParseError>;
