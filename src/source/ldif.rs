//! Minimal LDIF reader for subschema subentry dumps.
//!
//! Reads the first content record of an LDIF document (RFC 2849): comments,
//! the optional `version:` line, folded continuation lines, plain values and
//! base64 (`::`) values. URL values (`:<`) and change records are rejected.

use super::{RawSubentry, SubschemaSource};
use crate::error::{SchemaError, SchemaResult};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Input {
    File(PathBuf),
    Text(String),
}

/// A [`SubschemaSource`] reading an LDIF file or string.
///
/// # Examples
///
/// ```rust
/// use ldap_schema::source::LdifSource;
/// use ldap_schema::{ObjectClass, SubSchema};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = LdifSource::from_text(
///     "dn: cn=schema\n\
///      objectClasses: ( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )\n",
/// );
/// let schema = SubSchema::from_source(&source)?;
/// assert_eq!(schema.subschema_dn(), Some("cn=schema"));
/// assert!(schema.find::<ObjectClass>("top").is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LdifSource {
    input: Input,
}

impl LdifSource {
    /// Read the LDIF file at `path` when the source is fetched.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            input: Input::File(path.as_ref().to_path_buf()),
        }
    }

    /// LDIF held in memory.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            input: Input::Text(text.into()),
        }
    }
}

impl SubschemaSource for LdifSource {
    fn fetch(&self) -> SchemaResult<RawSubentry> {
        match &self.input {
            Input::File(path) => {
                debug!("Reading subschema LDIF from {}", path.display());
                let text = fs::read_to_string(path)?;
                parse_first_record(&text)
            }
            Input::Text(text) => parse_first_record(text),
        }
    }
}

/// Join folded lines, dropping comments. Yields `(line_number, logical_line)`,
/// with an empty logical line for each record separator.
fn unfold(text: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    let mut in_comment = false;

    for (number, line) in text.lines().enumerate() {
        let number = number + 1;
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(continuation) = line.strip_prefix(' ') {
            if in_comment {
                continue;
            }
            if let Some((_, last)) = lines.last_mut().filter(|(_, last)| !last.is_empty()) {
                last.push_str(continuation);
                continue;
            }
        }

        in_comment = line.starts_with('#');
        if !in_comment {
            lines.push((number, line.to_string()));
        }
    }
    lines
}

/// Parse the first content record of an LDIF document.
pub fn parse_first_record(text: &str) -> SchemaResult<RawSubentry> {
    let mut entry: Option<RawSubentry> = None;

    for (number, line) in unfold(text) {
        if line.trim().is_empty() {
            if entry.is_some() {
                break;
            }
            continue;
        }

        let (attribute, value) = split_line(number, &line)?;

        if let Some(record) = entry.as_mut() {
            if attribute.eq_ignore_ascii_case("changetype") {
                return Err(SchemaError::ldif(number, "change records are not supported"));
            }
            record.push_value(attribute, value);
            continue;
        }

        if attribute.eq_ignore_ascii_case("version") {
            continue;
        }
        if !attribute.eq_ignore_ascii_case("dn") {
            return Err(SchemaError::ldif(
                number,
                format!("expected 'dn:', found '{attribute}:'"),
            ));
        }
        let dn = String::from_utf8(value)
            .map_err(|_| SchemaError::ldif(number, "dn is not valid UTF-8"))?;
        entry = Some(RawSubentry::new(dn));
    }

    entry.ok_or_else(|| SchemaError::ldif(1, "no record found"))
}

/// Split `attr: value` / `attr:: base64` into the attribute description
/// (options stripped) and the decoded value.
fn split_line(number: usize, line: &str) -> SchemaResult<(String, Vec<u8>)> {
    let (description, rest) = line
        .split_once(':')
        .ok_or_else(|| SchemaError::ldif(number, "missing ':' separator"))?;
    let attribute = description
        .split(';')
        .next()
        .unwrap_or(description)
        .trim()
        .to_string();
    if attribute.is_empty() {
        return Err(SchemaError::ldif(number, "empty attribute name"));
    }

    let value = if let Some(encoded) = rest.strip_prefix(':') {
        BASE64
            .decode(encoded.trim())
            .map_err(|e| SchemaError::ldif(number, format!("invalid base64 value: {e}")))?
    } else if rest.starts_with('<') {
        return Err(SchemaError::ldif(number, "URL values are not supported"));
    } else {
        rest.trim_start_matches(' ').as_bytes().to_vec()
    };

    Ok((attribute, value))
}
