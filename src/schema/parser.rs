//! Tokenizer and clause parser for RFC 4512 definition strings.
//!
//! A definition is parsed in two steps. [`tokenize`] splits the text into
//! parentheses, `$` separators, quoted strings and bare words, each tagged
//! with its byte offset. [`Definition::parse`] then reads the leading OID and
//! the keyword clauses against a per-kind grammar table, so that a flag such
//! as `OBSOLETE` is never mistaken for the value of the clause before it.
//! Record construction takes the clauses it knows and leaves nothing behind.

use super::types::{
    AttributeType, ExtensionMap, ExtensionValue, LdapSyntax, MatchingRule, MatchingRuleUse,
    ObjectClass, ObjectClassKind, Usage,
};
use crate::error::{ParseError, ParseErrorKind, ParseResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Dollar,
    Quoted(String),
    Word(&'a str),
}

#[derive(Debug, Clone)]
struct Lexeme<'a> {
    token: Token<'a>,
    offset: usize,
}

fn tokenize(text: &str) -> ParseResult<Vec<Lexeme<'_>>> {
    let mut lexemes = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' => {
                chars.next();
                Token::Open
            }
            ')' => {
                chars.next();
                Token::Close
            }
            '$' => {
                chars.next();
                Token::Dollar
            }
            '\'' => {
                chars.next();
                let start = offset + 1;
                let end = loop {
                    match chars.next() {
                        Some((end, '\'')) => break end,
                        Some(_) => {}
                        None => {
                            return Err(ParseError::new(
                                text,
                                offset,
                                ParseErrorKind::UnterminatedString,
                            ));
                        }
                    }
                };
                Token::Quoted(unescape(&text[start..end]))
            }
            _ => {
                let mut end = text.len();
                while let Some(&(next, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '$' | '\'') {
                        end = next;
                        break;
                    }
                    chars.next();
                }
                Token::Word(&text[offset..end])
            }
        };
        lexemes.push(Lexeme { token, offset });
    }

    Ok(lexemes)
}

/// Decode the `\27` and `\5C` escapes allowed inside a qdstring.
fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let escape = rest.get(pos + 1..pos + 3).unwrap_or_default();
        if escape == "27" {
            out.push('\'');
            rest = &rest[pos + 3..];
        } else if escape.eq_ignore_ascii_case("5c") {
            out.push('\\');
            rest = &rest[pos + 3..];
        } else {
            out.push('\\');
            rest = &rest[pos + 1..];
        }
    }
    out.push_str(rest);
    out
}

/// True for a numeric OID (`1.2.3`) or a descriptor (`top`, `nsAdminGroup-oid`).
pub(crate) fn is_valid_oid(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return false;
    };
    if first.is_ascii_digit() {
        value
            .split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()))
    } else {
        first.is_ascii_alphabetic()
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | ':'))
    }
}

/// How many values a keyword takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    /// No value (`OBSOLETE`)
    Flag,
    /// Exactly one quoted string or word (`DESC`, `EQUALITY`)
    Single,
    /// One value, or a parenthesized list (`NAME`, `MUST`)
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Flag,
    Single(String),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Clause {
    keyword: String,
    value: Value,
    offset: usize,
}

type Grammar = &'static [(&'static str, Arity)];

const ATTRIBUTE_TYPE_GRAMMAR: Grammar = &[
    ("NAME", Arity::List),
    ("DESC", Arity::Single),
    ("OBSOLETE", Arity::Flag),
    ("SUP", Arity::Single),
    ("EQUALITY", Arity::Single),
    ("ORDERING", Arity::Single),
    ("SUBSTR", Arity::Single),
    ("SYNTAX", Arity::Single),
    ("SINGLE-VALUE", Arity::Flag),
    ("COLLECTIVE", Arity::Flag),
    ("NO-USER-MODIFICATION", Arity::Flag),
    ("USAGE", Arity::Single),
];

const OBJECT_CLASS_GRAMMAR: Grammar = &[
    ("NAME", Arity::List),
    ("DESC", Arity::Single),
    ("OBSOLETE", Arity::Flag),
    ("SUP", Arity::List),
    ("ABSTRACT", Arity::Flag),
    ("STRUCTURAL", Arity::Flag),
    ("AUXILIARY", Arity::Flag),
    ("MUST", Arity::List),
    ("MAY", Arity::List),
];

const LDAP_SYNTAX_GRAMMAR: Grammar = &[("DESC", Arity::Single)];

const MATCHING_RULE_GRAMMAR: Grammar = &[
    ("NAME", Arity::List),
    ("DESC", Arity::Single),
    ("OBSOLETE", Arity::Flag),
    ("SYNTAX", Arity::Single),
];

const MATCHING_RULE_USE_GRAMMAR: Grammar = &[
    ("NAME", Arity::List),
    ("DESC", Arity::Single),
    ("OBSOLETE", Arity::Flag),
    ("APPLIES", Arity::List),
];

/// A definition split into its OID and keyword clauses.
struct Definition<'a> {
    text: &'a str,
    oid: String,
    clauses: Vec<Clause>,
    close_offset: usize,
}

impl<'a> Definition<'a> {
    fn parse(text: &'a str, grammar: Grammar) -> ParseResult<Self> {
        let lexemes = tokenize(text)?;
        let mut cursor = Cursor {
            text,
            lexemes: &lexemes,
            pos: 0,
        };

        match cursor.next() {
            Some(Lexeme {
                token: Token::Open, ..
            }) => {}
            Some(other) => {
                return Err(cursor.error_at(other.offset, ParseErrorKind::MissingOpenParen));
            }
            None => return Err(cursor.error_at(0, ParseErrorKind::MissingOpenParen)),
        }

        let oid = match cursor.next() {
            Some(Lexeme {
                token: Token::Word(word),
                offset,
            }) => {
                if !is_valid_oid(word) {
                    return Err(cursor.error_at(
                        *offset,
                        ParseErrorKind::MalformedOid(word.to_string()),
                    ));
                }
                word.to_string()
            }
            Some(Lexeme {
                token: Token::Quoted(quoted),
                offset,
            }) => {
                return Err(cursor.error_at(*offset, ParseErrorKind::MalformedOid(quoted.clone())));
            }
            Some(other) => return Err(cursor.error_at(other.offset, ParseErrorKind::MissingOid)),
            None => return Err(cursor.error_at(text.len(), ParseErrorKind::MissingOid)),
        };

        let mut clauses: Vec<Clause> = Vec::new();
        let close_offset = loop {
            let Some(lexeme) = cursor.next() else {
                return Err(cursor.error_at(text.len(), ParseErrorKind::MissingCloseParen));
            };
            let keyword = match &lexeme.token {
                Token::Close => break lexeme.offset,
                Token::Word(word) => *word,
                _ => {
                    return Err(cursor.error_at(
                        lexeme.offset,
                        ParseErrorKind::UnknownKeyword(cursor.describe(lexeme)),
                    ));
                }
            };

            let arity = if keyword.starts_with("X-") {
                Arity::List
            } else {
                grammar
                    .iter()
                    .find(|(name, _)| *name == keyword)
                    .map(|(_, arity)| *arity)
                    .ok_or_else(|| {
                        cursor.error_at(
                            lexeme.offset,
                            ParseErrorKind::UnknownKeyword(keyword.to_string()),
                        )
                    })?
            };

            if clauses.iter().any(|clause| clause.keyword == keyword) {
                return Err(cursor.error_at(
                    lexeme.offset,
                    ParseErrorKind::DuplicateKeyword(keyword.to_string()),
                ));
            }

            let value = cursor.value(keyword, arity)?;
            clauses.push(Clause {
                keyword: keyword.to_string(),
                value,
                offset: lexeme.offset,
            });
        };

        if let Some(extra) = cursor.next() {
            return Err(cursor.error_at(extra.offset, ParseErrorKind::TrailingInput));
        }

        Ok(Self {
            text,
            oid,
            clauses,
            close_offset,
        })
    }

    fn error_at(&self, offset: usize, reason: ParseErrorKind) -> ParseError {
        ParseError::new(self.text, offset, reason)
    }

    fn take(&mut self, keyword: &str) -> Option<Clause> {
        let pos = self.clauses.iter().position(|clause| clause.keyword == keyword)?;
        Some(self.clauses.remove(pos))
    }

    fn flag(&mut self, keyword: &str) -> bool {
        self.take(keyword).is_some()
    }

    fn single(&mut self, keyword: &str) -> Option<String> {
        match self.take(keyword)?.value {
            Value::Single(value) => Some(value),
            Value::List(mut values) => values.pop(),
            Value::Flag => None,
        }
    }

    fn list(&mut self, keyword: &str) -> Vec<String> {
        match self.take(keyword).map(|clause| clause.value) {
            Some(Value::Single(value)) => vec![value],
            Some(Value::List(values)) => values,
            _ => Vec::new(),
        }
    }

    /// A clause whose value must be an OID or descriptor.
    fn offset_of(&self, keyword: &str) -> Option<usize> {
        self.clauses
            .iter()
            .find(|clause| clause.keyword == keyword)
            .map(|clause| clause.offset)
    }

    fn oid_single(&mut self, keyword: &str) -> ParseResult<Option<String>> {
        let Some(offset) = self.offset_of(keyword) else {
            return Ok(None);
        };
        let value = self.single(keyword);
        match value {
            Some(value) if !is_valid_oid(&value) => Err(self.invalid(offset, keyword, &value)),
            value => Ok(value),
        }
    }

    fn oid_list(&mut self, keyword: &str) -> ParseResult<Vec<String>> {
        let Some(offset) = self.offset_of(keyword) else {
            return Ok(Vec::new());
        };
        let values = self.list(keyword);
        if let Some(bad) = values.iter().find(|value| !is_valid_oid(value)) {
            return Err(self.invalid(offset, keyword, bad));
        }
        Ok(values)
    }

    fn invalid(&self, offset: usize, keyword: &str, value: &str) -> ParseError {
        self.error_at(
            offset,
            ParseErrorKind::InvalidValue {
                keyword: keyword.to_string(),
                detail: format!("'{value}' is not an OID or descriptor"),
            },
        )
    }

    fn object_class_kind(&mut self) -> ParseResult<ObjectClassKind> {
        let mut found: Option<ObjectClassKind> = None;
        for kind in [
            ObjectClassKind::Abstract,
            ObjectClassKind::Structural,
            ObjectClassKind::Auxiliary,
        ] {
            let Some(clause) = self.take(kind.as_str()) else {
                continue;
            };
            if found.is_some() {
                return Err(self.error_at(
                    clause.offset,
                    ParseErrorKind::ConflictingKind(clause.keyword),
                ));
            }
            found = Some(kind);
        }
        Ok(found.unwrap_or_default())
    }

    /// Drain the remaining `X-` clauses in the order they were written.
    fn extensions(&mut self) -> ExtensionMap {
        self.clauses
            .drain(..)
            .filter_map(|clause| {
                let value = match clause.value {
                    Value::Single(value) => ExtensionValue::Single(value),
                    Value::List(values) => ExtensionValue::Multi(values),
                    Value::Flag => return None,
                };
                Some((clause.keyword, value))
            })
            .collect()
    }
}

struct Cursor<'t, 'a> {
    text: &'a str,
    lexemes: &'t [Lexeme<'a>],
    pos: usize,
}

impl<'t, 'a> Cursor<'t, 'a> {
    fn next(&mut self) -> Option<&'t Lexeme<'a>> {
        let lexeme = self.lexemes.get(self.pos)?;
        self.pos += 1;
        Some(lexeme)
    }

    fn error_at(&self, offset: usize, reason: ParseErrorKind) -> ParseError {
        ParseError::new(self.text, offset, reason)
    }

    fn describe(&self, lexeme: &Lexeme<'_>) -> String {
        match &lexeme.token {
            Token::Open => "(".into(),
            Token::Close => ")".into(),
            Token::Dollar => "$".into(),
            Token::Quoted(value) => format!("'{value}'"),
            Token::Word(word) => word.to_string(),
        }
    }

    fn value(&mut self, keyword: &str, arity: Arity) -> ParseResult<Value> {
        if arity == Arity::Flag {
            return Ok(Value::Flag);
        }
        let Some(lexeme) = self.next() else {
            return Err(self.error_at(
                self.text.len(),
                ParseErrorKind::MissingValue(keyword.to_string()),
            ));
        };
        match &lexeme.token {
            Token::Quoted(value) => Ok(Value::Single(value.clone())),
            Token::Word(word) => Ok(Value::Single(word.to_string())),
            Token::Open if arity == Arity::List => self.list(keyword, lexeme.offset),
            _ => Err(self.error_at(
                lexeme.offset,
                ParseErrorKind::MissingValue(keyword.to_string()),
            )),
        }
    }

    fn list(&mut self, keyword: &str, open_offset: usize) -> ParseResult<Value> {
        let mut values = Vec::new();
        loop {
            let Some(lexeme) = self.next() else {
                return Err(self.error_at(open_offset, ParseErrorKind::MissingCloseParen));
            };
            match &lexeme.token {
                Token::Close => break,
                Token::Dollar => {}
                Token::Quoted(value) => values.push(value.clone()),
                Token::Word(word) => values.push(word.to_string()),
                Token::Open => {
                    return Err(self.error_at(
                        lexeme.offset,
                        ParseErrorKind::InvalidValue {
                            keyword: keyword.to_string(),
                            detail: "nested list".to_string(),
                        },
                    ));
                }
            }
        }
        if values.is_empty() {
            return Err(self.error_at(open_offset, ParseErrorKind::EmptyList(keyword.to_string())));
        }
        Ok(Value::List(values))
    }
}

/// Split `1.3.6.1.4.1.1466.115.121.1.15{256}` into OID and length hint.
fn split_syntax(
    definition: &Definition<'_>,
    offset: usize,
    raw: &str,
) -> ParseResult<(String, Option<u32>)> {
    let invalid = |detail: &str| {
        definition.error_at(
            offset,
            ParseErrorKind::InvalidValue {
                keyword: "SYNTAX".to_string(),
                detail: detail.to_string(),
            },
        )
    };
    let (oid, len) = match raw.split_once('{') {
        Some((oid, rest)) => {
            let digits = rest
                .strip_suffix('}')
                .ok_or_else(|| invalid("unterminated length hint"))?;
            let len = digits
                .parse::<u32>()
                .map_err(|_| invalid("length hint is not a number"))?;
            (oid, Some(len))
        }
        None => (raw, None),
    };
    if !is_valid_oid(oid) {
        return Err(definition.invalid(offset, "SYNTAX", oid));
    }
    Ok((oid.to_string(), len))
}

pub(crate) fn parse_attribute_type(text: &str) -> ParseResult<AttributeType> {
    let mut def = Definition::parse(text, ATTRIBUTE_TYPE_GRAMMAR)?;

    let (syntax, syntax_len) = match def.offset_of("SYNTAX") {
        Some(offset) => {
            let raw = def.single("SYNTAX").unwrap_or_default();
            let (oid, len) = split_syntax(&def, offset, &raw)?;
            (Some(oid), len)
        }
        None => (None, None),
    };

    let usage = match def.offset_of("USAGE") {
        Some(offset) => {
            let raw = def.single("USAGE").unwrap_or_default();
            Usage::from_keyword(&raw).ok_or_else(|| {
                def.error_at(
                    offset,
                    ParseErrorKind::InvalidValue {
                        keyword: "USAGE".to_string(),
                        detail: format!("unknown usage '{raw}'"),
                    },
                )
            })?
        }
        None => Usage::default(),
    };

    Ok(AttributeType {
        names: def.list("NAME"),
        desc: def.single("DESC"),
        obsolete: def.flag("OBSOLETE"),
        sup: def.oid_single("SUP")?,
        equality: def.oid_single("EQUALITY")?,
        ordering: def.oid_single("ORDERING")?,
        substr: def.oid_single("SUBSTR")?,
        syntax,
        syntax_len,
        single_value: def.flag("SINGLE-VALUE"),
        collective: def.flag("COLLECTIVE"),
        no_user_modification: def.flag("NO-USER-MODIFICATION"),
        usage,
        extensions: def.extensions(),
        oid: def.oid,
    })
}

pub(crate) fn parse_object_class(text: &str) -> ParseResult<ObjectClass> {
    let mut def = Definition::parse(text, OBJECT_CLASS_GRAMMAR)?;
    Ok(ObjectClass {
        names: def.list("NAME"),
        desc: def.single("DESC"),
        obsolete: def.flag("OBSOLETE"),
        sup: def.oid_list("SUP")?,
        kind: def.object_class_kind()?,
        must: def.oid_list("MUST")?,
        may: def.oid_list("MAY")?,
        extensions: def.extensions(),
        oid: def.oid,
    })
}

pub(crate) fn parse_ldap_syntax(text: &str) -> ParseResult<LdapSyntax> {
    let mut def = Definition::parse(text, LDAP_SYNTAX_GRAMMAR)?;
    Ok(LdapSyntax {
        desc: def.single("DESC"),
        extensions: def.extensions(),
        oid: def.oid,
    })
}

pub(crate) fn parse_matching_rule(text: &str) -> ParseResult<MatchingRule> {
    let mut def = Definition::parse(text, MATCHING_RULE_GRAMMAR)?;
    let close_offset = def.close_offset;
    let syntax = def
        .oid_single("SYNTAX")?
        .ok_or_else(|| def.error_at(close_offset, ParseErrorKind::MissingClause("SYNTAX".into())))?;
    Ok(MatchingRule {
        names: def.list("NAME"),
        desc: def.single("DESC"),
        obsolete: def.flag("OBSOLETE"),
        syntax,
        extensions: def.extensions(),
        oid: def.oid,
    })
}

pub(crate) fn parse_matching_rule_use(text: &str) -> ParseResult<MatchingRuleUse> {
    let mut def = Definition::parse(text, MATCHING_RULE_USE_GRAMMAR)?;
    Ok(MatchingRuleUse {
        names: def.list("NAME"),
        desc: def.single("DESC"),
        obsolete: def.flag("OBSOLETE"),
        applies: def.oid_list("APPLIES")?,
        extensions: def.extensions(),
        oid: def.oid,
    })
}
