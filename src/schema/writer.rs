//! Serialization of schema records back to RFC 4512 definition strings.
//!
//! Clause order is fixed per kind: OID, `NAME`, `DESC`, `OBSOLETE`, `SUP`, the
//! kind-specific clauses, then extensions in insertion order. Absent or
//! default-valued clauses are omitted.

use super::types::{
    AttributeType, ExtensionMap, ExtensionValue, LdapSyntax, MatchingRule, MatchingRuleUse,
    ObjectClass, Usage,
};
use std::fmt;

struct DefinitionWriter {
    out: String,
}

impl DefinitionWriter {
    fn new(oid: &str) -> Self {
        let mut out = String::with_capacity(128);
        out.push_str("( ");
        out.push_str(oid);
        Self { out }
    }

    fn keyword(&mut self, keyword: &str) {
        self.out.push(' ');
        self.out.push_str(keyword);
    }

    fn push_quoted(&mut self, value: &str) {
        self.out.push('\'');
        for c in value.chars() {
            match c {
                '\'' => self.out.push_str("\\27"),
                '\\' => self.out.push_str("\\5C"),
                c => self.out.push(c),
            }
        }
        self.out.push('\'');
    }

    /// `NAME 'a'` or `NAME ( 'a' 'b' )`
    fn names(&mut self, names: &[String]) {
        match names {
            [] => {}
            [name] => {
                self.keyword("NAME");
                self.out.push(' ');
                self.push_quoted(name);
            }
            names => {
                self.keyword("NAME");
                self.out.push_str(" (");
                for name in names {
                    self.out.push(' ');
                    self.push_quoted(name);
                }
                self.out.push_str(" )");
            }
        }
    }

    fn quoted(&mut self, keyword: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.keyword(keyword);
            self.out.push(' ');
            self.push_quoted(value);
        }
    }

    fn flag(&mut self, keyword: &str, set: bool) {
        if set {
            self.keyword(keyword);
        }
    }

    fn oid(&mut self, keyword: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.keyword(keyword);
            self.out.push(' ');
            self.out.push_str(value);
        }
    }

    /// `MUST cn` or `MUST ( cn $ sn )`
    fn oids(&mut self, keyword: &str, values: &[String]) {
        match values {
            [] => {}
            [value] => self.oid(keyword, Some(value)),
            values => {
                self.keyword(keyword);
                self.out.push_str(" ( ");
                self.out.push_str(&values.join(" $ "));
                self.out.push_str(" )");
            }
        }
    }

    fn extensions(&mut self, extensions: &ExtensionMap) {
        for (keyword, value) in extensions.iter() {
            self.keyword(keyword);
            match value {
                ExtensionValue::Single(value) => {
                    self.out.push(' ');
                    self.push_quoted(value);
                }
                ExtensionValue::Multi(values) => {
                    self.out.push_str(" (");
                    for value in values {
                        self.out.push(' ');
                        self.push_quoted(value);
                    }
                    self.out.push_str(" )");
                }
            }
        }
    }

    fn finish(mut self) -> String {
        self.out.push_str(" )");
        self.out
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = DefinitionWriter::new(&self.oid);
        w.names(&self.names);
        w.quoted("DESC", self.desc.as_deref());
        w.flag("OBSOLETE", self.obsolete);
        w.oid("SUP", self.sup.as_deref());
        w.oid("EQUALITY", self.equality.as_deref());
        w.oid("ORDERING", self.ordering.as_deref());
        w.oid("SUBSTR", self.substr.as_deref());
        if let Some(syntax) = &self.syntax {
            let syntax = match self.syntax_len {
                Some(len) => format!("{syntax}{{{len}}}"),
                None => syntax.clone(),
            };
            w.oid("SYNTAX", Some(&syntax));
        }
        w.flag("SINGLE-VALUE", self.single_value);
        w.flag("COLLECTIVE", self.collective);
        w.flag("NO-USER-MODIFICATION", self.no_user_modification);
        if self.usage != Usage::UserApplications {
            w.oid("USAGE", Some(self.usage.as_str()));
        }
        w.extensions(&self.extensions);
        f.write_str(&w.finish())
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = DefinitionWriter::new(&self.oid);
        w.names(&self.names);
        w.quoted("DESC", self.desc.as_deref());
        w.flag("OBSOLETE", self.obsolete);
        w.oids("SUP", &self.sup);
        w.keyword(self.kind.as_str());
        w.oids("MUST", &self.must);
        w.oids("MAY", &self.may);
        w.extensions(&self.extensions);
        f.write_str(&w.finish())
    }
}

impl fmt::Display for LdapSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = DefinitionWriter::new(&self.oid);
        w.quoted("DESC", self.desc.as_deref());
        w.extensions(&self.extensions);
        f.write_str(&w.finish())
    }
}

impl fmt::Display for MatchingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = DefinitionWriter::new(&self.oid);
        w.names(&self.names);
        w.quoted("DESC", self.desc.as_deref());
        w.flag("OBSOLETE", self.obsolete);
        w.oid("SYNTAX", Some(&self.syntax));
        w.extensions(&self.extensions);
        f.write_str(&w.finish())
    }
}

impl fmt::Display for MatchingRuleUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = DefinitionWriter::new(&self.oid);
        w.names(&self.names);
        w.quoted("DESC", self.desc.as_deref());
        w.flag("OBSOLETE", self.obsolete);
        w.oids("APPLIES", &self.applies);
        w.extensions(&self.extensions);
        f.write_str(&w.finish())
    }
}
