//! # LDAP Schema Checker
//!
//! A command-line utility for checking a subschema subentry dump (LDIF) the
//! way the library will see it: every definition is parsed, every object
//! class is resolved to its mandatory and permitted attribute types, and
//! anything that fails is reported.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin ldap-schema-check cn=schema.ldif
//! cargo run --bin ldap-schema-check cn=schema.ldif --show inetOrgPerson
//! cargo run --bin ldap-schema-check cn=schema.ldif --show 2.5.4.3 --json
//! ```
//!
//! ## Output Example
//!
//! ```text
//! Checking subschema file: cn=schema.ldif
//! ✓ Loaded subschema cn=schema
//!
//! Schema Summary:
//!   objectClasses: 12
//!   attributeTypes: 48
//!   ldapSyntaxes: 9
//!   matchingRules: 11
//!   matchingRuleUse: 0
//!   Skipped definitions: 0
//!   Fingerprint: 3q2+7wAAAAA=
//!
//! Resolving object classes...
//! ✓ All 12 object classes resolved
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: Every definition parsed and every object class resolved
//! - `1`: A definition was skipped, a class failed to resolve, or the file
//!   could not be read

use ldap_schema::schema::Registered;
use ldap_schema::{
    AttributeType, LdapSyntax, LdifSource, MatchingRule, MatchingRuleUse, ObjectClass,
    SchemaElement, SubSchema,
};
use serde::Serialize;
use std::env;
use std::path::Path;
use std::process;

struct Options {
    path: String,
    show: Option<String>,
    json: bool,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <subschema.ldif> [--show <oid-or-name>] [--json]", program);
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} cn=schema.ldif", program);
    eprintln!("  {} cn=schema.ldif --show inetOrgPerson --json", program);
    process::exit(1);
}

fn parse_args(args: &[String]) -> Options {
    let program = args.first().map(String::as_str).unwrap_or("ldap-schema-check");
    let mut path = None;
    let mut show = None;
    let mut json = false;

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--show" => match rest.next() {
                Some(key) => show = Some(key.clone()),
                None => usage(program),
            },
            "-h" | "--help" => usage(program),
            other if path.is_none() && !other.starts_with("--") => path = Some(other.to_string()),
            _ => usage(program),
        }
    }

    match path {
        Some(path) => Options { path, show, json },
        None => usage(program),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);
    let path = Path::new(&options.path);

    if !path.is_file() {
        eprintln!("Error: '{}' is not a readable file", path.display());
        process::exit(1);
    }

    println!("Checking subschema file: {}", path.display());
    let schema = match SubSchema::from_source(&LdifSource::from_path(path)) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("❌ Failed to load subschema: {}", e);
            process::exit(1);
        }
    };
    println!(
        "✓ Loaded subschema {}",
        schema.subschema_dn().unwrap_or("<unnamed>")
    );

    print_schema_summary(&schema);
    let mut failed = report_skipped(&schema);
    failed |= resolve_all(&schema);

    if let Some(key) = &options.show {
        if !show_element(&schema, key, options.json) {
            eprintln!("❌ No schema element named '{}'", key);
            failed = true;
        }
    }

    if failed {
        process::exit(1);
    }
}

fn print_schema_summary(schema: &SubSchema) {
    println!();
    println!("Schema Summary:");
    println!("  objectClasses: {}", schema.list_all::<ObjectClass>().len());
    println!("  attributeTypes: {}", schema.list_all::<AttributeType>().len());
    println!("  ldapSyntaxes: {}", schema.list_all::<LdapSyntax>().len());
    println!("  matchingRules: {}", schema.list_all::<MatchingRule>().len());
    println!("  matchingRuleUse: {}", schema.list_all::<MatchingRuleUse>().len());
    println!("  Skipped definitions: {}", schema.skipped().len());
    println!("  Fingerprint: {}", schema.fingerprint());
}

fn report_skipped(schema: &SubSchema) -> bool {
    for skipped in schema.skipped() {
        eprintln!("  ❌ Skipped {}: {}", skipped.kind, skipped.error);
    }
    !schema.skipped().is_empty()
}

fn resolve_all(schema: &SubSchema) -> bool {
    println!("\nResolving object classes...");

    let classes = schema.list_all::<ObjectClass>();
    let mut error_count = 0;
    for class in classes {
        if let Err(e) = schema.mandatory_and_permitted(&[class]) {
            eprintln!("  ❌ {} - {}", class.display_name(), e);
            error_count += 1;
        }
    }

    if error_count == 0 {
        println!("✓ All {} object classes resolved", classes.len());
    } else {
        println!(
            "  Resolved: {}, failed: {}",
            classes.len() - error_count,
            error_count
        );
    }
    error_count > 0
}

/// Print every element of any kind identified by `key`. Returns false when none matched.
fn show_element(schema: &SubSchema, key: &str, json: bool) -> bool {
    let mut shown = show_kind::<ObjectClass>(schema, key, json);
    shown |= show_kind::<AttributeType>(schema, key, json);
    shown |= show_kind::<LdapSyntax>(schema, key, json);
    shown |= show_kind::<MatchingRule>(schema, key, json);
    shown |= show_kind::<MatchingRuleUse>(schema, key, json);
    shown
}

fn show_kind<T: Registered + Serialize>(schema: &SubSchema, key: &str, json: bool) -> bool {
    let Some(element) = schema.find::<T>(key) else {
        return false;
    };
    println!("\n{} {}:", T::KIND, element.display_name());
    if json {
        match serde_json::to_string_pretty(element) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("❌ Failed to serialize: {}", e),
        }
    } else {
        println!("  {}", element.to_text());
    }
    if let Some(class) = schema.find::<ObjectClass>(key).filter(|_| T::KIND == ObjectClass::KIND) {
        print_attribute_set(schema, class);
    }
    true
}

fn print_attribute_set(schema: &SubSchema, class: &ObjectClass) {
    match schema.mandatory_and_permitted(&[class]) {
        Ok(set) => {
            let must: Vec<&str> = set.must.values().map(|at| at.display_name()).collect();
            let may: Vec<&str> = set.may.values().map(|at| at.display_name()).collect();
            println!("  MUST: {}", must.join(", "));
            println!("  MAY: {}", may.join(", "));
            if set.extensible {
                println!("  Any attribute permitted (extensible)");
            }
        }
        Err(e) => eprintln!("  ❌ {}", e),
    }
}
