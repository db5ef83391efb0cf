//! Loading subentries from LDIF and re-publishing them.

use crate::common::{self, *};
use ldap_schema::{
    AttributeType, ElementKind, ExtensionValue, LdapSyntax, LdifSource, MatchingRule,
    MatchingRuleUse, ObjectClass, ParseErrorKind, RawSubentry, SchemaElement, SchemaError,
    SubSchema,
};
use std::fs;

#[test]
fn test_fixture_loads_completely() {
    let schema = fixture_schema();

    assert_eq!(schema.subschema_dn(), Some("cn=schema"));
    assert!(schema.skipped().is_empty(), "skipped: {:?}", schema.skipped());
    assert_eq!(schema.list_all::<LdapSyntax>().len(), 6);
    assert_eq!(schema.list_all::<MatchingRule>().len(), 6);
    assert_eq!(schema.list_all::<MatchingRuleUse>().len(), 1);
    assert_eq!(schema.list_all::<AttributeType>().len(), 16);
    assert_eq!(schema.list_all::<ObjectClass>().len(), 6);
    assert!(schema.find::<ObjectClass>("neverLoaded").is_none());
}

#[test]
fn test_definitions_serialize_as_published() {
    let schema = fixture_schema();

    assert_eq!(schema.get::<ObjectClass>("groupOfNames").unwrap().to_text(), GROUP_OF_NAMES);
    assert_eq!(schema.get::<ObjectClass>("uidObject").unwrap().to_text(), UID_OBJECT);
    assert_eq!(schema.get::<AttributeType>("krbHostServer").unwrap().to_text(), KRB_HOST_SERVER);
    assert_eq!(schema.get::<AttributeType>("nsslapd-suffix").unwrap().to_text(), NSSLAPD_SUFFIX);
    assert_eq!(
        schema.get::<AttributeType>("searchTimeLimit").unwrap().to_text(),
        SEARCH_TIME_LIMIT
    );
}

#[test]
fn test_x_origin_variants() {
    let schema = fixture_schema();

    let krb = schema.get::<AttributeType>("krbHostServer").unwrap();
    assert!(krb.extensions.get("X-ORIGIN").is_none());

    let suffix = schema.get::<AttributeType>("nsslapd-suffix").unwrap();
    assert_eq!(
        suffix.extensions.get("X-ORIGIN"),
        Some(&ExtensionValue::Single("Netscape".to_string()))
    );

    let limit = schema.get::<AttributeType>("searchTimeLimit").unwrap();
    assert_eq!(
        limit.extensions.get("X-ORIGIN"),
        Some(&ExtensionValue::Multi(vec![
            "RFC4876".to_string(),
            "user defined".to_string()
        ]))
    );
}

#[test]
fn test_folded_and_base64_values() {
    let schema = fixture_schema();

    let cn = schema.get::<AttributeType>("commonName").unwrap();
    assert_eq!(cn.oid, "2.5.4.3");
    assert_eq!(cn.sup.as_deref(), Some("name"));
    assert_eq!(cn.x_origin().to_vec(), vec!["RFC 4519"]);

    let description = schema.get::<AttributeType>("description").unwrap();
    assert_eq!(description.equality.as_deref(), Some("caseIgnoreMatch"));
    assert_eq!(description.syntax_len, Some(1024));
}

#[test]
fn test_syntax_flags() {
    let schema = fixture_schema();
    let binary = schema.get::<LdapSyntax>("1.3.6.1.4.1.1466.115.121.1.5").unwrap();
    assert!(binary.not_human_readable());
    let dn = schema.get::<LdapSyntax>("1.3.6.1.4.1.1466.115.121.1.12").unwrap();
    assert!(!dn.not_human_readable());
    assert_eq!(dn.desc.as_deref(), Some("DN"));
}

#[test]
fn test_record_mapping_has_every_kind() {
    let schema = fixture_schema();
    let mapping = schema.to_record_mapping();

    let mut keys: Vec<&str> = mapping.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let mut expected: Vec<&str> = ElementKind::ALL.iter().map(|k| k.attribute_name()).collect();
    expected.sort_unstable();
    assert_eq!(keys, expected);

    assert!(mapping["objectClasses"].iter().any(|text| text == GROUP_OF_NAMES));
    assert!(mapping["attributeTypes"].iter().any(|text| text == SEARCH_TIME_LIMIT));
}

#[test]
fn test_republished_schema_is_equivalent() {
    let schema = fixture_schema();
    let mapping = schema.to_record_mapping();

    let rebuilt = SubSchema::from_entry("cn=schema", &mapping);
    assert!(rebuilt.skipped().is_empty());
    assert_eq!(rebuilt.to_record_mapping(), mapping);
    assert_eq!(rebuilt.fingerprint(), schema.fingerprint());
    assert_eq!(
        rebuilt.get::<ObjectClass>("2.5.6.9").unwrap(),
        schema.get::<ObjectClass>("groupOfNames").unwrap()
    );
}

#[test]
fn test_malformed_values_are_skipped_not_fatal() {
    common::init_logging();
    let mut entry = RawSubentry::new("cn=Subschema");
    entry.push_value("objectClasses", "( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )");
    entry.push_value(
        "objectClasses",
        "( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn )",
    );
    entry.push_value("attributeTypes", "( 2.5.4.0 NAME 'objectClass' BOGUS )");
    entry.push_value(
        "attributeTypes",
        "( 2.5.4.41 NAME 'name' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
    );

    let schema = SubSchema::from_source(&entry).unwrap();
    assert_eq!(schema.list_all::<ObjectClass>().len(), 1);
    assert_eq!(schema.list_all::<AttributeType>().len(), 1);

    let reasons: Vec<(ElementKind, &ParseErrorKind)> = schema
        .skipped()
        .iter()
        .map(|s| (s.kind, &s.error.reason))
        .collect();
    assert_eq!(reasons.len(), 2);
    assert!(reasons.contains(&(ElementKind::ObjectClass, &ParseErrorKind::MissingCloseParen)));
    assert!(reasons.contains(&(
        ElementKind::AttributeType,
        &ParseErrorKind::UnknownKeyword("BOGUS".to_string())
    )));
}

#[test]
fn test_ldif_file_source() {
    common::init_logging();
    let path = std::env::temp_dir().join(format!("ldap-schema-test-{}.ldif", std::process::id()));
    fs::write(&path, SUBSCHEMA_LDIF).unwrap();

    let result = SubSchema::from_source(&LdifSource::from_path(&path));
    let _ = fs::remove_file(&path);

    let schema = result.unwrap();
    assert_eq!(schema.fingerprint(), fixture_schema().fingerprint());
}

#[test]
fn test_missing_ldif_file() {
    let source = LdifSource::from_path("/nonexistent/ldap-schema/cn=schema.ldif");
    assert!(matches!(SubSchema::from_source(&source), Err(SchemaError::Io(_))));
}

#[test]
fn test_ldif_without_record() {
    let source = LdifSource::from_text("# nothing here\n\nversion: 1\n");
    assert!(matches!(
        SubSchema::from_source(&source),
        Err(SchemaError::Ldif { .. })
    ));
}
