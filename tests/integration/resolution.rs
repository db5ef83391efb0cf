//! Superior chains, MUST/MAY merging and inherited matching rules.

use crate::common::*;
use ldap_schema::{
    AttributeType, ElementKind, ObjectClass, SchemaElement, SchemaError, SubSchemaBuilder,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

fn names<'a>(attrs: &BTreeMap<String, &'a AttributeType>) -> BTreeSet<&'a str> {
    attrs.values().map(|at| at.display_name()).collect()
}

#[test]
fn test_person_inherits_from_top() {
    let schema = fixture_schema();
    let set = schema.attribute_types_for(&["person"]).unwrap();

    assert_eq!(names(&set.must), BTreeSet::from(["objectClass", "sn", "cn"]));
    assert_eq!(
        names(&set.may),
        BTreeSet::from(["description", "seeAlso", "telephoneNumber"])
    );
    assert!(!set.extensible);
    assert!(set.requires("commonName"));
    assert!(set.requires("2.5.4.4"));
    assert!(set.permits("TELEPHONENUMBER"));
    assert!(!set.permits("member"));
}

#[test]
fn test_group_of_names_attributes() {
    let schema = fixture_schema();
    let group = schema.get::<ObjectClass>("groupOfNames").unwrap();
    let set = schema.mandatory_and_permitted(&[group]).unwrap();

    assert_eq!(names(&set.must), BTreeSet::from(["objectClass", "cn"]));
    assert_eq!(
        names(&set.may),
        BTreeSet::from(["member", "businessCategory", "seeAlso", "owner", "ou", "o", "description"])
    );
    assert!(set.must.contains_key("2.5.4.3"));
}

#[test]
fn test_shared_ancestors_are_visited_once() {
    let schema = fixture_schema();
    let set = schema
        .attribute_types_for(&["organizationalPerson", "uidObject", "person", "top"])
        .unwrap();

    assert_eq!(
        names(&set.must),
        BTreeSet::from(["objectClass", "sn", "cn", "uid"])
    );
    assert_eq!(
        names(&set.may),
        BTreeSet::from(["description", "seeAlso", "telephoneNumber", "ou"])
    );
}

#[test]
fn test_must_takes_precedence_over_may() {
    let attributes = plain_attributes(&["cn", "sn"]);
    let schema = schema_from(
        &[
            "( 1.2.1 NAME 'optionalCn' AUXILIARY MAY ( cn $ sn ) )",
            "( 1.2.2 NAME 'requiredCn' AUXILIARY MUST cn )",
        ],
        &attributes,
    );

    for order in [["optionalCn", "requiredCn"], ["requiredCn", "optionalCn"]] {
        let set = schema.attribute_types_for(&order).unwrap();
        assert_eq!(names(&set.must), BTreeSet::from(["cn"]));
        assert_eq!(names(&set.may), BTreeSet::from(["sn"]));
    }
}

#[test]
fn test_superior_chain_order() {
    let schema = fixture_schema();
    let org_person = schema.get::<ObjectClass>("organizationalPerson").unwrap();
    let chain: Vec<&str> = schema
        .superior_chain(org_person)
        .unwrap()
        .iter()
        .map(|oc| oc.display_name())
        .collect();
    assert_eq!(chain, vec!["organizationalPerson", "person", "top"]);
}

#[test]
fn test_diamond_chain_visits_each_once() {
    let schema = schema_from::<&str>(
        &[
            "( 1.2.0 NAME 'root' ABSTRACT )",
            "( 1.2.1 NAME 'left' SUP root ABSTRACT )",
            "( 1.2.2 NAME 'right' SUP root ABSTRACT )",
            "( 1.2.3 NAME 'bottom' SUP ( left $ right ) STRUCTURAL )",
        ],
        &[],
    );
    let bottom = schema.get::<ObjectClass>("bottom").unwrap();
    let chain: Vec<&str> = schema
        .superior_chain(bottom)
        .unwrap()
        .iter()
        .map(|oc| oc.display_name())
        .collect();
    assert_eq!(chain, vec!["bottom", "left", "root", "right"]);
}

#[test]
fn test_two_cycle_is_reported() {
    let schema = schema_from::<&str>(
        &[
            "( 1.2.1 NAME 'a' SUP b STRUCTURAL )",
            "( 1.2.2 NAME 'b' SUP a STRUCTURAL )",
        ],
        &[],
    );
    let a = schema.get::<ObjectClass>("a").unwrap();

    match schema.superior_chain(a) {
        Err(SchemaError::Cycle { kind, chain }) => {
            assert_eq!(kind, ElementKind::ObjectClass);
            assert_eq!(chain, vec!["a", "b", "a"]);
        }
        other => panic!("expected a cycle, got {:?}", other),
    }
    assert!(matches!(
        schema.mandatory_and_permitted(&[a]),
        Err(SchemaError::Cycle { .. })
    ));
    assert!(matches!(
        schema.attribute_types_for(&["b"]),
        Err(SchemaError::Cycle { .. })
    ));
}

#[test]
fn test_self_cycle_is_reported() {
    let schema = schema_from::<&str>(&["( 1.2.1 NAME 'loop' SUP loop STRUCTURAL )"], &[]);
    let looped = schema.get::<ObjectClass>("loop").unwrap();
    let err = schema.superior_chain(looped).unwrap_err();
    assert_eq!(err.to_string(), "Cycle in ObjectClass superior chain: loop -> loop");
}

#[test]
fn test_attribute_type_cycle() {
    let schema = schema_from::<&str>(
        &[],
        &["( 1.1.1 NAME 'x' SUP y )", "( 1.1.2 NAME 'y' SUP x )"],
    );
    let x = schema.get::<AttributeType>("x").unwrap();
    assert!(matches!(
        schema.inherited_syntax(x),
        Err(SchemaError::Cycle { kind: ElementKind::AttributeType, .. })
    ));
    assert!(matches!(schema.superior_chain(x), Err(SchemaError::Cycle { .. })));
}

#[test]
fn test_undefined_superior() {
    let schema = schema_from::<&str>(&["( 1.2.1 NAME 'orphan' SUP missingClass STRUCTURAL )"], &[]);
    let orphan = schema.get::<ObjectClass>("orphan").unwrap();
    match schema.superior_chain(orphan) {
        Err(SchemaError::UnresolvedReference {
            kind,
            reference,
            referrer,
        }) => {
            assert_eq!(kind, ElementKind::ObjectClass);
            assert_eq!(reference, "missingClass");
            assert_eq!(referrer, "orphan");
        }
        other => panic!("expected an unresolved reference, got {:?}", other),
    }
}

#[test]
fn test_undefined_attribute_reference() {
    let attributes = plain_attributes(&["cn"]);
    let schema = schema_from(
        &["( 1.2.1 NAME 'broken' STRUCTURAL MUST cn MAY ghostAttribute )"],
        &attributes,
    );
    match schema.attribute_types_for(&["broken"]) {
        Err(SchemaError::AttributeResolution {
            reference,
            object_class,
        }) => {
            assert_eq!(reference, "ghostAttribute");
            assert_eq!(object_class, "broken");
        }
        other => panic!("expected an attribute resolution error, got {:?}", other),
    }
}

#[test]
fn test_unknown_class_name() {
    let schema = fixture_schema();
    assert!(matches!(
        schema.attribute_types_for(&["person", "noSuchClass"]),
        Err(SchemaError::NotFound { kind: ElementKind::ObjectClass, .. })
    ));
}

#[test]
fn test_extensible_object() {
    let schema = fixture_schema();
    let set = schema.attribute_types_for(&["person", "extensibleObject"]).unwrap();
    assert!(set.extensible);
    assert!(set.permits("anyAttributeAtAll"));
    assert!(!set.requires("anyAttributeAtAll"));
}

#[test]
fn test_extensible_object_by_oid() {
    let schema = schema_from(
        &["( 1.3.6.1.4.1.1466.101.120.111 NAME 'renamedExtensible' AUXILIARY )"],
        &plain_attributes(&[]),
    );
    let set = schema.attribute_types_for(&["renamedExtensible"]).unwrap();
    assert!(set.extensible);
}

#[test]
fn test_extensible_object_descendants() {
    let attributes = plain_attributes(&["cn"]);
    let schema = schema_from(
        &[
            "( 2.5.6.0 NAME 'top' ABSTRACT )",
            "( 1.3.6.1.4.1.1466.101.120.111 NAME 'extensibleObject' SUP top AUXILIARY )",
            "( 1.2.1 NAME 'child' SUP extensibleObject AUXILIARY )",
            "( 1.2.2 NAME 'grandchild' SUP child AUXILIARY MAY cn )",
            "( 1.2.3 NAME 'plain' SUP top STRUCTURAL MUST cn )",
        ],
        &attributes,
    );

    assert!(schema.attribute_types_for(&["child"]).unwrap().extensible);
    assert!(!schema.attribute_types_for(&["plain"]).unwrap().extensible);

    // Only the second requested class reaches extensibleObject.
    let set = schema.attribute_types_for(&["plain", "grandchild"]).unwrap();
    assert!(set.extensible);
    assert!(set.permits("undeclaredAttribute"));
    assert_eq!(names(&set.must), BTreeSet::from(["cn"]));
    assert!(set.may.is_empty());
}

#[test]
fn test_configured_extensible_class() {
    let mut attrs = HashMap::new();
    attrs.insert(
        "objectClasses",
        vec![
            "( 1.2.1 NAME 'anything' AUXILIARY )",
            "( 1.2.2 NAME 'extensibleObject' AUXILIARY )",
        ],
    );
    let schema = SubSchemaBuilder::new().extensible_class("ANYTHING").build(attrs);

    assert!(schema.attribute_types_for(&["anything"]).unwrap().extensible);
    assert!(!schema.attribute_types_for(&["extensibleObject"]).unwrap().extensible);
}

#[test]
fn test_inherited_syntax_and_rules() {
    let schema = fixture_schema();
    let cn = schema.get::<AttributeType>("cn").unwrap();

    assert_eq!(cn.syntax, None);
    assert_eq!(
        schema.inherited_syntax(cn).unwrap(),
        Some("1.3.6.1.4.1.1466.115.121.1.15")
    );
    assert_eq!(schema.inherited_equality(cn).unwrap(), Some("caseIgnoreMatch"));
    assert_eq!(schema.inherited_ordering(cn).unwrap(), None);
    assert_eq!(schema.inherited_substr(cn).unwrap(), None);

    let syntax = schema.syntax_of(cn).unwrap().expect("cn has a syntax");
    assert_eq!(syntax.desc.as_deref(), Some("Directory String"));
    let rule = schema.equality_rule_of(cn).unwrap().expect("cn has an equality rule");
    assert_eq!(rule.oid, "2.5.13.2");

    let limit = schema.get::<AttributeType>("searchTimeLimit").unwrap();
    assert_eq!(schema.inherited_ordering(limit).unwrap(), Some("integerOrderingMatch"));
}

#[test]
fn test_unresolved_syntax_reference() {
    let schema = fixture_schema();
    let phone = schema.get::<AttributeType>("telephoneNumber").unwrap();
    assert!(matches!(
        schema.syntax_of(phone),
        Err(SchemaError::UnresolvedReference { kind: ElementKind::LdapSyntax, .. })
    ));
    assert_eq!(schema.equality_rule_of(phone).unwrap(), None);
}

#[test]
fn test_derives_from_and_subordinates() {
    let schema = fixture_schema();
    let org_person = schema.get::<ObjectClass>("organizationalPerson").unwrap();
    let top = schema.get::<ObjectClass>("top").unwrap();

    assert!(schema.derives_from(org_person, "TOP").unwrap());
    assert!(schema.derives_from(org_person, "2.5.6.6").unwrap());
    assert!(schema.derives_from(org_person, "organizationalPerson").unwrap());
    assert!(!schema.derives_from(org_person, "groupOfNames").unwrap());

    let children: BTreeSet<&str> = schema
        .subordinates(top)
        .iter()
        .map(|oc| oc.display_name())
        .collect();
    assert_eq!(
        children,
        BTreeSet::from(["person", "groupOfNames", "uidObject", "extensibleObject"])
    );

    let name = schema.get::<AttributeType>("name").unwrap();
    assert_eq!(schema.subordinates(name).len(), 4);
}

#[test]
fn test_structural_object_class() {
    let schema = fixture_schema();
    let classes: Vec<&ObjectClass> = ["top", "person", "uidObject", "organizationalPerson"]
        .iter()
        .map(|key| schema.get::<ObjectClass>(key).unwrap())
        .collect();

    let structural = schema.structural_object_class(&classes).unwrap();
    assert_eq!(structural.map(|oc| oc.display_name()), Some("organizationalPerson"));

    let auxiliary = [schema.get::<ObjectClass>("uidObject").unwrap()];
    assert_eq!(schema.structural_object_class(&auxiliary).unwrap(), None);
}
