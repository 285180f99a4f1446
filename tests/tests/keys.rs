//! Canonical key computation.

use concord_tests::prelude::*;
use pretty_assertions::assert_eq;

fn key_of(store: &ConceptStore<'_>, concept: &Concept) -> String {
    store.identity().key(concept).unwrap()
}

#[test]
fn test_key_is_deterministic() {
    // GIVEN
    let registry = fixture_registry().unwrap();
    let store = ConceptStore::new(&registry);
    let concept = registry
        .concept("SimpleConceptInfo", fields! { "Name" => "a", "Data" => "x" })
        .unwrap();

    // WHEN
    let first = key_of(&store, &concept);
    let second = key_of(&store, &concept.clone());

    // THEN
    assert_eq!(first, "SimpleConceptInfo a");
    assert_eq!(first, second);
}

#[test]
fn test_value_fields_do_not_change_the_key() {
    // GIVEN
    let registry = fixture_registry().unwrap();
    let store = ConceptStore::new(&registry);
    let a = registry
        .concept("SimpleConceptInfo", fields! { "Name" => "a", "Data" => "x" })
        .unwrap();
    let b = registry
        .concept("SimpleConceptInfo", fields! { "Name" => "a", "Data" => "y" })
        .unwrap();

    // WHEN / THEN
    assert_eq!(key_of(&store, &a), key_of(&store, &b));
}

#[test]
fn test_key_values_are_quoted_when_needed() {
    // GIVEN
    let registry = fixture_registry().unwrap();
    let store = ConceptStore::new(&registry);
    let named = |name: &str| {
        registry
            .concept("SimpleConceptInfo", fields! { "Name" => name })
            .unwrap()
    };

    // WHEN / THEN
    assert_eq!(key_of(&store, &named("plain_name")), "SimpleConceptInfo plain_name");
    assert_eq!(key_of(&store, &named("two words")), "SimpleConceptInfo 'two words'");
    assert_eq!(key_of(&store, &named("\"")), "SimpleConceptInfo '\"'");
    assert_eq!(key_of(&store, &named("it's")), "SimpleConceptInfo \"it's\"");
    assert_eq!(
        key_of(&store, &named("it's \"quoted\"")),
        "SimpleConceptInfo 'it''s \"quoted\"'"
    );
}

#[test]
fn test_reference_key_field_uses_referenced_key_values() {
    // GIVEN
    let registry = fixture_registry().unwrap();
    let store = ConceptStore::new(&registry);
    let property = registry
        .concept(
            "Property",
            fields! { "Entity" => entity_ref("Common", "Person"), "Name" => "age" },
        )
        .unwrap();

    // WHEN
    let key = key_of(&store, &property);

    // THEN
    assert_eq!(key, "Property Common.Person.age");
}

#[test]
fn test_refinement_shares_base_key() {
    // GIVEN
    let registry = fixture_registry().unwrap();
    let store = ConceptStore::new(&registry);
    let base = registry
        .concept("SimpleConceptInfo", fields! { "Name" => "a" })
        .unwrap();
    let derived = registry
        .concept("DoubleDerivedConceptInfo", fields! { "Name" => "a", "More" => 1 })
        .unwrap();

    // WHEN
    let key = key_of(&store, &derived);

    // THEN
    assert_eq!(key, "SimpleConceptInfo a");
    assert_eq!(key, key_of(&store, &base));
}

#[test]
fn test_refinement_cannot_add_key_field() {
    // GIVEN
    let mut builder = RegistryBuilder::new();
    builder.add_type("Base").key_value("Name").done().unwrap();

    // WHEN
    let err = builder
        .add_type("Refined")
        .extends("Base")
        .key_value("Version")
        .done()
        .unwrap_err();

    // THEN
    assert!(matches!(
        err,
        DefinitionError::RefinementAddsKeyField { ref type_name, ref field }
            if type_name == "Refined" && field == "Version"
    ));
}

#[test]
fn test_polymorphic_reference_prefixes_type() {
    // GIVEN
    let registry = fixture_registry().unwrap();
    let store = ConceptStore::new(&registry);
    let on_module = registry
        .concept("Note", fields! { "Target" => module_ref("Common"), "Text" => "hi" })
        .unwrap();
    let on_entity = registry
        .concept(
            "Note",
            fields! { "Target" => entity_ref("Common", "Person"), "Text" => "hi" },
        )
        .unwrap();

    // WHEN / THEN
    assert_eq!(key_of(&store, &on_module), "Note Module:Common.hi");
    assert_eq!(key_of(&store, &on_entity), "Note Entity:Common.Person.hi");
}

#[test]
fn test_missing_key_value_is_rejected() {
    // GIVEN
    let registry = fixture_registry().unwrap();
    let store = ConceptStore::new(&registry);
    let concept = registry.concept("Entity", fields! { "Name" => "E" }).unwrap();

    // WHEN
    let err = store.identity().key(&concept).unwrap_err();

    // THEN
    assert_eq!(err, DefinitionError::missing_key_value("Entity", "Module"));
}
