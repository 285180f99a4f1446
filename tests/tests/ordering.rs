//! Processing order, cycle reports and semantic checks.

use concord_order::Sequencer;
use concord_tests::prelude::*;
use pretty_assertions::assert_eq;

fn keys(model: &Model<'_>) -> Vec<String> {
    model
        .order()
        .iter()
        .filter_map(|id| model.key_of(*id).map(str::to_string))
        .collect()
}

// ==================== Order ====================

mod entity_and_property {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("entity and property")
            .concept(
                "Property",
                fields! { "Entity" => entity_ref("Common", "Person"), "Name" => "age" },
            )
            .concept(
                "Entity",
                fields! { "Module" => module_ref("Common"), "Name" => "Person" },
            )
            .concept("Module", fields! { "Name" => "Common" })
            .expect(|e| {
                e.order(&[
                    "Module Common",
                    "Entity Common.Person",
                    "Property Common.Person.age",
                ])
            })
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        // GIVEN: a property, its entity and its module parsed in reverse order

        // WHEN: the model is built

        // THEN: each concept follows the concepts it references
        scenario().run().unwrap();
    }
}

#[test]
fn test_order_is_stable_across_builds() {
    // GIVEN: the same model parsed in two different orders
    let registry = fixture_registry().unwrap();
    let capabilities = CapabilityTable::new();
    let parsed = || {
        vec![
            registry
                .concept("Node", fields! { "Name" => "z", "Uses" => node_ref("m") })
                .unwrap(),
            registry.concept("Node", fields! { "Name" => "m" }).unwrap(),
            registry
                .concept("Node", fields! { "Name" => "a", "Uses" => node_ref("m") })
                .unwrap(),
            registry.concept("Node", fields! { "Name" => "k" }).unwrap(),
        ]
    };
    let mut reversed = parsed();
    reversed.reverse();

    // WHEN
    let first = build(&registry, &capabilities, parsed()).unwrap();
    let second = build(&registry, &capabilities, reversed).unwrap();

    // THEN
    assert_eq!(keys(&first), keys(&second));
    assert_eq!(keys(&first), vec!["Node m", "Node a", "Node k", "Node z"]);
}

#[test]
fn test_concepts_of_type_follow_processing_order() {
    // GIVEN
    let registry = fixture_registry().unwrap();
    let concepts = vec![
        registry
            .concept("Node", fields! { "Name" => "a", "Uses" => node_ref("b") })
            .unwrap(),
        registry.concept("Node", fields! { "Name" => "b" }).unwrap(),
    ];

    // WHEN
    let model = build(&registry, &CapabilityTable::new(), concepts).unwrap();

    // THEN
    let names: Vec<&str> = model
        .concepts_of_type("Node")
        .into_iter()
        .filter_map(|id| model.field(id, "Name").as_str())
        .collect();
    assert_eq!(names, vec!["b", "a"]);

    let b = model.id("Node b").unwrap();
    assert_eq!(model.find_by_reference("Node", "Uses", b), vec![model.id("Node a").unwrap()]);
}

// ==================== Declared dependencies ====================

mod module_summary {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("summary after entities")
            .concept("Module", fields! { "Name" => "Common" })
            .concept(
                "Entity",
                fields! { "Module" => module_ref("Common"), "Name" => "B" },
            )
            .concept(
                "Entity",
                fields! { "Module" => module_ref("Common"), "Name" => "A" },
            )
            .capabilities(|c| {
                c.register_macro("Module", SummarizeModule);
            })
            .expect(|e| {
                e.order(&[
                    "Module Common",
                    "Entity Common.A",
                    "Entity Common.B",
                    "Summary Common",
                ])
                .check(|model| {
                    let summary = model.id("Summary Common").ok_or("no summary")?;
                    if model.field(summary, "Entities").as_int() != Some(2) {
                        return Err(format!("wrong count: {}", model.field(summary, "Entities")));
                    }
                    let dependencies = model.dependencies_of(summary);
                    let entities = model.concepts_of_type("Entity");
                    if !entities.iter().all(|e| dependencies.contains(e)) {
                        return Err(format!("summary dependencies {:?}", dependencies));
                    }
                    Ok(())
                })
            })
    }

    #[test]
    fn test_declared_dependencies_order_generated_concepts() {
        // GIVEN: a module macro generating a summary that must follow every entity

        // WHEN: the model is built

        // THEN: the summary comes after both entities and depends on them
        scenario().run().unwrap();
    }
}

mod missing_declared_dependency {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("module requires an undefined audit module")
            .concept("Module", fields! { "Name" => "Common" })
            .concept(
                "Entity",
                fields! { "Module" => module_ref("Common"), "Name" => "Person" },
            )
            .concept("Node", fields! { "Name" => "Audited" })
            .concept("Node", fields! { "Name" => "other" })
            .capabilities(|c| {
                c.register_macro("Module", RequiresAudit);
            })
            .expect(|e| {
                e.error("missing 'Module Audit', required by:")
                    .implicated(&[
                        "Entity Module=Module:Common Name=Person Comment=<null>",
                        "Module Name=Common",
                        "Node Name=Audited Uses=<null> Also=<null>",
                    ])
                    .not_implicating("Name=other")
            })
    }

    #[test]
    fn test_missing_declared_dependency_reports_dependents() {
        // GIVEN: a module declared to depend on a module nobody defines, and a
        // node declared to depend on that module

        // WHEN: the model is built

        // THEN: the report names the module, the entity referencing it and the
        // node that only depends on it through a declared edge
        scenario().run().unwrap();
    }
}

// ==================== Cycles ====================

mod cyclic_nodes {
    use super::*;

    // a <-> b is the cycle; c leads into it and d hangs off it
    pub fn scenario() -> Scenario {
        Scenario::new("cycle between a and b")
            .concept(
                "Node",
                fields! { "Name" => "a", "Uses" => node_ref("b"), "Also" => node_ref("d") },
            )
            .concept("Node", fields! { "Name" => "b", "Uses" => node_ref("a") })
            .concept("Node", fields! { "Name" => "c", "Uses" => node_ref("a") })
            .concept("Node", fields! { "Name" => "d" })
            .expect(|e| {
                e.error("Dependency cycle detected")
                    .implicated(&[
                        "Node Name=a Uses=Node:b Also=Node:d",
                        "Node Name=b Uses=Node:a Also=<null>",
                    ])
                    .not_implicating("Name=c")
                    .not_implicating("Name=d")
            })
    }

    #[test]
    fn test_cycle_report_names_only_cycle_members() {
        // GIVEN: two nodes referencing each other, one leading in and one hanging off

        // WHEN: the model is built

        // THEN: only the two cycle members are reported
        scenario().run().unwrap();
    }
}

mod self_reference {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("node using itself")
            .concept("Node", fields! { "Name" => "b", "Uses" => node_ref("a") })
            .concept("Node", fields! { "Name" => "a", "Uses" => node_ref("a") })
            .expect(|e| e.order(&["Node a", "Node b"]))
    }

    #[test]
    fn test_self_reference_is_not_a_cycle() {
        // GIVEN: a node referencing itself and another node referencing it

        // WHEN: the model is built

        // THEN: the build succeeds in dependency order
        scenario().run().unwrap();
    }
}

#[test]
fn test_sequencer_lists_every_cyclic_component() {
    // GIVEN: two independent cycles
    let registry = fixture_registry().unwrap();
    let mut store = ConceptStore::new(&registry);
    let mut ids = Vec::new();
    for name in ["a", "b", "x", "y"] {
        let (id, _) = store
            .add(registry.concept("Node", fields! { "Name" => name }).unwrap())
            .unwrap();
        ids.push(id);
    }
    let (a, b, x, y) = (ids[0], ids[1], ids[2], ids[3]);
    let edges = vec![(a, b), (b, a), (x, y), (y, x)];

    // WHEN
    let sequencer = Sequencer::new(&store, edges);

    // THEN
    assert_eq!(sequencer.cycles(), vec![vec![a, b], vec![x, y]]);
    assert_eq!(sequencer.minimal_cycle(), Some(vec![a, b]));
    assert!(sequencer.order().is_err());
}

// ==================== Semantic checks ====================

mod missing_data {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("missing data")
            .concept("SimpleConceptInfo", fields! { "Name" => "c" })
            .concept("SimpleConceptInfo", fields! { "Name" => "a", "Data" => "x" })
            .concept("SimpleConceptInfo", fields! { "Name" => "b" })
            .capabilities(|c| {
                c.register_check("SimpleConceptInfo", DataRequired);
            })
    }

    #[test]
    fn test_semantic_check_fails_fast_in_processing_order() {
        // GIVEN: two concepts without data, b ordered before c

        // WHEN: the model is built

        // THEN: only the first failure in processing order is reported
        scenario()
            .expect(|e| {
                e.error("Data is required")
                    .implicated(&["SimpleConceptInfo Name=b Data=<null>"])
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_semantic_check_applies_to_refinements() {
        // GIVEN: a derived concept without data and a check on the base type

        // WHEN: the model is built

        // THEN: the check ran on the derived concept
        Scenario::new("derived concept missing data")
            .concept("DerivedConceptInfo", fields! { "Name" => "a", "Extra" => "e" })
            .capabilities(|c| {
                c.register_check("SimpleConceptInfo", DataRequired);
            })
            .expect(|e| e.implicated(&["DerivedConceptInfo Name=a Data=<null> Extra=e"]))
            .run()
            .unwrap();
    }

    #[test]
    fn test_valid_model_passes_semantic_checks() {
        // GIVEN: every concept carries data

        // WHEN: the model is built

        // THEN: the checks pass
        Scenario::new("all data present")
            .concept("SimpleConceptInfo", fields! { "Name" => "a", "Data" => "x" })
            .concept("DoubleDerivedConceptInfo", fields! { "Name" => "b", "Data" => "y" })
            .capabilities(|c| {
                c.register_check("SimpleConceptInfo", DataRequired);
            })
            .expect(|e| e.count(2))
            .run()
            .unwrap();
    }
}
