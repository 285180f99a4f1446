//! Build configuration loaded from JSON.

use concord_tests::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_config_round_trips_through_json() {
    // GIVEN
    let config = BuildConfig::default()
        .with_limits(ExpansionLimits {
            base_pass_limit: 7,
            ..ExpansionLimits::default()
        })
        .without_semantic_checks();

    // WHEN
    let json = config.to_json_string().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    // THEN
    assert_eq!(value["limits"]["base_pass_limit"], 7);
    assert_eq!(value["validate_semantics"], false);
    assert_eq!(BuildConfig::from_json_str(&json).unwrap(), config);
}

mod counter {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("counter up to five")
            .concept("Counter", fields! { "Step" => 0 })
            .capabilities(|c| {
                c.register_macro("Counter", StepsUpTo(5));
            })
    }

    #[test]
    fn test_tight_pass_limit_from_json_stops_expansion() {
        // GIVEN: a pass limit of three loaded from JSON
        let config = BuildConfig::from_json_str(
            r#"{ "limits": { "base_pass_limit": 3, "passes_per_concept": 0 } }"#,
        )
        .unwrap();

        // WHEN: the counter is built with and without it

        // THEN: only the default limits let it reach step five
        scenario()
            .config(config)
            .expect(|e| e.error("did not converge after 3 passes"))
            .run()
            .unwrap();
        scenario().expect(|e| e.count(6)).run().unwrap();
    }
}

mod missing_data {
    use super::*;

    pub fn scenario() -> Scenario {
        Scenario::new("missing data tolerated")
            .concept("SimpleConceptInfo", fields! { "Name" => "a" })
            .capabilities(|c| {
                c.register_check("SimpleConceptInfo", DataRequired);
            })
    }

    #[test]
    fn test_disabled_semantic_checks_from_json() {
        // GIVEN: semantic checks disabled in JSON
        let config = BuildConfig::from_json_str(r#"{ "validate_semantics": false }"#).unwrap();

        // WHEN: a concept failing its check is built

        // THEN: the build succeeds
        scenario()
            .config(config)
            .expect(|e| e.count(1).has("SimpleConceptInfo a"))
            .run()
            .unwrap();
    }
}
