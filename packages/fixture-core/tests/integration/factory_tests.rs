//! Factory and repository behavior.

use ntest::timeout;
use serde_json::json;

use fixture_core::config::FixtureConfig;
use fixture_core::context::FixtureContext;
use fixture_core::error::FixtureError;
use fixture_core::factory::Factory;
use fixture_core::generator::Generator;
use fixture_core::spec::Specification;

use super::helpers::{context, register_schemas, Mode};

#[timeout(1000)]
#[test]
fn test_many_entities_are_independent() {
    let ctx = context();
    let factory = Factory::new(Mode::Standard.relationship_with_global());

    let created = factory.create_many(&ctx, 5, Specification::new()).unwrap();

    let ids: Vec<u64> = created.iter().map(|entity| entity.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    let labels: std::collections::HashSet<String> = created
        .iter()
        .filter_map(|entity| entity.scalar("label"))
        .map(|label| label.to_string())
        .collect();
    assert_eq!(labels.len(), 5);
}

#[timeout(1000)]
#[test]
fn test_overrides_pin_values() {
    let ctx = context();
    let factory = Factory::new("GlobalEntity").with("name", "default");

    let created = factory
        .create_many(&ctx, 2, Specification::new().with("name", "pinned"))
        .unwrap();

    assert!(created
        .iter()
        .all(|entity| entity.scalar("name") == Some(&json!("pinned"))));
    assert_eq!(
        factory.create(&ctx).unwrap().scalar("name"),
        Some(&json!("default"))
    );
}

#[timeout(1000)]
#[test]
fn test_sequence_generator() {
    let ctx = context();
    let factory = Factory::new("GlobalEntity");

    let names: Vec<_> = factory
        .create_many(&ctx, 3, Specification::new())
        .unwrap()
        .into_iter()
        .filter_map(|entity| entity.scalar("name").cloned())
        .collect();

    assert_eq!(names, vec![json!("global_1"), json!("global_2"), json!("global_3")]);
}

#[timeout(1000)]
#[test]
fn test_seeded_contexts_are_reproducible() {
    let build = || {
        let ctx = FixtureContext::new(FixtureConfig::seeded(9));
        register_schemas(&ctx);
        Factory::new(Mode::Standard.owning_side())
            .with("inversed_side", Factory::new(Mode::Standard.inversed_side()))
            .with("rank", Generator::integer(1, 1_000_000))
            .create_many(&ctx, 4, Specification::new())
            .unwrap()
    };

    assert_eq!(build(), build());
}

#[timeout(1000)]
#[test]
fn test_build_does_not_persist() {
    let ctx = context();
    let inversed = Factory::new(Mode::Cascade.inversed_side());
    let owning = Factory::new(Mode::Cascade.owning_side());

    let built = inversed
        .build(&ctx, Specification::new().with("relations", owning.many(2)))
        .unwrap();

    assert_eq!(built.many("relations").len(), 2);
    inversed.repository(&ctx).assert_empty().unwrap();
    owning.repository(&ctx).assert_empty().unwrap();
}

#[timeout(1000)]
#[test]
fn test_standard_members_without_persisting_dangle() {
    let ctx = context();
    let inversed = Factory::new(Mode::Standard.inversed_side());
    let owning = Factory::new(Mode::Standard.owning_side()).without_persisting();

    let err = inversed
        .create_with(&ctx, Specification::new().with("relations", owning.many(2)))
        .unwrap_err();

    assert!(matches!(err, FixtureError::DanglingReference { .. }));
    inversed.repository(&ctx).assert_empty().unwrap();
}

#[timeout(1000)]
#[test]
fn test_cascade_members_follow_owner() {
    let ctx = context();
    let inversed = Factory::new(Mode::Cascade.inversed_side());
    let owning = Factory::new(Mode::Cascade.owning_side()).without_persisting();

    inversed
        .create_with(&ctx, Specification::new().with("relations", owning.many(2)))
        .unwrap();

    owning.repository(&ctx).assert_count(2).unwrap();
    inversed.repository(&ctx).assert_count(1).unwrap();
}

#[timeout(1000)]
#[test]
fn test_unknown_attribute_and_type() {
    let ctx = context();

    let err = Factory::new("GlobalEntity")
        .create_with(&ctx, Specification::new().with("colour", "red"))
        .unwrap_err();
    assert!(matches!(err, FixtureError::Specification { ref field, .. } if field == "colour"));

    let err = Factory::new("Nope").create(&ctx).unwrap_err();
    assert_eq!(
        err,
        FixtureError::UnknownEntityType {
            entity_type: "Nope".to_string()
        }
    );
}

#[timeout(1000)]
#[test]
fn test_collection_size_limit() {
    let ctx = FixtureContext::new(FixtureConfig {
        max_collection_size: 3,
        ..FixtureConfig::seeded(1)
    });
    register_schemas(&ctx);

    let err = Factory::new("GlobalEntity")
        .create_many(&ctx, 4, Specification::new())
        .unwrap_err();
    assert!(matches!(err, FixtureError::Specification { .. }));
}

#[timeout(1000)]
#[test]
fn test_repository_queries() {
    let ctx = context();
    let factory = Factory::new("GlobalEntity");
    let repository = factory.repository(&ctx);

    assert!(repository.random().is_err());
    let created = factory.create_many(&ctx, 3, Specification::new()).unwrap();

    repository.assert_count(3).unwrap();
    repository.assert_exists(created[1].id()).unwrap();
    assert!(repository.assert_exists(99).is_err());
    assert_eq!(repository.first().unwrap().as_ref(), created.first());
    assert_eq!(repository.find(3).unwrap().as_ref(), created.get(2));
    assert!(created.contains(&repository.random().unwrap()));
}

#[timeout(1000)]
#[test]
fn test_proxy_creation() {
    let ctx = context();
    let proxy = Factory::new("GlobalEntity")
        .create_proxy(&ctx, Specification::new())
        .unwrap();

    assert!(!proxy.is_lazy());
    assert_eq!(proxy.resolve(&ctx).unwrap().id(), 1);
}

#[timeout(1000)]
#[test]
fn test_repository_find_ignores_staged_rows() {
    let ctx = FixtureContext::new(FixtureConfig {
        auto_flush: false,
        ..FixtureConfig::seeded(1)
    });
    register_schemas(&ctx);
    let factory = Factory::new("GlobalEntity");
    let repository = factory.repository(&ctx);

    let staged = factory.create(&ctx).unwrap();
    assert!(ctx.find(staged.reference()).unwrap().is_some());
    assert_eq!(repository.find(staged.id()).unwrap(), None);
    assert!(repository.assert_exists(staged.id()).is_err());

    ctx.flush().unwrap();
    assert_eq!(repository.find(staged.id()).unwrap(), Some(staged.clone()));
    repository.assert_exists(staged.id()).unwrap();
}
