//! Relationship edge cases: global fixtures inside deferred scopes,
//! mandatory inverse relations, and dual relations to the same type.

use std::collections::HashSet;

use ntest::timeout;

use fixture_core::context::FixtureContext;
use fixture_core::entity::{Entity, EntityRef};
use fixture_core::error::FixtureError;
use fixture_core::factory::Factory;
use fixture_core::spec::{Attribute, Specification};

use super::helpers::{context, global_entity_factory, load_global_story, Mode, GLOBAL_KEY};

fn global_attribute(ctx: &FixtureContext, as_proxy: bool) -> Result<Attribute, FixtureError> {
    let factory = global_entity_factory();
    if as_proxy {
        let proxy = ctx.global_proxy(GLOBAL_KEY, &factory)?;
        assert!(proxy.is_lazy());
        Ok(proxy.into())
    } else {
        Ok(ctx.global(GLOBAL_KEY, &factory)?.into())
    }
}

fn flush_after_with_global_entity(mode: Mode, as_proxy: bool) {
    let ctx = context();
    load_global_story(&ctx);
    let globals = ctx.repository("GlobalEntity");
    let global_count = globals.count().unwrap();

    let factory = Factory::new(mode.relationship_with_global());
    ctx.with_deferred_flush(|ctx| {
        let global = global_attribute(ctx, as_proxy)?;
        factory.create_with(ctx, Specification::new().with("global_entity", global))
    })
    .unwrap();

    // No extra global entity
    globals.assert_count(global_count).unwrap();
    factory.repository(&ctx).assert_count(1).unwrap();

    let entity = factory.repository(&ctx).first().unwrap().unwrap();
    let global = ctx.global(GLOBAL_KEY, &global_entity_factory()).unwrap();
    assert_eq!(entity.one("global_entity"), Some(global.reference()));
}

#[timeout(1000)]
#[test]
fn test_flush_after_standard_with_global_entity() {
    flush_after_with_global_entity(Mode::Standard, false);
}

#[timeout(1000)]
#[test]
fn test_flush_after_cascade_with_global_entity() {
    flush_after_with_global_entity(Mode::Cascade, false);
}

#[timeout(1000)]
#[test]
fn test_flush_after_standard_with_global_proxy() {
    flush_after_with_global_entity(Mode::Standard, true);
}

#[timeout(1000)]
#[test]
fn test_flush_after_cascade_with_global_proxy() {
    flush_after_with_global_entity(Mode::Cascade, true);
}

#[timeout(1000)]
#[test]
fn test_global_first_resolved_inside_scope() {
    let ctx = context();
    let factory = Factory::new(Mode::Standard.relationship_with_global());

    ctx.with_deferred_flush(|ctx| {
        let global = global_attribute(ctx, true)?;
        // Stored before the scope commits
        assert_eq!(ctx.repository("GlobalEntity").count()?, 1);
        assert_eq!(factory.repository(ctx).count()?, 0);
        factory.create_with(ctx, Specification::new().with("global_entity", global))
    })
    .unwrap();

    ctx.repository("GlobalEntity").assert_count(1).unwrap();
    factory.repository(&ctx).assert_count(1).unwrap();
}

#[timeout(1000)]
#[test]
fn test_global_attribute_in_factory_defaults() {
    let ctx = context();
    let factory = Factory::new(Mode::Cascade.relationship_with_global())
        .with("global_entity", Attribute::global(GLOBAL_KEY, global_entity_factory()));

    let created = factory.create_many(&ctx, 3, Specification::new()).unwrap();

    ctx.repository("GlobalEntity").assert_count(1).unwrap();
    let targets: HashSet<&EntityRef> = created
        .iter()
        .filter_map(|entity| entity.one("global_entity"))
        .collect();
    assert_eq!(targets.len(), 1);
}

fn inversed_relationship_mandatory(mode: Mode) {
    let ctx = context();
    let inversed = Factory::new(mode.inversed_side());
    let owning = Factory::new(mode.owning_side());

    let inversed_entity = inversed
        .create_with(&ctx, Specification::new().with("relations", owning.many(2)))
        .unwrap();

    assert_eq!(inversed_entity.many("relations").len(), 2);
    owning.repository(&ctx).assert_count(2).unwrap();
    inversed.repository(&ctx).assert_count(1).unwrap();

    for member in owning.repository(&ctx).all().unwrap() {
        assert_eq!(member.one("inversed_side"), Some(inversed_entity.reference()));
    }
    let stored = inversed.repository(&ctx).first().unwrap().unwrap();
    assert_eq!(stored, inversed_entity);
}

#[timeout(1000)]
#[test]
fn test_inversed_relationship_mandatory_standard() {
    inversed_relationship_mandatory(Mode::Standard);
}

#[timeout(1000)]
#[test]
fn test_inversed_relationship_mandatory_cascade() {
    inversed_relationship_mandatory(Mode::Cascade);
}

#[timeout(1000)]
#[test]
fn test_inversed_relationship_mandatory_inside_scope() {
    let ctx = context();
    let inversed = Factory::new(Mode::Cascade.inversed_side());
    let owning = Factory::new(Mode::Cascade.owning_side());

    let written = {
        let scope = ctx.begin_deferred().unwrap();
        inversed
            .create_with(&ctx, Specification::new().with("relations", owning.many(2)))
            .unwrap();
        assert_eq!(scope.pending(), 3);
        scope.commit().unwrap()
    };

    assert_eq!(written, 3);
    owning.repository(&ctx).assert_count(2).unwrap();
    inversed.repository(&ctx).assert_count(1).unwrap();
}

#[timeout(1000)]
#[test]
fn test_mandatory_collection_left_empty() {
    let ctx = context();
    let err = Factory::new(Mode::Standard.inversed_side())
        .create(&ctx)
        .unwrap_err();

    assert!(matches!(err, FixtureError::Cardinality { actual: 0, .. }));
    ctx.repository(Mode::Standard.inversed_side())
        .assert_empty()
        .unwrap();
}

#[timeout(1000)]
#[test]
fn test_owning_side_creates_its_inversed_side() {
    let ctx = context();
    let owning = Factory::new(Mode::Standard.owning_side())
        .with("inversed_side", Factory::new(Mode::Standard.inversed_side()));

    let member = owning.create(&ctx).unwrap();

    let parent_ref = member.one("inversed_side").unwrap().clone();
    let parent = ctx.find(&parent_ref).unwrap().unwrap();
    assert_eq!(parent.many("relations"), &[member.reference().clone()]);
    ctx.repository(Mode::Standard.inversed_side())
        .assert_count(1)
        .unwrap();
}

#[timeout(1000)]
#[test]
fn test_owning_side_joins_existing_inversed_side() {
    let ctx = context();
    let inversed = Factory::new(Mode::Standard.inversed_side());
    let owning = Factory::new(Mode::Standard.owning_side());
    let parent = inversed
        .create_with(&ctx, Specification::new().with("relations", owning.many(1)))
        .unwrap();

    owning
        .create_with(&ctx, Specification::new().with("inversed_side", &parent))
        .unwrap();

    let parent = inversed.repository(&ctx).find(parent.id()).unwrap().unwrap();
    assert_eq!(parent.many("relations").len(), 2);
    owning.repository(&ctx).assert_count(2).unwrap();
}

fn ids(refs: &[EntityRef]) -> HashSet<u64> {
    refs.iter().map(|r| r.id).collect()
}

#[timeout(1000)]
#[test]
fn test_inversed_multiple_mandatory_relationship_to_same_entity() {
    let ctx = context();
    let inversed = Factory::new("MultiInversedSideEntity");
    let owning = Factory::new("MultiOwningSideEntity");

    let entity = inversed
        .create_with(
            &ctx,
            Specification::new()
                .with("main_relations", owning.many(2))
                .with("secondary_relations", owning.many(2)),
        )
        .unwrap();

    let main = ids(entity.many("main_relations"));
    let secondary = ids(entity.many("secondary_relations"));
    assert_eq!(main.len(), 2);
    assert_eq!(secondary.len(), 2);
    assert!(main.is_disjoint(&secondary));
    owning.repository(&ctx).assert_count(4).unwrap();
    inversed.repository(&ctx).assert_count(1).unwrap();

    let members: Vec<Entity> = owning.repository(&ctx).all().unwrap();
    for member in &members {
        let in_main = main.contains(&member.id());
        let link = if in_main { "main" } else { "secondary" };
        let other = if in_main { "secondary" } else { "main" };
        assert_eq!(member.one(link), Some(entity.reference()));
        assert_eq!(member.one(other), None);
    }
}

#[timeout(1000)]
#[test]
fn test_dual_relations_reject_shared_member() {
    let ctx = context();
    let inversed = Factory::new("MultiInversedSideEntity");
    let owning = Factory::new("MultiOwningSideEntity");
    let shared = owning.create(&ctx).unwrap();

    let err = inversed
        .create_with(
            &ctx,
            Specification::new()
                .with("main_relations", vec![shared.reference().clone()])
                .with("secondary_relations", vec![shared.reference().clone()]),
        )
        .unwrap_err();

    assert!(matches!(err, FixtureError::OverlappingRelations { .. }));
    inversed.repository(&ctx).assert_empty().unwrap();
}

#[timeout(1000)]
#[test]
fn test_moving_member_updates_previous_owner() {
    let ctx = context();
    let inversed = Factory::new(Mode::Standard.inversed_side());
    let owning = Factory::new(Mode::Standard.owning_side());
    let first = inversed
        .create_with(&ctx, Specification::new().with("relations", owning.many(2)))
        .unwrap();
    let moved = first.many("relations")[0].clone();
    let kept = first.many("relations")[1].clone();

    let second = inversed
        .create_with(&ctx, Specification::new().with("relations", vec![moved.clone()]))
        .unwrap();

    let first = inversed.repository(&ctx).find(first.id()).unwrap().unwrap();
    let second_stored = inversed.repository(&ctx).find(second.id()).unwrap().unwrap();
    let member = owning.repository(&ctx).find(moved.id).unwrap().unwrap();
    assert_eq!(first.many("relations"), &[kept]);
    assert_eq!(second_stored.many("relations"), &[moved]);
    assert_eq!(member.one("inversed_side"), Some(second.reference()));
    owning.repository(&ctx).assert_count(2).unwrap();
    inversed.repository(&ctx).assert_count(2).unwrap();
}

#[timeout(1000)]
#[test]
fn test_moving_last_member_of_mandatory_collection_fails() {
    let ctx = context();
    let inversed = Factory::new(Mode::Cascade.inversed_side());
    let owning = Factory::new(Mode::Cascade.owning_side());
    let first = inversed
        .create_with(&ctx, Specification::new().with("relations", owning.many(1)))
        .unwrap();
    let member_ref = first.many("relations")[0].clone();

    let err = inversed
        .create_with(&ctx, Specification::new().with("relations", vec![member_ref.clone()]))
        .unwrap_err();

    match err {
        FixtureError::Cardinality {
            entity_type,
            relation,
            actual,
            ..
        } => {
            assert_eq!(entity_type, Mode::Cascade.inversed_side());
            assert_eq!(relation, "relations");
            assert_eq!(actual, 0);
        }
        other => panic!("expected Cardinality, got {other:?}"),
    }
    // Nothing changed in storage
    inversed.repository(&ctx).assert_count(1).unwrap();
    let first = inversed.repository(&ctx).find(first.id()).unwrap().unwrap();
    assert_eq!(first.many("relations"), &[member_ref.clone()]);
    let member = owning.repository(&ctx).find(member_ref.id).unwrap().unwrap();
    assert_eq!(member.one("inversed_side"), Some(first.reference()));
}

#[timeout(1000)]
#[test]
fn test_moving_member_inside_deferred_scope() {
    let ctx = context();
    let inversed = Factory::new(Mode::Standard.inversed_side());
    let owning = Factory::new(Mode::Standard.owning_side());

    let (first, second) = ctx
        .with_deferred_flush(|ctx| {
            let first =
                inversed.create_with(ctx, Specification::new().with("relations", owning.many(2)))?;
            let moved = first.many("relations")[1].clone();
            let second =
                inversed.create_with(ctx, Specification::new().with("relations", vec![moved]))?;
            Ok((first, second))
        })
        .unwrap();

    let first = inversed.repository(&ctx).find(first.id()).unwrap().unwrap();
    let second = inversed.repository(&ctx).find(second.id()).unwrap().unwrap();
    assert_eq!(first.many("relations").len(), 1);
    assert_eq!(second.many("relations").len(), 1);
    let first_ids = ids(first.many("relations"));
    assert!(first_ids.is_disjoint(&ids(second.many("relations"))));
}
