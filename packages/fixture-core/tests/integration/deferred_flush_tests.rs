//! Deferred flush scopes driven through the public context API.

use std::panic::{self, AssertUnwindSafe};

use ntest::timeout;

use fixture_core::batch::BatchState;
use fixture_core::error::FixtureError;
use fixture_core::factory::Factory;
use fixture_core::spec::Specification;

use super::helpers::{context, Mode};

#[timeout(1000)]
#[test]
fn test_empty_scope_is_noop() {
    let ctx = context();
    let written = ctx.begin_deferred().unwrap().commit().unwrap();

    assert_eq!(written, 0);
    assert_eq!(ctx.batch_state(), BatchState::Idle);
    ctx.repository("GlobalEntity").assert_empty().unwrap();
}

#[timeout(1000)]
#[test]
fn test_scope_commits_in_creation_order() {
    let ctx = context();
    let globals = Factory::new("GlobalEntity");

    let created = ctx
        .with_deferred_flush(|ctx| globals.create_many(ctx, 3, Specification::new()))
        .unwrap();

    let stored = globals.repository(&ctx).all().unwrap();
    assert_eq!(stored, created);
}

#[timeout(1000)]
#[test]
fn test_failing_scope_discards_everything() {
    let ctx = context();
    let inversed = Factory::new(Mode::Standard.inversed_side());
    let owning = Factory::new(Mode::Standard.owning_side());

    let err = ctx
        .with_deferred_flush(|ctx| {
            inversed.create_with(ctx, Specification::new().with("relations", owning.many(2)))?;
            // Mandatory collection left empty
            inversed.create(ctx)
        })
        .unwrap_err();

    match err {
        FixtureError::FlushAborted { source } => {
            assert!(matches!(*source, FixtureError::Cardinality { .. }));
        }
        other => panic!("expected FlushAborted, got {other:?}"),
    }
    inversed.repository(&ctx).assert_empty().unwrap();
    owning.repository(&ctx).assert_empty().unwrap();
    assert!(!ctx.is_deferred());
}

#[timeout(1000)]
#[test]
fn test_nested_scope_is_rejected() {
    let ctx = context();
    let err = ctx
        .with_deferred_flush(|ctx| ctx.with_deferred_flush(|_| Ok(())))
        .unwrap_err();

    match err {
        FixtureError::FlushAborted { source } => assert_eq!(*source, FixtureError::NestedScope),
        other => panic!("expected FlushAborted, got {other:?}"),
    }
    assert_eq!(ctx.batch_state(), BatchState::Idle);
}

#[timeout(1000)]
#[test]
fn test_panic_inside_scope_discards() {
    let ctx = context();
    let globals = Factory::new("GlobalEntity");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _scope = ctx.begin_deferred().unwrap();
        globals.create(&ctx).unwrap();
        panic!("fixture setup failed");
    }));

    assert!(result.is_err());
    globals.repository(&ctx).assert_empty().unwrap();
    assert_eq!(ctx.batch_state(), BatchState::Idle);

    // Context stays usable
    ctx.with_deferred_flush(|ctx| globals.create(ctx)).unwrap();
    globals.repository(&ctx).assert_count(1).unwrap();
}

#[timeout(1000)]
#[test]
fn test_explicit_discard() {
    let ctx = context();
    let globals = Factory::new("GlobalEntity");

    let scope = ctx.begin_deferred().unwrap();
    globals.create_many(&ctx, 2, Specification::new()).unwrap();

    assert_eq!(scope.discard(), 2);
    globals.repository(&ctx).assert_empty().unwrap();
}

#[timeout(1000)]
#[test]
fn test_scopes_run_back_to_back() {
    let ctx = context();
    let globals = Factory::new("GlobalEntity");

    for _ in 0..3 {
        ctx.with_deferred_flush(|ctx| globals.create(ctx)).unwrap();
    }

    globals.repository(&ctx).assert_count(3).unwrap();
}
