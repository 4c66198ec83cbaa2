//! Tests for the action registry

use serde_json::json;
use std::sync::Arc;
use vertebra_actions::{
    handler_fn, Action, ActionCall, ActionError, ActionOutcome, ActionRegistry,
};
use vertebra_core::{ActionsConfig, UnboundPolicy};

fn deferring_registry() -> ActionRegistry {
    ActionRegistry::new(&ActionsConfig {
        unbound_policy: UnboundPolicy::Defer,
        max_deferred_calls: 4,
        ..ActionsConfig::default()
    })
}

#[test]
fn test_reference_before_registration() {
    let registry = ActionRegistry::default();

    // A dashboard button refers to the action before the driver is loaded.
    let button_target = registry.resolve("gripper.close");
    assert!(button_target.is_linked());
    assert_eq!(
        button_target.execute(ActionCall::default()),
        Err(ActionError::Unbound("gripper.close".to_string()))
    );

    registry.register(Action::from_fn("gripper.close", "Close gripper", |call: &ActionCall| {
        Ok(json!({ "force": call.kwargs.get("force").cloned().unwrap_or(json!(10)) }))
    }));

    let outcome = button_target
        .execute(ActionCall::default().with_kwarg("force", json!(25)))
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Completed(json!({ "force": 25 })));
}

#[test]
fn test_registration_before_reference() {
    let registry = ActionRegistry::default();
    let registered = registry.register(Action::from_fn("gripper.open", "Open gripper", |_call: &ActionCall| {
        Ok(json!(true))
    }));

    let resolved = registry.resolve("gripper.open");
    assert!(Arc::ptr_eq(&registered, &resolved));
    assert!(resolved.is_bound());
}

#[test]
fn test_deferred_calls_run_once_bound() {
    let registry = deferring_registry();
    let action = registry.resolve("lamp.blink");

    assert_eq!(
        action.execute(ActionCall::new(vec![json!(3)])),
        Ok(ActionOutcome::Deferred { queued: 1 })
    );

    let blinks = Arc::new(parking_lot::Mutex::new(0u64));
    let counter = blinks.clone();
    registry.register(Action::new(
        "lamp.blink",
        "Blink",
        handler_fn(move |call: &ActionCall| {
            let times = call.args.first().and_then(|v| v.as_u64()).unwrap_or(1);
            *counter.lock() += times;
            Ok(json!(times))
        }),
    ));

    assert_eq!(*blinks.lock(), 3);
    assert_eq!(action.deferred_len(), 0);
    assert_eq!(
        action.execute(ActionCall::new(vec![json!(2)])),
        Ok(ActionOutcome::Completed(json!(2)))
    );
    assert_eq!(*blinks.lock(), 5);
}

#[test]
fn test_handler_may_resolve_other_actions() {
    let registry = Arc::new(ActionRegistry::default());
    let inner = registry.clone();

    registry.register(Action::from_fn("sequence.start", "Start", move |_call: &ActionCall| {
        let next = inner.resolve("sequence.step");
        Ok(json!(next.is_linked()))
    }));

    let outcome = registry.resolve("sequence.start").execute(ActionCall::default()).unwrap();
    assert_eq!(outcome, ActionOutcome::Completed(json!(true)));
    assert!(registry.contains("sequence.step"));
}

#[test]
fn test_get_does_not_reserve() {
    let registry = ActionRegistry::default();
    assert!(registry.get("nothing").is_none());
    assert!(registry.is_empty());
    registry.resolve("nothing");
    assert!(registry.get("nothing").is_some());
    assert_eq!(registry.action_ids(), vec!["nothing".to_string()]);
}

#[test]
fn test_queued_calls_run_before_fresh_ones() {
    let registry = deferring_registry();
    let action = registry.resolve("arm.home");
    action.execute(ActionCall::new(vec![json!(1)])).unwrap();

    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = order.clone();
    let handler = handler_fn(move |call: &ActionCall| {
        let step = call.args.first().and_then(|v| v.as_u64()).unwrap_or(0);
        if step == 1 {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        seen.lock().push(step);
        Ok(json!(step))
    });

    std::thread::scope(|scope| {
        scope.spawn(|| {
            registry.register(Action::new("arm.home", "Home", handler));
        });
        scope.spawn(|| {
            while !action.is_bound() {
                std::thread::yield_now();
            }
            action.execute(ActionCall::new(vec![json!(2)])).unwrap();
        });
    });

    assert_eq!(*order.lock(), vec![1, 2]);
}

#[test]
fn test_replayed_handler_may_call_itself() {
    let registry = Arc::new(deferring_registry());
    let action = registry.resolve("arm.step");
    action.execute(ActionCall::new(vec![json!(2)])).unwrap();

    let inner = registry.clone();
    registry.register(Action::from_fn("arm.step", "Step", move |call: &ActionCall| {
        let left = call.args.first().and_then(|v| v.as_u64()).unwrap_or(0);
        if left > 0 {
            inner.resolve("arm.step").execute(ActionCall::new(vec![json!(left - 1)]))?;
        }
        Ok(json!(left))
    }));

    assert!(action.is_bound());
    assert_eq!(action.deferred_len(), 0);
}
