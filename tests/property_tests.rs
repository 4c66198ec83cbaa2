use proptest::prelude::*;
use std::sync::Arc;
use vertebra_actions::{Action, ActionRegistry};
use vertebra_components::{underscore_to_camel_case, Component, ComponentOptions, PlainDetails};
use vertebra_core::{authorized, LocalSpine};

/// Admin groups are user groups, the last user list keeps its order at the
/// front, and `ui_groups` is that list without duplicates.
fn check_groups(component: &Component, assigned_users: &[String]) -> Result<(), TestCaseError> {
    let user_groups = component.user_groups();
    for admin in component.admin_groups() {
        prop_assert!(user_groups.contains(&admin));
    }
    prop_assert!(user_groups.starts_with(assigned_users));

    let ui_groups = component.ui_groups();
    let mut expected: Vec<String> = Vec::new();
    for group in user_groups.iter().chain(component.admin_groups().iter()) {
        if !expected.contains(group) {
            expected.push(group.clone());
        }
    }
    prop_assert_eq!(ui_groups, expected);
    Ok(())
}

proptest! {
    #[test]
    fn test_camel_case_drops_inner_underscores(key in "[a-z]{1,8}(_[a-z]{1,8}){0,4}") {
        let camel = underscore_to_camel_case(&key);

        prop_assert!(!camel.contains('_'));
        prop_assert_eq!(camel.len(), key.len() - key.matches('_').count());
        prop_assert_eq!(camel.to_lowercase(), key.replace('_', ""));
    }

    #[test]
    fn test_camel_case_is_idempotent_on_plain_words(word in "[a-z]{1,16}") {
        prop_assert_eq!(underscore_to_camel_case(&word), word);
    }

    #[test]
    fn test_empty_requirement_admits_everyone(
        groups in prop::collection::vec("[a-z]{1,6}", 0..6)
    ) {
        let required: Vec<String> = Vec::new();
        prop_assert!(authorized(&groups, &required));
    }

    #[test]
    fn test_authorization_is_symmetric_intersection(
        session in prop::collection::vec("[a-c]", 0..4),
        required in prop::collection::vec("[a-c]", 1..4),
    ) {
        let shares = session.iter().any(|g| required.contains(g));
        prop_assert_eq!(authorized(&session, &required), shares);
    }

    #[test]
    fn test_admin_groups_always_user_groups(
        users in prop::collection::vec("[a-e]", 0..5),
        admins in prop::collection::vec("[a-e]", 0..5),
        updates in prop::collection::vec(
            (any::<bool>(), prop::collection::vec("[a-e]", 0..5)),
            0..8,
        ),
    ) {
        let spine = Arc::new(LocalSpine::default());
        let component = Component::new(
            spine,
            "thermometer",
            "sensor",
            "Thermometer",
            ComponentOptions::new()
                .with_user_groups(users.clone())
                .with_admin_groups(admins.clone()),
            Arc::new(PlainDetails),
        );
        check_groups(&component, &users)?;

        let mut last_users = users;
        for (admin_update, groups) in updates {
            if admin_update {
                component.set_admin_groups(groups.clone());
                prop_assert_eq!(component.admin_groups(), groups);
            } else {
                component.set_user_groups(groups.clone());
                last_users = groups;
            }
            check_groups(&component, &last_users)?;
        }
    }

    #[test]
    fn test_one_handle_per_identifier(
        ids in prop::collection::vec("[a-d]\\.[a-d]", 1..20)
    ) {
        let registry = ActionRegistry::default();
        let first: Vec<Arc<Action>> = ids.iter().map(|id| registry.resolve(id)).collect();

        for id in &ids {
            registry.register(Action::from_fn(id.as_str(), id.as_str(), |_call| {
                Ok(serde_json::Value::Null)
            }));
        }

        for (id, handle) in ids.iter().zip(&first) {
            let current = registry.get(id).unwrap();
            prop_assert!(Arc::ptr_eq(handle, &current));
            prop_assert!(current.is_bound());
        }

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(registry.len(), unique.len());
    }
}
