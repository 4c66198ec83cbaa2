//! Tests for dashboard links

use serde_json::{json, Map, Value as JsonValue};
use std::sync::Arc;
use vertebra_components::{Component, ComponentDetails, ComponentError, ComponentOptions};
use vertebra_core::{events, queries, LocalSpine, QueryRequest, Session};

fn params(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

struct GaugeDetails;

impl ComponentDetails for GaugeDetails {
    fn ui_parameters(&self) -> Map<String, JsonValue> {
        params(json!({ "min_value": 0, "max_value": 10, "link_to_header": true }))
    }
}

fn gauge(spine: &Arc<LocalSpine>, groups: &[&str]) -> Arc<Component> {
    Component::new(
        spine.clone(),
        "battery",
        "sensor",
        "Battery",
        ComponentOptions::new().with_user_groups(groups.iter().copied()),
        Arc::new(GaugeDetails),
    )
}

fn section(spine: &LocalSpine, dashboard: &str, section: &str) -> Vec<JsonValue> {
    let request = QueryRequest::new(vec![json!(dashboard), json!(section)]);
    spine.send_query(queries::GET_DASHBOARD_COMPONENTS, &request)
}

#[test]
fn test_link_parameters() {
    let spine = Arc::new(LocalSpine::default());
    let component = gauge(&spine, &[]);

    let link = component
        .link_to_dashboard("main", "power", params(json!({ "max_value": 24 })))
        .unwrap();

    assert_eq!(link.parameter("min_value"), Some(json!(0)));
    assert_eq!(link.parameter("max_value"), Some(json!(24)));
    assert_eq!(link.parameter("link_to_header"), Some(json!(true)));
    assert_eq!(link.parameter("icon"), Some(JsonValue::Null));
    assert_eq!(link.component_id(), "battery");

    // component defaults untouched
    assert_eq!(component.ui_parameters()["max_value"], json!(10));
}

#[test]
fn test_undeclared_override_rejected() {
    let spine = Arc::new(LocalSpine::default());
    let component = gauge(&spine, &[]);

    let err = component
        .link_to_dashboard("main", "power", params(json!({ "icon": "bolt" })))
        .unwrap_err();
    assert!(matches!(err, ComponentError::InvalidParameter { ref name, .. } if name == "icon"));
    assert!(component.dashboard_links().is_empty());
}

#[test]
fn test_dashboard_components_query() {
    let spine = Arc::new(LocalSpine::default());
    let component = gauge(&spine, &[]);

    let main = component.link_to_dashboard("main", "power", Map::new()).unwrap();
    let any = component.link_to_dashboard("*", "power", Map::new()).unwrap();
    component.link_to_dashboard("main", "header", Map::new()).unwrap();

    let answers = section(&spine, "main", "power");
    assert_eq!(answers.len(), 1);
    let links = answers[0].as_array().unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0]["linkId"], json!(main.link_id()));
    assert_eq!(links[1]["linkId"], json!(any.link_id()));
    assert_eq!(links[0]["componentId"], json!("battery"));
    assert_eq!(links[0]["parameters"]["maxValue"], json!(10));
    assert_eq!(links[0]["parameters"]["linkToHeader"], json!(true));

    // wildcard link shows on every dashboard
    let answers = section(&spine, "garage", "power");
    let links = answers[0].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["linkId"], json!(any.link_id()));

    let answers = section(&spine, "main", "nowhere");
    assert_eq!(answers[0], json!([]));
}

#[test]
fn test_dashboard_query_respects_groups() {
    let spine = Arc::new(LocalSpine::default());
    let component = gauge(&spine, &["operator"]);
    component.link_to_dashboard("main", "power", Map::new()).unwrap();

    let request = QueryRequest::new(vec![json!("main"), json!("power")])
        .with_session(Session::new(["guest"]));
    assert!(spine
        .send_query(queries::GET_DASHBOARD_COMPONENTS, &request)
        .is_empty());

    let request = QueryRequest::new(vec![json!("main"), json!("power")])
        .with_session(Session::new(["operator"]));
    assert_eq!(
        spine.send_query(queries::GET_DASHBOARD_COMPONENTS, &request).len(),
        1
    );
}

#[test]
fn test_set_parameter_announces_change() {
    let spine = Arc::new(LocalSpine::default());
    let component = gauge(&spine, &[]);
    let link = component.link_to_dashboard("main", "power", Map::new()).unwrap();
    let mut events_rx = spine.subscribe();

    // any name is accepted on a link
    link.set_parameter("bar_color", json!("green"));

    let event = events_rx.try_recv().unwrap();
    assert_eq!(event.name, events::DASHBOARD_LINK_CHANGED);
    assert_eq!(event.args[0], json!(link.link_id()));
    assert_eq!(event.args[1]["bar_color"], json!("green"));
    assert_eq!(event.args[1]["min_value"], json!(0));

    assert_eq!(link.parameter("bar_color"), Some(json!("green")));
}

#[test]
fn test_link_ids_differ() {
    let spine = Arc::new(LocalSpine::default());
    let component = gauge(&spine, &[]);

    let a = component.link_to_dashboard("main", "power", Map::new()).unwrap();
    let b = component.link_to_dashboard("main", "power", Map::new()).unwrap();
    assert_ne!(a.link_id(), b.link_id());
    assert_eq!(component.dashboard_links().len(), 2);
}
