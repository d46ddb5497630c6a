//! Nested deployment resolution tests

use arm_models::TargetResource;
use deploytrack::errors::TrackerError;
use deploytrack::track::resolver::resolve_operations;
use tokio_test::assert_ok;

use crate::support::{ids, nested, network_error, op, FakeSource};

#[tokio::test]
async fn test_flat_list_is_unchanged() {
    let source = FakeSource::new().operations("root", Ok(vec![op("A", 1, "Succeeded"), op("B", 2, "Running")]));

    let resolved = assert_ok!(resolve_operations(&source, "rg", "root", 16).await);
    assert_eq!(ids(&resolved), vec!["A", "B"]);
    assert_eq!(source.calls(), vec!["list:root"]);
}

#[tokio::test]
async fn test_nested_operations_follow_their_marker() {
    let source = FakeSource::new()
        .operations("root", Ok(vec![op("A", 1, "Succeeded"), nested("B", 2, "inner"), op("E", 5, "Running")]))
        .operations("inner", Ok(vec![op("C", 3, "Succeeded"), op("D", 4, "Running")]));

    let resolved = assert_ok!(resolve_operations(&source, "rg", "root", 16).await);
    assert_eq!(ids(&resolved), vec!["A", "B", "C", "D", "E"]);
    assert_eq!(source.calls(), vec!["list:root", "list:inner"]);
}

#[tokio::test]
async fn test_multiple_levels_are_expanded_depth_first() {
    let source = FakeSource::new()
        .operations("root", Ok(vec![nested("A", 1, "mid"), op("F", 6, "Running")]))
        .operations("mid", Ok(vec![op("B", 2, "Succeeded"), nested("C", 3, "leaf"), op("E", 5, "Running")]))
        .operations("leaf", Ok(vec![op("D", 4, "Running")]));

    let resolved = assert_ok!(resolve_operations(&source, "rg", "root", 16).await);
    assert_eq!(ids(&resolved), vec!["A", "B", "C", "D", "E", "F"]);
}

#[tokio::test]
async fn test_marker_as_last_operation() {
    let source = FakeSource::new()
        .operations("root", Ok(vec![op("A", 1, "Succeeded"), nested("B", 2, "inner")]))
        .operations("inner", Ok(vec![op("C", 3, "Running")]));

    let resolved = assert_ok!(resolve_operations(&source, "rg", "root", 16).await);
    assert_eq!(ids(&resolved), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_empty_nested_deployment() {
    let source = FakeSource::new()
        .operations("root", Ok(vec![nested("A", 1, "inner"), op("B", 2, "Running")]))
        .operations("inner", Ok(vec![]));

    let resolved = assert_ok!(resolve_operations(&source, "rg", "root", 16).await);
    assert_eq!(ids(&resolved), vec!["A", "B"]);
}

#[tokio::test]
async fn test_same_nested_deployment_in_separate_branches() {
    let source = FakeSource::new()
        .operations("root", Ok(vec![nested("A", 1, "left"), nested("B", 2, "right")]))
        .operations("left", Ok(vec![nested("C", 3, "shared")]))
        .operations("right", Ok(vec![nested("D", 4, "shared")]))
        .operations("shared", Ok(vec![op("S", 5, "Running")]));

    let resolved = assert_ok!(resolve_operations(&source, "rg", "root", 16).await);
    assert_eq!(ids(&resolved), vec!["A", "C", "S", "B", "D", "S"]);
}

#[tokio::test]
async fn test_nested_fetch_error_aborts_resolution() {
    let source = FakeSource::new()
        .operations("root", Ok(vec![op("A", 1, "Succeeded"), nested("B", 2, "inner"), op("E", 5, "Running")]))
        .operations("inner", Err(network_error()));

    let result = resolve_operations(&source, "rg", "root", 16).await;
    assert!(matches!(result, Err(TrackerError::ApiError { status: 503, .. })));
}

#[tokio::test]
async fn test_root_fetch_error() {
    let source = FakeSource::new().operations("root", Err(network_error()));

    let result = resolve_operations(&source, "rg", "root", 16).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_self_referencing_deployment_is_a_cycle() {
    let source = FakeSource::new()
        .operations("root", Ok(vec![nested("A", 1, "inner")]))
        .operations("inner", Ok(vec![nested("B", 2, "root")]));

    let result = resolve_operations(&source, "rg", "root", 16).await;
    assert!(matches!(result, Err(TrackerError::NestedCycle(name)) if name == "root"));
    assert_eq!(source.calls(), vec!["list:root", "list:inner"]);
}

#[tokio::test]
async fn test_nesting_depth_limit() {
    let source = FakeSource::new()
        .operations("root", Ok(vec![nested("A", 1, "level1")]))
        .operations("level1", Ok(vec![nested("B", 2, "level2")]))
        .operations("level2", Ok(vec![op("C", 3, "Running")]));

    let result = resolve_operations(&source, "rg", "root", 1).await;
    assert!(matches!(
        result,
        Err(TrackerError::NestingTooDeep { ref deployment, max_depth: 1 }) if deployment == "level2"
    ));

    let resolved = assert_ok!(resolve_operations(&source, "rg", "root", 2).await);
    assert_eq!(ids(&resolved), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_marker_without_name_is_invalid() {
    let mut marker = nested("A", 1, "inner");
    marker.properties.target_resource = Some(TargetResource {
        id: None,
        resource_type: Some("Microsoft.Resources/deployments".to_string()),
        resource_name: None,
    });
    let source = FakeSource::new().operations("root", Ok(vec![marker]));

    let result = resolve_operations(&source, "rg", "root", 16).await;
    assert!(matches!(result, Err(TrackerError::InvalidResponse(_))));
}
