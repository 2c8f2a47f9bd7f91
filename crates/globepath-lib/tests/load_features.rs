mod common;

use std::fs;

use globepath_lib::{load_feature_collection, Error, FeatureIssue};
use tempfile::tempdir;

use common::europe_path;

#[test]
fn fixture_loads_with_one_issue() {
    let features = load_feature_collection(&europe_path()).expect("fixture loads");

    assert_eq!(features.points.len(), 7);
    assert_eq!(features.segments.len(), 9);
    assert_eq!(
        features.issues,
        vec![FeatureIssue::MissingGeometry {
            label: "nowhere".to_string()
        }]
    );
    assert_eq!(features.record_count(), 16);
}

#[test]
fn missing_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.geojson");

    let err = load_feature_collection(&path).unwrap_err();
    assert!(matches!(err, Error::InputNotFound { .. }));
}

#[test]
fn malformed_features_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mixed.geojson");
    fs::write(
        &path,
        r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "Oslo"},
                 "geometry": {"type": "Point", "coordinates": [10.75, 59.91]}},
                {"type": "Feature", "properties": {"id": "anon"},
                 "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}},
                {"type": "Feature", "properties": {"name": "Bad"},
                 "geometry": {"type": "Point", "coordinates": ["x", 2.0]}},
                {"type": "Feature", "properties": {"id": "short"},
                 "geometry": {"type": "LineString", "coordinates": [[1.0, 2.0]]}},
                {"type": "Feature", "properties": {"id": "neg", "weight": -3},
                 "geometry": {"type": "LineString", "coordinates": [[1.0, 2.0], [3.0, 4.0]]}},
                {"type": "Feature", "properties": {"name": "Pond"},
                 "geometry": {"type": "Polygon", "coordinates": []}},
                42
            ]
        }"#,
    )
    .unwrap();

    let features = load_feature_collection(&path).unwrap();

    assert_eq!(features.points.len(), 1);
    assert_eq!(features.points[0].name, "Oslo");
    // The negative weight drops only the weight, not the line.
    assert_eq!(features.segments.len(), 1);
    assert_eq!(features.segments[0].weight, None);

    assert!(features
        .issues
        .contains(&FeatureIssue::MissingName { label: "anon".to_string() }));
    assert!(features
        .issues
        .iter()
        .any(|issue| matches!(issue, FeatureIssue::InvalidPoint { .. })));
    assert!(features
        .issues
        .contains(&FeatureIssue::InvalidLine { label: "short".to_string() }));
    assert!(features
        .issues
        .iter()
        .any(|issue| matches!(issue, FeatureIssue::InvalidWeight { label, .. } if label == "neg")));
    assert!(features
        .issues
        .iter()
        .any(|issue| matches!(issue, FeatureIssue::Malformed { index: 6, .. })));
}

#[test]
fn non_collection_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("feature.geojson");
    fs::write(&path, r#"{"type": "Feature", "features": []}"#).unwrap();

    let err = load_feature_collection(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidFeatureCollection { .. }));

    fs::write(&path, "not json").unwrap();
    let err = load_feature_collection(&path).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}
