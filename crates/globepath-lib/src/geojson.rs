//! GeoJSON feature parsing.
//!
//! The loader reads a `FeatureCollection` and turns each feature into a plain
//! record: `Point` features become [`PointRecord`]s and `LineString` features
//! become [`SegmentRecord`]s spanning their first and last vertex. Features are
//! decoded one at a time so a malformed entry only drops that entry; every
//! skipped feature is logged and recorded as a [`FeatureIssue`].

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Two-dimensional source coordinate in GeoJSON order (`[lon, lat]` or `[x, y]`).
pub type Coordinate = [f64; 2];

/// A named city parsed from a `Point` feature.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub name: String,
    pub coordinate: Coordinate,
}

/// A connection parsed from a `LineString` feature.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    /// Value of the feature's `id` property, used as the visual line identity.
    pub id: Option<String>,
    pub start: Coordinate,
    pub end: Coordinate,
    /// Source-supplied weight. `None` when absent or unusable.
    pub weight: Option<f64>,
}

/// Recoverable problem found while reading a single feature.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureIssue {
    #[error("feature {index} could not be decoded: {message}")]
    Malformed { index: usize, message: String },

    #[error("feature {label} has no geometry")]
    MissingGeometry { label: String },

    #[error("invalid coordinates for point {label}")]
    InvalidPoint { label: String },

    #[error("point {label} has no name")]
    MissingName { label: String },

    #[error("invalid coordinates for line {label}")]
    InvalidLine { label: String },

    #[error("invalid weight {value} for line {label}")]
    InvalidWeight { label: String, value: String },
}

/// Records extracted from a feature collection, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub points: Vec<PointRecord>,
    pub segments: Vec<SegmentRecord>,
    pub issues: Vec<FeatureIssue>,
}

impl FeatureSet {
    /// Number of features that produced a record.
    pub fn record_count(&self) -> usize {
        self.points.len() + self.segments.len()
    }
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: Option<String>,
    features: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: Option<String>,
    coordinates: Option<Value>,
}

/// Read and parse a GeoJSON feature collection from disk.
pub fn load_feature_collection(path: &Path) -> Result<FeatureSet> {
    if !path.exists() {
        return Err(Error::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "loading feature collection");
    parse_feature_collection(&text)
}

/// Parse a GeoJSON feature collection from a string.
///
/// Only a document that is not JSON, or that has no `features` array, is an
/// error. Individual features with missing or malformed geometry are skipped.
pub fn parse_feature_collection(text: &str) -> Result<FeatureSet> {
    let raw: RawCollection = serde_json::from_str(text)?;
    if let Some(kind) = raw.kind.as_deref() {
        if !kind.eq_ignore_ascii_case("FeatureCollection") {
            return Err(Error::InvalidFeatureCollection {
                message: format!("expected type FeatureCollection, found {kind}"),
            });
        }
    }
    let features = raw.features.ok_or_else(|| Error::InvalidFeatureCollection {
        message: "missing features array".to_string(),
    })?;

    let mut set = FeatureSet::default();
    for (index, value) in features.into_iter().enumerate() {
        if let Err(issue) = read_feature(index, value, &mut set) {
            warn!(%issue, "skipping feature");
            set.issues.push(issue);
        }
    }

    debug!(
        points = set.points.len(),
        segments = set.segments.len(),
        skipped = set.issues.len(),
        "parsed feature collection"
    );
    Ok(set)
}

fn read_feature(
    index: usize,
    value: Value,
    set: &mut FeatureSet,
) -> std::result::Result<(), FeatureIssue> {
    let feature: RawFeature =
        serde_json::from_value(value).map_err(|err| FeatureIssue::Malformed {
            index,
            message: err.to_string(),
        })?;
    let properties = feature.properties.unwrap_or_default();
    let label = property_string(&properties, "id").unwrap_or_else(|| format!("#{index}"));

    let Some(geometry) = feature.geometry else {
        return Err(FeatureIssue::MissingGeometry { label });
    };
    let Some(kind) = geometry.kind.filter(|kind| !kind.is_empty()) else {
        return Err(FeatureIssue::MissingGeometry { label });
    };

    if kind.eq_ignore_ascii_case("Point") {
        let coordinate = geometry
            .coordinates
            .as_ref()
            .and_then(read_coordinate)
            .ok_or_else(|| FeatureIssue::InvalidPoint {
                label: label.clone(),
            })?;
        let name = property_string(&properties, "name")
            .filter(|name| !name.is_empty())
            .ok_or(FeatureIssue::MissingName { label })?;
        set.points.push(PointRecord { name, coordinate });
    } else if kind.eq_ignore_ascii_case("LineString") {
        let vertices: Vec<Coordinate> = match geometry.coordinates {
            Some(Value::Array(items)) => items.iter().filter_map(read_coordinate).collect(),
            _ => Vec::new(),
        };
        let (start, end) = match vertices.as_slice() {
            [first, .., last] => (*first, *last),
            _ => return Err(FeatureIssue::InvalidLine { label }),
        };

        let weight = match read_weight(&properties) {
            Ok(weight) => weight,
            Err(value) => {
                // The line is still usable; the graph falls back to arc distance.
                let issue = FeatureIssue::InvalidWeight {
                    label: label.clone(),
                    value,
                };
                warn!(%issue, "ignoring line weight");
                set.issues.push(issue);
                None
            }
        };

        set.segments.push(SegmentRecord {
            id: property_string(&properties, "id"),
            start,
            end,
            weight,
        });
    } else {
        debug!(%label, geometry = %kind, "ignoring unsupported geometry type");
    }

    Ok(())
}

fn read_coordinate(value: &Value) -> Option<Coordinate> {
    let items = value.as_array()?;
    if items.len() < 2 {
        return None;
    }
    let x = items[0].as_f64()?;
    let y = items[1].as_f64()?;
    (x.is_finite() && y.is_finite()).then_some([x, y])
}

/// `Ok(None)` when no weight is present, `Err(raw)` when one is present but unusable.
fn read_weight(properties: &Map<String, Value>) -> std::result::Result<Option<f64>, String> {
    let parsed = match properties.get("weight") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(weight) if weight.is_finite() && weight >= 0.0 => Ok(Some(weight)),
        _ => Err(properties
            .get("weight")
            .map(Value::to_string)
            .unwrap_or_default()),
    }
}

fn property_string(properties: &Map<String, Value>, key: &str) -> Option<String> {
    match properties.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points_and_lines() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "Paris"},
                 "geometry": {"type": "Point", "coordinates": [2.35, 48.85]}},
                {"type": "Feature", "properties": {"name": "Berlin"},
                 "geometry": {"type": "Point", "coordinates": [13.4, 52.52]}},
                {"type": "Feature", "properties": {"id": "p-b", "weight": "8.8"},
                 "geometry": {"type": "LineString", "coordinates": [[2.35, 48.85], [13.4, 52.52]]}}
            ]
        }"#;

        let set = parse_feature_collection(text).expect("valid collection");
        assert_eq!(set.points.len(), 2);
        assert_eq!(set.points[0].name, "Paris");
        assert_eq!(set.points[1].coordinate, [13.4, 52.52]);
        assert_eq!(set.segments.len(), 1);
        assert_eq!(set.segments[0].id.as_deref(), Some("p-b"));
        assert_eq!(set.segments[0].weight, Some(8.8));
        assert!(set.issues.is_empty());
    }

    #[test]
    fn malformed_features_are_skipped() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"id": "a"}},
                {"type": "Feature", "properties": {"name": "Short"},
                 "geometry": {"type": "Point", "coordinates": [1.0]}},
                {"type": "Feature", "properties": {"id": "anon"},
                 "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}},
                {"type": "Feature", "properties": {"id": "l"},
                 "geometry": {"type": "LineString", "coordinates": [[1.0, 2.0]]}},
                {"type": "Feature", "properties": {"name": "Ok"},
                 "geometry": {"type": "Point", "coordinates": [3.0, 4.0]}},
                "not a feature"
            ]
        }"#;

        let set = parse_feature_collection(text).expect("collection still parses");
        assert_eq!(set.points.len(), 1);
        assert_eq!(set.points[0].name, "Ok");
        assert!(set.segments.is_empty());
        assert_eq!(set.issues.len(), 5);
        assert!(matches!(set.issues[0], FeatureIssue::MissingGeometry { .. }));
        assert!(matches!(set.issues[1], FeatureIssue::InvalidPoint { .. }));
        assert!(matches!(set.issues[2], FeatureIssue::MissingName { .. }));
        assert!(matches!(set.issues[3], FeatureIssue::InvalidLine { .. }));
        assert!(matches!(set.issues[4], FeatureIssue::Malformed { index: 5, .. }));
    }

    #[test]
    fn unusable_weight_keeps_the_line() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"id": "x", "weight": "far"},
                 "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1], [2, 2]]}}
            ]
        }"#;

        let set = parse_feature_collection(text).expect("valid collection");
        assert_eq!(set.segments.len(), 1);
        assert_eq!(set.segments[0].start, [0.0, 0.0]);
        assert_eq!(set.segments[0].end, [2.0, 2.0]);
        assert_eq!(set.segments[0].weight, None);
        assert!(matches!(set.issues[0], FeatureIssue::InvalidWeight { .. }));
    }

    #[test]
    fn rejects_documents_without_features() {
        let error = parse_feature_collection(r#"{"type": "FeatureCollection"}"#)
            .expect_err("features are required");
        assert!(matches!(error, Error::InvalidFeatureCollection { .. }));

        let error = parse_feature_collection(r#"{"type": "Feature", "features": []}"#)
            .expect_err("wrong document type");
        assert!(matches!(error, Error::InvalidFeatureCollection { .. }));

        let error = parse_feature_collection("not json").expect_err("invalid json");
        assert!(matches!(error, Error::Json(_)));
    }
}
