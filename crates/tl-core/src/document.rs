//! Chart documents as read from disk.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capacity::NonWorkingPeriod;
use crate::item::WorkItem;
use crate::marker::{Marker, TaskMarker};
use crate::resource::Resource;

/// Items plus the optional resource view and marker data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartDocument {
    pub items: Vec<WorkItem>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub non_working: Vec<NonWorkingPeriod>,

    /// Chart-wide marker lines.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<Marker>,

    /// Marker lines confined to one item's row.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub task_markers: Vec<TaskMarker>,
}

impl ChartDocument {
    /// Parses a document given as a bare item array or a full object.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// The object form of a document.
#[derive(Deserialize)]
struct FullDocument {
    #[serde(alias = "tasks")]
    items: Vec<WorkItem>,
    #[serde(default)]
    resources: Vec<Resource>,
    #[serde(default, alias = "nonWorking", alias = "nonWorkingPeriods")]
    non_working: Vec<NonWorkingPeriod>,
    #[serde(default)]
    markers: Vec<Marker>,
    #[serde(default, alias = "taskMarkers")]
    task_markers: Vec<TaskMarker>,
}

impl From<FullDocument> for ChartDocument {
    fn from(full: FullDocument) -> Self {
        Self {
            items: full.items,
            resources: full.resources,
            non_working: full.non_working,
            markers: full.markers,
            task_markers: full.task_markers,
        }
    }
}

// Dispatch on the JSON shape first so errors inside items surface as-is.
impl<'de> Deserialize<'de> for ChartDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            items @ Value::Array(_) => {
                let items: Vec<WorkItem> = serde_json::from_value(items).map_err(de::Error::custom)?;
                Ok(Self {
                    items,
                    ..Self::default()
                })
            }
            full @ Value::Object(_) => serde_json::from_value::<FullDocument>(full)
                .map(Self::from)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "expected an item array or a document object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_bare_array() {
        let doc = ChartDocument::from_json(r#"[{"id": "a", "start": 0, "end": 1}]"#).unwrap();
        assert_eq!(doc.items.len(), 1);
        assert!(doc.resources.is_empty());
    }

    #[test]
    fn reads_full_object() {
        let doc = ChartDocument::from_json(
            r#"{
                "tasks": [{"id": "a", "start": "2024-01-01", "end": "2024-01-03", "resourceId": "r"}],
                "resources": [{"id": "r", "name": "R"}],
                "nonWorking": [{"start": "2024-01-02", "end": "2024-01-03"}]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.items[0].resource_id.as_ref().map(|r| r.as_str()), Some("r"));
        assert_eq!(doc.resources[0].name, "R");
        assert_eq!(doc.non_working.len(), 1);
    }

    #[test]
    fn rejects_items_with_bad_instants() {
        assert!(ChartDocument::from_json(r#"[{"id": "a", "start": "soon", "end": 1}]"#).is_err());
    }

    #[test]
    fn blank_parent_places_item_at_root() {
        let doc = ChartDocument::from_json(
            r#"[
                {"id": "a", "type": "group", "start": 0, "end": 2},
                {"id": "b", "parentId": "", "start": 0, "end": 1}
            ]"#,
        )
        .unwrap();
        assert!(doc.items[1].parent_id.is_none());

        let normalized = crate::normalize(&doc.items, crate::NormalizeOptions::default());
        let b = crate::hierarchy::find_item(&normalized, "b").unwrap();
        assert_eq!(b.depth, 0);
        assert!(b.visible);
    }

    #[test]
    fn item_errors_are_reported_verbatim() {
        let err = ChartDocument::from_json(r#"[{"id": "", "start": 0, "end": 1}]"#).unwrap_err();
        assert!(err.to_string().contains("item ID cannot be empty"), "{err}");

        let err = ChartDocument::from_json(r#"{"items": [{"id": "a", "start": "soon", "end": 1}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid instant: soon"), "{err}");
        assert!(!err.to_string().contains("untagged"));

        let err = ChartDocument::from_json(r#"{"resources": []}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `items`"), "{err}");

        let err = ChartDocument::from_json("42").unwrap_err();
        assert!(err.to_string().contains("found a number"), "{err}");
    }

    #[test]
    fn reads_markers() {
        let doc = ChartDocument::from_json(
            r#"{
                "items": [{"id": "a", "start": 0, "end": "2024-01-03", "deadline": "2024-01-02"}],
                "markers": [{"id": "today", "timestamp": "2024-01-02", "label": "Today"}],
                "taskMarkers": [{"taskId": "a", "id": "check", "timestamp": "2024-01-01", "style": "dotted"}]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.markers[0].label.as_deref(), Some("Today"));
        assert_eq!(doc.task_markers[0].item_id.as_str(), "a");
        assert_eq!(doc.task_markers[0].marker.style, crate::MarkerStyle::Dotted);
        assert!(doc.items[0].deadline.is_some());

        let json = serde_json::to_value(&doc).unwrap();
        let back: ChartDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn serializes_sparse_object() {
        let doc = ChartDocument::from_json(r#"[{"id": "a", "start": 0, "end": 1}]"#).unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("resources").is_none());
        let back: ChartDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}
