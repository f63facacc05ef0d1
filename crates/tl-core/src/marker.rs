//! Vertical marker lines.
//!
//! A [`Marker`] spans the whole chart body (a release date, "today"). A
//! [`TaskMarker`] is the same line confined to one item's row. Items with a
//! `deadline` get a task marker derived by [`Marker::deadline`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::item::WorkItem;
use crate::temporal::Geometry;
use crate::types::{Instant, ItemId, MarkerId, ValidationError, instant_serde};

/// Line width in pixels when a marker does not set one.
pub const DEFAULT_MARKER_WIDTH: f64 = 2.0;

/// Stroke style of a marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarkerStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl MarkerStyle {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
        }
    }
}

impl fmt::Display for MarkerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MarkerStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Self::Solid),
            "dashed" => Ok(Self::Dashed),
            "dotted" => Ok(Self::Dotted),
            _ => Err(ValidationError::UnknownName {
                kind: "marker style",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for MarkerStyle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MarkerStyle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Which end of the line carries the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    #[default]
    Top,
    Bottom,
}

const fn default_width() -> f64 {
    DEFAULT_MARKER_WIDTH
}

const fn default_true() -> bool {
    true
}

/// A vertical line at a fixed instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: MarkerId,

    #[serde(alias = "at", with = "instant_serde")]
    pub timestamp: Instant,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Passed through to the renderer untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default)]
    pub style: MarkerStyle,

    #[serde(default = "default_width")]
    pub width: f64,

    #[serde(default = "default_true", alias = "showLabel")]
    pub show_label: bool,

    #[serde(default, alias = "labelPosition")]
    pub label_position: LabelPosition,
}

impl Marker {
    /// A solid, labelled marker with default width.
    pub fn new(id: MarkerId, timestamp: Instant, label: impl Into<String>) -> Self {
        Self {
            id,
            timestamp,
            label: Some(label.into()),
            color: None,
            style: MarkerStyle::Solid,
            width: DEFAULT_MARKER_WIDTH,
            show_label: true,
            label_position: LabelPosition::Top,
        }
    }

    /// The dashed deadline marker for `item`, if it has a deadline.
    ///
    /// Labelled "Overdue" when the item ends after its deadline. The label is
    /// kept for tooltips but not drawn.
    pub fn deadline(item: &WorkItem) -> Option<TaskMarker> {
        let at = item.deadline?;
        let id = MarkerId::new(format!("deadline-{}", item.id)).ok()?;
        let label = if item.end > at { "Overdue" } else { "Deadline" };
        Some(TaskMarker {
            item_id: item.id.clone(),
            marker: Self {
                style: MarkerStyle::Dashed,
                show_label: false,
                ..Self::new(id, at, label)
            },
        })
    }

    /// Whether the label should be drawn.
    pub fn visible_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|_| self.show_label)
    }
}

/// A marker drawn only inside one item's row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMarker {
    #[serde(alias = "taskId", alias = "itemId", alias = "task_id")]
    pub item_id: ItemId,

    #[serde(flatten)]
    pub marker: Marker,
}

/// A marker placed on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLine {
    pub id: MarkerId,
    /// The row owner for task markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    #[serde(flatten)]
    pub geometry: Geometry,
    pub style: MarkerStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Present only when the label is drawn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub label_position: LabelPosition,
}

impl MarkerLine {
    pub fn new(marker: &Marker, item_id: Option<ItemId>, geometry: Geometry) -> Self {
        Self {
            id: marker.id.clone(),
            item_id,
            geometry,
            style: marker.style,
            color: marker.color.clone(),
            label: marker.visible_label().map(str::to_string),
            label_position: marker.label_position,
        }
    }
}
