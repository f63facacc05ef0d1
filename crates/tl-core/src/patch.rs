//! Change patches emitted to the chart owner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::item::WorkItem;
use crate::selection::SelectionState;
use crate::types::{Instant, ItemId, Progress, ValidationError};

/// What produced a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    DragMove,
    DragResizeStart,
    DragResizeEnd,
    Progress,
    Collapse,
}

impl ChangeKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DragMove => "drag-move",
            Self::DragResizeStart => "drag-resize-start",
            Self::DragResizeEnd => "drag-resize-end",
            Self::Progress => "progress",
            Self::Collapse => "collapse",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drag-move" => Ok(Self::DragMove),
            "drag-resize-start" => Ok(Self::DragResizeStart),
            "drag-resize-end" => Ok(Self::DragResizeEnd),
            "progress" => Ok(Self::Progress),
            "collapse" => Ok(Self::Collapse),
            _ => Err(ValidationError::UnknownName {
                kind: "change kind",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for ChangeKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChangeKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A subset of editable item fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Instant>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Instant>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

impl FieldChanges {
    pub const fn is_empty(&self) -> bool {
        self.start.is_none()
            && self.end.is_none()
            && self.progress.is_none()
            && self.collapsed.is_none()
    }
}

/// Minimal set of changed fields for one item, with their previous values.
///
/// `changes` and `previous_values` always name the same fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub id: ItemId,
    pub changes: FieldChanges,
    pub previous_values: FieldChanges,
    pub kind: ChangeKind,
}

impl Patch {
    /// Writes the changed fields into `item`.
    ///
    /// Returns false, leaving the item untouched, when the IDs differ.
    pub fn apply_to(&self, item: &mut WorkItem) -> bool {
        if item.id != self.id {
            return false;
        }
        write_fields(&self.changes, item);
        true
    }

    /// Applies the patch to the matching item in `items`, if any.
    pub fn apply(&self, items: &mut [WorkItem]) -> bool {
        items
            .iter_mut()
            .find(|i| i.id == self.id)
            .is_some_and(|item| self.apply_to(item))
    }

    /// The patch that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            id: self.id.clone(),
            changes: self.previous_values,
            previous_values: self.changes,
            kind: self.kind,
        }
    }
}

fn write_fields(fields: &FieldChanges, item: &mut WorkItem) {
    if let Some(start) = fields.start {
        item.start = start;
    }
    if let Some(end) = fields.end {
        item.end = end;
    }
    if let Some(progress) = fields.progress {
        item.progress = progress;
    }
    if let Some(collapsed) = fields.collapsed {
        item.collapsed = collapsed;
    }
}

/// Callbacks the chart owner receives.
pub trait ChartObserver {
    /// A committed edit the owner should apply to its item list.
    fn on_change(&mut self, patch: &Patch);

    /// The selection the owner should store.
    fn on_selection_change(&mut self, selection: &SelectionState);
}

/// An observer that records everything it is told.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    pub patches: Vec<Patch>,
    pub selections: Vec<SelectionState>,
}

impl ChartObserver for ChangeLog {
    fn on_change(&mut self, patch: &Patch) {
        self.patches.push(patch.clone());
    }

    fn on_selection_change(&mut self, selection: &SelectionState) {
        self.selections.push(selection.clone());
    }
}
