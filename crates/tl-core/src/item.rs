//! Work items and their normalized form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{
    GroupId, Instant, ItemId, Progress, ResourceId, ValidationError, instant_serde, optional_id,
};

/// Visual kind of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemKind {
    #[default]
    Task,
    Milestone,
    Group,
}

impl ItemKind {
    /// Canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Milestone => "milestone",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "milestone" => Ok(Self::Milestone),
            "group" => Ok(Self::Group),
            _ => Err(ValidationError::UnknownName {
                kind: "item kind",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for ItemKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A time-ranged entity supplied by the chart owner.
///
/// Immutable per revision: the core never mutates items, it only emits
/// [`Patch`](crate::Patch)es for the owner to apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: ItemId,

    #[serde(default)]
    pub title: String,

    #[serde(with = "instant_serde")]
    pub start: Instant,

    #[serde(with = "instant_serde")]
    pub end: Instant,

    #[serde(default, rename = "type")]
    pub kind: ItemKind,

    /// Parent edge into the same collection. Must not form a cycle.
    #[serde(
        default,
        alias = "parentId",
        deserialize_with = "optional_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<ItemId>,

    /// Only meaningful when the item has children.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub collapsed: bool,

    #[serde(
        default,
        alias = "resourceId",
        deserialize_with = "optional_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_id: Option<ResourceId>,

    #[serde(
        default,
        alias = "groupId",
        deserialize_with = "optional_id::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_id: Option<GroupId>,

    #[serde(
        default,
        alias = "relatedIds",
        alias = "relatedTaskIds",
        deserialize_with = "optional_id::deserialize_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub related_ids: Vec<ItemId>,

    #[serde(default)]
    pub progress: Progress,

    /// Due date drawn as a marker in the item's row.
    #[serde(
        default,
        with = "instant_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<Instant>,

    /// Per-row height override in pixels.
    #[serde(default, alias = "rowHeight", skip_serializing_if = "Option::is_none")]
    pub row_height: Option<f64>,

    /// Arbitrary owner metadata, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl WorkItem {
    /// Creates a plain task spanning `start..end`.
    pub fn task(id: ItemId, title: impl Into<String>, start: Instant, end: Instant) -> Self {
        Self {
            id,
            title: title.into(),
            start,
            end,
            kind: ItemKind::Task,
            parent_id: None,
            collapsed: false,
            resource_id: None,
            group_id: None,
            related_ids: Vec::new(),
            progress: Progress::NONE,
            deadline: None,
            row_height: None,
            meta: None,
        }
    }

    /// Creates a zero-duration milestone at `at`.
    pub fn milestone(id: ItemId, title: impl Into<String>, at: Instant) -> Self {
        Self {
            kind: ItemKind::Milestone,
            ..Self::task(id, title, at, at)
        }
    }

    /// Creates a group spanning `start..end`.
    pub fn group(id: ItemId, title: impl Into<String>, start: Instant, end: Instant) -> Self {
        Self {
            kind: ItemKind::Group,
            ..Self::task(id, title, start, end)
        }
    }

    /// Sets the parent edge.
    #[must_use]
    pub fn with_parent(mut self, parent: ItemId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Assigns the item to a resource.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceId) -> Self {
        self.resource_id = Some(resource);
        self
    }

    /// True for explicit milestones and for any zero-length item.
    pub fn is_milestone(&self) -> bool {
        self.kind == ItemKind::Milestone || self.start == self.end
    }

    /// Duration in milliseconds, clamped to zero for inverted ranges.
    pub fn duration_ms(&self) -> i64 {
        self.end.saturating_sub(self.start).max(0)
    }
}

/// A work item annotated with its position in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    #[serde(flatten)]
    pub item: WorkItem,

    /// Distance from a root.
    pub depth: usize,

    pub has_children: bool,

    /// False when any strict ancestor is a collapsed group.
    pub visible: bool,

    /// Dense depth-first index among visible items; `None` when hidden.
    pub visible_index: Option<usize>,
}

impl NormalizedItem {
    pub const fn id(&self) -> &ItemId {
        &self.item.id
    }
}

impl AsRef<WorkItem> for WorkItem {
    fn as_ref(&self) -> &WorkItem {
        self
    }
}

impl AsRef<WorkItem> for NormalizedItem {
    fn as_ref(&self) -> &WorkItem {
        &self.item
    }
}

/// Anything with a time span.
///
/// Lets lane packing and capacity work over raw items, normalized items or
/// test fixtures alike.
pub trait TimeSpan {
    /// Start instant.
    fn start(&self) -> Instant;

    /// End instant.
    fn end(&self) -> Instant;
}

impl TimeSpan for WorkItem {
    fn start(&self) -> Instant {
        self.start
    }

    fn end(&self) -> Instant {
        self.end
    }
}

impl TimeSpan for NormalizedItem {
    fn start(&self) -> Instant {
        self.item.start
    }

    fn end(&self) -> Instant {
        self.item.end
    }
}

impl TimeSpan for (Instant, Instant) {
    fn start(&self) -> Instant {
        self.0
    }

    fn end(&self) -> Instant {
        self.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    #[test]
    fn item_kind_from_str() {
        assert_eq!("group".parse::<ItemKind>().unwrap(), ItemKind::Group);
        assert_eq!("milestone".parse::<ItemKind>().unwrap(), ItemKind::Milestone);
        assert!("epic".parse::<ItemKind>().is_err());
    }

    #[test]
    fn work_item_defaults_when_deserializing() {
        let item: WorkItem =
            serde_json::from_str(r#"{"id": "a", "start": 0, "end": "1970-01-02"}"#).unwrap();
        assert_eq!(item.kind, ItemKind::Task);
        assert_eq!(item.end, crate::MS_PER_DAY);
        assert!(item.parent_id.is_none());
        assert!(!item.collapsed);
        assert_eq!(item.progress, Progress::NONE);
    }

    #[test]
    fn work_item_reads_type_field() {
        let item: WorkItem = serde_json::from_str(
            r#"{"id": "p", "start": 0, "end": 10, "type": "group", "collapsed": true}"#,
        )
        .unwrap();
        assert_eq!(item.kind, ItemKind::Group);
        assert!(item.collapsed);
    }

    #[test]
    fn work_item_accepts_camel_case_links() {
        let item: WorkItem = serde_json::from_str(
            r#"{"id": "c", "start": 0, "end": 1, "parentId": "p", "relatedTaskIds": ["x"]}"#,
        )
        .unwrap();
        assert_eq!(item.parent_id, Some(id("p")));
        assert_eq!(item.related_ids, vec![id("x")]);
    }

    #[test]
    fn blank_links_are_treated_as_missing() {
        let item: WorkItem = serde_json::from_str(
            r#"{"id": "c", "start": 0, "end": 1, "parentId": "", "resourceId": "  ", "groupId": "", "relatedIds": ["", "x"]}"#,
        )
        .unwrap();
        assert!(item.parent_id.is_none());
        assert!(item.resource_id.is_none());
        assert!(item.group_id.is_none());
        assert_eq!(item.related_ids, vec![id("x")]);
    }

    #[test]
    fn deadline_is_optional() {
        let item: WorkItem = serde_json::from_str(
            r#"{"id": "d", "start": 0, "end": 1, "deadline": "1970-01-03"}"#,
        )
        .unwrap();
        assert_eq!(item.deadline, Some(2 * crate::MS_PER_DAY));
        let json = serde_json::to_value(WorkItem::task(id("t"), "T", 0, 1)).unwrap();
        assert!(json.get("deadline").is_none());
    }

    #[test]
    fn zero_length_task_counts_as_milestone() {
        let t = WorkItem::task(id("t"), "T", 5, 5);
        assert!(t.is_milestone());
        let m = WorkItem::milestone(id("m"), "M", 5);
        assert!(m.is_milestone());
        assert!(!WorkItem::task(id("x"), "X", 0, 1).is_milestone());
    }

    #[test]
    fn inverted_range_has_zero_duration() {
        assert_eq!(WorkItem::task(id("t"), "T", 10, 2).duration_ms(), 0);
        assert_eq!(WorkItem::task(id("t"), "T", i64::MIN, i64::MAX).duration_ms(), i64::MAX);
    }

    #[test]
    fn normalized_item_flattens_on_serialize() {
        let n = NormalizedItem {
            item: WorkItem::task(id("a"), "A", 0, 1),
            depth: 0,
            has_children: false,
            visible: true,
            visible_index: Some(0),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["visible_index"], 0);
        assert_eq!(json["type"], "task");
    }
}
