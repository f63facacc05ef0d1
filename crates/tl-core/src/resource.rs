//! Resource view rows.
//!
//! Resources become rows, optionally grouped under header rows. Each resource
//! row packs its items into lanes and grows to fit them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::item::WorkItem;
use crate::lanes::{assign_lanes, row_height};
use crate::temporal::DEFAULT_ROW_HEIGHT;
use crate::types::{Instant, ItemId, ResourceId};

/// Something items can be assigned to: a person, a machine, a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Grouping key for grouped layouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Maximum concurrent items. Informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,

    /// Starts the resource's group collapsed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub collapsed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl Resource {
    pub fn new(id: ResourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            code: None,
            group: None,
            capacity: None,
            collapsed: false,
            meta: None,
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Options for [`resource_rows`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRowOptions {
    /// Group resources by [`Resource::group`] under header rows.
    pub group_by_group: bool,

    /// Keep resources with no items.
    pub show_empty: bool,

    /// Groups whose member rows are omitted. A group is also collapsed when
    /// any of its resources has `collapsed` set.
    pub collapsed_groups: Vec<String>,

    /// Height of a single lane.
    pub row_height: f64,
}

impl Default for ResourceRowOptions {
    fn default() -> Self {
        Self {
            group_by_group: false,
            show_empty: true,
            collapsed_groups: Vec::new(),
            row_height: DEFAULT_ROW_HEIGHT,
        }
    }
}

/// A row in the resource view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum ResourceRow {
    /// Header for a group of resources, spanning all of their items.
    Group {
        name: String,
        collapsed: bool,
        start: Option<Instant>,
        end: Option<Instant>,
        height: f64,
    },
    Resource {
        resource: Resource,
        depth: usize,
        /// Assigned items in input order.
        item_ids: Vec<ItemId>,
        /// Lane per item, parallel to `item_ids`.
        stack_levels: Vec<usize>,
        lane_count: usize,
        height: f64,
    },
}

impl ResourceRow {
    pub const fn height(&self) -> f64 {
        match self {
            Self::Group { height, .. } | Self::Resource { height, .. } => *height,
        }
    }

    pub const fn is_group_header(&self) -> bool {
        matches!(self, Self::Group { .. })
    }
}

/// Builds resource view rows.
///
/// Grouped resources come first, groups in order of first appearance, then
/// resources without a group. Items assigned to unknown resources are left
/// out.
pub fn resource_rows<T: AsRef<WorkItem>>(
    resources: &[Resource],
    items: &[T],
    options: &ResourceRowOptions,
) -> Vec<ResourceRow> {
    let mut by_resource: HashMap<&ResourceId, Vec<&WorkItem>> = HashMap::new();
    for item in items.iter().map(AsRef::<WorkItem>::as_ref) {
        if let Some(resource) = &item.resource_id {
            by_resource.entry(resource).or_default().push(item);
        }
    }

    let kept: Vec<&Resource> = resources
        .iter()
        .filter(|r| options.show_empty || by_resource.contains_key(&r.id))
        .collect();

    let member_row = |resource: &Resource, depth: usize| {
        let members = by_resource.get(&resource.id).map_or(&[][..], Vec::as_slice);
        let spans: Vec<(Instant, Instant)> = members.iter().map(|i| (i.start, i.end)).collect();
        let packed = assign_lanes(&spans);
        ResourceRow::Resource {
            resource: resource.clone(),
            depth,
            item_ids: members.iter().map(|i| i.id.clone()).collect(),
            stack_levels: packed.levels,
            lane_count: packed.lane_count,
            height: row_height(options.row_height, packed.lane_count),
        }
    };

    if !options.group_by_group {
        return kept.into_iter().map(|r| member_row(r, 0)).collect();
    }

    let mut groups: Vec<(&str, Vec<&Resource>)> = Vec::new();
    let mut ungrouped = Vec::new();
    for resource in kept {
        match resource.group.as_deref() {
            Some(name) => match groups.iter_mut().find(|(g, _)| *g == name) {
                Some((_, members)) => members.push(resource),
                None => groups.push((name, vec![resource])),
            },
            None => ungrouped.push(resource),
        }
    }

    let mut rows = Vec::new();
    for (name, members) in groups {
        let collapsed = options.collapsed_groups.iter().any(|g| g == name)
            || members.iter().any(|r| r.collapsed);
        let period = members
            .iter()
            .filter_map(|r| by_resource.get(&r.id))
            .flatten()
            .map(|i| (i.start, i.end))
            .reduce(|(s1, e1), (s2, e2)| (s1.min(s2), e1.max(e2)));
        rows.push(ResourceRow::Group {
            name: name.to_string(),
            collapsed,
            start: period.map(|p| p.0),
            end: period.map(|p| p.1),
            height: options.row_height,
        });
        if !collapsed {
            rows.extend(members.into_iter().map(|r| member_row(r, 1)));
        }
    }
    rows.extend(ungrouped.into_iter().map(|r| member_row(r, 0)));
    rows
}

/// Maps each item shown in a resource row to that row's index.
pub fn item_row_map(rows: &[ResourceRow]) -> HashMap<ItemId, usize> {
    let mut map = HashMap::new();
    for (index, row) in rows.iter().enumerate() {
        if let ResourceRow::Resource { item_ids, .. } = row {
            for id in item_ids {
                map.insert(id.clone(), index);
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    fn assigned(name: &str, resource: &str, start: Instant, end: Instant) -> WorkItem {
        WorkItem::task(ItemId::new(name).unwrap(), name, start, end).with_resource(rid(resource))
    }

    fn team() -> Vec<Resource> {
        vec![
            Resource::new(rid("alice"), "Alice").in_group("eng"),
            Resource::new(rid("bob"), "Bob"),
            Resource::new(rid("carol"), "Carol").in_group("eng"),
            Resource::new(rid("dave"), "Dave").in_group("ops"),
        ]
    }

    fn work() -> Vec<WorkItem> {
        vec![
            assigned("a1", "alice", 0, 10),
            assigned("a2", "alice", 5, 15),
            assigned("b1", "bob", 0, 5),
            assigned("c1", "carol", 20, 30),
            assigned("x1", "nobody", 0, 5),
        ]
    }

    fn labels(rows: &[ResourceRow]) -> Vec<String> {
        rows.iter()
            .map(|r| match r {
                ResourceRow::Group { name, .. } => format!("[{name}]"),
                ResourceRow::Resource { resource, .. } => resource.id.to_string(),
            })
            .collect()
    }

    #[test]
    fn flat_rows_keep_resource_order_and_stack_lanes() {
        let rows = resource_rows(&team(), &work(), &ResourceRowOptions::default());
        assert_eq!(labels(&rows), ["alice", "bob", "carol", "dave"]);
        let ResourceRow::Resource {
            stack_levels,
            lane_count,
            height,
            ..
        } = &rows[0]
        else {
            panic!("expected resource row");
        };
        assert_eq!(stack_levels, &[0, 1]);
        assert_eq!(*lane_count, 2);
        assert!((height - 72.0).abs() < f64::EPSILON);
        assert!((rows[3].height() - DEFAULT_ROW_HEIGHT).abs() < f64::EPSILON);
    }

    #[test]
    fn hide_empty_drops_idle_resources() {
        let options = ResourceRowOptions {
            show_empty: false,
            ..ResourceRowOptions::default()
        };
        let rows = resource_rows(&team(), &work(), &options);
        assert_eq!(labels(&rows), ["alice", "bob", "carol"]);
    }

    #[test]
    fn grouped_rows_put_headers_first_and_ungrouped_last() {
        let options = ResourceRowOptions {
            group_by_group: true,
            ..ResourceRowOptions::default()
        };
        let rows = resource_rows(&team(), &work(), &options);
        assert_eq!(labels(&rows), ["[eng]", "alice", "carol", "[ops]", "dave", "bob"]);
        assert_eq!(
            rows[0],
            ResourceRow::Group {
                name: "eng".into(),
                collapsed: false,
                start: Some(0),
                end: Some(30),
                height: DEFAULT_ROW_HEIGHT,
            }
        );
        let ResourceRow::Group { start, end, .. } = &rows[3] else {
            panic!("expected group row");
        };
        assert_eq!((*start, *end), (None, None));
    }

    #[test]
    fn collapsed_group_hides_member_rows() {
        let options = ResourceRowOptions {
            group_by_group: true,
            collapsed_groups: vec!["eng".into()],
            ..ResourceRowOptions::default()
        };
        let rows = resource_rows(&team(), &work(), &options);
        assert_eq!(labels(&rows), ["[eng]", "[ops]", "dave", "bob"]);

        let mut resources = team();
        resources[3].collapsed = true;
        let rows = resource_rows(
            &resources,
            &work(),
            &ResourceRowOptions {
                group_by_group: true,
                ..ResourceRowOptions::default()
            },
        );
        assert_eq!(labels(&rows), ["[eng]", "alice", "carol", "[ops]", "bob"]);
    }

    #[test]
    fn item_row_map_points_at_resource_rows() {
        let options = ResourceRowOptions {
            group_by_group: true,
            ..ResourceRowOptions::default()
        };
        let rows = resource_rows(&team(), &work(), &options);
        let map = item_row_map(&rows);
        assert_eq!(map.get("a2"), Some(&1));
        assert_eq!(map.get("c1"), Some(&2));
        assert_eq!(map.get("b1"), Some(&5));
        assert_eq!(map.get("x1"), None);
    }

    #[test]
    fn resource_deserializes_with_defaults() {
        let r: Resource = serde_json::from_str(r#"{"id": "alice", "group": "eng"}"#).unwrap();
        assert_eq!(r.name, "");
        assert_eq!(r.group.as_deref(), Some("eng"));
        assert!(!r.collapsed);
    }
}
