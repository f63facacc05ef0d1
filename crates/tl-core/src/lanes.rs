//! Lane packing for resource rows.
//!
//! Items sharing a resource are stacked into non-overlapping lanes with greedy
//! interval partitioning. The lane count equals the maximum number of items
//! overlapping at any instant.
//!
//! Touching is not overlapping: an item starting exactly where another ends
//! may reuse its lane.

use std::collections::HashMap;

use serde::Serialize;

use crate::item::{TimeSpan, WorkItem};
use crate::types::{Instant, ItemId, ResourceId};

/// Lane assignment for one set of spans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaneAssignment {
    /// Lane per input span, parallel to the input slice.
    pub levels: Vec<usize>,

    /// Number of lanes used.
    pub lane_count: usize,
}

/// Packs `spans` into lanes.
///
/// Spans are visited by ascending start with ties in input order. Each goes to
/// the lowest lane whose last end is at or before its start, or a new lane.
pub fn assign_lanes<T: TimeSpan>(spans: &[T]) -> LaneAssignment {
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by_key(|&i| spans[i].start());

    let mut lane_ends: Vec<Instant> = Vec::new();
    let mut levels = vec![0; spans.len()];
    for idx in order {
        let span = &spans[idx];
        let lane = match lane_ends.iter().position(|&end| end <= span.start()) {
            Some(free) => free,
            None => {
                lane_ends.push(span.end());
                lane_ends.len() - 1
            }
        };
        lane_ends[lane] = span.end();
        levels[idx] = lane;
    }

    LaneAssignment {
        levels,
        lane_count: lane_ends.len(),
    }
}

/// Lanes for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLanes {
    pub resource_id: ResourceId,

    /// Items on this resource, in input order.
    pub item_ids: Vec<ItemId>,

    /// Stack level per item, parallel to `item_ids`.
    pub stack_levels: Vec<usize>,

    pub lane_count: usize,
}

impl ResourceLanes {
    /// Stack level of `id`, if it is on this resource.
    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.item_ids
            .iter()
            .position(|i| i.as_str() == id)
            .map(|pos| self.stack_levels[pos])
    }
}

/// Packs every resource's items independently.
///
/// Resources appear in order of first use. Items without a resource are
/// skipped.
pub fn pack_resource_lanes(items: &[WorkItem]) -> Vec<ResourceLanes> {
    let mut buckets: Vec<(ResourceId, Vec<&WorkItem>)> = Vec::new();
    let mut index: HashMap<&ResourceId, usize> = HashMap::new();
    for item in items {
        let Some(resource) = &item.resource_id else {
            continue;
        };
        let slot = *index.entry(resource).or_insert_with(|| {
            buckets.push((resource.clone(), Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(item);
    }

    buckets
        .into_iter()
        .map(|(resource_id, members)| {
            let spans: Vec<(Instant, Instant)> =
                members.iter().map(|i| (i.start, i.end)).collect();
            let packed = assign_lanes(&spans);
            tracing::trace!(resource = %resource_id, lanes = packed.lane_count, "packed lanes");
            ResourceLanes {
                resource_id,
                item_ids: members.iter().map(|i| i.id.clone()).collect(),
                stack_levels: packed.levels,
                lane_count: packed.lane_count,
            }
        })
        .collect()
}

/// Expanded row height for a resource with `lane_count` lanes.
///
/// An empty resource still gets one row.
#[allow(clippy::cast_precision_loss)]
pub fn row_height(base: f64, lane_count: usize) -> f64 {
    base * lane_count.max(1) as f64
}
