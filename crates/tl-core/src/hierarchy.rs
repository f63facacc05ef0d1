//! Hierarchy normalization.
//!
//! Turns a flat item list with parent links into a depth-first ordered list
//! annotated with depth, visibility and a dense visible index.
//!
//! # Algorithm Summary
//!
//! 1. Index items by ID and bucket them by parent. Items whose parent does not
//!    resolve are placed in the root bucket.
//! 2. Optionally fold child date ranges into their ancestors, deepest first.
//! 3. Walk the forest in pre-order from roots in input order, assigning
//!    `visible_index` only to items with no collapsed group above them.
//!
//! Malformed input degrades instead of failing: orphans become roots and items
//! stranded on a parent cycle are emitted as roots after everything reachable.

use std::collections::HashMap;

use crate::item::{ItemKind, NormalizedItem, WorkItem};
use crate::patch::{ChangeKind, FieldChanges, Patch};
use crate::types::{Instant, ItemId};

/// Options for [`normalize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Recompute every parent's range as the min/max over its descendants.
    pub sync_parent_dates: bool,
}

/// Parent/child index over an item slice.
struct Forest<'a> {
    items: &'a [WorkItem],
    by_id: HashMap<&'a str, usize>,
    /// Children per item index, in input order.
    children: Vec<Vec<usize>>,
    /// Items with no resolvable parent, in input order.
    roots: Vec<usize>,
}

impl<'a> Forest<'a> {
    fn new(items: &'a [WorkItem]) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            by_id.entry(item.id.as_str()).or_insert(idx);
        }

        let mut children = vec![Vec::new(); items.len()];
        let mut roots = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            match item.parent_id.as_ref().and_then(|p| by_id.get(p.as_str())) {
                Some(&parent) if parent != idx => children[parent].push(idx),
                _ => {
                    if let Some(parent) = &item.parent_id {
                        tracing::debug!(item = %item.id, %parent, "unresolved parent, treating as root");
                    }
                    roots.push(idx);
                }
            }
        }

        Self {
            items,
            by_id,
            children,
            roots,
        }
    }

    fn parent_of(&self, idx: usize) -> Option<usize> {
        let parent = self.items[idx].parent_id.as_ref()?;
        self.by_id
            .get(parent.as_str())
            .copied()
            .filter(|&p| p != idx)
    }

    /// Depth of every item, memoized.
    ///
    /// The ancestor walk is bounded by the item count so a cyclic parent graph
    /// terminates instead of recursing forever.
    fn depths(&self) -> Vec<usize> {
        let mut depths: Vec<Option<usize>> = vec![None; self.items.len()];
        for idx in 0..self.items.len() {
            if depths[idx].is_some() {
                continue;
            }
            let mut chain = vec![idx];
            let mut base = 0;
            let mut current = idx;
            while let Some(parent) = self.parent_of(current) {
                if let Some(d) = depths[parent] {
                    base = d + 1;
                    break;
                }
                if chain.len() > self.items.len() {
                    break;
                }
                chain.push(parent);
                current = parent;
            }
            for (offset, &member) in chain.iter().rev().enumerate() {
                if depths[member].is_none() {
                    depths[member] = Some(base + offset);
                }
            }
        }
        depths.into_iter().map(Option::unwrap_or_default).collect()
    }

    /// True if any strict ancestor is a collapsed group.
    fn hidden_by_ancestor(&self, idx: usize) -> bool {
        let mut current = idx;
        for _ in 0..self.items.len() {
            let Some(parent) = self.parent_of(current) else {
                return false;
            };
            let p = &self.items[parent];
            if p.kind == ItemKind::Group && p.collapsed {
                return true;
            }
            current = parent;
        }
        false
    }
}

/// Normalizes `items` into depth-first order.
///
/// The output always has exactly `items.len()` entries. `visible_index`
/// values among visible items form `0..k` in output order.
pub fn normalize(items: &[WorkItem], options: NormalizeOptions) -> Vec<NormalizedItem> {
    if items.is_empty() {
        return Vec::new();
    }

    let forest = Forest::new(items);
    let depths = forest.depths();

    let mut spans: Vec<(Instant, Instant)> = items.iter().map(|i| (i.start, i.end)).collect();
    if options.sync_parent_dates {
        sync_parent_dates(&forest, &depths, &mut spans);
    }

    let mut out = Vec::with_capacity(items.len());
    let mut emitted = vec![false; items.len()];
    let mut next_visible = 0;

    let mut stack: Vec<usize> = forest.roots.iter().rev().copied().collect();
    let mut leftovers = 0..items.len();
    loop {
        let Some(idx) = stack.pop().or_else(|| leftovers.find(|&i| !emitted[i])) else {
            break;
        };
        if emitted[idx] {
            continue;
        }
        emitted[idx] = true;

        let visible = !forest.hidden_by_ancestor(idx);
        let visible_index = visible.then(|| {
            next_visible += 1;
            next_visible - 1
        });

        let (start, end) = spans[idx];
        out.push(NormalizedItem {
            item: WorkItem {
                start,
                end,
                ..items[idx].clone()
            },
            depth: depths[idx],
            has_children: !forest.children[idx].is_empty(),
            visible,
            visible_index,
        });

        stack.extend(forest.children[idx].iter().rev().copied());
    }

    tracing::trace!(
        items = out.len(),
        visible = next_visible,
        "normalized hierarchy"
    );
    out
}

/// Folds descendant ranges into parents, deepest items first so that nested
/// groups are settled before their ancestors read them.
fn sync_parent_dates(forest: &Forest<'_>, depths: &[usize], spans: &mut [(Instant, Instant)]) {
    let mut order: Vec<usize> = (0..spans.len()).collect();
    order.sort_by(|a, b| depths[*b].cmp(&depths[*a]));

    for idx in order {
        let range = forest.children[idx]
            .iter()
            .map(|&child| spans[child])
            .reduce(|(s1, e1), (s2, e2)| (s1.min(s2), e1.max(e2)));
        if let Some(range) = range {
            spans[idx] = range;
        }
    }
}

/// Visible items in display order.
pub fn visible_items(normalized: &[NormalizedItem]) -> Vec<&NormalizedItem> {
    let mut visible: Vec<_> = normalized.iter().filter(|n| n.visible).collect();
    visible.sort_by_key(|n| n.visible_index);
    visible
}

/// Looks up an item by ID.
pub fn find_item<'a>(normalized: &'a [NormalizedItem], id: &str) -> Option<&'a NormalizedItem> {
    normalized.iter().find(|n| n.item.id.as_str() == id)
}

/// Direct children of `parent`, in list order.
pub fn children_of<'a>(normalized: &'a [NormalizedItem], parent: &str) -> Vec<&'a NormalizedItem> {
    normalized
        .iter()
        .filter(|n| n.item.parent_id.as_ref().is_some_and(|p| p.as_str() == parent))
        .collect()
}

/// All descendant IDs of `id` in pre-order.
pub fn descendant_ids(normalized: &[NormalizedItem], id: &str) -> Vec<ItemId> {
    let mut out = Vec::new();
    let mut stack: Vec<&NormalizedItem> = children_of(normalized, id).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        if out.contains(&node.item.id) {
            continue;
        }
        out.push(node.item.id.clone());
        stack.extend(children_of(normalized, node.item.id.as_str()).into_iter().rev());
    }
    out
}

/// Range covered by an item, extended over its descendants when it has any.
pub fn date_range(normalized: &[NormalizedItem], id: &str) -> Option<(Instant, Instant)> {
    let item = find_item(normalized, id)?;
    let own = (item.item.start, item.item.end);
    if !item.has_children {
        return Some(own);
    }
    let descendants = descendant_ids(normalized, id);
    Some(
        normalized
            .iter()
            .filter(|n| descendants.contains(&n.item.id))
            .fold(own, |(s, e), n| (s.min(n.item.start), e.max(n.item.end))),
    )
}

/// Patch flipping the collapse flag of `id`, or `None` if it is unknown.
pub fn toggle_collapsed(items: &[WorkItem], id: &str) -> Option<Patch> {
    let item = items.iter().find(|i| i.id.as_str() == id)?;
    Some(Patch {
        id: item.id.clone(),
        changes: FieldChanges {
            collapsed: Some(!item.collapsed),
            ..FieldChanges::default()
        },
        previous_values: FieldChanges {
            collapsed: Some(item.collapsed),
            ..FieldChanges::default()
        },
        kind: ChangeKind::Collapse,
    })
}
