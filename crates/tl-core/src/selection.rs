//! Selection state transitions and related-item highlighting.
//!
//! The owner holds the [`SelectionState`]; every transition here is a pure
//! function returning the next state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::hierarchy::visible_items;
use crate::item::NormalizedItem;
use crate::types::ItemId;

/// Keyboard modifiers held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        meta: false,
        shift: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Ctrl and meta both toggle membership.
    pub const fn toggles(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Selected item IDs plus the anchor used for range extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub ids: Vec<ItemId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<ItemId>,
}

impl SelectionState {
    /// A selection of exactly `id`, anchored on it.
    pub fn single(id: ItemId) -> Self {
        Self {
            ids: vec![id.clone()],
            anchor: Some(id),
        }
    }

    /// Empty selection with no anchor.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i.as_str() == id)
    }

    /// Applies a click on `id` with `modifiers` held.
    ///
    /// Shift extends from the anchor over the visible order and keeps the
    /// anchor. Without an anchor, shift falls through to the other rules. If
    /// either end of the range is not visible the selection is unchanged.
    pub fn click(&self, items: &[NormalizedItem], id: &ItemId, modifiers: Modifiers) -> Self {
        let next = match (&self.anchor, modifiers.shift) {
            (Some(anchor), true) => {
                let anchor = anchor.clone();
                self.range(items, &anchor, id).map_or_else(
                    || self.clone(),
                    |ids| Self {
                        ids,
                        anchor: Some(anchor),
                    },
                )
            }
            _ if modifiers.toggles() => {
                let ids = if self.is_selected(id.as_str()) {
                    self.ids.iter().filter(|i| *i != id).cloned().collect()
                } else {
                    let mut ids = self.ids.clone();
                    ids.push(id.clone());
                    ids
                };
                Self {
                    ids,
                    anchor: Some(id.clone()),
                }
            }
            _ => Self::single(id.clone()),
        };
        tracing::debug!(
            item = %id,
            shift = modifiers.shift,
            toggle = modifiers.toggles(),
            selected = next.ids.len(),
            "selection click"
        );
        next
    }

    /// Selects the inclusive visible span between `from` and `to`, anchored on
    /// `from`. Unchanged if either is not visible.
    pub fn select_range(&self, items: &[NormalizedItem], from: &ItemId, to: &ItemId) -> Self {
        self.range(items, from, to).map_or_else(
            || self.clone(),
            |ids| Self {
                ids,
                anchor: Some(from.clone()),
            },
        )
    }

    /// Every visible item, anchored on the first.
    pub fn select_all(items: &[NormalizedItem]) -> Self {
        let ids: Vec<ItemId> = visible_items(items)
            .into_iter()
            .map(|n| n.item.id.clone())
            .collect();
        Self {
            anchor: ids.first().cloned(),
            ids,
        }
    }

    fn range(&self, items: &[NormalizedItem], from: &ItemId, to: &ItemId) -> Option<Vec<ItemId>> {
        let visible = visible_items(items);
        let a = visible.iter().position(|n| n.id() == from)?;
        let b = visible.iter().position(|n| n.id() == to)?;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Some(
            visible[lo..=hi]
                .iter()
                .map(|n| n.item.id.clone())
                .collect(),
        )
    }
}

/// Items related to the current selection, in list order.
///
/// For each selected item: other visible items sharing its group, items it
/// lists as related, and items listing it as related. Selected items are
/// never included, and `enabled = false` yields nothing.
pub fn related_ids(items: &[NormalizedItem], selection: &SelectionState, enabled: bool) -> Vec<ItemId> {
    if !enabled || selection.is_empty() {
        return Vec::new();
    }

    let selected: HashSet<&str> = selection.ids.iter().map(ItemId::as_str).collect();
    let mut related: HashSet<&str> = HashSet::new();

    for sel in &selection.ids {
        let Some(source) = items.iter().find(|n| n.id() == sel) else {
            continue;
        };
        if let Some(group) = &source.item.group_id {
            related.extend(
                items
                    .iter()
                    .filter(|n| n.visible && n.item.group_id.as_ref() == Some(group))
                    .map(|n| n.item.id.as_str()),
            );
        }
        related.extend(source.item.related_ids.iter().map(ItemId::as_str));
        related.extend(
            items
                .iter()
                .filter(|n| n.item.related_ids.contains(sel))
                .map(|n| n.item.id.as_str()),
        );
    }

    items
        .iter()
        .map(NormalizedItem::id)
        .filter(|id| related.contains(id.as_str()) && !selected.contains(id.as_str()))
        .cloned()
        .collect()
}
