//! Screen layout assembly.
//!
//! Runs normalized items or resource rows through the temporal mapper to get
//! per-item geometry. Which rows are materialized is decided by a
//! [`RowWindow`]; the core never tracks scroll position itself.

use std::collections::HashMap;

use serde::Serialize;

use crate::hierarchy::visible_items;
use crate::item::{NormalizedItem, WorkItem};
use crate::marker::{Marker, MarkerLine, TaskMarker};
use crate::resource::{Resource, ResourceRow, ResourceRowOptions, resource_rows};
use crate::temporal::{
    Geometry, RowMetrics, ViewRange, ZoomConfig, bar_geometry, marker_geometry, milestone_geometry,
    timeline_width,
};
use crate::types::ItemId;

/// A row the window wants drawn, with its top offset in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VirtualRow {
    pub index: usize,
    pub offset: f64,
}

/// Row virtualization supplied by the host.
pub trait RowWindow {
    /// Rows to materialize out of `row_count`, given each row's height.
    fn visible_rows(&self, row_count: usize, size_of: &dyn Fn(usize) -> f64) -> Vec<VirtualRow>;
}

/// Materializes every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllRows;

impl RowWindow for AllRows {
    fn visible_rows(&self, row_count: usize, size_of: &dyn Fn(usize) -> f64) -> Vec<VirtualRow> {
        let mut offset = 0.0;
        (0..row_count)
            .map(|index| {
                let row = VirtualRow { index, offset };
                offset += size_of(index);
                row
            })
            .collect()
    }
}

/// Inputs shared by every layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub view: ViewRange,
    pub zoom: ZoomConfig,
    pub metrics: RowMetrics,
}

/// Geometry for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedItem {
    pub id: ItemId,
    pub row: usize,
    pub milestone: bool,
    #[serde(flatten)]
    pub geometry: Geometry,
    /// Width of the filled progress portion of the bar.
    pub progress_width: f64,
}

/// Laid-out chart body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub row_count: usize,
    pub items: Vec<PlacedItem>,
}

fn place(item: &WorkItem, row: usize, row_top: f64, options: &LayoutOptions, metrics: RowMetrics) -> PlacedItem {
    let ppd = options.zoom.pixels_per_day;
    let milestone = item.is_milestone();
    let geometry = if milestone {
        milestone_geometry(item.start, row_top, options.view.start, ppd, metrics)
    } else {
        bar_geometry(item.start, item.end, row_top, options.view.start, ppd, metrics)
    };
    PlacedItem {
        id: item.id.clone(),
        row,
        milestone,
        geometry,
        progress_width: if milestone {
            0.0
        } else {
            geometry.width * item.progress.value()
        },
    }
}

/// Task view: one row per visible item, in visible order.
pub fn task_rows<W: RowWindow + ?Sized>(
    normalized: &[NormalizedItem],
    options: &LayoutOptions,
    window: &W,
) -> ChartLayout {
    let visible = visible_items(normalized);
    let heights = row_heights(&visible, options.metrics);
    let size_of = |i: usize| heights.get(i).copied().unwrap_or(options.metrics.row_height);

    let items = window
        .visible_rows(visible.len(), &size_of)
        .into_iter()
        .filter_map(|row| {
            let node = visible.get(row.index)?;
            let metrics = RowMetrics {
                row_height: heights[row.index],
                ..options.metrics
            };
            Some(place(&node.item, row.index, row.offset, options, metrics))
        })
        .collect();

    ChartLayout {
        width: timeline_width(options.view.start, options.view.end, options.zoom.pixels_per_day),
        height: heights.iter().sum(),
        row_count: visible.len(),
        items,
    }
}

fn row_heights(visible: &[&NormalizedItem], metrics: RowMetrics) -> Vec<f64> {
    visible
        .iter()
        .map(|n| n.item.row_height.unwrap_or(metrics.row_height))
        .collect()
}

/// Chart-wide markers as lines `height` pixels tall from the top of the body.
///
/// Markers outside the view are dropped.
pub fn global_marker_lines(
    markers: &[Marker],
    options: &LayoutOptions,
    height: f64,
) -> Vec<MarkerLine> {
    markers
        .iter()
        .filter_map(|m| {
            let geometry = marker_geometry(
                m.timestamp,
                options.view,
                options.zoom.pixels_per_day,
                m.width,
                0.0,
                height,
            )?;
            Some(MarkerLine::new(m, None, geometry))
        })
        .collect()
}

/// Task markers plus item deadlines, each confined to its item's task row.
///
/// Markers on hidden or unknown items, or outside the view, are dropped.
pub fn row_marker_lines(
    normalized: &[NormalizedItem],
    task_markers: &[TaskMarker],
    options: &LayoutOptions,
) -> Vec<MarkerLine> {
    let visible = visible_items(normalized);
    let heights = row_heights(&visible, options.metrics);

    let mut rows: HashMap<&str, (f64, f64)> = HashMap::with_capacity(visible.len());
    let mut offset = 0.0;
    for (node, &height) in visible.iter().zip(&heights) {
        rows.insert(node.item.id.as_str(), (offset, height));
        offset += height;
    }

    let deadlines = visible.iter().filter_map(|n| Marker::deadline(&n.item));
    task_markers
        .iter()
        .cloned()
        .chain(deadlines)
        .filter_map(|tm| {
            let &(top, height) = rows.get(tm.item_id.as_str())?;
            let geometry = marker_geometry(
                tm.marker.timestamp,
                options.view,
                options.zoom.pixels_per_day,
                tm.marker.width,
                top,
                height,
            )?;
            Some(MarkerLine::new(&tm.marker, Some(tm.item_id.clone()), geometry))
        })
        .collect()
}

/// Resource view: resource rows with items stacked into lanes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceLayout {
    pub rows: Vec<ResourceRow>,
    #[serde(flatten)]
    pub chart: ChartLayout,
}

/// Lays out `items` by resource. Each lane is one base row tall.
pub fn resource_layout<T: AsRef<WorkItem>, W: RowWindow + ?Sized>(
    resources: &[Resource],
    items: &[T],
    row_options: &ResourceRowOptions,
    options: &LayoutOptions,
    window: &W,
) -> ResourceLayout {
    let rows = resource_rows(resources, items, row_options);
    let size_of = |i: usize| rows.get(i).map_or(row_options.row_height, ResourceRow::height);
    let lane_metrics = RowMetrics {
        row_height: row_options.row_height,
        ..options.metrics
    };

    let mut placed = Vec::new();
    for row in window.visible_rows(rows.len(), &size_of) {
        let Some(ResourceRow::Resource {
            item_ids,
            stack_levels,
            ..
        }) = rows.get(row.index)
        else {
            continue;
        };
        for (id, &level) in item_ids.iter().zip(stack_levels) {
            let Some(item) = items.iter().map(AsRef::<WorkItem>::as_ref).find(|i| &i.id == id) else {
                continue;
            };
            #[allow(clippy::cast_precision_loss)]
            let lane_top = row.offset + level as f64 * row_options.row_height;
            placed.push(place(item, row.index, lane_top, options, lane_metrics));
        }
    }

    let height = rows.iter().map(ResourceRow::height).sum();
    let row_count = rows.len();
    ResourceLayout {
        rows,
        chart: ChartLayout {
            width: timeline_width(options.view.start, options.view.end, options.zoom.pixels_per_day),
            height,
            row_count,
            items: placed,
        },
    }
}
