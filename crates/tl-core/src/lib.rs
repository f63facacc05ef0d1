//! Computational core for timeline and Gantt charts.
//!
//! This crate contains the pure logic behind an interactive timeline:
//! - Hierarchy: flattening parent links into depth-first rows with collapse
//! - Temporal mapping: instants to pixels per zoom level, snapping, headers
//! - Drag editing: the pointer state machine that emits minimal patches
//! - Lane packing: stacking overlapping items inside resource rows
//! - Selection: click/ctrl/shift transitions and related-item highlighting
//! - Markers: chart-wide and per-row vertical lines, including deadlines
//!
//! Nothing here performs I/O or holds the item list. The owner passes items
//! in, applies the [`Patch`]es that come back, and stores the selection.

pub mod capacity;
pub mod document;
pub mod drag;
pub mod hierarchy;
pub mod item;
pub mod lanes;
pub mod layout;
pub mod marker;
pub mod patch;
pub mod resource;
pub mod selection;
pub mod temporal;
pub mod types;

pub use capacity::{CapacityInfo, CapacityStatus, NonWorkingPeriod, capacity};
pub use document::ChartDocument;
pub use drag::{
    DEFAULT_DRAG_THRESHOLD_PX, DragEngine, DragKind, DragOptions, DragPhase, DragPreview,
    DragSession, NoCapture, PointerCapture,
};
pub use hierarchy::{NormalizeOptions, normalize, toggle_collapsed, visible_items};
pub use item::{ItemKind, NormalizedItem, TimeSpan, WorkItem};
pub use lanes::{LaneAssignment, ResourceLanes, assign_lanes, pack_resource_lanes};
pub use layout::{
    AllRows, ChartLayout, LayoutOptions, PlacedItem, ResourceLayout, RowWindow, VirtualRow,
    global_marker_lines, row_marker_lines,
};
pub use marker::{LabelPosition, Marker, MarkerLine, MarkerStyle, TaskMarker};
pub use patch::{ChangeKind, ChangeLog, ChartObserver, FieldChanges, Patch};
pub use resource::{Resource, ResourceRow, ResourceRowOptions, item_row_map, resource_rows};
pub use selection::{Modifiers, SelectionState, related_ids};
pub use temporal::{Geometry, HeaderCell, HeaderCells, RowMetrics, ViewRange, ZoomConfig, ZoomLevel};
pub use types::{
    GroupId, Instant, ItemId, MS_PER_DAY, MS_PER_HOUR, MarkerId, Progress, ResourceId, ValidationError,
    format_instant, parse_instant,
};
