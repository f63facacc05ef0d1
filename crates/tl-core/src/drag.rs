//! Pointer drag editing.
//!
//! A [`DragEngine`] owns at most one [`DragSession`] and walks it through
//! `Idle -> Armed -> Dragging -> Idle`. The session never touches the item
//! list: callers read a derived [`DragPreview`] while dragging and receive a
//! single [`Patch`] when the pointer is released.
//!
//! Pointer capture (the move/up/cancel listeners of a host UI) is acquired when
//! a session starts and released on every path out of it, including drop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::item::WorkItem;
use crate::patch::{ChangeKind, ChartObserver, FieldChanges, Patch};
use crate::temporal::{ZoomConfig, snap_to_unit};
use crate::types::{Instant, ItemId, Progress, ValidationError};

/// Pointer travel in pixels before a press becomes a drag.
pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 3.0;

/// Which part of an item the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragKind {
    Move,
    ResizeStart,
    ResizeEnd,
    Progress,
}

impl DragKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::ResizeStart => "resize-start",
            Self::ResizeEnd => "resize-end",
            Self::Progress => "progress",
        }
    }

    /// Change kind reported on commit.
    #[must_use]
    pub const fn change_kind(self) -> ChangeKind {
        match self {
            Self::Move => ChangeKind::DragMove,
            Self::ResizeStart => ChangeKind::DragResizeStart,
            Self::ResizeEnd => ChangeKind::DragResizeEnd,
            Self::Progress => ChangeKind::Progress,
        }
    }
}

impl fmt::Display for DragKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DragKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "move" => Ok(Self::Move),
            "resize-start" => Ok(Self::ResizeStart),
            "resize-end" => Ok(Self::ResizeEnd),
            "progress" => Ok(Self::Progress),
            _ => Err(ValidationError::UnknownName {
                kind: "drag kind",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for DragKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DragKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Host pointer/keyboard listeners scoped to a drag session.
pub trait PointerCapture {
    /// Called once when a session starts.
    fn acquire(&mut self);

    /// Called once when a session ends, however it ends.
    fn release(&mut self);
}

/// Capture for hosts that route pointer events themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn acquire(&mut self) {}

    fn release(&mut self) {}
}

/// Session phase. A missing session is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DragPhase {
    /// Pressed, pointer has not yet left the threshold box.
    Armed,
    Dragging,
}

/// The transient state of one drag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragSession {
    pub item_id: ItemId,
    pub kind: DragKind,
    pub origin: (f64, f64),
    pub pointer: (f64, f64),
    pub initial_start: Instant,
    pub initial_end: Instant,
    pub initial_progress: Progress,
    pub phase: DragPhase,
}

impl DragSession {
    /// Horizontal pointer travel since the press.
    pub fn delta_x(&self) -> f64 {
        self.pointer.0 - self.origin.0
    }
}

/// Derived item state under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DragPreview {
    pub start: Instant,
    pub end: Instant,

    /// Present only for progress drags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOptions {
    /// When false, presses never start a session.
    pub editable: bool,
    pub zoom: ZoomConfig,
    pub threshold_px: f64,
}

impl Default for DragOptions {
    fn default() -> Self {
        Self {
            editable: true,
            zoom: ZoomConfig::default(),
            threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
        }
    }
}

/// Drag state machine.
pub struct DragEngine<C: PointerCapture = NoCapture> {
    options: DragOptions,
    capture: C,
    session: Option<DragSession>,
}

impl DragEngine<NoCapture> {
    pub const fn new(options: DragOptions) -> Self {
        Self::with_capture(options, NoCapture)
    }
}

impl<C: PointerCapture> DragEngine<C> {
    pub const fn with_capture(options: DragOptions, capture: C) -> Self {
        Self {
            options,
            capture,
            session: None,
        }
    }

    pub const fn options(&self) -> &DragOptions {
        &self.options
    }

    /// Changes zoom. An active session keeps its snapshot but previews with
    /// the new density.
    pub const fn set_zoom(&mut self, zoom: ZoomConfig) {
        self.options.zoom = zoom;
    }

    pub const fn set_editable(&mut self, editable: bool) {
        self.options.editable = editable;
    }

    pub const fn capture(&self) -> &C {
        &self.capture
    }

    pub const fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Current phase, `None` when idle.
    pub fn phase(&self) -> Option<DragPhase> {
        self.session.as_ref().map(|s| s.phase)
    }

    pub fn is_dragging(&self) -> bool {
        self.phase() == Some(DragPhase::Dragging)
    }

    /// Presses on `item_id`, snapshotting its current range and progress.
    ///
    /// Returns false, doing nothing, when editing is off or the item is
    /// unknown. A session already in progress is dropped without a patch.
    pub fn start<T: AsRef<WorkItem>>(
        &mut self,
        items: &[T],
        item_id: &str,
        kind: DragKind,
        x: f64,
        y: f64,
    ) -> bool {
        if !self.options.editable {
            tracing::debug!(item = item_id, "drag ignored, chart is read-only");
            return false;
        }
        let Some(item) = find(items, item_id) else {
            tracing::debug!(item = item_id, "drag ignored, unknown item");
            return false;
        };

        if let Some(previous) = self.session.take() {
            tracing::warn!(
                previous = %previous.item_id,
                item = item_id,
                "drag started while another session was active, discarding it"
            );
            self.capture.release();
        }

        self.session = Some(DragSession {
            item_id: item.id.clone(),
            kind,
            origin: (x, y),
            pointer: (x, y),
            initial_start: item.start,
            initial_end: item.end,
            initial_progress: item.progress,
            phase: DragPhase::Armed,
        });
        self.capture.acquire();
        tracing::debug!(item = item_id, %kind, "drag armed");
        true
    }

    /// Records pointer motion. Leaves `Armed` once either axis moves past the
    /// threshold; a session never returns to `Armed`.
    pub fn move_to(&mut self, x: f64, y: f64) {
        let threshold = self.options.threshold_px;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.pointer = (x, y);
        if session.phase == DragPhase::Armed {
            let dx = (x - session.origin.0).abs();
            let dy = (y - session.origin.1).abs();
            if dx > threshold || dy > threshold {
                session.phase = DragPhase::Dragging;
                tracing::debug!(item = %session.item_id, "drag started");
            }
        }
    }

    /// Preview for `item_id`, defined only while dragging that item.
    ///
    /// Progress drags read the item's current width from `items`, so they
    /// return `None` if it has disappeared.
    pub fn preview<T: AsRef<WorkItem>>(&self, items: &[T], item_id: &str) -> Option<DragPreview> {
        let session = self.session.as_ref()?;
        if session.phase != DragPhase::Dragging || session.item_id.as_str() != item_id {
            return None;
        }
        compute_preview(session, &self.options.zoom, items)
    }

    /// Releases the pointer.
    ///
    /// Returns a patch only if the session was dragging and the final
    /// preview differs from the snapshot. The session ends either way.
    pub fn end<T: AsRef<WorkItem>>(&mut self, items: &[T]) -> Option<Patch> {
        let session = self.session.take()?;
        self.capture.release();

        if session.phase != DragPhase::Dragging {
            tracing::debug!(item = %session.item_id, "released before threshold, treating as click");
            return None;
        }

        let preview = compute_preview(&session, &self.options.zoom, items)?;
        let patch = diff(&session, &preview);
        match &patch {
            Some(p) => tracing::debug!(item = %p.id, kind = %p.kind, "drag committed"),
            None => tracing::debug!(item = %session.item_id, "drag ended without change"),
        }
        patch
    }

    /// Like [`end`](Self::end), forwarding a committed patch to `observer`.
    pub fn end_into<T: AsRef<WorkItem>, O: ChartObserver + ?Sized>(
        &mut self,
        items: &[T],
        observer: &mut O,
    ) -> Option<Patch> {
        let patch = self.end(items)?;
        observer.on_change(&patch);
        Some(patch)
    }

    /// Abandons the session without emitting anything.
    ///
    /// Returns false when there was nothing to cancel.
    pub fn cancel(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        self.capture.release();
        tracing::debug!(item = %session.item_id, "drag cancelled");
        true
    }
}

impl<C: PointerCapture> Drop for DragEngine<C> {
    fn drop(&mut self) {
        if self.session.take().is_some() {
            self.capture.release();
        }
    }
}

impl<C: PointerCapture> fmt::Debug for DragEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragEngine")
            .field("options", &self.options)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn find<'a, T: AsRef<WorkItem>>(items: &'a [T], id: &str) -> Option<&'a WorkItem> {
    items
        .iter()
        .map(AsRef::<WorkItem>::as_ref)
        .find(|i| i.id.as_str() == id)
}

/// Shifts `initial` by `delta_ms` and snaps to the absolute grid.
///
/// Motion under half a snap unit leaves the value exactly where it was, so
/// an unaligned item does not jump on a tiny drag.
fn shift(initial: Instant, delta_ms: f64, snap_ms: i64) -> Instant {
    #[allow(clippy::cast_precision_loss)]
    let steps = if snap_ms > 0 {
        (delta_ms / snap_ms as f64).round()
    } else {
        delta_ms.round()
    };
    if steps == 0.0 {
        return initial;
    }
    #[allow(clippy::cast_precision_loss)]
    let target = initial as f64 + delta_ms;
    snap_to_unit(target, snap_ms)
}

fn compute_preview<T: AsRef<WorkItem>>(
    session: &DragSession,
    zoom: &ZoomConfig,
    items: &[T],
) -> Option<DragPreview> {
    let ms_per_pixel = zoom.ms_per_pixel();
    let delta_ms = session.delta_x() * ms_per_pixel;
    let snap = zoom.snap_ms;
    let (start, end) = (session.initial_start, session.initial_end);

    let preview = match session.kind {
        DragKind::Move => DragPreview {
            start: shift(start, delta_ms, snap),
            end: shift(end, delta_ms, snap),
            progress: None,
        },
        DragKind::ResizeStart => DragPreview {
            start: shift(start, delta_ms, snap).min(end.saturating_sub(snap)),
            end,
            progress: None,
        },
        DragKind::ResizeEnd => DragPreview {
            start,
            end: shift(end, delta_ms, snap).max(start.saturating_add(snap)),
            progress: None,
        },
        DragKind::Progress => {
            let item = find(items, session.item_id.as_str())?;
            #[allow(clippy::cast_precision_loss)]
            let width = (i128::from(item.end) - i128::from(item.start)) as f64 / ms_per_pixel;
            let progress = if width > 0.0 {
                Progress::clamped(session.initial_progress.value() + session.delta_x() / width)
            } else {
                session.initial_progress
            };
            DragPreview {
                start,
                end,
                progress: Some(progress),
            }
        }
    };
    Some(preview)
}

fn diff(session: &DragSession, preview: &DragPreview) -> Option<Patch> {
    let mut changes = FieldChanges::default();
    let mut previous_values = FieldChanges::default();

    if preview.start != session.initial_start {
        changes.start = Some(preview.start);
        previous_values.start = Some(session.initial_start);
    }
    if preview.end != session.initial_end {
        changes.end = Some(preview.end);
        previous_values.end = Some(session.initial_end);
    }
    if let Some(progress) = preview.progress.filter(|p| *p != session.initial_progress) {
        changes.progress = Some(progress);
        previous_values.progress = Some(session.initial_progress);
    }

    if changes.is_empty() {
        return None;
    }
    Some(Patch {
        id: session.item_id.clone(),
        changes,
        previous_values,
        kind: session.kind.change_kind(),
    })
}
