//! Resource utilization over the visible window.

use serde::{Deserialize, Serialize};

use crate::item::WorkItem;
use crate::types::{Instant, MS_PER_HOUR, ResourceId, instant_serde};

/// Utilization is reported up to this ratio.
pub const MAX_REPORTED_UTILIZATION: f64 = 2.0;

/// Default ratio at which a resource shows as busy.
pub const DEFAULT_WARNING_THRESHOLD: f64 = 0.8;

/// Default ratio at which a resource shows as over capacity.
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 1.0;

/// A span nobody works in, for one resource or (without one) everyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonWorkingPeriod {
    #[serde(with = "instant_serde")]
    pub start: Instant,

    #[serde(with = "instant_serde")]
    pub end: Instant,

    #[serde(default, alias = "resourceId", skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NonWorkingPeriod {
    fn applies_to(&self, resource: &ResourceId) -> bool {
        self.resource_id.as_ref().is_none_or(|r| r == resource)
    }
}

/// Load of one resource over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityInfo {
    pub resource_id: ResourceId,

    /// Allocated over available, capped at [`MAX_REPORTED_UTILIZATION`].
    pub utilization: f64,

    pub allocated_hours: f64,
    pub available_hours: f64,

    /// Uncapped utilization above 1.
    pub overloaded: bool,
}

impl CapacityInfo {
    pub fn status(&self) -> CapacityStatus {
        CapacityStatus::classify(
            self.utilization,
            DEFAULT_WARNING_THRESHOLD,
            DEFAULT_CRITICAL_THRESHOLD,
        )
    }
}

/// Display bucket for a utilization ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityStatus {
    Normal,
    Warning,
    Critical,
}

impl CapacityStatus {
    pub fn classify(utilization: f64, warning: f64, critical: f64) -> Self {
        if utilization >= critical {
            Self::Critical
        } else if utilization >= warning {
            Self::Warning
        } else {
            Self::Normal
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

fn clipped(start: Instant, end: Instant, view_start: Instant, view_end: Instant) -> i64 {
    end.min(view_end).saturating_sub(start.max(view_start)).max(0)
}

/// Computes how loaded `resource_id` is between `view_start` and `view_end`.
///
/// Item time is clipped to the window. Available time is the window minus
/// every non-working period that is global or specific to this resource.
#[allow(clippy::cast_precision_loss)]
pub fn capacity<T: AsRef<WorkItem>>(
    resource_id: &ResourceId,
    items: &[T],
    view_start: Instant,
    view_end: Instant,
    non_working: &[NonWorkingPeriod],
) -> CapacityInfo {
    let allocated_ms: i64 = items
        .iter()
        .map(AsRef::<WorkItem>::as_ref)
        .filter(|i| i.resource_id.as_ref() == Some(resource_id))
        .map(|i| clipped(i.start, i.end, view_start, view_end))
        .fold(0, i64::saturating_add);

    let blocked_ms: i64 = non_working
        .iter()
        .filter(|p| p.applies_to(resource_id))
        .map(|p| clipped(p.start, p.end, view_start, view_end))
        .fold(0, i64::saturating_add);
    let available_ms = view_end.saturating_sub(view_start).saturating_sub(blocked_ms);

    let utilization = if available_ms > 0 {
        allocated_ms as f64 / available_ms as f64
    } else {
        0.0
    };

    CapacityInfo {
        resource_id: resource_id.clone(),
        utilization: utilization.min(MAX_REPORTED_UTILIZATION),
        allocated_hours: allocated_ms as f64 / MS_PER_HOUR as f64,
        available_hours: available_ms as f64 / MS_PER_HOUR as f64,
        overloaded: utilization > 1.0,
    }
}
