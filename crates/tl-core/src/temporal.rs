//! Time ↔ pixel mapping.
//!
//! Every zoom level is a fixed pixel density (pixels per day) plus a snap
//! granularity for drag results. The presets are chosen so that the hour view
//! is exactly the day view's density subdivided into 24 hours.
//!
//! All functions here are pure and total: inverted ranges clamp to zero width
//! instead of failing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::item::TimeSpan;
use crate::types::{Instant, MS_PER_DAY, MS_PER_HOUR, ValidationError};

/// Default bar height relative to row height.
pub const DEFAULT_BAR_HEIGHT_RATIO: f64 = 0.65;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f64 = 36.0;

/// Available zoom levels, ordered from coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ZoomLevel {
    Month,
    Week,
    #[default]
    Day,
    Hour,
}

impl ZoomLevel {
    const ORDER: [Self; 4] = [Self::Month, Self::Week, Self::Day, Self::Hour];

    /// Canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// The preset for this level.
    #[must_use]
    pub const fn config(self) -> ZoomConfig {
        match self {
            Self::Hour => ZoomConfig {
                pixels_per_day: 1200.0,
                snap_ms: MS_PER_HOUR,
                primary_unit_days: 1.0,
                secondary_unit_days: 1.0 / 24.0,
                primary_format: "%a %b %-d",
                secondary_format: "%-H:%M",
            },
            Self::Day => ZoomConfig {
                pixels_per_day: 50.0,
                snap_ms: MS_PER_DAY,
                primary_unit_days: 30.0,
                secondary_unit_days: 1.0,
                primary_format: "%b %Y",
                secondary_format: "%-d",
            },
            Self::Week => ZoomConfig {
                pixels_per_day: 15.0,
                snap_ms: MS_PER_DAY,
                primary_unit_days: 30.0,
                secondary_unit_days: 7.0,
                primary_format: "%b %Y",
                secondary_format: "W%V",
            },
            Self::Month => ZoomConfig {
                pixels_per_day: 4.0,
                snap_ms: MS_PER_DAY,
                primary_unit_days: 365.0,
                secondary_unit_days: 30.0,
                primary_format: "%Y",
                secondary_format: "%b",
            },
        }
    }

    /// One step finer, saturating at the hour view.
    #[must_use]
    pub fn zoom_in(self) -> Self {
        let idx = Self::ORDER.iter().position(|z| *z == self).unwrap_or(0);
        Self::ORDER[(idx + 1).min(Self::ORDER.len() - 1)]
    }

    /// One step coarser, saturating at the month view.
    #[must_use]
    pub fn zoom_out(self) -> Self {
        let idx = Self::ORDER.iter().position(|z| *z == self).unwrap_or(0);
        Self::ORDER[idx.saturating_sub(1)]
    }
}

impl fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ZoomLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(ValidationError::UnknownName {
                kind: "zoom level",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for ZoomLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ZoomLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Pixel density and snapping for one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomConfig {
    pub pixels_per_day: f64,
    /// Drag results are rounded to multiples of this.
    pub snap_ms: i64,
    /// Span of one primary (top) header cell, in days.
    pub primary_unit_days: f64,
    /// Span of one secondary (bottom) header cell, in days.
    pub secondary_unit_days: f64,
    /// chrono format string for primary header labels.
    pub primary_format: &'static str,
    /// chrono format string for secondary header labels.
    pub secondary_format: &'static str,
}

impl ZoomConfig {
    /// Milliseconds covered by one pixel.
    pub fn ms_per_pixel(&self) -> f64 {
        ms_per_pixel(self.pixels_per_day)
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        ZoomLevel::default().config()
    }
}

/// Milliseconds covered by one pixel at the given density.
#[allow(clippy::cast_precision_loss)]
pub fn ms_per_pixel(pixels_per_day: f64) -> f64 {
    MS_PER_DAY as f64 / pixels_per_day
}

/// Pixel offset of `t` from `view_start`.
#[allow(clippy::cast_precision_loss)]
pub fn to_pixel(t: Instant, view_start: Instant, pixels_per_day: f64) -> f64 {
    (i128::from(t) - i128::from(view_start)) as f64 / ms_per_pixel(pixels_per_day)
}

/// Instant at pixel offset `px`. The exact inverse of [`to_pixel`].
#[allow(clippy::cast_precision_loss)]
pub fn to_time(px: f64, view_start: Instant, pixels_per_day: f64) -> f64 {
    view_start as f64 + px * ms_per_pixel(pixels_per_day)
}

/// Rounds `t` to the nearest multiple of `snap_ms`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn snap_to_unit(t: f64, snap_ms: i64) -> Instant {
    if snap_ms <= 0 {
        return t.round() as Instant;
    }
    let unit = snap_ms as f64;
    ((t / unit).round() * unit) as Instant
}

/// Total width in pixels of the view. Never negative.
#[allow(clippy::cast_precision_loss)]
pub fn timeline_width(view_start: Instant, view_end: Instant, pixels_per_day: f64) -> f64 {
    let duration = (i128::from(view_end) - i128::from(view_start)).max(0);
    (duration as f64 / MS_PER_DAY as f64 * pixels_per_day).max(0.0)
}

/// Screen rectangle for one item, relative to the chart body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub left: f64,
    pub width: f64,
    pub top: f64,
    pub height: f64,
}

impl Geometry {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// Vertical metrics shared by bar and milestone geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub row_height: f64,
    pub bar_height_ratio: f64,
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            bar_height_ratio: DEFAULT_BAR_HEIGHT_RATIO,
        }
    }
}

impl RowMetrics {
    pub fn bar_height(&self) -> f64 {
        self.row_height * self.bar_height_ratio
    }

    /// Top of a bar vertically centered in a row starting at `row_top`.
    pub fn bar_top(&self, row_top: f64) -> f64 {
        row_top + (self.row_height - self.bar_height()) / 2.0
    }
}

/// Bar geometry for `start..end` in a row starting at `row_top`.
///
/// Inverted ranges produce a zero-width bar at `start`.
pub fn bar_geometry(
    start: Instant,
    end: Instant,
    row_top: f64,
    view_start: Instant,
    pixels_per_day: f64,
    metrics: RowMetrics,
) -> Geometry {
    let left = to_pixel(start, view_start, pixels_per_day);
    let right = to_pixel(end, view_start, pixels_per_day);
    Geometry {
        left,
        width: (right - left).max(0.0),
        top: metrics.bar_top(row_top),
        height: metrics.bar_height(),
    }
}

/// Milestone geometry: a square centered on `at`, side equal to bar height.
pub fn milestone_geometry(
    at: Instant,
    row_top: f64,
    view_start: Instant,
    pixels_per_day: f64,
    metrics: RowMetrics,
) -> Geometry {
    let center = to_pixel(at, view_start, pixels_per_day);
    let size = metrics.bar_height();
    Geometry {
        left: center - size / 2.0,
        width: size,
        top: metrics.bar_top(row_top),
        height: size,
    }
}

/// Whether a horizontal span intersects the viewport, widened by `buffer`.
pub fn is_in_viewport(
    left: f64,
    width: f64,
    viewport_left: f64,
    viewport_width: f64,
    buffer: f64,
) -> bool {
    let right = left + width;
    let viewport_right = viewport_left + viewport_width;
    right >= viewport_left - buffer && left <= viewport_right + buffer
}

/// Time range currently scrolled into view.
pub fn visible_time_range(
    scroll_left: f64,
    viewport_width: f64,
    view_start: Instant,
    pixels_per_day: f64,
) -> (f64, f64) {
    (
        to_time(scroll_left, view_start, pixels_per_day),
        to_time(scroll_left + viewport_width, view_start, pixels_per_day),
    )
}

/// Marker line geometry: a `line_width` wide strip centered on `at`,
/// `height` tall from `top`. `None` when `at` is outside the view.
pub fn marker_geometry(
    at: Instant,
    view: ViewRange,
    pixels_per_day: f64,
    line_width: f64,
    top: f64,
    height: f64,
) -> Option<Geometry> {
    if at < view.start || at > view.end {
        return None;
    }
    let center = to_pixel(at, view.start, pixels_per_day);
    Some(Geometry {
        left: center - line_width / 2.0,
        width: line_width,
        top,
        height: height.max(0.0),
    })
}

/// Start of the UTC day containing `t`, saturating at the range ends.
fn floor_day(t: Instant) -> Instant {
    t.div_euclid(MS_PER_DAY).saturating_mul(MS_PER_DAY)
}

/// The next UTC midnight at or after `t`, saturating at the range ends.
fn ceil_day(t: Instant) -> Instant {
    let days = t.div_euclid(MS_PER_DAY) + i64::from(t.rem_euclid(MS_PER_DAY) != 0);
    days.saturating_mul(MS_PER_DAY)
}

/// The time window the chart is laid out against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRange {
    pub start: Instant,
    pub end: Instant,
}

impl ViewRange {
    pub const fn new(start: Instant, end: Instant) -> Self {
        Self { start, end }
    }

    /// A view spanning all items with `padding_days` either side, aligned to
    /// whole UTC days. With no items, the current UTC month.
    pub fn around<T: TimeSpan>(items: &[T], padding_days: i64) -> Self {
        let min = items.iter().map(TimeSpan::start).min();
        let max = items.iter().map(TimeSpan::end).max();
        match (min, max) {
            (Some(min), Some(max)) => {
                let padding = padding_days.saturating_mul(MS_PER_DAY);
                Self {
                    start: floor_day(min.saturating_sub(padding)),
                    end: ceil_day(max.saturating_add(padding)),
                }
            }
            _ => Self::current_month(),
        }
    }

    fn current_month() -> Self {
        let today = Utc::now().date_naive();
        let first = today.with_day(1).unwrap_or(today);
        let next = next_month(first);
        Self {
            start: date_ms(first),
            end: date_ms(next),
        }
    }

    /// Width of the view in pixels at the given density.
    pub fn width(&self, pixels_per_day: f64) -> f64 {
        timeline_width(self.start, self.end, pixels_per_day)
    }
}

/// One cell of the two-row time header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderCell {
    pub start: Instant,
    pub end: Instant,
    pub left: f64,
    pub width: f64,
    pub label: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub weekend: bool,
}

/// Primary (top) and secondary (bottom) header rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeaderCells {
    pub primary: Vec<HeaderCell>,
    pub secondary: Vec<HeaderCell>,
}

/// Calendar unit used to step through header cells.
#[derive(Debug, Clone, Copy)]
enum HeaderUnit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl HeaderUnit {
    fn floor(self, dt: DateTime<Utc>) -> DateTime<Utc> {
        let date = dt.date_naive();
        match self {
            Self::Hour => at_midnight(date) + Duration::hours(i64::from(dt.hour())),
            Self::Day => at_midnight(date),
            Self::Week => {
                let back = i64::from(date.weekday().num_days_from_monday());
                at_midnight(date - Duration::days(back))
            }
            Self::Month => at_midnight(date.with_day(1).unwrap_or(date)),
            Self::Year => at_midnight(NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)),
        }
    }

    fn next(self, dt: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Hour => dt + Duration::hours(1),
            Self::Day => dt + Duration::days(1),
            Self::Week => dt + Duration::days(7),
            Self::Month => at_midnight(next_month(dt.date_naive())),
            Self::Year => at_midnight(
                NaiveDate::from_ymd_opt(dt.year() + 1, 1, 1).unwrap_or(dt.date_naive()),
            ),
        }
    }
}

fn at_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn date_ms(date: NaiveDate) -> Instant {
    at_midnight(date).timestamp_millis()
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(date + Duration::days(30))
}

/// Builds header cells covering `view`, aligned to UTC calendar boundaries.
///
/// Labels use the level's chrono format strings; locale-aware formatting is
/// left to the renderer.
pub fn header_cells(view: ViewRange, level: ZoomLevel) -> HeaderCells {
    let config = level.config();
    let (primary_unit, secondary_unit) = match level {
        ZoomLevel::Hour => (HeaderUnit::Day, HeaderUnit::Hour),
        ZoomLevel::Day => (HeaderUnit::Month, HeaderUnit::Day),
        ZoomLevel::Week => (HeaderUnit::Month, HeaderUnit::Week),
        ZoomLevel::Month => (HeaderUnit::Year, HeaderUnit::Month),
    };
    HeaderCells {
        primary: cells_for(view, &config, primary_unit, config.primary_format, false),
        secondary: cells_for(
            view,
            &config,
            secondary_unit,
            config.secondary_format,
            matches!(secondary_unit, HeaderUnit::Day),
        ),
    }
}

fn cells_for(
    view: ViewRange,
    config: &ZoomConfig,
    unit: HeaderUnit,
    format: &str,
    mark_weekends: bool,
) -> Vec<HeaderCell> {
    let Some(view_start) = DateTime::<Utc>::from_timestamp_millis(view.start) else {
        return Vec::new();
    };
    let mut cells = Vec::new();
    let mut current = unit.floor(view_start);
    while current.timestamp_millis() < view.end {
        let next = unit.next(current);
        let start = current.timestamp_millis();
        let end = next.timestamp_millis();
        if end <= start {
            break;
        }
        let left = to_pixel(start, view.start, config.pixels_per_day);
        cells.push(HeaderCell {
            start,
            end,
            left,
            width: to_pixel(end, view.start, config.pixels_per_day) - left,
            label: current.format(format).to_string(),
            weekend: mark_weekends && current.weekday().num_days_from_monday() >= 5,
        });
        current = next;
    }
    cells
}
