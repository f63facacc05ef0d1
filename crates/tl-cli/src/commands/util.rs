//! Shared utilities for CLI commands.

use std::io::{self, Write};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use tl_core::{ChartDocument, Instant, MS_PER_DAY, Patch, ViewRange, WorkItem, parse_instant};

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+(ago|from now)$")
        .unwrap_or_else(|e| unreachable!("static pattern is valid: {e}"))
});

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

const MS_PER_MINUTE: i64 = 60_000;

/// Parses an instant given on the command line.
///
/// Supports everything a document accepts plus relative phrases such as
/// "2 hours ago" or "3 weeks from now", resolved against `now`.
pub fn parse_time_arg(s: &str, now: Instant) -> Result<Instant> {
    let s = s.trim();
    if let Ok(t) = parse_instant(s) {
        return Ok(t);
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "invalid time: {s}. Use epoch ms, YYYY-MM-DD, RFC 3339 or relative (e.g. '2 days ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let minutes_per_unit = match &caps[2] {
        "minute" => 1,
        "hour" => 60,
        "day" => 60 * 24,
        "week" => 60 * 24 * 7,
        unit => anyhow::bail!("unknown time unit: {unit}"),
    };

    if n > MAX_RELATIVE_MINUTES / minutes_per_unit {
        anyhow::bail!("relative time value too large: {n} {}", &caps[2]);
    }

    let offset = n * minutes_per_unit * MS_PER_MINUTE;
    Ok(if &caps[3] == "ago" {
        now.saturating_sub(offset)
    } else {
        now.saturating_add(offset)
    })
}

/// Current time in epoch milliseconds.
pub fn now() -> Instant {
    Utc::now().timestamp_millis()
}

/// Resolves the view window from optional bounds, padding around the items
/// for whichever side is missing.
pub fn resolve_view(
    items: &[WorkItem],
    start: Option<&str>,
    end: Option<&str>,
    padding_days: i64,
) -> Result<ViewRange> {
    let fallback = ViewRange::around(items, padding_days);
    let now = now();
    let start = start
        .map(|s| parse_time_arg(s, now))
        .transpose()
        .context("invalid --view-start")?
        .unwrap_or(fallback.start);
    let end = end
        .map(|s| parse_time_arg(s, now))
        .transpose()
        .context("invalid --view-end")?
        .unwrap_or(fallback.end);
    if end <= start {
        anyhow::bail!("view end must be after view start");
    }
    if end.saturating_sub(start) / MS_PER_DAY > 366 * 20 {
        anyhow::bail!("view range is too large");
    }
    Ok(ViewRange::new(start, end))
}

/// Reads a chart document from disk.
pub fn load_document(path: &Path) -> Result<ChartDocument> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc = ChartDocument::from_json(&json)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        items = doc.items.len(),
        resources = doc.resources.len(),
        "loaded document"
    );
    Ok(doc)
}

/// Writes a chart document back to disk as pretty JSON.
pub fn save_document(path: &Path, doc: &ChartDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(doc).context("failed to serialize document")?;
    std::fs::write(path, json + "\n").with_context(|| format!("failed to write {}", path.display()))
}

/// Display label for an item: its title, or its ID when untitled.
pub fn label(item: &WorkItem) -> &str {
    if item.title.is_empty() {
        item.id.as_str()
    } else {
        &item.title
    }
}

/// Formats an instant as a date when it falls on midnight UTC.
pub fn short_time(t: Instant) -> String {
    let full = tl_core::format_instant(t);
    if t.rem_euclid(MS_PER_DAY) == 0 {
        full.split('T').next().unwrap_or(&full).to_string()
    } else {
        full
    }
}

/// Prints a patch as one line per changed field, old value first.
pub fn write_patch<W: Write>(writer: &mut W, patch: &Patch) -> io::Result<()> {
    writeln!(writer, "{} {}", patch.kind, patch.id)?;
    let (new, old) = (&patch.changes, &patch.previous_values);
    if let (Some(to), Some(from)) = (new.start, old.start) {
        writeln!(writer, "  start {} -> {}", short_time(from), short_time(to))?;
    }
    if let (Some(to), Some(from)) = (new.end, old.end) {
        writeln!(writer, "  end {} -> {}", short_time(from), short_time(to))?;
    }
    if let (Some(to), Some(from)) = (new.progress, old.progress) {
        writeln!(writer, "  progress {from} -> {to}")?;
    }
    if let (Some(to), Some(from)) = (new.collapsed, old.collapsed) {
        writeln!(writer, "  collapsed {from} -> {to}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_core::MS_PER_HOUR;

    const NOW: Instant = 10 * MS_PER_DAY;

    #[test]
    fn parses_absolute_forms() {
        assert_eq!(parse_time_arg("1970-01-02", NOW).unwrap(), MS_PER_DAY);
        assert_eq!(parse_time_arg("42", NOW).unwrap(), 42);
    }

    #[test]
    fn parses_relative_phrases() {
        assert_eq!(parse_time_arg("2 hours ago", NOW).unwrap(), NOW - 2 * MS_PER_HOUR);
        assert_eq!(parse_time_arg("1 day ago", NOW).unwrap(), NOW - MS_PER_DAY);
        assert_eq!(
            parse_time_arg("2 weeks from now", NOW).unwrap(),
            NOW + 14 * MS_PER_DAY
        );
        assert_eq!(parse_time_arg("30 minutes ago", NOW).unwrap(), NOW - 30 * 60_000);
    }

    #[test]
    fn rejects_garbage_and_overflow() {
        assert!(parse_time_arg("yesterday", NOW).is_err());
        assert!(parse_time_arg("99999999999 weeks ago", NOW).is_err());
    }

    #[test]
    fn view_defaults_pad_around_items() {
        let items = vec![WorkItem::task(
            tl_core::ItemId::new("a").unwrap(),
            "a",
            3 * MS_PER_DAY,
            4 * MS_PER_DAY,
        )];
        let view = resolve_view(&items, None, None, 1).unwrap();
        assert_eq!(view, ViewRange::new(2 * MS_PER_DAY, 5 * MS_PER_DAY));

        let view = resolve_view(&items, Some("1970-01-01"), None, 1).unwrap();
        assert_eq!(view.start, 0);

        assert!(resolve_view(&items, Some("1970-01-09"), Some("1970-01-02"), 1).is_err());
    }

    #[test]
    fn extreme_bounds_are_rejected_without_overflow() {
        let min = i64::MIN.to_string();
        let max = i64::MAX.to_string();
        let err = resolve_view(&[], Some(&min), Some(&max), 1).unwrap_err();
        assert!(err.to_string().contains("too large"));

        assert_eq!(
            parse_time_arg("1 week ago", i64::MIN + 1).unwrap(),
            i64::MIN
        );
        assert_eq!(
            parse_time_arg("1 week from now", i64::MAX - 1).unwrap(),
            i64::MAX
        );
    }

    #[test]
    fn short_time_drops_midnight() {
        assert_eq!(short_time(MS_PER_DAY), "1970-01-02");
        assert_eq!(short_time(MS_PER_DAY + MS_PER_HOUR), "1970-01-02T01:00:00Z");
    }
}
