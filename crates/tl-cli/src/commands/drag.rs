//! Drag command: one simulated press, move and release.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tl_core::hierarchy::find_item;
use tl_core::{
    ChangeLog, ChartDocument, DragEngine, DragKind, DragOptions, DragPreview, NormalizeOptions,
    Patch, ZoomLevel, normalize,
};

use super::util::{short_time, write_patch};
use crate::Config;

/// Options for `tl drag`.
#[derive(Debug, Clone)]
pub struct DragArgs {
    pub item: String,
    pub kind: DragKind,
    pub dx: f64,
    pub dy: f64,
    pub zoom: Option<ZoomLevel>,
    pub apply: bool,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct DragReport<'a> {
    dragging: bool,
    preview: Option<DragPreview>,
    patch: Option<&'a Patch>,
    applied: bool,
}

/// Runs the drag against the rows as laid out. Returns true when `doc` was
/// modified.
pub fn run<W: Write>(
    writer: &mut W,
    doc: &mut ChartDocument,
    args: &DragArgs,
    config: &Config,
) -> Result<bool> {
    let zoom = args.zoom.unwrap_or(config.zoom);
    let mut engine = DragEngine::new(DragOptions {
        editable: config.editable,
        zoom: zoom.config(),
        threshold_px: config.drag_threshold_px,
    });

    // Previous values must be the dates the layout shows, so drive the
    // engine with the normalized rows rather than the raw items.
    let normalized = normalize(
        &doc.items,
        NormalizeOptions {
            sync_parent_dates: config.sync_parent_dates,
        },
    );
    let Some(node) = find_item(&normalized, &args.item) else {
        anyhow::bail!("unknown item: {}", args.item);
    };
    if !node.visible {
        anyhow::bail!("item {} is hidden by a collapsed group", args.item);
    }

    if !engine.start(&normalized, &args.item, args.kind, 0.0, 0.0) {
        anyhow::bail!("chart is not editable (editable = false in config)");
    }
    engine.move_to(args.dx, args.dy);
    let dragging = engine.is_dragging();
    let preview = engine.preview(&normalized, &args.item);

    let mut log = ChangeLog::default();
    let patch = engine.end_into(&normalized, &mut log);
    let applied = args.apply && log.patches.iter().any(|p| p.apply(&mut doc.items));
    if applied {
        tracing::info!(item = %args.item, kind = %args.kind, "applied drag");
    }

    if args.json {
        let report = DragReport {
            dragging,
            preview,
            patch: patch.as_ref(),
            applied,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(applied);
    }

    if !dragging {
        writeln!(
            writer,
            "No drag: pointer stayed within {} px.",
            config.drag_threshold_px
        )?;
        return Ok(false);
    }
    match &patch {
        Some(patch) => write_patch(writer, patch)?,
        None => {
            if let Some(preview) = preview {
                writeln!(
                    writer,
                    "No change: {} .. {}",
                    short_time(preview.start),
                    short_time(preview.end)
                )?;
            }
        }
    }
    if applied {
        writeln!(writer, "Applied.")?;
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn doc() -> ChartDocument {
        ChartDocument::from_json(
            r#"[
                {"id": "a", "title": "Alpha", "start": "2024-01-01", "end": "2024-01-05"},
                {"id": "b", "title": "Beta", "start": "2024-01-02", "end": "2024-01-03"}
            ]"#,
        )
        .unwrap()
    }

    fn args(kind: DragKind, dx: f64) -> DragArgs {
        DragArgs {
            item: "a".into(),
            kind,
            dx,
            dy: 0.0,
            zoom: None,
            apply: false,
            json: false,
        }
    }

    fn render(doc: &mut ChartDocument, args: &DragArgs, config: &Config) -> (String, bool) {
        let mut out = Vec::new();
        let changed = run(&mut out, doc, args, config).unwrap();
        (String::from_utf8(out).unwrap(), changed)
    }

    #[test]
    fn move_by_two_days() {
        let mut doc = doc();
        let (out, changed) = render(&mut doc, &args(DragKind::Move, 100.0), &Config::default());
        assert!(!changed);
        assert_snapshot!(out, @r"
        drag-move a
          start 2024-01-01 -> 2024-01-03
          end 2024-01-05 -> 2024-01-07
        ");
        assert_eq!(doc, self::doc());
    }

    #[test]
    fn resize_end_clamps_to_one_unit() {
        let mut doc = doc();
        let (out, _) = render(&mut doc, &args(DragKind::ResizeEnd, -500.0), &Config::default());
        assert_snapshot!(out, @r"
        drag-resize-end a
          end 2024-01-05 -> 2024-01-02
        ");
    }

    #[test]
    fn progress_follows_bar_width() {
        let mut doc = doc();
        let (out, _) = render(&mut doc, &args(DragKind::Progress, 50.0), &Config::default());
        assert_snapshot!(out, @r"
        progress a
          progress 0% -> 25%
        ");
    }

    #[test]
    fn small_motion_is_a_click() {
        let mut doc = doc();
        let (out, changed) = render(&mut doc, &args(DragKind::Move, 2.0), &Config::default());
        assert!(!changed);
        assert_eq!(out, "No drag: pointer stayed within 3 px.\n");
    }

    #[test]
    fn motion_under_half_a_day_changes_nothing() {
        let mut doc = doc();
        let (out, _) = render(&mut doc, &args(DragKind::Move, 20.0), &Config::default());
        assert_eq!(out, "No change: 2024-01-01 .. 2024-01-05\n");
    }

    #[test]
    fn apply_writes_patch_into_document() {
        let mut doc = doc();
        let args = DragArgs {
            apply: true,
            ..args(DragKind::Move, -50.0)
        };
        let (out, changed) = render(&mut doc, &args, &Config::default());
        assert!(changed);
        assert!(out.ends_with("Applied.\n"));
        let expected = tl_core::parse_instant("2023-12-31").unwrap();
        assert_eq!(doc.items[0].start, expected);
    }

    #[test]
    fn hour_zoom_snaps_to_hours() {
        let mut doc = doc();
        let args = DragArgs {
            zoom: Some(ZoomLevel::Hour),
            ..args(DragKind::Move, 100.0)
        };
        let (out, _) = render(&mut doc, &args, &Config::default());
        assert!(out.contains("start 2024-01-01 -> 2024-01-01T02:00:00Z"));
    }

    #[test]
    fn read_only_and_unknown_items_are_errors() {
        let config = Config {
            editable: false,
            ..Config::default()
        };
        let err = run(&mut Vec::<u8>::new(), &mut doc(), &args(DragKind::Move, 100.0), &config)
            .unwrap_err();
        assert!(err.to_string().contains("not editable"));

        let missing = DragArgs {
            item: "zzz".into(),
            ..args(DragKind::Move, 100.0)
        };
        let err = run(&mut Vec::<u8>::new(), &mut doc(), &missing, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("unknown item"));
    }

    #[test]
    fn hidden_items_cannot_be_dragged() {
        let mut doc = ChartDocument::from_json(
            r#"[
                {"id": "g", "type": "group", "collapsed": true, "start": "2024-01-01", "end": "2024-01-05"},
                {"id": "a", "parentId": "g", "start": "2024-01-01", "end": "2024-01-05"}
            ]"#,
        )
        .unwrap();
        let before = doc.clone();
        let args = DragArgs {
            apply: true,
            ..args(DragKind::Move, 100.0)
        };
        let err = run(&mut Vec::<u8>::new(), &mut doc, &args, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("hidden by a collapsed group"));
        assert_eq!(doc, before);
    }

    #[test]
    fn synced_group_reports_the_dates_it_shows() {
        let mut doc = ChartDocument::from_json(
            r#"[
                {"id": "a", "type": "group", "start": "2024-01-01", "end": "2024-01-02"},
                {"id": "c", "parentId": "a", "start": "2024-01-03", "end": "2024-01-06"}
            ]"#,
        )
        .unwrap();
        let config = Config {
            sync_parent_dates: true,
            ..Config::default()
        };
        let args = DragArgs {
            apply: true,
            ..args(DragKind::Move, 50.0)
        };
        let (out, changed) = render(&mut doc, &args, &config);
        assert_snapshot!(out, @r"
        drag-move a
          start 2024-01-03 -> 2024-01-04
          end 2024-01-06 -> 2024-01-07
        Applied.
        ");
        assert!(changed);
        let expected = tl_core::parse_instant("2024-01-04").unwrap();
        assert_eq!(doc.items[0].start, expected);
    }

    #[test]
    fn json_report_carries_patch() {
        let mut doc = doc();
        let args = DragArgs {
            json: true,
            ..args(DragKind::Move, 100.0)
        };
        let (out, _) = render(&mut doc, &args, &Config::default());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["dragging"], true);
        assert_eq!(value["patch"]["kind"], "drag-move");
        assert_eq!(value["patch"]["id"], "a");
        assert_eq!(value["applied"], false);
    }
}
