//! Layout command: task view geometry.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tl_core::hierarchy::find_item;
use tl_core::{
    AllRows, ChartDocument, ChartLayout, LayoutOptions, MarkerLine, NormalizeOptions, ViewRange,
    ZoomLevel, global_marker_lines, normalize, row_marker_lines,
};

use super::util::{label, resolve_view, short_time};
use crate::Config;

/// Options for `tl layout`.
#[derive(Debug, Clone, Default)]
pub struct LayoutArgs {
    pub zoom: Option<ZoomLevel>,
    pub view_start: Option<String>,
    pub view_end: Option<String>,
    pub sync_parent_dates: bool,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct LayoutReport {
    zoom: ZoomLevel,
    view: ViewRange,
    #[serde(flatten)]
    layout: ChartLayout,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    markers: Vec<MarkerLine>,
}

pub fn run<W: Write>(
    writer: &mut W,
    doc: &ChartDocument,
    args: &LayoutArgs,
    config: &Config,
) -> Result<()> {
    let zoom = args.zoom.unwrap_or(config.zoom);
    let view = resolve_view(
        &doc.items,
        args.view_start.as_deref(),
        args.view_end.as_deref(),
        config.view_padding_days,
    )?;

    let normalized = normalize(
        &doc.items,
        NormalizeOptions {
            sync_parent_dates: args.sync_parent_dates || config.sync_parent_dates,
        },
    );
    let options = LayoutOptions {
        view,
        zoom: zoom.config(),
        metrics: config.row_metrics(),
    };
    let layout = tl_core::layout::task_rows(&normalized, &options, &AllRows);
    let mut markers = global_marker_lines(&doc.markers, &options, layout.height);
    markers.extend(row_marker_lines(&normalized, &doc.task_markers, &options));
    tracing::debug!(rows = layout.row_count, markers = markers.len(), %zoom, "laid out task view");

    if args.json {
        let report = LayoutReport {
            zoom,
            view,
            layout,
            markers,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(
        writer,
        "view {} .. {} ({zoom}, {} px/day)",
        short_time(view.start),
        short_time(view.end),
        options.zoom.pixels_per_day
    )?;
    writeln!(
        writer,
        "{:.0} x {:.0} px, {} rows",
        layout.width, layout.height, layout.row_count
    )?;
    for placed in &layout.items {
        let Some(node) = find_item(&normalized, placed.id.as_str()) else {
            continue;
        };
        let indent = "  ".repeat(node.depth);
        let mut extra = String::new();
        if placed.milestone {
            extra.push_str(" milestone");
        } else if node.item.progress.value() > 0.0 {
            extra = format!(" {}", node.item.progress);
        }
        if node.has_children && node.item.collapsed {
            extra.push_str(" (collapsed)");
        }
        writeln!(
            writer,
            "{:>3}  {indent}{}  x={:.1} w={:.1}{extra}",
            placed.row,
            label(&node.item),
            placed.geometry.left,
            placed.geometry.width,
        )?;
    }
    for line in &markers {
        let scope = line
            .item_id
            .as_ref()
            .map_or_else(String::new, |id| format!(" on {id}"));
        let text = line
            .label
            .as_ref()
            .map_or_else(String::new, |l| format!(" {l:?}"));
        writeln!(
            writer,
            "mark {}  x={:.1}{scope}{text}",
            line.id,
            line.geometry.center_x()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn doc() -> ChartDocument {
        ChartDocument::from_json(
            r#"[
                {"id": "p", "title": "Project", "type": "group", "start": "2024-01-01", "end": "2024-01-05"},
                {"id": "d", "title": "Design", "parentId": "p", "start": "2024-01-01", "end": "2024-01-03", "progress": 0.5},
                {"id": "b", "title": "Build", "parentId": "p", "start": "2024-01-03", "end": "2024-01-06"},
                {"id": "r", "title": "Release", "type": "milestone", "start": "2024-01-06", "end": "2024-01-06"}
            ]"#,
        )
        .unwrap()
    }

    fn render(doc: &ChartDocument, args: &LayoutArgs) -> String {
        let mut out = Vec::new();
        run(&mut out, doc, args, &Config::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn window() -> LayoutArgs {
        LayoutArgs {
            view_start: Some("2024-01-01".into()),
            view_end: Some("2024-01-08".into()),
            ..LayoutArgs::default()
        }
    }

    #[test]
    fn layout_renders_rows_with_indent() {
        assert_snapshot!(render(&doc(), &window()), @r"
        view 2024-01-01 .. 2024-01-08 (day, 50 px/day)
        350 x 144 px, 4 rows
          0  Project  x=0.0 w=200.0
          1    Design  x=0.0 w=100.0 50%
          2    Build  x=100.0 w=150.0
          3  Release  x=238.3 w=23.4 milestone
        ");
    }

    #[test]
    fn collapsed_group_hides_children() {
        let mut doc = doc();
        doc.items[0].collapsed = true;
        let out = render(&doc, &window());
        assert!(out.contains("2 rows"));
        assert!(out.contains("Project  x=0.0 w=200.0 (collapsed)"));
        assert!(!out.contains("Design"));
    }

    #[test]
    fn sync_parent_dates_stretches_group() {
        let args = LayoutArgs {
            sync_parent_dates: true,
            ..window()
        };
        let out = render(&doc(), &args);
        assert!(out.contains("Project  x=0.0 w=250.0"));
    }

    #[test]
    fn markers_follow_the_rows() {
        let doc = ChartDocument::from_json(
            r#"{
                "items": [
                    {"id": "d", "title": "Design", "start": "2024-01-01", "end": "2024-01-03"},
                    {"id": "b", "title": "Build", "start": "2024-01-03", "end": "2024-01-06", "deadline": "2024-01-05"}
                ],
                "markers": [
                    {"id": "kickoff", "timestamp": "2024-01-02", "label": "Kickoff"},
                    {"id": "someday", "timestamp": "2025-01-01"}
                ],
                "taskMarkers": [{"taskId": "d", "id": "review", "timestamp": "2024-01-02T12:00:00Z"}]
            }"#,
        )
        .unwrap();
        assert_snapshot!(render(&doc, &window()), @r#"
        view 2024-01-01 .. 2024-01-08 (day, 50 px/day)
        350 x 72 px, 2 rows
          0  Design  x=0.0 w=100.0
          1  Build  x=100.0 w=150.0
        mark kickoff  x=50.0 "Kickoff"
        mark review  x=75.0 on d
        mark deadline-b  x=200.0 on b
        "#);

        let args = LayoutArgs {
            json: true,
            ..window()
        };
        let value: serde_json::Value = serde_json::from_str(&render(&doc, &args)).unwrap();
        assert_eq!(value["markers"].as_array().unwrap().len(), 3);
        assert_eq!(value["markers"][0]["height"], 72.0);
        assert_eq!(value["markers"][2]["item_id"], "b");
        assert_eq!(value["markers"][2]["top"], 36.0);
    }

    #[test]
    fn json_output_includes_geometry() {
        let args = LayoutArgs {
            json: true,
            ..window()
        };
        let value: serde_json::Value = serde_json::from_str(&render(&doc(), &args)).unwrap();
        assert_eq!(value["zoom"], "day");
        assert_eq!(value["row_count"], 4);
        assert_eq!(value["items"][1]["id"], "d");
        assert_eq!(value["items"][1]["progress_width"], 50.0);
    }
}
