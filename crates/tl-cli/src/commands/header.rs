//! Header command: the two-row time axis.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tl_core::temporal::header_cells;
use tl_core::{ChartDocument, HeaderCell, HeaderCells, ViewRange, ZoomLevel};

use super::util::resolve_view;
use crate::Config;

/// Options for `tl header`.
#[derive(Debug, Clone, Default)]
pub struct HeaderArgs {
    pub zoom: Option<ZoomLevel>,
    pub view_start: Option<String>,
    pub view_end: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct HeaderReport {
    zoom: ZoomLevel,
    view: ViewRange,
    width: f64,
    #[serde(flatten)]
    cells: HeaderCells,
}

pub fn run<W: Write>(
    writer: &mut W,
    doc: &ChartDocument,
    args: &HeaderArgs,
    config: &Config,
) -> Result<()> {
    let zoom = args.zoom.unwrap_or(config.zoom);
    let view = resolve_view(
        &doc.items,
        args.view_start.as_deref(),
        args.view_end.as_deref(),
        config.view_padding_days,
    )?;
    let cells = header_cells(view, zoom);
    let width = view.width(zoom.config().pixels_per_day);

    if args.json {
        let report = HeaderReport {
            zoom,
            view,
            width,
            cells,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(writer, "{zoom} view, {width:.0} px")?;
    write_row(writer, &cells.primary)?;
    write_row(writer, &cells.secondary)?;
    Ok(())
}

fn write_row<W: Write>(writer: &mut W, cells: &[HeaderCell]) -> std::io::Result<()> {
    let line = cells
        .iter()
        .map(|c| {
            let mark = if c.weekend { "*" } else { "" };
            format!("{}{mark}@{:.0}", c.label, c.left)
        })
        .collect::<Vec<_>>()
        .join(" | ");
    writeln!(writer, "{line}")
}
