//! Resources command: resource rows with lanes and utilization.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tl_core::{
    CapacityInfo, ChartDocument, ResourceRow, ResourceRowOptions, ViewRange, capacity,
    resource_rows,
};

use super::util::{resolve_view, short_time};
use crate::Config;

/// Options for `tl resources`.
#[derive(Debug, Clone, Default)]
pub struct ResourcesArgs {
    pub group_by_group: bool,
    pub hide_empty: bool,
    pub collapsed_groups: Vec<String>,
    pub view_start: Option<String>,
    pub view_end: Option<String>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ResourcesReport<'a> {
    view: ViewRange,
    rows: &'a [ResourceRow],
    capacity: Vec<CapacityInfo>,
}

pub fn run<W: Write>(
    writer: &mut W,
    doc: &ChartDocument,
    args: &ResourcesArgs,
    config: &Config,
) -> Result<()> {
    let view = resolve_view(
        &doc.items,
        args.view_start.as_deref(),
        args.view_end.as_deref(),
        config.view_padding_days,
    )?;
    let options = ResourceRowOptions {
        group_by_group: args.group_by_group,
        show_empty: !args.hide_empty,
        collapsed_groups: args.collapsed_groups.clone(),
        row_height: config.row_height,
    };
    let rows = resource_rows(&doc.resources, &doc.items, &options);
    let loads: Vec<CapacityInfo> = rows
        .iter()
        .filter_map(|row| match row {
            ResourceRow::Resource { resource, .. } => Some(capacity(
                &resource.id,
                &doc.items,
                view.start,
                view.end,
                &doc.non_working,
            )),
            ResourceRow::Group { .. } => None,
        })
        .collect();
    tracing::debug!(rows = rows.len(), "built resource rows");

    if args.json {
        let report = ResourcesReport {
            view,
            rows: &rows,
            capacity: loads,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    if rows.is_empty() {
        writeln!(writer, "No resources.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "view {} .. {}",
        short_time(view.start),
        short_time(view.end)
    )?;
    let mut loads = loads.iter();
    for row in &rows {
        match row {
            ResourceRow::Group {
                name,
                collapsed,
                start,
                end,
                ..
            } => {
                let span = match (start, end) {
                    (Some(s), Some(e)) => format!("  {} .. {}", short_time(*s), short_time(*e)),
                    _ => String::new(),
                };
                let state = if *collapsed { " (collapsed)" } else { "" };
                writeln!(writer, "[{name}]{state}{span}")?;
            }
            ResourceRow::Resource {
                resource,
                depth,
                lane_count,
                height,
                ..
            } => {
                let indent = "  ".repeat(*depth);
                let name = if resource.name.is_empty() {
                    resource.id.as_str()
                } else {
                    &resource.name
                };
                let lanes = match *lane_count {
                    0 => "no items".to_string(),
                    1 => "1 lane".to_string(),
                    n => format!("{n} lanes"),
                };
                let load = loads.next().map_or_else(String::new, |info| {
                    let flag = if info.overloaded { " overloaded" } else { "" };
                    format!(
                        "  {:.0}% {}{flag}",
                        info.utilization * 100.0,
                        info.status().as_str()
                    )
                });
                writeln!(writer, "{indent}{name}  {lanes}  {height:.0} px{load}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn doc() -> ChartDocument {
        ChartDocument::from_json(
            r#"{
                "resources": [
                    {"id": "alice", "name": "Alice", "group": "Eng"},
                    {"id": "carol", "name": "Carol"},
                    {"id": "bob", "name": "Bob", "group": "Eng"}
                ],
                "items": [
                    {"id": "a", "resourceId": "alice", "start": "2024-01-01", "end": "2024-01-05"},
                    {"id": "b", "resourceId": "alice", "start": "2024-01-03", "end": "2024-01-07"},
                    {"id": "c", "resourceId": "bob", "start": "2024-01-02", "end": "2024-01-03"}
                ],
                "nonWorking": [
                    {"start": "2024-01-06", "end": "2024-01-07", "label": "holiday"}
                ]
            }"#,
        )
        .unwrap()
    }

    fn window() -> ResourcesArgs {
        ResourcesArgs {
            view_start: Some("2024-01-01".into()),
            view_end: Some("2024-01-11".into()),
            ..ResourcesArgs::default()
        }
    }

    fn render(args: &ResourcesArgs) -> String {
        let mut out = Vec::new();
        run(&mut out, &doc(), args, &Config::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn flat_rows_in_resource_order() {
        assert_snapshot!(render(&window()), @r"
        view 2024-01-01 .. 2024-01-11
        Alice  2 lanes  72 px  89% warning
        Carol  no items  36 px  0% normal
        Bob  1 lane  36 px  11% normal
        ");
    }

    #[test]
    fn grouped_rows_put_groups_first() {
        let args = ResourcesArgs {
            group_by_group: true,
            ..window()
        };
        assert_snapshot!(render(&args), @r"
        view 2024-01-01 .. 2024-01-11
        [Eng]  2024-01-01 .. 2024-01-07
          Alice  2 lanes  72 px  89% warning
          Bob  1 lane  36 px  11% normal
        Carol  no items  36 px  0% normal
        ");
    }

    #[test]
    fn collapsed_group_hides_members_and_empty_are_dropped() {
        let args = ResourcesArgs {
            group_by_group: true,
            hide_empty: true,
            collapsed_groups: vec!["Eng".into()],
            ..window()
        };
        assert_snapshot!(render(&args), @r"
        view 2024-01-01 .. 2024-01-11
        [Eng] (collapsed)  2024-01-01 .. 2024-01-07
        ");
    }

    #[test]
    fn json_pairs_rows_with_capacity() {
        let args = ResourcesArgs {
            json: true,
            ..window()
        };
        let value: serde_json::Value = serde_json::from_str(&render(&args)).unwrap();
        assert_eq!(value["rows"][0]["row"], "resource");
        assert_eq!(value["rows"][0]["lane_count"], 2);
        assert_eq!(value["capacity"][0]["resource_id"], "alice");
        assert_eq!(value["capacity"][0]["available_hours"], 216.0);
        assert_eq!(value["capacity"].as_array().unwrap().len(), 3);
    }
}
