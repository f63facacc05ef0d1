//! Lanes command: stacking of overlapping items per resource.

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use tl_core::{ChartDocument, WorkItem, pack_resource_lanes};

use super::util::{label, short_time};

pub fn run<W: Write>(writer: &mut W, doc: &ChartDocument, json: bool) -> Result<()> {
    let packed = pack_resource_lanes(&doc.items);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&packed)?)?;
        return Ok(());
    }

    if packed.is_empty() {
        writeln!(writer, "No items are assigned to a resource.")?;
        return Ok(());
    }

    let by_id: HashMap<&str, &WorkItem> = doc.items.iter().map(|i| (i.id.as_str(), i)).collect();
    for lanes in &packed {
        let noun = if lanes.lane_count == 1 { "lane" } else { "lanes" };
        writeln!(writer, "{}  {} {noun}", lanes.resource_id, lanes.lane_count)?;
        for (id, level) in lanes.item_ids.iter().zip(&lanes.stack_levels) {
            let Some(item) = by_id.get(id.as_str()) else {
                continue;
            };
            writeln!(
                writer,
                "  {level}  {}  {} .. {}",
                label(item),
                short_time(item.start),
                short_time(item.end)
            )?;
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
            r#"[
                {"id": "a", "title": "Alpha", "resourceId": "r1", "start": "2024-01-01", "end": "2024-01-05"},
                {"id": "b", "title": "Beta", "resourceId": "r1", "start": "2024-01-03", "end": "2024-01-07"},
                {"id": "c", "title": "Gamma", "resourceId": "r1", "start": "2024-01-05", "end": "2024-01-09"},
                {"id": "u", "title": "Unassigned", "start": "2024-01-01", "end": "2024-01-02"},
                {"id": "d", "title": "Delta", "resourceId": "r2", "start": "2024-01-02", "end": "2024-01-03"}
            ]"#,
        )
        .unwrap()
    }

    fn render(doc: &ChartDocument, json: bool) -> String {
        let mut out = Vec::new();
        run(&mut out, doc, json).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_lanes_per_resource() {
        assert_snapshot!(render(&doc(), false), @r"
        r1  2 lanes
          0  Alpha  2024-01-01 .. 2024-01-05
          1  Beta  2024-01-03 .. 2024-01-07
          0  Gamma  2024-01-05 .. 2024-01-09
        r2  1 lane
          0  Delta  2024-01-02 .. 2024-01-03
        ");
    }

    #[test]
    fn json_lists_parallel_levels() {
        let value: serde_json::Value = serde_json::from_str(&render(&doc(), true)).unwrap();
        assert_eq!(value[0]["resource_id"], "r1");
        assert_eq!(value[0]["stack_levels"], serde_json::json!([0, 1, 0]));
        assert_eq!(value[1]["lane_count"], 1);
    }

    #[test]
    fn reports_when_nothing_is_assigned() {
        let doc = ChartDocument::from_json(r#"[{"id": "x", "start": 0, "end": 1}]"#).unwrap();
        assert_eq!(render(&doc, false), "No items are assigned to a resource.\n");
    }
}
