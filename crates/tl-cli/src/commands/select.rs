//! Select command: replays clicks against a selection.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tl_core::hierarchy::find_item;
use tl_core::{
    ChangeLog, ChartDocument, ChartObserver, ItemId, Modifiers, NormalizeOptions, SelectionState,
    normalize, related_ids,
};

use crate::Config;

/// Options for `tl select`.
#[derive(Debug, Clone, Default)]
pub struct SelectArgs {
    pub clicks: Vec<String>,
    pub all: bool,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SelectReport<'a> {
    selection: &'a SelectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    related: Option<Vec<ItemId>>,
    transitions: usize,
}

/// Parses `ID` optionally followed by `+ctrl`, `+meta` or `+shift` suffixes.
pub fn parse_click(s: &str) -> Result<(String, Modifiers)> {
    let mut parts = s.split('+');
    let id = parts.next().unwrap_or_default().trim();
    if id.is_empty() {
        anyhow::bail!("empty item in click: {s:?}");
    }
    let mut modifiers = Modifiers::NONE;
    for part in parts {
        match part.trim().to_ascii_lowercase().as_str() {
            "ctrl" => modifiers.ctrl = true,
            "meta" | "cmd" => modifiers.meta = true,
            "shift" => modifiers.shift = true,
            other => anyhow::bail!("unknown modifier {other:?} in click {s:?}"),
        }
    }
    Ok((id.to_string(), modifiers))
}

pub fn run<W: Write>(
    writer: &mut W,
    doc: &ChartDocument,
    args: &SelectArgs,
    config: &Config,
) -> Result<()> {
    let normalized = normalize(
        &doc.items,
        NormalizeOptions {
            sync_parent_dates: config.sync_parent_dates,
        },
    );

    let mut log = ChangeLog::default();
    let mut selection = if args.all {
        SelectionState::select_all(&normalized)
    } else {
        SelectionState::cleared()
    };
    if args.all {
        log.on_selection_change(&selection);
    }

    for click in &args.clicks {
        let (id, modifiers) = parse_click(click)?;
        let Some(node) = find_item(&normalized, &id) else {
            anyhow::bail!("unknown item: {id}");
        };
        selection = selection.click(&normalized, node.id(), modifiers);
        log.on_selection_change(&selection);
    }

    let related = config
        .highlight_related
        .then(|| related_ids(&normalized, &selection, true));

    if args.json {
        let report = SelectReport {
            selection: &selection,
            related,
            transitions: log.selections.len(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    writeln!(writer, "selected: {}", join(&selection.ids))?;
    if let Some(anchor) = &selection.anchor {
        writeln!(writer, "anchor: {anchor}")?;
    }
    if let Some(related) = related {
        writeln!(writer, "related: {}", join(&related))?;
    }
    Ok(())
}

fn join(ids: &[ItemId]) -> String {
    if ids.is_empty() {
        return "(none)".to_string();
    }
    ids.iter().map(ItemId::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn doc() -> ChartDocument {
        ChartDocument::from_json(
            r#"[
                {"id": "p", "type": "group", "start": 0, "end": 10},
                {"id": "t1", "parentId": "p", "groupId": "alpha", "start": 0, "end": 3},
                {"id": "t2", "parentId": "p", "relatedIds": ["x"], "start": 3, "end": 6},
                {"id": "t3", "parentId": "p", "groupId": "alpha", "start": 6, "end": 10},
                {"id": "x", "start": 10, "end": 12}
            ]"#,
        )
        .unwrap()
    }

    fn render(args: &SelectArgs, config: &Config) -> String {
        let mut out = Vec::new();
        run(&mut out, &doc(), args, config).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn clicks(list: &[&str]) -> SelectArgs {
        SelectArgs {
            clicks: list.iter().map(ToString::to_string).collect(),
            ..SelectArgs::default()
        }
    }

    #[test]
    fn parses_modifiers() {
        assert_eq!(parse_click("a").unwrap(), ("a".into(), Modifiers::NONE));
        assert_eq!(parse_click("a+shift").unwrap(), ("a".into(), Modifiers::SHIFT));
        let (_, both) = parse_click("a+Ctrl+shift").unwrap();
        assert!(both.ctrl && both.shift);
        assert!(parse_click("+ctrl").is_err());
        assert!(parse_click("a+alt").is_err());
    }

    #[test]
    fn shift_click_selects_visible_range() {
        assert_snapshot!(render(&clicks(&["t1", "t3+shift"]), &Config::default()), @r"
        selected: t1, t2, t3
        anchor: t1
        related: x
        ");
    }

    #[test]
    fn ctrl_click_toggles_and_moves_anchor() {
        assert_snapshot!(render(&clicks(&["t1", "t2+ctrl", "t1+ctrl"]), &Config::default()), @r"
        selected: t2
        anchor: t1
        related: x
        ");
    }

    #[test]
    fn group_peers_are_related() {
        let out = render(&clicks(&["t1"]), &Config::default());
        assert!(out.ends_with("related: t3\n"));
    }

    #[test]
    fn select_all_then_plain_click() {
        let args = SelectArgs {
            all: true,
            ..SelectArgs::default()
        };
        assert!(render(&args, &Config::default()).starts_with("selected: p, t1, t2, t3, x\nanchor: p\n"));

        let args = SelectArgs {
            all: true,
            ..clicks(&["x"])
        };
        assert!(render(&args, &Config::default()).starts_with("selected: x\n"));
    }

    #[test]
    fn related_hidden_when_disabled() {
        let config = Config {
            highlight_related: false,
            ..Config::default()
        };
        assert_eq!(render(&clicks(&["t2"]), &config), "selected: t2\nanchor: t2\n");
    }

    #[test]
    fn nothing_clicked() {
        assert_eq!(
            render(&SelectArgs::default(), &Config::default()),
            "selected: (none)\nrelated: (none)\n"
        );
    }

    #[test]
    fn unknown_click_target_is_an_error() {
        let err = run(&mut Vec::<u8>::new(), &doc(), &clicks(&["zzz"]), &Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("unknown item"));
    }

    #[test]
    fn json_counts_transitions() {
        let args = SelectArgs {
            json: true,
            ..clicks(&["t1", "x+ctrl"])
        };
        let value: serde_json::Value =
            serde_json::from_str(&render(&args, &Config::default())).unwrap();
        assert_eq!(value["selection"]["ids"], serde_json::json!(["t1", "x"]));
        assert_eq!(value["selection"]["anchor"], "x");
        assert_eq!(value["transitions"], 2);
        assert_eq!(value["related"], serde_json::json!(["t2", "t3"]));
    }
}
