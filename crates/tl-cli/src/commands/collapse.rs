//! Collapse command.

use std::io::Write;

use anyhow::Result;
use tl_core::hierarchy::descendant_ids;
use tl_core::{ChartDocument, NormalizeOptions, normalize, toggle_collapsed};

use super::util::write_patch;

/// Toggles `item`'s collapsed flag. Returns true when `doc` was modified.
pub fn run<W: Write>(
    writer: &mut W,
    doc: &mut ChartDocument,
    item: &str,
    apply: bool,
    json: bool,
) -> Result<bool> {
    let Some(patch) = toggle_collapsed(&doc.items, item) else {
        anyhow::bail!("unknown item: {item}");
    };

    let normalized = normalize(&doc.items, NormalizeOptions::default());
    let affected = descendant_ids(&normalized, item).len();
    let applied = apply && patch.apply(&mut doc.items);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&patch)?)?;
        return Ok(applied);
    }

    write_patch(writer, &patch)?;
    let noun = if affected == 1 { "descendant" } else { "descendants" };
    writeln!(writer, "  {affected} {noun}")?;
    if applied {
        writeln!(writer, "Applied.")?;
    }
    Ok(applied)
}
