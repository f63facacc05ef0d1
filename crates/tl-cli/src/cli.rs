//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tl_core::{DragKind, ZoomLevel};

/// Timeline chart layout and interaction tool.
///
/// Reads a chart document (a JSON array of items, or an object with items,
/// resources and non-working periods) and runs the timeline core over it.
#[derive(Debug, Parser)]
#[command(name = "tl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Lay out the task view: one row per visible item.
    Layout {
        /// Chart document.
        doc: PathBuf,

        /// Zoom level (month, week, day, hour).
        #[arg(long)]
        zoom: Option<ZoomLevel>,

        /// View start (epoch ms, date, RFC 3339, or "3 days ago").
        #[arg(long)]
        view_start: Option<String>,

        /// View end (same forms as --view-start).
        #[arg(long)]
        view_end: Option<String>,

        /// Stretch parents over their children.
        #[arg(long)]
        sync_parent_dates: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show lane packing per resource.
    Lanes {
        doc: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Show resource rows with lane counts and utilization.
    Resources {
        doc: PathBuf,

        /// Group resources under header rows.
        #[arg(long)]
        group_by_group: bool,

        /// Leave out resources without items.
        #[arg(long)]
        hide_empty: bool,

        /// Collapse a group (repeatable).
        #[arg(long = "collapse", value_name = "GROUP")]
        collapsed_groups: Vec<String>,

        /// Utilization window start.
        #[arg(long)]
        view_start: Option<String>,

        /// Utilization window end.
        #[arg(long)]
        view_end: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Simulate a pointer drag on one item.
    Drag {
        doc: PathBuf,

        /// Item to drag.
        #[arg(long)]
        item: String,

        /// What to grab (move, resize-start, resize-end, progress).
        #[arg(long, default_value = "move")]
        kind: DragKind,

        /// Horizontal pointer travel in pixels.
        #[arg(long, allow_hyphen_values = true)]
        dx: f64,

        /// Vertical pointer travel in pixels.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dy: f64,

        /// Zoom level for the drag.
        #[arg(long)]
        zoom: Option<ZoomLevel>,

        /// Write the resulting patch back into the document.
        #[arg(long)]
        apply: bool,

        #[arg(long)]
        json: bool,
    },

    /// Toggle an item's collapsed flag.
    Collapse {
        doc: PathBuf,

        /// Item to toggle.
        #[arg(long)]
        item: String,

        /// Write the change back into the document.
        #[arg(long)]
        apply: bool,

        #[arg(long)]
        json: bool,
    },

    /// Replay clicks against a selection.
    Select {
        doc: PathBuf,

        /// A click: `ID`, `ID+ctrl`, `ID+meta` or `ID+shift` (repeatable).
        #[arg(long = "click", value_name = "CLICK")]
        clicks: Vec<String>,

        /// Start from every visible item selected.
        #[arg(long)]
        all: bool,

        #[arg(long)]
        json: bool,
    },

    /// Print the time axis header cells.
    Header {
        doc: PathBuf,

        #[arg(long)]
        zoom: Option<ZoomLevel>,

        #[arg(long)]
        view_start: Option<String>,

        #[arg(long)]
        view_end: Option<String>,

        #[arg(long)]
        json: bool,
    },
}
