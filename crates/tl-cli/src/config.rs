//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tl_core::ZoomLevel;
use tl_core::drag::DEFAULT_DRAG_THRESHOLD_PX;
use tl_core::temporal::{DEFAULT_BAR_HEIGHT_RATIO, DEFAULT_ROW_HEIGHT};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Zoom level used when `--zoom` is not given.
    pub zoom: ZoomLevel,

    /// Base row height in pixels.
    pub row_height: f64,

    /// Bar height as a fraction of row height.
    pub bar_height_ratio: f64,

    /// Pointer travel before a press becomes a drag.
    pub drag_threshold_px: f64,

    /// Stretch parents over their children.
    pub sync_parent_dates: bool,

    /// Allow drag edits.
    pub editable: bool,

    /// Report related items alongside the selection.
    pub highlight_related: bool,

    /// Padding around the items when no view range is given.
    pub view_padding_days: i64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("zoom", &self.zoom.as_str())
            .field("row_height", &self.row_height)
            .field("bar_height_ratio", &self.bar_height_ratio)
            .field("drag_threshold_px", &self.drag_threshold_px)
            .field("sync_parent_dates", &self.sync_parent_dates)
            .field("editable", &self.editable)
            .field("highlight_related", &self.highlight_related)
            .field("view_padding_days", &self.view_padding_days)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zoom: ZoomLevel::Day,
            row_height: DEFAULT_ROW_HEIGHT,
            bar_height_ratio: DEFAULT_BAR_HEIGHT_RATIO,
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            sync_parent_dates: false,
            editable: true,
            highlight_related: true,
            view_padding_days: 7,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later layers win: defaults, the user config file, `path`, then
    /// `TL_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("TL_"));

        figment.extract()
    }

    /// Row metrics for layout.
    pub const fn row_metrics(&self) -> tl_core::RowMetrics {
        tl_core::RowMetrics {
            row_height: self.row_height,
            bar_height_ratio: self.bar_height_ratio,
        }
    }
}

/// Returns the platform-specific config directory for tl.
///
/// On Linux: `~/.config/tl`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirs_config_path_ends_with_tl() {
        if let Some(path) = dirs_config_path() {
            assert_eq!(path.file_name().unwrap(), "tl");
        }
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("tl.toml");
        std::fs::write(&path, "zoom = \"week\"\nrow_height = 40.0\neditable = false\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.zoom, ZoomLevel::Week);
        assert!((config.row_height - 40.0).abs() < f64::EPSILON);
        assert!(!config.editable);
        assert_eq!(config.view_padding_days, 7);
    }

    #[test]
    fn debug_lists_every_field() {
        let debug = format!("{:?}", Config::default());
        assert!(debug.contains("zoom: \"day\""));
        assert!(debug.contains("view_padding_days: 7"));
    }
}
