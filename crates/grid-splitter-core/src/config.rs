//! Grid, color-key and export configuration.
//! Key notes:
//!   - `rows`/`cols` of 0 are treated as 1; nothing here is rejected, only clamped
//!   - `padding` is in source pixels and may exceed the image; the active area never drops below 1x1
//!   - `tolerance_percent` above 100 behaves as 100

use crate::error::SplitterError;
use crate::model::{Padding, Rgb};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Upper bound callers are expected to apply to rows/cols.
pub const MAX_GRID_DIM: u32 = 50;

/// Normalization denominator for color distance (`sqrt(3 * 255²)` truncated).
pub const MAX_COLOR_DISTANCE: f64 = 441.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridConfig {
    #[serde(default = "default_rows")]
    pub rows: u32,
    #[serde(default = "default_cols")]
    pub cols: u32,
    #[serde(default)]
    pub padding: Padding,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            padding: Padding::default(),
        }
    }
}

impl GridConfig {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            padding: Padding::default(),
        }
    }

    /// Copy with rows/cols raised to at least 1.
    pub fn normalized(&self) -> Self {
        Self {
            rows: self.rows.max(1),
            cols: self.cols.max(1),
            padding: self.padding,
        }
    }

    /// Create a fluent builder for `GridConfig`.
    pub fn builder() -> GridConfigBuilder {
        GridConfigBuilder::new()
    }
}

fn default_rows() -> u32 {
    4
}
fn default_cols() -> u32 {
    6
}

/// Builder for `GridConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct GridConfigBuilder {
    cfg: GridConfig,
}

impl GridConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: GridConfig::default(),
        }
    }
    pub fn with_grid(mut self, rows: u32, cols: u32) -> Self {
        self.cfg.rows = rows;
        self.cfg.cols = cols;
        self
    }
    pub fn rows(mut self, v: u32) -> Self {
        self.cfg.rows = v;
        self
    }
    pub fn cols(mut self, v: u32) -> Self {
        self.cfg.cols = v;
        self
    }
    pub fn padding(mut self, v: Padding) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn pad_top(mut self, v: u32) -> Self {
        self.cfg.padding.top = v;
        self
    }
    pub fn pad_right(mut self, v: u32) -> Self {
        self.cfg.padding.right = v;
        self
    }
    pub fn pad_bottom(mut self, v: u32) -> Self {
        self.cfg.padding.bottom = v;
        self
    }
    pub fn pad_left(mut self, v: u32) -> Self {
        self.cfg.padding.left = v;
        self
    }
    pub fn build(self) -> GridConfig {
        self.cfg
    }
}

/// Target color and tolerance for chroma-key removal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColorKeyRequest {
    #[serde(default = "default_target")]
    pub target: Rgb,
    /// 0 keys exact matches only; 100 keys every pixel.
    #[serde(default = "default_tolerance")]
    pub tolerance_percent: u8,
}

impl Default for ColorKeyRequest {
    fn default() -> Self {
        Self {
            target: default_target(),
            tolerance_percent: default_tolerance(),
        }
    }
}

impl ColorKeyRequest {
    pub fn new(target: Rgb, tolerance_percent: u8) -> Self {
        Self {
            target,
            tolerance_percent,
        }
    }

    /// Linear distance threshold: `tolerance / 100 * 441`.
    pub fn threshold(&self) -> f64 {
        (self.tolerance_percent.min(100) as f64 / 100.0) * MAX_COLOR_DISTANCE
    }
}

fn default_target() -> Rgb {
    Rgb::WHITE
}
fn default_tolerance() -> u8 {
    15
}

/// Resampling filter used by the tab export.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    /// Bilinear.
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl FromStr for ResizeFilter {
    type Err = SplitterError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "triangle" | "bilinear" | "linear" => Ok(Self::Triangle),
            "catmullrom" | "catmull-rom" | "cubic" => Ok(Self::CatmullRom),
            "gaussian" => Ok(Self::Gaussian),
            "lanczos3" | "lanczos" => Ok(Self::Lanczos3),
            other => Err(SplitterError::InvalidInput(format!(
                "unknown resize filter: {other}"
            ))),
        }
    }
}

impl From<ResizeFilter> for FilterType {
    fn from(f: ResizeFilter) -> Self {
        match f {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Output size of a tab export. The tile is stretched to exactly this size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabOptions {
    #[serde(default = "default_tab_width")]
    pub width: u32,
    #[serde(default = "default_tab_height")]
    pub height: u32,
    #[serde(default)]
    pub filter: ResizeFilter,
}

impl Default for TabOptions {
    fn default() -> Self {
        Self {
            width: default_tab_width(),
            height: default_tab_height(),
            filter: ResizeFilter::default(),
        }
    }
}

impl TabOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            filter: ResizeFilter::default(),
        }
    }
}

fn default_tab_width() -> u32 {
    96
}
fn default_tab_height() -> u32 {
    74
}

/// Naming for the bulk archive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveOptions {
    #[serde(default = "default_base_name")]
    pub base_name: String,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            base_name: default_base_name(),
        }
    }
}

impl ArchiveOptions {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
        }
    }

    /// Download name of the archive itself: `<base>_tiles.zip`.
    pub fn archive_file_name(&self) -> String {
        format!("{}_tiles.zip", self.base_name)
    }

    /// Entry path of one tile: `tiles/<base>_row<N>_col<M>.png`, 1-based.
    pub fn entry_name(&self, row: u32, col: u32) -> String {
        format!(
            "tiles/{}_row{}_col{}.png",
            self.base_name,
            row as u64 + 1,
            col as u64 + 1
        )
    }
}

fn default_base_name() -> String {
    "split_image".into()
}

/// Everything a caller needs to drive a full run; the shape of config files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SplitterConfig {
    pub grid: GridConfig,
    /// When set, the source is keyed before it is split.
    pub color_key: Option<ColorKeyRequest>,
    pub tab: TabOptions,
    pub archive: ArchiveOptions,
}
