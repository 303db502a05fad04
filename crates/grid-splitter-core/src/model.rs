use crate::error::SplitterError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`), saturating.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }
    /// Exclusive bottom edge (`y + h`), saturating.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
}

/// Margins subtracted from the source image before the grid is laid out.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Padding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Padding {
    pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
    pub fn uniform(v: u32) -> Self {
        Self::new(v, v, v, v)
    }
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// 24-bit sRGB color. Parses from and serializes to `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = SplitterError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let invalid = || SplitterError::InvalidInput(format!("invalid hex color: {s:?}"));
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = SplitterError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// One cell of a split grid with its own RGBA copy of the source pixels.
#[derive(Debug, Clone)]
pub struct Tile {
    /// 0-based grid row.
    pub row: u32,
    /// 0-based grid column.
    pub col: u32,
    /// Row-major rank: `row * cols + col`.
    pub sequence: usize,
    /// Region of the source image this tile was copied from. May extend past
    /// the image edge when padding leaves less than one pixel per cell.
    pub source: Rect,
    pub rgba: RgbaImage,
}

impl Tile {
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }
    /// Raw RGBA8 bytes, `width * height * 4` long.
    pub fn pixels(&self) -> &[u8] {
        self.rgba.as_raw()
    }
}

/// Geometry of a grid over one source image, independent of pixel data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridLayout {
    pub image_width: u32,
    pub image_height: u32,
    /// Rows after clamping to at least 1.
    pub rows: u32,
    /// Columns after clamping to at least 1.
    pub cols: u32,
    /// Source area left after padding (at least 1x1).
    pub active: Rect,
    pub tile_width: u32,
    pub tile_height: u32,
}

/// Coverage figures for a [`GridLayout`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridStats {
    pub num_tiles: usize,
    pub tile_area: u64,
    pub active_area: u64,
    /// Area spanned by all tiles together (`tile_width*cols x tile_height*rows`).
    pub covered_area: u64,
    /// Active-area pixels that fall into no tile (right/bottom remainder).
    pub dropped_area: u64,
    /// covered_area / active_area, capped at 1.0.
    pub coverage: f64,
}

impl GridLayout {
    pub fn tile_count(&self) -> usize {
        (self.rows as usize) * (self.cols as usize)
    }

    /// Rectangle spanned by the whole grid, anchored at the active area origin.
    pub fn covered(&self) -> Rect {
        Rect::new(
            self.active.x,
            self.active.y,
            self.tile_width.saturating_mul(self.cols),
            self.tile_height.saturating_mul(self.rows),
        )
    }

    /// Source rectangle of cell `(row, col)`.
    pub fn cell_rect(&self, row: u32, col: u32) -> Rect {
        Rect::new(
            self.active.x.saturating_add(col.saturating_mul(self.tile_width)),
            self.active.y.saturating_add(row.saturating_mul(self.tile_height)),
            self.tile_width,
            self.tile_height,
        )
    }

    /// Pixel columns at the right of the active area that no tile covers.
    pub fn dropped_columns(&self) -> u32 {
        self.active.w.saturating_sub(self.covered().w)
    }

    /// Pixel rows at the bottom of the active area that no tile covers.
    pub fn dropped_rows(&self) -> u32 {
        self.active.h.saturating_sub(self.covered().h)
    }

    pub fn stats(&self) -> GridStats {
        let active_area = self.active.area();
        let covered_area = self.covered().area();
        let coverage = if active_area > 0 {
            (covered_area as f64 / active_area as f64).min(1.0)
        } else {
            0.0
        };
        GridStats {
            num_tiles: self.tile_count(),
            tile_area: (self.tile_width as u64) * (self.tile_height as u64),
            active_area,
            covered_area,
            dropped_area: active_area.saturating_sub(covered_area),
            coverage,
        }
    }
}

impl GridStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Tiles: {}, Tile Area: {} px², Active Area: {} px², Covered: {:.2}%, Dropped: {} px²",
            self.num_tiles,
            self.tile_area,
            self.active_area,
            self.coverage * 100.0,
            self.dropped_area,
        )
    }
}
