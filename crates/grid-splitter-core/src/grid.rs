use crate::compositing::copy_region;
use crate::config::GridConfig;
use crate::error::{Result, SplitterError};
use crate::model::{GridLayout, Rect, Tile};
use image::RgbaImage;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Output of a split: the geometry used and the tiles in row-major order.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub layout: GridLayout,
    pub tiles: Vec<Tile>,
}

impl SplitOutput {
    /// Tile at `(row, col)`, if inside the grid.
    pub fn tile(&self, row: u32, col: u32) -> Option<&Tile> {
        if row >= self.layout.rows || col >= self.layout.cols {
            return None;
        }
        self.tiles
            .get(row as usize * self.layout.cols as usize + col as usize)
    }

    /// Tile with the given row-major sequence number.
    pub fn by_sequence(&self, sequence: usize) -> Option<&Tile> {
        self.tiles.get(sequence)
    }
}

impl GridLayout {
    /// Lays out the grid for a `width x height` image.
    ///
    /// Rows/cols are raised to 1, the active area is clamped to at least 1x1
    /// and tiles use floor division (min 1px). Remainder pixels at the
    /// right/bottom of the active area belong to no tile.
    /// Fails only when the image has zero area.
    pub fn compute(width: u32, height: u32, cfg: &GridConfig) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SplitterError::Decode(format!(
                "source image has zero area ({width}x{height})"
            )));
        }
        let cfg = cfg.normalized();
        let pad = cfg.padding;
        let active_w = width
            .saturating_sub(pad.left)
            .saturating_sub(pad.right)
            .max(1);
        let active_h = height
            .saturating_sub(pad.top)
            .saturating_sub(pad.bottom)
            .max(1);
        Ok(Self {
            image_width: width,
            image_height: height,
            rows: cfg.rows,
            cols: cfg.cols,
            active: Rect::new(pad.left, pad.top, active_w, active_h),
            tile_width: (active_w / cfg.cols).max(1),
            tile_height: (active_h / cfg.rows).max(1),
        })
    }

    /// All `(row, col)` cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.cols).map(move |c| (r, c)))
    }
}

#[instrument(skip_all, fields(width = image.width(), height = image.height(), rows = cfg.rows, cols = cfg.cols))]
/// Splits `image` into `rows * cols` equal tiles per `cfg`.
///
/// Notes:
/// - Tiles are exact crops; no resampling.
/// - Output is sorted by `(row, col)` and `sequence == row * cols + col`.
/// - Either every tile is returned or an error is; never a partial set.
pub fn split_image(image: &RgbaImage, cfg: &GridConfig) -> Result<SplitOutput> {
    let layout = GridLayout::compute(image.width(), image.height(), cfg)?;
    debug!(
        active = ?layout.active,
        tile_width = layout.tile_width,
        tile_height = layout.tile_height,
        dropped_columns = layout.dropped_columns(),
        dropped_rows = layout.dropped_rows(),
        "grid layout"
    );

    let cells: Vec<(u32, u32)> = layout.cells().collect();
    let cut = |&(row, col): &(u32, u32)| {
        let source = layout.cell_rect(row, col);
        Tile {
            row,
            col,
            sequence: row as usize * layout.cols as usize + col as usize,
            source,
            rgba: copy_region(image, source),
        }
    };

    #[cfg(feature = "parallel")]
    let tiles: Vec<Tile> = cells.par_iter().map(cut).collect();
    #[cfg(not(feature = "parallel"))]
    let tiles: Vec<Tile> = cells.iter().map(cut).collect();

    debug!(tiles = tiles.len(), "split complete");
    Ok(SplitOutput { layout, tiles })
}

/// [`split_image`] without the layout: just the ordered tiles.
pub fn partition(image: &RgbaImage, cfg: &GridConfig) -> Result<Vec<Tile>> {
    split_image(image, cfg).map(|out| out.tiles)
}
