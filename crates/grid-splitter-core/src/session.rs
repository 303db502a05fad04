use crate::codec::ensure_nonempty;
use crate::config::{ArchiveOptions, ColorKeyRequest, GridConfig, TabOptions};
use crate::error::{Result, SplitterError};
use crate::grid::{SplitOutput, split_image};
use crate::keying::remove_color;
use crate::model::{Padding, Tile};
use crate::package::{EncodedFile, TileArchive, archive_tiles, export_tab};
use image::RgbaImage;
use tracing::debug;

/// Stateful wrapper for interactive callers: one original image, the current
/// (possibly keyed) image, the grid config, the last split and a tile
/// selection for tab export.
///
/// Any change to the current image drops the computed tiles and selection.
/// Changing the config does not; call [`SplitSession::split`] again.
pub struct SplitSession {
    original: RgbaImage,
    current: RgbaImage,
    modified: bool,
    cfg: GridConfig,
    split: Option<SplitOutput>,
    selected: Option<usize>,
}

impl SplitSession {
    pub fn new(image: RgbaImage) -> Result<Self> {
        Self::with_config(image, GridConfig::default())
    }

    pub fn with_config(image: RgbaImage, cfg: GridConfig) -> Result<Self> {
        ensure_nonempty(&image)?;
        Ok(Self {
            current: image.clone(),
            original: image,
            modified: false,
            cfg,
            split: None,
            selected: None,
        })
    }

    /// Replaces the source image. Padding is reset to zero, rows/cols are kept.
    pub fn load_image(&mut self, image: RgbaImage) -> Result<()> {
        ensure_nonempty(&image)?;
        self.current = image.clone();
        self.original = image;
        self.modified = false;
        self.cfg.padding = Padding::default();
        self.invalidate();
        Ok(())
    }

    pub fn config(&self) -> &GridConfig {
        &self.cfg
    }

    pub fn set_config(&mut self, cfg: GridConfig) {
        self.cfg = cfg;
    }

    pub fn original(&self) -> &RgbaImage {
        &self.original
    }

    pub fn current(&self) -> &RgbaImage {
        &self.current
    }

    /// True once the current image differs from the loaded original.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Keys the current image. On error the session is left untouched.
    pub fn remove_color(&mut self, req: &ColorKeyRequest) -> Result<&RgbaImage> {
        let keyed = remove_color(&self.current, req)?;
        self.current = keyed;
        self.modified = true;
        self.invalidate();
        Ok(&self.current)
    }

    /// Reverts to the original image.
    pub fn reset(&mut self) {
        if self.modified {
            self.current = self.original.clone();
            self.modified = false;
        }
        self.invalidate();
    }

    /// Splits the current image with the current config and keeps the result.
    pub fn split(&mut self) -> Result<&SplitOutput> {
        let out = split_image(&self.current, &self.cfg)?;
        self.selected = None;
        Ok(&*self.split.insert(out))
    }

    pub fn output(&self) -> Option<&SplitOutput> {
        self.split.as_ref()
    }

    /// Tiles of the last split; empty when none is current.
    pub fn tiles(&self) -> &[Tile] {
        self.split
            .as_ref()
            .map(|s| s.tiles.as_slice())
            .unwrap_or(&[])
    }

    /// Toggles the selection: selecting the selected tile clears it.
    /// Returns the selection after the call.
    pub fn select_tile(&mut self, sequence: usize) -> Result<Option<usize>> {
        if sequence >= self.tiles().len() {
            return Err(SplitterError::InvalidInput(format!(
                "no tile with sequence {sequence} (have {})",
                self.tiles().len()
            )));
        }
        self.selected = if self.selected == Some(sequence) {
            None
        } else {
            Some(sequence)
        };
        Ok(self.selected)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_tile(&self) -> Option<&Tile> {
        self.selected.and_then(|i| self.tiles().get(i))
    }

    pub fn export_all(&self, opts: &ArchiveOptions) -> Result<TileArchive> {
        let split = self.split.as_ref().ok_or_else(|| {
            SplitterError::InvalidInput("no tiles computed; split the image first".into())
        })?;
        archive_tiles(&split.tiles, opts)
    }

    /// Tab export of the selected tile.
    pub fn export_tab(&self, opts: &TabOptions) -> Result<EncodedFile> {
        let tile = self
            .selected_tile()
            .ok_or_else(|| SplitterError::InvalidInput("no tile selected".into()))?;
        export_tab(tile, opts)
    }

    fn invalidate(&mut self) {
        if self.split.take().is_some() {
            debug!("source changed; discarded computed tiles");
        }
        self.selected = None;
    }
}
