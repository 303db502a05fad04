use crate::codec::{encode_png, ensure_nonempty};
use crate::config::{ArchiveOptions, TabOptions};
use crate::error::{Result, SplitterError};
use crate::model::Tile;
use image::RgbaImage;
use image::imageops;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use tracing::{debug, instrument};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A single encoded PNG ready to be written or offered for download.
#[derive(Debug, Clone)]
pub struct EncodedFile {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// ZIP archive holding one PNG per tile.
#[derive(Debug, Clone)]
pub struct TileArchive {
    /// `<base>_tiles.zip`
    pub file_name: String,
    /// Entry paths in the order they were written (row-major).
    pub entries: Vec<String>,
    pub bytes: Vec<u8>,
}

/// `<sequence>_tab.png`, sequence zero-padded to two digits.
pub fn tab_file_name(sequence: usize) -> String {
    format!("{sequence:02}_tab.png")
}

/// `<sequence>.png`, sequence zero-padded to two digits.
pub fn tile_file_name(sequence: usize) -> String {
    format!("{sequence:02}.png")
}

#[instrument(skip_all, fields(tiles = tiles.len(), base = %opts.base_name))]
/// Encodes every tile as PNG and bundles them into one ZIP archive under
/// `tiles/<base>_row<N>_col<M>.png` (1-based).
///
/// Any failure, on any tile, fails the whole batch with a packaging error.
/// Entries are stored uncompressed since PNG data is already deflated.
pub fn archive_tiles(tiles: &[Tile], opts: &ArchiveOptions) -> Result<TileArchive> {
    if tiles.is_empty() {
        return Err(SplitterError::Packaging("no tiles to package".into()));
    }

    let mut seen = HashSet::with_capacity(tiles.len());
    let mut names = Vec::with_capacity(tiles.len());
    for t in tiles {
        let name = opts.entry_name(t.row, t.col);
        if !seen.insert(name.clone()) {
            return Err(SplitterError::Packaging(format!(
                "duplicate archive entry {name}"
            )));
        }
        names.push(name);
    }

    let encode = |(t, name): (&Tile, &String)| {
        encode_png(&t.rgba).map_err(|e| SplitterError::Packaging(format!("{name}: {e}")))
    };
    #[cfg(feature = "parallel")]
    let encoded: Vec<Vec<u8>> = tiles
        .par_iter()
        .zip(names.par_iter())
        .map(encode)
        .collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let encoded: Vec<Vec<u8>> = tiles
        .iter()
        .zip(names.iter())
        .map(encode)
        .collect::<Result<_>>()?;

    let zip_err = |e: zip::result::ZipError| SplitterError::Packaging(e.to_string());
    let io_err = |e: std::io::Error| SplitterError::Packaging(e.to_string());
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, png) in names.iter().zip(&encoded) {
        writer.start_file(name.as_str(), options).map_err(zip_err)?;
        writer.write_all(png).map_err(io_err)?;
    }
    let bytes = writer.finish().map_err(zip_err)?.into_inner();
    debug!(entries = names.len(), size = bytes.len(), "archive assembled");

    Ok(TileArchive {
        file_name: opts.archive_file_name(),
        entries: names,
        bytes,
    })
}

#[instrument(skip_all, fields(sequence = tile.sequence, width = opts.width, height = opts.height))]
/// Stretches one tile to exactly `opts.width x opts.height` (aspect ratio is
/// not kept) and encodes it as `<NN>_tab.png`.
pub fn export_tab(tile: &Tile, opts: &TabOptions) -> Result<EncodedFile> {
    if opts.width == 0 || opts.height == 0 {
        return Err(SplitterError::Encode(format!(
            "tab size must be non-zero, got {}x{}",
            opts.width, opts.height
        )));
    }
    if tile.width() == 0 || tile.height() == 0 {
        return Err(SplitterError::Encode(format!(
            "tile {} has no pixels to resize",
            tile.sequence
        )));
    }
    let resized = imageops::resize(&tile.rgba, opts.width, opts.height, opts.filter.into());
    let bytes = encode_png(&resized)?;
    Ok(EncodedFile {
        file_name: tab_file_name(tile.sequence),
        width: opts.width,
        height: opts.height,
        bytes,
    })
}

/// Encodes one tile at its native size as `<NN>.png`.
pub fn export_tile(tile: &Tile) -> Result<EncodedFile> {
    Ok(EncodedFile {
        file_name: tile_file_name(tile.sequence),
        width: tile.width(),
        height: tile.height(),
        bytes: encode_png(&tile.rgba)?,
    })
}

/// Encodes a (keyed) full source image as `<base>_keyed.png`.
pub fn export_keyed(image: &RgbaImage, base_name: &str) -> Result<EncodedFile> {
    ensure_nonempty(image)?;
    Ok(EncodedFile {
        file_name: format!("{base_name}_keyed.png"),
        width: image.width(),
        height: image.height(),
        bytes: encode_png(image)?,
    })
}
