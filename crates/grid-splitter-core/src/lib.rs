//! Core library for cutting images into equal grid tiles.
//!
//! - Grid: `split_image` lays an R×C grid over the image minus four padding margins and copies each cell
//! - Color key: `remove_color` makes pixels near a target color fully transparent
//! - Packaging: `archive_tiles` (ZIP of PNGs), `export_tab` (one tile stretched to a fixed size)
//! - `SplitSession` bundles the above for interactive callers (keying, revert, selection).
//!
//! Quick example:
//! ```ignore
//! use grid_splitter_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let img = image::open("sheet.png")?.to_rgba8();
//! let keyed = remove_color(&img, &ColorKeyRequest::new(Rgb::WHITE, 15))?;
//! let cfg = GridConfig::builder().with_grid(2, 3).pad_left(4).build();
//! let out = split_image(&keyed, &cfg)?;
//! let zip = archive_tiles(&out.tiles, &ArchiveOptions::default())?;
//! std::fs::write(&zip.file_name, &zip.bytes)?;
//! # Ok(()) }
//! ```

pub mod codec;
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod keying;
pub mod model;
pub mod package;
pub mod session;

pub use codec::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use grid::*;
pub use keying::*;
pub use model::*;
pub use package::*;

/// Convenience prelude for common types and functions.
/// Importing `grid_splitter_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        ArchiveOptions, ColorKeyRequest, GridConfig, GridConfigBuilder, ResizeFilter,
        SplitterConfig, TabOptions,
    };
    pub use crate::error::{ErrorKind, SplitterError};
    pub use crate::model::{GridLayout, GridStats, Padding, Rect, Rgb, Tile};
    pub use crate::package::{EncodedFile, TileArchive};
    pub use crate::session::SplitSession;
    pub use crate::{
        SplitOutput, archive_tiles, decode_image, encode_png, export_keyed, export_tab,
        export_tile, partition, remove_color, split_image,
    };
}
