use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use globset::{Glob, GlobSetBuilder};
use grid_splitter_core::prelude::*;
use grid_splitter_core::{MAX_GRID_DIM, to_json_layout, to_json_manifest};
use image::{ImageReader, RgbaImage};
use serde::Deserialize;
use tracing::{debug, error, info};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "grid-splitter",
    about = "Cut images into equal grid tiles, strip a background color, export ZIP or tab images",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split images into a grid and write one ZIP of PNG tiles per image
    Split(SplitArgs),
    /// Make pixels near a color transparent and write `<name>_keyed.png`
    Key(KeyArgs),
    /// Split one image and stretch a single tile to the tab size
    Tab(TabArgs),
    /// Print the grid geometry as JSON (no pixel output)
    Layout(LayoutArgs),
}

/// Grid parameters. Out-of-range values are clamped, never rejected.
#[derive(Args, Debug, Clone)]
struct GridArgs {
    /// Rows (clamped to 1..=50)
    #[arg(long, default_value_t = 4, allow_negative_numbers = true, help_heading = "Grid")]
    rows: i64,
    /// Columns (clamped to 1..=50)
    #[arg(long, default_value_t = 6, allow_negative_numbers = true, help_heading = "Grid")]
    cols: i64,
    /// Pixels excluded at the top edge (negative counts as 0)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true, help_heading = "Grid")]
    pad_top: i64,
    /// Pixels excluded at the right edge
    #[arg(long, default_value_t = 0, allow_negative_numbers = true, help_heading = "Grid")]
    pad_right: i64,
    /// Pixels excluded at the bottom edge
    #[arg(long, default_value_t = 0, allow_negative_numbers = true, help_heading = "Grid")]
    pad_bottom: i64,
    /// Pixels excluded at the left edge
    #[arg(long, default_value_t = 0, allow_negative_numbers = true, help_heading = "Grid")]
    pad_left: i64,
}

impl GridArgs {
    fn to_grid_config(&self) -> GridConfig {
        GridConfig::builder()
            .with_grid(clamp_grid_dim(self.rows), clamp_grid_dim(self.cols))
            .padding(Padding::new(
                clamp_padding(self.pad_top),
                clamp_padding(self.pad_right),
                clamp_padding(self.pad_bottom),
                clamp_padding(self.pad_left),
            ))
            .build()
    }
}

/// Optional color keying applied before splitting.
#[derive(Args, Debug, Clone)]
struct KeyOpts {
    /// Key out this color (#rrggbb) before splitting
    #[arg(long, help_heading = "Color Key")]
    key_color: Option<String>,
    /// Tolerance percent (clamped to 0..=100); implies keying with #ffffff when no color is given
    #[arg(long, allow_negative_numbers = true, help_heading = "Color Key")]
    tolerance: Option<i64>,
}

impl KeyOpts {
    fn to_request(&self) -> anyhow::Result<Option<ColorKeyRequest>> {
        if self.key_color.is_none() && self.tolerance.is_none() {
            return Ok(None);
        }
        let mut req = ColorKeyRequest::default();
        if let Some(hex) = &self.key_color {
            req.target = parse_color(hex)?;
        }
        if let Some(t) = self.tolerance {
            req.tolerance_percent = clamp_tolerance(t);
        }
        Ok(Some(req))
    }
}

#[derive(Parser, Debug, Clone)]
struct SplitArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Archive base name (files will be name_tiles.zip); directories use each file's stem
    #[arg(short, long, help_heading = "Input/Output")]
    name: Option<String>,
    /// YAML config file path (overrides grid/key/tab options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    #[command(flatten)]
    grid: GridArgs,
    #[command(flatten)]
    key: KeyOpts,

    // Export
    /// Write name_tiles.json (layout, stats, entry names) next to the archive
    #[arg(long, default_value_t = false, help_heading = "Export")]
    manifest: bool,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute tiles and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct KeyArgs {
    /// Input image
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Output base name (defaults to the input file stem)
    #[arg(short, long, help_heading = "Input/Output")]
    name: Option<String>,
    /// Color to key out (#rrggbb)
    #[arg(long, default_value = "#ffffff", help_heading = "Color Key")]
    key_color: String,
    /// Tolerance percent (clamped to 0..=100)
    #[arg(long, default_value_t = 15, allow_negative_numbers = true, help_heading = "Color Key")]
    tolerance: i64,
}

#[derive(Parser, Debug, Clone)]
struct TabArgs {
    /// Input image
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Tile sequence number (row-major, 0-based)
    #[arg(long, help_heading = "Tab")]
    tile: usize,
    /// Tab width in pixels
    #[arg(long, default_value_t = 96, help_heading = "Tab")]
    tab_width: u32,
    /// Tab height in pixels
    #[arg(long, default_value_t = 74, help_heading = "Tab")]
    tab_height: u32,
    /// Resize filter: nearest | triangle | catmullrom | gaussian | lanczos3
    #[arg(long, default_value = "triangle", help_heading = "Tab")]
    filter: String,
    /// YAML config file path (overrides grid/key/tab options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    #[command(flatten)]
    grid: GridArgs,
    #[command(flatten)]
    key: KeyOpts,
}

#[derive(Parser, Debug, Clone)]
struct LayoutArgs {
    /// Input image (only its header is read)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Write the JSON here instead of stdout
    #[arg(long, help_heading = "Input/Output")]
    out: Option<PathBuf>,

    #[command(flatten)]
    grid: GridArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Split(args) => run_split(args, cli.progress && !cli.quiet),
        Commands::Key(args) => run_key(args),
        Commands::Tab(args) => run_tab(args),
        Commands::Layout(args) => run_layout(args),
    }
}

fn run_split(cli: &SplitArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = SplitterConfig {
        grid: cli.grid.to_grid_config(),
        color_key: cli.key.to_request()?,
        ..Default::default()
    };
    if let Some(name) = &cli.name {
        cfg.archive.base_name = name.clone();
    }
    let cfg = overlay_config_file(cfg, cli.config.as_deref())?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    if paths.is_empty() {
        anyhow::bail!("no images found at {}", cli.input.display());
    }
    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }
    info!(count = paths.len(), "splitting images");

    // A directory run names each archive after its file; a single file keeps the configured name
    let per_file_names = cli.input.is_dir() && cli.name.is_none();
    let bar = progress_bar(paths.len(), show_progress)?;
    let mut failed = 0usize;
    for p in &paths {
        if let Some(b) = &bar {
            b.set_message(p.file_name().and_then(|s| s.to_str()).unwrap_or("").to_string());
        }
        let mut archive = cfg.archive.clone();
        if per_file_names {
            archive.base_name = file_stem(p);
        }
        if let Err(e) = split_one(p, &cfg, &archive, cli) {
            if paths.len() == 1 {
                return Err(e);
            }
            error!(?p, error = %format!("{e:#}"), "skip image");
            failed += 1;
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} images failed", paths.len());
    }
    Ok(())
}

fn split_one(
    path: &Path,
    cfg: &SplitterConfig,
    archive_opts: &ArchiveOptions,
    cli: &SplitArgs,
) -> anyhow::Result<()> {
    let mut img = load_image(path)?;
    if let Some(req) = &cfg.color_key {
        img = remove_color(&img, req)
            .with_context(|| format!("key {} in {}", req.target, path.display()))?;
    }
    let out = split_image(&img, &cfg.grid)?;
    let stats = out.layout.stats();
    info!(
        input = %path.display(),
        tiles = stats.num_tiles,
        tile_w = out.layout.tile_width,
        tile_h = out.layout.tile_height,
        coverage = format!("{:.2}%", stats.coverage * 100.0),
        "split"
    );

    if cli.dry_run {
        println!("{}: {}", path.display(), stats.summary());
        return Ok(());
    }

    let archive = archive_tiles(&out.tiles, archive_opts)?;
    let zip_path = cli.out_dir.join(&archive.file_name);
    fs::write(&zip_path, &archive.bytes)
        .with_context(|| format!("write {}", zip_path.display()))?;
    info!(?zip_path, entries = archive.entries.len(), "archive written");

    if cli.manifest {
        let json_path = cli
            .out_dir
            .join(format!("{}_tiles.json", archive_opts.base_name));
        let value = to_json_manifest(&out.layout, &out.tiles, archive_opts);
        fs::write(&json_path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("write {}", json_path.display()))?;
        info!(?json_path, "manifest written");
    }
    Ok(())
}

fn run_key(cli: &KeyArgs) -> anyhow::Result<()> {
    let req = ColorKeyRequest::new(parse_color(&cli.key_color)?, clamp_tolerance(cli.tolerance));
    let img = load_image(&cli.input)?;
    let keyed = remove_color(&img, &req)?;
    let keyed_count = keyed.pixels().filter(|p| p[3] == 0).count();
    info!(
        target_color = %req.target,
        tolerance = req.tolerance_percent,
        transparent = keyed_count,
        "color keyed"
    );

    let base = cli.name.clone().unwrap_or_else(|| file_stem(&cli.input));
    let file = export_keyed(&keyed, &base)?;
    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    let png_path = cli.out_dir.join(&file.file_name);
    fs::write(&png_path, &file.bytes).with_context(|| format!("write {}", png_path.display()))?;
    info!(?png_path, "keyed image written");
    Ok(())
}

impl TabArgs {
    fn to_splitter_config(&self) -> anyhow::Result<SplitterConfig> {
        Ok(SplitterConfig {
            grid: self.grid.to_grid_config(),
            color_key: self.key.to_request()?,
            tab: TabOptions {
                width: self.tab_width,
                height: self.tab_height,
                filter: self.filter.parse()?,
            },
            ..Default::default()
        })
    }
}

fn run_tab(cli: &TabArgs) -> anyhow::Result<()> {
    let cfg = overlay_config_file(cli.to_splitter_config()?, cli.config.as_deref())?;
    let mut img = load_image(&cli.input)?;
    if let Some(req) = &cfg.color_key {
        img = remove_color(&img, req)?;
    }
    let out = split_image(&img, &cfg.grid)?;
    let Some(tile) = out.by_sequence(cli.tile) else {
        anyhow::bail!(
            "tile {} out of range ({} tiles in a {}x{} grid)",
            cli.tile,
            out.tiles.len(),
            out.layout.rows,
            out.layout.cols
        );
    };
    let file = export_tab(tile, &cfg.tab)?;

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    let png_path = cli.out_dir.join(&file.file_name);
    fs::write(&png_path, &file.bytes).with_context(|| format!("write {}", png_path.display()))?;
    info!(?png_path, row = tile.row, col = tile.col, "tab written");
    Ok(())
}

fn run_layout(cli: &LayoutArgs) -> anyhow::Result<()> {
    let (w, h) = ImageReader::open(&cli.input)
        .with_context(|| format!("open {}", cli.input.display()))?
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| SplitterError::Decode(e.to_string()))
        .with_context(|| format!("read header of {}", cli.input.display()))?;
    let layout = GridLayout::compute(w, h, &cli.grid.to_grid_config())?;
    info!("{}", layout.stats().summary());

    let json = serde_json::to_string_pretty(&to_json_layout(&layout))?;
    match &cli.out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
            info!(?path, "layout written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let mut inc_set = None;
    if !include.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in include {
            b.add(Glob::new(pat)?);
        }
        inc_set = Some(b.build()?);
    }
    let mut exc_set = None;
    if !exclude.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in exclude {
            b.add(Glob::new(pat)?);
        }
        exc_set = Some(b.build()?);
    }
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    debug!(count = list.len(), "gathered inputs");
    Ok(list)
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude
        && ex.is_match(&s)
    {
        return true;
    }
    if let Some(inc) = include
        && !inc.is_match(&s)
    {
        return true;
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg")
    )
}

fn progress_bar(len: usize, enabled: bool) -> anyhow::Result<Option<indicatif::ProgressBar>> {
    use indicatif::{ProgressBar, ProgressStyle};
    if !enabled {
        return Ok(None);
    }
    let b = ProgressBar::new(len as u64);
    b.set_style(ProgressStyle::with_template(
        "{spinner:.green} splitting {pos}/{len} [{elapsed_precise}] {wide_msg}",
    )?);
    Ok(Some(b))
}

fn load_image(p: &Path) -> anyhow::Result<RgbaImage> {
    let bytes = fs::read(p).with_context(|| format!("read {}", p.display()))?;
    let img = decode_image(&bytes).with_context(|| format!("decode {}", p.display()))?;
    Ok(img)
}

fn file_stem(p: &Path) -> String {
    p.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("split_image")
        .to_string()
}

fn parse_color(s: &str) -> anyhow::Result<Rgb> {
    s.parse::<Rgb>()
        .with_context(|| format!("invalid key color {s:?} (expected #rrggbb)"))
}

fn clamp_grid_dim(v: i64) -> u32 {
    v.clamp(1, MAX_GRID_DIM as i64) as u32
}

fn clamp_padding(v: i64) -> u32 {
    v.clamp(0, u32::MAX as i64) as u32
}

fn clamp_tolerance(v: i64) -> u8 {
    v.clamp(0, 100) as u8
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

/// Config file sets options en bloc on top of the CLI values.
fn overlay_config_file(cfg: SplitterConfig, path: Option<&Path>) -> anyhow::Result<SplitterConfig> {
    let Some(path) = path else {
        return Ok(cfg);
    };
    let file = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let y: YamlConfig =
        serde_yaml::from_str(&file).with_context(|| format!("parse {}", path.display()))?;
    y.into_splitter_config(cfg)
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    rows: Option<i64>,
    cols: Option<i64>,
    pad_top: Option<i64>,
    pad_right: Option<i64>,
    pad_bottom: Option<i64>,
    pad_left: Option<i64>,
    key_color: Option<String>,
    tolerance: Option<i64>,
    tab_width: Option<u32>,
    tab_height: Option<u32>,
    filter: Option<String>,
    base_name: Option<String>,
}

impl YamlConfig {
    fn into_splitter_config(self, mut cfg: SplitterConfig) -> anyhow::Result<SplitterConfig> {
        if let Some(v) = self.rows {
            cfg.grid.rows = clamp_grid_dim(v);
        }
        if let Some(v) = self.cols {
            cfg.grid.cols = clamp_grid_dim(v);
        }
        if let Some(v) = self.pad_top {
            cfg.grid.padding.top = clamp_padding(v);
        }
        if let Some(v) = self.pad_right {
            cfg.grid.padding.right = clamp_padding(v);
        }
        if let Some(v) = self.pad_bottom {
            cfg.grid.padding.bottom = clamp_padding(v);
        }
        if let Some(v) = self.pad_left {
            cfg.grid.padding.left = clamp_padding(v);
        }
        if self.key_color.is_some() || self.tolerance.is_some() {
            let mut req = cfg.color_key.unwrap_or_default();
            if let Some(v) = &self.key_color {
                req.target = parse_color(v)?;
            }
            if let Some(v) = self.tolerance {
                req.tolerance_percent = clamp_tolerance(v);
            }
            cfg.color_key = Some(req);
        }
        if let Some(v) = self.tab_width {
            cfg.tab.width = v;
        }
        if let Some(v) = self.tab_height {
            cfg.tab.height = v;
        }
        if let Some(v) = self.filter {
            cfg.tab.filter = v.parse()?;
        }
        if let Some(v) = self.base_name {
            cfg.archive.base_name = v;
        }
        Ok(cfg)
    }
}
