use grid_splitter_core::prelude::*;
use image::{Rgba, RgbaImage};
use rand::Rng;

/// Each pixel encodes its own coordinates so crops can be checked exactly.
fn coords_image(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x / 256) + (y / 256) * 16) as u8, 255])
    })
}

fn assert_crop(img: &RgbaImage, tile: &Tile) {
    for y in 0..tile.height() {
        for x in 0..tile.width() {
            assert_eq!(
                tile.rgba.get_pixel(x, y),
                img.get_pixel(tile.source.x + x, tile.source.y + y),
                "tile {} pixel ({x},{y})",
                tile.sequence
            );
        }
    }
}

#[test]
fn even_grid_without_padding() {
    let img = coords_image(120, 80);
    let cfg = GridConfig::builder().with_grid(2, 3).build();
    let out = split_image(&img, &cfg).expect("split");

    assert_eq!(out.layout.active, Rect::new(0, 0, 120, 80));
    assert_eq!((out.layout.tile_width, out.layout.tile_height), (40, 40));
    assert_eq!(out.tiles.len(), 6);
    let seqs: Vec<usize> = out.tiles.iter().map(|t| t.sequence).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4, 5]);

    let first = out.tile(0, 0).expect("tile 0,0");
    assert_eq!(first.source, Rect::new(0, 0, 40, 40));
    let last = out.tile(1, 2).expect("tile 1,2");
    assert_eq!(last.source, Rect::new(80, 40, 40, 40));
    assert_eq!(last.sequence, 5);

    for t in &out.tiles {
        assert_crop(&img, t);
    }
}

#[test]
fn remainder_columns_are_dropped() {
    let img = coords_image(121, 80);
    let cfg = GridConfig::builder().with_grid(2, 3).build();
    let out = split_image(&img, &cfg).expect("split");

    assert_eq!(out.layout.active.w, 121);
    assert_eq!(out.layout.tile_width, 40);
    assert_eq!(out.layout.dropped_columns(), 1);
    assert_eq!(out.layout.dropped_rows(), 0);

    for row in 0..2 {
        let t = out.tile(row, 2).expect("right column tile");
        assert_eq!(t.source.x, 80);
        assert_eq!(t.source.right(), 120);
        // last copied column is x = 119, never 120
        assert_eq!(t.rgba.get_pixel(39, 0)[0], 119);
    }
    let stats = out.layout.stats();
    assert_eq!(stats.dropped_area, 80);
    assert!(stats.coverage < 1.0);
}

#[test]
fn padding_offsets_the_grid() {
    let img = coords_image(100, 60);
    let cfg = GridConfig::builder()
        .with_grid(2, 2)
        .padding(Padding::new(4, 6, 8, 10))
        .build();
    let out = split_image(&img, &cfg).expect("split");

    assert_eq!(out.layout.active, Rect::new(10, 4, 84, 48));
    assert_eq!((out.layout.tile_width, out.layout.tile_height), (42, 24));
    assert_eq!(out.tile(0, 0).unwrap().source, Rect::new(10, 4, 42, 24));
    assert_eq!(out.tile(1, 1).unwrap().source, Rect::new(52, 28, 42, 24));
    for t in &out.tiles {
        assert_crop(&img, t);
    }
}

#[test]
fn row_major_order_and_uniform_size() {
    let mut rng = rand::thread_rng();
    for _ in 0..40 {
        let w = rng.gen_range(1..=200);
        let h = rng.gen_range(1..=200);
        let rows = rng.gen_range(1..=12);
        let cols = rng.gen_range(1..=12);
        let img = coords_image(w, h);
        let cfg = GridConfig::builder()
            .with_grid(rows, cols)
            .padding(Padding::new(
                rng.gen_range(0..20),
                rng.gen_range(0..20),
                rng.gen_range(0..20),
                rng.gen_range(0..20),
            ))
            .build();
        let tiles = partition(&img, &cfg).expect("split");

        assert_eq!(tiles.len(), (rows * cols) as usize);
        let (tw, th) = (tiles[0].width(), tiles[0].height());
        for (i, t) in tiles.iter().enumerate() {
            assert_eq!(t.sequence, i);
            assert_eq!(t.sequence, (t.row * cols + t.col) as usize);
            assert_eq!((t.width(), t.height()), (tw, th));
            assert_eq!(t.pixels().len(), (tw * th * 4) as usize);
        }
        for pair in tiles.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!((a.row, a.col) < (b.row, b.col));
        }
    }
}

#[test]
fn padding_never_grows_tiles() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let w = rng.gen_range(1..=300);
        let h = rng.gen_range(1..=300);
        let base = GridConfig::builder()
            .with_grid(rng.gen_range(1..=10), rng.gen_range(1..=10))
            .padding(Padding::new(
                rng.gen_range(0..50),
                rng.gen_range(0..50),
                rng.gen_range(0..50),
                rng.gen_range(0..50),
            ))
            .build();
        let before = GridLayout::compute(w, h, &base).expect("layout");

        let bump = rng.gen_range(1..40);
        let mut grown = base;
        match rng.gen_range(0..4) {
            0 => grown.padding.top += bump,
            1 => grown.padding.right += bump,
            2 => grown.padding.bottom += bump,
            _ => grown.padding.left += bump,
        }
        let after = GridLayout::compute(w, h, &grown).expect("layout");

        assert!(after.active.w <= before.active.w);
        assert!(after.active.h <= before.active.h);
        assert!(after.tile_width <= before.tile_width);
        assert!(after.tile_height <= before.tile_height);
    }
}

#[test]
fn layout_matches_split_geometry() {
    let cfg = GridConfig::builder()
        .with_grid(3, 4)
        .padding(Padding::uniform(3))
        .build();
    let layout = GridLayout::compute(97, 61, &cfg).expect("layout");
    let out = split_image(&coords_image(97, 61), &cfg).expect("split");
    assert_eq!(layout, out.layout);
    for t in &out.tiles {
        assert_eq!(t.source, layout.cell_rect(t.row, t.col));
    }
    assert_eq!(layout.covered(), Rect::new(3, 3, 88, 54));
}

#[test]
fn lookup_helpers_respect_bounds() {
    let out = split_image(&coords_image(30, 30), &GridConfig::new(3, 3)).expect("split");
    assert!(out.tile(3, 0).is_none());
    assert!(out.tile(0, 3).is_none());
    assert_eq!(out.by_sequence(4).unwrap().row, 1);
    assert_eq!(out.by_sequence(4).unwrap().col, 1);
    assert!(out.by_sequence(9).is_none());
}
