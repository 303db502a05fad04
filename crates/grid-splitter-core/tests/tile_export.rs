use grid_splitter_core::prelude::*;
use grid_splitter_core::{tab_file_name, tile_file_name, to_json_manifest};
use image::{Rgba, RgbaImage};
use std::collections::BTreeSet;
use std::io::{Cursor, Read};

fn checker(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        if (x / 10 + y / 10) % 2 == 0 {
            Rgba([255, 255, 255, 0])
        } else {
            Rgba([x as u8, y as u8, 90, 255])
        }
    })
}

fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open zip");
    let mut file = archive.by_name(name).expect("entry");
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).expect("read entry");
    buf
}

#[test]
fn archive_has_one_entry_per_tile() {
    let img = checker(120, 80);
    let tiles = partition(&img, &GridConfig::new(2, 3)).expect("split");
    let out = archive_tiles(&tiles, &ArchiveOptions::default()).expect("archive");

    assert_eq!(out.file_name, "split_image_tiles.zip");
    let archive = zip::ZipArchive::new(Cursor::new(&out.bytes)).expect("open zip");
    assert_eq!(archive.len(), 6);

    let names: BTreeSet<String> = archive.file_names().map(str::to_string).collect();
    let mut expected = BTreeSet::new();
    for row in 1..=2 {
        for col in 1..=3 {
            expected.insert(format!("tiles/split_image_row{row}_col{col}.png"));
        }
    }
    assert_eq!(names, expected);
    assert_eq!(out.entries.len(), 6);
    assert_eq!(out.entries[0], "tiles/split_image_row1_col1.png");
    assert_eq!(out.entries[5], "tiles/split_image_row2_col3.png");
}

#[test]
fn archived_pngs_are_lossless() {
    let img = checker(60, 40);
    let tiles = partition(&img, &GridConfig::new(2, 2)).expect("split");
    let out = archive_tiles(&tiles, &ArchiveOptions::new("sheet")).expect("archive");
    assert_eq!(out.file_name, "sheet_tiles.zip");

    for t in &tiles {
        let name = format!("tiles/sheet_row{}_col{}.png", t.row + 1, t.col + 1);
        let png = read_entry(&out.bytes, &name);
        let decoded = image::load_from_memory(&png).expect("decode").to_rgba8();
        assert_eq!(decoded, t.rgba, "{name} round-trips with alpha");
    }
}

#[test]
fn identical_tiles_are_all_archived() {
    let img = RgbaImage::from_pixel(40, 40, Rgba([1, 2, 3, 255]));
    let tiles = partition(&img, &GridConfig::new(4, 4)).expect("split");
    let out = archive_tiles(&tiles, &ArchiveOptions::default()).expect("archive");
    let archive = zip::ZipArchive::new(Cursor::new(&out.bytes)).expect("open zip");
    assert_eq!(archive.len(), 16);
}

#[test]
fn duplicate_positions_fail_the_batch() {
    let img = checker(20, 20);
    let mut tiles = partition(&img, &GridConfig::new(1, 2)).expect("split");
    tiles.push(tiles[0].clone());
    let err = archive_tiles(&tiles, &ArchiveOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Packaging);
}

#[test]
fn empty_tile_list_is_a_packaging_failure() {
    let err = archive_tiles(&[], &ArchiveOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Packaging);
}

#[test]
fn one_unencodable_tile_fails_the_whole_archive() {
    let img = checker(30, 10);
    let mut tiles = partition(&img, &GridConfig::new(1, 3)).expect("split");
    tiles[1].rgba = RgbaImage::new(0, 0);
    let err = archive_tiles(&tiles, &ArchiveOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Packaging);
}

#[test]
fn tab_of_empty_tile_is_an_encode_failure() {
    let img = checker(30, 10);
    let mut tiles = partition(&img, &GridConfig::new(1, 3)).expect("split");
    tiles[1].rgba = RgbaImage::new(0, 0);
    let err = export_tab(&tiles[1], &TabOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encode);
}

#[test]
fn tab_export_has_fixed_size_and_padded_name() {
    let img = checker(120, 80);
    let tiles = partition(&img, &GridConfig::new(2, 3)).expect("split");
    let tab = export_tab(&tiles[3], &TabOptions::default()).expect("tab");

    assert_eq!(tab.file_name, "03_tab.png");
    assert_eq!((tab.width, tab.height), (96, 74));
    let decoded = image::load_from_memory(&tab.bytes).expect("decode");
    assert_eq!((decoded.width(), decoded.height()), (96, 74));
}

#[test]
fn tab_size_is_independent_of_tile_size() {
    let img = checker(300, 7);
    for (rows, cols) in [(1, 1), (7, 1), (1, 300), (3, 50)] {
        let tiles = partition(&img, &GridConfig::new(rows, cols)).expect("split");
        for opts in [TabOptions::default(), TabOptions::new(13, 200)] {
            let tab = export_tab(&tiles[0], &opts).expect("tab");
            let decoded = image::load_from_memory(&tab.bytes).expect("decode");
            assert_eq!((decoded.width(), decoded.height()), (opts.width, opts.height));
        }
    }
}

#[test]
fn tab_keeps_transparency() {
    let img = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 0]));
    let tiles = partition(&img, &GridConfig::new(1, 1)).expect("split");
    let tab = export_tab(&tiles[0], &TabOptions::default()).expect("tab");
    let decoded = image::load_from_memory(&tab.bytes).expect("decode").to_rgba8();
    assert!(decoded.pixels().all(|p| p[3] == 0));
}

#[test]
fn tab_with_zero_size_is_an_encode_failure() {
    let tiles = partition(&checker(10, 10), &GridConfig::new(1, 1)).expect("split");
    let err = export_tab(&tiles[0], &TabOptions::new(0, 74)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encode);
}

#[test]
fn file_names_pad_to_two_digits() {
    assert_eq!(tab_file_name(0), "00_tab.png");
    assert_eq!(tab_file_name(7), "07_tab.png");
    assert_eq!(tab_file_name(42), "42_tab.png");
    assert_eq!(tab_file_name(123), "123_tab.png");
    assert_eq!(tile_file_name(5), "05.png");
}

#[test]
fn single_tile_and_keyed_exports() {
    let img = checker(40, 20);
    let tiles = partition(&img, &GridConfig::new(1, 2)).expect("split");
    let single = export_tile(&tiles[1]).expect("tile");
    assert_eq!(single.file_name, "01.png");
    assert_eq!((single.width, single.height), (20, 20));

    let keyed = export_keyed(&img, "photo").expect("keyed");
    assert_eq!(keyed.file_name, "photo_keyed.png");
    let decoded = image::load_from_memory(&keyed.bytes).expect("decode").to_rgba8();
    assert_eq!(decoded, img);
}

#[test]
fn manifest_lists_archive_names() {
    let img = checker(50, 50);
    let out = split_image(&img, &GridConfig::new(2, 2)).expect("split");
    let opts = ArchiveOptions::default();
    let manifest = to_json_manifest(&out.layout, &out.tiles, &opts);

    assert_eq!(manifest["archive"], "split_image_tiles.zip");
    let tiles = manifest["tiles"].as_array().expect("tiles array");
    assert_eq!(tiles.len(), 4);
    assert_eq!(tiles[3]["name"], "tiles/split_image_row2_col2.png");
    assert_eq!(tiles[3]["source"]["x"], 25);
    assert_eq!(manifest["layout"]["tile_width"], 25);
    assert_eq!(manifest["stats"]["num_tiles"], 4);
}
