use crate::config::ArchiveOptions;
use crate::model::{GridLayout, Tile};
use serde_json::{Value, json};

/// Describe a split as JSON: `{ layout, stats, tiles: [...] }`.
/// Each tile carries the archive entry `name` it is stored under, its grid
/// position, sequence and the source rectangle it was cut from.
pub fn to_json_manifest(layout: &GridLayout, tiles: &[Tile], opts: &ArchiveOptions) -> Value {
    let tiles_val: Vec<Value> = tiles
        .iter()
        .map(|t| {
            let source = json!({"x": t.source.x, "y": t.source.y, "w": t.source.w, "h": t.source.h});
            json!({
                "name": opts.entry_name(t.row, t.col),
                "row": t.row,
                "col": t.col,
                "sequence": t.sequence,
                "source": source,
                "size": {"w": t.width(), "h": t.height()},
            })
        })
        .collect();
    json!({
        "archive": opts.archive_file_name(),
        "layout": layout,
        "stats": layout.stats(),
        "tiles": tiles_val,
    })
}

/// Layout-only variant (no pixel data needed): cells are listed from the
/// geometry alone.
pub fn to_json_layout(layout: &GridLayout) -> Value {
    let cells: Vec<Value> = layout
        .cells()
        .map(|(row, col)| {
            let r = layout.cell_rect(row, col);
            json!({
                "row": row,
                "col": col,
                "sequence": row as usize * layout.cols as usize + col as usize,
                "source": {"x": r.x, "y": r.y, "w": r.w, "h": r.h},
            })
        })
        .collect();
    json!({
        "layout": layout,
        "stats": layout.stats(),
        "dropped": {"columns": layout.dropped_columns(), "rows": layout.dropped_rows()},
        "cells": cells,
    })
}
