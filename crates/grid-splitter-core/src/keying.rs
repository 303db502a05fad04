use crate::codec::ensure_nonempty;
use crate::config::ColorKeyRequest;
use crate::error::Result;
use crate::model::Rgb;
use image::RgbaImage;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Squared RGB distance between a pixel's color channels and `target`.
fn distance_sq(px: &[u8], target: Rgb) -> u32 {
    let dr = px[0] as i32 - target.r as i32;
    let dg = px[1] as i32 - target.g as i32;
    let db = px[2] as i32 - target.b as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Euclidean RGB distance between `color` and `target`, in `0.0..=441.68`.
pub fn key_distance(color: [u8; 3], target: Rgb) -> f64 {
    (distance_sq(&color, target) as f64).sqrt()
}

#[instrument(skip_all, fields(target = %req.target, tolerance = req.tolerance_percent))]
/// Returns a copy of `image` where every pixel within the tolerance of the
/// target color has alpha 0. Color channels are never modified and pixels
/// outside the tolerance keep their alpha.
///
/// The threshold is `tolerance / 100 * 441`. A tolerance of 100 or more keys
/// every pixel, including those slightly farther than 441 from the target.
pub fn remove_color(image: &RgbaImage, req: &ColorKeyRequest) -> Result<RgbaImage> {
    ensure_nonempty(image)?;
    let (w, h) = image.dimensions();
    let limit_sq = if req.tolerance_percent >= 100 {
        None
    } else {
        let t = req.threshold();
        Some(t * t)
    };

    let mut out = image.clone();
    let keyed = key_pixels(&mut out, req.target, limit_sq);
    debug!(keyed, total = (w as u64) * (h as u64), "color key applied");
    Ok(out)
}

/// Zeroes alpha of matching pixels in place; returns how many matched.
/// `None` matches everything.
fn key_pixels(buf: &mut [u8], target: Rgb, limit_sq: Option<f64>) -> usize {
    let key = |px: &mut [u8]| -> usize {
        let hit = match limit_sq {
            None => true,
            Some(limit) => distance_sq(px, target) as f64 <= limit,
        };
        if hit {
            px[3] = 0;
            1
        } else {
            0
        }
    };

    #[cfg(feature = "parallel")]
    let keyed = buf.par_chunks_exact_mut(4).map(key).sum();
    #[cfg(not(feature = "parallel"))]
    let keyed = buf.chunks_exact_mut(4).map(key).sum();
    keyed
}
