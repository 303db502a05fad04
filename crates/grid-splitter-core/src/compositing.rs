use crate::model::Rect;
use image::RgbaImage;

/// Exact `area.w x area.h` copy of `area` from `src`. Pixels that fall outside
/// `src` come out fully transparent, so the result size never shrinks.
///
/// Rows are copied as whole slices, no per-pixel blending.
pub fn copy_region(src: &RgbaImage, area: Rect) -> RgbaImage {
    let mut out = RgbaImage::new(area.w, area.h);
    let (sw, sh) = src.dimensions();
    // area.x at or past the right edge leaves nothing to copy
    let x0 = area.x.min(sw);
    let span = area.right().min(sw).saturating_sub(x0);
    if span == 0 {
        return out;
    }

    let src_stride = sw as usize * 4;
    let dst_stride = area.w as usize * 4;
    let n = span as usize * 4;
    let src_raw = src.as_raw();
    let dst: &mut [u8] = &mut out;
    for yy in 0..area.h {
        let iy = area.y.saturating_add(yy);
        if iy >= sh {
            break;
        }
        let s = iy as usize * src_stride + x0 as usize * 4;
        let d = yy as usize * dst_stride;
        dst[d..d + n].copy_from_slice(&src_raw[s..s + n]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 7, 255]))
    }

    #[test]
    fn copy_inside_matches_source() {
        let src = gradient(10, 8);
        let out = copy_region(&src, Rect::new(3, 2, 4, 5));
        assert_eq!(out.dimensions(), (4, 5));
        for y in 0..5 {
            for x in 0..4 {
                assert_eq!(out.get_pixel(x, y), src.get_pixel(x + 3, y + 2));
            }
        }
    }

    #[test]
    fn copy_past_edge_is_transparent() {
        let src = gradient(4, 4);
        let out = copy_region(&src, Rect::new(2, 3, 4, 3));
        assert_eq!(out.dimensions(), (4, 3));
        assert_eq!(out.get_pixel(0, 0), src.get_pixel(2, 3));
        assert_eq!(out.get_pixel(1, 0), src.get_pixel(3, 3));
        assert_eq!(out.get_pixel(2, 0)[3], 0);
        assert_eq!(out.get_pixel(0, 1)[3], 0);
    }

    #[test]
    fn copy_fully_outside_is_blank() {
        let src = gradient(4, 4);
        let out = copy_region(&src, Rect::new(40, 40, 2, 2));
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}
