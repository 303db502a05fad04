use crate::error::{Result, SplitterError};
use image::{ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;

/// Decodes an encoded image (format guessed from its bytes) into RGBA8.
/// Zero-area results are rejected.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| SplitterError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| SplitterError::Decode(e.to_string()))?
        .to_rgba8();
    ensure_nonempty(&img)?;
    Ok(img)
}

/// Wraps a raw RGBA8 buffer; its length must be exactly `width * height * 4`.
pub fn image_from_raw(width: u32, height: u32, rgba: Vec<u8>) -> Result<RgbaImage> {
    let len = rgba.len();
    let img = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        SplitterError::Decode(format!(
            "buffer of {len} bytes does not hold a {width}x{height} RGBA image"
        ))
    })?;
    ensure_nonempty(&img)?;
    Ok(img)
}

pub(crate) fn ensure_nonempty(img: &RgbaImage) -> Result<()> {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(SplitterError::Decode(format!(
            "source image has zero area ({w}x{h})"
        )));
    }
    Ok(())
}

/// Lossless PNG encoding, alpha preserved.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| SplitterError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}
