//! Page access for multi-page scan files.
//!
//! TIFF files are decoded page by page through the `tiff` crate. Every
//! other format goes through `image` and holds a single page.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::GrayImage;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::ColorType as TiffColorType;

use crate::error::RecognitionError;

fn load_error(path: &Path, message: impl ToString) -> RecognitionError {
    RecognitionError::ImageLoad {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
}

fn open_tiff(path: &Path) -> Result<Decoder<BufReader<File>>, RecognitionError> {
    let file = File::open(path).map_err(|e| load_error(path, e))?;
    Decoder::new(BufReader::new(file)).map_err(|e| load_error(path, e))
}

/// Number of pages in a scan file.
pub fn page_count(path: &Path) -> Result<u32, RecognitionError> {
    if !is_tiff(path) {
        image::image_dimensions(path).map_err(|e| load_error(path, e))?;
        return Ok(1);
    }
    let mut decoder = open_tiff(path)?;
    let mut count = 1;
    while decoder.more_images() {
        decoder.next_image().map_err(|e| load_error(path, e))?;
        count += 1;
    }
    Ok(count)
}

/// Grayscale pixels of page `page_index` of a scan file.
pub(crate) fn read_gray(path: &Path, page_index: u32) -> Result<GrayImage, RecognitionError> {
    if !is_tiff(path) {
        if page_index != 0 {
            return Err(load_error(
                path,
                format!("page {} requested but the file holds a single page", page_index),
            ));
        }
        let img = image::open(path).map_err(|e| load_error(path, e))?;
        return Ok(img.to_luma8());
    }

    let mut decoder = open_tiff(path)?;
    for seen in 1..=page_index {
        if !decoder.more_images() {
            return Err(load_error(
                path,
                format!("page {} requested but the file has {} pages", page_index, seen),
            ));
        }
        decoder.next_image().map_err(|e| load_error(path, e))?;
    }
    let (width, height) = decoder.dimensions().map_err(|e| load_error(path, e))?;
    let color = decoder.colortype().map_err(|e| load_error(path, e))?;
    let data = decoder.read_image().map_err(|e| load_error(path, e))?;
    to_gray(width, height, color, data)
        .ok_or_else(|| load_error(path, format!("unsupported TIFF layout {:?}", color)))
}

fn luma(rgb: &[u8]) -> u8 {
    let [r, g, b] = [rgb[0], rgb[1], rgb[2]].map(u32::from);
    ((299 * r + 587 * g + 114 * b) / 1000) as u8
}

/// Decoded TIFF samples as 8-bit gray. Bilevel rows are packed MSB first
/// with a set bit for paper.
fn to_gray(width: u32, height: u32, color: TiffColorType, data: DecodingResult) -> Option<GrayImage> {
    let w = width as usize;
    let pixels = w * height as usize;
    let gray: Vec<u8> = match (data, color) {
        (DecodingResult::U8(d), TiffColorType::Gray(8)) => d,
        (DecodingResult::U8(d), TiffColorType::Gray(1)) => {
            let stride = (w + 7) / 8;
            (0..pixels)
                .map(|i| {
                    let (x, y) = (i % w, i / w);
                    let byte = *d.get(y * stride + x / 8)?;
                    Some(if byte >> (7 - x % 8) & 1 == 1 { 255 } else { 0 })
                })
                .collect::<Option<Vec<u8>>>()?
        }
        (DecodingResult::U16(d), TiffColorType::Gray(16)) => d.iter().map(|v| (v >> 8) as u8).collect(),
        (DecodingResult::U8(d), TiffColorType::RGB(8)) => d.chunks_exact(3).map(luma).collect(),
        (DecodingResult::U8(d), TiffColorType::RGBA(8)) => d.chunks_exact(4).map(luma).collect(),
        _ => return None,
    };
    GrayImage::from_raw(width, height, gray)
}
