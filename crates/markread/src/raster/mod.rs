//! 1-bit page rasters and the pixel measurements built on them.
//!
//! A [`Bitmap`] marks every pixel as ink or paper. Rectangle counts go
//! through a summed-area table and are clipped to the image, so callers may
//! pass windows that reach past the border.

mod box_corners;
mod corner_marker;
mod correction;
mod coverage;
mod mask;
mod pages;

pub use box_corners::find_box_corners;
pub use corner_marker::{calculate_matrix, find_corner_marker, CornerSearch};
pub use correction::calculate_correction_matrix_masked;
pub use coverage::{
    get_coverage, get_masked_coverage, get_masked_coverage_without_lines,
    get_masked_white_area_count,
};
pub use mask::{Mask, MaskShape};
pub use pages::page_count;

use image::{GrayImage, Luma};
use std::path::Path;

use crate::error::RecognitionError;

/// Luma values strictly below this count as ink.
pub const DEFAULT_INK_THRESHOLD: u8 = 128;

/// Binary raster with a summed-area table.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    ink: Vec<u8>,
    /// `(width + 1) × (height + 1)` prefix sums of `ink`.
    integral: Vec<u32>,
}

impl Bitmap {
    /// Build from a predicate returning `true` for ink.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut ink = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                ink.push(u8::from(f(x, y)));
            }
        }
        Self::from_ink(width, height, ink)
    }

    /// Threshold a grayscale image.
    pub fn from_gray(img: &GrayImage, threshold: u8) -> Self {
        let (w, h) = img.dimensions();
        let ink = img.pixels().map(|p| u8::from(p[0] < threshold)).collect();
        Self::from_ink(w, h, ink)
    }

    fn from_ink(width: u32, height: u32, ink: Vec<u8>) -> Self {
        let w = width as usize;
        let h = height as usize;
        let stride = w + 1;
        let mut integral = vec![0u32; stride * (h + 1)];
        for y in 0..h {
            let mut row = 0u32;
            for x in 0..w {
                row += u32::from(ink[y * w + x]);
                integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row;
            }
        }
        Self {
            width,
            height,
            ink,
            integral,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Ink test; out-of-range pixels are paper.
    pub fn is_ink(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return false;
        }
        self.ink[y as usize * self.width as usize + x as usize] != 0
    }

    /// Number of ink pixels in `[x, x + w) × [y, y + h)`, clipped to the image.
    pub fn count_black(&self, x: i64, y: i64, w: i64, h: i64) -> u64 {
        let x0 = x.clamp(0, i64::from(self.width)) as usize;
        let y0 = y.clamp(0, i64::from(self.height)) as usize;
        let x1 = (x + w).clamp(0, i64::from(self.width)) as usize;
        let y1 = (y + h).clamp(0, i64::from(self.height)) as usize;
        if x1 <= x0 || y1 <= y0 {
            return 0;
        }
        let stride = self.width as usize + 1;
        let at = |xx: usize, yy: usize| u64::from(self.integral[yy * stride + xx]);
        at(x1, y1) + at(x0, y0) - at(x0, y1) - at(x1, y0)
    }

    /// Copy of the window `[x, x + w) × [y, y + h)`; outside pixels are paper.
    pub fn crop(&self, x: i64, y: i64, w: u32, h: u32) -> Bitmap {
        Bitmap::from_fn(w, h, |cx, cy| {
            self.is_ink(x + i64::from(cx), y + i64::from(cy))
        })
    }

    pub fn rotated180(&self) -> Bitmap {
        let mut ink = self.ink.clone();
        ink.reverse();
        Self::from_ink(self.width, self.height, ink)
    }

    /// Render as black-on-white grayscale.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.ink[y as usize * self.width as usize + x as usize] != 0 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }
}

/// Load page `page_index` of a scan as a bitmap, rotated by 180° if
/// `rotated`. Only TIFF files hold more than one page.
pub fn load(
    path: &Path,
    page_index: u32,
    rotated: bool,
    threshold: u8,
) -> Result<Bitmap, RecognitionError> {
    let img = pages::read_gray(path, page_index)?;
    let bitmap = Bitmap::from_gray(&img, threshold);
    tracing::debug!(
        "loaded {} page {} ({}x{}, rotated={})",
        path.display(),
        page_index,
        bitmap.width(),
        bitmap.height(),
        rotated
    );
    Ok(if rotated { bitmap.rotated180() } else { bitmap })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Bitmap {
        Bitmap::from_fn(8, 6, |x, y| (x + y) % 2 == 0)
    }

    #[test]
    fn count_matches_brute_force() {
        let b = checker();
        for (x, y, w, h) in [(0, 0, 8, 6), (1, 2, 3, 3), (5, 0, 3, 1), (2, 2, 0, 4)] {
            let mut expected = 0;
            for yy in y..y + h {
                for xx in x..x + w {
                    expected += u64::from(b.is_ink(xx, yy));
                }
            }
            assert_eq!(b.count_black(x, y, w, h), expected, "window {x},{y},{w},{h}");
        }
    }

    #[test]
    fn count_clips_to_image() {
        let b = Bitmap::from_fn(4, 4, |_, _| true);
        assert_eq!(b.count_black(-2, -2, 4, 4), 4);
        assert_eq!(b.count_black(3, 3, 10, 10), 1);
        assert_eq!(b.count_black(10, 10, 5, 5), 0);
    }

    #[test]
    fn threshold_from_gray() {
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([[0u8, 127, 128][x as usize]]));
        let b = Bitmap::from_gray(&img, DEFAULT_INK_THRESHOLD);
        assert!(b.is_ink(0, 0));
        assert!(b.is_ink(1, 0));
        assert!(!b.is_ink(2, 0));
    }

    #[test]
    fn rotation_maps_corners() {
        let b = Bitmap::from_fn(5, 3, |x, y| x == 0 && y == 0);
        let r = b.rotated180();
        assert!(r.is_ink(4, 2));
        assert_eq!(r.count_black(0, 0, 5, 3), 1);
    }

    #[test]
    fn crop_pads_with_paper() {
        let b = Bitmap::from_fn(4, 4, |_, _| true);
        let c = b.crop(2, 2, 4, 4);
        assert_eq!(c.count_black(0, 0, 4, 4), 4);
    }

    #[test]
    fn loads_later_tiff_page_thresholded_and_rotated() {
        use tiff::encoder::{colortype, TiffEncoder};

        let dir = std::env::temp_dir().join(format!("markread-raster-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scans.tiff");
        {
            let file = std::fs::File::create(&path).unwrap();
            let mut encoder = TiffEncoder::new(std::io::BufWriter::new(file)).unwrap();
            let blank = vec![255u8; 6 * 4];
            let dot: Vec<u8> = (0..6 * 4).map(|i| if i == 0 { 10 } else { 200 }).collect();
            encoder.write_image::<colortype::Gray8>(6, 4, &blank).unwrap();
            encoder.write_image::<colortype::Gray8>(6, 4, &dot).unwrap();
        }

        let page = load(&path, 1, false, DEFAULT_INK_THRESHOLD).unwrap();
        assert!(page.is_ink(0, 0));
        assert_eq!(page.count_black(0, 0, 6, 4), 1);
        let turned = load(&path, 1, true, DEFAULT_INK_THRESHOLD).unwrap();
        assert!(turned.is_ink(5, 3));
        assert_eq!(load(&path, 0, false, DEFAULT_INK_THRESHOLD).unwrap().count_black(0, 0, 6, 4), 0);
        assert_eq!(
            load(&path, 2, false, DEFAULT_INK_THRESHOLD).unwrap_err().code(),
            "image_load"
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load(Path::new("/nonexistent/scan.tif"), 0, false, DEFAULT_INK_THRESHOLD).unwrap_err();
        assert_eq!(err.code(), "image_load");
    }
}
