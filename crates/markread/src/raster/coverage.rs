//! Ink coverage measurements.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use super::{Bitmap, Mask};
use crate::geometry::Affine2;

/// Fraction of ink inside the mm rectangle, measured on its pixel bounding
/// rectangle at the transformed top-left corner.
pub fn get_coverage(bitmap: &Bitmap, matrix: &Affine2, x: f64, y: f64, w: f64, h: f64) -> f64 {
    let [px, py] = matrix.transform_point(x, y);
    let [pw, ph] = matrix.transform_distance(w, h);
    let (px, py, pw, ph) = (px as i64, py as i64, pw as i64, ph as i64);
    if pw <= 0 || ph <= 0 {
        return 0.0;
    }
    bitmap.count_black(px, py, pw, ph) as f64 / (pw * ph) as f64
}

/// Collect the ink pixels below the mask placed at `(x, y)`.
fn masked_ink(bitmap: &Bitmap, mask: &Mask, x: i64, y: i64) -> Vec<bool> {
    let (w, h) = (mask.width(), mask.height());
    let mut ink = Vec::with_capacity(w as usize * h as usize);
    for my in 0..h {
        for mx in 0..w {
            ink.push(
                mask.get(mx, my) && bitmap.is_ink(x + i64::from(mx), y + i64::from(my)),
            );
        }
    }
    ink
}

/// Fraction of mask pixels that are ink with the mask placed at `(x, y)`.
pub fn get_masked_coverage(bitmap: &Bitmap, mask: &Mask, x: i64, y: i64) -> f64 {
    if mask.count() == 0 {
        return 0.0;
    }
    let ink = masked_ink(bitmap, mask, x, y).iter().filter(|&&b| b).count();
    ink as f64 / mask.count() as f64
}

/// Masked coverage after erasing up to `line_count` straight strokes.
///
/// Each round finds the horizontal or vertical band of `line_width` pixels
/// holding the most ink. A band counts as a stroke when at least half of its
/// masked pixels are ink; it is then erased. Rounds stop at the first band
/// that is not a stroke.
pub fn get_masked_coverage_without_lines(
    bitmap: &Bitmap,
    mask: &Mask,
    x: i64,
    y: i64,
    line_width: f64,
    line_count: u32,
) -> f64 {
    if mask.count() == 0 {
        return 0.0;
    }
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let band = (line_width.round() as usize).max(1);
    let mut ink = masked_ink(bitmap, mask, x, y);

    for _ in 0..line_count {
        let mut best: Option<(bool, usize, usize, usize)> = None; // (horizontal, start, ink, masked)
        for horizontal in [true, false] {
            let n = if horizontal { h } else { w };
            if n < band {
                continue;
            }
            for start in 0..=n - band {
                let mut band_ink = 0;
                let mut band_mask = 0;
                for k in start..start + band {
                    let len = if horizontal { w } else { h };
                    for t in 0..len {
                        let (cx, cy) = if horizontal { (t, k) } else { (k, t) };
                        band_mask += usize::from(mask.get(cx as u32, cy as u32));
                        band_ink += usize::from(ink[cy * w + cx]);
                    }
                }
                if best.map_or(true, |b| band_ink > b.2) {
                    best = Some((horizontal, start, band_ink, band_mask));
                }
            }
        }

        let Some((horizontal, start, band_ink, band_mask)) = best else {
            break;
        };
        if band_mask == 0 || band_ink * 2 < band_mask {
            break;
        }
        for k in start..start + band {
            let len = if horizontal { w } else { h };
            for t in 0..len {
                let (cx, cy) = if horizontal { (t, k) } else { (k, t) };
                ink[cy * w + cx] = false;
            }
        }
    }

    ink.iter().filter(|&&b| b).count() as f64 / mask.count() as f64
}

/// Count white regions inside the mask and the resulting filled fraction.
///
/// Paper regions (4-connected) smaller than `min_size` of the mask area are
/// treated as ink. The count covers regions whose share lies within
/// `[min_size, max_size]`; the filled fraction is the share of the mask not
/// covered by paper regions of at least `min_size`.
pub fn get_masked_white_area_count(
    bitmap: &Bitmap,
    mask: &Mask,
    x: i64,
    y: i64,
    min_size: f64,
    max_size: f64,
) -> (u32, f64) {
    if mask.count() == 0 {
        return (0, 0.0);
    }
    let total = mask.count() as f64;
    let white = GrayImage::from_fn(mask.width(), mask.height(), |mx, my| {
        let paper = mask.get(mx, my) && !bitmap.is_ink(x + i64::from(mx), y + i64::from(my));
        Luma([if paper { 255u8 } else { 0u8 }])
    });
    let labels = connected_components(&white, Connectivity::Four, Luma([0u8]));

    let mut sizes: Vec<u64> = Vec::new();
    for p in labels.pixels() {
        let label = p[0] as usize;
        if label == 0 {
            continue;
        }
        if sizes.len() < label {
            sizes.resize(label, 0);
        }
        sizes[label - 1] += 1;
    }

    let mut count = 0u32;
    let mut open = 0u64;
    for &size in &sizes {
        let share = size as f64 / total;
        if share >= min_size {
            open += size;
            if share <= max_size {
                count += 1;
            }
        }
    }
    (count, 1.0 - open as f64 / total)
}
