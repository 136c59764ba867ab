//! Rasterised checkbox masks.

use crate::geometry::{Affine2, Rect};

/// Printed shape of a checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskShape {
    #[default]
    Box,
    Ellipse,
}

/// Binary mask placed at a pixel origin.
#[derive(Debug, Clone)]
pub struct Mask {
    origin: [i64; 2],
    width: u32,
    height: u32,
    bits: Vec<bool>,
    count: u64,
}

impl Mask {
    /// Band of width `line_width` mm centred on the outline of `rect`.
    pub fn outline(matrix: &Affine2, rect: &Rect, shape: MaskShape, line_width: f64) -> Mask {
        let half = line_width / 2.0;
        let outer = rect.grow(half);
        let inner = rect.grow(-half);
        Self::render(matrix, &outer, |x, y| {
            inside(shape, &outer, x, y) && !inside(shape, &inner, x, y)
        })
    }

    /// Interior of `rect` shrunk by `inset` mm on every side.
    pub fn inner(matrix: &Affine2, rect: &Rect, shape: MaskShape, inset: f64) -> Mask {
        let area = rect.grow(-inset);
        Self::render(matrix, &area, |x, y| inside(shape, &area, x, y))
    }

    fn render(matrix: &Affine2, extent: &Rect, test: impl Fn(f64, f64) -> bool) -> Mask {
        let empty = Mask {
            origin: [0, 0],
            width: 0,
            height: 0,
            bits: Vec::new(),
            count: 0,
        };
        if extent.width <= 0.0 || extent.height <= 0.0 {
            return empty;
        }
        let Some(inverse) = matrix.inverse() else {
            return empty;
        };

        let corners = [
            matrix.transform_point(extent.x, extent.y),
            matrix.transform_point(extent.right(), extent.y),
            matrix.transform_point(extent.x, extent.bottom()),
            matrix.transform_point(extent.right(), extent.bottom()),
        ];
        let min_x = corners.iter().map(|c| c[0]).fold(f64::INFINITY, f64::min).floor() as i64;
        let min_y = corners.iter().map(|c| c[1]).fold(f64::INFINITY, f64::min).floor() as i64;
        let max_x = corners.iter().map(|c| c[0]).fold(f64::NEG_INFINITY, f64::max).ceil() as i64;
        let max_y = corners.iter().map(|c| c[1]).fold(f64::NEG_INFINITY, f64::max).ceil() as i64;
        let width = (max_x - min_x).max(0) as u32;
        let height = (max_y - min_y).max(0) as u32;

        let mut bits = Vec::with_capacity(width as usize * height as usize);
        let mut count = 0u64;
        for py in 0..height {
            for px in 0..width {
                let [x, y] = inverse.transform_point(
                    (min_x + i64::from(px)) as f64 + 0.5,
                    (min_y + i64::from(py)) as f64 + 0.5,
                );
                let on = test(x, y);
                count += u64::from(on);
                bits.push(on);
            }
        }
        Mask {
            origin: [min_x, min_y],
            width,
            height,
            bits,
            count,
        }
    }

    /// Pixel position the mask was rendered at.
    pub fn origin(&self) -> [i64; 2] {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of set pixels.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[y as usize * self.width as usize + x as usize]
    }
}

fn inside(shape: MaskShape, r: &Rect, x: f64, y: f64) -> bool {
    if r.width <= 0.0 || r.height <= 0.0 {
        return false;
    }
    match shape {
        MaskShape::Box => x >= r.x && x <= r.right() && y >= r.y && y <= r.bottom(),
        MaskShape::Ellipse => {
            let rx = r.width / 2.0;
            let ry = r.height / 2.0;
            let dx = (x - (r.x + rx)) / rx;
            let dy = (y - (r.y + ry)) / ry;
            dx * dx + dy * dy <= 1.0
        }
    }
}
