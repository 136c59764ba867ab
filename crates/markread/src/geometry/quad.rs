//! Quadrilateral region in millimetres with tile iteration for scanning.

use super::corners::{BOTTOM_LEFT, BOTTOM_RIGHT, TOP_LEFT, TOP_RIGHT};

/// Four corners in `TOP_LEFT, TOP_RIGHT, BOTTOM_LEFT, BOTTOM_RIGHT` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrilateral {
    pub corners: [[f64; 2]; 4],
}

/// Axis-aligned rectangle `(x, y, width, height)` in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Grow by `d` on every side.
    pub fn grow(&self, d: f64) -> Rect {
        Rect::new(self.x - d, self.y - d, self.width + 2.0 * d, self.height + 2.0 * d)
    }

    /// True when the rectangles overlap or touch within `margin`.
    pub fn touches(&self, other: &Rect, margin: f64) -> bool {
        self.x - margin <= other.right()
            && other.x <= self.right() + margin
            && self.y - margin <= other.bottom()
            && other.y <= self.bottom() + margin
    }
}

impl Quadrilateral {
    pub fn from_rect(r: &Rect) -> Self {
        Self {
            corners: [
                [r.x, r.y],
                [r.right(), r.y],
                [r.x, r.bottom()],
                [r.right(), r.bottom()],
            ],
        }
    }

    /// Bilinear interpolation, `(0, 0)` is the top-left corner.
    pub fn point_at(&self, u: f64, v: f64) -> [f64; 2] {
        let c = &self.corners;
        let lerp = |a: [f64; 2], b: [f64; 2], t: f64| [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t];
        let top = lerp(c[TOP_LEFT], c[TOP_RIGHT], u);
        let bottom = lerp(c[BOTTOM_LEFT], c[BOTTOM_RIGHT], u);
        lerp(top, bottom, v)
    }

    pub fn bounding_box(&self) -> Rect {
        let xs = self.corners.map(|c| c[0]);
        let ys = self.corners.map(|c| c[1]);
        let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Mean lengths of the horizontal and vertical edges.
    pub fn mean_size(&self) -> [f64; 2] {
        let c = &self.corners;
        let dist = |a: [f64; 2], b: [f64; 2]| ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
        [
            (dist(c[TOP_LEFT], c[TOP_RIGHT]) + dist(c[BOTTOM_LEFT], c[BOTTOM_RIGHT])) / 2.0,
            (dist(c[TOP_LEFT], c[BOTTOM_LEFT]) + dist(c[TOP_RIGHT], c[BOTTOM_RIGHT])) / 2.0,
        ]
    }

    /// Move every corner by `d` towards the inside (negative `d` grows).
    pub fn inset(&self, d: f64) -> Self {
        let c = &self.corners;
        Self {
            corners: [
                [c[TOP_LEFT][0] + d, c[TOP_LEFT][1] + d],
                [c[TOP_RIGHT][0] - d, c[TOP_RIGHT][1] + d],
                [c[BOTTOM_LEFT][0] + d, c[BOTTOM_LEFT][1] - d],
                [c[BOTTOM_RIGHT][0] - d, c[BOTTOM_RIGHT][1] - d],
            ],
        }
    }

    /// Top-left positions of `tile`-sized tiles covering the interior,
    /// stepped by `step` along both directions of the quadrilateral.
    pub fn interior_tiles(&self, tile: [f64; 2], step: [f64; 2]) -> Vec<[f64; 2]> {
        let [width, height] = self.mean_size();
        if width < tile[0] || height < tile[1] || step[0] <= 0.0 || step[1] <= 0.0 {
            return Vec::new();
        }
        let nx = ((width - tile[0]) / step[0]).floor() as usize + 1;
        let ny = ((height - tile[1]) / step[1]).floor() as usize + 1;

        let mut tiles = Vec::with_capacity(nx * ny);
        for i in 0..nx {
            let u = (tile[0] / 2.0 + i as f64 * step[0]) / width;
            for j in 0..ny {
                let v = (tile[1] / 2.0 + j as f64 * step[1]) / height;
                let c = self.point_at(u, v);
                tiles.push([c[0] - tile[0] / 2.0, c[1] - tile[1] / 2.0]);
            }
        }
        tiles
    }

    /// Top-left positions of tiles centred on the outline, walked clockwise
    /// from the top-left corner with spacing `step`.
    pub fn border_tiles(&self, tile: [f64; 2], step: f64) -> Vec<[f64; 2]> {
        if step <= 0.0 {
            return Vec::new();
        }
        let c = &self.corners;
        let path = [
            (c[TOP_LEFT], c[TOP_RIGHT]),
            (c[TOP_RIGHT], c[BOTTOM_RIGHT]),
            (c[BOTTOM_RIGHT], c[BOTTOM_LEFT]),
            (c[BOTTOM_LEFT], c[TOP_LEFT]),
        ];
        let mut tiles = Vec::new();
        for (a, b) in path {
            let len = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
            let n = (len / step).ceil().max(1.0) as usize;
            for k in 0..n {
                let t = k as f64 / n as f64;
                let p = [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t];
                tiles.push([p[0] - tile[0] / 2.0, p[1] - tile[1] / 2.0]);
            }
        }
        tiles
    }
}
