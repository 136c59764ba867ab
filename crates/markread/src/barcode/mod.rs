//! Barcode decoding over a millimetre window of a page.
//!
//! Decoding itself sits behind [`BarcodeReader`]. The bundled
//! [`BuiltinReader`] reads QR codes through `rqrr` and Code-128 through the
//! row scanner in [`code128`].

pub mod code128;

use crate::geometry::Affine2;
use crate::raster::Bitmap;

/// Barcode symbologies used on forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    Code128,
    Qr,
}

impl Symbology {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code128 => "code128",
            Self::Qr => "qr",
        }
    }
}

/// Decodes the first barcode of a symbology found in a raster.
pub trait BarcodeReader {
    fn decode(&self, bitmap: &Bitmap, symbology: Symbology) -> Option<String>;
}

/// QR decoder backed by `rqrr`. Other symbologies yield `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrReader;

impl BarcodeReader for QrReader {
    fn decode(&self, bitmap: &Bitmap, symbology: Symbology) -> Option<String> {
        if symbology != Symbology::Qr {
            return None;
        }
        let (w, h) = bitmap.dimensions();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            w as usize,
            h as usize,
            |x, y| {
                if bitmap.is_ink(x as i64, y as i64) {
                    0
                } else {
                    255
                }
            },
        );
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_, content)) => return Some(content),
                Err(e) => tracing::trace!("qr grid not decodable: {}", e),
            }
        }
        None
    }
}

/// Code-128 decoder. Other symbologies yield `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Code128Reader;

impl BarcodeReader for Code128Reader {
    fn decode(&self, bitmap: &Bitmap, symbology: Symbology) -> Option<String> {
        match symbology {
            Symbology::Code128 => code128::decode(bitmap),
            Symbology::Qr => None,
        }
    }
}

/// Every symbology the built-in styles print.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinReader;

impl BarcodeReader for BuiltinReader {
    fn decode(&self, bitmap: &Bitmap, symbology: Symbology) -> Option<String> {
        match symbology {
            Symbology::Code128 => Code128Reader.decode(bitmap, symbology),
            Symbology::Qr => QrReader.decode(bitmap, symbology),
        }
    }
}

/// Reader that never decodes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBarcodeReader;

impl BarcodeReader for NoBarcodeReader {
    fn decode(&self, _bitmap: &Bitmap, _symbology: Symbology) -> Option<String> {
        None
    }
}

/// Decode a barcode inside the mm window `(x, y, width, height)`.
///
/// The window is cropped at its pixel bounding box before decoding.
#[allow(clippy::too_many_arguments)]
pub fn read_barcode(
    bitmap: &Bitmap,
    matrix: &Affine2,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    symbology: Symbology,
    reader: &dyn BarcodeReader,
) -> Option<String> {
    let corners = [
        matrix.transform_point(x, y),
        matrix.transform_point(x + width, y),
        matrix.transform_point(x, y + height),
        matrix.transform_point(x + width, y + height),
    ];
    let min_x = corners.iter().map(|c| c[0]).fold(f64::INFINITY, f64::min).floor();
    let min_y = corners.iter().map(|c| c[1]).fold(f64::INFINITY, f64::min).floor();
    let max_x = corners.iter().map(|c| c[0]).fold(f64::NEG_INFINITY, f64::max).ceil();
    let max_y = corners.iter().map(|c| c[1]).fold(f64::NEG_INFINITY, f64::max).ceil();

    let x0 = (min_x as i64).max(0);
    let y0 = (min_y as i64).max(0);
    let x1 = (max_x as i64).min(i64::from(bitmap.width()));
    let y1 = (max_y as i64).min(i64::from(bitmap.height()));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let crop = bitmap.crop(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32);
    let decoded = reader.decode(&crop, symbology);
    tracing::debug!(
        "{} window ({:.1}, {:.1}, {:.1}, {:.1}) -> {:?}",
        symbology.as_str(),
        x,
        y,
        width,
        height,
        decoded
    );
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records the size of every raster it is asked to decode.
    struct Recorder {
        seen: RefCell<Vec<(u32, u32, u64)>>,
    }

    impl BarcodeReader for Recorder {
        fn decode(&self, bitmap: &Bitmap, symbology: Symbology) -> Option<String> {
            let (w, h) = bitmap.dimensions();
            self.seen
                .borrow_mut()
                .push((w, h, bitmap.count_black(0, 0, i64::from(w), i64::from(h))));
            (symbology == Symbology::Code128).then(|| "00420001".to_string())
        }
    }

    #[test]
    fn crops_window_before_decoding() {
        let bitmap = Bitmap::from_fn(200, 200, |x, y| (50..60).contains(&x) && (50..60).contains(&y));
        let m = Affine2::scale(10.0, 10.0);
        let rec = Recorder {
            seen: RefCell::new(Vec::new()),
        };
        let got = read_barcode(&bitmap, &m, 4.0, 4.0, 3.0, 3.0, Symbology::Code128, &rec);
        assert_eq!(got.as_deref(), Some("00420001"));
        assert_eq!(rec.seen.borrow()[0], (30, 30, 100));
    }

    #[test]
    fn window_outside_image_reads_nothing() {
        let bitmap = Bitmap::from_fn(50, 50, |_, _| true);
        let m = Affine2::scale(10.0, 10.0);
        assert!(read_barcode(&bitmap, &m, 20.0, 20.0, 3.0, 3.0, Symbology::Code128, &NoBarcodeReader).is_none());
    }

    #[test]
    fn builtin_reader_reads_code128_in_a_page_window() {
        // "1234" in code set C: start, 12, 34, check symbol, stop.
        let symbols: [&[u8]; 5] = [
            &[2, 1, 1, 2, 3, 2],
            &[1, 1, 2, 2, 3, 2],
            &[1, 3, 1, 1, 2, 3],
            &[1, 2, 1, 2, 4, 1],
            &[2, 3, 3, 1, 1, 1, 2],
        ];
        let mut row = vec![false; 30];
        for widths in symbols {
            for (i, &w) in widths.iter().enumerate() {
                row.extend(std::iter::repeat(i % 2 == 0).take(usize::from(w) * 3));
            }
        }
        row.resize(row.len() + 30, false);
        let bitmap = Bitmap::from_fn(row.len() as u32, 60, |x, y| (10..50).contains(&y) && row[x as usize]);

        let m = Affine2::scale(10.0, 10.0);
        let width = f64::from(bitmap.width()) / 10.0;
        let got = read_barcode(&bitmap, &m, 0.0, 0.0, width, 6.0, Symbology::Code128, &BuiltinReader);
        assert_eq!(got.as_deref(), Some("1234"));
        assert!(BuiltinReader.decode(&bitmap, Symbology::Qr).is_none());
        assert!(Code128Reader.decode(&bitmap, Symbology::Qr).is_none());
    }

    #[test]
    fn qr_reader_ignores_other_symbologies() {
        let bitmap = Bitmap::from_fn(20, 20, |_, _| false);
        assert!(QrReader.decode(&bitmap, Symbology::Code128).is_none());
        assert!(QrReader.decode(&bitmap, Symbology::Qr).is_none());
    }
}
