use std::path::PathBuf;

use crate::error::RecognitionError;
use crate::raster::{self, Bitmap, DEFAULT_INK_THRESHOLD};
use crate::sheet::SheetImage;

/// Supplies the pixels of a scanned page.
pub trait PageLoader {
    /// Load `image`, turned by 180° when `rotated`.
    fn load(&self, image: &SheetImage, rotated: bool) -> Result<Bitmap, RecognitionError>;
}

impl<T: PageLoader + ?Sized> PageLoader for &T {
    fn load(&self, image: &SheetImage, rotated: bool) -> Result<Bitmap, RecognitionError> {
        (**self).load(image, rotated)
    }
}

/// Loads scans from disk through the `image` crate.
#[derive(Debug, Clone)]
pub struct FileLoader {
    /// Relative scan paths are resolved against this directory.
    pub base_dir: Option<PathBuf>,
    pub threshold: u8,
}

impl Default for FileLoader {
    fn default() -> Self {
        Self {
            base_dir: None,
            threshold: DEFAULT_INK_THRESHOLD,
        }
    }
}

impl PageLoader for FileLoader {
    fn load(&self, image: &SheetImage, rotated: bool) -> Result<Bitmap, RecognitionError> {
        let path = match &self.base_dir {
            Some(dir) if image.filename.is_relative() => dir.join(&image.filename),
            _ => image.filename.clone(),
        };
        raster::load(&path, image.tiff_page, rotated, self.threshold)
    }
}

/// Page surfaces held for the duration of one sheet pass.
///
/// Surfaces are released when the guard goes out of scope, on every exit
/// path of the pass.
pub(crate) struct PageSurfaces {
    pages: Vec<Option<Bitmap>>,
}

impl PageSurfaces {
    pub(crate) fn new(count: usize) -> Self {
        Self {
            pages: vec![None; count],
        }
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&Bitmap> {
        self.pages.get(idx).and_then(Option::as_ref)
    }

    pub(crate) fn set(&mut self, idx: usize, bitmap: Bitmap) {
        if let Some(slot) = self.pages.get_mut(idx) {
            *slot = Some(bitmap);
        }
    }

    pub(crate) fn release(&mut self, idx: usize) {
        if let Some(slot) = self.pages.get_mut(idx) {
            *slot = None;
        }
    }
}

impl Drop for PageSurfaces {
    fn drop(&mut self) {
        let held = self.pages.iter().filter(|p| p.is_some()).count();
        tracing::trace!("releasing {} page surfaces", held);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_load_error() {
        let loader = FileLoader {
            base_dir: Some(PathBuf::from("/nonexistent")),
            ..FileLoader::default()
        };
        let err = loader
            .load(&SheetImage::new("scan-0001.png", 0), false)
            .unwrap_err();
        match err {
            RecognitionError::ImageLoad { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/scan-0001.png"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn surfaces_hold_and_release() {
        let mut s = PageSurfaces::new(2);
        s.set(1, Bitmap::from_fn(2, 2, |_, _| true));
        assert!(s.get(0).is_none());
        assert_eq!(s.get(1).map(|b| b.width()), Some(2));
        s.release(1);
        assert!(s.get(1).is_none());
    }
}
