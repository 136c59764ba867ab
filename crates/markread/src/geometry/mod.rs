//! Geometry engine: affine page matrices, corner reconstruction and
//! quadrilateral regions.

mod affine;
pub(crate) mod corners;
mod quad;

pub use affine::Affine2;
pub use corners::{
    check_matrix, complete_corners, matrix_from_corners, CornerSet, MatrixBounds, BOTTOM_LEFT,
    BOTTOM_RIGHT, TOP_LEFT, TOP_RIGHT,
};
pub use quad::{Quadrilateral, Rect};
