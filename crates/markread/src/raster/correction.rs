//! Local position correction of a printed outline.

use super::{get_masked_coverage, Bitmap, Mask};
use crate::geometry::Affine2;

/// Slide `mask` by up to `search_px` pixels in each direction and keep the
/// offset with the most ink under it.
///
/// Returns the correction as a millimetre translation (apply it before the
/// page matrix) and the ink fraction at the best offset. Ties prefer the
/// offset closest to the nominal position.
pub fn calculate_correction_matrix_masked(
    bitmap: &Bitmap,
    mask: &Mask,
    matrix: &Affine2,
    search_px: i64,
) -> (Affine2, f64) {
    let [ox, oy] = mask.origin();
    let search = search_px.max(0);

    let mut best = (0i64, 0i64, get_masked_coverage(bitmap, mask, ox, oy));
    for dy in -search..=search {
        for dx in -search..=search {
            let covered = get_masked_coverage(bitmap, mask, ox + dx, oy + dy);
            let closer = dx * dx + dy * dy < best.0 * best.0 + best.1 * best.1;
            if covered > best.2 || (covered == best.2 && closer) {
                best = (dx, dy, covered);
            }
        }
    }

    let (dx, dy, covered) = best;
    let correction = match matrix.inverse() {
        Some(inv) => {
            let [mx, my] = inv.transform_distance(dx as f64, dy as f64);
            Affine2::translation(mx, my)
        }
        None => Affine2::identity(),
    };
    (correction, covered)
}
