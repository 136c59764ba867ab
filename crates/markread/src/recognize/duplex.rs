//! Rules for the two images of one physical page.
//!
//! Images are paired `(0, 1)`, `(2, 3)`, … In duplex mode the pair holds
//! both sides of a leaf; in simplex mode the second image is the dummy
//! back side of the first.

/// Page on the other side of `page`: odd pages pair with the next even page.
///
/// `None` for page 0 and for an odd page with no representable successor.
pub fn duplex_partner(page: u32) -> Option<u32> {
    match page {
        0 => None,
        p if p % 2 == 1 => p.checked_add(1),
        p => Some(p - 1),
    }
}

/// Result of copying a value between the two sides of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CopyOutcome {
    /// Both sides were known.
    Unchanged,
    Copied,
    BothMissing,
}

/// Fill a missing side from the other one. Two different known values are
/// left alone.
pub(crate) fn duplex_copy<T: Clone>(a: &mut Option<T>, b: &mut Option<T>) -> CopyOutcome {
    match (a.is_some(), b.is_some()) {
        (true, false) => {
            *b = a.clone();
            CopyOutcome::Copied
        }
        (false, true) => {
            *a = b.clone();
            CopyOutcome::Copied
        }
        (false, false) => CopyOutcome::BothMissing,
        (true, true) => CopyOutcome::Unchanged,
    }
}

/// What pairing decided for the two images of a pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct PairDecision {
    pub pages: [Option<u32>; 2],
    pub failed: [bool; 2],
    pub ignored: [bool; 2],
    pub warning: Option<&'static str>,
}

/// Resolve the page numbers of one image pair.
pub(crate) fn pair_page_numbers(a: Option<u32>, b: Option<u32>, duplex: bool) -> PairDecision {
    let mut d = PairDecision {
        pages: [a, b],
        ..PairDecision::default()
    };
    if duplex {
        match (a, b) {
            (Some(known), None) | (None, Some(known)) => match duplex_partner(known) {
                Some(other) => {
                    let slot = usize::from(a.is_some());
                    d.pages[slot] = Some(other);
                }
                None => {
                    d.failed = [true, true];
                    d.warning = Some("page number has no duplex partner");
                }
            },
            (None, None) => {
                d.failed = [true, true];
                d.warning = Some("neither side of the leaf has a page number");
            }
            (Some(x), Some(y)) => {
                if duplex_partner(x) != Some(y) {
                    d.failed = [true, true];
                    d.warning = Some("page numbers of front and back do not match");
                }
            }
        }
    } else {
        match (a, b) {
            (Some(_), Some(_)) => {
                d.warning = Some("both images carry a page number; was the stack scanned in duplex?");
            }
            (Some(_), None) => d.ignored[1] = true,
            (None, Some(_)) => d.ignored[0] = true,
            (None, None) => {
                d.failed[0] = true;
                d.ignored[1] = true;
                d.warning = Some("no page number on either image");
            }
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partner_relation() {
        assert_eq!(duplex_partner(1), Some(2));
        assert_eq!(duplex_partner(2), Some(1));
        assert_eq!(duplex_partner(5), Some(6));
        assert_eq!(duplex_partner(0), None);
        for p in 1..20 {
            assert_eq!(duplex_partner(duplex_partner(p).unwrap()), Some(p));
        }
    }

    #[test]
    fn out_of_range_page_has_no_partner() {
        assert_eq!(duplex_partner(u32::MAX), None);
        assert_eq!(duplex_partner(u32::MAX - 1), Some(u32::MAX - 2));
        let d = pair_page_numbers(Some(u32::MAX), None, true);
        assert_eq!(d.failed, [true, true]);
        assert!(d.warning.is_some());
        let d = pair_page_numbers(Some(u32::MAX), Some(1), true);
        assert_eq!(d.failed, [true, true]);
    }

    #[test]
    fn duplex_infers_missing_side() {
        let d = pair_page_numbers(Some(2), None, true);
        assert_eq!(d.pages, [Some(2), Some(1)]);
        assert_eq!(d.failed, [false, false]);
        let d = pair_page_numbers(None, Some(3), true);
        assert_eq!(d.pages, [Some(4), Some(3)]);
    }

    #[test]
    fn duplex_mismatch_and_missing_fail_both() {
        let d = pair_page_numbers(Some(1), Some(3), true);
        assert_eq!(d.failed, [true, true]);
        assert!(d.warning.is_some());
        let d = pair_page_numbers(None, None, true);
        assert_eq!(d.failed, [true, true]);
        let d = pair_page_numbers(Some(3), Some(4), true);
        assert_eq!(d.failed, [false, false]);
        assert!(d.warning.is_none());
    }

    #[test]
    fn simplex_rules() {
        let d = pair_page_numbers(Some(1), None, false);
        assert_eq!(d.ignored, [false, true]);
        let d = pair_page_numbers(None, Some(1), false);
        assert_eq!(d.ignored, [true, false]);
        let d = pair_page_numbers(Some(1), Some(2), false);
        assert_eq!(d.failed, [false, false]);
        assert!(d.warning.is_some());
        let d = pair_page_numbers(None, None, false);
        assert_eq!(d.failed, [true, false]);
        assert_eq!(d.ignored, [false, true]);
    }

    #[test]
    fn copy_fills_one_missing_side() {
        let (mut a, mut b) = (Some(7u32), None);
        assert_eq!(duplex_copy(&mut a, &mut b), CopyOutcome::Copied);
        assert_eq!(b, Some(7));
        let (mut a, mut b) = (Some(1u32), Some(2u32));
        assert_eq!(duplex_copy(&mut a, &mut b), CopyOutcome::Unchanged);
        assert_eq!((a, b), (Some(1), Some(2)));
        let (mut a, mut b): (Option<u32>, Option<u32>) = (None, None);
        assert_eq!(duplex_copy(&mut a, &mut b), CopyOutcome::BothMissing);
    }
}
