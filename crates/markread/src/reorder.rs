//! Regrouping scans by their printed questionnaire identity.
//!
//! Stacks scanned out of order are first run through an identify pass,
//! which tags every image with its questionnaire and global ID. Sheets whose
//! images disagree on those IDs, repeat a page number or are incomplete are
//! then split into leaves (the two images of one physical page) and rebuilt
//! from leaves carrying the same IDs, in scan order.

use crate::sheet::{Sheet, SheetImage};
use crate::store::SheetStore;
use crate::survey::Survey;

/// Questionnaire and global ID a leaf was tagged with.
type Identity = (Option<String>, Option<String>);

/// Outcome of [`reorder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reordered {
    /// Sheets taken apart.
    pub dissolved: usize,
    /// Sheets built from their leaves.
    pub rebuilt: usize,
}

/// Whether the images of `sheet` belong to one complete questionnaire.
fn is_consistent(sheet: &Sheet, images_per_sheet: usize) -> bool {
    if sheet.images.len() != images_per_sheet {
        return false;
    }
    let mut pages = Vec::new();
    for img in sheet.images.iter().filter(|i| !i.ignored) {
        if img.questionnaire_id != sheet.questionnaire_id || img.global_id != sheet.global_id {
            return false;
        }
        if let Some(p) = img.page_number {
            if pages.contains(&p) {
                return false;
            }
            pages.push(p);
        }
    }
    true
}

/// IDs of the first side of `leaf` that carries any.
fn identity(leaf: &[SheetImage]) -> Identity {
    leaf.iter()
        .filter(|i| !i.ignored)
        .map(|i| (i.questionnaire_id.clone(), i.global_id.clone()))
        .find(|(q, g)| q.is_some() || g.is_some())
        .unwrap_or_default()
}

/// Rebuild the inconsistent sheets of `store` from the IDs found by an
/// identify pass. Consistent sheets keep their place; rebuilt sheets are
/// appended and still need recognizing.
pub fn reorder(store: &mut SheetStore, survey: &Survey) -> Reordered {
    let images_per_sheet = survey.images_per_sheet();
    if !survey.defs.print_questionnaire_id && survey.global_id.is_none() {
        tracing::warn!("survey prints no questionnaire or global id; only incomplete sheets are regrouped");
    }

    let (keep, broken): (Vec<Sheet>, Vec<Sheet>) = std::mem::take(&mut store.sheets)
        .into_iter()
        .partition(|s| is_consistent(s, images_per_sheet));
    let mut summary = Reordered {
        dissolved: broken.len(),
        ..Reordered::default()
    };

    let mut groups: Vec<(Identity, Vec<SheetImage>)> = Vec::new();
    for sheet in broken {
        for leaf in sheet.images.chunks(2) {
            let id = identity(leaf);
            match groups.iter_mut().find(|(key, _)| *key == id) {
                Some((_, images)) => images.extend_from_slice(leaf),
                None => groups.push((id, leaf.to_vec())),
            }
        }
    }

    store.sheets = keep;
    for (id, images) in groups {
        tracing::debug!("{} images tagged {:?}", images.len(), id);
        for chunk in images.chunks(images_per_sheet.max(1)) {
            store.sheets.push(Sheet::new(chunk.to_vec()));
            summary.rebuilt += 1;
        }
    }
    tracing::info!(
        "reorder: {} sheets taken apart, {} rebuilt",
        summary.dissolved,
        summary.rebuilt
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_survey;

    fn image(name: &str, page: u32, qid: &str) -> SheetImage {
        let mut img = SheetImage::new(name, 0);
        img.page_number = Some(page);
        img.questionnaire_id = Some(qid.to_string());
        img
    }

    fn tagged(images: Vec<SheetImage>) -> Sheet {
        let mut sheet = Sheet::new(images);
        sheet.questionnaire_id = sheet.images[0].questionnaire_id.clone();
        sheet
    }

    fn names(sheet: &Sheet) -> Vec<String> {
        sheet
            .images
            .iter()
            .map(|i| i.filename.display().to_string())
            .collect()
    }

    #[test]
    fn consistent_sheets_stay_put() {
        let survey = sample_survey(2, true);
        let mut store = SheetStore::new();
        store
            .sheets
            .push(tagged(vec![image("a", 1, "7"), image("b", 2, "7")]));
        let before = store.clone();
        assert_eq!(reorder(&mut store, &survey), Reordered::default());
        assert_eq!(store, before);
    }

    #[test]
    fn mixed_leaves_are_regrouped_by_questionnaire() {
        let mut survey = sample_survey(2, true);
        survey.questionnaire.page_count = 4;
        let mut store = SheetStore::new();
        store.sheets.push(tagged(vec![
            image("1a", 1, "1"),
            image("1b", 2, "1"),
            image("2a", 1, "2"),
            image("2b", 2, "2"),
        ]));
        store.sheets.push(tagged(vec![
            image("1c", 3, "1"),
            image("1d", 4, "1"),
            image("2c", 3, "2"),
            image("2d", 4, "2"),
        ]));

        let summary = reorder(&mut store, &survey);
        assert_eq!(summary, Reordered { dissolved: 2, rebuilt: 2 });
        assert_eq!(names(&store.sheets[0]), ["1a", "1b", "1c", "1d"]);
        assert_eq!(names(&store.sheets[1]), ["2a", "2b", "2c", "2d"]);
        assert!(store.sheets.iter().all(|s| !s.recognized));
    }

    #[test]
    fn incomplete_sheets_are_merged() {
        let survey = sample_survey(2, false);
        let mut store = SheetStore::new();
        for (name, page) in [("x", 1), ("y", 2)] {
            let mut dummy = SheetImage::dummy();
            dummy.questionnaire_id = None;
            store.sheets.push(tagged(vec![image(name, page, "3"), dummy]));
        }

        let summary = reorder(&mut store, &survey);
        assert_eq!(summary, Reordered { dissolved: 2, rebuilt: 1 });
        assert_eq!(names(&store.sheets[0]), ["x", "DUMMY", "y", "DUMMY"]);
    }
}
