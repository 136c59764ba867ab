//! Persistent sheet store.
//!
//! Sheets are kept in one JSON document next to the survey definition.
//! Change observers are not persisted.

use std::path::{Component, Path, PathBuf};

use crate::error::ConfigError;
use crate::sheet::{ScanPage, Sheet};

/// Schema tag of the sheet store document.
pub const SHEETS_SCHEMA: &str = "markread.sheets.v1";

fn sheets_schema() -> String {
    SHEETS_SCHEMA.to_string()
}

/// Every sheet of a survey.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetStore {
    #[serde(default = "sheets_schema")]
    pub schema: String,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Default for SheetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetStore {
    pub fn new() -> Self {
        Self {
            schema: sheets_schema(),
            sheets: Vec::new(),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let store: SheetStore = serde_json::from_str(text)?;
        if store.schema != SHEETS_SCHEMA {
            return Err(ConfigError::UnsupportedSchema {
                found: store.schema,
                expected: SHEETS_SCHEMA,
            });
        }
        Ok(store)
    }

    /// Load a store; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the store to a temporary file and rename it into place.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let mut tmp = PathBuf::from(path);
        tmp.set_extension("json.tmp");
        std::fs::write(&tmp, self.to_json_string()?)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!("saved {} sheets to {}", self.sheets.len(), path.display());
        Ok(())
    }

    /// Group scans into sheets and append them. Returns the scans that did
    /// not fill a whole sheet.
    pub fn add_scans(&mut self, files: &[PathBuf], duplex: bool, images_per_sheet: usize) -> Vec<PathBuf> {
        let pages: Vec<ScanPage> = files.iter().map(|f| ScanPage::new(f.clone(), 0)).collect();
        self.add_scan_pages(&pages, !duplex, images_per_sheet)
            .into_iter()
            .map(|p| p.file)
            .collect()
    }

    /// Group scanned pages into sheets and append them, with a dummy back
    /// side after every page when `insert_dummies` is set. Returns the
    /// pages that did not fill a whole sheet.
    pub fn add_scan_pages(
        &mut self,
        pages: &[ScanPage],
        insert_dummies: bool,
        images_per_sheet: usize,
    ) -> Vec<ScanPage> {
        let (sheets, leftover) = Sheet::from_scan_pages(pages, insert_dummies, images_per_sheet);
        tracing::info!("adding {} sheets", sheets.len());
        if !leftover.is_empty() {
            tracing::warn!("{} scans do not fill a sheet: {:?}", leftover.len(), leftover);
        }
        self.sheets.extend(sheets);
        leftover
    }
}

/// Drop `.` and resolve `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Path of `file` relative to `store_dir`, the directory scan paths in a
/// store are resolved against. Relative inputs are taken from the current
/// directory. Without a common root the absolute path is returned.
pub fn relative_scan_path(file: &Path, store_dir: &Path) -> std::io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let file = normalize(&cwd.join(file));
    let base = normalize(&cwd.join(store_dir));

    let f: Vec<Component> = file.components().collect();
    let b: Vec<Component> = base.components().collect();
    let common = f.iter().zip(&b).take_while(|(x, y)| x == y).count();
    if common == 0 {
        return Ok(file);
    }
    let mut out = PathBuf::new();
    for _ in common..b.len() {
        out.push("..");
    }
    for c in &f[common..] {
        out.push(c);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BoxData;
    use crate::geometry::Affine2;
    use crate::questionnaire::{BoxId, QObjectId};

    fn store() -> SheetStore {
        let mut store = SheetStore::new();
        store.add_scans(&[PathBuf::from("a.png"), PathBuf::from("b.png")], false, 2);
        let sheet = &mut store.sheets[0];
        sheet.images[0].page_number = Some(1);
        sheet.images[0].raw_matrix = Some(Affine2::scale(0.2, 0.2));
        sheet.data.insert(
            BoxId {
                question: QObjectId(1, 1),
                index: 2,
            },
            BoxData {
                state: true,
                quality: 0.75,
                ..BoxData::default()
            },
        );
        sheet.recognized = true;
        store
    }

    #[test]
    fn survives_a_save_and_load() {
        let dir = std::env::temp_dir().join(format!("markread-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sheets.json");
        let original = store();
        original.save(&path).unwrap();
        let loaded = SheetStore::load(&path).unwrap();
        assert_eq!(loaded, original);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn box_ids_key_the_data_map() {
        let json: serde_json::Value = serde_json::from_str(&store().to_json_string().unwrap()).unwrap();
        assert_eq!(json["schema"], SHEETS_SCHEMA);
        assert_eq!(json["sheets"][0]["data"]["1.1.2"]["quality"], 0.75);
        assert_eq!(json["sheets"][0]["images"][1]["filename"], "DUMMY");
    }

    #[test]
    fn scan_paths_are_made_relative_to_the_store() {
        let rel = relative_scan_path(Path::new("/data/scans/a.png"), Path::new("/data/proj")).unwrap();
        assert_eq!(rel, PathBuf::from("../scans/a.png"));
        let rel = relative_scan_path(Path::new("/data/proj/./in/../b.tif"), Path::new("/data/proj/")).unwrap();
        assert_eq!(rel, PathBuf::from("b.tif"));
    }

    #[test]
    fn added_scans_load_from_the_store_directory() {
        use crate::recognize::{FileLoader, PageLoader};

        let root = std::env::temp_dir().join(format!("markread-store-rel-{}", std::process::id()));
        let scans = root.join("scans");
        let proj = root.join("proj");
        std::fs::create_dir_all(&scans).unwrap();
        std::fs::create_dir_all(&proj).unwrap();
        let scan = scans.join("a.png");
        image::GrayImage::from_pixel(8, 8, image::Luma([0u8])).save(&scan).unwrap();

        let mut store = SheetStore::new();
        let rel = relative_scan_path(&scan, &proj).unwrap();
        assert!(rel.is_relative());
        store.add_scans(&[rel], false, 2);
        let path = proj.join("sheets.json");
        store.save(&path).unwrap();

        let loaded = SheetStore::load(&path).unwrap();
        let loader = FileLoader {
            base_dir: path.parent().map(Path::to_path_buf),
            ..FileLoader::default()
        };
        let bitmap = loader.load(&loaded.sheets[0].images[0], false).unwrap();
        assert_eq!(bitmap.count_black(0, 0, 8, 8), 64);
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_file_is_empty_and_schema_is_checked() {
        let loaded = SheetStore::load(Path::new("/nonexistent/sheets.json")).unwrap();
        assert!(loaded.sheets.is_empty());
        let err = SheetStore::from_json_str(r#"{"schema": "old", "sheets": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedSchema { .. }));
    }
}
