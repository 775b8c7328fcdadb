// ============================================================================
// DOCUMENT IO — .stitch (JSON) serialization, validation, file dialogs
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pattern::{Cell, PatternGrid};

/// On-disk document shape. `gridData` is row-major with the per-cell
/// null / index / "index:orientation" encoding; `palette` is the ordered
/// hex color list the indices point into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFile {
    #[serde(rename = "gridData")]
    pub grid_data: Vec<Vec<Cell>>,
    pub palette: Vec<String>,
}

/// Error type for document file operations
#[derive(Debug)]
pub enum DocError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for DocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocError::Io(e) => write!(f, "I/O error: {}", e),
            DocError::Parse(e) => write!(f, "Malformed document: {}", e),
            DocError::Invalid(e) => write!(f, "Invalid document: {}", e),
        }
    }
}

impl From<std::io::Error> for DocError {
    fn from(e: std::io::Error) -> Self {
        DocError::Io(e)
    }
}

impl From<serde_json::Error> for DocError {
    fn from(e: serde_json::Error) -> Self {
        DocError::Parse(e.to_string())
    }
}

/// Serialize a palette + grid to the document JSON text.
pub fn serialize_document(palette: &[String], grid: &PatternGrid) -> String {
    let file = DocumentFile {
        grid_data: grid.to_rows(),
        palette: palette.to_vec(),
    };
    // DocumentFile has no failing serialize paths; fall back to an empty
    // object rather than panicking if that ever changes.
    serde_json::to_string_pretty(&file).unwrap_or_else(|_| "{}".to_string())
}

/// Parse document JSON. Rejects anything that is not the exact two-field
/// shape with rectangular rows; the caller keeps its current document on
/// any error.
pub fn parse_document(json: &str) -> Result<(Vec<String>, PatternGrid), DocError> {
    let file: DocumentFile = serde_json::from_str(json)?;
    let grid = PatternGrid::from_rows(file.grid_data).map_err(DocError::Invalid)?;
    Ok((file.palette, grid))
}

/// Save a document as a .stitch file.
pub fn save_document(path: &Path, palette: &[String], grid: &PatternGrid) -> Result<(), DocError> {
    fs::write(path, serialize_document(palette, grid))?;
    Ok(())
}

/// Load a .stitch file.
pub fn load_document(path: &Path) -> Result<(Vec<String>, PatternGrid), DocError> {
    let json = fs::read_to_string(path)?;
    parse_document(&json)
}

// ============================================================================
// FILE HANDLER — native dialogs + remembered locations
// ============================================================================

/// Wraps the rfd dialogs and remembers where the user last browsed so
/// consecutive dialogs open in the same place.
#[derive(Default)]
pub struct FileHandler {
    /// Path of the currently open document, `None` for untitled.
    pub current_path: Option<PathBuf>,
    last_dir: Option<PathBuf>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_current_path(&self) -> bool {
        self.current_path.is_some()
    }

    fn start_dir(&self) -> Option<PathBuf> {
        self.last_dir.clone().or_else(|| {
            self.current_path
                .as_ref()
                .and_then(|p| p.parent().map(Path::to_path_buf))
        })
    }

    fn remember(&mut self, path: &Path) {
        self.last_dir = path.parent().map(Path::to_path_buf);
    }

    /// Ask for a document to open.
    pub fn pick_open_path(&mut self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Stitch pattern", &["stitch", "json"])
            .add_filter("All files", &["*"]);
        if let Some(dir) = self.start_dir() {
            dialog = dialog.set_directory(dir);
        }
        let path = dialog.pick_file()?;
        self.remember(&path);
        Some(path)
    }

    /// Ask where to save the document. `default_name` seeds the file name
    /// field; the .stitch extension is appended when missing.
    pub fn pick_save_path(&mut self, default_name: &str) -> Option<PathBuf> {
        let stem = default_name.trim_end_matches(".stitch");
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Stitch pattern", &["stitch"])
            .set_file_name(&format!("{}.stitch", stem));
        if let Some(dir) = self.start_dir() {
            dialog = dialog.set_directory(dir);
        }
        let path = dialog.save_file()?;
        self.remember(&path);
        Some(path)
    }

    /// Ask where to save a PNG export.
    pub fn pick_png_path(&mut self, default_name: &str) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(&format!("{}.png", default_name));
        if let Some(dir) = self.start_dir() {
            dialog = dialog.set_directory(dir);
        }
        let path = dialog.save_file()?;
        self.remember(&path);
        Some(path)
    }
}

// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{FillType, Orientation};
    use pretty_assertions::assert_eq;

    fn sample() -> (Vec<String>, PatternGrid) {
        let palette = vec![
            "#FF0000".to_string(),
            "#00ff00".to_string(),
            "#0000FF".to_string(),
        ];
        let grid = PatternGrid::new(4, 5)
            .apply_stroke(1, 1, 1.0, FillType::Full, Some(0))
            .apply_stroke(3, 4, 1.0, FillType::Half(Orientation::LowerLeft), Some(2))
            .apply_stroke(0, 0, 0.5, FillType::Full, Some(1));
        (palette, grid)
    }

    #[test]
    fn document_round_trips_with_deep_equality() {
        let (palette, grid) = sample();
        let json = serialize_document(&palette, &grid);
        let (palette2, grid2) = parse_document(&json).unwrap();
        assert_eq!(palette2, palette);
        assert_eq!(grid2, grid);
    }

    #[test]
    fn file_round_trip_through_disk() {
        let (palette, grid) = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pattern.stitch");
        save_document(&path, &palette, &grid).unwrap();
        let (palette2, grid2) = load_document(&path).unwrap();
        assert_eq!(palette2, palette);
        assert_eq!(grid2, grid);
    }

    #[test]
    fn half_cells_serialize_to_index_colon_letter() {
        let grid = PatternGrid::new(1, 1).apply_stroke(
            0,
            0,
            1.0,
            FillType::Half(Orientation::UpperRight),
            Some(7),
        );
        let json = serialize_document(&[], &grid);
        assert!(json.contains("\"7:b\""), "{}", json);
    }

    #[test]
    fn missing_or_mistyped_fields_are_rejected() {
        for bad in [
            r#"{}"#,
            r#"{"palette": []}"#,
            r#"{"gridData": [[null]]}"#,
            r#"{"gridData": 5, "palette": []}"#,
            r##"{"gridData": [[null]], "palette": "#fff"}"##,
            r#"{"gridData": [null], "palette": []}"#,
            r#"not json at all"#,
        ] {
            assert!(parse_document(bad).is_err(), "expected rejection: {}", bad);
        }
    }

    #[test]
    fn ragged_and_empty_grids_are_rejected() {
        assert!(parse_document(r#"{"gridData": [[null, 0], [null]], "palette": []}"#).is_err());
        assert!(parse_document(r#"{"gridData": [], "palette": []}"#).is_err());
    }

    #[test]
    fn bad_cell_encodings_are_rejected() {
        for bad_cell in ["\"1\"", "\"x:a\"", "\"1:q\"", "1.5", "[0]"] {
            let json = format!(r#"{{"gridData": [[{}]], "palette": []}}"#, bad_cell);
            assert!(parse_document(&json).is_err(), "expected rejection: {}", json);
        }
    }

    #[test]
    fn unknown_top_level_fields_are_tolerated() {
        let json = r##"{"gridData": [[null, 1], [0, null]], "palette": ["#123456"], "extra": 1}"##;
        let (palette, grid) = parse_document(json).unwrap();
        assert_eq!(palette.len(), 1);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 2);
    }
}
