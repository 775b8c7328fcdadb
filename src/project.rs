use std::path::PathBuf;

use crate::pattern::PatternGrid;

pub const DEFAULT_ROWS: usize = 50;
pub const DEFAULT_COLS: usize = 50;

/// Starter palette for a fresh document.
pub fn default_palette() -> Vec<String> {
    vec![
        "#FF0000".to_string(),
        "#00FF00".to_string(),
        "#0000FF".to_string(),
    ]
}

/// Single open document: the palette + grid pair plus file bookkeeping.
pub struct Document {
    pub name: String,
    pub palette: Vec<String>,
    pub grid: PatternGrid,
    /// `None` for unsaved/untitled patterns.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,
}

impl Document {
    pub fn new_untitled() -> Self {
        Self {
            name: "Untitled".to_string(),
            palette: default_palette(),
            grid: PatternGrid::new(DEFAULT_ROWS, DEFAULT_COLS),
            path: None,
            is_dirty: false,
        }
    }

    pub fn from_file(path: PathBuf, palette: Vec<String>, grid: PatternGrid) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            name,
            palette,
            grid,
            path: Some(path),
            is_dirty: false,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// Window/tab title (name with dirty indicator).
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}
