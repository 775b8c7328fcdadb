// ============================================================================
// PATTERN MODEL — palette-indexed cell grid + brush stroke application
// ============================================================================

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Corner orientation of a half stitch. The name says which half of the
/// cell square is filled: `UpperLeft`/`LowerRight` split along the
/// anti-diagonal, `UpperRight`/`LowerLeft` along the main diagonal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    UpperLeft,
    UpperRight,
    LowerRight,
    LowerLeft,
}

impl Orientation {
    /// Single-letter wire encoding used inside "index:orientation" cells.
    pub fn letter(&self) -> char {
        match self {
            Orientation::UpperLeft => 'a',
            Orientation::UpperRight => 'b',
            Orientation::LowerRight => 'c',
            Orientation::LowerLeft => 'd',
        }
    }

    pub fn from_letter(ch: char) -> Option<Self> {
        match ch {
            'a' => Some(Orientation::UpperLeft),
            'b' => Some(Orientation::UpperRight),
            'c' => Some(Orientation::LowerRight),
            'd' => Some(Orientation::LowerLeft),
            _ => None,
        }
    }

    pub fn all() -> &'static [Orientation] {
        &[
            Orientation::UpperLeft,
            Orientation::UpperRight,
            Orientation::LowerRight,
            Orientation::LowerLeft,
        ]
    }
}

/// One grid position's paint state.
///
/// Wire encoding (the `gridData` document field): `Empty` is `null`,
/// `Full(i)` is the plain integer `i`, `Half(i, o)` is the string
/// `"i:o"` with `o` one of `a`..`d`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Full(usize),
    Half(usize, Orientation),
}

impl Cell {
    pub fn is_painted(&self) -> bool {
        !matches!(self, Cell::Empty)
    }

    /// Palette index referenced by this cell, if any.
    pub fn color_index(&self) -> Option<usize> {
        match self {
            Cell::Empty => None,
            Cell::Full(i) | Cell::Half(i, _) => Some(*i),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_unit(),
            Cell::Full(i) => serializer.serialize_u64(*i as u64),
            Cell::Half(i, o) => serializer.serialize_str(&format!("{}:{}", i, o.letter())),
        }
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("null, a palette index, or an \"index:orientation\" string")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Cell, E> {
        Ok(Cell::Empty)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cell, E> {
        Ok(Cell::Full(v as usize))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cell, E> {
        if v < 0 {
            return Err(E::custom(format!("negative palette index {}", v)));
        }
        Ok(Cell::Full(v as usize))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Cell, E> {
        let Some((index, orientation)) = v.split_once(':') else {
            return Err(E::custom(format!("malformed cell \"{}\"", v)));
        };
        let index: usize = index
            .parse()
            .map_err(|_| E::custom(format!("malformed cell index in \"{}\"", v)))?;
        let mut letters = orientation.chars();
        let orientation = letters
            .next()
            .filter(|_| letters.next().is_none())
            .and_then(Orientation::from_letter)
            .ok_or_else(|| E::custom(format!("unknown cell orientation in \"{}\"", v)))?;
        Ok(Cell::Half(index, orientation))
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }
}

// ============================================================================
// BRUSH
// ============================================================================

/// What a stroke deposits into each affected cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillType {
    Full,
    Half(Orientation),
}

/// Transient painting configuration. Not part of the document; persisted
/// separately under its own settings keys.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    /// Continuous radius in cells, 0.5 is the single-stitch brush.
    pub size: f32,
    pub fill: FillType,
}

pub const BRUSH_SIZE_MIN: f32 = 0.5;
pub const BRUSH_SIZE_MAX: f32 = 8.0;

impl Default for Brush {
    fn default() -> Self {
        Self {
            size: 1.0,
            fill: FillType::Full,
        }
    }
}

// ============================================================================
// GRID
// ============================================================================

/// Rectangular grid of cells, row-major. Dimensions are fixed for the
/// lifetime of an instance; resize and crop build a new grid. Paint
/// operations also return a new grid so callers replace the displayed
/// value instead of mutating in place.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl PatternGrid {
    /// All-empty grid. Both dimensions must be at least 1.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Build a grid from parsed document rows. Rejects an empty grid and
    /// ragged rows; the caller reports the message and keeps its current
    /// document.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, String> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err("grid has no cells".to_string());
        }
        let cols = rows[0].len();
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(format!(
                    "grid row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    cols
                ));
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    /// Row-major copy of the cells, one Vec per row (the document shape).
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        self.cells.chunks(self.cols).map(|r| r.to_vec()).collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row of the center guide line.
    pub fn center_row(&self) -> usize {
        self.rows / 2
    }

    /// Column of the center guide line.
    pub fn center_col(&self) -> usize {
        self.cols / 2
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    /// Cell at (row, col). Callers must stay in bounds.
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.cols + col]
    }

    fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row * self.cols + col] = cell;
    }

    /// True when no cell is painted.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| !c.is_painted())
    }

    // ---- brush stroke -------------------------------------------------------

    /// Apply one brush stroke centered on (row, col) and return the new
    /// grid. `paint` is the palette index to deposit, or `None` to erase.
    ///
    /// An out-of-bounds center is a silent no-op. Half fills touch only
    /// the center cell regardless of `size`. Full fills paint every
    /// in-bounds cell of the `[-span, span]^2` box whose Euclidean offset
    /// distance is at most `size`, with `span = ceil(max(size, 1))`.
    /// Cells exactly at distance `size` are included; a size of 0.5 thus
    /// paints exactly the center cell.
    pub fn apply_stroke(
        &self,
        row: i32,
        col: i32,
        size: f32,
        fill: FillType,
        paint: Option<usize>,
    ) -> Self {
        let mut next = self.clone();
        if !self.in_bounds(row, col) {
            return next;
        }

        match fill {
            FillType::Half(orientation) => {
                // Half stitches never spill into neighboring cells.
                let cell = match paint {
                    Some(index) => Cell::Half(index, orientation),
                    None => Cell::Empty,
                };
                next.set(row as usize, col as usize, cell);
            }
            FillType::Full => {
                let cell = match paint {
                    Some(index) => Cell::Full(index),
                    None => Cell::Empty,
                };
                let span = size.max(1.0).ceil() as i32;
                for di in -span..=span {
                    for dj in -span..=span {
                        let r = row + di;
                        let c = col + dj;
                        if !self.in_bounds(r, c) {
                            continue;
                        }
                        let distance = ((di * di + dj * dj) as f32).sqrt();
                        if distance <= size {
                            next.set(r as usize, c as usize, cell);
                        }
                    }
                }
            }
        }
        next
    }

    // ---- resize / crop ------------------------------------------------------

    /// New grid of the given dimensions. The overlapping top-left
    /// sub-rectangle keeps its cells; grown area is empty. Returns `None`
    /// for a zero dimension (the resize request is then ignored).
    pub fn resized(&self, rows: usize, cols: usize) -> Option<Self> {
        if rows == 0 || cols == 0 {
            return None;
        }
        let mut next = Self::new(rows, cols);
        for r in 0..self.rows.min(rows) {
            for c in 0..self.cols.min(cols) {
                next.set(r, c, self.cell(r, c));
            }
        }
        Some(next)
    }

    /// Inclusive bounding box of all painted cells as
    /// (min_row, min_col, max_row, max_col), or `None` for an empty grid.
    pub fn painted_bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for r in 0..self.rows {
            for c in 0..self.cols {
                if !self.cell(r, c).is_painted() {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (r, c, r, c),
                    Some((r0, c0, r1, c1)) => (r0.min(r), c0.min(c), r1.max(r), c1.max(c)),
                });
            }
        }
        bounds
    }

    /// Grid cut down to the painted bounding box. Returns `None` (crop
    /// ignored) when nothing is painted, or when the painted area spans
    /// only a single row or column.
    pub fn cropped(&self) -> Option<Self> {
        let (min_row, min_col, max_row, max_col) = self.painted_bounds()?;
        if max_row - min_row < 1 || max_col - min_col < 1 {
            return None;
        }
        let mut next = Self::new(max_row - min_row + 1, max_col - min_col + 1);
        for r in 0..next.rows {
            for c in 0..next.cols {
                next.set(r, c, self.cell(min_row + r, min_col + c));
            }
        }
        Some(next)
    }
}

// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn painted_count(grid: &PatternGrid) -> usize {
        (0..grid.rows())
            .flat_map(|r| (0..grid.cols()).map(move |c| (r, c)))
            .filter(|&(r, c)| grid.cell(r, c).is_painted())
            .count()
    }

    #[test]
    fn half_size_stroke_paints_only_the_center() {
        let grid = PatternGrid::new(5, 5);
        let next = grid.apply_stroke(2, 2, 0.5, FillType::Full, Some(0));
        assert_eq!(painted_count(&next), 1);
        assert_eq!(next.cell(2, 2), Cell::Full(0));
    }

    #[test]
    fn unit_radius_stroke_excludes_diagonal_corners() {
        // 3x3 grid, radius 1.0: corners sit at distance sqrt(2) > 1 and
        // stay empty, so the stroke paints a plus shape of 5 cells.
        let grid = PatternGrid::new(3, 3);
        let next = grid.apply_stroke(1, 1, 1.0, FillType::Full, Some(0));
        assert_eq!(painted_count(&next), 5);
        for (r, c) in [(0, 1), (1, 0), (1, 1), (1, 2), (2, 1)] {
            assert_eq!(next.cell(r, c), Cell::Full(0), "cell ({}, {})", r, c);
        }
        for (r, c) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            assert_eq!(next.cell(r, c), Cell::Empty, "corner ({}, {})", r, c);
        }
    }

    #[test]
    fn stroke_includes_cells_exactly_on_the_radius() {
        let grid = PatternGrid::new(9, 9);
        let next = grid.apply_stroke(4, 4, 2.0, FillType::Full, Some(0));
        // Offsets within distance 2: center, 4 at distance 1, 4 diagonals
        // at sqrt(2), 4 at exactly distance 2. Nothing else qualifies.
        assert_eq!(painted_count(&next), 13);
        assert_eq!(next.cell(4, 6), Cell::Full(0));
        assert_eq!(next.cell(2, 4), Cell::Full(0));
        assert_eq!(next.cell(3, 6), Cell::Empty);
    }

    #[test]
    fn stroke_respects_disk_and_bounding_box() {
        let size = 2.5;
        let span = 3i32;
        let grid = PatternGrid::new(11, 11);
        let next = grid.apply_stroke(5, 5, size, FillType::Full, Some(1));
        for r in 0..11i32 {
            for c in 0..11i32 {
                let (di, dj) = (r - 5, c - 5);
                let inside_box = di.abs() <= span && dj.abs() <= span;
                let distance = ((di * di + dj * dj) as f32).sqrt();
                let expected = inside_box && distance <= size;
                assert_eq!(
                    next.cell(r as usize, c as usize).is_painted(),
                    expected,
                    "cell ({}, {})",
                    r,
                    c
                );
            }
        }
    }

    #[test]
    fn out_of_bounds_center_is_a_noop() {
        let grid = PatternGrid::new(4, 4).apply_stroke(1, 1, 1.0, FillType::Full, Some(0));
        assert_eq!(grid.apply_stroke(-1, 2, 3.0, FillType::Full, Some(1)), grid);
        assert_eq!(grid.apply_stroke(2, 4, 3.0, FillType::Full, Some(1)), grid);
    }

    #[test]
    fn stroke_clips_at_grid_edges() {
        let grid = PatternGrid::new(3, 3);
        let next = grid.apply_stroke(0, 0, 1.0, FillType::Full, Some(0));
        assert_eq!(painted_count(&next), 3);
        assert_eq!(next.rows(), 3);
        assert_eq!(next.cols(), 3);
    }

    #[test]
    fn erase_stroke_clears_cells() {
        let grid = PatternGrid::new(3, 3).apply_stroke(1, 1, 1.0, FillType::Full, Some(0));
        let next = grid.apply_stroke(1, 1, 1.0, FillType::Full, None);
        assert_eq!(painted_count(&next), 0);
    }

    #[test]
    fn half_stroke_affects_one_cell_at_any_size() {
        let grid = PatternGrid::new(9, 9);
        let next = grid.apply_stroke(
            4,
            4,
            BRUSH_SIZE_MAX,
            FillType::Half(Orientation::LowerLeft),
            Some(2),
        );
        assert_eq!(painted_count(&next), 1);
        assert_eq!(next.cell(4, 4), Cell::Half(2, Orientation::LowerLeft));
    }

    #[test]
    fn half_erase_loses_the_orientation() {
        let grid = PatternGrid::new(3, 3).apply_stroke(
            1,
            1,
            1.0,
            FillType::Half(Orientation::UpperRight),
            Some(0),
        );
        let next = grid.apply_stroke(1, 1, 4.0, FillType::Half(Orientation::LowerRight), None);
        assert_eq!(next.cell(1, 1), Cell::Empty);
    }

    #[test]
    fn stroke_leaves_untouched_cells_and_dimensions_alone() {
        let mut base = PatternGrid::new(10, 10);
        base.set(9, 9, Cell::Full(7));
        base.set(0, 9, Cell::Half(3, Orientation::LowerRight));
        let before = base.clone();

        let next = base.apply_stroke(2, 2, 1.5, FillType::Full, Some(0));
        assert_eq!(base, before, "input grid must not be mutated");
        assert_eq!(next.rows(), 10);
        assert_eq!(next.cols(), 10);
        assert_eq!(next.cell(9, 9), Cell::Full(7));
        assert_eq!(next.cell(0, 9), Cell::Half(3, Orientation::LowerRight));
    }

    #[test]
    fn resize_larger_keeps_cells_and_grows_empty() {
        let grid = PatternGrid::new(3, 3).apply_stroke(1, 1, 0.5, FillType::Full, Some(0));
        let next = grid.resized(5, 6).unwrap();
        assert_eq!(next.rows(), 5);
        assert_eq!(next.cols(), 6);
        assert_eq!(next.cell(1, 1), Cell::Full(0));
        assert_eq!(next.cell(4, 5), Cell::Empty);
    }

    #[test]
    fn resize_smaller_keeps_the_top_left_overlap() {
        let mut grid = PatternGrid::new(5, 5);
        grid.set(0, 0, Cell::Full(1));
        grid.set(4, 4, Cell::Full(2));
        let next = grid.resized(2, 2).unwrap();
        assert_eq!(next.cell(0, 0), Cell::Full(1));
        assert_eq!(painted_count(&next), 1);
    }

    #[test]
    fn resize_to_zero_is_rejected() {
        let grid = PatternGrid::new(3, 3);
        assert_eq!(grid.resized(0, 5), None);
        assert_eq!(grid.resized(5, 0), None);
    }

    #[test]
    fn crop_cuts_to_the_painted_bounding_box() {
        let mut grid = PatternGrid::new(12, 15);
        grid.set(2, 3, Cell::Full(0));
        grid.set(5, 9, Cell::Half(1, Orientation::UpperLeft));
        grid.set(3, 6, Cell::Full(2));
        let next = grid.cropped().unwrap();
        assert_eq!(next.rows(), 4);
        assert_eq!(next.cols(), 7);
        assert_eq!(next.cell(0, 0), Cell::Full(0));
        assert_eq!(next.cell(3, 6), Cell::Half(1, Orientation::UpperLeft));
    }

    #[test]
    fn crop_ignores_empty_and_degenerate_grids() {
        assert_eq!(PatternGrid::new(8, 8).cropped(), None);

        // A single painted row (or column) has no croppable extent.
        let mut row_only = PatternGrid::new(8, 8);
        row_only.set(3, 1, Cell::Full(0));
        row_only.set(3, 6, Cell::Full(0));
        assert_eq!(row_only.cropped(), None);

        let mut col_only = PatternGrid::new(8, 8);
        col_only.set(1, 4, Cell::Full(0));
        col_only.set(6, 4, Cell::Full(0));
        assert_eq!(col_only.cropped(), None);
    }

    #[test]
    fn cell_wire_encoding_round_trips() {
        let cells = vec![
            Cell::Empty,
            Cell::Full(3),
            Cell::Half(2, Orientation::UpperLeft),
            Cell::Half(0, Orientation::LowerLeft),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[null,3,"2:a","0:d"]"#);
        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }

    #[test]
    fn malformed_cell_encodings_are_rejected() {
        for bad in ["\"2\"", "\"a:2\"", "\"2:z\"", "\"2:aa\"", "-1", "true"] {
            assert!(
                serde_json::from_str::<Cell>(bad).is_err(),
                "expected {} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let ragged = vec![vec![Cell::Empty; 3], vec![Cell::Empty; 2]];
        assert!(PatternGrid::from_rows(ragged).is_err());
        assert!(PatternGrid::from_rows(Vec::new()).is_err());
    }

    #[test]
    fn rows_round_trip_through_the_document_shape() {
        let grid = PatternGrid::new(4, 3)
            .apply_stroke(1, 1, 0.5, FillType::Full, Some(0))
            .apply_stroke(2, 2, 1.0, FillType::Half(Orientation::LowerRight), Some(1));
        let back = PatternGrid::from_rows(grid.to_rows()).unwrap();
        assert_eq!(back, grid);
    }
}
