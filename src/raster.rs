// ============================================================================
// CHART RASTERIZATION — grid + palette -> RGBA pixels
// ============================================================================
//
// One rasterizer serves both the editor texture and the print sheet, so
// half-stitch geometry and guide-line rules cannot drift between the two.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::dmc;
use crate::pattern::{Cell, Orientation, PatternGrid};

/// Minor boundary line: low-opacity gray after every cell.
const LINE_MINOR: Rgba<u8> = Rgba([127, 127, 127, 77]);
/// Heavier line every 10th row/column.
const LINE_TENTH: Rgba<u8> = Rgba([40, 40, 40, 210]);
/// Highlight on the row/column through the grid center.
const LINE_CENTER: Rgba<u8> = Rgba([214, 40, 40, 230]);

/// Visual options for one render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartStyle {
    /// Fill for empty cells. Transparent on screen, paper-white in print.
    pub background: Rgba<u8>,
    /// Draw cell boundary lines (incl. the heavier tenth lines).
    pub grid_lines: bool,
    /// Highlight the center row and column.
    pub center_guides: bool,
}

impl ChartStyle {
    pub fn screen() -> Self {
        Self {
            background: Rgba([0, 0, 0, 0]),
            grid_lines: true,
            center_guides: true,
        }
    }

    pub fn print() -> Self {
        Self {
            background: Rgba([255, 255, 255, 255]),
            grid_lines: true,
            center_guides: true,
        }
    }
}

/// Map a point relative to the chart origin to its owning (row, col).
/// Shared by editor hit-testing and the rasterizer's own placement.
pub fn cell_at(x: f32, y: f32, cell_px: f32) -> (i32, i32) {
    ((y / cell_px).floor() as i32, (x / cell_px).floor() as i32)
}

/// True when local pixel (lx, ly) of a `cell_px` square lies in the half
/// kept by `orientation`. UpperLeft/LowerRight split the square along the
/// anti-diagonal, UpperRight/LowerLeft along the main diagonal.
fn half_covers(orientation: Orientation, lx: u32, ly: u32, cell_px: u32) -> bool {
    match orientation {
        Orientation::UpperLeft => lx + ly < cell_px,
        Orientation::LowerRight => lx + ly >= cell_px,
        Orientation::UpperRight => lx >= ly,
        Orientation::LowerLeft => lx < ly,
    }
}

/// Render the chart at `cell_px` pixels per cell. The surface is exactly
/// `cols * cell_px` by `rows * cell_px`; guide lines are overlaid after
/// the cell fills and never touch the grid data.
pub fn render_chart(
    grid: &PatternGrid,
    palette: &[String],
    cell_px: u32,
    style: &ChartStyle,
) -> RgbaImage {
    let cell_px = cell_px.max(1);
    let width = grid.cols() as u32 * cell_px;
    let height = grid.rows() as u32 * cell_px;

    // Parse each palette entry once. A cell referencing an invalid index
    // or an unparsable color renders as background.
    let colors: Vec<Option<Rgba<u8>>> = palette
        .iter()
        .map(|hex| dmc::parse_hex(hex).map(|[r, g, b]| Rgba([r, g, b, 255])))
        .collect();

    let stride = width as usize * 4;
    let mut buf = vec![0u8; stride * height as usize];

    buf.par_chunks_mut(stride).enumerate().for_each(|(y, scanline)| {
        let row = y as u32 / cell_px;
        let ly = y as u32 % cell_px;
        for x in 0..width {
            let col = x / cell_px;
            let lx = x % cell_px;
            let pixel = match grid.cell(row as usize, col as usize) {
                Cell::Empty => style.background,
                Cell::Full(i) => cell_color(&colors, i, style.background),
                Cell::Half(i, o) => {
                    if half_covers(o, lx, ly, cell_px) {
                        cell_color(&colors, i, style.background)
                    } else {
                        style.background
                    }
                }
            };
            let at = x as usize * 4;
            scanline[at..at + 4].copy_from_slice(&pixel.0);
        }
    });

    let mut image = RgbaImage::from_raw(width, height, buf)
        .unwrap_or_else(|| RgbaImage::new(width, height));

    if style.grid_lines {
        overlay_guides(&mut image, grid, cell_px, style.center_guides);
    }
    image
}

fn cell_color(colors: &[Option<Rgba<u8>>], index: usize, background: Rgba<u8>) -> Rgba<u8> {
    colors.get(index).copied().flatten().unwrap_or(background)
}

/// Boundary lines after every cell, heavier every 10th, optional center
/// highlight. Line precedence: center > tenth > minor.
fn overlay_guides(image: &mut RgbaImage, grid: &PatternGrid, cell_px: u32, center: bool) {
    let width = image.width();
    let height = image.height();

    for col in 0..=grid.cols() {
        let color = boundary_color(col, grid.center_col(), center);
        let x = (col as u32 * cell_px).min(width.saturating_sub(1));
        for y in 0..height {
            blend_pixel(image, x, y, color);
        }
    }
    for row in 0..=grid.rows() {
        let color = boundary_color(row, grid.center_row(), center);
        let y = (row as u32 * cell_px).min(height.saturating_sub(1));
        for x in 0..width {
            blend_pixel(image, x, y, color);
        }
    }
}

fn boundary_color(index: usize, center_index: usize, center: bool) -> Rgba<u8> {
    if center && index == center_index {
        LINE_CENTER
    } else if index % 10 == 0 {
        LINE_TENTH
    } else {
        LINE_MINOR
    }
}

/// Source-over blend of `src` onto the pixel at (x, y).
pub(crate) fn blend_pixel(image: &mut RgbaImage, x: u32, y: u32, src: Rgba<u8>) {
    let dst = image.get_pixel_mut(x, y);
    let sa = src.0[3] as f32 / 255.0;
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for ch in 0..3 {
        let s = src.0[ch] as f32;
        let d = dst.0[ch] as f32;
        dst.0[ch] = ((s * sa + d * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::FillType;
    use pretty_assertions::assert_eq;

    fn bare(background: Rgba<u8>) -> ChartStyle {
        ChartStyle {
            background,
            grid_lines: false,
            center_guides: false,
        }
    }

    #[test]
    fn surface_matches_grid_dimensions() {
        let grid = PatternGrid::new(3, 2);
        let image = render_chart(&grid, &[], 8, &ChartStyle::screen());
        assert_eq!(image.width(), 16);
        assert_eq!(image.height(), 24);
    }

    #[test]
    fn full_cell_fills_its_square_only() {
        let grid = PatternGrid::new(2, 2).apply_stroke(0, 0, 0.5, FillType::Full, Some(0));
        let palette = vec!["#ff0000".to_string()];
        let image = render_chart(&grid, &palette, 8, &bare(Rgba([0, 0, 0, 0])));
        assert_eq!(*image.get_pixel(3, 3), Rgba([255, 0, 0, 255]));
        assert_eq!(*image.get_pixel(12, 3), Rgba([0, 0, 0, 0]));
        assert_eq!(*image.get_pixel(3, 12), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn half_cells_cover_half_the_square_and_opposites_partition_it() {
        // The shared diagonal pixel row belongs to one side, so each half
        // covers cell_px^2 / 2 +/- cell_px / 2 and opposite orientations
        // tile the square exactly.
        let cell_px = 10u32;
        let palette = vec!["#00ff00".to_string()];
        let count = |orientation| {
            let grid = PatternGrid::new(1, 1).apply_stroke(
                0,
                0,
                1.0,
                FillType::Half(orientation),
                Some(0),
            );
            let image = render_chart(&grid, &palette, cell_px, &bare(Rgba([0, 0, 0, 0])));
            image
                .pixels()
                .filter(|p| **p == Rgba([0, 255, 0, 255]))
                .count()
        };

        let total = (cell_px * cell_px) as usize;
        let slack = (cell_px / 2) as usize;
        for &orientation in Orientation::all() {
            let painted = count(orientation);
            assert!(
                painted >= total / 2 - slack && painted <= total / 2 + slack,
                "{:?} painted {}",
                orientation,
                painted
            );
        }
        assert_eq!(
            count(Orientation::UpperLeft) + count(Orientation::LowerRight),
            total
        );
        assert_eq!(
            count(Orientation::UpperRight) + count(Orientation::LowerLeft),
            total
        );
    }

    #[test]
    fn opposite_orientations_partition_the_square() {
        let palette = vec!["#0000ff".to_string()];
        let upper = PatternGrid::new(1, 1).apply_stroke(
            0,
            0,
            1.0,
            FillType::Half(Orientation::UpperLeft),
            Some(0),
        );
        let image = render_chart(&upper, &palette, 8, &bare(Rgba([0, 0, 0, 0])));
        assert_eq!(*image.get_pixel(1, 1), Rgba([0, 0, 255, 255]));
        assert_eq!(*image.get_pixel(7, 7), Rgba([0, 0, 0, 0]));

        let lower = PatternGrid::new(1, 1).apply_stroke(
            0,
            0,
            1.0,
            FillType::Half(Orientation::LowerRight),
            Some(0),
        );
        let image = render_chart(&lower, &palette, 8, &bare(Rgba([0, 0, 0, 0])));
        assert_eq!(*image.get_pixel(1, 1), Rgba([0, 0, 0, 0]));
        assert_eq!(*image.get_pixel(7, 7), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn invalid_palette_reference_renders_as_background() {
        let grid = PatternGrid::new(1, 1).apply_stroke(0, 0, 0.5, FillType::Full, Some(5));
        let image = render_chart(&grid, &["#ff0000".to_string()], 4, &bare(Rgba([9, 9, 9, 255])));
        assert_eq!(*image.get_pixel(1, 1), Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn center_guides_draw_a_red_line_through_the_middle() {
        let grid = PatternGrid::new(21, 21);
        let image = render_chart(&grid, &[], 4, &ChartStyle::print());
        // Center column is 10, so its boundary line sits at x = 40.
        let p = *image.get_pixel(40, 2);
        assert!(p.0[0] > 150 && p.0[0] > p.0[1] + 60, "expected red-ish, got {:?}", p);
        // A plain boundary keeps its gray blend instead.
        let q = *image.get_pixel(4, 2);
        assert_eq!(q.0[0], q.0[1]);
    }

    #[test]
    fn tenth_lines_are_darker_than_minor_lines() {
        let grid = PatternGrid::new(25, 25);
        let style = ChartStyle {
            center_guides: false,
            ..ChartStyle::print()
        };
        let image = render_chart(&grid, &[], 4, &style);
        let tenth = *image.get_pixel(40, 2);
        let minor = *image.get_pixel(4, 2);
        assert!(tenth.0[0] < minor.0[0], "tenth {:?} minor {:?}", tenth, minor);
    }

    #[test]
    fn pointer_mapping_floors_into_cells() {
        assert_eq!(cell_at(0.0, 0.0, 8.0), (0, 0));
        assert_eq!(cell_at(7.9, 3.0, 8.0), (0, 0));
        assert_eq!(cell_at(8.0, 15.9, 8.0), (1, 1));
        assert_eq!(cell_at(17.0, 24.0, 8.0), (3, 2));
    }
}
