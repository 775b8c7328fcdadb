// ============================================================================
// PRINT SHEET — compose title + legend + chart, hand off to the OS
// ============================================================================
//
// "Printing" composes the whole sheet as one raster at the requested page
// size, saves it to a temp PNG, and asks the OS to print (Windows) or
// open (elsewhere) it. The same composer drives the in-dialog preview at
// a lower dpi and the headless CLI export.

use std::path::{Path, PathBuf};

use image::{imageops, Rgba, RgbaImage};

use crate::dmc;
use crate::ops::text::LabelFont;
use crate::pattern::PatternGrid;
use crate::raster::{self, ChartStyle};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([20, 20, 20, 255]);
const SWATCH_BORDER: Rgba<u8> = Rgba([90, 90, 90, 255]);

const MARGIN_MM: f32 = 12.0;
const TITLE_MM: f32 = 7.0;
const LABEL_MM: f32 = 3.2;
const SWATCH_MM: f32 = 6.0;

/// Physical page sizes the dialog offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSize {
    A4,
    A3,
}

impl PageSize {
    /// Portrait (width, height) in millimeters.
    pub fn mm(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A3 => (297.0, 420.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::A3 => "A3",
        }
    }

    pub fn all() -> &'static [PageSize] {
        &[PageSize::A4, PageSize::A3]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

impl PageOrientation {
    pub fn label(&self) -> &'static str {
        match self {
            PageOrientation::Portrait => "Portrait",
            PageOrientation::Landscape => "Landscape",
        }
    }

    pub fn all() -> &'static [PageOrientation] {
        &[PageOrientation::Portrait, PageOrientation::Landscape]
    }
}

/// One sheet rendering request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SheetSpec {
    pub page: PageSize,
    pub orientation: PageOrientation,
    /// Raster density. 150 for output, lower for the live preview.
    pub dpi: u32,
}

impl SheetSpec {
    pub fn new(page: PageSize, orientation: PageOrientation) -> Self {
        Self {
            page,
            orientation,
            dpi: 150,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    fn px(&self, mm: f32) -> u32 {
        (mm / 25.4 * self.dpi as f32).round().max(1.0) as u32
    }

    /// Page raster dimensions in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let (w_mm, h_mm) = self.page.mm();
        match self.orientation {
            PageOrientation::Portrait => (self.px(w_mm), self.px(h_mm)),
            PageOrientation::Landscape => (self.px(h_mm), self.px(w_mm)),
        }
    }
}

/// Compose the full sheet: document title, palette legend with closest
/// DMC annotations, then the chart scaled to the remaining area with the
/// same tenth/center guide rules as the editor. `font` may be `None`
/// (no system font); the sheet then carries no text but keeps its layout.
pub fn compose_sheet(
    name: &str,
    palette: &[String],
    grid: &PatternGrid,
    spec: &SheetSpec,
    font: Option<&LabelFont>,
) -> RgbaImage {
    let (page_w, page_h) = spec.pixel_size();
    let mut sheet = RgbaImage::from_pixel(page_w, page_h, WHITE);

    let margin = spec.px(MARGIN_MM);
    let title_px = spec.px(TITLE_MM) as f32;
    let label_px = spec.px(LABEL_MM) as f32;
    let swatch = spec.px(SWATCH_MM);
    let gap = spec.px(2.0);

    // ---- title ----
    let mut cursor_y = margin;
    if let Some(font) = font {
        font.draw(&mut sheet, name, title_px, margin as f32, cursor_y as f32, INK);
        cursor_y += font.line_height(title_px).ceil() as u32;
    } else {
        cursor_y += title_px as u32;
    }
    cursor_y += gap;

    // ---- palette legend ----
    if !palette.is_empty() {
        let row_h = swatch + gap;
        // The legend gets at most a quarter of the page; overflow wraps
        // into additional columns.
        let legend_max_h = (page_h / 4).max(row_h);
        let per_col = ((legend_max_h / row_h) as usize).max(1);
        let col_w = swatch + gap + spec.px(48.0);
        let legend_top = cursor_y;

        for (index, hex) in palette.iter().enumerate() {
            let col = index / per_col;
            let row = index % per_col;
            let x = margin + col as u32 * col_w;
            let y = legend_top + row as u32 * row_h;
            if x + swatch >= page_w || y + swatch >= page_h {
                continue;
            }

            let fill = dmc::parse_hex(hex)
                .map(|[r, g, b]| Rgba([r, g, b, 255]))
                .unwrap_or(WHITE);
            fill_rect(&mut sheet, x, y, swatch, swatch, fill);
            outline_rect(&mut sheet, x, y, swatch, swatch, SWATCH_BORDER);

            if let Some(font) = font {
                let label = match dmc::closest_dmc(hex) {
                    Some(m) => format!("{}  DMC {} {}", hex, m.color.id, m.color.name),
                    None => hex.clone(),
                };
                let text_y = y as f32 + (swatch as f32 - font.line_height(label_px)) / 2.0;
                font.draw(
                    &mut sheet,
                    &label,
                    label_px,
                    (x + swatch + gap) as f32,
                    text_y,
                    INK,
                );
            }
        }

        let rows_used = palette.len().min(per_col) as u32;
        cursor_y += rows_used * row_h + gap;
    }

    // ---- chart ----
    let chart_left = margin;
    let chart_top = cursor_y;
    let avail_w = page_w.saturating_sub(2 * margin).max(1);
    let avail_h = page_h.saturating_sub(chart_top + margin).max(1);
    let cell_px = (avail_w / grid.cols() as u32)
        .min(avail_h / grid.rows() as u32)
        .max(1);

    let chart = raster::render_chart(grid, palette, cell_px, &ChartStyle::print());
    let x = chart_left + (avail_w.saturating_sub(chart.width())) / 2;
    imageops::replace(&mut sheet, &chart, x as i64, chart_top as i64);

    sheet
}

fn fill_rect(image: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    for py in y..(y + h).min(image.height()) {
        for px in x..(x + w).min(image.width()) {
            image.put_pixel(px, py, color);
        }
    }
}

fn outline_rect(image: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x1 = (x + w - 1).min(image.width().saturating_sub(1));
    let y1 = (y + h - 1).min(image.height().saturating_sub(1));
    for px in x..=x1 {
        image.put_pixel(px, y, color);
        image.put_pixel(px, y1, color);
    }
    for py in y..=y1 {
        image.put_pixel(x, py, color);
        image.put_pixel(x1, py, color);
    }
}

// ---------------------------------------------------------------------------
//  OS handoff
// ---------------------------------------------------------------------------

/// Save the sheet to a temp PNG and hand it to the OS print/preview path.
pub fn print_sheet(sheet: &RgbaImage) -> Result<(), String> {
    let path = std::env::temp_dir().join("stitchfe_sheet.png");
    sheet
        .save(&path)
        .map_err(|e| format!("Failed to save print sheet: {}", e))?;
    send_to_os(&path)
}

/// Save the sheet to a user-chosen PNG path.
pub fn export_sheet(sheet: &RgbaImage, path: &Path) -> Result<(), String> {
    sheet
        .save(path)
        .map_err(|e| format!("Failed to export sheet: {}", e))
}

#[cfg(target_os = "windows")]
fn send_to_os(path: &PathBuf) -> Result<(), String> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use winapi::um::shellapi::ShellExecuteW;
    use winapi::um::winuser::SW_SHOWNORMAL;

    fn to_wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
    }

    let verb = to_wide("print");
    let file = to_wide(&path.to_string_lossy());

    let result = unsafe {
        ShellExecuteW(
            std::ptr::null_mut(),
            verb.as_ptr(),
            file.as_ptr(),
            std::ptr::null(),
            std::ptr::null(),
            SW_SHOWNORMAL,
        )
    };

    // ShellExecuteW returns > 32 on success
    if result as usize > 32 {
        Ok(())
    } else {
        Err(format!("ShellExecuteW print failed (code {})", result as usize))
    }
}

#[cfg(target_os = "macos")]
fn send_to_os(path: &PathBuf) -> Result<(), String> {
    std::process::Command::new("open")
        .arg(path)
        .spawn()
        .map_err(|e| format!("Failed to open sheet: {}", e))?;
    Ok(())
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn send_to_os(path: &PathBuf) -> Result<(), String> {
    std::process::Command::new("xdg-open")
        .arg(path)
        .spawn()
        .map_err(|e| format!("Failed to open sheet: {}", e))?;
    Ok(())
}

// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::FillType;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_pixel_sizes_follow_iso_dimensions() {
        let a4 = SheetSpec::new(PageSize::A4, PageOrientation::Portrait);
        assert_eq!(a4.pixel_size(), (1240, 1754));

        let a4_landscape = SheetSpec::new(PageSize::A4, PageOrientation::Landscape);
        assert_eq!(a4_landscape.pixel_size(), (1754, 1240));

        let a3 = SheetSpec::new(PageSize::A3, PageOrientation::Portrait);
        assert_eq!(a3.pixel_size(), (1754, 2480));
    }

    #[test]
    fn sheet_carries_the_painted_chart() {
        let palette = vec!["#ff0000".to_string()];
        let grid = PatternGrid::new(10, 10).apply_stroke(5, 5, 1.0, FillType::Full, Some(0));
        let spec = SheetSpec::new(PageSize::A4, PageOrientation::Portrait).with_dpi(60);
        let sheet = compose_sheet("Test", &palette, &grid, &spec, None);

        assert_eq!((sheet.width(), sheet.height()), spec.pixel_size());
        let red_pixels = sheet
            .pixels()
            .filter(|p| **p == Rgba([255, 0, 0, 255]))
            .count();
        assert!(red_pixels > 0, "expected painted cells on the sheet");
    }

    #[test]
    fn empty_palette_and_missing_font_still_compose() {
        let grid = PatternGrid::new(4, 4);
        let spec = SheetSpec::new(PageSize::A3, PageOrientation::Landscape).with_dpi(40);
        let sheet = compose_sheet("", &[], &grid, &spec, None);
        assert_eq!((sheet.width(), sheet.height()), spec.pixel_size());
    }
}
