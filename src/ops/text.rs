// ============================================================================
// SHEET LABELS — system-font text rasterization for the print sheet
// ============================================================================
//
// The print sheet is a plain RGBA raster, so its title and legend labels
// are drawn with ab_glyph against a system font found via font-kit. When
// no usable font exists (bare containers), label drawing is skipped and
// the sheet still renders; text is annotation, not structure.

use ab_glyph::{point, Font, FontArc, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::raster::blend_pixel;

/// A loaded label font. One per sheet composition.
pub struct LabelFont {
    font: FontArc,
}

impl LabelFont {
    /// Best-match system sans-serif.
    pub fn system() -> Option<Self> {
        use font_kit::family_name::FamilyName;
        use font_kit::properties::Properties;
        use font_kit::source::SystemSource;

        let handle = SystemSource::new()
            .select_best_match(&[FamilyName::SansSerif], &Properties::new())
            .ok()?;
        let loaded = handle.load().ok()?;
        let data = loaded.copy_font_data()?;
        let font = FontArc::try_from_vec((*data).clone()).ok()?;
        Some(Self { font })
    }

    /// Advance width of `text` at `size` pixels, kerning included.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(size);
        let mut width = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = prev {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }

    pub fn line_height(&self, size: f32) -> f32 {
        self.font.as_scaled(size).height()
    }

    /// Draw a single line with its top-left corner at (x, y). Returns the
    /// advance width actually used.
    pub fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        size: f32,
        x: f32,
        y: f32,
        color: Rgba<u8>,
    ) -> f32 {
        let scaled = self.font.as_scaled(size);
        let baseline = y + scaled.ascent();
        let mut cursor = x;
        let mut prev = None;

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = prev {
                cursor += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(size, point(cursor, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let ix = bounds.min.x as i32 + px as i32;
                    let iy = bounds.min.y as i32 + py as i32;
                    if ix < 0 || iy < 0 || ix >= image.width() as i32 || iy >= image.height() as i32
                    {
                        return;
                    }
                    let alpha = (color.0[3] as f32 * coverage).round().min(255.0) as u8;
                    if alpha > 0 {
                        blend_pixel(
                            image,
                            ix as u32,
                            iy as u32,
                            Rgba([color.0[0], color.0[1], color.0[2], alpha]),
                        );
                    }
                });
            }
            cursor += scaled.h_advance(id);
            prev = Some(id);
        }
        cursor - x
    }
}

// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Headless test machines may have no fonts at all; these tests only
    // assert behavior when a font could be loaded.

    #[test]
    fn text_width_grows_with_content() {
        let Some(font) = LabelFont::system() else {
            return;
        };
        let short = font.text_width("A", 16.0);
        let long = font.text_width("ABBA", 16.0);
        assert!(long > short);
        assert_eq!(font.text_width("", 16.0), 0.0);
    }

    #[test]
    fn drawing_marks_pixels_inside_the_image() {
        let Some(font) = LabelFont::system() else {
            return;
        };
        let mut image = RgbaImage::from_pixel(64, 32, Rgba([255, 255, 255, 255]));
        font.draw(&mut image, "Xy", 20.0, 4.0, 4.0, Rgba([0, 0, 0, 255]));
        let darkened = image.pixels().filter(|p| p.0[0] < 200).count();
        assert!(darkened > 0);
    }
}
