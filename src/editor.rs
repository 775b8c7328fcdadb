// ============================================================================
// EDITOR VIEW — interactive chart canvas (texture cache + painting input)
// ============================================================================

use eframe::egui;
use egui::{
    Color32, ColorImage, Pos2, Rect, Sense, Stroke, TextureFilter, TextureHandle, TextureOptions,
    Vec2,
};
use image::RgbaImage;

use crate::pattern::{Brush, FillType, PatternGrid};
use crate::raster::{self, ChartStyle};

/// On-screen cell size at zoom 1.0.
pub const BASE_CELL_PX: u32 = 8;

pub const ZOOM_MIN: f32 = 0.5;
pub const ZOOM_MAX: f32 = 4.0;

/// What happened during one frame of editor interaction.
#[derive(Default)]
pub struct EditorResponse {
    /// At least one stroke was applied this frame.
    pub painted: bool,
    /// The zoom level changed (ctrl + scroll).
    pub zoom_changed: bool,
}

pub struct EditorView {
    texture: Option<TextureHandle>,
    /// Cell size the cached texture was rendered at.
    texture_cell_px: u32,
    chart_dirty: bool,
    /// Painting state machine: true between pointer-down on the chart and
    /// pointer-up / pointer-leave.
    painting: bool,
    pan_offset: Vec2,
}

impl Default for EditorView {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorView {
    pub fn new() -> Self {
        Self {
            texture: None,
            texture_cell_px: 0,
            chart_dirty: true,
            painting: false,
            pan_offset: Vec2::ZERO,
        }
    }

    /// Grid or palette changed; re-rasterize before the next draw.
    pub fn mark_dirty(&mut self) {
        self.chart_dirty = true;
    }

    pub fn reset_view(&mut self) {
        self.pan_offset = Vec2::ZERO;
        self.chart_dirty = true;
    }

    fn cell_px(zoom: f32) -> u32 {
        (BASE_CELL_PX as f32 * zoom).round().max(1.0) as u32
    }

    /// Render the chart texture if the grid, palette, or zoom changed.
    fn refresh_texture(
        &mut self,
        ctx: &egui::Context,
        grid: &PatternGrid,
        palette: &[String],
        cell_px: u32,
    ) {
        if !self.chart_dirty && self.texture_cell_px == cell_px && self.texture.is_some() {
            return;
        }
        let chart = raster::render_chart(grid, palette, cell_px, &ChartStyle::screen());
        self.texture = Some(ctx.load_texture(
            "chart",
            to_color_image(&chart),
            TextureOptions {
                magnification: TextureFilter::Nearest,
                minification: TextureFilter::Linear,
                ..Default::default()
            },
        ));
        self.texture_cell_px = cell_px;
        self.chart_dirty = false;
    }

    /// Draw the chart and run one frame of the painting state machine.
    /// `paint` is the palette index to deposit (`None` erases). Strokes
    /// mutate `grid` by value replacement; the caller persists on
    /// `response.painted`.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        grid: &mut PatternGrid,
        palette: &[String],
        brush: &Brush,
        paint: Option<usize>,
        zoom: &mut f32,
    ) -> EditorResponse {
        let mut out = EditorResponse::default();

        let cell_px = Self::cell_px(*zoom);
        self.refresh_texture(ui.ctx(), grid, palette, cell_px);

        let available = ui.available_size();
        let sense = Sense::click_and_drag().union(Sense::hover());
        let (response, painter) = ui.allocate_painter(available, sense);
        let canvas_rect = response.rect;

        painter.rect_filled(canvas_rect, 0.0, ui.visuals().extreme_bg_color);

        // Middle mouse pans, ctrl + scroll zooms around the view.
        if response.dragged() && ui.input(|i| i.pointer.middle_down()) {
            self.pan_offset += response.drag_delta();
        }
        if response.hovered() {
            let (scroll, ctrl) = ui.input(|i| (i.scroll_delta.y, i.modifiers.ctrl));
            if ctrl && scroll != 0.0 {
                let factor = if scroll > 0.0 { 1.1 } else { 1.0 / 1.1 };
                let next = (*zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
                if next != *zoom {
                    *zoom = next;
                    out.zoom_changed = true;
                }
            }
        }

        let chart_size = Vec2::new(
            (grid.cols() as u32 * cell_px) as f32,
            (grid.rows() as u32 * cell_px) as f32,
        );
        let chart_rect = Rect::from_min_size(canvas_rect.min + self.pan_offset, chart_size);

        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                chart_rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // ---- painting state machine ----
        let pointer = response.hover_pos();
        let primary_down = ui.input(|i| i.pointer.primary_down());
        let primary_pressed = ui.input(|i| i.pointer.primary_pressed());

        let hit = pointer.filter(|p| chart_rect.contains(*p)).map(|p| {
            let rel = p - chart_rect.min;
            raster::cell_at(rel.x, rel.y, cell_px as f32)
        });

        if primary_pressed {
            if let Some((row, col)) = hit {
                self.painting = true;
                *grid = grid.apply_stroke(row, col, brush.size, brush.fill, paint);
                out.painted = true;
            }
        } else if self.painting && primary_down {
            // No interpolation between samples: each frame strokes the
            // cell currently under the pointer, nothing in between.
            if let Some((row, col)) = hit {
                *grid = grid.apply_stroke(row, col, brush.size, brush.fill, paint);
                out.painted = true;
            }
        }

        // Pointer released or left the paintable surface: back to idle.
        if !primary_down || hit.is_none() {
            self.painting = false;
        }

        if out.painted {
            self.chart_dirty = true;
        }

        // ---- brush cursor ----
        if let Some(pos) = pointer.filter(|p| chart_rect.contains(*p)) {
            match brush.fill {
                FillType::Full => {
                    let radius = brush.size * cell_px as f32;
                    painter.circle_stroke(pos, radius, Stroke::new(1.0, Color32::BLACK));
                }
                FillType::Half(_) => {
                    // Half stitches land in exactly one cell; outline it.
                    if let Some((row, col)) = hit {
                        let min = chart_rect.min
                            + Vec2::new(col as f32 * cell_px as f32, row as f32 * cell_px as f32);
                        let rect = Rect::from_min_size(min, Vec2::splat(cell_px as f32));
                        painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::BLACK));
                    }
                }
            }
        }

        out
    }
}

fn to_color_image(image: &RgbaImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied(
        [image.width() as usize, image.height() as usize],
        image.as_raw(),
    )
}
