// ============================================================================
// BRUSH PANEL — fill-type buttons + size slider
// ============================================================================

use eframe::egui;
use egui::{Pos2, Sense, Shape, Stroke, Vec2};

use crate::pattern::{Brush, FillType, Orientation, BRUSH_SIZE_MAX, BRUSH_SIZE_MIN};

const BUTTON_SIZE: f32 = 26.0;

pub struct BrushPanel;

impl BrushPanel {
    pub fn new() -> Self {
        Self
    }

    /// Returns true when the brush changed (caller persists it).
    pub fn show(&mut self, ui: &mut egui::Ui, brush: &mut Brush) -> bool {
        let mut changed = false;

        ui.heading("Brush");
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            if Self::fill_button(ui, FillType::Full, brush.fill == FillType::Full).clicked()
                && brush.fill != FillType::Full
            {
                brush.fill = FillType::Full;
                changed = true;
            }
            for &orientation in Orientation::all() {
                let fill = FillType::Half(orientation);
                if Self::fill_button(ui, fill, brush.fill == fill).clicked() && brush.fill != fill {
                    brush.fill = fill;
                    changed = true;
                }
            }
        });

        ui.add_space(4.0);
        let slider = ui.add(
            egui::Slider::new(&mut brush.size, BRUSH_SIZE_MIN..=BRUSH_SIZE_MAX)
                .step_by(0.1)
                .text("Brush size"),
        );
        changed |= slider.changed();

        if matches!(brush.fill, FillType::Half(_)) {
            ui.weak("Half stitches always paint a single cell.");
        }

        changed
    }

    /// Icon button: a filled dot for the full stitch, a triangle for each
    /// half-stitch orientation.
    fn fill_button(ui: &mut egui::Ui, fill: FillType, active: bool) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(BUTTON_SIZE), Sense::click());
        let painter = ui.painter();

        let bg = if active {
            ui.visuals().selection.bg_fill
        } else {
            ui.visuals().widgets.inactive.bg_fill
        };
        painter.rect_filled(rect, 4.0, bg);

        let ink = ui.visuals().strong_text_color();
        let icon = rect.shrink(7.0);
        match fill {
            FillType::Full => {
                painter.circle_filled(icon.center(), icon.width() / 2.0, ink);
            }
            FillType::Half(orientation) => {
                let points = Self::triangle_points(icon.min, icon.max, orientation);
                painter.add(Shape::convex_polygon(points, ink, Stroke::NONE));
            }
        }
        response.on_hover_text(match fill {
            FillType::Full => "Full stitch",
            FillType::Half(Orientation::UpperLeft) => "Half stitch, upper left",
            FillType::Half(Orientation::UpperRight) => "Half stitch, upper right",
            FillType::Half(Orientation::LowerRight) => "Half stitch, lower right",
            FillType::Half(Orientation::LowerLeft) => "Half stitch, lower left",
        })
    }

    /// Triangle vertices matching the rasterizer's half-cell geometry.
    fn triangle_points(min: Pos2, max: Pos2, orientation: Orientation) -> Vec<Pos2> {
        let tl = min;
        let tr = Pos2::new(max.x, min.y);
        let br = max;
        let bl = Pos2::new(min.x, max.y);
        match orientation {
            Orientation::UpperLeft => vec![tl, tr, bl],
            Orientation::UpperRight => vec![tl, tr, br],
            Orientation::LowerRight => vec![tr, br, bl],
            Orientation::LowerLeft => vec![tl, br, bl],
        }
    }
}
