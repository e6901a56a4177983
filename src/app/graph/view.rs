use std::time::Instant;

use eframe::egui::{self, Align2, FontId, Sense, Stroke, Ui};
use netview::{NavControl, Point};

use super::super::ViewModel;
use super::super::render_utils::{draw_background, parse_color, to_pos2};

const GRID_STEP: f32 = 48.0;

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let width = rect.width().max(1.0) as u32;
        let height = rect.height().max(1.0) as u32;
        self.network.resize(width, height, Instant::now());

        self.handle_drag(&response);
        self.handle_wheel(ui, rect, &response);
        self.handle_keys(ui);
        self.handle_hover(ui, rect, &response);
        self.handle_click(ui, rect, &response);
        self.scene.apply(self.network.drain_render_ops());

        let painter = ui.painter_at(rect);
        let origin = to_pos2(rect, self.network.viewport().log_to_screen(Point::ZERO));
        draw_background(&painter, rect, origin, GRID_STEP);
        self.scene.paint(&painter, rect);

        if self.network.options().show_navigation_controls {
            self.draw_navigation_controls(&painter, rect);
        }

        if let Some(id) = self.network.hovered() {
            ui.ctx().set_cursor_icon(self.scene.cursor_for_node(id));
        } else if self.network.is_scrolling() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }
    }

    fn draw_navigation_controls(&self, painter: &egui::Painter, canvas: egui::Rect) {
        let color = parse_color(&self.network.options().control_color, 1.0)
            .unwrap_or(egui::Color32::BLACK);
        let stroke = Stroke::new(1.0, color);

        for control in NavControl::ALL {
            let bounds = control.rect();
            let rect = egui::Rect::from_min_max(
                to_pos2(canvas, Point::new(bounds.x_min, bounds.y_min)),
                to_pos2(canvas, Point::new(bounds.x_max, bounds.y_max)),
            );
            painter.rect_filled(rect, 2.0, egui::Color32::from_white_alpha(200));
            painter.rect_stroke(rect, 2.0, stroke, egui::StrokeKind::Inside);
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                control.label(),
                FontId::monospace(12.0),
                color,
            );
        }
    }
}
