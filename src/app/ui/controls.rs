use eframe::egui::{self, RichText, Ui};
use netview::{Key, NetworkError};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("View");
        ui.add_space(6.0);

        let viewport = self.network.viewport();
        ui.label(format!("center: {}", viewport.center));
        ui.label(format!(
            "zoom: {:.3} (default {:.3})",
            viewport.zoom, viewport.default_zoom
        ));
        let rect = viewport.visible_rect();
        ui.small(format!(
            "visible x [{:.3}, {:.3}]  y [{:.3}, {:.3}]",
            rect.x_min, rect.x_max, rect.y_min, rect.y_max
        ));
        ui.add_space(6.0);

        let mut pressed = None;
        ui.horizontal(|ui| {
            if ui.button("Zoom in").clicked() {
                pressed = Some(Key::ZoomIn);
            }
            if ui.button("Zoom out").clicked() {
                pressed = Some(Key::ZoomOut);
            }
            if ui.button("Reset").clicked() {
                pressed = Some(Key::Reset);
            }
        });
        ui.horizontal(|ui| {
            for (label, key) in [
                ("◀", Key::Left),
                ("▲", Key::Up),
                ("▼", Key::Down),
                ("▶", Key::Right),
            ] {
                if ui.button(label).clicked() {
                    pressed = Some(key);
                }
            }
        });
        if let Some(key) = pressed {
            let result: Result<(), NetworkError> = self.network.key(key);
            if let Err(error) = result {
                self.last_error = Some(error.to_string());
            }
        }

        ui.separator();
        ui.label(RichText::new("Selection").strong());
        let selected: Vec<String> = self.network.selection().to_vec();
        let selected_edges: Vec<String> = self.network.edge_selection().to_vec();
        if selected.is_empty() && selected_edges.is_empty() {
            ui.label("Nothing selected.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("selection_scroll")
                .max_height(200.0)
                .auto_shrink([false, true])
                .show(ui, |ui| {
                    for id in selected.iter().chain(&selected_edges) {
                        ui.monospace(id.as_str());
                    }
                });
            ui.horizontal(|ui| {
                if ui.button("Show selection").clicked() {
                    let points: Vec<_> = selected
                        .iter()
                        .filter_map(|id| self.network.node(id))
                        .map(|node| node.pos)
                        .collect();
                    self.network.scroll_into_view(&points);
                }
                if ui.button("Clear").clicked() {
                    self.network.set_selection(Vec::<String>::new());
                }
            });
        }

        ui.separator();
        ui.label(RichText::new("Refresh protocol").strong());
        ui.label(format!("applied data version: {}", self.network.data_version()));
        ui.label(format!(
            "requested version: {}",
            self.network.requested_version()
        ));
        ui.label(format!("results applied: {}", self.reports_applied));
        if let Some(text) = self.deadline_text() {
            ui.label(text);
        }
        if let Some(report) = &self.last_report {
            ui.small(format!(
                "nodes +{} ~{} -{}  edges +{} ~{} -{}",
                report.nodes_created,
                report.nodes_updated,
                report.nodes_removed,
                report.edges_created,
                report.edges_updated,
                report.edges_removed
            ));
        }
        if let Some(event) = &self.last_navigation {
            ui.small(format!(
                "last navigation: {} at zoom {:.3}",
                event.center, event.zoom
            ));
        }
        if let Some(href) = &self.last_link {
            ui.small(format!("last link: {href}"));
        }
        if let Some(error) = self.last_error.clone() {
            ui.add_space(4.0);
            ui.colored_label(egui::Color32::from_rgb(190, 40, 40), error);
            if ui.small_button("Dismiss").clicked() {
                self.last_error = None;
            }
        }
    }
}
