use eframe::egui::{self, Key as EguiKey, Pos2, Rect, Ui, Vec2};
use netview::{ClickOutcome, Key, NavControl, NetworkError};
use tracing::{debug, info};

use super::super::ViewModel;
use super::super::render_utils::to_point;

const KEY_BINDINGS: [(EguiKey, Key); 8] = [
    (EguiKey::Plus, Key::ZoomIn),
    (EguiKey::Equals, Key::ZoomIn),
    (EguiKey::Minus, Key::ZoomOut),
    (EguiKey::ArrowUp, Key::Up),
    (EguiKey::ArrowDown, Key::Down),
    (EguiKey::ArrowLeft, Key::Left),
    (EguiKey::ArrowRight, Key::Right),
    (EguiKey::Period, Key::Reset),
];

fn canvas_local(rect: Rect, pointer: Pos2) -> Pos2 {
    pointer - rect.min.to_vec2()
}

impl ViewModel {
    fn record(&mut self, result: Result<(), NetworkError>) {
        if let Err(error) = result {
            self.last_error = Some(error.to_string());
        }
    }

    pub(in crate::app) fn handle_drag(&mut self, response: &egui::Response) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            self.drag_offset = Vec2::ZERO;
            self.network.hover_leave();
            self.network.drag_start();
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            if delta != Vec2::ZERO {
                self.drag_offset += delta;
                self.network
                    .drag_move(f64::from(self.drag_offset.x), f64::from(self.drag_offset.y));
            }
        }

        if response.drag_stopped_by(egui::PointerButton::Primary) {
            self.network.drag_end();
            self.drag_offset = Vec2::ZERO;
        }
    }

    pub(in crate::app) fn handle_wheel(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let result = self
            .network
            .wheel(f64::from(scroll), to_point(rect, pointer))
            .map(|zoomed| {
                if !zoomed {
                    debug!("wheel zoom ignored");
                }
            });
        self.record(result);
    }

    pub(in crate::app) fn handle_keys(&mut self, ui: &Ui) {
        if ui.ctx().wants_keyboard_input() {
            return;
        }

        let pressed: Vec<Key> = ui.input(|input| {
            KEY_BINDINGS
                .iter()
                .filter(|(egui_key, _)| input.key_pressed(*egui_key))
                .map(|(_, key)| *key)
                .collect()
        });
        for key in pressed {
            let result = self.network.key(key);
            self.record(result);
        }
    }

    pub(in crate::app) fn handle_hover(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if self.network.is_scrolling() {
            return;
        }

        let hovered = response
            .hovered()
            .then(|| ui.input(|input| input.pointer.hover_pos()))
            .flatten()
            .and_then(|pointer| self.scene.node_at(canvas_local(rect, pointer)))
            .map(str::to_owned);

        match hovered {
            Some(id) => self.network.hover_enter(&id),
            None => self.network.hover_leave(),
        }
    }

    pub(in crate::app) fn handle_click(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.clicked() {
            return;
        }
        let Some(pointer) = response.interact_pointer_pos() else {
            return;
        };
        let toggle = ui.input(|input| input.modifiers.shift);
        let screen = to_point(rect, pointer);

        if self.network.options().show_navigation_controls
            && let Some(control) = NavControl::at(screen)
        {
            let result = self.network.nav_control(control);
            self.record(result);
            return;
        }

        let local = canvas_local(rect, pointer);
        let outcome = if let Some(id) = self.scene.node_at(local).map(str::to_owned) {
            self.network.click_node(&id, toggle)
        } else if let Some(id) = self.scene.edge_at(local).map(str::to_owned) {
            self.network.click_edge(&id, toggle)
        } else {
            self.network.click_background()
        };

        if let ClickOutcome::Link(href) = outcome {
            info!(%href, "opening link");
            ui.ctx().open_url(egui::OpenUrl::new_tab(href.as_str()));
            self.last_link = Some(href);
        }
    }
}
