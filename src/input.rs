use tracing::debug;

use crate::error::NetworkError;
use crate::geometry::{Point, Rect};
use crate::highlight::Highlightable;
use crate::network::Network;

const NAV_CONTROL_SIZE: f64 = 16.0;
const NAV_CONTROL_POS: f64 = 8.0;
const NAV_CONTROL_GAP: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ZoomIn,
    ZoomOut,
    Up,
    Down,
    Left,
    Right,
    Reset,
}

/// On-screen `+`, `·` and `−` buttons, stacked top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavControl {
    ZoomIn,
    Reset,
    ZoomOut,
}

impl NavControl {
    pub const ALL: [Self; 3] = [Self::ZoomIn, Self::Reset, Self::ZoomOut];

    pub fn label(self) -> &'static str {
        match self {
            Self::ZoomIn => "+",
            Self::Reset => "·",
            Self::ZoomOut => "−",
        }
    }

    /// Screen rectangle of the button.
    pub fn rect(self) -> Rect {
        let slot = match self {
            Self::ZoomIn => 0.0,
            Self::Reset => 1.0,
            Self::ZoomOut => 2.0,
        };
        let y = NAV_CONTROL_POS + slot * (NAV_CONTROL_SIZE + NAV_CONTROL_GAP);
        Rect::new(
            NAV_CONTROL_POS,
            NAV_CONTROL_POS + NAV_CONTROL_SIZE,
            y,
            y + NAV_CONTROL_SIZE,
        )
    }

    pub fn at(screen: Point) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|control| control.rect().contains(screen))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Ignored,
    SelectionChanged,
    /// The clicked node carries an `href`.
    Link(String),
}

/// Drag-scroll state. Offsets are cumulative since the drag started.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputController {
    scrolling: bool,
    moved: bool,
    last_offset: (f64, f64),
}

impl InputController {
    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }
}

impl Network {
    pub fn is_scrolling(&self) -> bool {
        self.input.is_scrolling()
    }

    pub fn drag_start(&mut self) {
        self.input = InputController {
            scrolling: true,
            moved: false,
            last_offset: (0.0, 0.0),
        };
    }

    /// Moves the content live; nothing is fetched until the drag ends.
    pub fn drag_move(&mut self, dx: f64, dy: f64) {
        if !self.input.scrolling {
            return;
        }
        if dx != 0.0 || dy != 0.0 {
            self.input.moved = true;
        }
        let (last_x, last_y) = self.input.last_offset;
        self.input.last_offset = (dx, dy);
        self.viewport.scroll_by(dx - last_x, dy - last_y);
        self.store.relayout(&self.viewport);
    }

    pub fn drag_end(&mut self) {
        self.input.scrolling = false;
        if self.input.moved {
            self.navigate();
        }
    }

    /// Wheel zoom by a factor of two per notch direction, focused on the pointer.
    pub fn wheel(&mut self, delta: f64, pointer: Point) -> Result<bool, NetworkError> {
        if !self.options.mouse_wheel_zoom || delta == 0.0 {
            return Ok(false);
        }
        let factor = if delta > 0.0 { 2.0 } else { 0.5 };
        self.do_zoom(factor, pointer)
    }

    pub fn key(&mut self, key: Key) -> Result<(), NetworkError> {
        let center = self.viewport.screen_center();
        let third_w = f64::from(self.viewport.screen_width) / 3.0;
        let third_h = f64::from(self.viewport.screen_height) / 3.0;
        match key {
            Key::ZoomIn => {
                self.do_zoom(2.0, center)?;
            }
            Key::ZoomOut => {
                self.do_zoom(0.5, center)?;
            }
            Key::Up => self.scroll_by(0.0, third_h),
            Key::Down => self.scroll_by(0.0, -third_h),
            Key::Left => self.scroll_by(third_w, 0.0),
            Key::Right => self.scroll_by(-third_w, 0.0),
            Key::Reset => self.reset_view(),
        }
        Ok(())
    }

    pub fn nav_control(&mut self, control: NavControl) -> Result<(), NetworkError> {
        match control {
            NavControl::ZoomIn => self.key(Key::ZoomIn),
            NavControl::Reset => self.key(Key::Reset),
            NavControl::ZoomOut => self.key(Key::ZoomOut),
        }
    }

    /// Plain click selects just this node, `toggle` (shift) adds or removes it.
    pub fn click_node(&mut self, id: &str, toggle: bool) -> ClickOutcome {
        let Some(node) = self.store.node(id) else {
            return ClickOutcome::Ignored;
        };
        if let Some(href) = &node.current_properties().href {
            debug!(node = id, href, "link activated");
            return ClickOutcome::Link(href.clone());
        }
        if !self.options.nodes_selectable {
            return ClickOutcome::Ignored;
        }

        if toggle {
            self.selection.nodes.toggle(id);
        } else {
            self.selection.nodes.replace([id]);
        }
        self.refresh_selection();
        ClickOutcome::SelectionChanged
    }

    pub fn click_edge(&mut self, id: &str, toggle: bool) -> ClickOutcome {
        if !self.options.edges_selectable || self.store.edge(id).is_none() {
            return ClickOutcome::Ignored;
        }

        if toggle {
            self.selection.edges.toggle(id);
        } else {
            self.selection.edges.replace([id]);
        }
        self.refresh_selection();
        ClickOutcome::SelectionChanged
    }

    /// Clears both selections unless the click ended a drag.
    pub fn click_background(&mut self) -> ClickOutcome {
        let moved = std::mem::take(&mut self.input.moved);
        let selectable = self.options.nodes_selectable || self.options.edges_selectable;
        let anything_selected = !self.selection.nodes.is_empty() || !self.selection.edges.is_empty();
        if moved || !selectable || !anything_selected {
            return ClickOutcome::Ignored;
        }

        self.selection.nodes.clear();
        self.selection.edges.clear();
        self.refresh_selection();
        ClickOutcome::SelectionChanged
    }

    pub fn hover_enter(&mut self, id: &str) {
        if !self.options.highlight_hover || self.input.scrolling {
            return;
        }
        let options = self.options.hover();
        self.store.hover_enter(id, options, &self.viewport);
    }

    pub fn hover_leave(&mut self) {
        self.store.hover_leave(&self.viewport);
    }
}
