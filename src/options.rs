use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::geometry::Point;
use crate::store::HoverOptions;
use crate::viewport::Viewport;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkOptions {
    pub center: Option<[f64; 2]>,
    pub zoom: f64,
    /// Falls back to `zoom`.
    pub default_zoom: Option<f64>,
    /// Fall back to the screen size.
    pub total_width: Option<f64>,
    pub total_height: Option<f64>,
    pub max_node_selection: Option<usize>,
    pub nodes_selectable: bool,
    pub max_edge_selection: Option<usize>,
    pub edges_selectable: bool,
    pub highlight_hover: bool,
    pub highlight_neighbors: bool,
    pub highlight_cluster: bool,
    pub show_navigation_controls: bool,
    pub mouse_wheel_zoom: bool,
    pub control_color: String,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            center: None,
            zoom: 1.0,
            default_zoom: None,
            total_width: None,
            total_height: None,
            max_node_selection: None,
            nodes_selectable: false,
            max_edge_selection: None,
            edges_selectable: false,
            highlight_hover: false,
            highlight_neighbors: false,
            highlight_cluster: false,
            show_navigation_controls: false,
            mouse_wheel_zoom: false,
            control_color: "black".to_owned(),
        }
    }
}

impl NetworkOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Rejects zooms and logical extents that would make the screen transform degenerate.
    pub fn validate(&self) -> Result<(), NetworkError> {
        for zoom in [Some(self.zoom), self.default_zoom].into_iter().flatten() {
            if !zoom.is_finite() || zoom <= 0.0 {
                return Err(NetworkError::InvalidZoom(zoom));
            }
        }
        for (axis, extent) in [("width", self.total_width), ("height", self.total_height)] {
            if let Some(value) = extent
                && (!value.is_finite() || value <= 0.0)
            {
                return Err(NetworkError::InvalidExtent { axis, value });
            }
        }
        Ok(())
    }

    pub fn viewport(&self, screen_width: u32, screen_height: u32) -> Viewport {
        let mut viewport = Viewport::new(screen_width, screen_height);
        if let Some([x, y]) = self.center {
            viewport.center = Point::new(x, y);
        }
        viewport.zoom = self.zoom;
        viewport.default_zoom = self.default_zoom.unwrap_or(self.zoom);
        if let Some(total_width) = self.total_width {
            viewport.total_width = total_width;
        }
        if let Some(total_height) = self.total_height {
            viewport.total_height = total_height;
        }
        viewport
    }

    pub fn hover(&self) -> HoverOptions {
        HoverOptions {
            neighbors: self.highlight_neighbors,
            cluster: self.highlight_cluster,
        }
    }
}
