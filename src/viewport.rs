use crate::error::NetworkError;
use crate::geometry::{Point, Rect};

#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    pub center: Point,
    pub zoom: f64,
    pub default_zoom: f64,
    pub screen_width: u32,
    pub screen_height: u32,
    pub total_width: f64,
    pub total_height: f64,
}

impl Viewport {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            center: Point::ZERO,
            zoom: 1.0,
            default_zoom: 1.0,
            screen_width,
            screen_height,
            total_width: f64::from(screen_width),
            total_height: f64::from(screen_height),
        }
    }

    fn width(&self) -> f64 {
        f64::from(self.screen_width)
    }

    fn height(&self) -> f64 {
        f64::from(self.screen_height)
    }

    pub fn screen_center(&self) -> Point {
        Point::new(self.width() / 2.0, self.height() / 2.0)
    }

    pub fn screen_to_log(&self, screen: Point) -> Point {
        Point::new(
            (2.0 * screen.x - self.width()) / (self.total_width * self.zoom) + self.center.x,
            (2.0 * screen.y - self.height()) / (self.total_height * self.zoom) + self.center.y,
        )
    }

    pub fn log_to_screen(&self, logical: Point) -> Point {
        Point::new(
            self.width() / 2.0 + (logical.x - self.center.x) * (self.total_width * self.zoom) / 2.0,
            self.height() / 2.0
                + (logical.y - self.center.y) * (self.total_height * self.zoom) / 2.0,
        )
    }

    /// Logical rectangle covered by the whole screen.
    pub fn visible_rect(&self) -> Rect {
        let min = self.screen_to_log(Point::ZERO);
        let max = self.screen_to_log(Point::new(self.width(), self.height()));
        Rect::new(min.x, max.x, min.y, max.y)
    }

    /// Multiplies the zoom by `factor`, keeping the logical point under `focus` in place.
    pub fn set_zoom_at_focus(&mut self, factor: f64, focus: Point) -> Result<(), NetworkError> {
        let zoom = self.zoom * factor;
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(NetworkError::InvalidZoom(zoom));
        }

        let old_focus = self.screen_to_log(focus);
        self.zoom = zoom;
        let new_focus = self.screen_to_log(focus);
        self.center = self.center - new_focus + old_focus;
        Ok(())
    }

    /// Centers on the bounding box of `points` and zooms out (never in) to a power of two
    /// that fits it. Returns `false` when there is nothing to fit.
    pub fn fit_to_points(&mut self, points: &[Point]) -> bool {
        let Some(bounds) = Rect::bounding(points) else {
            return false;
        };

        self.center = bounds.center();
        if bounds.width() > 0.0 || bounds.height() > 0.0 {
            let fit_exponent = fit_log2(self.total_width, bounds.width())
                .min(fit_log2(self.total_height, bounds.height()));
            let max_zoom = 2f64.powf(fit_exponent.floor());
            if self.zoom > max_zoom {
                self.zoom = max_zoom;
            }
        }
        true
    }

    /// Pans by a screen-space delta: content moves by `(dx, dy)` pixels.
    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        let screen_center = self.screen_center();
        self.center = self.screen_to_log(Point::new(screen_center.x - dx, screen_center.y - dy));
    }

    pub fn scroll_to(&mut self, center: Point) {
        self.center = center;
    }

    pub fn reset(&mut self) {
        self.zoom = self.default_zoom;
        self.center = Point::ZERO;
    }

    pub fn resize(&mut self, screen_width: u32, screen_height: u32) {
        self.screen_width = screen_width;
        self.screen_height = screen_height;
    }

    /// Whether a screen position lies within `margin` (fraction of the extent) of an edge.
    pub fn near_screen_edge(&self, screen: Point, margin: f64) -> bool {
        screen.x < self.width() * margin
            || screen.x > self.width() * (1.0 - margin)
            || screen.y < self.height() * margin
            || screen.y > self.height() * (1.0 - margin)
    }
}

fn fit_log2(total: f64, extent: f64) -> f64 {
    if extent > 0.0 {
        (total / extent).log2()
    } else {
        f64::INFINITY
    }
}
