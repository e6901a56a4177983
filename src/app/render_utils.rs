use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2, pos2, vec2};
use netview::Point;

/// Parses `none`, `#rgb`, `#rrggbb` and a handful of named colours. `None` means "do not paint".
pub(super) fn parse_color(color: &str, opacity: f64) -> Option<Color32> {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    let color = color.trim();
    let (r, g, b) = if let Some(hex) = color.strip_prefix('#') {
        let digit = |index: usize| u8::from_str_radix(hex.get(index..=index)?, 16).ok();
        match hex.len() {
            3 => (digit(0)? * 17, digit(1)? * 17, digit(2)? * 17),
            6 => (
                u8::from_str_radix(hex.get(0..2)?, 16).ok()?,
                u8::from_str_radix(hex.get(2..4)?, 16).ok()?,
                u8::from_str_radix(hex.get(4..6)?, 16).ok()?,
            ),
            _ => return None,
        }
    } else {
        match color.to_ascii_lowercase().as_str() {
            "black" => (0, 0, 0),
            "white" => (255, 255, 255),
            "gray" | "grey" => (128, 128, 128),
            "red" => (255, 0, 0),
            "green" => (0, 128, 0),
            "blue" => (0, 0, 255),
            "orange" => (255, 165, 0),
            "gold" => (255, 215, 0),
            "yellow" => (255, 255, 0),
            "purple" => (128, 0, 128),
            _ => return None,
        }
    };
    Some(Color32::from_rgba_unmultiplied(r, g, b, alpha))
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, origin: Pos2, step: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(250, 250, 248));

    let step = step.max(20.0);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(200, 205, 210, 90));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let top_left = rect.left_top();
    let top_right = rect.right_top();
    let bottom_left = rect.left_bottom();
    let bottom_right = rect.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

pub(super) fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

/// Filled arrow head with its tip at `tip`, pointing along `direction`.
pub(super) fn draw_arrow_head(
    painter: &Painter,
    tip: Pos2,
    direction: Vec2,
    width: f32,
    color: Color32,
) {
    let direction = direction.normalized();
    if !direction.is_finite() {
        return;
    }
    let length = 6.0 + width * 3.0;
    let half = 2.5 + width * 1.5;
    let base = tip - direction * length;
    let normal = vec2(-direction.y, direction.x) * half;
    painter.add(Shape::convex_polygon(
        vec![tip, base + normal, base - normal],
        color,
        Stroke::NONE,
    ));
}

/// Engine screen coordinates are relative to the canvas' top-left corner.
pub(super) fn to_pos2(canvas: Rect, point: Point) -> Pos2 {
    pos2(canvas.left() + point.x as f32, canvas.top() + point.y as f32)
}

pub(super) fn to_point(canvas: Rect, pos: Pos2) -> Point {
    Point::new(f64::from(pos.x - canvas.left()), f64::from(pos.y - canvas.top()))
}
