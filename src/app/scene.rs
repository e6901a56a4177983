use std::collections::{HashMap, HashSet};

use eframe::egui::{Align2, Color32, CursorIcon, FontId, Painter, Pos2, Rect, Stroke};
use netview::{AttrChange, CaptionAttr, CaptionUpdate, EntityKind, Point, RenderOp};

use super::render_utils::{
    circle_visible, distance_to_segment, draw_arrow_head, edge_visible, parse_color,
};

const EDGE_HIT_TOLERANCE: f32 = 4.0;

#[derive(Clone, Debug, Default)]
struct Style {
    radius: f64,
    fill: Option<String>,
    fill_opacity: f64,
    stroke: Option<String>,
    stroke_width: f64,
    stroke_opacity: f64,
    arrow_start: bool,
    arrow_end: bool,
    cursor: Option<String>,
}

impl Style {
    fn new() -> Self {
        Self {
            fill_opacity: 1.0,
            stroke_width: 1.0,
            stroke_opacity: 1.0,
            ..Self::default()
        }
    }

    fn apply(&mut self, change: AttrChange) {
        match change {
            AttrChange::Radius(r) => self.radius = r,
            AttrChange::Fill(fill) => self.fill = Some(fill),
            AttrChange::FillOpacity(opacity) => self.fill_opacity = opacity,
            AttrChange::Stroke(stroke) => self.stroke = Some(stroke),
            AttrChange::StrokeWidth(width) => self.stroke_width = width,
            AttrChange::StrokeOpacity(opacity) => self.stroke_opacity = opacity,
            AttrChange::ArrowStart(marker) => self.arrow_start = marker.is_some(),
            AttrChange::ArrowEnd(marker) => self.arrow_end = marker.is_some(),
            AttrChange::Cursor(cursor) => self.cursor = Some(cursor),
            AttrChange::Href(_) => {}
        }
    }

    fn fill_color(&self) -> Option<Color32> {
        parse_color(self.fill.as_deref()?, self.fill_opacity)
    }

    fn stroke(&self) -> Option<Stroke> {
        let color = parse_color(self.stroke.as_deref()?, self.stroke_opacity)?;
        (self.stroke_width > 0.0).then(|| Stroke::new(self.stroke_width as f32, color))
    }
}

#[derive(Clone, Debug)]
struct NodeShape {
    position: Pos2,
    style: Style,
}

#[derive(Clone, Debug)]
struct EdgeShape {
    segment: Option<(Pos2, Pos2)>,
    style: Style,
}

#[derive(Clone, Debug)]
struct CaptionShape {
    text: String,
    position: Option<Pos2>,
    font_color: Color32,
    font_size: f32,
    opacity: f64,
}

impl CaptionShape {
    fn apply(&mut self, attr: CaptionAttr) {
        match attr {
            CaptionAttr::FontColor(color) => {
                if let Some(color) = parse_color(&color, 1.0) {
                    self.font_color = color;
                }
            }
            CaptionAttr::FontSize(size) => self.font_size = size as f32,
            CaptionAttr::FillOpacity(opacity) => self.opacity = opacity,
            CaptionAttr::Href(_) | CaptionAttr::Cursor(_) => {}
        }
    }
}

/// Retained scene graph of the egui backend. Positions are relative to the canvas origin.
#[derive(Default)]
pub(super) struct Scene {
    nodes: HashMap<String, NodeShape>,
    edges: HashMap<String, EdgeShape>,
    captions: HashMap<(EntityKind, String), CaptionShape>,
    draw_order: Vec<String>,
}

fn local(point: Point) -> Pos2 {
    Pos2::new(point.x as f32, point.y as f32)
}

impl Scene {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn apply(&mut self, ops: Vec<RenderOp>) {
        let mut nodes_removed = false;
        for op in ops {
            match op {
                RenderOp::Create { kind: EntityKind::Node, id } => {
                    self.draw_order.push(id.clone());
                    self.nodes.insert(
                        id,
                        NodeShape {
                            position: Pos2::ZERO,
                            style: Style::new(),
                        },
                    );
                }
                RenderOp::Create { kind: EntityKind::Edge, id } => {
                    self.edges.insert(
                        id,
                        EdgeShape {
                            segment: None,
                            style: Style::new(),
                        },
                    );
                }
                RenderOp::Remove { kind, id } => {
                    match kind {
                        EntityKind::Node => {
                            nodes_removed |= self.nodes.remove(&id).is_some();
                        }
                        EntityKind::Edge => {
                            self.edges.remove(&id);
                        }
                    }
                    self.captions.remove(&(kind, id));
                }
                RenderOp::Place { id, position } => {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.position = local(position);
                    }
                }
                RenderOp::Path { id, start, end } => {
                    if let Some(edge) = self.edges.get_mut(&id) {
                        edge.segment = Some((local(start), local(end)));
                    }
                }
                RenderOp::Attrs { kind, id, changes } => {
                    let style = match kind {
                        EntityKind::Node => self.nodes.get_mut(&id).map(|node| &mut node.style),
                        EntityKind::Edge => self.edges.get_mut(&id).map(|edge| &mut edge.style),
                    };
                    if let Some(style) = style {
                        for change in changes {
                            style.apply(change);
                        }
                    }
                }
                RenderOp::Caption { kind, id, update } => match update {
                    CaptionUpdate::Set { text, attrs } => {
                        let mut caption = CaptionShape {
                            text,
                            position: None,
                            font_color: Color32::BLACK,
                            font_size: 12.0,
                            opacity: 1.0,
                        };
                        for attr in attrs {
                            caption.apply(attr);
                        }
                        self.captions.insert((kind, id), caption);
                    }
                    CaptionUpdate::Attrs(attrs) => {
                        if let Some(caption) = self.captions.get_mut(&(kind, id)) {
                            for attr in attrs {
                                caption.apply(attr);
                            }
                        }
                    }
                    CaptionUpdate::Removed => {
                        self.captions.remove(&(kind, id));
                    }
                },
                RenderOp::CaptionPlace { kind, id, position } => {
                    if let Some(caption) = self.captions.get_mut(&(kind, id)) {
                        caption.position = Some(local(position));
                    }
                }
            }
        }

        if nodes_removed {
            self.prune_draw_order();
        }
    }

    /// Drops removed nodes from the draw order in one pass. A node removed and created again
    /// within the same batch keeps its first slot.
    fn prune_draw_order(&mut self) {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        let nodes = &self.nodes;
        self.draw_order
            .retain(|id| nodes.contains_key(id) && seen.insert(id.clone()));
    }

    /// Topmost node whose circle contains `pointer` (canvas-relative).
    pub fn node_at(&self, pointer: Pos2) -> Option<&str> {
        self.draw_order.iter().rev().find_map(|id| {
            let node = self.nodes.get(id)?;
            (node.position.distance(pointer) <= node.style.radius.max(3.0) as f32)
                .then_some(id.as_str())
        })
    }

    pub fn edge_at(&self, pointer: Pos2) -> Option<&str> {
        self.edges
            .iter()
            .filter_map(|(id, edge)| {
                let (start, end) = edge.segment?;
                let distance = distance_to_segment(pointer, start, end);
                let reach = EDGE_HIT_TOLERANCE + edge.style.stroke_width as f32;
                (distance <= reach).then_some((id.as_str(), distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub fn cursor_for_node(&self, id: &str) -> CursorIcon {
        match self.nodes.get(id).and_then(|node| node.style.cursor.as_deref()) {
            Some("pointer") => CursorIcon::PointingHand,
            Some("move") => CursorIcon::Move,
            Some("crosshair") => CursorIcon::Crosshair,
            _ => CursorIcon::Default,
        }
    }

    pub fn paint(&self, painter: &Painter, canvas: Rect) {
        let offset = canvas.min.to_vec2();

        for edge in self.edges.values() {
            let Some((start, end)) = edge.segment else {
                continue;
            };
            let (start, end) = (start + offset, end + offset);
            if !edge_visible(canvas, start, end, 4.0) {
                continue;
            }
            let Some(stroke) = edge.style.stroke() else {
                continue;
            };
            painter.line_segment([start, end], stroke);
            if edge.style.arrow_end {
                draw_arrow_head(painter, end, end - start, stroke.width, stroke.color);
            }
            if edge.style.arrow_start {
                draw_arrow_head(painter, start, start - end, stroke.width, stroke.color);
            }
        }

        for id in &self.draw_order {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let position = node.position + offset;
            let radius = node.style.radius as f32;
            if !circle_visible(canvas, position, radius) {
                continue;
            }
            if let Some(fill) = node.style.fill_color() {
                painter.circle_filled(position, radius, fill);
            }
            if let Some(stroke) = node.style.stroke() {
                painter.circle_stroke(position, radius, stroke);
            }
        }

        for caption in self.captions.values() {
            let Some(position) = caption.position else {
                continue;
            };
            let alpha = (caption.opacity.clamp(0.0, 1.0) * 255.0) as u8;
            let [r, g, b, _] = caption.font_color.to_array();
            painter.text(
                position + offset,
                Align2::CENTER_CENTER,
                &caption.text,
                FontId::proportional(caption.font_size),
                Color32::from_rgba_unmultiplied(r, g, b, alpha),
            );
        }
    }
}
