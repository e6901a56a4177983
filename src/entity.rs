use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::NetworkError;
use crate::geometry::Point;
use crate::highlight::{HighlightState, Highlightable};
use crate::properties::{Properties, PropertySet, PropertySource};
use crate::render::EntityKind;
use crate::viewport::Viewport;

pub type NodeMap = HashMap<String, Node>;
pub type EdgeMap = HashMap<String, Edge>;

const ARROW: &str = "classic-wide-long";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Undirected,
    Bidirectional,
    Backward,
    Forward,
}

impl Direction {
    pub fn symbol(self) -> char {
        match self {
            Self::Undirected => '-',
            Self::Bidirectional => '=',
            Self::Backward => '<',
            Self::Forward => '>',
        }
    }

    pub fn is_directed(self) -> bool {
        matches!(self, Self::Backward | Self::Forward)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Direction {
    type Err = NetworkError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "-" => Ok(Self::Undirected),
            "=" => Ok(Self::Bidirectional),
            "<" => Ok(Self::Backward),
            ">" => Ok(Self::Forward),
            other => Err(NetworkError::InvalidDirection(other.to_owned())),
        }
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Canonical edge id: undirected pairs are order-independent, and a backward edge is the
/// same as the forward edge with swapped endpoints.
pub fn edge_id(from: &str, to: &str, direction: Direction) -> String {
    match direction {
        Direction::Undirected | Direction::Bidirectional => {
            let (a, b) = if from <= to { (from, to) } else { (to, from) };
            format!("edge-{a}-{b}-u")
        }
        Direction::Forward => format!("edge-{from}-{to}-d"),
        Direction::Backward => format!("edge-{to}-{from}-d"),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub pos: Point,
    pub edges: BTreeSet<String>,
    properties: Properties,
    state: HighlightState,
}

impl Node {
    pub fn new(id: impl Into<String>, pos: Point, source: &PropertySource) -> Self {
        let defaults = Self::defaults();
        Self {
            id: id.into(),
            pos,
            edges: BTreeSet::new(),
            properties: Properties::resolve(source, &defaults),
            state: HighlightState::default(),
        }
    }

    fn defaults() -> PropertySet {
        PropertySet {
            r: Some(5.0),
            fill: Some("#333".to_owned()),
            stroke: Some("none".to_owned()),
            font_color: Some("black".to_owned()),
            font_size: Some(12.0),
            cursor: Some("pointer".to_owned()),
            ..PropertySet::default()
        }
    }

    pub fn cluster(&self) -> Option<&serde_json::Value> {
        self.properties.normal.cluster.as_ref()
    }

    pub fn screen_pos(&self, viewport: &Viewport) -> Point {
        viewport.log_to_screen(self.pos)
    }
}

impl Highlightable for Node {
    const KIND: EntityKind = EntityKind::Node;

    fn id(&self) -> &str {
        &self.id
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    fn highlight_state(&self) -> &HighlightState {
        &self.state
    }

    fn highlight_state_mut(&mut self) -> &mut HighlightState {
        &mut self.state
    }

    fn default_properties(&self) -> PropertySet {
        Self::defaults()
    }

    fn caption_position(&self, viewport: &Viewport, _nodes: &NodeMap) -> Option<Point> {
        let pos = self.screen_pos(viewport);
        let normal = &self.properties.normal;
        let offset = normal.radius() + normal.font_size.unwrap_or(0.0) / 2.0 - 1.0;
        Some(Point::new(pos.x, pos.y - offset))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub direction: Direction,
    properties: Properties,
    state: HighlightState,
}

impl Edge {
    pub fn new(from: &str, to: &str, direction: Direction, source: &PropertySource) -> Self {
        let defaults = Self::defaults(direction);
        Self {
            id: edge_id(from, to, direction),
            from: from.to_owned(),
            to: to.to_owned(),
            direction,
            properties: Properties::resolve(source, &defaults),
            state: HighlightState::default(),
        }
    }

    fn defaults(direction: Direction) -> PropertySet {
        let mut defaults = PropertySet {
            fill: Some("none".to_owned()),
            stroke: Some("#666".to_owned()),
            stroke_width: Some(1.0),
            stroke_opacity: Some(0.5),
            font_color: Some("black".to_owned()),
            font_size: Some(12.0),
            cursor: Some("default".to_owned()),
            ..PropertySet::default()
        };
        if matches!(direction, Direction::Backward | Direction::Bidirectional) {
            defaults.arrow_start = Some(ARROW.to_owned());
        }
        if matches!(direction, Direction::Forward | Direction::Bidirectional) {
            defaults.arrow_end = Some(ARROW.to_owned());
        }
        defaults
    }

    /// The endpoint opposite to `node_id`.
    pub fn adjacent(&self, node_id: &str) -> &str {
        if self.from == node_id {
            &self.to
        } else {
            &self.from
        }
    }

    /// Screen-space segment between the endpoint circles, or `None` if an endpoint is gone.
    pub fn path(&self, viewport: &Viewport, nodes: &NodeMap) -> Option<(Point, Point)> {
        let from = nodes.get(&self.from)?;
        let to = nodes.get(&self.to)?;
        let start = from.screen_pos(viewport);
        let end = to.screen_pos(viewport);
        let direction = (end - start).norm();
        Some((
            start + direction * from.rendered_radius(),
            end - direction * to.rendered_radius(),
        ))
    }
}

impl Highlightable for Edge {
    const KIND: EntityKind = EntityKind::Edge;

    fn id(&self) -> &str {
        &self.id
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    fn highlight_state(&self) -> &HighlightState {
        &self.state
    }

    fn highlight_state_mut(&mut self) -> &mut HighlightState {
        &mut self.state
    }

    fn default_properties(&self) -> PropertySet {
        Self::defaults(self.direction)
    }

    fn caption_position(&self, viewport: &Viewport, nodes: &NodeMap) -> Option<Point> {
        let from = nodes.get(&self.from)?.screen_pos(viewport);
        let to = nodes.get(&self.to)?.screen_pos(viewport);
        Some(from.midpoint(to))
    }
}
