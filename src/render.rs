//! Rendering contract between the engine and a graphics backend.
//!
//! The engine never draws. It queues [`RenderOp`]s describing what changed and the backend
//! drains them with [`crate::Network::drain_render_ops`], applying each op in order.

use crate::geometry::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Node,
    Edge,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttrChange {
    Radius(f64),
    Fill(String),
    FillOpacity(f64),
    Stroke(String),
    StrokeWidth(f64),
    StrokeOpacity(f64),
    ArrowStart(Option<String>),
    ArrowEnd(Option<String>),
    Cursor(String),
    Href(Option<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CaptionAttr {
    FontColor(String),
    FontSize(f64),
    FillOpacity(f64),
    Href(Option<String>),
    Cursor(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CaptionUpdate {
    /// Replaces any existing caption.
    Set { text: String, attrs: Vec<CaptionAttr> },
    Attrs(Vec<CaptionAttr>),
    Removed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderOp {
    Create {
        kind: EntityKind,
        id: String,
    },
    Remove {
        kind: EntityKind,
        id: String,
    },
    /// Node center in screen space.
    Place {
        id: String,
        position: Point,
    },
    /// Edge segment in screen space, already trimmed by the endpoint radii.
    Path {
        id: String,
        start: Point,
        end: Point,
    },
    Attrs {
        kind: EntityKind,
        id: String,
        changes: Vec<AttrChange>,
    },
    Caption {
        kind: EntityKind,
        id: String,
        update: CaptionUpdate,
    },
    /// Caption anchor in screen space.
    CaptionPlace {
        kind: EntityKind,
        id: String,
        position: Point,
    },
}

impl RenderOp {
    pub fn id(&self) -> &str {
        match self {
            Self::Create { id, .. }
            | Self::Remove { id, .. }
            | Self::Place { id, .. }
            | Self::Path { id, .. }
            | Self::Attrs { id, .. }
            | Self::Caption { id, .. }
            | Self::CaptionPlace { id, .. } => id,
        }
    }
}
