//! View synchronization engine for large, lazily fetched graphs.
//!
//! A [`Network`] owns a pannable, zoomable [`Viewport`], the live [`Node`]s and [`Edge`]s on
//! screen and the node/edge selection. Every view change issues a versioned [`ViewRequest`]
//! through the registered [`ViewObserver`]s; their results are reconciled into the live set in
//! version order, and the resulting changes come out as [`RenderOp`]s for a graphics backend.

pub mod entity;
pub mod error;
pub mod geometry;
pub mod highlight;
pub mod input;
pub mod network;
pub mod options;
pub mod properties;
pub mod reconcile;
pub mod render;
pub mod selection;
pub mod signals;
pub mod store;
pub mod sync;
pub mod viewport;

pub use entity::{Direction, Edge, Node, edge_id};
pub use error::NetworkError;
pub use geometry::{Point, Rect};
pub use highlight::{HighlightFlags, Highlightable};
pub use input::{ClickOutcome, Key, NavControl};
pub use network::Network;
pub use options::NetworkOptions;
pub use properties::{PropertySet, PropertySource};
pub use reconcile::ReconcileReport;
pub use render::{AttrChange, CaptionAttr, CaptionUpdate, EntityKind, RenderOp};
pub use signals::{
    EdgeRecord, NavigationEvent, NodeRecord, Proceed, ViewObserver, ViewRequest, ViewResult,
};
pub use viewport::Viewport;
