use std::collections::BTreeSet;
use std::mem;

use tracing::debug;

use crate::entity::{Direction, Edge, EdgeMap, Node, NodeMap};
use crate::geometry::Point;
use crate::highlight::Highlightable;
use crate::properties::{PropertyDiff, PropertySource};
use crate::render::{AttrChange, CaptionUpdate, EntityKind, RenderOp};
use crate::viewport::Viewport;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HoverOptions {
    pub neighbors: bool,
    pub cluster: bool,
}

/// Everything a hover touched, so leaving can undo exactly that.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct HoverTrail {
    node: String,
    nodes: BTreeSet<String>,
    edges: BTreeSet<String>,
}

/// Owns all live nodes and edges. Edges refer to nodes by id only.
#[derive(Debug, Default)]
pub struct EntityStore {
    nodes: NodeMap,
    edges: EdgeMap,
    ops: Vec<RenderOp>,
    hover: Option<HoverTrail>,
}

fn emit_diff<T: Highlightable>(
    ops: &mut Vec<RenderOp>,
    entity: &T,
    diff: PropertyDiff,
    caption_position: Option<Point>,
) {
    let kind = T::KIND;
    let id = entity.id();
    if !diff.attrs.is_empty() {
        ops.push(RenderOp::Attrs {
            kind,
            id: id.to_owned(),
            changes: diff.attrs,
        });
    }

    if let Some(update) = diff.caption {
        let created = matches!(update, CaptionUpdate::Set { .. });
        ops.push(RenderOp::Caption {
            kind,
            id: id.to_owned(),
            update,
        });
        if created && let Some(position) = caption_position {
            ops.push(RenderOp::CaptionPlace {
                kind,
                id: id.to_owned(),
                position,
            });
        }
    }
}

fn emit_path(ops: &mut Vec<RenderOp>, edge: &Edge, viewport: &Viewport, nodes: &NodeMap) {
    if let Some((start, end)) = edge.path(viewport, nodes) {
        ops.push(RenderOp::Path {
            id: edge.id.clone(),
            start,
            end,
        });
    }
    if edge.highlight_state().rendered.as_ref().is_some_and(|set| set.caption.is_some())
        && let Some(position) = edge.caption_position(viewport, nodes)
    {
        ops.push(RenderOp::CaptionPlace {
            kind: EntityKind::Edge,
            id: edge.id.clone(),
            position,
        });
    }
}

fn emit_place(ops: &mut Vec<RenderOp>, node: &Node, viewport: &Viewport, nodes: &NodeMap) {
    ops.push(RenderOp::Place {
        id: node.id.clone(),
        position: node.screen_pos(viewport),
    });
    if node.highlight_state().rendered.as_ref().is_some_and(|set| set.caption.is_some())
        && let Some(position) = node.caption_position(viewport, nodes)
    {
        ops.push(RenderOp::CaptionPlace {
            kind: EntityKind::Node,
            id: node.id.clone(),
            position,
        });
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    pub fn edges(&self) -> &EdgeMap {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hover.as_ref().map(|trail| trail.node.as_str())
    }

    pub fn drain_ops(&mut self) -> Vec<RenderOp> {
        mem::take(&mut self.ops)
    }

    pub fn insert_node(&mut self, mut node: Node, selected: bool, viewport: &Viewport) {
        node.highlight_state_mut().flags.selected = selected;
        let id = node.id.clone();
        let diff = node.refresh_properties();

        self.ops.push(RenderOp::Create {
            kind: EntityKind::Node,
            id: id.clone(),
        });
        self.nodes.insert(id.clone(), node);

        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let caption = node.caption_position(viewport, &self.nodes);
        emit_diff(&mut self.ops, node, diff, caption);
        emit_place(&mut self.ops, node, viewport, &self.nodes);
    }

    /// Reassigns properties and position in place. Returns `false` for unknown ids.
    pub fn update_node(
        &mut self,
        id: &str,
        pos: Point,
        source: &PropertySource,
        viewport: &Viewport,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        node.set_properties(source);
        let diff = node.refresh_properties();
        node.pos = pos;

        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        let caption = node.caption_position(viewport, &self.nodes);
        emit_diff(&mut self.ops, node, diff, caption);
        emit_place(&mut self.ops, node, viewport, &self.nodes);
        true
    }

    /// Removes a node and every edge incident to it.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        for edge_id in &node.edges {
            self.detach_edge(edge_id, Some(id));
        }
        self.ops.push(RenderOp::Remove {
            kind: EntityKind::Node,
            id: id.to_owned(),
        });
        debug!(node = id, edges = node.edges.len(), "removed node");
        Some(node)
    }

    /// Inserts an edge between two live nodes. Returns `false` if an endpoint is missing.
    pub fn insert_edge(&mut self, mut edge: Edge, selected: bool, viewport: &Viewport) -> bool {
        if !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to) {
            return false;
        }

        edge.highlight_state_mut().flags.selected = selected;
        let id = edge.id.clone();
        for endpoint in [&edge.from, &edge.to] {
            if let Some(node) = self.nodes.get_mut(endpoint) {
                node.edges.insert(id.clone());
            }
        }

        let diff = edge.refresh_properties();
        self.ops.push(RenderOp::Create {
            kind: EntityKind::Edge,
            id: id.clone(),
        });
        let caption = edge.caption_position(viewport, &self.nodes);
        emit_diff(&mut self.ops, &edge, diff, caption);
        emit_path(&mut self.ops, &edge, viewport, &self.nodes);
        self.edges.insert(id, edge);
        true
    }

    /// Reassigns orientation and properties in place. `from` and `to` must be the endpoints
    /// the id was derived from. Returns `false` for unknown ids.
    pub fn update_edge(
        &mut self,
        id: &str,
        (from, to, direction): (&str, &str, Direction),
        source: &PropertySource,
        viewport: &Viewport,
    ) -> bool {
        let Some(edge) = self.edges.get_mut(id) else {
            return false;
        };
        from.clone_into(&mut edge.from);
        to.clone_into(&mut edge.to);
        edge.direction = direction;
        edge.set_properties(source);
        let diff = edge.refresh_properties();

        let Some(edge) = self.edges.get(id) else {
            return false;
        };
        emit_path(&mut self.ops, edge, viewport, &self.nodes);
        let caption = edge.caption_position(viewport, &self.nodes);
        emit_diff(&mut self.ops, edge, diff, caption);
        true
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        self.detach_edge(id, None)
    }

    fn detach_edge(&mut self, id: &str, skip_node: Option<&str>) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        for endpoint in [&edge.from, &edge.to] {
            if Some(endpoint.as_str()) == skip_node {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(endpoint) {
                node.edges.remove(id);
            }
        }
        self.ops.push(RenderOp::Remove {
            kind: EntityKind::Edge,
            id: id.to_owned(),
        });
        Some(edge)
    }

    /// Applies a highlight transition to a node and queues the resulting render ops.
    pub fn transition_node(
        &mut self,
        id: &str,
        viewport: &Viewport,
        transition: impl FnOnce(&mut Node) -> PropertyDiff,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        let diff = transition(node);
        let radius_changed = diff
            .attrs
            .iter()
            .any(|change| matches!(change, AttrChange::Radius(_)));

        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        let caption = node.caption_position(viewport, &self.nodes);
        emit_diff(&mut self.ops, node, diff, caption);

        if radius_changed {
            for edge_id in &node.edges {
                if let Some(edge) = self.edges.get(edge_id) {
                    emit_path(&mut self.ops, edge, viewport, &self.nodes);
                }
            }
        }
        true
    }

    pub fn transition_edge(
        &mut self,
        id: &str,
        viewport: &Viewport,
        transition: impl FnOnce(&mut Edge) -> PropertyDiff,
    ) -> bool {
        let Some(edge) = self.edges.get_mut(id) else {
            return false;
        };
        let diff = transition(edge);

        let Some(edge) = self.edges.get(id) else {
            return false;
        };
        let caption = edge.caption_position(viewport, &self.nodes);
        emit_diff(&mut self.ops, edge, diff, caption);
        true
    }

    /// Re-emits screen geometry for every entity after the view moved.
    pub fn relayout(&mut self, viewport: &Viewport) {
        for node in self.nodes.values() {
            emit_place(&mut self.ops, node, viewport, &self.nodes);
        }
        for edge in self.edges.values() {
            emit_path(&mut self.ops, edge, viewport, &self.nodes);
        }
    }

    pub fn hover_enter(&mut self, id: &str, options: HoverOptions, viewport: &Viewport) {
        if self.hover.as_ref().is_some_and(|trail| trail.node == id) {
            return;
        }
        self.hover_leave(viewport);

        let Some(node) = self.nodes.get(id) else {
            return;
        };

        let mut trail = HoverTrail {
            node: id.to_owned(),
            ..HoverTrail::default()
        };
        if options.neighbors {
            for edge_id in &node.edges {
                if let Some(edge) = self.edges.get(edge_id) {
                    trail.edges.insert(edge_id.clone());
                    trail.nodes.insert(edge.adjacent(id).to_owned());
                }
            }
        }
        if options.cluster
            && let Some(cluster) = node.cluster()
        {
            trail.nodes.extend(
                self.nodes
                    .values()
                    .filter(|other| other.id != id && other.cluster() == Some(cluster))
                    .map(|other| other.id.clone()),
            );
        }

        self.transition_node(id, viewport, Node::highlight);
        for edge_id in &trail.edges {
            self.transition_edge(edge_id, viewport, Edge::secondary_highlight);
        }
        for node_id in &trail.nodes {
            self.transition_node(node_id, viewport, Node::secondary_highlight);
        }
        debug!(
            node = id,
            nodes = trail.nodes.len(),
            edges = trail.edges.len(),
            "hover enter"
        );
        self.hover = Some(trail);
    }

    pub fn hover_leave(&mut self, viewport: &Viewport) {
        let Some(trail) = self.hover.take() else {
            return;
        };

        self.transition_node(&trail.node, viewport, Node::reset_highlight);
        for node_id in &trail.nodes {
            self.transition_node(node_id, viewport, Node::reset_highlight);
        }
        for edge_id in &trail.edges {
            self.transition_edge(edge_id, viewport, Edge::reset_highlight);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::properties::PropertySet;

    fn node(id: &str, x: f64, y: f64) -> Node {
        Node::new(id, Point::new(x, y), &PropertySource::default())
    }

    fn clustered(id: &str, cluster: i64) -> Node {
        Node::new(
            id,
            Point::ZERO,
            &PropertySource::normal(PropertySet {
                cluster: Some(json!(cluster)),
                ..PropertySet::default()
            }),
        )
    }

    fn store_with_triangle(viewport: &Viewport) -> EntityStore {
        let mut store = EntityStore::new();
        for (id, x) in [("a", 0.0), ("b", 0.1), ("c", 0.2)] {
            store.insert_node(node(id, x, 0.0), false, viewport);
        }
        let source = PropertySource::default();
        store.insert_edge(Edge::new("a", "b", Direction::Undirected, &source), false, viewport);
        store.insert_edge(Edge::new("b", "c", Direction::Forward, &source), false, viewport);
        store
    }

    #[test]
    fn removing_a_node_cascades_to_edges() {
        let viewport = Viewport::new(800, 600);
        let mut store = store_with_triangle(&viewport);
        store.drain_ops();

        store.remove_node("b");

        assert!(store.edges().is_empty());
        assert!(store.node("a").unwrap().edges.is_empty());
        assert!(store.node("c").unwrap().edges.is_empty());
        let removed = store
            .drain_ops()
            .into_iter()
            .filter(|op| matches!(op, RenderOp::Remove { .. }))
            .count();
        assert_eq!(removed, 3);
    }

    #[test]
    fn edges_need_live_endpoints() {
        let viewport = Viewport::new(800, 600);
        let mut store = EntityStore::new();
        store.insert_node(node("a", 0.0, 0.0), false, &viewport);

        let edge = Edge::new("a", "ghost", Direction::Forward, &PropertySource::default());
        assert!(!store.insert_edge(edge, false, &viewport));
        assert!(store.edges().is_empty());
        assert!(store.node("a").unwrap().edges.is_empty());
    }

    #[test]
    fn insert_emits_create_attrs_and_place() {
        let viewport = Viewport::new(800, 600);
        let mut store = EntityStore::new();
        store.insert_node(node("a", 0.0, 0.0), false, &viewport);

        let ops = store.drain_ops();
        assert!(matches!(&ops[0], RenderOp::Create { kind: EntityKind::Node, id } if id == "a"));
        assert!(matches!(&ops[1], RenderOp::Attrs { changes, .. } if changes.contains(&AttrChange::Radius(5.0))));
        assert_eq!(
            ops.last(),
            Some(&RenderOp::Place {
                id: "a".to_owned(),
                position: Point::new(400.0, 300.0),
            })
        );
        assert!(store.drain_ops().is_empty());
    }

    #[test]
    fn hover_propagates_to_neighbors_and_balances() {
        let viewport = Viewport::new(800, 600);
        let mut store = store_with_triangle(&viewport);
        let options = HoverOptions {
            neighbors: true,
            cluster: false,
        };

        store.hover_enter("b", options, &viewport);
        assert!(store.node("b").unwrap().flags().highlighted);
        assert!(store.node("a").unwrap().flags().secondary_highlighted);
        assert!(store.node("c").unwrap().flags().secondary_highlighted);
        assert!(store.edge("edge-a-b-u").unwrap().flags().secondary_highlighted);
        assert_eq!(store.hovered(), Some("b"));

        store.hover_leave(&viewport);
        for id in ["a", "b", "c"] {
            let flags = store.node(id).unwrap().flags();
            assert!(!flags.highlighted && !flags.secondary_highlighted, "{id}");
        }
        assert!(store.edges().values().all(|edge| !edge.flags().secondary_highlighted));
        assert_eq!(store.hovered(), None);
    }

    #[test]
    fn hover_leave_resets_what_enter_touched_even_after_edges_change() {
        let viewport = Viewport::new(800, 600);
        let mut store = store_with_triangle(&viewport);
        let options = HoverOptions {
            neighbors: true,
            cluster: false,
        };

        store.hover_enter("b", options, &viewport);
        store.remove_edge("edge-b-c-d");
        store.hover_leave(&viewport);

        assert!(!store.node("c").unwrap().flags().secondary_highlighted);
    }

    #[test]
    fn hover_highlights_cluster_members_only() {
        let viewport = Viewport::new(800, 600);
        let mut store = EntityStore::new();
        store.insert_node(clustered("a", 1), false, &viewport);
        store.insert_node(clustered("b", 1), false, &viewport);
        store.insert_node(clustered("c", 2), false, &viewport);
        store.insert_node(node("d", 0.0, 0.0), false, &viewport);
        let options = HoverOptions {
            neighbors: false,
            cluster: true,
        };

        store.hover_enter("a", options, &viewport);
        assert!(store.node("b").unwrap().flags().secondary_highlighted);
        assert!(!store.node("c").unwrap().flags().secondary_highlighted);
        assert!(!store.node("d").unwrap().flags().secondary_highlighted);

        store.hover_enter("d", options, &viewport);
        assert!(!store.node("a").unwrap().flags().highlighted);
        assert!(!store.node("b").unwrap().flags().secondary_highlighted);
        assert!(store.node("d").unwrap().flags().highlighted);
    }

    #[test]
    fn relayout_places_every_entity() {
        let viewport = Viewport::new(800, 600);
        let mut store = store_with_triangle(&viewport);
        store.drain_ops();

        let mut moved = viewport.clone();
        moved.scroll_by(10.0, 0.0);
        store.relayout(&moved);

        let ops = store.drain_ops();
        let places = ops
            .iter()
            .filter(|op| matches!(op, RenderOp::Place { .. }))
            .count();
        let paths = ops
            .iter()
            .filter(|op| matches!(op, RenderOp::Path { .. }))
            .count();
        assert_eq!((places, paths), (3, 2));
        assert!(ops.contains(&RenderOp::Place {
            id: "a".to_owned(),
            position: Point::new(410.0, 300.0),
        }));
    }
}
