use std::collections::HashSet;

use tracing::debug;

use crate::entity::{Edge, Node, edge_id};
use crate::error::NetworkError;
use crate::geometry::Point;
use crate::selection::Selection;
use crate::signals::ViewResult;
use crate::store::EntityStore;
use crate::viewport::Viewport;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub nodes_created: usize,
    pub nodes_updated: usize,
    pub nodes_removed: usize,
    pub edges_created: usize,
    pub edges_updated: usize,
    /// Includes edges removed together with their endpoint.
    pub edges_removed: usize,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.nodes_created == 0
            && self.nodes_removed == 0
            && self.edges_created == 0
            && self.edges_removed == 0
    }
}

/// Every edge endpoint must be a live node once the node phase has run.
fn validate_edges(store: &EntityStore, result: &ViewResult) -> Result<(), NetworkError> {
    for edge in &result.edges {
        for endpoint in [&edge.from, &edge.to] {
            if store.node(endpoint).is_none() {
                return Err(NetworkError::UnknownEndpoint {
                    edge: edge_id(&edge.from, &edge.to, edge.direction),
                    missing: endpoint.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Merges a fetched view into the store: updates survivors in place, creates newcomers and
/// removes everything that was not fetched.
///
/// Nodes are reconciled first, and removing a node removes its edges with it. An edge record
/// naming a node outside the fetched set then fails the edge phase as a whole, so the store
/// keeps the new node set and its previous edges among surviving nodes.
pub fn reconcile(
    store: &mut EntityStore,
    selection: &Selection,
    viewport: &Viewport,
    result: &ViewResult,
) -> Result<ReconcileReport, NetworkError> {
    let mut report = ReconcileReport::default();

    let mut stale_nodes: HashSet<String> = store.nodes().keys().cloned().collect();
    for record in &result.nodes {
        let pos = Point::new(record.x, record.y);
        if store.update_node(&record.id, pos, &record.properties, viewport) {
            stale_nodes.remove(&record.id);
            report.nodes_updated += 1;
        } else {
            let node = Node::new(record.id.clone(), pos, &record.properties);
            store.insert_node(node, selection.nodes.contains(&record.id), viewport);
            report.nodes_created += 1;
        }
    }
    for id in &stale_nodes {
        if let Some(node) = store.remove_node(id) {
            report.nodes_removed += 1;
            report.edges_removed += node.edges.len();
        }
    }

    if let Err(err) = validate_edges(store, result) {
        debug!(?report, %err, "edge phase rejected");
        return Err(err);
    }

    let mut stale_edges: HashSet<String> = store.edges().keys().cloned().collect();
    for record in &result.edges {
        let id = edge_id(&record.from, &record.to, record.direction);
        if store.update_edge(
            &id,
            (&record.from, &record.to, record.direction),
            &record.properties,
            viewport,
        ) {
            stale_edges.remove(&id);
            report.edges_updated += 1;
            continue;
        }

        let edge = Edge::new(&record.from, &record.to, record.direction, &record.properties);
        let selected = selection.edges.contains(&id);
        if store.insert_edge(edge, selected, viewport) {
            report.edges_created += 1;
        }
    }
    for id in &stale_edges {
        if store.remove_edge(id).is_some() {
            report.edges_removed += 1;
        }
    }

    debug!(?report, "reconciled view");
    Ok(report)
}

/// Logical positions of the selected nodes when at least one of them sits near a screen edge.
pub fn selection_fit_points(
    store: &EntityStore,
    selection: &Selection,
    viewport: &Viewport,
    margin: f64,
) -> Option<Vec<Point>> {
    let selected: Vec<&Node> = selection
        .nodes
        .ids()
        .iter()
        .filter_map(|id| store.node(id))
        .collect();

    let crowded = selected
        .iter()
        .any(|node| viewport.near_screen_edge(node.screen_pos(viewport), margin));
    crowded.then(|| selected.iter().map(|node| node.pos).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Direction;
    use crate::highlight::Highlightable;
    use crate::properties::{PropertySet, PropertySource};
    use crate::render::{EntityKind, RenderOp};
    use crate::signals::{EdgeRecord, NodeRecord};

    fn view(nodes: &[(&str, f64, f64)], edges: &[(&str, &str, Direction)]) -> ViewResult {
        ViewResult {
            nodes: nodes
                .iter()
                .map(|(id, x, y)| NodeRecord::new(*id, *x, *y))
                .collect(),
            edges: edges
                .iter()
                .map(|(from, to, direction)| EdgeRecord::new(*from, *to, *direction))
                .collect(),
        }
    }

    #[test]
    fn creates_then_updates_then_removes() {
        let viewport = Viewport::new(800, 600);
        let selection = Selection::default();
        let mut store = EntityStore::new();

        let first = view(
            &[("n1", 0.0, 0.0), ("n2", 0.1, 0.0)],
            &[("n1", "n2", Direction::Forward)],
        );
        let report = reconcile(&mut store, &selection, &viewport, &first).unwrap();
        assert_eq!((report.nodes_created, report.edges_created), (2, 1));

        let second = view(&[("n2", 0.2, 0.0), ("n3", 0.3, 0.0)], &[]);
        let report = reconcile(&mut store, &selection, &viewport, &second).unwrap();
        assert_eq!(report.nodes_created, 1);
        assert_eq!(report.nodes_updated, 1);
        assert_eq!(report.nodes_removed, 1);
        assert_eq!(report.edges_removed, 1);

        assert!(store.node("n1").is_none());
        assert!(store.edges().is_empty());
        assert_eq!(store.node("n2").unwrap().pos, Point::new(0.2, 0.0));
    }

    #[test]
    fn reapplying_the_same_view_is_idempotent() {
        let viewport = Viewport::new(800, 600);
        let selection = Selection::default();
        let mut store = EntityStore::new();
        let result = view(
            &[("a", 0.0, 0.0), ("b", 0.1, 0.1)],
            &[("a", "b", Direction::Undirected)],
        );

        reconcile(&mut store, &selection, &viewport, &result).unwrap();
        store.drain_ops();
        let report = reconcile(&mut store, &selection, &viewport, &result).unwrap();

        assert!(report.is_noop());
        assert!(
            store
                .drain_ops()
                .iter()
                .all(|op| !matches!(op, RenderOp::Create { .. } | RenderOp::Remove { .. }))
        );
    }

    #[test]
    fn omitted_node_takes_its_edges_even_when_an_edge_still_names_it() {
        let viewport = Viewport::new(800, 600);
        let selection = Selection::default();
        let mut store = EntityStore::new();
        let first = view(
            &[("n1", 5.0, 5.0), ("n2", 0.0, 0.0)],
            &[("n1", "n2", Direction::Forward)],
        );
        reconcile(&mut store, &selection, &viewport, &first).unwrap();
        store.drain_ops();

        let second = view(&[("n2", 0.0, 0.0)], &[("n1", "n2", Direction::Forward)]);
        let error = reconcile(&mut store, &selection, &viewport, &second).unwrap_err();

        assert_eq!(
            error,
            NetworkError::UnknownEndpoint {
                edge: "edge-n1-n2-d".to_owned(),
                missing: "n1".to_owned(),
            }
        );
        assert!(store.node("n1").is_none());
        assert!(store.edges().is_empty());
        assert!(store.node("n2").unwrap().edges.is_empty());

        let ops = store.drain_ops();
        let removed_edge = ops.iter().position(|op| {
            matches!(op, RenderOp::Remove { kind: EntityKind::Edge, id } if id == "edge-n1-n2-d")
        });
        let removed_node = ops.iter().position(|op| {
            matches!(op, RenderOp::Remove { kind: EntityKind::Node, id } if id == "n1")
        });
        assert!(removed_edge.unwrap() < removed_node.unwrap());
    }

    #[test]
    fn rejected_edge_phase_keeps_edges_between_survivors() {
        let viewport = Viewport::new(800, 600);
        let selection = Selection::default();
        let mut store = EntityStore::new();
        let first = view(
            &[("a", 0.0, 0.0), ("b", 0.1, 0.0)],
            &[("a", "b", Direction::Undirected)],
        );
        reconcile(&mut store, &selection, &viewport, &first).unwrap();

        let broken = view(
            &[("a", 0.0, 0.0), ("b", 0.1, 0.0), ("c", 0.2, 0.0)],
            &[("c", "ghost", Direction::Forward)],
        );
        let error = reconcile(&mut store, &selection, &viewport, &broken).unwrap_err();

        assert!(matches!(error, NetworkError::UnknownEndpoint { missing, .. } if missing == "ghost"));
        assert!(store.node("c").is_some());
        assert!(store.edge("edge-a-b-u").is_some());
        assert!(store.edge("edge-c-ghost-d").is_none());
    }

    #[test]
    fn created_entities_pick_up_selection() {
        let viewport = Viewport::new(800, 600);
        let mut selection = Selection::default();
        selection.nodes.replace(["a"]);
        selection.edges.replace(["edge-a-b-u"]);
        let mut store = EntityStore::new();

        let result = view(
            &[("a", 0.0, 0.0), ("b", 0.1, 0.1)],
            &[("b", "a", Direction::Undirected)],
        );
        reconcile(&mut store, &selection, &viewport, &result).unwrap();

        assert!(store.node("a").unwrap().flags().selected);
        assert!(!store.node("b").unwrap().flags().selected);
        assert!(store.edge("edge-a-b-u").unwrap().flags().selected);
    }

    #[test]
    fn updated_properties_keep_highlight_flags() {
        let viewport = Viewport::new(800, 600);
        let mut selection = Selection::default();
        selection.nodes.replace(["a"]);
        let mut store = EntityStore::new();
        reconcile(&mut store, &selection, &viewport, &view(&[("a", 0.0, 0.0)], &[])).unwrap();

        let mut result = view(&[("a", 0.0, 0.0)], &[]);
        result.nodes[0].properties = PropertySource {
            selected: Some(PropertySet {
                fill: Some("gold".to_owned()),
                ..PropertySet::default()
            }),
            ..PropertySource::default()
        };
        reconcile(&mut store, &selection, &viewport, &result).unwrap();

        let node = store.node("a").unwrap();
        assert!(node.flags().selected);
        assert_eq!(node.current_properties().fill.as_deref(), Some("gold"));
    }

    #[test]
    fn fit_points_only_when_selection_is_near_an_edge() {
        let viewport = Viewport::new(800, 600);
        let mut selection = Selection::default();
        let mut store = EntityStore::new();
        let result = view(&[("center", 0.0, 0.0), ("corner", 0.95, 0.0)], &[]);
        reconcile(&mut store, &selection, &viewport, &result).unwrap();

        selection.nodes.replace(["center"]);
        assert!(selection_fit_points(&store, &selection, &viewport, 0.1).is_none());

        selection.nodes.replace(["center", "corner"]);
        let points = selection_fit_points(&store, &selection, &viewport, 0.1).unwrap();
        assert_eq!(points, vec![Point::ZERO, Point::new(0.95, 0.0)]);
    }
}
