use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use netview::{
    Direction, EdgeRecord, EntityKind, Highlightable, Network, NetworkError, NetworkOptions,
    NodeRecord, Point, Proceed, RenderOp, ViewRequest, ViewResult,
};

const TICK: Duration = Duration::from_millis(50);

/// Holds every continuation so the test decides when, and in which order, fetches finish.
#[derive(Clone, Default)]
struct Script {
    parked: Rc<RefCell<VecDeque<(ViewRequest, Proceed)>>>,
}

impl Script {
    fn attach(&self, network: &mut Network) {
        let parked = Rc::clone(&self.parked);
        network.bind_view(move |request: &ViewRequest, proceed: Proceed| {
            parked.borrow_mut().push_back((request.clone(), proceed));
        });
    }

    fn complete(&self, version: u64, result: ViewResult) {
        let mut parked = self.parked.borrow_mut();
        let index = parked
            .iter()
            .position(|(request, _)| request.version == version)
            .expect("no parked request with that version");
        let (_, mut proceed) = parked.remove(index).unwrap();
        *proceed.result_mut() = result;
        proceed.proceed();
    }

    fn drop_request(&self, version: u64) {
        let mut parked = self.parked.borrow_mut();
        parked.retain(|(request, _)| request.version != version);
    }

    fn last_request(&self) -> ViewRequest {
        self.parked.borrow().back().unwrap().0.clone()
    }
}

fn nodes(ids: &[&str]) -> ViewResult {
    ViewResult {
        nodes: ids
            .iter()
            .enumerate()
            .map(|(i, id)| NodeRecord::new(*id, i as f64 * 0.1, 0.0))
            .collect(),
        edges: Vec::new(),
    }
}

fn settle(network: &mut Network, t: Instant) -> Instant {
    network.poll(t).unwrap();
    let t = t + TICK;
    network.poll(t).unwrap();
    t
}

#[test]
fn late_results_of_older_versions_never_regress_the_view() {
    let t0 = Instant::now();
    let script = Script::default();
    let mut network = Network::new(800, 600, NetworkOptions::default());
    script.attach(&mut network);

    network.refresh(false);
    network.scroll_by(10.0, 0.0);
    network.scroll_by(10.0, 0.0);
    network.scroll_by(10.0, 0.0);
    assert_eq!(network.requested_version(), 4);

    script.complete(4, nodes(&["newest"]));
    let t = settle(&mut network, t0);
    assert_eq!(network.data_version(), 4);

    script.complete(3, nodes(&["stale"]));
    settle(&mut network, t);

    assert_eq!(network.data_version(), 4);
    assert!(network.node("newest").is_some());
    assert!(network.node("stale").is_none());
}

#[test]
fn requests_carry_the_visible_rectangle_and_selection() {
    let script = Script::default();
    let mut network = Network::new(800, 600, NetworkOptions::default());
    script.attach(&mut network);

    network.set_selection(["x", "y"]);
    let request = script.last_request();

    assert!(request.selection_changed);
    assert_eq!(request.node_selection, ["x", "y"]);
    assert_eq!((request.rect.x_min, request.rect.x_max), (-1.0, 1.0));
    assert_eq!((request.rect.y_min, request.rect.y_max), (-1.0, 1.0));
}

#[test]
fn removing_a_node_cascades_and_emits_removals() {
    let t0 = Instant::now();
    let script = Script::default();
    let mut network = Network::new(800, 600, NetworkOptions::default());
    script.attach(&mut network);

    network.refresh(false);
    let mut first = nodes(&["n1", "n2", "n3"]);
    first.edges = vec![
        EdgeRecord::new("n1", "n2", Direction::Forward),
        EdgeRecord::new("n3", "n1", Direction::Undirected),
        EdgeRecord::new("n2", "n3", Direction::Backward),
    ];
    script.complete(1, first);
    let t = settle(&mut network, t0);
    assert_eq!(network.edges().len(), 3);
    network.drain_render_ops();

    network.refresh(false);
    let mut second = nodes(&["n2", "n3"]);
    second.edges = vec![EdgeRecord::new("n3", "n2", Direction::Forward)];
    script.complete(2, second);
    let report = {
        network.poll(t).unwrap();
        network.poll(t + TICK).unwrap().unwrap()
    };

    assert_eq!(report.nodes_removed, 1);
    assert_eq!(report.edges_removed, 2);
    assert_eq!(report.edges_updated, 1);
    assert!(network.edge("edge-n3-n2-d").is_some());
    assert!(network.node("n2").unwrap().edges.contains("edge-n3-n2-d"));

    let removed: Vec<_> = network
        .drain_render_ops()
        .into_iter()
        .filter_map(|op| match op {
            RenderOp::Remove { kind, id } => Some((kind, id)),
            _ => None,
        })
        .collect();
    assert!(removed.contains(&(EntityKind::Node, "n1".to_owned())));
    assert!(removed.contains(&(EntityKind::Edge, "edge-n1-n2-d".to_owned())));
    assert!(removed.contains(&(EntityKind::Edge, "edge-n1-n3-u".to_owned())));
}

#[test]
fn malformed_edges_are_reported_after_the_node_phase() {
    let t0 = Instant::now();
    let script = Script::default();
    let mut network = Network::new(800, 600, NetworkOptions::default());
    script.attach(&mut network);

    network.refresh(false);
    let mut result = nodes(&["a"]);
    result.edges = vec![EdgeRecord::new("a", "missing", Direction::Forward)];
    script.complete(1, result);

    network.poll(t0).unwrap();
    let error = network.poll(t0 + TICK).unwrap_err();

    assert!(matches!(error, NetworkError::UnknownEndpoint { missing, .. } if missing == "missing"));
    assert!(network.node("a").is_some());
    assert!(network.edges().is_empty());
    assert!(!network.is_loading());
}

#[test]
fn node_dropped_from_a_fetch_takes_its_edges_with_it() {
    let t0 = Instant::now();
    let script = Script::default();
    let mut network = Network::new(800, 600, NetworkOptions::default());
    script.attach(&mut network);

    network.refresh(false);
    let first = ViewResult {
        nodes: vec![NodeRecord::new("n1", 5.0, 5.0), NodeRecord::new("n2", 0.0, 0.0)],
        edges: vec![EdgeRecord::new("n1", "n2", Direction::Forward)],
    };
    script.complete(1, first);
    let t = settle(&mut network, t0);
    assert!(network.edge("edge-n1-n2-d").is_some());

    network.refresh(false);
    let second = ViewResult {
        nodes: vec![NodeRecord::new("n2", 0.0, 0.0)],
        edges: vec![EdgeRecord::new("n1", "n2", Direction::Forward)],
    };
    script.complete(2, second);
    network.poll(t).unwrap();
    let error = network.poll(t + TICK).unwrap_err();

    assert_eq!(
        error,
        NetworkError::UnknownEndpoint {
            edge: "edge-n1-n2-d".to_owned(),
            missing: "n1".to_owned(),
        }
    );
    assert_eq!(network.data_version(), 2);
    assert!(network.node("n1").is_none());
    assert!(network.edges().is_empty());
    assert!(
        network
            .nodes()
            .values()
            .all(|node| node.edges.iter().all(|id| network.edge(id).is_some()))
    );
}

#[test]
fn dropped_continuation_is_reported_and_clears_loading() {
    let t0 = Instant::now();
    let script = Script::default();
    let mut network = Network::new(800, 600, NetworkOptions::default());
    script.attach(&mut network);

    network.refresh(false);
    assert!(network.is_loading());
    script.drop_request(1);

    let error = network.poll(t0).unwrap_err();
    assert_eq!(
        error,
        NetworkError::ContinuationDropped {
            version: 1,
            stage: 0
        }
    );
    assert!(!network.is_loading());
    assert!(!network.is_busy());
}

#[test]
fn delayed_refreshes_coalesce_until_loading_ends() {
    let t0 = Instant::now();
    let script = Script::default();
    let mut network = Network::new(800, 600, NetworkOptions::default());
    script.attach(&mut network);

    network.refresh(false);
    network.refresh_delayed(t0);
    network.refresh_delayed(t0);
    network.refresh_delayed(t0);
    assert_eq!(network.requested_version(), 1);

    script.complete(1, nodes(&["a"]));
    let t = settle(&mut network, t0);
    network.poll(t + Duration::from_secs(2)).unwrap();

    assert_eq!(network.requested_version(), 2);
    assert!(network.is_loading());
}

#[test]
fn selected_nodes_survive_refreshes_and_reselect_on_reappearance() {
    let t0 = Instant::now();
    let script = Script::default();
    let mut network = Network::new(800, 600, NetworkOptions::default());
    script.attach(&mut network);

    network.set_selection(["a"]);
    script.complete(1, nodes(&["a", "b"]));
    let t = settle(&mut network, t0);
    assert!(network.node("a").unwrap().flags().selected);

    network.refresh(false);
    script.complete(2, nodes(&["b"]));
    let t = settle(&mut network, t);
    assert!(network.node("a").is_none());
    assert!(network.is_node_selected("a"));

    network.refresh(false);
    script.complete(3, nodes(&["a", "b"]));
    settle(&mut network, t);
    assert!(network.node("a").unwrap().flags().selected);
    assert!(!network.node("b").unwrap().flags().selected);
}

#[test]
fn observers_chain_in_order_with_decorators() {
    let t0 = Instant::now();
    let mut network = Network::new(800, 600, NetworkOptions::default());
    network.bind_view(|_request: &ViewRequest, mut proceed: Proceed| {
        proceed.result_mut().nodes.push(NodeRecord::new("a", 0.0, 0.0));
        proceed.proceed();
    });
    network.bind_view(|_request: &ViewRequest, mut proceed: Proceed| {
        for node in &mut proceed.result_mut().nodes {
            let normal = node.properties.normal.get_or_insert_with(Default::default);
            normal.caption = Some(node.id.to_uppercase());
        }
        proceed.proceed();
    });

    network.refresh(false);
    settle(&mut network, t0);

    let node = network.node("a").unwrap();
    assert_eq!(node.current_properties().caption.as_deref(), Some("A"));
    assert_eq!(node.pos, Point::ZERO);
}
