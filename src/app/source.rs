use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context as _, Result};
use eframe::egui::Context;
use netview::{
    Direction, EdgeRecord, Network, NodeRecord, Point, Proceed, PropertySet, PropertySource,
    ViewObserver, ViewRequest, ViewResult,
};
use serde_json::json;
use tracing::debug;

use crate::util::{stable_pair, stable_unit};

/// Finest lattice spacing in logical units.
const LATTICE_SPACING: f64 = 0.05;
const LATTICE_MAX_NODES: usize = 600;
const LATTICE_CLUSTER_CELLS: i64 = 16;
const CAPTION_MAX_NODES: usize = 80;

#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct Latency {
    pub base: Duration,
    pub jitter: Duration,
    pub seed: u64,
}

impl Latency {
    fn for_version(&self, version: u64) -> Duration {
        self.base + self.jitter.mul_f64(stable_unit((self.seed, version)))
    }
}

/// Where view requests are answered from.
pub(in crate::app) enum GraphSource {
    Static(Arc<ViewResult>),
    Lattice { seed: u64 },
}

impl GraphSource {
    pub fn load(data: Option<&Path>, seed: u64) -> Result<Self> {
        let Some(path) = data else {
            return Ok(Self::Lattice { seed });
        };

        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read graph data from {}", path.display()))?;
        let graph: ViewResult = serde_json::from_str(&json)
            .with_context(|| format!("graph data in {} is not valid JSON", path.display()))?;
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "loaded static graph"
        );
        Ok(Self::Static(Arc::new(graph)))
    }

    pub fn label(&self) -> String {
        match self {
            Self::Static(graph) => format!(
                "static graph ({} nodes, {} edges)",
                graph.nodes.len(),
                graph.edges.len()
            ),
            Self::Lattice { seed } => format!("synthetic lattice (seed {seed})"),
        }
    }

    /// Registers the source followed by the caption decorator.
    pub fn attach(&self, network: &mut Network, ctx: &Context, latency: Latency) {
        match self {
            Self::Static(graph) => {
                let graph = Arc::clone(graph);
                network.bind_view(Responder::new(ctx, latency, move |request| {
                    query_static(&graph, request)
                }));
            }
            Self::Lattice { seed } => {
                let seed = *seed;
                network.bind_view(Responder::new(ctx, latency, move |request| {
                    query_lattice(request, seed)
                }));
            }
        }
        network.bind_view(CaptionDecorator {
            max_nodes: CAPTION_MAX_NODES,
        });
    }
}

/// Answers each request on its own worker thread after a simulated network delay.
struct Responder<Q> {
    ctx: Context,
    latency: Latency,
    query: Arc<Q>,
}

impl<Q> Responder<Q>
where
    Q: Fn(&ViewRequest) -> ViewResult + Send + Sync + 'static,
{
    fn new(ctx: &Context, latency: Latency, query: Q) -> Self {
        Self {
            ctx: ctx.clone(),
            latency,
            query: Arc::new(query),
        }
    }
}

impl<Q> ViewObserver for Responder<Q>
where
    Q: Fn(&ViewRequest) -> ViewResult + Send + Sync + 'static,
{
    fn on_view(&mut self, request: &ViewRequest, mut proceed: Proceed) {
        let request = request.clone();
        let delay = self.latency.for_version(request.version);
        let query = Arc::clone(&self.query);
        let ctx = self.ctx.clone();

        thread::spawn(move || {
            thread::sleep(delay);
            *proceed.result_mut() = query(&request);
            proceed.proceed();
            ctx.request_repaint();
        });
    }
}

/// Labels nodes with their id when few enough are on screen to read them.
struct CaptionDecorator {
    max_nodes: usize,
}

impl ViewObserver for CaptionDecorator {
    fn on_view(&mut self, _request: &ViewRequest, mut proceed: Proceed) {
        let result = proceed.result_mut();
        if result.nodes.len() <= self.max_nodes {
            for node in &mut result.nodes {
                let normal = node.properties.normal.get_or_insert_with(PropertySet::default);
                if normal.caption.is_none() {
                    normal.caption = Some(node.id.clone());
                }
            }
        }
        proceed.proceed();
    }
}

fn query_static(graph: &ViewResult, request: &ViewRequest) -> ViewResult {
    let margin = request.rect.width().max(request.rect.height()) * 0.1;
    let area = request.rect.expand(margin);

    let nodes: Vec<NodeRecord> = graph
        .nodes
        .iter()
        .filter(|node| {
            area.contains(Point::new(node.x, node.y)) || request.node_selection.contains(&node.id)
        })
        .cloned()
        .collect();
    let kept: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
    let edges = graph
        .edges
        .iter()
        .filter(|edge| kept.contains(edge.from.as_str()) && kept.contains(edge.to.as_str()))
        .cloned()
        .collect();

    ViewResult { nodes, edges }
}

fn lattice_id(i: i64, j: i64) -> String {
    fn axis(value: i64) -> String {
        if value < 0 {
            format!("m{}", -value)
        } else {
            format!("p{value}")
        }
    }
    format!("{}{}", axis(i), axis(j))
}

fn lattice_direction(seed: u64, a: &str, b: &str) -> Direction {
    match (stable_unit((seed, a, b)) * 4.0) as u8 {
        0 => Direction::Undirected,
        1 => Direction::Bidirectional,
        2 => Direction::Forward,
        _ => Direction::Backward,
    }
}

fn lattice_properties(seed: u64, i: i64, j: i64, id: &str) -> PropertySource {
    const PALETTE: [&str; 6] = ["#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#b07aa1"];

    let cluster = (i.div_euclid(LATTICE_CLUSTER_CELLS), j.div_euclid(LATTICE_CLUSTER_CELLS));
    let shade = (stable_unit((seed, cluster)) * PALETTE.len() as f64) as usize;
    let radius = 4.0 + stable_unit((seed, id)) * 4.0;
    let linked = stable_unit((seed, id, "href")) < 0.01;

    PropertySource {
        normal: Some(PropertySet {
            r: Some(radius),
            fill: Some(PALETTE[shade.min(PALETTE.len() - 1)].to_owned()),
            stroke: Some("#222".to_owned()),
            stroke_width: Some(0.5),
            href: linked.then(|| format!("https://example.org/nodes/{id}")),
            cluster: Some(json!([cluster.0, cluster.1])),
            ..PropertySet::default()
        }),
        highlight: Some(PropertySet {
            r: Some(radius + 2.0),
            fill: Some("#ff7f0e".to_owned()),
            ..PropertySet::default()
        }),
        secondary_highlight: Some(PropertySet {
            fill: Some("#ffbb78".to_owned()),
            ..PropertySet::default()
        }),
        unhighlight: None,
        selected: Some(PropertySet {
            fill: Some("gold".to_owned()),
            stroke: Some("black".to_owned()),
            stroke_width: Some(2.0),
            ..PropertySet::default()
        }),
    }
}

/// Unbounded synthetic grid. Coarser levels keep every `step`-th point so the answer stays
/// small at any zoom while node ids remain stable across levels.
fn query_lattice(request: &ViewRequest, seed: u64) -> ViewResult {
    let rect = request.rect;
    let mut step = 1i64;
    let (i_range, j_range) = loop {
        let spacing = LATTICE_SPACING * step as f64;
        let i_min = (rect.x_min / spacing).floor() as i64 * step;
        let i_max = (rect.x_max / spacing).ceil() as i64 * step;
        let j_min = (rect.y_min / spacing).floor() as i64 * step;
        let j_max = (rect.y_max / spacing).ceil() as i64 * step;
        let count = ((i_max - i_min) / step + 1) * ((j_max - j_min) / step + 1);
        if count as usize <= LATTICE_MAX_NODES || step > 1 << 20 {
            break ((i_min, i_max), (j_min, j_max));
        }
        step *= 2;
    };

    let mut result = ViewResult::default();
    let edge_properties = PropertySource {
        highlight: Some(PropertySet {
            stroke: Some("#d62728".to_owned()),
            stroke_opacity: Some(1.0),
            ..PropertySet::default()
        }),
        secondary_highlight: Some(PropertySet {
            stroke: Some("#ff7f0e".to_owned()),
            stroke_width: Some(2.0),
            stroke_opacity: Some(0.9),
            ..PropertySet::default()
        }),
        selected: Some(PropertySet {
            stroke: Some("black".to_owned()),
            stroke_width: Some(2.5),
            stroke_opacity: Some(1.0),
            ..PropertySet::default()
        }),
        ..PropertySource::default()
    };

    let mut i = i_range.0;
    while i <= i_range.1 {
        let mut j = j_range.0;
        while j <= j_range.1 {
            let id = lattice_id(i, j);
            let (dx, dy) = stable_pair((seed, i, j));
            let x = i as f64 * LATTICE_SPACING + dx * LATTICE_SPACING * 0.3;
            let y = j as f64 * LATTICE_SPACING + dy * LATTICE_SPACING * 0.3;
            let properties = lattice_properties(seed, i, j, &id);

            for (ni, nj) in [(i + step, j), (i, j + step)] {
                if ni > i_range.1 || nj > j_range.1 {
                    continue;
                }
                let neighbor = lattice_id(ni, nj);
                let direction = lattice_direction(seed, &id, &neighbor);
                result.edges.push(
                    EdgeRecord::new(id.clone(), neighbor, direction)
                        .with_properties(edge_properties.clone()),
                );
            }
            result
                .nodes
                .push(NodeRecord::new(id, x, y).with_properties(properties));
            j += step;
        }
        i += step;
    }

    debug!(
        version = request.version,
        step,
        nodes = result.nodes.len(),
        edges = result.edges.len(),
        "lattice view"
    );
    result
}

#[cfg(test)]
mod tests {
    use netview::Rect;

    use super::*;

    fn request(rect: Rect) -> ViewRequest {
        ViewRequest {
            version: 1,
            rect,
            node_selection: Vec::new(),
            edge_selection: Vec::new(),
            selection_changed: false,
        }
    }

    #[test]
    fn lattice_ids_encode_sign() {
        assert_eq!(lattice_id(3, -4), "p3m4");
        assert_ne!(lattice_id(1, 12), lattice_id(11, 2));
    }

    #[test]
    fn lattice_stays_small_when_zoomed_out() {
        let result = query_lattice(&request(Rect::new(-50.0, 50.0, -50.0, 50.0)), 7);
        assert!(result.nodes.len() <= LATTICE_MAX_NODES);
        assert!(!result.nodes.is_empty());
    }

    #[test]
    fn lattice_edges_only_join_returned_nodes() {
        let result = query_lattice(&request(Rect::new(-0.2, 0.2, -0.2, 0.2)), 7);
        let ids: HashSet<&str> = result.nodes.iter().map(|node| node.id.as_str()).collect();
        assert!(!result.edges.is_empty());
        for edge in &result.edges {
            assert!(ids.contains(edge.from.as_str()) && ids.contains(edge.to.as_str()));
        }
    }

    #[test]
    fn lattice_is_deterministic_per_seed() {
        let rect = Rect::new(-0.3, 0.3, -0.3, 0.3);
        assert_eq!(query_lattice(&request(rect), 1), query_lattice(&request(rect), 1));
    }

    #[test]
    fn static_query_keeps_selected_nodes_outside_the_view() {
        let graph = ViewResult {
            nodes: vec![
                NodeRecord::new("in", 0.0, 0.0),
                NodeRecord::new("far", 9.0, 9.0),
                NodeRecord::new("picked", -9.0, 9.0),
            ],
            edges: vec![
                EdgeRecord::new("in", "far", Direction::Forward),
                EdgeRecord::new("in", "picked", Direction::Undirected),
            ],
        };
        let mut view = request(Rect::new(-1.0, 1.0, -1.0, 1.0));
        view.node_selection = vec!["picked".to_owned()];

        let result = query_static(&graph, &view);
        let ids: Vec<&str> = result.nodes.iter().map(|node| node.id.as_str()).collect();
        assert_eq!(ids, ["in", "picked"]);
        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.edges[0].to, "picked");
    }
}
