use std::time::Instant;

use tracing::{debug, warn};

use crate::entity::{Edge, EdgeMap, Node, NodeMap};
use crate::error::NetworkError;
use crate::geometry::Point;
use crate::highlight::Highlightable;
use crate::input::InputController;
use crate::options::NetworkOptions;
use crate::reconcile::{ReconcileReport, reconcile, selection_fit_points};
use crate::render::RenderOp;
use crate::selection::Selection;
use crate::signals::{ChainEvent, NavigationEvent, Signals, ViewObserver};
use crate::store::EntityStore;
use crate::sync::{PendingApply, SyncEngine};
use crate::viewport::Viewport;

/// Fraction of the screen extent treated as "near the edge" after a selection change.
const SELECTION_EDGE_MARGIN: f64 = 0.1;

/// A graph view: viewport, live entities, selection and the refresh protocol that keeps them
/// in sync with the data source. Driven from a single thread by the host.
pub struct Network {
    pub(crate) options: NetworkOptions,
    pub(crate) viewport: Viewport,
    pub(crate) store: EntityStore,
    pub(crate) selection: Selection,
    pub(crate) input: InputController,
    sync: SyncEngine,
    signals: Signals,
}

impl Network {
    pub fn new(screen_width: u32, screen_height: u32, options: NetworkOptions) -> Self {
        let viewport = options.viewport(screen_width, screen_height);
        let selection = Selection::new(options.max_node_selection, options.max_edge_selection);
        Self {
            options,
            viewport,
            store: EntityStore::new(),
            selection,
            input: InputController::default(),
            sync: SyncEngine::new(),
            signals: Signals::default(),
        }
    }

    pub fn options(&self) -> &NetworkOptions {
        &self.options
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn nodes(&self) -> &NodeMap {
        self.store.nodes()
    }

    pub fn edges(&self) -> &EdgeMap {
        self.store.edges()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.store.node(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.store.edge(id)
    }

    pub fn hovered(&self) -> Option<&str> {
        self.store.hovered()
    }

    pub fn data_version(&self) -> u64 {
        self.sync.data_version()
    }

    pub fn requested_version(&self) -> u64 {
        self.sync.requested_version()
    }

    pub fn is_loading(&self) -> bool {
        self.sync.is_loading()
    }

    /// Whether the host should keep calling [`Network::poll`].
    pub fn is_busy(&self) -> bool {
        self.sync.has_pending() || self.signals.in_flight() > 0
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sync.next_deadline()
    }

    pub fn bind_navigation(&mut self, listener: impl FnMut(&NavigationEvent) + 'static) {
        self.signals.bind_navigation(listener);
    }

    pub fn bind_view(&mut self, observer: impl ViewObserver + 'static) {
        self.signals.bind_view(observer);
    }

    pub fn drain_render_ops(&mut self) -> Vec<RenderOp> {
        self.store.drain_ops()
    }

    /// Issues a new versioned view request for the visible rectangle.
    pub fn refresh(&mut self, selection_changed: bool) {
        let request = self.sync.next_request(
            self.viewport.visible_rect(),
            self.selection.nodes.ids().to_vec(),
            self.selection.edges.ids().to_vec(),
            selection_changed,
        );
        self.signals.start(request);
    }

    /// Coalesced refresh that waits for the current fetch to finish. While loading, the
    /// retry is scheduled relative to `now`.
    pub fn refresh_delayed(&mut self, now: Instant) {
        if self.sync.refresh_delayed(now) {
            self.refresh(false);
        }
    }

    /// Advances the refresh protocol to `now`.
    ///
    /// Collects finished observer chains, applies at most one due result and runs a pending
    /// delayed refresh. The first protocol error is returned after all of that happened.
    pub fn poll(&mut self, now: Instant) -> Result<Option<ReconcileReport>, NetworkError> {
        let mut error = None;

        for event in self.signals.drain() {
            match event {
                ChainEvent::Completed { request, result } => {
                    self.sync.enqueue(request, result, now);
                }
                ChainEvent::Abandoned { version, stage } => {
                    self.sync.abandon(version);
                    error.get_or_insert(NetworkError::ContinuationDropped { version, stage });
                }
            }
        }

        let mut report = None;
        if let Some(entry) = self.sync.take_due(now) {
            match self.apply(entry) {
                Ok(applied) => report = Some(applied),
                Err(err) => {
                    warn!(%err, "view result rejected");
                    error.get_or_insert(err);
                }
            }
        }

        if self.sync.poll_delayed(now) {
            debug!("running delayed refresh");
            self.refresh(false);
        }

        match error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    fn apply(&mut self, entry: PendingApply) -> Result<ReconcileReport, NetworkError> {
        let PendingApply {
            request, result, ..
        } = entry;

        self.sync.begin_apply(request.version);
        let outcome = reconcile(&mut self.store, &self.selection, &self.viewport, &result);
        self.sync.finish_apply();
        let report = outcome?;

        if request.selection_changed
            && let Some(points) = selection_fit_points(
                &self.store,
                &self.selection,
                &self.viewport,
                SELECTION_EDGE_MARGIN,
            )
        {
            debug!(count = points.len(), "bringing selection into view");
            self.scroll_into_view(&points);
        }
        Ok(report)
    }

    /// Announces a center or zoom change, re-places entities and refreshes.
    pub(crate) fn navigate(&mut self) {
        self.signals.trigger_navigation(NavigationEvent {
            center: self.viewport.center,
            zoom: self.viewport.zoom,
        });
        self.store.relayout(&self.viewport);
        self.refresh(false);
    }

    /// Zooms by `factor` around a screen point. Returns `false` when ignored during a fetch.
    pub fn do_zoom(&mut self, factor: f64, focus: Point) -> Result<bool, NetworkError> {
        if self.sync.is_loading() {
            debug!(factor, "zoom ignored while loading");
            return Ok(false);
        }
        self.viewport.set_zoom_at_focus(factor, focus)?;
        self.navigate();
        Ok(true)
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.viewport.scroll_by(dx, dy);
        self.navigate();
    }

    pub fn scroll_to(&mut self, center: Point) {
        self.viewport.scroll_to(center);
        self.navigate();
    }

    /// Centers on `points`, zooming out if they do not fit. No-op without points.
    pub fn scroll_into_view(&mut self, points: &[Point]) {
        if self.viewport.fit_to_points(points) {
            self.navigate();
        }
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.navigate();
    }

    pub fn resize(&mut self, screen_width: u32, screen_height: u32, now: Instant) {
        if (screen_width, screen_height)
            == (self.viewport.screen_width, self.viewport.screen_height)
        {
            return;
        }
        self.viewport.resize(screen_width, screen_height);
        self.store.relayout(&self.viewport);
        self.refresh_delayed(now);
    }

    pub fn selection(&self) -> &[String] {
        self.selection.nodes.ids()
    }

    pub fn edge_selection(&self) -> &[String] {
        self.selection.edges.ids()
    }

    pub fn is_node_selected(&self, id: &str) -> bool {
        self.selection.nodes.contains(id)
    }

    pub fn is_edge_selected(&self, id: &str) -> bool {
        self.selection.edges.contains(id)
    }

    pub fn set_selection<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.nodes.replace(ids);
        self.refresh_selection();
    }

    /// Pushes selection membership changes to the live entities and refreshes.
    pub fn refresh_selection(&mut self) {
        let (nodes, edges) = self.selection.take_deltas();
        for id in &nodes.selected {
            self.store.transition_node(id, &self.viewport, Node::select);
        }
        for id in &nodes.unselected {
            self.store.transition_node(id, &self.viewport, Node::unselect);
        }
        for id in &edges.selected {
            self.store.transition_edge(id, &self.viewport, Edge::select);
        }
        for id in &edges.unselected {
            self.store.transition_edge(id, &self.viewport, Edge::unselect);
        }
        self.refresh(true);
    }
}
