//! Notification contract: `navigation` listeners and the `view` observer chain.
//!
//! A view request walks the registered observers in order. Each observer receives a
//! [`Proceed`] continuation that owns the accumulated [`ViewResult`]; the chain only moves on
//! when the observer consumes it, which may happen later and on another thread. Consuming
//! twice is impossible, and dropping it without proceeding is reported as a contract
//! violation instead of silently stalling the refresh.

use std::collections::HashMap;
use std::mem;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entity::Direction;
use crate::geometry::{Point, Rect};
use crate::properties::PropertySource;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavigationEvent {
    pub center: Point,
    pub zoom: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewRequest {
    pub version: u64,
    pub rect: Rect,
    pub node_selection: Vec<String>,
    pub edge_selection: Vec<String>,
    pub selection_changed: bool,
}

/// Wire form: `[id, x, y, properties]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(String, f64, f64, PropertySource)",
    into = "(String, f64, f64, PropertySource)"
)]
pub struct NodeRecord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub properties: PropertySource,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            properties: PropertySource::default(),
        }
    }

    pub fn with_properties(mut self, properties: PropertySource) -> Self {
        self.properties = properties;
        self
    }
}

impl From<(String, f64, f64, PropertySource)> for NodeRecord {
    fn from((id, x, y, properties): (String, f64, f64, PropertySource)) -> Self {
        Self {
            id,
            x,
            y,
            properties,
        }
    }
}

impl From<NodeRecord> for (String, f64, f64, PropertySource) {
    fn from(record: NodeRecord) -> Self {
        (record.id, record.x, record.y, record.properties)
    }
}

/// Wire form: `[from, to, direction, properties]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(String, String, Direction, PropertySource)",
    into = "(String, String, Direction, PropertySource)"
)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    pub direction: Direction,
    pub properties: PropertySource,
}

impl EdgeRecord {
    pub fn new(from: impl Into<String>, to: impl Into<String>, direction: Direction) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            direction,
            properties: PropertySource::default(),
        }
    }

    pub fn with_properties(mut self, properties: PropertySource) -> Self {
        self.properties = properties;
        self
    }
}

impl From<(String, String, Direction, PropertySource)> for EdgeRecord {
    fn from((from, to, direction, properties): (String, String, Direction, PropertySource)) -> Self {
        Self {
            from,
            to,
            direction,
            properties,
        }
    }
}

impl From<EdgeRecord> for (String, String, Direction, PropertySource) {
    fn from(record: EdgeRecord) -> Self {
        (record.from, record.to, record.direction, record.properties)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

enum StageEvent {
    Proceeded {
        version: u64,
        stage: usize,
        result: ViewResult,
    },
    Dropped {
        version: u64,
        stage: usize,
    },
}

/// One-shot continuation handed to a view observer.
pub struct Proceed {
    version: u64,
    stage: usize,
    result: ViewResult,
    done: bool,
    tx: Sender<StageEvent>,
}

impl Proceed {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn result(&self) -> &ViewResult {
        &self.result
    }

    pub fn result_mut(&mut self) -> &mut ViewResult {
        &mut self.result
    }

    /// Hands the accumulated result to the next observer, or to reconciliation after the last.
    pub fn proceed(mut self) {
        self.done = true;
        let event = StageEvent::Proceeded {
            version: self.version,
            stage: self.stage,
            result: mem::take(&mut self.result),
        };
        let _ = self.tx.send(event);
    }
}

impl Drop for Proceed {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let _ = self.tx.send(StageEvent::Dropped {
            version: self.version,
            stage: self.stage,
        });
    }
}

pub trait ViewObserver {
    fn on_view(&mut self, request: &ViewRequest, proceed: Proceed);
}

impl<F> ViewObserver for F
where
    F: FnMut(&ViewRequest, Proceed),
{
    fn on_view(&mut self, request: &ViewRequest, proceed: Proceed) {
        self(request, proceed);
    }
}

pub(crate) enum ChainEvent {
    Completed {
        request: ViewRequest,
        result: ViewResult,
    },
    Abandoned {
        version: u64,
        stage: usize,
    },
}

type NavigationListener = Box<dyn FnMut(&NavigationEvent)>;

pub struct Signals {
    navigation: Vec<NavigationListener>,
    observers: Vec<Box<dyn ViewObserver>>,
    in_flight: HashMap<u64, ViewRequest>,
    tx: Sender<StageEvent>,
    rx: Receiver<StageEvent>,
}

impl Default for Signals {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            navigation: Vec::new(),
            observers: Vec::new(),
            in_flight: HashMap::new(),
            tx,
            rx,
        }
    }
}

impl Signals {
    pub fn bind_navigation(&mut self, listener: impl FnMut(&NavigationEvent) + 'static) {
        self.navigation.push(Box::new(listener));
    }

    pub fn bind_view(&mut self, observer: impl ViewObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn trigger_navigation(&mut self, event: NavigationEvent) {
        for listener in &mut self.navigation {
            listener(&event);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn start(&mut self, request: ViewRequest) {
        let version = request.version;
        self.in_flight.insert(version, request);
        self.run_stage(version, 0, ViewResult::default());
    }

    fn run_stage(&mut self, version: u64, stage: usize, result: ViewResult) {
        let proceed = Proceed {
            version,
            stage,
            result,
            done: false,
            tx: self.tx.clone(),
        };

        match (self.observers.get_mut(stage), self.in_flight.get(&version)) {
            (Some(observer), Some(request)) => observer.on_view(request, proceed),
            // Past the last observer: the chain's own continuation completes the request.
            _ => proceed.proceed(),
        }
    }

    /// Advances every chain with pending continuations and returns finished requests.
    pub(crate) fn drain(&mut self) -> Vec<ChainEvent> {
        let mut events = Vec::new();
        loop {
            let event = match self.rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };

            match event {
                StageEvent::Proceeded {
                    version,
                    stage,
                    result,
                } => {
                    if stage >= self.observers.len() {
                        if let Some(request) = self.in_flight.remove(&version) {
                            events.push(ChainEvent::Completed { request, result });
                        }
                    } else {
                        debug!(version, stage, "view observer proceeded");
                        self.run_stage(version, stage + 1, result);
                    }
                }
                StageEvent::Dropped { version, stage } => {
                    warn!(version, stage, "view observer dropped its continuation");
                    self.in_flight.remove(&version);
                    events.push(ChainEvent::Abandoned { version, stage });
                }
            }
        }
        events
    }
}
