use std::time::{Duration, Instant};

use tracing::debug;

use crate::geometry::Rect;
use crate::signals::{ViewRequest, ViewResult};

/// Delay between a fetch completing and its result being applied, and the retry interval
/// while a reconciliation is running.
pub const APPLY_DELAY: Duration = Duration::from_millis(50);
/// Retry interval of a delayed refresh while a fetch is still loading.
pub const DELAYED_REFRESH_RETRY: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct PendingApply {
    pub request: ViewRequest,
    pub result: ViewResult,
    pub apply_at: Instant,
}

/// Versioned refresh bookkeeping. Holds no entities, only decides what gets applied when.
#[derive(Debug, Default)]
pub struct SyncEngine {
    data_version: u64,
    requested_version: u64,
    building: bool,
    loading: bool,
    delayed_at: Option<Instant>,
    pending: Vec<PendingApply>,
}

impl SyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_version(&self) -> u64 {
        self.data_version
    }

    pub fn requested_version(&self) -> u64 {
        self.requested_version
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_building(&self) -> bool {
        self.building
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || self.delayed_at.is_some()
    }

    /// Earliest instant at which `poll` has something to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .iter()
            .map(|entry| entry.apply_at)
            .chain(self.delayed_at)
            .min()
    }

    pub fn next_request(
        &mut self,
        rect: Rect,
        node_selection: Vec<String>,
        edge_selection: Vec<String>,
        selection_changed: bool,
    ) -> ViewRequest {
        self.loading = true;
        self.requested_version += 1;
        debug!(
            version = self.requested_version,
            selection_changed, "issuing view request"
        );
        ViewRequest {
            version: self.requested_version,
            rect,
            node_selection,
            edge_selection,
            selection_changed,
        }
    }

    pub fn enqueue(&mut self, request: ViewRequest, result: ViewResult, now: Instant) {
        debug!(
            version = request.version,
            nodes = result.nodes.len(),
            edges = result.edges.len(),
            "view result queued"
        );
        self.pending.push(PendingApply {
            request,
            result,
            apply_at: now + APPLY_DELAY,
        });
    }

    /// A chain was abandoned; only the newest request holds the loading flag.
    pub fn abandon(&mut self, version: u64) {
        if version == self.requested_version {
            self.loading = false;
        }
    }

    /// Pops the result to apply at `now`, if any.
    ///
    /// Due entries older than the applied version are dropped. While a reconciliation is
    /// running every due entry is pushed back by [`APPLY_DELAY`]. Otherwise the newest due
    /// entry wins and older due entries are dropped, since applying them would be undone
    /// right away.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingApply> {
        let (mut due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|entry| entry.apply_at <= now);
        self.pending = waiting;

        due.retain(|entry| {
            let fresh = entry.request.version >= self.data_version;
            if !fresh {
                debug!(
                    version = entry.request.version,
                    data_version = self.data_version,
                    "discarding stale view result"
                );
            }
            fresh
        });
        if due.is_empty() {
            return None;
        }

        if self.is_building() {
            for mut entry in due {
                entry.apply_at = now + APPLY_DELAY;
                self.pending.push(entry);
            }
            return None;
        }

        due.sort_by_key(|entry| entry.request.version);
        let newest = due.pop()?;
        for superseded in &due {
            debug!(
                version = superseded.request.version,
                newer = newest.request.version,
                "discarding superseded view result"
            );
        }
        Some(newest)
    }

    pub fn begin_apply(&mut self, version: u64) {
        self.building = true;
        self.data_version = version;
    }

    pub fn finish_apply(&mut self) {
        self.building = false;
        self.loading = false;
    }

    /// Requests a coalesced refresh. Returns `true` when the caller should refresh now.
    pub fn refresh_delayed(&mut self, now: Instant) -> bool {
        if self.delayed_at.is_some() {
            return false;
        }
        if !self.loading {
            return true;
        }
        self.delayed_at = Some(now + DELAYED_REFRESH_RETRY);
        false
    }

    /// Returns `true` when a pending delayed refresh should run now.
    pub fn poll_delayed(&mut self, now: Instant) -> bool {
        match self.delayed_at {
            Some(at) if at <= now => {
                if self.loading {
                    self.delayed_at = Some(now + DELAYED_REFRESH_RETRY);
                    false
                } else {
                    self.delayed_at = None;
                    true
                }
            }
            _ => false,
        }
    }
}
