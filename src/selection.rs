/// Ordered, duplicate-free id set with an optional cap. Oldest entries are evicted first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<String>,
    max: Option<usize>,
}

impl SelectionSet {
    pub fn new(max: Option<usize>) -> Self {
        Self {
            ids: Vec::new(),
            max,
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn toggle(&mut self, id: &str) {
        if let Some(index) = self.ids.iter().position(|existing| existing == id) {
            self.ids.remove(index);
            return;
        }

        self.ids.push(id.to_owned());
        if let Some(max) = self.max
            && self.ids.len() > max
        {
            let excess = self.ids.len() - max;
            self.ids.drain(..excess);
        }
    }

    /// Replaces the contents, dropping duplicates and keeping the newest ids within the cap.
    pub fn replace<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.clear();
        for id in ids {
            let id = id.into();
            if !self.contains(&id) {
                self.ids.push(id);
            }
        }
        if let Some(max) = self.max
            && self.ids.len() > max
        {
            let excess = self.ids.len() - max;
            self.ids.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// Membership changes between two snapshots of a selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionDelta {
    pub selected: Vec<String>,
    pub unselected: Vec<String>,
}

impl SelectionDelta {
    pub fn between(previous: &[String], current: &[String]) -> Self {
        Self {
            selected: current
                .iter()
                .filter(|id| !previous.contains(*id))
                .cloned()
                .collect(),
            unselected: previous
                .iter()
                .filter(|id| !current.contains(*id))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.unselected.is_empty()
    }
}

/// Node and edge selections plus the snapshots last pushed to entity flags.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    pub nodes: SelectionSet,
    pub edges: SelectionSet,
    last_nodes: Vec<String>,
    last_edges: Vec<String>,
}

impl Selection {
    pub fn new(max_nodes: Option<usize>, max_edges: Option<usize>) -> Self {
        Self {
            nodes: SelectionSet::new(max_nodes),
            edges: SelectionSet::new(max_edges),
            last_nodes: Vec::new(),
            last_edges: Vec::new(),
        }
    }

    /// Diffs both sets against the previous snapshot and takes a new snapshot.
    pub fn take_deltas(&mut self) -> (SelectionDelta, SelectionDelta) {
        let nodes = SelectionDelta::between(&self.last_nodes, self.nodes.ids());
        let edges = SelectionDelta::between(&self.last_edges, self.edges.ids());
        self.last_nodes = self.nodes.ids().to_vec();
        self.last_edges = self.edges.ids().to_vec();
        (nodes, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_evicts_oldest_beyond_cap() {
        let mut set = SelectionSet::new(Some(2));
        set.toggle("A");
        set.toggle("B");
        set.toggle("C");

        assert_eq!(set.ids(), ["B", "C"]);
    }

    #[test]
    fn toggle_removes_present_ids() {
        let mut set = SelectionSet::new(None);
        set.toggle("A");
        set.toggle("B");
        set.toggle("A");

        assert_eq!(set.ids(), ["B"]);
        assert!(!set.contains("A"));
    }

    #[test]
    fn replace_deduplicates_and_caps() {
        let mut set = SelectionSet::new(Some(2));
        set.replace(["x", "y", "x", "z"]);

        assert_eq!(set.ids(), ["y", "z"]);
    }

    #[test]
    fn deltas_only_report_changes() {
        let mut selection = Selection::new(None, None);
        selection.nodes.replace(["a", "b"]);
        let (nodes, edges) = selection.take_deltas();
        assert_eq!(nodes.selected, ["a", "b"]);
        assert!(edges.is_empty());

        selection.nodes.replace(["b", "c"]);
        let (nodes, _) = selection.take_deltas();
        assert_eq!(nodes.selected, ["c"]);
        assert_eq!(nodes.unselected, ["a"]);

        let (nodes, _) = selection.take_deltas();
        assert!(nodes.is_empty());
    }
}
