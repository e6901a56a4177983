use eframe::egui::{RichText, Ui};
use netview::{Highlightable, Node, PropertySet};

use super::super::ViewModel;

fn flag_labels(node: &Node) -> Vec<&'static str> {
    let flags = node.flags();
    [
        (flags.selected, "selected"),
        (flags.highlighted, "highlighted"),
        (flags.secondary_highlighted, "secondary"),
        (flags.unhighlighted, "dimmed"),
    ]
    .into_iter()
    .filter_map(|(set, label)| set.then_some(label))
    .collect()
}

fn property_rows(properties: &PropertySet) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    let mut push = |name, value: Option<String>| {
        if let Some(value) = value {
            rows.push((name, value));
        }
    };
    push("r", properties.r.map(|r| format!("{r:.1}")));
    push("fill", properties.fill.clone());
    push("stroke", properties.stroke.clone());
    push("stroke width", properties.stroke_width.map(|w| format!("{w:.1}")));
    push("caption", properties.caption.clone());
    push("href", properties.href.clone());
    push("cluster", properties.cluster.as_ref().map(ToString::to_string));
    rows
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Node Details");
        ui.add_space(6.0);

        let focus = self
            .network
            .hovered()
            .or_else(|| self.network.selection().first().map(String::as_str));
        let Some(node) = focus.and_then(|id| self.network.node(id)) else {
            ui.label("Hover or select a node in the view.");
            return;
        };

        ui.label(RichText::new(node.id.as_str()).strong());
        let screen = node.screen_pos(self.network.viewport());
        ui.label(format!("logical: {}", node.pos));
        ui.label(format!("screen: ({:.0}, {:.0})", screen.x, screen.y));
        ui.label(format!("edges on screen: {}", node.edges.len()));

        let flags = flag_labels(node);
        if !flags.is_empty() {
            ui.label(format!("state: {}", flags.join(", ")));
        }

        ui.separator();
        ui.label(RichText::new("Current properties").strong());
        for (name, value) in property_rows(node.current_properties()) {
            ui.horizontal(|ui| {
                ui.label(format!("{name}:"));
                ui.monospace(value);
            });
        }

        if !node.edges.is_empty() {
            ui.separator();
            ui.label(RichText::new("Neighbours").strong());
            for edge_id in node.edges.iter().take(24) {
                let Some(edge) = self.network.edge(edge_id) else {
                    continue;
                };
                ui.small(format!(
                    "{} {} {}",
                    edge.from,
                    edge.direction.symbol(),
                    edge.to
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netview::{Point, PropertySource};

    #[test]
    fn property_rows_skip_missing_values() {
        let node = Node::new(
            "n",
            Point::ZERO,
            &PropertySource::normal(PropertySet {
                caption: Some("N".to_owned()),
                ..PropertySet::default()
            }),
        );

        let rows = property_rows(node.current_properties());
        assert!(rows.iter().any(|(name, value)| *name == "caption" && value == "N"));
        assert!(rows.iter().all(|(name, _)| *name != "href"));
        assert!(flag_labels(&node).is_empty());
    }
}
