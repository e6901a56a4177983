use crate::entity::NodeMap;
use crate::geometry::Point;
use crate::properties::{Properties, PropertyDiff, PropertySet, PropertySetKind, PropertySource, diff};
use crate::render::EntityKind;
use crate::viewport::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighlightFlag {
    Selected,
    Highlighted,
    SecondaryHighlighted,
    Unhighlighted,
}

/// Evaluated top-down; the first set flag picks the property set.
const PRECEDENCE: [(HighlightFlag, PropertySetKind); 4] = [
    (HighlightFlag::Selected, PropertySetKind::Selected),
    (HighlightFlag::Highlighted, PropertySetKind::Highlight),
    (HighlightFlag::SecondaryHighlighted, PropertySetKind::SecondaryHighlight),
    (HighlightFlag::Unhighlighted, PropertySetKind::Unhighlight),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HighlightFlags {
    pub selected: bool,
    pub highlighted: bool,
    pub secondary_highlighted: bool,
    pub unhighlighted: bool,
}

impl HighlightFlags {
    pub fn is_set(&self, flag: HighlightFlag) -> bool {
        match flag {
            HighlightFlag::Selected => self.selected,
            HighlightFlag::Highlighted => self.highlighted,
            HighlightFlag::SecondaryHighlighted => self.secondary_highlighted,
            HighlightFlag::Unhighlighted => self.unhighlighted,
        }
    }

    pub fn active(&self) -> PropertySetKind {
        PRECEDENCE
            .iter()
            .find(|(flag, _)| self.is_set(*flag))
            .map(|(_, kind)| *kind)
            .unwrap_or(PropertySetKind::Normal)
    }
}

/// Flags plus the property set the backend was last told about.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightState {
    pub flags: HighlightFlags,
    pub rendered: Option<PropertySet>,
}

/// Shared highlight behaviour of nodes and edges.
///
/// Every transition re-resolves the current property set and returns the attribute diff
/// against what was last rendered, so callers can forward it to the backend untouched.
pub trait Highlightable {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn properties(&self) -> &Properties;
    fn properties_mut(&mut self) -> &mut Properties;
    fn highlight_state(&self) -> &HighlightState;
    fn highlight_state_mut(&mut self) -> &mut HighlightState;

    fn default_properties(&self) -> PropertySet;
    fn caption_position(&self, viewport: &Viewport, nodes: &NodeMap) -> Option<Point>;

    fn flags(&self) -> HighlightFlags {
        self.highlight_state().flags
    }

    fn current_properties(&self) -> &PropertySet {
        self.properties().get(self.flags().active())
    }

    /// Replaces all property sets and recomputes the fallback chain. Does not render.
    fn set_properties(&mut self, source: &PropertySource) {
        let resolved = Properties::resolve(source, &self.default_properties());
        *self.properties_mut() = resolved;
    }

    fn refresh_properties(&mut self) -> PropertyDiff {
        let next = self.current_properties().clone();
        let changes = diff(self.highlight_state().rendered.as_ref(), &next);
        self.highlight_state_mut().rendered = Some(next);
        changes
    }

    fn highlight(&mut self) -> PropertyDiff {
        self.highlight_state_mut().flags.highlighted = true;
        self.refresh_properties()
    }

    fn secondary_highlight(&mut self) -> PropertyDiff {
        self.highlight_state_mut().flags.secondary_highlighted = true;
        self.refresh_properties()
    }

    fn unhighlight(&mut self) -> PropertyDiff {
        self.highlight_state_mut().flags.unhighlighted = true;
        self.refresh_properties()
    }

    /// Clears `highlighted` and `secondary_highlighted` only.
    fn reset_highlight(&mut self) -> PropertyDiff {
        let flags = &mut self.highlight_state_mut().flags;
        flags.highlighted = false;
        flags.secondary_highlighted = false;
        self.refresh_properties()
    }

    fn select(&mut self) -> PropertyDiff {
        self.highlight_state_mut().flags.selected = true;
        self.refresh_properties()
    }

    fn unselect(&mut self) -> PropertyDiff {
        self.highlight_state_mut().flags.selected = false;
        self.refresh_properties()
    }

    fn rendered_radius(&self) -> f64 {
        self.highlight_state()
            .rendered
            .as_ref()
            .map_or_else(|| self.current_properties().radius(), PropertySet::radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_picks_the_strongest_flag() {
        let mut flags = HighlightFlags::default();
        assert_eq!(flags.active(), PropertySetKind::Normal);

        flags.unhighlighted = true;
        assert_eq!(flags.active(), PropertySetKind::Unhighlight);

        flags.secondary_highlighted = true;
        assert_eq!(flags.active(), PropertySetKind::SecondaryHighlight);

        flags.highlighted = true;
        assert_eq!(flags.active(), PropertySetKind::Highlight);

        flags.selected = true;
        assert_eq!(flags.active(), PropertySetKind::Selected);
    }
}
