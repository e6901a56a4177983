use serde::{Deserialize, Serialize};

use crate::render::{AttrChange, CaptionAttr, CaptionUpdate};

/// Partial style record. Absent attributes fall back along the property chain.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertySet {
    pub r: Option<f64>,
    pub fill: Option<String>,
    pub fill_opacity: Option<f64>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_opacity: Option<f64>,
    pub arrow_start: Option<String>,
    pub arrow_end: Option<String>,
    pub cursor: Option<String>,
    pub href: Option<String>,
    pub caption: Option<String>,
    pub font_color: Option<String>,
    pub font_size: Option<f64>,
    pub cluster: Option<serde_json::Value>,
}

impl PropertySet {
    /// Fills every attribute missing from `self` with the one from `fallback`.
    pub fn or(mut self, fallback: &Self) -> Self {
        fn fill<T: Clone>(slot: &mut Option<T>, fallback: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(fallback);
            }
        }

        fill(&mut self.r, &fallback.r);
        fill(&mut self.fill, &fallback.fill);
        fill(&mut self.fill_opacity, &fallback.fill_opacity);
        fill(&mut self.stroke, &fallback.stroke);
        fill(&mut self.stroke_width, &fallback.stroke_width);
        fill(&mut self.stroke_opacity, &fallback.stroke_opacity);
        fill(&mut self.arrow_start, &fallback.arrow_start);
        fill(&mut self.arrow_end, &fallback.arrow_end);
        fill(&mut self.cursor, &fallback.cursor);
        fill(&mut self.href, &fallback.href);
        fill(&mut self.caption, &fallback.caption);
        fill(&mut self.font_color, &fallback.font_color);
        fill(&mut self.font_size, &fallback.font_size);
        fill(&mut self.cluster, &fallback.cluster);
        self
    }

    pub fn radius(&self) -> f64 {
        self.r.unwrap_or(0.0)
    }

    fn visible_caption(&self) -> Option<&str> {
        self.caption.as_deref().filter(|caption| !caption.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertySetKind {
    Normal,
    Highlight,
    SecondaryHighlight,
    Unhighlight,
    Selected,
}

/// Property sets as delivered by the data source, before fallback resolution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertySource {
    pub normal: Option<PropertySet>,
    pub highlight: Option<PropertySet>,
    pub secondary_highlight: Option<PropertySet>,
    pub unhighlight: Option<PropertySet>,
    pub selected: Option<PropertySet>,
}

impl PropertySource {
    pub fn normal(set: PropertySet) -> Self {
        Self {
            normal: Some(set),
            ..Self::default()
        }
    }
}

/// Fully resolved property sets of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Properties {
    pub normal: PropertySet,
    pub highlight: PropertySet,
    pub secondary_highlight: PropertySet,
    pub unhighlight: PropertySet,
    pub selected: PropertySet,
}

impl Properties {
    pub fn resolve(source: &PropertySource, defaults: &PropertySet) -> Self {
        let mut normal = source.normal.clone().unwrap_or_default();
        if normal.fill_opacity.is_none() {
            normal.fill_opacity = Some(1.0);
        }
        let normal = normal.or(defaults);
        let highlight = source.highlight.clone().unwrap_or_default().or(&normal);
        let secondary_highlight = source
            .secondary_highlight
            .clone()
            .unwrap_or_default()
            .or(&highlight);
        let unhighlight = source.unhighlight.clone().unwrap_or_default().or(&normal);
        let selected = source.selected.clone().unwrap_or_default().or(&highlight);

        Self {
            normal,
            highlight,
            secondary_highlight,
            unhighlight,
            selected,
        }
    }

    pub fn get(&self, kind: PropertySetKind) -> &PropertySet {
        match kind {
            PropertySetKind::Normal => &self.normal,
            PropertySetKind::Highlight => &self.highlight,
            PropertySetKind::SecondaryHighlight => &self.secondary_highlight,
            PropertySetKind::Unhighlight => &self.unhighlight,
            PropertySetKind::Selected => &self.selected,
        }
    }
}

/// Attribute changes between the last rendered set and the next one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyDiff {
    pub attrs: Vec<AttrChange>,
    pub caption: Option<CaptionUpdate>,
}

impl PropertyDiff {
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.caption.is_none()
    }
}

pub fn diff(previous: Option<&PropertySet>, next: &PropertySet) -> PropertyDiff {
    let blank = PropertySet::default();
    let prev = previous.unwrap_or(&blank);
    let mut attrs = Vec::new();

    if next.r != prev.r
        && let Some(r) = next.r
    {
        attrs.push(AttrChange::Radius(r));
    }
    if next.fill != prev.fill
        && let Some(fill) = &next.fill
    {
        attrs.push(AttrChange::Fill(fill.clone()));
    }
    if next.fill_opacity != prev.fill_opacity
        && let Some(opacity) = next.fill_opacity
    {
        attrs.push(AttrChange::FillOpacity(opacity));
    }
    if next.stroke != prev.stroke
        && let Some(stroke) = &next.stroke
    {
        attrs.push(AttrChange::Stroke(stroke.clone()));
    }
    if next.stroke_width != prev.stroke_width
        && let Some(width) = next.stroke_width
    {
        attrs.push(AttrChange::StrokeWidth(width));
    }
    if next.stroke_opacity != prev.stroke_opacity
        && let Some(opacity) = next.stroke_opacity
    {
        attrs.push(AttrChange::StrokeOpacity(opacity));
    }
    if next.arrow_start != prev.arrow_start {
        attrs.push(AttrChange::ArrowStart(next.arrow_start.clone()));
    }
    if next.arrow_end != prev.arrow_end {
        attrs.push(AttrChange::ArrowEnd(next.arrow_end.clone()));
    }
    if next.cursor != prev.cursor
        && let Some(cursor) = &next.cursor
    {
        attrs.push(AttrChange::Cursor(cursor.clone()));
    }
    if next.href != prev.href {
        attrs.push(AttrChange::Href(next.href.clone()));
    }

    PropertyDiff {
        attrs,
        caption: diff_caption(previous, next),
    }
}

fn diff_caption(previous: Option<&PropertySet>, next: &PropertySet) -> Option<CaptionUpdate> {
    let previous_caption = previous.and_then(PropertySet::visible_caption);
    let fresh = previous.is_none_or(|prev| prev.caption.is_none());

    if fresh || previous.is_some_and(|prev| prev.caption != next.caption) {
        return match next.visible_caption() {
            Some(text) => Some(CaptionUpdate::Set {
                text: text.to_owned(),
                attrs: caption_attrs(None, next),
            }),
            None if previous_caption.is_some() => Some(CaptionUpdate::Removed),
            None => None,
        };
    }

    previous_caption?;
    let attrs = caption_attrs(previous, next);
    if attrs.is_empty() {
        None
    } else {
        Some(CaptionUpdate::Attrs(attrs))
    }
}

fn caption_attrs(previous: Option<&PropertySet>, next: &PropertySet) -> Vec<CaptionAttr> {
    let blank = PropertySet::default();
    let fresh = previous.is_none();
    let prev = previous.unwrap_or(&blank);
    let mut attrs = Vec::new();

    if (fresh || next.font_color != prev.font_color)
        && let Some(color) = &next.font_color
    {
        attrs.push(CaptionAttr::FontColor(color.clone()));
    }
    if (fresh || next.fill_opacity != prev.fill_opacity)
        && let Some(opacity) = next.fill_opacity
    {
        attrs.push(CaptionAttr::FillOpacity(opacity));
    }
    if fresh || next.href != prev.href {
        attrs.push(CaptionAttr::Href(next.href.clone()));
    }
    if (fresh || next.font_size != prev.font_size)
        && let Some(size) = next.font_size
    {
        attrs.push(CaptionAttr::FontSize(size));
    }
    if (fresh || next.cursor != prev.cursor)
        && let Some(cursor) = &next.cursor
    {
        attrs.push(CaptionAttr::Cursor(cursor.clone()));
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> PropertySet {
        PropertySet {
            r: Some(5.0),
            fill: Some("#333".to_owned()),
            cursor: Some("pointer".to_owned()),
            ..PropertySet::default()
        }
    }

    #[test]
    fn fallback_chain_resolves_every_set() {
        let source = PropertySource {
            normal: Some(PropertySet {
                fill: Some("red".to_owned()),
                ..PropertySet::default()
            }),
            highlight: Some(PropertySet {
                r: Some(8.0),
                ..PropertySet::default()
            }),
            unhighlight: Some(PropertySet {
                fill_opacity: Some(0.2),
                ..PropertySet::default()
            }),
            ..PropertySource::default()
        };
        let properties = Properties::resolve(&source, &defaults());

        assert_eq!(properties.normal.fill.as_deref(), Some("red"));
        assert_eq!(properties.normal.r, Some(5.0));
        assert_eq!(properties.normal.fill_opacity, Some(1.0));
        assert_eq!(properties.highlight.r, Some(8.0));
        assert_eq!(properties.highlight.fill.as_deref(), Some("red"));
        assert_eq!(properties.secondary_highlight.r, Some(8.0));
        assert_eq!(properties.selected.r, Some(8.0));
        assert_eq!(properties.unhighlight.r, Some(5.0));
        assert_eq!(properties.unhighlight.fill_opacity, Some(0.2));
    }

    #[test]
    fn diff_reports_only_changed_attributes() {
        let before = PropertySet {
            r: Some(5.0),
            fill: Some("#333".to_owned()),
            caption: Some("a".to_owned()),
            font_color: Some("black".to_owned()),
            ..PropertySet::default()
        };
        let after = PropertySet {
            r: Some(9.0),
            font_color: Some("blue".to_owned()),
            ..before.clone()
        };

        let changes = diff(Some(&before), &after);
        assert_eq!(changes.attrs, vec![AttrChange::Radius(9.0)]);
        assert_eq!(
            changes.caption,
            Some(CaptionUpdate::Attrs(vec![CaptionAttr::FontColor(
                "blue".to_owned()
            )]))
        );
        assert!(diff(Some(&after), &after).is_empty());
    }

    #[test]
    fn first_render_creates_caption_with_all_attributes() {
        let set = PropertySet {
            caption: Some("hub".to_owned()),
            font_size: Some(12.0),
            ..PropertySet::default()
        };

        let changes = diff(None, &set);
        assert_eq!(
            changes.caption,
            Some(CaptionUpdate::Set {
                text: "hub".to_owned(),
                attrs: vec![CaptionAttr::Href(None), CaptionAttr::FontSize(12.0)],
            })
        );
    }

    #[test]
    fn clearing_a_caption_removes_it() {
        let before = PropertySet {
            caption: Some("hub".to_owned()),
            ..PropertySet::default()
        };
        let after = PropertySet::default();

        assert_eq!(
            diff(Some(&before), &after).caption,
            Some(CaptionUpdate::Removed)
        );
        assert_eq!(diff(Some(&after), &after).caption, None);
    }

    #[test]
    fn arrows_are_cleared_explicitly() {
        let before = PropertySet {
            arrow_end: Some("classic".to_owned()),
            ..PropertySet::default()
        };

        let changes = diff(Some(&before), &PropertySet::default());
        assert_eq!(changes.attrs, vec![AttrChange::ArrowEnd(None)]);
    }

    #[test]
    fn property_source_reads_camel_case_json() {
        let source: PropertySource = serde_json::from_str(
            r##"{"normal": {"fillOpacity": 0.5, "caption": "x", "cluster": 3},
                 "secondaryHighlight": {"strokeWidth": 2}}"##,
        )
        .unwrap();

        let normal = source.normal.unwrap();
        assert_eq!(normal.fill_opacity, Some(0.5));
        assert_eq!(normal.cluster, Some(serde_json::json!(3)));
        assert_eq!(source.secondary_highlight.unwrap().stroke_width, Some(2.0));
    }
}
