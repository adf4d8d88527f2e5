//! Declarative layer filters derived from the current selection.
//!
//! Filters are plain values: every change of the pano toggle or the selected
//! sequence rebuilds them from scratch through [`build_filters`], and the
//! result is pushed to every imagery layer.

use foundation::{ImageFeature, SequenceId};
use serde_json::{Value, json};

/// Feature properties a filter can test.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FeatureProperty {
    Id,
    SequenceId,
    IsPano,
}

impl FeatureProperty {
    /// Property name as carried by the vector tiles.
    pub fn key(self) -> &'static str {
        match self {
            FeatureProperty::Id => "id",
            FeatureProperty::SequenceId => "sequence_id",
            FeatureProperty::IsPano => "is_pano",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Str(String),
}

impl PropertyValue {
    fn to_json(&self) -> Value {
        match self {
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Str(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    MatchAll,
    Eq(FeatureProperty, PropertyValue),
    All(Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn eq_str(property: FeatureProperty, value: impl Into<String>) -> Self {
        FilterExpr::Eq(property, PropertyValue::Str(value.into()))
    }

    pub fn eq_bool(property: FeatureProperty, value: bool) -> Self {
        FilterExpr::Eq(property, PropertyValue::Bool(value))
    }

    /// Conjunction; match-all members are dropped and a single survivor is
    /// returned unwrapped.
    pub fn all(exprs: impl IntoIterator<Item = FilterExpr>) -> Self {
        let mut out: Vec<FilterExpr> = Vec::new();
        for e in exprs {
            match e {
                FilterExpr::MatchAll => {}
                FilterExpr::All(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => FilterExpr::MatchAll,
            1 => out.remove(0),
            _ => FilterExpr::All(out),
        }
    }

    pub fn and(self, other: FilterExpr) -> Self {
        FilterExpr::all([self, other])
    }

    pub fn matches(&self, feature: &ImageFeature) -> bool {
        match self {
            FilterExpr::MatchAll => true,
            FilterExpr::Eq(property, value) => match (property, value) {
                (FeatureProperty::Id, PropertyValue::Str(s)) => feature.id == *s,
                (FeatureProperty::SequenceId, PropertyValue::Str(s)) => {
                    feature.sequence_id.as_str() == s
                }
                (FeatureProperty::IsPano, PropertyValue::Bool(b)) => feature.is_pano == *b,
                // Type mismatch never matches, same as the map engines' `==`.
                _ => false,
            },
            FilterExpr::All(exprs) => exprs.iter().all(|e| e.matches(feature)),
        }
    }

    /// MapLibre-style expression, e.g. `["==", ["get", "is_pano"], true]`.
    pub fn to_json(&self) -> Value {
        match self {
            FilterExpr::MatchAll => Value::Bool(true),
            FilterExpr::Eq(property, value) => {
                json!(["==", ["get", property.key()], value.to_json()])
            }
            FilterExpr::All(exprs) => {
                let mut items = vec![Value::String("all".to_string())];
                items.extend(exprs.iter().map(FilterExpr::to_json));
                Value::Array(items)
            }
        }
    }
}

/// Process-wide filter toggles, changed only by explicit user action.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub panos_only: bool,
}

impl FilterConfig {
    pub fn toggle_panos_only(&mut self) -> bool {
        self.panos_only = !self.panos_only;
        self.panos_only
    }
}

/// Filters for the unfiltered imagery layers (`base`) and the highlighted
/// image layer (`highlight`).
#[derive(Debug, Clone, PartialEq)]
pub struct LayerFilters {
    pub base: FilterExpr,
    pub highlight: FilterExpr,
}

/// Sequence id that no real feature carries.
pub const NO_SEQUENCE_SENTINEL: &str = "";

pub fn build_filters(panos_only: bool, selected: Option<&SequenceId>) -> LayerFilters {
    let base = if panos_only {
        FilterExpr::eq_bool(FeatureProperty::IsPano, true)
    } else {
        FilterExpr::MatchAll
    };

    let selected = selected.map_or(NO_SEQUENCE_SENTINEL, SequenceId::as_str);
    let highlight = base
        .clone()
        .and(FilterExpr::eq_str(FeatureProperty::SequenceId, selected));

    LayerFilters { base, highlight }
}
