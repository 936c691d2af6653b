//! Variant attributes, attribute selection and price adjustments.

use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Separator between `key=value` pairs in a variant key.
pub const VARIANT_SEPARATOR: &str = "|";

/// How an attribute is presented for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Colour or image swatches.
    Swatch,
    /// Drop-down or button group.
    #[default]
    Select,
}

/// One selectable dimension of a product (e.g. `storage`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantAttribute {
    /// Attribute key (e.g. "storage").
    pub key: String,
    /// Display label (e.g. "Storage").
    pub label: String,
    /// Presentation kind.
    pub kind: AttributeKind,
    /// Allowed values, in display order.
    pub values: Vec<String>,
    /// Whether a value must be chosen before the product can be added.
    pub required: bool,
}

impl VariantAttribute {
    pub fn new(key: impl Into<String>, kind: AttributeKind) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            kind,
            values: Vec::new(),
            required: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Price deltas: attribute key → value → delta in base-currency major units.
///
/// Deltas may be zero or negative; a missing entry counts as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceAdjustments(HashMap<String, HashMap<String, f64>>);

impl PriceAdjustments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delta for one attribute value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>, delta: f64) {
        self.0
            .entry(key.into())
            .or_default()
            .insert(value.into(), delta);
    }

    /// Delta for a selected value; zero when missing or not finite.
    pub fn delta(&self, key: &str, value: &str) -> Money {
        self.0
            .get(key)
            .and_then(|values| values.get(value))
            .map(|delta| Money::from_decimal(*delta))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Selected attribute values, in a stable order.
///
/// Order is insertion order, so a given call site always produces the same
/// variant key. An empty value means "unselected".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    entries: Vec<(String, String)>,
}

impl Selection {
    /// An empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// One unselected entry per attribute of the product, in product order.
    pub fn for_attributes(attributes: &[VariantAttribute]) -> Self {
        Self {
            entries: attributes
                .iter()
                .map(|a| (a.key.clone(), String::new()))
                .collect(),
        }
    }

    /// Builder form of [`Selection::select`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.select(key, value);
        self
    }

    /// Choose a value for an attribute.
    ///
    /// An existing entry keeps its position; a new key is appended.
    pub fn select(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into().trim().to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Reset an attribute to unselected.
    pub fn unselect(&mut self, key: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1.clear();
        }
    }

    /// Selected value for an attribute, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    /// Pairs with a non-empty value, in selection order.
    pub fn selected(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical variant key: `key=value` pairs joined by [`VARIANT_SEPARATOR`].
    ///
    /// Empty when nothing is selected.
    pub fn variant_key(&self) -> String {
        encode_variant_key(self.selected())
    }

    /// Keys of required attributes without a selected value.
    pub fn missing_required(&self, attributes: &[VariantAttribute]) -> Vec<String> {
        attributes
            .iter()
            .filter(|a| a.required && self.get(&a.key).is_none())
            .map(|a| a.key.clone())
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Selection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for (k, v) in iter {
            selection.select(k, v);
        }
        selection
    }
}

pub(crate) fn encode_variant_key<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(VARIANT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone_attributes() -> Vec<VariantAttribute> {
        vec![
            VariantAttribute::new("color", AttributeKind::Swatch).with_values(["black", "white"]),
            VariantAttribute::new("storage", AttributeKind::Select)
                .with_values(["128GB", "256GB"])
                .required(),
        ]
    }

    #[test]
    fn test_selection_for_attributes_starts_unselected() {
        let selection = Selection::for_attributes(&phone_attributes());
        assert_eq!(selection.variant_key(), "");
        assert_eq!(selection.missing_required(&phone_attributes()), vec!["storage"]);
    }

    #[test]
    fn test_variant_key_keeps_selection_order() {
        let mut selection = Selection::for_attributes(&phone_attributes());
        selection.select("storage", "256GB");
        selection.select("color", "black");
        assert_eq!(selection.variant_key(), "color=black|storage=256GB");

        let other: Selection = [("storage", "256GB"), ("color", "black")].into_iter().collect();
        assert_eq!(other.variant_key(), "storage=256GB|color=black");
    }

    #[test]
    fn test_unselect_clears_value() {
        let mut selection = Selection::new().with("color", "white");
        selection.unselect("color");
        assert_eq!(selection.get("color"), None);
        assert_eq!(selection.variant_key(), "");
    }

    #[test]
    fn test_adjustment_lookup() {
        let mut adjustments = PriceAdjustments::new();
        adjustments.insert("storage", "256GB", 100.0);
        adjustments.insert("color", "gold", -5.5);
        assert_eq!(adjustments.delta("storage", "256GB"), Money::new(10_000));
        assert_eq!(adjustments.delta("color", "gold"), Money::new(-550));
        assert_eq!(adjustments.delta("storage", "1TB"), Money::zero());
    }

    #[test]
    fn test_attribute_deserializes_with_defaults() {
        let attr: VariantAttribute =
            serde_json::from_str(r#"{"key": "size", "kind": "swatch", "values": ["S", "M"]}"#)
                .unwrap();
        assert_eq!(attr.kind, AttributeKind::Swatch);
        assert!(!attr.required);
        assert_eq!(attr.values, vec!["S", "M"]);
    }
}
