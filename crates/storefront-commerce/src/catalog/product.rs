//! Catalog product shape as delivered by the backend.
//!
//! Every field is optional: listings, detail pages and legacy feeds all send
//! different subsets, and the cart has to work with whatever arrives.

use crate::catalog::{PriceAdjustments, VariantAttribute};
use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A price as sent by the catalog: either a flat number or a nested
/// current/old pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    /// `"price": 19.99`
    Flat(f64),
    /// `"price": { "current": 19.99, "old": 24.99 }`
    Nested(NestedPrice),
}

/// Nested current/old price pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedPrice {
    /// Current selling price.
    pub current: Option<f64>,
    /// Previous price, shown struck through.
    pub old: Option<f64>,
}

impl PriceField {
    /// The current price, if this field carries one.
    pub fn current(&self) -> Option<f64> {
        match self {
            PriceField::Flat(price) => Some(*price),
            PriceField::Nested(nested) => nested.current,
        }
    }

    /// The nested current price only (not the flat form).
    pub fn nested_current(&self) -> Option<f64> {
        match self {
            PriceField::Flat(_) => None,
            PriceField::Nested(nested) => nested.current,
        }
    }

    /// The flat price only (not the nested form).
    pub fn flat(&self) -> Option<f64> {
        match self {
            PriceField::Flat(price) => Some(*price),
            PriceField::Nested(_) => None,
        }
    }

    /// The old price, if any.
    pub fn old(&self) -> Option<f64> {
        match self {
            PriceField::Flat(_) => None,
            PriceField::Nested(nested) => nested.old,
        }
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    /// Catalog identifier.
    pub id: Option<String>,
    /// URL-friendly slug.
    pub slug: Option<String>,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Display title.
    pub title: Option<String>,
    /// Alternative title field used by older feeds.
    pub name: Option<String>,
    /// Explicit image URL.
    pub image: Option<String>,
    /// Gallery image URLs.
    pub images: Vec<String>,
    /// Explicit base-currency price.
    #[serde(alias = "priceBase")]
    pub base_price: Option<f64>,
    /// Flat or nested price.
    pub price: Option<PriceField>,
    /// Unit price field used by some feeds.
    pub unit_price: Option<f64>,
    /// Selectable variant dimensions, in display order.
    pub attributes: Vec<VariantAttribute>,
    /// Per-attribute price deltas.
    pub adjustments: PriceAdjustments,
    /// Units in stock, when known.
    pub stock: Option<i64>,
}

impl Product {
    /// Create a product with an id, a title and a flat base price.
    pub fn new(id: impl Into<String>, title: impl Into<String>, price: f64) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            base_price: Some(price),
            ..Default::default()
        }
    }

    /// Add a variant attribute.
    pub fn with_attribute(mut self, attribute: VariantAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a price delta for an attribute value.
    pub fn with_adjustment(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        delta: f64,
    ) -> Self {
        self.adjustments.insert(key, value, delta);
        self
    }

    /// Set the old price, shown struck through.
    pub fn with_old_price(mut self, old: f64) -> Self {
        let current = self.price.and_then(|p| p.current());
        self.price = Some(PriceField::Nested(NestedPrice {
            current,
            old: Some(old),
        }));
        self
    }

    /// Set the stock level.
    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Natural identity: `id`, then `slug`, then `sku`.
    ///
    /// Returns `None` when the product has no usable identifier.
    pub fn natural_id(&self) -> Option<ProductId> {
        [&self.id, &self.slug, &self.sku]
            .into_iter()
            .find_map(|field| non_empty(field.as_deref()))
            .map(ProductId::new)
    }

    /// Display title: `title`, then `name`.
    pub fn display_title(&self) -> Option<&str> {
        non_empty(self.title.as_deref()).or_else(|| non_empty(self.name.as_deref()))
    }

    /// Primary image: explicit image, then the first gallery image.
    pub fn primary_image(&self) -> Option<&str> {
        non_empty(self.image.as_deref())
            .or_else(|| non_empty(self.images.first().map(String::as_str)))
    }

    /// Base price before variant adjustments.
    ///
    /// Resolution order: explicit base price, nested current price, flat
    /// price, unit price. Missing or non-finite prices resolve to zero.
    pub fn base_price(&self) -> Money {
        let candidates = [
            self.base_price,
            self.price.and_then(|p| p.nested_current()),
            self.price.and_then(|p| p.flat()),
            self.unit_price,
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|p| p.is_finite())
            .map(Money::from_decimal)
            .unwrap_or_default()
    }

    /// Old price for strike-through display.
    pub fn compare_at_price(&self) -> Option<Money> {
        self.price
            .and_then(|p| p.old())
            .filter(|p| p.is_finite())
            .map(Money::from_decimal)
    }

    /// Quantity ceiling derived from the stock level.
    ///
    /// A known stock never caps below one unit, since a line always holds at
    /// least one.
    pub fn stock_ceiling(&self) -> Option<u32> {
        self.stock
            .map(|stock| u32::try_from(stock.max(1)).unwrap_or(u32::MAX))
    }

    /// Find an attribute by key.
    pub fn attribute(&self, key: &str) -> Option<&VariantAttribute> {
        self.attributes.iter().find(|a| a.key == key)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
