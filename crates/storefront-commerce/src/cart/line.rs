//! Order lines, their identity, and normalization from the input shapes the
//! UI and storage hand us.

use crate::cart::price_for;
use crate::catalog::{encode_variant_key, PriceField, Product, Selection};
use crate::ids::{LineId, ProductId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Title used when the input has none.
pub const UNTITLED: &str = "Untitled";

/// Image used when the input has none.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

/// One row in the cart.
///
/// Only [`normalize`] builds lines, so every line satisfies `qty >= 1`, a
/// non-empty title and a non-negative unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    line_id: LineId,
    product_id: ProductId,
    variant_key: String,
    title: String,
    image: String,
    unit_price_base: Money,
    compare_at_price_base: Option<Money>,
    qty: u32,
    max_qty: Option<u32>,
}

impl OrderLine {
    /// Deterministic identity of this line.
    pub fn line_id(&self) -> &LineId {
        &self.line_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Canonical selected-attribute encoding; empty for no variant.
    pub fn variant_key(&self) -> &str {
        &self.variant_key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Unit price in the base currency.
    pub fn unit_price(&self) -> Money {
        self.unit_price_base
    }

    /// Prior price for strike-through display. Not used in totals.
    pub fn compare_at_price(&self) -> Option<Money> {
        self.compare_at_price_base
    }

    pub fn qty(&self) -> u32 {
        self.qty
    }

    /// Stock ceiling for this line, when known.
    pub fn max_qty(&self) -> Option<u32> {
        self.max_qty
    }

    /// `unit_price × qty`, derived on every read.
    pub fn line_subtotal(&self) -> Money {
        self.unit_price_base.multiply(i64::from(self.qty))
    }

    pub(crate) fn set_qty(&mut self, qty: i64) {
        self.qty = clamp_qty(qty, self.max_qty);
    }

    pub(crate) fn add_qty(&mut self, qty: i64) {
        self.set_qty(i64::from(self.qty).saturating_add(qty));
    }
}

/// Compute the identity of a line from its identity triple.
///
/// Price is part of identity so that the same product added at a different
/// price never merges into an existing row.
pub fn line_id(product_id: &ProductId, variant_key: &str, unit_price: Money) -> LineId {
    LineId::new(format!(
        "{}::{}::{}",
        product_id, variant_key, unit_price.amount_cents
    ))
}

/// Clamp a requested quantity to `[1, max_qty]`.
pub fn clamp_qty(requested: i64, max_qty: Option<u32>) -> u32 {
    let ceiling = max_qty.map_or(i64::from(u32::MAX), |max| i64::from(max.max(1)));
    let qty = requested.clamp(1, ceiling);
    u32::try_from(qty).unwrap_or(u32::MAX)
}

/// A line as persisted by the storefront, including older field names.
///
/// Every field is optional so any stored cart from any release can be read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_key: Option<String>,
    /// Legacy attribute map, used when `variantKey` is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price_base: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price_base: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_qty: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

impl From<&OrderLine> for PersistedLine {
    fn from(line: &OrderLine) -> Self {
        Self {
            line_id: Some(line.line_id.to_string()),
            product_id: Some(line.product_id.to_string()),
            variant_key: Some(line.variant_key.clone()),
            title: Some(line.title.clone()),
            image: Some(line.image.clone()),
            unit_price_base: Some(line.unit_price_base.to_decimal()),
            compare_at_price_base: line.compare_at_price_base.map(|m| m.to_decimal()),
            qty: Some(f64::from(line.qty)),
            max_qty: line.max_qty,
            ..Default::default()
        }
    }
}

/// A partially specified line built by UI code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartialLine {
    pub product_id: Option<ProductId>,
    pub variant_key: Option<String>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub unit_price: Option<Money>,
    pub compare_at_price: Option<Money>,
    pub qty: Option<i64>,
    pub max_qty: Option<u32>,
}

impl PartialLine {
    pub fn new(product_id: impl Into<ProductId>) -> Self {
        Self {
            product_id: Some(product_id.into()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.unit_price = Some(price);
        self
    }

    pub fn with_variant_key(mut self, variant_key: impl Into<String>) -> Self {
        self.variant_key = Some(variant_key.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_max_qty(mut self, max_qty: u32) -> Self {
        self.max_qty = Some(max_qty);
        self
    }
}

/// Every shape that can become an order line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineInput {
    /// A catalog product with the shopper's attribute selection.
    Product {
        product: Product,
        selection: Selection,
    },
    /// A stored line, current or legacy.
    Persisted(PersistedLine),
    /// A line assembled by UI code.
    Partial(PartialLine),
}

impl LineInput {
    /// A product with a selection.
    pub fn product(product: Product, selection: Selection) -> Self {
        LineInput::Product { product, selection }
    }
}

impl From<PersistedLine> for LineInput {
    fn from(line: PersistedLine) -> Self {
        LineInput::Persisted(line)
    }
}

impl From<PartialLine> for LineInput {
    fn from(line: PartialLine) -> Self {
        LineInput::Partial(line)
    }
}

impl From<Product> for LineInput {
    fn from(product: Product) -> Self {
        LineInput::product(product, Selection::new())
    }
}

impl From<&OrderLine> for LineInput {
    fn from(line: &OrderLine) -> Self {
        LineInput::Persisted(PersistedLine::from(line))
    }
}

impl From<OrderLine> for LineInput {
    fn from(line: OrderLine) -> Self {
        LineInput::from(&line)
    }
}

/// Turn any input shape into a valid order line.
///
/// Never fails: missing fields fall back to defaults (price 0, title
/// [`UNTITLED`], image [`PLACEHOLDER_IMAGE`], qty 1, generated product id).
/// Normalizing an already normalized line yields the same line.
pub fn normalize(input: impl Into<LineInput>) -> OrderLine {
    match input.into() {
        LineInput::Product { product, selection } => from_product(&product, &selection),
        LineInput::Persisted(line) => from_persisted(line),
        LineInput::Partial(line) => from_partial(line),
    }
}

fn from_product(product: &Product, selection: &Selection) -> OrderLine {
    let quote = price_for(product, selection);
    build(
        product.natural_id(),
        selection.variant_key(),
        product.display_title().map(str::to_string),
        product.primary_image().map(str::to_string),
        quote.unit_price,
        quote.compare_price,
        1,
        product.stock_ceiling(),
    )
}

fn from_persisted(line: PersistedLine) -> OrderLine {
    let product_id = [&line.product_id, &line.id, &line.slug, &line.sku]
        .into_iter()
        .find_map(|field| non_empty(field.as_deref()))
        .map(ProductId::new);

    let variant_key = match (&line.variant_key, &line.variant) {
        (Some(key), _) => key.trim().to_string(),
        (None, Some(map)) => encode_variant_map(map),
        (None, None) => String::new(),
    };

    let title = non_empty(line.title.as_deref())
        .or_else(|| non_empty(line.name.as_deref()))
        .map(str::to_string);

    let image = non_empty(line.image.as_deref())
        .or_else(|| non_empty(line.images.first().map(String::as_str)))
        .map(str::to_string);

    let unit_price = [
        line.unit_price_base,
        line.price.and_then(|p| p.nested_current()),
        line.price.and_then(|p| p.flat()),
        line.unit_price,
    ]
    .into_iter()
    .flatten()
    .find(|p| p.is_finite())
    .map(Money::from_decimal)
    .unwrap_or_default();

    let compare_at_price = [
        line.compare_at_price_base,
        line.price.and_then(|p| p.old()),
        line.old_price,
    ]
    .into_iter()
    .flatten()
    .find(|p| p.is_finite())
    .map(Money::from_decimal);

    let qty = [line.qty, line.quantity]
        .into_iter()
        .flatten()
        .find(|q| q.is_finite())
        .map_or(1, |q| q.floor() as i64);

    let max_qty = line.max_qty.or_else(|| {
        line.stock
            .map(|stock| u32::try_from(stock.max(1)).unwrap_or(u32::MAX))
    });

    build(
        product_id,
        variant_key,
        title,
        image,
        unit_price,
        compare_at_price,
        qty,
        max_qty,
    )
}

fn from_partial(line: PartialLine) -> OrderLine {
    let product_id = non_empty(line.product_id.as_ref().map(ProductId::as_str))
        .map(ProductId::new);
    let title = non_empty(line.title.as_deref()).map(str::to_string);
    let image = non_empty(line.image.as_deref()).map(str::to_string);
    let variant_key = line
        .variant_key
        .as_deref()
        .map_or_else(String::new, |key| key.trim().to_string());

    build(
        product_id,
        variant_key,
        title,
        image,
        line.unit_price.unwrap_or_default(),
        line.compare_at_price,
        line.qty.unwrap_or(1),
        line.max_qty,
    )
}

#[allow(clippy::too_many_arguments)]
fn build(
    product_id: Option<ProductId>,
    variant_key: String,
    title: Option<String>,
    image: Option<String>,
    unit_price: Money,
    compare_at_price: Option<Money>,
    qty: i64,
    max_qty: Option<u32>,
) -> OrderLine {
    let product_id = product_id.unwrap_or_else(ProductId::generate);
    let unit_price = unit_price.non_negative();
    let compare_at_price = compare_at_price.map(|m| m.non_negative());

    OrderLine {
        line_id: line_id(&product_id, &variant_key, unit_price),
        product_id,
        variant_key,
        title: title.unwrap_or_else(|| UNTITLED.to_string()),
        image: image.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        unit_price_base: unit_price,
        compare_at_price_base: compare_at_price,
        qty: clamp_qty(qty, max_qty),
        max_qty,
    }
}

fn encode_variant_map(map: &serde_json::Map<String, serde_json::Value>) -> String {
    let pairs: Vec<(String, String)> = map
        .iter()
        .filter_map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s.trim().to_string(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (!value.is_empty()).then(|| (k.clone(), value))
        })
        .collect();
    encode_variant_key(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeKind, VariantAttribute};

    fn phone() -> Product {
        Product::new("phone-x", "Phone X", 500.0)
            .with_attribute(
                VariantAttribute::new("storage", AttributeKind::Select)
                    .with_values(["128GB", "256GB"]),
            )
            .with_adjustment("storage", "256GB", 100.0)
    }

    #[test]
    fn test_normalize_product_uses_variant_price() {
        let line = normalize(LineInput::product(
            phone(),
            Selection::new().with("storage", "256GB"),
        ));
        assert_eq!(line.product_id().as_str(), "phone-x");
        assert_eq!(line.variant_key(), "storage=256GB");
        assert_eq!(line.unit_price(), Money::from_decimal(600.0));
        assert_eq!(line.line_id().as_str(), "phone-x::storage=256GB::60000");
        assert_eq!(line.image(), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_normalize_empty_persisted_line_defaults() {
        let line = normalize(PersistedLine::default());
        assert!(line.product_id().as_str().starts_with("gen-"));
        assert_eq!(line.title(), UNTITLED);
        assert_eq!(line.unit_price(), Money::zero());
        assert_eq!(line.qty(), 1);
        assert_eq!(line.variant_key(), "");
    }

    #[test]
    fn test_normalize_legacy_line() {
        let json = r#"{
            "slug": "mug",
            "name": "Mug",
            "images": ["/mug.jpg"],
            "price": {"current": 12.5, "old": 15},
            "quantity": 3,
            "variant": {"size": "L", "color": "red", "engraving": ""}
        }"#;
        let persisted: PersistedLine = serde_json::from_str(json).unwrap();
        let line = normalize(persisted);

        assert_eq!(line.product_id().as_str(), "mug");
        assert_eq!(line.title(), "Mug");
        assert_eq!(line.image(), "/mug.jpg");
        assert_eq!(line.unit_price(), Money::new(1250));
        assert_eq!(line.compare_at_price(), Some(Money::new(1500)));
        assert_eq!(line.qty(), 3);
        assert_eq!(line.variant_key(), "color=red|size=L");
    }

    #[test]
    fn test_normalize_clamps_quantity_and_price() {
        let persisted = PersistedLine {
            product_id: Some("p".into()),
            unit_price_base: Some(-4.0),
            qty: Some(-2.0),
            ..Default::default()
        };
        let line = normalize(persisted);
        assert_eq!(line.qty(), 1);
        assert_eq!(line.unit_price(), Money::zero());

        let partial = PartialLine {
            qty: Some(50),
            ..PartialLine::new("p").with_max_qty(4)
        };
        assert_eq!(normalize(partial).qty(), 4);
    }

    #[test]
    fn test_non_finite_price_falls_through() {
        let persisted = PersistedLine {
            product_id: Some("p".into()),
            unit_price_base: Some(f64::NAN),
            unit_price: Some(7.0),
            ..Default::default()
        };
        assert_eq!(normalize(persisted).unit_price(), Money::from_decimal(7.0));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs: Vec<LineInput> = vec![
            LineInput::product(phone(), Selection::new().with("storage", "128GB")),
            LineInput::from(Product::default()),
            PersistedLine {
                sku: Some("SKU-9".into()),
                price: Some(PriceField::Flat(9.99)),
                qty: Some(2.7),
                stock: Some(2),
                ..Default::default()
            }
            .into(),
            PartialLine::new("tee")
                .with_title("Tee")
                .with_price(Money::new(1999))
                .with_variant_key("size=M")
                .into(),
            PartialLine::new(" tee ")
                .with_title("  Tee  ")
                .with_image(" /img/tee.png ")
                .with_price(Money::new(1999))
                .with_variant_key(" size=M ")
                .into(),
        ];

        for input in inputs {
            let once = normalize(input);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_partial_line_fields_are_trimmed() {
        let line = normalize(
            PartialLine::new(" tee ")
                .with_title("  Tee  ")
                .with_price(Money::new(1999))
                .with_variant_key(" size=M "),
        );
        assert_eq!(line.product_id().as_str(), "tee");
        assert_eq!(line.title(), "Tee");
        assert_eq!(line.variant_key(), "size=M");
        assert_eq!(line.line_id().as_str(), "tee::size=M::1999");

        let clean = normalize(
            PartialLine::new("tee")
                .with_price(Money::new(1999))
                .with_variant_key("size=M"),
        );
        assert_eq!(line.line_id(), clean.line_id());
    }

    #[test]
    fn test_line_subtotal_is_derived() {
        let line = normalize(PartialLine {
            qty: Some(3),
            ..PartialLine::new("p").with_price(Money::new(250))
        });
        assert_eq!(line.line_subtotal(), Money::new(750));
    }

    #[test]
    fn test_clamp_qty() {
        assert_eq!(clamp_qty(0, None), 1);
        assert_eq!(clamp_qty(-5, None), 1);
        assert_eq!(clamp_qty(7, Some(5)), 5);
        assert_eq!(clamp_qty(7, Some(0)), 1);
        assert_eq!(clamp_qty(i64::MAX, None), u32::MAX);
    }
}
