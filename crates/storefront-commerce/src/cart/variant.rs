//! Variant pricing for a product and an attribute selection.

use crate::catalog::{Product, Selection};
use crate::error::CommerceError;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Effective price of a product under a selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// Base price plus the adjustment of every selected attribute, floored at zero.
    pub unit_price: Money,
    /// The product's old price, if any. Not adjusted for variants.
    pub compare_price: Option<Money>,
    /// `round((compare - unit) / compare × 100)`, only when compare exceeds unit.
    pub discount_percent: Option<f64>,
}

impl PriceQuote {
    /// Whether the quote shows a reduction.
    pub fn is_on_sale(&self) -> bool {
        self.discount_percent.is_some()
    }
}

/// Price a product under a (possibly partial) selection.
///
/// Unselected attributes contribute nothing; a selected value with no
/// adjustment entry contributes zero.
pub fn price_for(product: &Product, selection: &Selection) -> PriceQuote {
    let adjusted = selection
        .selected()
        .fold(product.base_price(), |price, (key, value)| {
            price + product.adjustments.delta(key, value)
        });
    let unit_price = adjusted.non_negative();
    let compare_price = product.compare_at_price();

    let discount_percent = compare_price
        .filter(|compare| compare.is_positive() && *compare > unit_price)
        .map(|compare| {
            let saved = (compare - unit_price).to_decimal();
            (saved / compare.to_decimal() * 100.0).round()
        });

    PriceQuote {
        unit_price,
        compare_price,
        discount_percent,
    }
}

/// Refuse a selection that leaves a required attribute unselected.
pub fn ensure_selection_complete(
    product: &Product,
    selection: &Selection,
) -> Result<(), CommerceError> {
    let missing = selection.missing_required(&product.attributes);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CommerceError::MissingSelection { attributes: missing })
    }
}

/// Quote a selection that is about to be committed to the cart.
///
/// Pricing a partial selection for display is always allowed; committing one
/// is not.
pub fn commit_quote(product: &Product, selection: &Selection) -> Result<PriceQuote, CommerceError> {
    ensure_selection_complete(product, selection)?;
    Ok(price_for(product, selection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeKind, VariantAttribute};

    fn phone() -> Product {
        Product::new("phone-x", "Phone X", 500.0)
            .with_attribute(
                VariantAttribute::new("color", AttributeKind::Swatch)
                    .with_values(["black", "gold"]),
            )
            .with_attribute(
                VariantAttribute::new("storage", AttributeKind::Select)
                    .with_values(["128GB", "256GB"])
                    .required(),
            )
            .with_adjustment("storage", "256GB", 100.0)
            .with_adjustment("color", "gold", 25.0)
    }

    #[test]
    fn test_adjustments_add_up() {
        let product = phone();
        let selection = Selection::new()
            .with("storage", "256GB")
            .with("color", "gold");
        assert_eq!(price_for(&product, &selection).unit_price, Money::from_decimal(625.0));
    }

    #[test]
    fn test_unselected_attribute_contributes_nothing() {
        let product = phone();
        let selection = Selection::for_attributes(&product.attributes);
        assert_eq!(price_for(&product, &selection).unit_price, Money::from_decimal(500.0));

        let unknown = Selection::new().with("storage", "1TB");
        assert_eq!(price_for(&product, &unknown).unit_price, Money::from_decimal(500.0));
    }

    #[test]
    fn test_negative_adjustment_floors_at_zero() {
        let product = Product::new("gift", "Gift", 10.0).with_adjustment("wrap", "none", -15.0);
        let selection = Selection::new().with("wrap", "none");
        assert_eq!(price_for(&product, &selection).unit_price, Money::zero());
    }

    #[test]
    fn test_discount_percent() {
        let product = phone().with_old_price(800.0);
        let quote = price_for(&product, &Selection::new().with("storage", "256GB"));
        assert_eq!(quote.compare_price, Some(Money::from_decimal(800.0)));
        assert_eq!(quote.discount_percent, Some(25.0));
        assert!(quote.is_on_sale());

        let cheap = Product::new("x", "X", 50.0).with_old_price(40.0);
        let quote = price_for(&cheap, &Selection::new());
        assert_eq!(quote.discount_percent, None);
        assert!(!quote.is_on_sale());
    }

    #[test]
    fn test_required_gate_refuses_commit() {
        let product = phone();
        let selection = Selection::for_attributes(&product.attributes).with("color", "black");

        let err = commit_quote(&product, &selection).unwrap_err();
        assert_eq!(
            err,
            CommerceError::MissingSelection {
                attributes: vec!["storage".to_string()]
            }
        );

        let complete = selection.with("storage", "128GB");
        let quote = commit_quote(&product, &complete).unwrap();
        assert_eq!(quote.unit_price, Money::from_decimal(500.0));
    }
}
