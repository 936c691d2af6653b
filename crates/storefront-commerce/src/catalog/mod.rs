//! Product catalog module.
//!
//! The catalog itself lives on the backend; these are the read-only shapes the
//! cart consumes, plus variant attribute selection.

mod attribute;
mod product;

pub(crate) use attribute::encode_variant_key;
pub use attribute::{AttributeKind, PriceAdjustments, Selection, VariantAttribute, VARIANT_SEPARATOR};
pub use product::{NestedPrice, PriceField, Product};
