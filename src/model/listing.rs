use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A pharmacy's offer of surplus stock for one drug product.
///
/// The id is derived from the product NDC and the normalized pharmacy
/// address; it is never caller-supplied. Commercial fields come from the
/// creating request and the caller's session snapshot; drug fields are
/// copied from the registry record at creation time. Listings are never
/// updated in place; corrections are delete + recreate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,

    // Commercial terms
    pub product_ndc: String,
    pub pharmacy_name: String,
    pub address: String,
    pub pharmacy_id: String,
    pub price: Decimal,
    pub quantity: u32,
    pub pharmacy_expiration: NaiveDate,
    pub created_at: DateTime<Utc>,

    // Drug metadata enriched from the registry, flattened to plain strings
    pub generic_name: Option<String>,
    pub labeler_name: Option<String>,
    pub brand_name: Option<String>,
    pub dosage_form: Option<String>,
    pub route: Option<String>,
    pub active_ingredients: Option<String>,
    pub product_type: Option<String>,
    pub package_description: Option<String>,
    pub pharm_class: Option<String>,
}
