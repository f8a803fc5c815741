//! Listing identity, enrichment, and access rules.
//!
//! A listing's id is derived from its product NDC and the posting pharmacy's
//! normalized address, so the same pharmacy cannot post the same product
//! twice. Creation merges the caller's commercial terms with a registry
//! lookup into one persisted record.

use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::SessionClaims;
use crate::config::{Config, MatchMode};
use crate::error::MarketError;
use crate::model::{Listing, Role};
use crate::registry::ndc::{ActiveIngredient, Packaging};
use crate::registry::{NdcClient, NdcLookup, NdcProduct};
use crate::store::{Database, lock_store};

/// Lower-cases the address, strips commas and periods, and collapses each
/// whitespace run to a single `-`.
pub fn normalize_address(address: &str) -> String {
    address
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ',' | '.'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Derives the composite listing id. This is the primary identifier; it is
/// computed, never caller-supplied.
pub fn derive_listing_id(product_ndc: &str, address: &str) -> String {
    format!("{}_{}", product_ndc.trim(), normalize_address(address))
}

/// A JSON field that may arrive as a bare number or a string, depending on
/// the client. Flattened to its text form before parsing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrString {
    fn to_trimmed_string(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

/// Commercial terms of a creation request. Pharmacy name and address are
/// absent on purpose: they come from the caller's session snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateListingRequest {
    pub quantity: NumberOrString,
    pub price: NumberOrString,
    pub pharmacy_expiration: String,
    pub product_ndc: String,
}

/// Validated commercial terms.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingTerms {
    pub quantity: u32,
    pub price: Decimal,
    pub pharmacy_expiration: NaiveDate,
    pub product_ndc: String,
}

/// Parses and validates the raw request fields, before any outbound call or
/// write happens. Each failure names the offending field.
pub fn parse_terms(req: &CreateListingRequest) -> Result<ListingTerms, MarketError> {
    let quantity = req
        .quantity
        .to_trimmed_string()
        .parse::<u32>()
        .map_err(|_| MarketError::InvalidPayload {
            field: "quantity",
            reason: "must be a non-negative integer".to_string(),
        })?;

    let mut price = req
        .price
        .to_trimmed_string()
        .parse::<Decimal>()
        .map_err(|_| MarketError::InvalidPayload {
            field: "price",
            reason: "must be a decimal amount".to_string(),
        })?;
    price.rescale(2);

    let pharmacy_expiration = req
        .pharmacy_expiration
        .trim()
        .parse::<NaiveDate>()
        .map_err(|_| MarketError::InvalidPayload {
            field: "pharmacy_expiration",
            reason: "must be a calendar date (YYYY-MM-DD)".to_string(),
        })?;

    let product_ndc = req.product_ndc.trim().to_string();
    if product_ndc.is_empty() {
        return Err(MarketError::InvalidPayload {
            field: "product_ndc",
            reason: "must not be empty".to_string(),
        });
    }

    Ok(ListingTerms {
        quantity,
        price,
        pharmacy_expiration,
        product_ndc,
    })
}

/// Creates a listing: authorization gate, field validation, registry
/// enrichment, identity derivation, duplicate rejection, atomic persist.
///
/// The registry lookup happens before the store is touched, so a rejected
/// creation leaves no partial record; the duplicate check is the store's
/// primary-key constraint, which also serializes concurrent attempts.
pub async fn create_listing(
    db: &Mutex<Database>,
    registry: &NdcClient,
    session: Option<&SessionClaims>,
    req: &CreateListingRequest,
) -> Result<Listing, MarketError> {
    let session = session.ok_or(MarketError::Unauthenticated)?;
    if session.role != Role::Pharmacy {
        return Err(MarketError::Forbidden(
            "only pharmacy accounts can create listings".to_string(),
        ));
    }

    let terms = parse_terms(req)?;

    let product = match registry.lookup(&terms.product_ndc).await? {
        NdcLookup::Found(product) => product,
        NdcLookup::NotFound => {
            debug!(code = %terms.product_ndc, "registry has no record");
            return Err(MarketError::DrugNotFound(terms.product_ndc));
        }
        NdcLookup::LookupFailed(reason) => {
            // Degrades to the same absence signal as a true miss; the cause
            // is only visible in the logs.
            warn!(code = %terms.product_ndc, reason = %reason, "registry lookup failed");
            return Err(MarketError::DrugNotFound(terms.product_ndc));
        }
    };

    let listing = build_listing(session, terms, &product);
    lock_store(db)?.insert_listing(&listing)?;
    Ok(listing)
}

fn build_listing(session: &SessionClaims, terms: ListingTerms, product: &NdcProduct) -> Listing {
    Listing {
        id: derive_listing_id(&terms.product_ndc, &session.address),
        product_ndc: terms.product_ndc,
        pharmacy_name: session.pharmacy_name.clone(),
        address: session.address.clone(),
        pharmacy_id: session.external_id.clone(),
        price: terms.price,
        quantity: terms.quantity,
        pharmacy_expiration: terms.pharmacy_expiration,
        created_at: Utc::now(),
        generic_name: product.generic_name.clone(),
        labeler_name: product.labeler_name.clone(),
        brand_name: product.brand_name.clone(),
        dosage_form: product.dosage_form.clone(),
        route: join_csv(&product.route),
        active_ingredients: flatten_active_ingredients(&product.active_ingredients),
        product_type: product.product_type.clone(),
        package_description: first_package_description(&product.packaging),
        pharm_class: join_csv(&product.pharm_class),
    }
}

fn join_csv(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

fn flatten_active_ingredients(ingredients: &[ActiveIngredient]) -> Option<String> {
    if ingredients.is_empty() {
        return None;
    }
    Some(
        ingredients
            .iter()
            .map(|i| format!("{} {}", i.name, i.strength))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn first_package_description(packaging: &[Packaging]) -> Option<String> {
    packaging.first().and_then(|p| p.description.clone())
}

/// Case-insensitive generic-name search; the match mode is a configuration
/// choice, partial containment by default.
pub fn search_by_generic_name(
    db: &Database,
    term: &str,
    mode: MatchMode,
) -> Result<Vec<Listing>, MarketError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(MarketError::InvalidInput(
            "name query parameter must not be empty".to_string(),
        ));
    }
    db.search_listings_by_generic_name(term, mode)
}

/// Deletes a listing by id. Unrestricted by default; with
/// `owner_only_delete` enabled, only the session whose external id posted
/// the listing may remove it.
pub fn delete_listing(
    db: &Database,
    config: &Config,
    session: Option<&SessionClaims>,
    id: &str,
) -> Result<(), MarketError> {
    if config.owner_only_delete {
        let session = session.ok_or(MarketError::Unauthenticated)?;
        let listing = db.get_listing(id)?.ok_or_else(|| MarketError::NotFound {
            entity: "medicine",
            id: id.to_string(),
        })?;
        if listing.pharmacy_id != session.external_id {
            return Err(MarketError::Forbidden(
                "only the posting pharmacy can delete this listing".to_string(),
            ));
        }
    }

    if !db.delete_listing(id)? {
        return Err(MarketError::NotFound {
            entity: "medicine",
            id: id.to_string(),
        });
    }
    Ok(())
}
