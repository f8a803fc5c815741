use std::borrow::Cow;

use serde::Deserialize;
use tracing::warn;

use crate::config::Config;
use crate::error::MarketError;

const NDC_PATH: &str = "drug/ndc.json";

/// Outcome of a registry lookup.
///
/// Transport failures surface as `LookupFailed` rather than as errors; the
/// service layer collapses `NotFound` and `LookupFailed` into one absence
/// signal, but keeps the cause for logging.
#[derive(Debug, Clone)]
pub enum NdcLookup {
    Found(Box<NdcProduct>),
    NotFound,
    LookupFailed(String),
}

#[derive(Debug, Clone)]
pub struct NdcClient {
    client: reqwest::Client,
    base: Cow<'static, str>,
}

impl NdcClient {
    pub fn new(config: &Config) -> Result<Self, MarketError> {
        Ok(Self {
            client: super::registry_http_client(config.registry_timeout)?,
            base: config.registry_base.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{NDC_PATH}", self.base.as_ref().trim_end_matches('/'))
    }

    /// Looks up product-level drug metadata for a distributor code.
    ///
    /// The code is normalized to its product-level form first (see
    /// [`product_level_code`]); the registry indexes product codes, not
    /// package codes. At most one match is requested.
    pub async fn lookup(&self, code: &str) -> Result<NdcLookup, MarketError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(MarketError::InvalidInput(
                "product_ndc must not be empty".to_string(),
            ));
        }

        let product = product_level_code(code);
        let search = format!("product_ndc:{product}");

        let resp = self
            .client
            .get(self.endpoint())
            .query(&[("search", search.as_str()), ("limit", "1")])
            .send()
            .await;

        let resp = match resp {
            Ok(resp) => resp,
            Err(err) => {
                warn!(code = product, error = %err, "NDC registry request failed");
                return Ok(NdcLookup::LookupFailed(err.to_string()));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            warn!(code = product, %status, "NDC registry returned non-success");
            return Ok(NdcLookup::LookupFailed(format!("HTTP {status}")));
        }

        match resp.json::<NdcResponse>().await {
            Ok(body) => Ok(body
                .results
                .into_iter()
                .next()
                .map(|product| NdcLookup::Found(Box::new(product)))
                .unwrap_or(NdcLookup::NotFound)),
            Err(err) => {
                warn!(code = product, error = %err, "NDC registry body was malformed");
                Ok(NdcLookup::LookupFailed(err.to_string()))
            }
        }
    }
}

/// Strips the package segment from a hyphen-segmented NDC.
///
/// An NDC reads `labeler-product[-package]`. With two or more hyphens the
/// trailing segment is a package code and is dropped; with one or zero
/// hyphens the code is already product-level and is used unmodified.
pub(crate) fn product_level_code(code: &str) -> &str {
    if code.matches('-').count() < 2 {
        return code;
    }
    match code.rfind('-') {
        Some(idx) => &code[..idx],
        None => code,
    }
}

#[derive(Debug, Deserialize)]
struct NdcResponse {
    #[serde(default)]
    results: Vec<NdcProduct>,
}

/// Product-level registry record. Every field is optional; the registry is
/// not owned by this system and its schema drifts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NdcProduct {
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub labeler_name: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub dosage_form: Option<String>,
    #[serde(default)]
    pub route: Vec<String>,
    #[serde(default)]
    pub active_ingredients: Vec<ActiveIngredient>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub packaging: Vec<Packaging>,
    #[serde(default)]
    pub pharm_class: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActiveIngredient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub strength: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Packaging {
    #[serde(default)]
    pub description: Option<String>,
}
