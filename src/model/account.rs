use serde::{Deserialize, Serialize};

/// Account role, normalized from the login claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Pharmacy,
    NonProfit,
}

impl Role {
    /// Any claim that is not recognizably `pharmacy` defaults to `non_profit`.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("pharmacy") => Self::Pharmacy,
            _ => Self::NonProfit,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pharmacy => "pharmacy",
            Self::NonProfit => "non_profit",
        }
    }

    pub(crate) fn from_stored(value: &str) -> Self {
        Self::from_claim(Some(value))
    }
}

/// A local account, reconciled from an external identity.
///
/// Email is the unique reconciliation key; the external-identity token is
/// refreshed on every login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "id")]
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub address: String,
}
