//! Identity reconciliation against the external identity provider.
//!
//! The OAuth handshake itself happens elsewhere; this module only consumes a
//! verified identity-plus-claims tuple and finds-or-creates the local
//! account.

pub mod session;

pub use session::{SESSION_COOKIE, SessionClaims, SessionSigner};

use serde::Deserialize;

use crate::error::MarketError;
use crate::model::{Account, Role};
use crate::store::Database;

/// Claims delivered by the identity provider after a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginClaims {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Finds-or-creates the local account for a claimed external identity.
///
/// Matching is by email first: a hit updates name, role, and address in
/// place and refreshes the stored external-identity token; a miss creates
/// the account. Idempotent: the same email never yields two accounts.
pub fn reconcile(db: &Database, claims: &LoginClaims) -> Result<Account, MarketError> {
    let external_id = claims.id.trim();
    if external_id.is_empty() {
        return Err(MarketError::InvalidInput("id must not be empty".to_string()));
    }
    let email = claims.email.trim();
    if email.is_empty() {
        return Err(MarketError::InvalidInput(
            "email must not be empty".to_string(),
        ));
    }

    let account = Account {
        external_id: external_id.to_string(),
        email: email.to_string(),
        name: claims.name.as_deref().unwrap_or_default().trim().to_string(),
        role: Role::from_claim(claims.role.as_deref()),
        address: claims
            .address
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string(),
    };

    db.upsert_account(&account)?;
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(id: &str, email: &str, role: Option<&str>) -> LoginClaims {
        LoginClaims {
            id: id.to_string(),
            email: email.to_string(),
            name: Some("Corner Pharmacy".to_string()),
            role: role.map(str::to_string),
            address: Some("1 Main St.".to_string()),
        }
    }

    #[test]
    fn reconcile_creates_an_account_on_first_login() {
        let db = Database::open_in_memory().unwrap();
        let account = reconcile(&db, &claims("ext-1", "rx@example.com", Some("pharmacy"))).unwrap();

        assert_eq!(account.role, Role::Pharmacy);
        assert_eq!(
            db.find_account_by_email("rx@example.com").unwrap().unwrap(),
            account
        );
    }

    #[test]
    fn reconcile_is_idempotent_on_email() {
        let db = Database::open_in_memory().unwrap();
        let c = claims("ext-1", "rx@example.com", Some("pharmacy"));
        reconcile(&db, &c).unwrap();
        reconcile(&db, &c).unwrap();

        assert_eq!(db.count_accounts().unwrap(), 1);
    }

    #[test]
    fn reconcile_updates_profile_and_overwrites_external_id() {
        let db = Database::open_in_memory().unwrap();
        reconcile(&db, &claims("ext-1", "rx@example.com", Some("pharmacy"))).unwrap();

        let mut second = claims("ext-2", "rx@example.com", Some("non_profit"));
        second.address = Some("9 Elm Ave".to_string());
        let account = reconcile(&db, &second).unwrap();

        assert_eq!(account.external_id, "ext-2");
        assert_eq!(account.role, Role::NonProfit);
        assert_eq!(account.address, "9 Elm Ave");
        assert_eq!(db.count_accounts().unwrap(), 1);
    }

    #[test]
    fn unknown_role_claims_default_to_non_profit() {
        let db = Database::open_in_memory().unwrap();
        let account = reconcile(&db, &claims("ext-1", "rx@example.com", Some("admin"))).unwrap();
        assert_eq!(account.role, Role::NonProfit);

        let account = reconcile(&db, &claims("ext-1", "np@example.com", None)).unwrap();
        assert_eq!(account.role, Role::NonProfit);
    }

    #[test]
    fn blank_identity_fields_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        let err = reconcile(&db, &claims("  ", "rx@example.com", None)).unwrap_err();
        assert!(matches!(err, MarketError::InvalidInput(_)));

        let err = reconcile(&db, &claims("ext-1", "", None)).unwrap_err();
        assert!(matches!(err, MarketError::InvalidInput(_)));
    }
}
