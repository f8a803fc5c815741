//! Signed session tokens carrying a claims snapshot.
//!
//! Listing creation trusts this snapshot for the caller's role, pharmacy
//! name, and address instead of re-reading the account record; the token TTL
//! is the defined staleness window of that snapshot.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::model::{Account, Role};

pub const SESSION_COOKIE: &str = "medcycle_session";

/// Snapshot of the account captured at reconciliation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub external_id: String,
    pub email: String,
    pub role: Role,
    pub pharmacy_name: String,
    pub address: String,
    /// Unix seconds. Tokens past this instant verify as no session.
    pub expires_at: i64,
}

/// Issues and verifies hex-encoded `payload.signature` tokens, signed with
/// SHA-256 over `secret || payload`.
#[derive(Debug, Clone)]
pub struct SessionSigner {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl SessionSigner {
    pub fn new(config: &Config) -> Self {
        Self {
            secret: config.session_secret.as_bytes().to_vec(),
            ttl_secs: config.session_ttl.as_secs() as i64,
        }
    }

    pub fn issue(&self, account: &Account) -> String {
        let claims = SessionClaims {
            external_id: account.external_id.clone(),
            email: account.email.clone(),
            role: account.role,
            pharmacy_name: account.name.clone(),
            address: account.address.clone(),
            expires_at: Utc::now().timestamp() + self.ttl_secs,
        };
        // SessionClaims has no non-serializable field; this cannot fail.
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        format!("{}.{}", hex::encode(&payload), self.sign(&payload))
    }

    /// Returns the claims snapshot, or `None` for missing, tampered, or
    /// expired tokens. The three cases are indistinguishable to the caller:
    /// all mean "no active session".
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        let (payload_hex, signature) = token.split_once('.')?;
        let payload = hex::decode(payload_hex).ok()?;
        if self.sign(&payload) != signature {
            return None;
        }

        let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
        if claims.expires_at <= Utc::now().timestamp() {
            return None;
        }
        Some(claims)
    }

    fn sign(&self, payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(payload);
        hex::encode(hasher.finalize())
    }

    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.ttl_secs
        )
    }

    pub fn clear_cookie(&self) -> String {
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}
