//! Account persistence: reconciliation is an upsert keyed on email.

use rusqlite::{OptionalExtension, params};

use super::Database;
use crate::error::MarketError;
use crate::model::{Account, Role};

impl Database {
    /// Insert the account. If one already exists for that email, update its
    /// name, role, and address in place and refresh the stored
    /// external-identity token. A differing external id is overwritten
    /// silently; that is the reconciliation contract.
    pub fn upsert_account(&self, account: &Account) -> Result<(), MarketError> {
        self.conn().execute(
            r#"
            INSERT INTO accounts (email, external_id, name, role, address)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(email) DO UPDATE SET
                external_id = excluded.external_id,
                name = excluded.name,
                role = excluded.role,
                address = excluded.address
            "#,
            params![
                account.email,
                account.external_id,
                account.name,
                account.role.as_str(),
                account.address,
            ],
        )?;
        Ok(())
    }

    pub fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, MarketError> {
        let account = self
            .conn()
            .query_row(
                "SELECT email, external_id, name, role, address FROM accounts WHERE email = ?1",
                [email],
                |row| {
                    Ok(Account {
                        email: row.get(0)?,
                        external_id: row.get(1)?,
                        name: row.get(2)?,
                        role: Role::from_stored(&row.get::<_, String>(3)?),
                        address: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }

    pub fn count_accounts(&self) -> Result<i64, MarketError> {
        Ok(self
            .conn()
            .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?)
    }
}
