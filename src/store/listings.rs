//! Listing persistence and queries.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension, params};
use rust_decimal::Decimal;

use super::Database;
use crate::config::MatchMode;
use crate::error::MarketError;
use crate::model::Listing;

const LISTING_COLUMNS: &str = "id, product_ndc, pharmacy_name, address, pharmacy_id, \
     price, quantity, pharmacy_expiration, created_at, \
     generic_name, labeler_name, brand_name, dosage_form, route, \
     active_ingredients, product_type, package_description, pharm_class";

impl Database {
    /// Inserts a fully constructed listing. The single INSERT is atomic, so a
    /// storage failure leaves no partial record. A primary-key violation on
    /// the derived id is reported as a conflict; that constraint, not
    /// application-level locking, serializes concurrent duplicate creations.
    pub fn insert_listing(&self, listing: &Listing) -> Result<(), MarketError> {
        let result = self.conn().execute(
            &format!(
                "INSERT INTO listings ({LISTING_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
            ),
            params![
                listing.id,
                listing.product_ndc,
                listing.pharmacy_name,
                listing.address,
                listing.pharmacy_id,
                listing.price.to_string(),
                listing.quantity,
                listing.pharmacy_expiration.to_string(),
                listing.created_at.to_rfc3339(),
                listing.generic_name,
                listing.labeler_name,
                listing.brand_name,
                listing.dosage_form,
                listing.route,
                listing.active_ingredients,
                listing.product_type,
                listing.package_description,
                listing.pharm_class,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(MarketError::Conflict(listing.id.clone()))
            }
            Err(err) => Err(MarketError::Storage(err)),
        }
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<Listing>, MarketError> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1"),
                [id],
                read_listing_row,
            )
            .optional()?;
        row.map(Listing::try_from).transpose()
    }

    pub fn list_listings(&self) -> Result<Vec<Listing>, MarketError> {
        self.collect_listings(
            &format!("SELECT {LISTING_COLUMNS} FROM listings"),
            params![],
        )
    }

    /// Case-insensitive search on generic name. Partial mode is substring
    /// containment; exact mode requires the whole name to match.
    pub fn search_listings_by_generic_name(
        &self,
        term: &str,
        mode: MatchMode,
    ) -> Result<Vec<Listing>, MarketError> {
        match mode {
            MatchMode::Partial => self.collect_listings(
                &format!(
                    "SELECT {LISTING_COLUMNS} FROM listings \
                     WHERE generic_name IS NOT NULL \
                     AND instr(lower(generic_name), lower(?1)) > 0"
                ),
                params![term],
            ),
            MatchMode::Exact => self.collect_listings(
                &format!(
                    "SELECT {LISTING_COLUMNS} FROM listings \
                     WHERE generic_name IS NOT NULL \
                     AND lower(generic_name) = lower(?1)"
                ),
                params![term],
            ),
        }
    }

    /// Returns whether a listing was actually removed.
    pub fn delete_listing(&self, id: &str) -> Result<bool, MarketError> {
        let rows = self
            .conn()
            .execute("DELETE FROM listings WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    fn collect_listings(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Listing>, MarketError> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, read_listing_row)?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(Listing::try_from(row?)?);
        }
        Ok(listings)
    }
}

/// Intermediate row struct for database mapping.
struct ListingRow {
    id: String,
    product_ndc: String,
    pharmacy_name: String,
    address: String,
    pharmacy_id: String,
    price: String,
    quantity: u32,
    pharmacy_expiration: String,
    created_at: String,
    generic_name: Option<String>,
    labeler_name: Option<String>,
    brand_name: Option<String>,
    dosage_form: Option<String>,
    route: Option<String>,
    active_ingredients: Option<String>,
    product_type: Option<String>,
    package_description: Option<String>,
    pharm_class: Option<String>,
}

fn read_listing_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get(0)?,
        product_ndc: row.get(1)?,
        pharmacy_name: row.get(2)?,
        address: row.get(3)?,
        pharmacy_id: row.get(4)?,
        price: row.get(5)?,
        quantity: row.get(6)?,
        pharmacy_expiration: row.get(7)?,
        created_at: row.get(8)?,
        generic_name: row.get(9)?,
        labeler_name: row.get(10)?,
        brand_name: row.get(11)?,
        dosage_form: row.get(12)?,
        route: row.get(13)?,
        active_ingredients: row.get(14)?,
        product_type: row.get(15)?,
        package_description: row.get(16)?,
        pharm_class: row.get(17)?,
    })
}

impl TryFrom<ListingRow> for Listing {
    type Error = MarketError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| MarketError::CorruptRecord {
            id: row.id.clone(),
            reason,
        };

        let price = row
            .price
            .parse::<Decimal>()
            .map_err(|e| corrupt(format!("price: {e}")))?;
        let pharmacy_expiration = row
            .pharmacy_expiration
            .parse::<NaiveDate>()
            .map_err(|e| corrupt(format!("pharmacy_expiration: {e}")))?;
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| corrupt(format!("created_at: {e}")))?
            .with_timezone(&Utc);

        Ok(Listing {
            id: row.id,
            product_ndc: row.product_ndc,
            pharmacy_name: row.pharmacy_name,
            address: row.address,
            pharmacy_id: row.pharmacy_id,
            price,
            quantity: row.quantity,
            pharmacy_expiration,
            created_at,
            generic_name: row.generic_name,
            labeler_name: row.labeler_name,
            brand_name: row.brand_name,
            dosage_form: row.dosage_form,
            route: row.route,
            active_ingredients: row.active_ingredients,
            product_type: row.product_type,
            package_description: row.package_description,
            pharm_class: row.pharm_class,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn listing(id: &str, generic_name: Option<&str>) -> Listing {
        Listing {
            id: id.to_string(),
            product_ndc: "12345-678".to_string(),
            pharmacy_name: "Corner Pharmacy".to_string(),
            address: "1 Main St.".to_string(),
            pharmacy_id: "ext-1".to_string(),
            price: Decimal::from_str("12.50").unwrap(),
            quantity: 5,
            pharmacy_expiration: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            created_at: Utc::now(),
            generic_name: generic_name.map(str::to_string),
            labeler_name: Some("Example Labs".to_string()),
            brand_name: None,
            dosage_form: Some("TABLET".to_string()),
            route: Some("ORAL, TOPICAL".to_string()),
            active_ingredients: Some("X 5mg".to_string()),
            product_type: None,
            package_description: None,
            pharm_class: None,
        }
    }

    #[test]
    fn insert_then_get_round_trips_every_field() {
        let db = Database::open_in_memory().unwrap();
        let l = listing("a", Some("Testamol"));
        db.insert_listing(&l).unwrap();

        let found = db.get_listing("a").unwrap().unwrap();
        assert_eq!(found.price, l.price);
        assert_eq!(found.price.to_string(), "12.50");
        assert_eq!(found.quantity, 5);
        assert_eq!(found.pharmacy_expiration, l.pharmacy_expiration);
        assert_eq!(found.route.as_deref(), Some("ORAL, TOPICAL"));
        assert_eq!(found.active_ingredients.as_deref(), Some("X 5mg"));
        assert_eq!(found.generic_name.as_deref(), Some("Testamol"));
    }

    #[test]
    fn duplicate_id_maps_to_conflict_and_keeps_one_row() {
        let db = Database::open_in_memory().unwrap();
        db.insert_listing(&listing("a", Some("Testamol"))).unwrap();

        let err = db
            .insert_listing(&listing("a", Some("Other")))
            .unwrap_err();
        assert!(matches!(err, MarketError::Conflict(id) if id == "a"));
        assert_eq!(db.list_listings().unwrap().len(), 1);
    }

    #[test]
    fn get_missing_listing_returns_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_listing("nope").unwrap().is_none());
    }

    #[test]
    fn delete_reports_whether_a_row_was_removed() {
        let db = Database::open_in_memory().unwrap();
        db.insert_listing(&listing("a", None)).unwrap();

        assert!(db.delete_listing("a").unwrap());
        assert!(!db.delete_listing("a").unwrap());
    }

    #[test]
    fn partial_search_matches_substrings_case_insensitively() {
        let db = Database::open_in_memory().unwrap();
        db.insert_listing(&listing("a", Some("Abcillin"))).unwrap();
        db.insert_listing(&listing("b", Some("ABC Suspension")))
            .unwrap();
        db.insert_listing(&listing("c", Some("Xyzol"))).unwrap();
        db.insert_listing(&listing("d", None)).unwrap();

        let mut ids: Vec<String> = db
            .search_listings_by_generic_name("abc", MatchMode::Partial)
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn exact_search_requires_the_whole_name() {
        let db = Database::open_in_memory().unwrap();
        db.insert_listing(&listing("a", Some("Abcillin"))).unwrap();

        assert!(
            db.search_listings_by_generic_name("abc", MatchMode::Exact)
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            db.search_listings_by_generic_name("ABCILLIN", MatchMode::Exact)
                .unwrap()
                .len(),
            1
        );
    }
}
