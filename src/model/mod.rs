//! Persisted domain entities: accounts and medicine listings.

pub mod account;
pub mod listing;

pub use account::{Account, Role};
pub use listing::Listing;
