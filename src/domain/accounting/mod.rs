//! Accounting module - the provider's entity vocabulary.
//!
//! Entity shapes, the query language builder and the rules that derive
//! entity fields from project data. Nothing here performs I/O.

mod entity;
mod mapping;
mod query;

pub use entity::{
    Account, AccountSummary, Customer, EmailAddress, EntityKind, Invoice, Item, Payment, Reference,
};
pub use mapping::{
    build_item_name, item_description, item_unit_price, parse_city_state_zip, PostalAddress,
    ITEM_NAME_MAX_CHARS,
};
pub use query::{FilterValue, Predicate, Query};
