// Work-order tracking: the canonical table, its store, and the importer for
// the older table layout.

pub mod handlers;
pub mod legacy;
pub mod models;
pub mod store;

pub use store::{OrderStore, StoreError};
