pub mod handlers;
pub mod pricing;

pub use pricing::QuotationError;
