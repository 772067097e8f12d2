//! Fixed vocabulary and price tables.
//!
//! Everything the forms offer as a choice lives here as configuration: the
//! embedded `config/catalog.json` is the default, and `CATALOG_PATH` can point
//! at a replacement file with the same shape.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const EMBEDDED_CATALOG: &str = include_str!("../../config/catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// A named price, used for both base plans and add-ons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub electrical_appliances: Vec<String>,
    pub rooms: Vec<String>,
    pub other_services: Vec<String>,
    pub awa_services: Vec<String>,
    /// Basic-service phrases inserted verbatim into the receipt sentence.
    pub basic_services: Vec<String>,
    pub dispatchers: Vec<String>,
    pub base_plans: Vec<PriceEntry>,
    pub add_ons: Vec<PriceEntry>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Loads from `path` when given, otherwise falls back to the embedded catalog.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::from_json(&std::fs::read_to_string(path)?),
            None => Self::embedded(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.check()?;
        Ok(catalog)
    }

    pub fn base_plan_price(&self, name: &str) -> Option<Decimal> {
        find_price(&self.base_plans, name)
    }

    pub fn add_on_price(&self, name: &str) -> Option<Decimal> {
        find_price(&self.add_ons, name)
    }

    fn check(&self) -> Result<(), CatalogError> {
        let lists = [
            ("electrical_appliances", &self.electrical_appliances),
            ("rooms", &self.rooms),
            ("other_services", &self.other_services),
            ("awa_services", &self.awa_services),
            ("basic_services", &self.basic_services),
            ("dispatchers", &self.dispatchers),
        ];
        for (label, items) in lists {
            ensure_unique(label, items.iter().map(String::as_str))?;
        }

        for (label, table) in [("base_plans", &self.base_plans), ("add_ons", &self.add_ons)] {
            ensure_unique(label, table.iter().map(|e| e.name.as_str()))?;
            if let Some(entry) = table.iter().find(|e| e.price.is_sign_negative()) {
                return Err(CatalogError::Invalid(format!(
                    "{label}: '{}' has a negative price",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}

fn find_price(table: &[PriceEntry], name: &str) -> Option<Decimal> {
    table.iter().find(|e| e.name == name).map(|e| e.price)
}

fn ensure_unique<'a>(label: &str, items: impl Iterator<Item = &'a str>) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item) {
            return Err(CatalogError::Invalid(format!(
                "{label}: duplicate entry '{item}'"
            )));
        }
    }
    Ok(())
}
