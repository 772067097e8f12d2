use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::receipt::address::{validate_address, AddressError};
use crate::receipt::date_format::format_date;
use crate::receipt::placeholders::{PlaceholderMap, Token};

const AWA_CONJUNCTION: &str = "as well as";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReceiptError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Unknown basic service '{0}'")]
    UnknownBasicService(String),

    #[error("Unknown {field} option '{item}'")]
    UnknownSelection { field: &'static str, item: String },
}

/// Everything the receipt form collects.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptRequest {
    /// Template file name within the template directory.
    pub template: String,
    pub date: NaiveDate,
    pub address: String,
    pub amount: Decimal,
    pub basic_service: String,
    #[serde(default)]
    pub electrical_appliances: Vec<String>,
    #[serde(default)]
    pub rooms: Vec<String>,
    #[serde(default)]
    pub other_services: Vec<String>,
    #[serde(default)]
    pub awa_services: Vec<String>,
}

impl ReceiptRequest {
    /// Validates the request and renders every token value.
    ///
    /// Selections are rendered in catalog order regardless of the order they
    /// were picked in; duplicates collapse.
    pub fn placeholder_map(&self, catalog: &Catalog) -> Result<PlaceholderMap, ReceiptError> {
        validate_address(&self.address)?;
        if self.amount.is_sign_negative() {
            return Err(ReceiptError::NegativeAmount);
        }
        if !catalog.basic_services.contains(&self.basic_service) {
            return Err(ReceiptError::UnknownBasicService(self.basic_service.clone()));
        }

        let electrical = selected(
            "electrical appliance",
            &catalog.electrical_appliances,
            &self.electrical_appliances,
        )?;
        let rooms = selected("room", &catalog.rooms, &self.rooms)?;
        let other = selected("other service", &catalog.other_services, &self.other_services)?;
        let awa = selected("AWA service", &catalog.awa_services, &self.awa_services)?;

        let excluded: Vec<&str> = catalog
            .electrical_appliances
            .iter()
            .map(String::as_str)
            .filter(|item| !electrical.contains(item))
            .collect();

        Ok(PlaceholderMap::new()
            .with(Token::Date, format_date(self.date))
            .with(Token::Address, self.address.as_str())
            .with(Token::Amount, format!("{:.2}", self.amount.round_dp(2)))
            .with(Token::BasicService, self.basic_service.as_str())
            .with(Token::ElectricalAppliances, electrical.join(", "))
            .with(Token::Rooms, rooms.join(", "))
            .with(Token::OtherServices, other.join(", "))
            .with(Token::Awa, if awa.is_empty() { "" } else { AWA_CONJUNCTION })
            .with(Token::AwaServices, awa.join(", "))
            .with(Token::ExcludedElectrical, excluded.join(", ")))
    }

    pub fn filename(&self) -> String {
        receipt_filename(&self.address)
    }
}

/// `Receipt.{address}.docx`, with path separators turned into dots.
pub fn receipt_filename(address: &str) -> String {
    format!("Receipt.{}.docx", address.replace(['/', '\\'], "."))
}

/// Picked items in vocabulary order. Anything outside the vocabulary is an error.
fn selected<'a>(
    field: &'static str,
    vocabulary: &'a [String],
    picked: &[String],
) -> Result<Vec<&'a str>, ReceiptError> {
    if let Some(unknown) = picked.iter().find(|item| !vocabulary.contains(*item)) {
        return Err(ReceiptError::UnknownSelection {
            field,
            item: unknown.clone(),
        });
    }
    Ok(vocabulary
        .iter()
        .filter(|item| picked.contains(*item))
        .map(String::as_str)
        .collect())
}
