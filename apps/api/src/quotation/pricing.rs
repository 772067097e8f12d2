//! Quotation arithmetic. Prices are never validated here: non-negativity is
//! checked where the request comes in.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;

#[derive(Debug, Error, PartialEq)]
pub enum QuotationError {
    #[error("Unknown base plan '{0}'")]
    UnknownBasePlan(String),

    #[error("Unknown add-on '{0}'")]
    UnknownAddOn(String),

    #[error("Price for '{0}' must not be negative")]
    NegativePrice(String),

    #[error("Quotation total is too large")]
    TotalOverflow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationLineItem {
    pub name: String,
    pub unit_price: Decimal,
}

impl QuotationLineItem {
    pub fn new(name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            unit_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quotation {
    pub base_plan: QuotationLineItem,
    /// In selection order.
    pub add_ons: Vec<QuotationLineItem>,
}

/// Base price plus every add-on price.
pub fn quote(
    base_price: Decimal,
    add_ons: &[QuotationLineItem],
) -> Result<Decimal, QuotationError> {
    add_ons.iter().try_fold(base_price, |total, item| {
        total
            .checked_add(item.unit_price)
            .ok_or(QuotationError::TotalOverflow)
    })
}

impl Quotation {
    pub fn total(&self) -> Result<Decimal, QuotationError> {
        quote(self.base_plan.unit_price, &self.add_ons)
    }

    /// Prices the selection from the catalog, letting the caller override any
    /// individual price.
    pub fn from_selection(
        catalog: &Catalog,
        base_plan: &str,
        base_price: Option<Decimal>,
        add_ons: &[(String, Option<Decimal>)],
    ) -> Result<Self, QuotationError> {
        let catalog_base = catalog
            .base_plan_price(base_plan)
            .ok_or_else(|| QuotationError::UnknownBasePlan(base_plan.to_string()))?;
        let base_plan = priced(base_plan, base_price.unwrap_or(catalog_base))?;

        let add_ons = add_ons
            .iter()
            .map(|(name, price)| {
                let catalog_price = catalog
                    .add_on_price(name)
                    .ok_or_else(|| QuotationError::UnknownAddOn(name.clone()))?;
                priced(name, price.unwrap_or(catalog_price))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Quotation { base_plan, add_ons })
    }
}

fn priced(name: &str, price: Decimal) -> Result<QuotationLineItem, QuotationError> {
    if price < Decimal::ZERO {
        return Err(QuotationError::NegativePrice(name.to_string()));
    }
    Ok(QuotationLineItem::new(name, price))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::embedded().unwrap()
    }

    #[test]
    fn test_quote_sums_base_and_add_ons() {
        let add_ons = [
            QuotationLineItem::new("fridge", Decimal::from(50)),
            QuotationLineItem::new("oven", Decimal::from(50)),
        ];
        assert_eq!(quote(Decimal::from(275), &add_ons), Ok(Decimal::from(375)));
    }

    #[test]
    fn test_quote_without_add_ons_is_base_price() {
        assert_eq!(quote(Decimal::new(1999, 1), &[]), Ok(Decimal::new(1999, 1)));
    }

    #[test]
    fn test_from_selection_uses_catalog_prices() {
        let quotation = Quotation::from_selection(
            &catalog(),
            "2 bedrooms 1 bathroom",
            None,
            &[("fridge".into(), None), ("oven".into(), None)],
        )
        .unwrap();

        assert_eq!(quotation.base_plan.unit_price, Decimal::from(275));
        assert_eq!(quotation.add_ons.len(), 2);
        assert_eq!(quotation.add_ons[0].name, "fridge");
        assert_eq!(quotation.total(), Ok(Decimal::from(375)));
    }

    #[test]
    fn test_from_selection_applies_overrides() {
        let quotation = Quotation::from_selection(
            &catalog(),
            "2 bedrooms 1 bathroom",
            Some(Decimal::from(250)),
            &[("fridge".into(), Some(Decimal::new(455, 1)))],
        )
        .unwrap();
        assert_eq!(quotation.total(), Ok(Decimal::new(2955, 1)));
    }

    #[test]
    fn test_from_selection_rejects_unknown_names() {
        assert_eq!(
            Quotation::from_selection(&catalog(), "castle", None, &[]),
            Err(QuotationError::UnknownBasePlan("castle".into()))
        );
        assert_eq!(
            Quotation::from_selection(
                &catalog(),
                "2 bedrooms 1 bathroom",
                None,
                &[("moat".into(), None)]
            ),
            Err(QuotationError::UnknownAddOn("moat".into()))
        );
    }

    #[test]
    fn test_from_selection_rejects_negative_override() {
        assert_eq!(
            Quotation::from_selection(
                &catalog(),
                "2 bedrooms 1 bathroom",
                Some(Decimal::from(-1)),
                &[]
            ),
            Err(QuotationError::NegativePrice("2 bedrooms 1 bathroom".into()))
        );
    }

    #[test]
    fn test_total_too_large_is_an_error() {
        let quotation = Quotation::from_selection(
            &catalog(),
            "2 bedrooms 1 bathroom",
            Some(Decimal::MAX),
            &[("fridge".into(), None)],
        )
        .unwrap();
        assert_eq!(quotation.total(), Err(QuotationError::TotalOverflow));
    }
}
