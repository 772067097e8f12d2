use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

pub type OrderId = Uuid;

/// Whether the customer has their paperwork yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "receipt_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReceiptState {
    Sent,
    Unsent,
    Invoice,
}

/// The writable fields of a work order; what insert and update take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkOrder {
    pub record_time: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub work_time: NaiveDate,
    pub address: String,
    #[serde(default)]
    pub basic_plan: String,
    #[serde(default)]
    pub dispatcher: String,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub registered: bool,
    #[serde(default)]
    pub dispatched: bool,
    #[serde(default)]
    pub sales_price: Decimal,
    #[serde(default)]
    pub final_price: Decimal,
    pub receipt_state: ReceiptState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: OrderId,
    #[serde(flatten)]
    pub fields: NewWorkOrder,
}

/// `work_orders` as stored: prices are decimal strings.
#[derive(Debug, Clone, FromRow)]
pub struct WorkOrderRow {
    pub id: Uuid,
    pub record_time: NaiveDate,
    pub notes: String,
    pub work_time: NaiveDate,
    pub address: String,
    pub basic_plan: String,
    pub dispatcher: String,
    pub confirmed: bool,
    pub registered: bool,
    pub dispatched: bool,
    pub sales_price: String,
    pub final_price: String,
    pub receipt_state: ReceiptState,
}

impl TryFrom<WorkOrderRow> for WorkOrder {
    type Error = String;

    fn try_from(row: WorkOrderRow) -> Result<Self, Self::Error> {
        let sales_price = parse_price("sales_price", &row.sales_price)?;
        let final_price = parse_price("final_price", &row.final_price)?;
        Ok(WorkOrder {
            id: row.id,
            fields: NewWorkOrder {
                record_time: row.record_time,
                notes: row.notes,
                work_time: row.work_time,
                address: row.address,
                basic_plan: row.basic_plan,
                dispatcher: row.dispatcher,
                confirmed: row.confirmed,
                registered: row.registered,
                dispatched: row.dispatched,
                sales_price,
                final_price,
                receipt_state: row.receipt_state,
            },
        })
    }
}

pub fn parse_price(column: &str, value: &str) -> Result<Decimal, String> {
    let value = value.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| format!("{column} '{value}' is not a decimal"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_work_order_serializes_flat() {
        let order = WorkOrder {
            id: Uuid::nil(),
            fields: NewWorkOrder {
                record_time: NaiveDate::from_ymd_opt(2024, 12, 16).unwrap(),
                notes: String::new(),
                work_time: NaiveDate::from_ymd_opt(2024, 12, 18).unwrap(),
                address: "12 King St".into(),
                basic_plan: "2 bedrooms 1 bathroom".into(),
                dispatcher: "A".into(),
                confirmed: true,
                registered: false,
                dispatched: false,
                sales_price: Decimal::new(150, 0),
                final_price: Decimal::new(200, 0),
                receipt_state: ReceiptState::Invoice,
            },
        };
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["address"], json!("12 King St"));
        assert_eq!(value["receipt_state"], json!("invoice"));
        assert_eq!(value["final_price"], json!("200"));
        assert_eq!(value["record_time"], json!("2024-12-16"));
    }

    #[test]
    fn test_new_work_order_accepts_numeric_prices_and_defaults() {
        let order: NewWorkOrder = serde_json::from_value(json!({
            "record_time": "2024-12-16",
            "work_time": "2024-12-18",
            "address": "12 King St",
            "final_price": 200.5,
            "receipt_state": "unsent"
        }))
        .unwrap();
        assert_eq!(order.final_price, Decimal::new(2005, 1));
        assert_eq!(order.sales_price, Decimal::ZERO);
        assert!(!order.confirmed);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("p", "200.0"), Ok(Decimal::new(2000, 1)));
        assert_eq!(parse_price("p", " 75 "), Ok(Decimal::from(75)));
        assert!(parse_price("p", "abc").is_err());
    }
}
