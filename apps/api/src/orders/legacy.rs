//! Import from the older `work_orders` layout.
//!
//! That layout used `register_time`, `project`, `dispatch_price`,
//! `receipt_or_invoice` and `sent_or_not`, stored flags as `'1'`/`'2'` text
//! (or `1`/`0` integers) and prices as REAL. Some copies were partially
//! migrated, so each logical column is resolved against a list of candidate
//! names. Every value is read back as text and normalized here; nothing else
//! in the crate knows the old layout exists.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use tracing::{info, warn};

use crate::orders::models::{parse_price, NewWorkOrder, ReceiptState};
use crate::orders::store::{OrderStore, StoreError};

/// Logical column, then the names it has gone by.
const COLUMN_CANDIDATES: [(&str, &[&str]); 13] = [
    ("record_time", &["record_time", "register_time"]),
    ("notes", &["notes"]),
    ("work_time", &["work_time"]),
    ("address", &["address"]),
    ("basic_plan", &["basic_plan", "project"]),
    ("dispatcher", &["dispatcher"]),
    ("confirmed", &["confirmed"]),
    ("registered", &["registered"]),
    ("dispatched", &["dispatched"]),
    ("sales_price", &["sales_price", "dispatch_price"]),
    ("final_price", &["final_price"]),
    ("receipt_kind", &["receipt_state", "receipt_or_invoice", "receipt"]),
    ("sent_or_not", &["sent_or_not"]),
];

#[derive(Debug, Error, PartialEq)]
pub enum LegacyRowError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("{column} '{value}' is not a YYYY-MM-DD date")]
    BadDate { column: &'static str, value: String },

    #[error("{0}")]
    BadPrice(String),
}

/// One legacy row, every column cast to text.
#[derive(Debug, Clone, Default, FromRow)]
pub struct LegacyRow {
    pub record_time: Option<String>,
    pub notes: Option<String>,
    pub work_time: Option<String>,
    pub address: Option<String>,
    pub basic_plan: Option<String>,
    pub dispatcher: Option<String>,
    pub confirmed: Option<String>,
    pub registered: Option<String>,
    pub dispatched: Option<String>,
    pub sales_price: Option<String>,
    pub final_price: Option<String>,
    pub receipt_kind: Option<String>,
    pub sent_or_not: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyImport {
    pub imported: usize,
    pub skipped: usize,
}

impl TryFrom<LegacyRow> for NewWorkOrder {
    type Error = LegacyRowError;

    fn try_from(row: LegacyRow) -> Result<Self, Self::Error> {
        let address = row
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or(LegacyRowError::Missing("address"))?;

        Ok(NewWorkOrder {
            record_time: parse_date("record_time", row.record_time)?,
            notes: row.notes.unwrap_or_default(),
            work_time: parse_date("work_time", row.work_time)?,
            address,
            basic_plan: row.basic_plan.unwrap_or_default(),
            dispatcher: row.dispatcher.unwrap_or_default(),
            confirmed: parse_flag(row.confirmed.as_deref()),
            registered: parse_flag(row.registered.as_deref()),
            dispatched: parse_flag(row.dispatched.as_deref()),
            sales_price: parse_optional_price("sales_price", row.sales_price)?,
            final_price: parse_optional_price("final_price", row.final_price)?,
            receipt_state: parse_receipt_state(
                row.receipt_kind.as_deref(),
                row.sent_or_not.as_deref(),
            ),
        })
    }
}

/// `'1'`, `1`, `true`, `yes` are set; anything else (including the old `'2'`) is not.
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "y")
    )
}

pub fn parse_receipt_state(kind: Option<&str>, sent_or_not: Option<&str>) -> ReceiptState {
    let kind = kind.unwrap_or_default().trim();
    match kind.to_ascii_lowercase().as_str() {
        "sent" => return ReceiptState::Sent,
        "unsent" => return ReceiptState::Unsent,
        "invoice" => return ReceiptState::Invoice,
        _ => {}
    }

    if kind.contains("发票") || kind.contains("(I)") || kind.contains("（I）") {
        ReceiptState::Invoice
    } else if kind.contains("未发") {
        ReceiptState::Unsent
    } else if kind.contains("已发") || parse_flag(sent_or_not) {
        ReceiptState::Sent
    } else {
        ReceiptState::Unsent
    }
}

fn parse_date(column: &'static str, value: Option<String>) -> Result<NaiveDate, LegacyRowError> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(LegacyRowError::Missing(column))?;
    let day = value.get(..10).unwrap_or(value.as_str());
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| LegacyRowError::BadDate {
        column,
        value: value.clone(),
    })
}

fn parse_optional_price(column: &str, value: Option<String>) -> Result<Decimal, LegacyRowError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(Decimal::ZERO),
        Some(value) => parse_price(column, value).map_err(LegacyRowError::BadPrice),
    }
}

/// Builds a SELECT that maps whatever columns exist onto `LegacyRow`.
async fn select_statement(pool: &SqlitePool) -> Result<String, sqlx::Error> {
    let existing: HashSet<String> =
        sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info('work_orders')")
            .fetch_all(pool)
            .await?
            .into_iter()
            .collect();

    let columns: Vec<String> = COLUMN_CANDIDATES
        .iter()
        .map(|(alias, candidates)| {
            match candidates.iter().find(|c| existing.contains(**c)) {
                Some(column) => format!("CAST({column} AS TEXT) AS {alias}"),
                None => format!("NULL AS {alias}"),
            }
        })
        .collect();

    Ok(format!(
        "SELECT {} FROM work_orders ORDER BY rowid",
        columns.join(", ")
    ))
}

/// Copies every readable row from the legacy database into `store`.
/// Rows that cannot be normalized are skipped and logged. The copy is a
/// single transaction, so a failed import leaves the store untouched.
pub async fn import_legacy(
    legacy: &SqlitePool,
    store: &OrderStore,
) -> Result<LegacyImport, StoreError> {
    let sql = select_statement(legacy).await?;
    let rows = sqlx::query_as::<_, LegacyRow>(&sql).fetch_all(legacy).await?;

    let mut orders = Vec::with_capacity(rows.len());
    let mut outcome = LegacyImport::default();
    for (index, row) in rows.into_iter().enumerate() {
        match NewWorkOrder::try_from(row) {
            Ok(order) => orders.push(order),
            Err(e) => {
                warn!("Skipping legacy work order #{}: {e}", index + 1);
                outcome.skipped += 1;
            }
        }
    }
    outcome.imported = store.insert_all(&orders).await?.len();

    info!(
        "Legacy import finished: {} imported, {} skipped",
        outcome.imported, outcome.skipped
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn legacy_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE work_orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                register_time TEXT,
                notes TEXT,
                work_time TEXT,
                address TEXT,
                project TEXT,
                dispatcher TEXT,
                confirmed TEXT,
                registered TEXT,
                dispatched TEXT,
                dispatch_price REAL,
                final_price REAL,
                receipt_or_invoice TEXT,
                sent_or_not TEXT)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_legacy(
        pool: &SqlitePool,
        register_time: &str,
        address: &str,
        confirmed: &str,
        dispatch_price: f64,
        final_price: f64,
        receipt_or_invoice: &str,
        sent_or_not: &str,
    ) {
        sqlx::query(
            "INSERT INTO work_orders
                (register_time, notes, work_time, address, project, dispatcher,
                 confirmed, registered, dispatched, dispatch_price, final_price,
                 receipt_or_invoice, sent_or_not)
             VALUES (?, '', '2024-12-20', ?, '2 bedrooms 1 bathroom', 'B', ?, '2', '1', ?, ?, ?, ?)",
        )
        .bind(register_time)
        .bind(address)
        .bind(confirmed)
        .bind(dispatch_price)
        .bind(final_price)
        .bind(receipt_or_invoice)
        .bind(sent_or_not)
        .execute(pool)
        .await
        .unwrap();
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("1")));
        assert!(parse_flag(Some("True")));
        assert!(parse_flag(Some(" yes ")));
        assert!(!parse_flag(Some("2")));
        assert!(!parse_flag(Some("0")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_parse_receipt_state() {
        assert_eq!(
            parse_receipt_state(Some("收据（R）- 已发"), Some("1")),
            ReceiptState::Sent
        );
        assert_eq!(
            parse_receipt_state(Some("收据（R）- 未发"), Some("2")),
            ReceiptState::Unsent
        );
        assert_eq!(
            parse_receipt_state(Some("发票（I）"), Some("2")),
            ReceiptState::Invoice
        );
        assert_eq!(parse_receipt_state(Some("invoice"), None), ReceiptState::Invoice);
        assert_eq!(parse_receipt_state(Some("receipt"), Some("1")), ReceiptState::Sent);
        assert_eq!(parse_receipt_state(None, None), ReceiptState::Unsent);
    }

    #[test]
    fn test_row_conversion_rejects_missing_address_and_bad_dates() {
        let row = LegacyRow {
            record_time: Some("2024-12-16".into()),
            work_time: Some("2024-12-20".into()),
            ..Default::default()
        };
        assert_eq!(
            NewWorkOrder::try_from(row.clone()).unwrap_err(),
            LegacyRowError::Missing("address")
        );

        let row = LegacyRow {
            address: Some("12 King St".into()),
            record_time: Some("16/12/2024".into()),
            ..row
        };
        assert!(matches!(
            NewWorkOrder::try_from(row),
            Err(LegacyRowError::BadDate { column: "record_time", .. })
        ));
    }

    #[test]
    fn test_row_conversion_accepts_timestamps() {
        let row = LegacyRow {
            record_time: Some("2024-12-16 16:27:00".into()),
            work_time: Some("2024-12-20".into()),
            address: Some("12 King St".into()),
            final_price: Some("200.0".into()),
            ..Default::default()
        };
        let order = NewWorkOrder::try_from(row).unwrap();
        assert_eq!(order.record_time, NaiveDate::from_ymd_opt(2024, 12, 16).unwrap());
        assert_eq!(order.final_price, Decimal::from(200));
        assert_eq!(order.sales_price, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_import_from_legacy_layout() {
        let legacy = legacy_pool().await;
        insert_legacy(&legacy, "2024-12-16", "12 King St", "1", 150.0, 200.0, "收据（R）- 已发", "1").await;
        insert_legacy(&legacy, "2024-12-17", "7 Queen St", "2", 80.5, 120.0, "发票（I）", "2").await;
        insert_legacy(&legacy, "", "9 Bad Date Rd", "1", 1.0, 1.0, "收据（R）- 未发", "2").await;

        let store = OrderStore::new(test_pool().await);
        let outcome = import_legacy(&legacy, &store).await.unwrap();

        assert_eq!(outcome, LegacyImport { imported: 2, skipped: 1 });

        let orders = store.list_all().await.unwrap();
        assert_eq!(orders.len(), 2);

        let first = &orders[0].fields;
        assert_eq!(first.address, "12 King St");
        assert_eq!(first.basic_plan, "2 bedrooms 1 bathroom");
        assert!(first.confirmed);
        assert!(!first.registered);
        assert!(first.dispatched);
        assert_eq!(first.sales_price, Decimal::from(150));
        assert_eq!(first.receipt_state, ReceiptState::Sent);

        let second = &orders[1].fields;
        assert!(!second.confirmed);
        assert_eq!(second.sales_price, Decimal::new(805, 1));
        assert_eq!(second.receipt_state, ReceiptState::Invoice);

        assert_eq!(store.total_final_price().await.unwrap(), Decimal::from(320));
    }

    #[tokio::test]
    async fn test_import_from_empty_legacy_table() {
        let legacy = legacy_pool().await;
        let store = OrderStore::new(test_pool().await);
        assert_eq!(
            import_legacy(&legacy, &store).await.unwrap(),
            LegacyImport::default()
        );
    }

    #[tokio::test]
    async fn test_failed_import_commits_nothing() {
        let legacy = legacy_pool().await;
        insert_legacy(&legacy, "2024-12-16", "12 King St", "1", 150.0, 200.0, "收据（R）- 已发", "1").await;
        insert_legacy(&legacy, "2024-12-17", "7 Queen St", "2", 80.5, 120.0, "发票（I）", "2").await;
        insert_legacy(&legacy, "2024-12-18", "3 Elm Rd", "1", 90.0, 100.0, "收据（R）- 未发", "2").await;

        let pool = test_pool().await;
        sqlx::query(
            "CREATE TRIGGER reject_queen_st BEFORE INSERT ON work_orders
             WHEN NEW.address = '7 Queen St'
             BEGIN SELECT RAISE(ABORT, 'disk full'); END",
        )
        .execute(&pool)
        .await
        .unwrap();
        let store = OrderStore::new(pool.clone());

        assert!(import_legacy(&legacy, &store).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);

        sqlx::query("DROP TRIGGER reject_queen_st")
            .execute(&pool)
            .await
            .unwrap();
        let outcome = import_legacy(&legacy, &store).await.unwrap();
        assert_eq!(outcome, LegacyImport { imported: 3, skipped: 0 });
    }
}
