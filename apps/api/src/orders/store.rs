//! CRUD over the `work_orders` table.
//!
//! Every operation except the bulk insert is a single statement. There is no
//! optimistic concurrency, so the last writer wins.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite, SqlitePool};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::orders::models::{parse_price, NewWorkOrder, OrderId, WorkOrder, WorkOrderRow};

const SELECT_COLUMNS: &str = "SELECT id, record_time, notes, work_time, address, basic_plan, \
    dispatcher, confirmed, registered, dispatched, sales_price, final_price, receipt_state \
    FROM work_orders";

const UPDATE_COLUMNS: &str = "UPDATE work_orders SET record_time = ?, notes = ?, work_time = ?, \
    address = ?, basic_plan = ?, dispatcher = ?, confirmed = ?, registered = ?, dispatched = ?, \
    sales_price = ?, final_price = ?, receipt_state = ?";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Work order {0} not found")]
    NotFound(OrderId),

    #[error("Work order {id} is corrupt: {reason}")]
    Corrupt { id: OrderId, reason: String },

    #[error("Sum of final prices is too large")]
    TotalOverflow,
}

#[derive(Debug, Clone)]
pub struct OrderStore {
    pool: SqlitePool,
}

type UpdateQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

/// Binds the writable columns in `UPDATE_COLUMNS` order.
fn bind_fields<'q>(query: UpdateQuery<'q>, order: &'q NewWorkOrder) -> UpdateQuery<'q> {
    query
        .bind(order.record_time)
        .bind(&order.notes)
        .bind(order.work_time)
        .bind(&order.address)
        .bind(&order.basic_plan)
        .bind(&order.dispatcher)
        .bind(order.confirmed)
        .bind(order.registered)
        .bind(order.dispatched)
        .bind(order.sales_price.to_string())
        .bind(order.final_price.to_string())
        .bind(order.receipt_state)
}

async fn insert_row<'e, E>(executor: E, order: &NewWorkOrder) -> Result<OrderId, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4();
    let query = sqlx::query(
        r#"
        INSERT INTO work_orders
            (record_time, notes, work_time, address, basic_plan, dispatcher,
             confirmed, registered, dispatched, sales_price, final_price, receipt_state, id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    );
    bind_fields(query, order).bind(id).execute(executor).await?;
    Ok(id)
}

impl OrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a new work order and returns its generated id.
    pub async fn insert(&self, order: &NewWorkOrder) -> Result<OrderId, StoreError> {
        let id = insert_row(&self.pool, order).await?;

        info!("Inserted work order {id} for '{}'", order.address);
        Ok(id)
    }

    /// Appends all orders in one transaction: either every row lands or none does.
    pub async fn insert_all(&self, orders: &[NewWorkOrder]) -> Result<Vec<OrderId>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(orders.len());
        for order in orders {
            ids.push(insert_row(&mut *tx, order).await?);
        }
        tx.commit().await?;

        info!("Inserted {} work orders", ids.len());
        Ok(ids)
    }

    pub async fn get(&self, id: OrderId) -> Result<Option<WorkOrder>, StoreError> {
        let row = sqlx::query_as::<_, WorkOrderRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(to_work_order).transpose()
    }

    /// Overwrites the order with the given id.
    pub async fn update(&self, id: OrderId, order: &NewWorkOrder) -> Result<(), StoreError> {
        let sql = format!("{UPDATE_COLUMNS} WHERE id = ?");
        let result = bind_fields(sqlx::query(&sql), order)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        info!("Updated work order {id}");
        Ok(())
    }

    /// Overwrites every order whose address equals `address`, all with the
    /// same values. Returns how many rows changed.
    pub async fn update_by_address(
        &self,
        address: &str,
        order: &NewWorkOrder,
    ) -> Result<u64, StoreError> {
        let sql = format!("{UPDATE_COLUMNS} WHERE address = ?");
        let result = bind_fields(sqlx::query(&sql), order)
            .bind(address)
            .execute(&self.pool)
            .await?;

        info!(
            "Updated {} work order(s) at '{address}'",
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM work_orders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        info!("Deleted work order {id}");
        Ok(())
    }

    /// Deletes every order at `address`. Returns how many rows went.
    pub async fn delete_by_address(&self, address: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM work_orders WHERE address = ?")
            .bind(address)
            .execute(&self.pool)
            .await?;

        info!(
            "Deleted {} work order(s) at '{address}'",
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }

    /// All orders in insertion order.
    pub async fn list_all(&self) -> Result<Vec<WorkOrder>, StoreError> {
        let rows = sqlx::query_as::<_, WorkOrderRow>(&format!("{SELECT_COLUMNS} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(to_work_order).collect()
    }

    /// Sum of `final_price` over all orders; zero for an empty table.
    pub async fn total_final_price(&self) -> Result<Decimal, StoreError> {
        let prices = sqlx::query_as::<_, (Uuid, String)>("SELECT id, final_price FROM work_orders")
            .fetch_all(&self.pool)
            .await?;

        prices
            .into_iter()
            .try_fold(Decimal::ZERO, |total, (id, price)| {
                let price = parse_price("final_price", &price)
                    .map_err(|reason| StoreError::Corrupt { id, reason })?;
                total.checked_add(price).ok_or(StoreError::TotalOverflow)
            })
    }

    pub async fn list_distinct_addresses(&self) -> Result<BTreeSet<String>, StoreError> {
        let addresses: Vec<String> = sqlx::query_scalar("SELECT DISTINCT address FROM work_orders")
            .fetch_all(&self.pool)
            .await?;
        Ok(addresses.into_iter().collect())
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM work_orders")
            .fetch_one(&self.pool)
            .await?)
    }
}

fn to_work_order(row: WorkOrderRow) -> Result<WorkOrder, StoreError> {
    let id = row.id;
    WorkOrder::try_from(row).map_err(|reason| StoreError::Corrupt { id, reason })
}
