use std::path::Path;

use async_trait::async_trait;
use sqlx::{Sqlite, migrate::Migrator};

use super::{NewOrder, Order, OrderStatus, OrderStore, OrderStoreError, Transition};

static MIGRATOR: Migrator = sqlx::migrate!(); // defaults to "./migrations"

#[derive(Debug, Clone)]
pub struct SqliteOrderStore(sqlx::Pool<Sqlite>);

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    transaction_id: String,
    buyer_id: Option<String>,
    amount: Option<i64>,
    status: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = OrderStoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            transaction_id: row.transaction_id,
            buyer_id: row.buyer_id,
            amount: row.amount.and_then(|a| u64::try_from(a).ok()),
            status: row.status.parse()?,
        })
    }
}

impl SqliteOrderStore {
    /// Open (creating if needed) the database behind a `sqlite://` url and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self, OrderStoreError> {
        tracing::debug!(%database_url, "Connecting order database");
        let path = Path::new(
            database_url
                .strip_prefix("sqlite://")
                .ok_or_else(|| OrderStoreError::InvalidUrl(database_url.to_string()))?,
        );
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(false)
            .create(true)
            .open(path)
            .await?;
        let pool = sqlx::Pool::connect(database_url).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: sqlx::Pool<Sqlite>) -> Result<Self, OrderStoreError> {
        MIGRATOR.run(&pool).await?;
        Ok(Self(pool))
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn record_initiated(&self, order: &NewOrder) -> Result<(), OrderStoreError> {
        let amount = i64::try_from(order.amount)
            .map_err(|_| OrderStoreError::AmountOutOfRange(order.amount))?;
        // A callback can race ahead of this insert, so never overwrite
        sqlx::query(
            "INSERT INTO orders (transaction_id, buyer_id, amount, status) VALUES (?, ?, ?, ?)
             ON CONFLICT(transaction_id) DO NOTHING",
        )
        .bind(&order.transaction_id)
        .bind(&order.buyer_id)
        .bind(amount)
        .bind(OrderStatus::Initiated.as_str())
        .execute(&self.0)
        .await?;
        Ok(())
    }

    async fn record_transition(
        &self,
        transaction_id: &str,
        status: OrderStatus,
    ) -> Result<Transition, OrderStoreError> {
        // Single statement so concurrent deliveries of the same callback cannot interleave
        let result = sqlx::query(
            "INSERT INTO orders (transaction_id, status) VALUES (?, ?)
             ON CONFLICT(transaction_id) DO UPDATE
                SET status = excluded.status, updated_at = CURRENT_TIMESTAMP
                WHERE orders.status NOT IN ('paid', 'failed')
                  AND orders.status != excluded.status",
        )
        .bind(transaction_id)
        .bind(status.as_str())
        .execute(&self.0)
        .await?;
        Ok(match result.rows_affected() {
            0 => Transition::Unchanged,
            _ => Transition::Applied,
        })
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Order>, OrderStoreError> {
        sqlx::query_as::<_, OrderRow>(
            "SELECT transaction_id, buyer_id, amount, status FROM orders WHERE transaction_id = ?",
        )
        .bind(transaction_id)
        .fetch_optional(&self.0)
        .await?
        .map(Order::try_from)
        .transpose()
    }
}
