use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BuyerId, ItemId, ReservationToken};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::Result;
use crate::records::{FailureRecord, Item, OrderRecord};
use crate::store::{CommitOutcome, DurableStore, FailureLogStore};

/// PostgreSQL-backed durable store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL durable store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_item(row: &PgRow) -> Result<Item> {
        Ok(Item {
            id: ItemId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
        })
    }

    fn row_to_order(row: &PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            id: row.try_get("id")?,
            item_id: ItemId::new(row.try_get("item_id")?),
            buyer_id: BuyerId::new(row.try_get("buyer_id")?),
            token: ReservationToken::from_uuid(row.try_get::<Uuid, _>("token")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

#[async_trait]
impl DurableStore for PostgresStore {
    async fn insert_item(&self, name: &str, price: i64, stock: i64) -> Result<Item> {
        let row = sqlx::query(
            r#"
            INSERT INTO items (name, price, stock)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, stock
            "#,
        )
        .bind(name)
        .bind(price)
        .bind(stock)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_item(&row)
    }

    async fn get_item(&self, item_id: ItemId) -> Result<Option<Item>> {
        let row = sqlx::query("SELECT id, name, price, stock FROM items WHERE id = $1")
            .bind(item_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_item).transpose()
    }

    async fn stock(&self, item_id: ItemId) -> Result<Option<i64>> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM items WHERE id = $1")
            .bind(item_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(stock)
    }

    async fn commit_order(
        &self,
        item_id: ItemId,
        buyer_id: BuyerId,
        token: ReservationToken,
    ) -> Result<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        // Guarded decrement: applies only while stock is positive, so
        // the authoritative count can never go negative.
        let updated = sqlx::query("UPDATE items SET stock = stock - 1 WHERE id = $1 AND stock > 0")
            .bind(item_id.as_i64())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(CommitOutcome::StockExhausted);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (item_id, buyer_id, token, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(item_id.as_i64())
        .bind(buyer_id.as_i64())
        .bind(token.as_uuid())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                tx.commit().await?;
                Ok(CommitOutcome::Created)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                // Redelivered message: the order already exists, so the
                // decrement above must not apply a second time.
                tx.rollback().await?;
                Ok(CommitOutcome::DuplicateToken)
            }
            // Dropping the transaction rolls it back.
            Err(e) => Err(e.into()),
        }
    }

    async fn order_for_token(&self, token: ReservationToken) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(
            "SELECT id, item_id, buyer_id, token, created_at FROM orders WHERE token = $1",
        )
        .bind(token.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn order_count(&self, item_id: ItemId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE item_id = $1")
            .bind(item_id.as_i64())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl FailureLogStore for PostgresStore {
    async fn record(&self, failure: &FailureRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO failure_events (buyer_id, item_id, reason, origin_address, failed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(failure.buyer_id.as_i64())
        .bind(failure.item_id.as_i64())
        .bind(&failure.reason)
        .bind(&failure.origin_address)
        .bind(failure.failed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn failure_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM failure_events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
