use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CartRecord, CustomerId, FarmerId, OrderDocument, OrderId, OrderQuery, ProductId,
    ProductRecord, Result, StoreError, Version,
    store::{CartStore, OrderStore, ProductCatalog, SaveOptions},
};

/// Runs the database migrations shared by all PostgreSQL stores.
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// PostgreSQL-backed order store. Orders live in a `JSONB` column with
/// the lookup keys broken out into indexed columns.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_document(row: PgRow) -> Result<OrderDocument> {
        Ok(OrderDocument {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: row.try_get("order_number")?,
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            farmer_id: FarmerId::from_uuid(row.try_get::<Uuid, _>("farmer_id")?),
            created_at: row.try_get("created_at")?,
            version: Version::new(row.try_get("version")?),
            body: row.try_get("body")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, document), fields(order_id = %document.id))]
    async fn insert(&self, document: OrderDocument) -> Result<Version> {
        let order_id = document.id;
        let order_number = document.order_number.clone();

        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_id, farmer_id, created_at, version, body)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(&document.order_number)
        .bind(document.customer_id.as_uuid())
        .bind(document.farmer_id.as_uuid())
        .bind(document.created_at)
        .bind(Version::first().as_i64())
        .bind(&document.body)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                match db_err.constraint() {
                    Some("unique_order_number") => {
                        return StoreError::DuplicateOrderNumber(order_number);
                    }
                    Some("orders_pkey") => return StoreError::DuplicateOrder(order_id),
                    _ => {}
                }
            }
            StoreError::Database(e)
        })?;

        Ok(Version::first())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<OrderDocument>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, order_number, customer_id, farmer_id, created_at, version, body
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    #[tracing::instrument(skip(self, document), fields(order_id = %document.id))]
    async fn save(&self, document: OrderDocument, options: SaveOptions) -> Result<Version> {
        let order_id = document.id;

        // Start a transaction so the version check and the write see the same row
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT version FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let actual = Version::new(current.ok_or(StoreError::OrderNotFound(order_id))?);

        if let Some(expected) = options.expected_version
            && actual != expected
        {
            metrics::counter!("store_version_conflicts_total").increment(1);
            tracing::debug!(%order_id, %expected, %actual, "rejected stale order write");
            return Err(StoreError::ConcurrencyConflict {
                order_id,
                expected,
                actual,
            });
        }

        let new_version = actual.next();
        sqlx::query("UPDATE orders SET body = $1, version = $2 WHERE id = $3")
            .bind(&document.body)
            .bind(new_version.as_i64())
            .bind(order_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(new_version)
    }

    async fn query(&self, query: OrderQuery) -> Result<Vec<OrderDocument>> {
        let mut sql = String::from(
            "SELECT id, order_number, customer_id, farmer_id, created_at, version, body FROM orders WHERE 1=1",
        );
        let mut param_count = 0;

        // Build dynamic query
        if query.customer_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND customer_id = ${param_count}"));
        }
        if query.farmer_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND farmer_id = ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(id) = query.customer_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(id) = query.farmer_id {
            sqlx_query = sqlx_query.bind(id.as_uuid());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(offset as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_document).collect()
    }
}

/// PostgreSQL-backed product catalog.
#[derive(Clone)]
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds or replaces a product listing.
    pub async fn upsert(&self, product: &ProductRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                stock = EXCLUDED.stock
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn current_stock(&self, product_id: ProductId) -> Result<Option<i64>> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(stock)
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn find_by_id(&self, product_id: ProductId) -> Result<Option<ProductRecord>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT id, name, price, stock FROM products WHERE id = $1")
                .bind(product_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(Some(ProductRecord {
                id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
                name: row.try_get("name")?,
                price: row.try_get("price")?,
                stock: row.try_get("stock")?,
            })),
            None => Ok(None),
        }
    }

    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<i64> {
        let stock: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET stock = stock + $2 WHERE id = $1 RETURNING stock",
        )
        .bind(product_id.as_uuid())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        stock.ok_or(StoreError::ProductNotFound(product_id))
    }

    async fn decrement_if_available(&self, product_id: ProductId, quantity: u32) -> Result<i64> {
        let requested = i64::from(quantity);

        // Single conditional statement: the check and the write cannot interleave
        let stock: Option<i64> = sqlx::query_scalar(
            "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING stock",
        )
        .bind(product_id.as_uuid())
        .bind(requested)
        .fetch_optional(&self.pool)
        .await?;

        match stock {
            Some(stock) => Ok(stock),
            None => match self.current_stock(product_id).await? {
                Some(available) => Err(StoreError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available,
                }),
                None => Err(StoreError::ProductNotFound(product_id)),
            },
        }
    }
}

/// PostgreSQL-backed cart store.
#[derive(Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replaces the items in a customer's cart, creating it if needed.
    pub async fn set_items(
        &self,
        customer_id: CustomerId,
        items: Vec<serde_json::Value>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (customer_id, items)
            VALUES ($1, $2)
            ON CONFLICT (customer_id) DO UPDATE SET items = EXCLUDED.items
            "#,
        )
        .bind(customer_id.as_uuid())
        .bind(serde_json::Value::Array(items))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn clear(&self, customer_id: CustomerId) -> Result<bool> {
        let result = sqlx::query("UPDATE carts SET items = '[]'::jsonb WHERE customer_id = $1")
            .bind(customer_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, customer_id: CustomerId) -> Result<Option<CartRecord>> {
        let items: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT items FROM carts WHERE customer_id = $1")
                .bind(customer_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match items {
            Some(items) => Ok(Some(CartRecord {
                customer_id,
                items: serde_json::from_value(items)?,
            })),
            None => Ok(None),
        }
    }
}
