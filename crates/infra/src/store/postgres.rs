//! Postgres-backed inventory store.
//!
//! Expects the following tables (see the deployment's migrations):
//!
//! - `products (id uuid pk, venue_id uuid, name text, current_stock numeric,
//!   reorder_point numeric, reorder_quantity numeric, unit_of_measure text,
//!   version bigint, created_at timestamptz)`
//! - `packages (id uuid pk, venue_id uuid, name text, package_type text,
//!   base_price numeric, cost_price numeric null, version bigint,
//!   created_at timestamptz)`
//! - `package_components (package_id uuid, product_id uuid,
//!   required_quantity numeric, position int)`
//! - `stock_movements (id uuid pk, venue_id uuid, product_id uuid,
//!   movement_type text, quantity_change numeric, resulting_balance numeric,
//!   reason text, performed_by_kind text, performed_by_user uuid null,
//!   unit_cost numeric null, notes text null, created_at timestamptz)`
//!
//! Optimistic concurrency on `commit_movement` rides on the `version`
//! predicate of the product UPDATE inside a single transaction: zero rows
//! touched means another writer got there first.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use tapline_catalog::{Package, PackageComponent, PackageId, PackageType, Product, ProductId};
use tapline_core::{Actor, Entity, EntityId, ExpectedVersion, UserId, VenueId};
use tapline_stock::{MovementId, MovementType, StockMovement};

use super::{InventoryStore, MovementFilter, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self, product), fields(venue_id = %product.venue_id(), product_id = %product.id_typed()), err)]
    pub async fn insert_product_async(&self, product: Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, venue_id, name, current_stock, reorder_point,
                reorder_quantity, unit_of_measure, version, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id_typed().0.as_uuid())
        .bind(product.venue_id().as_uuid())
        .bind(product.name())
        .bind(product.current_stock())
        .bind(product.reorder_point())
        .bind(product.reorder_quantity())
        .bind(product.unit_of_measure())
        .bind(product.version() as i64)
        .bind(product.created_at())
        .execute(&*self.pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateId(format!("product {}", product.id_typed()))
            } else {
                map_sqlx_error("insert_product", e)
            }
        })
    }

    pub async fn get_product_async(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, venue_id, name, current_stock, reorder_point,
                   reorder_quantity, unit_of_measure, version, created_at
            FROM products
            WHERE venue_id = $1 AND id = $2
            "#,
        )
        .bind(venue_id.as_uuid())
        .bind(product_id.0.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;

        row.map(product_from_row).transpose()
    }

    #[instrument(skip(self, package, components), fields(venue_id = %package.venue_id(), package_id = %package.id_typed()), err)]
    pub async fn insert_package_async(
        &self,
        package: Package,
        components: Vec<PackageComponent>,
    ) -> Result<(), StoreError> {
        let id = package.id_typed();
        for (idx, component) in components.iter().enumerate() {
            if component.package_id != id {
                return Err(StoreError::InvalidWrite(format!(
                    "component batch references a different package (index {idx})"
                )));
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO packages (
                id, venue_id, name, package_type, base_price, cost_price,
                version, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id.0.as_uuid())
        .bind(package.venue_id().as_uuid())
        .bind(package.name())
        .bind(package.package_type().as_str())
        .bind(package.base_price())
        .bind(package.cost_price())
        .bind(package.version() as i64)
        .bind(package.created_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateId(format!("package {id}"))
            } else {
                map_sqlx_error("insert_package", e)
            }
        })?;

        for (position, component) in components.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO package_components (package_id, product_id, required_quantity, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(component.package_id.0.as_uuid())
            .bind(component.product_id.0.as_uuid())
            .bind(component.required_quantity)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // FK violation: the component names a product this venue
                // does not have.
                if is_foreign_key_violation(&e) {
                    StoreError::InvalidWrite(format!(
                        "component references unknown product {} (index {position})",
                        component.product_id
                    ))
                } else {
                    map_sqlx_error("insert_package_component", e)
                }
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    pub async fn get_package_async(
        &self,
        venue_id: VenueId,
        package_id: PackageId,
    ) -> Result<Option<Package>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, venue_id, name, package_type, base_price, cost_price,
                   version, created_at
            FROM packages
            WHERE venue_id = $1 AND id = $2
            "#,
        )
        .bind(venue_id.as_uuid())
        .bind(package_id.0.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_package", e))?;

        row.map(package_from_row).transpose()
    }

    pub async fn list_components_async(
        &self,
        venue_id: VenueId,
    ) -> Result<Vec<PackageComponent>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.package_id, c.product_id, c.required_quantity
            FROM package_components c
            JOIN packages p ON p.id = c.package_id
            WHERE p.venue_id = $1
            ORDER BY c.package_id, c.position
            "#,
        )
        .bind(venue_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_components", e))?;

        rows.into_iter()
            .map(|row| {
                let package_id: Uuid = row.try_get("package_id").map_err(row_error)?;
                let product_id: Uuid = row.try_get("product_id").map_err(row_error)?;
                let required_quantity: Decimal =
                    row.try_get("required_quantity").map_err(row_error)?;
                Ok(PackageComponent {
                    package_id: PackageId(EntityId::from_uuid(package_id)),
                    product_id: ProductId(EntityId::from_uuid(product_id)),
                    required_quantity,
                })
            })
            .collect()
    }

    #[instrument(
        skip(self, product, movement),
        fields(
            venue_id = %movement.venue_id,
            product_id = %movement.product_id,
            movement_type = %movement.movement_type,
            expected_version = ?expected_version
        ),
        err
    )]
    pub async fn commit_movement_async(
        &self,
        product: &Product,
        movement: &StockMovement,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        if movement.venue_id != product.venue_id() {
            return Err(StoreError::VenueIsolation(format!(
                "movement venue {} does not match product venue {}",
                movement.venue_id,
                product.venue_id()
            )));
        }
        if movement.product_id != product.id_typed() {
            return Err(StoreError::InvalidWrite(format!(
                "movement product {} does not match product record {}",
                movement.product_id,
                product.id_typed()
            )));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let update = match expected_version {
            ExpectedVersion::Exact(version) => sqlx::query(
                r#"
                UPDATE products
                SET current_stock = $1, version = $2
                WHERE venue_id = $3 AND id = $4 AND version = $5
                "#,
            )
            .bind(product.current_stock())
            .bind(product.version() as i64)
            .bind(product.venue_id().as_uuid())
            .bind(product.id_typed().0.as_uuid())
            .bind(version as i64),
            ExpectedVersion::Any => sqlx::query(
                r#"
                UPDATE products
                SET current_stock = $1, version = $2
                WHERE venue_id = $3 AND id = $4
                "#,
            )
            .bind(product.current_stock())
            .bind(product.version() as i64)
            .bind(product.venue_id().as_uuid())
            .bind(product.id_typed().0.as_uuid()),
        };

        let touched = update
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_product_balance", e))?
            .rows_affected();

        if touched == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Concurrency(format!(
                "expected {expected_version:?}, product row was not at that version"
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, venue_id, product_id, movement_type, quantity_change,
                resulting_balance, reason, performed_by_kind, performed_by_user,
                unit_cost, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(movement.id.0.as_uuid())
        .bind(movement.venue_id.as_uuid())
        .bind(movement.product_id.0.as_uuid())
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity_change)
        .bind(movement.resulting_balance)
        .bind(&movement.reason)
        .bind(actor_kind(&movement.performed_by))
        .bind(movement.performed_by.user_id().map(|u| *u.as_uuid()))
        .bind(movement.unit_cost)
        .bind(movement.notes.as_deref())
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    pub async fn list_movements_async(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, StoreError> {
        let type_param: Option<&str> = filter.movement_type.map(|t| t.as_str());

        let rows = sqlx::query(
            r#"
            SELECT id, venue_id, product_id, movement_type, quantity_change,
                   resulting_balance, reason, performed_by_kind,
                   performed_by_user, unit_cost, notes, created_at
            FROM stock_movements
            WHERE venue_id = $1 AND product_id = $2
                AND ($3::text IS NULL OR movement_type = $3)
                AND ($4::timestamptz IS NULL OR created_at >= $4)
                AND ($5::timestamptz IS NULL OR created_at <= $5)
            ORDER BY created_at DESC, id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(venue_id.as_uuid())
        .bind(product_id.0.as_uuid())
        .bind(type_param)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.effective_limit() as i64)
        .bind(filter.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        rows.into_iter().map(movement_from_row).collect()
    }

    pub async fn balances_async(
        &self,
        venue_id: VenueId,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, StoreError> {
        let ids: Vec<Uuid> = product_ids.iter().map(|id| *id.0.as_uuid()).collect();

        let rows = sqlx::query(
            r#"
            SELECT id, current_stock
            FROM products
            WHERE venue_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(venue_id.as_uuid())
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("balances", e))?;

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(row_error)?;
                let stock: Decimal = row.try_get("current_stock").map_err(row_error)?;
                Ok((ProductId(EntityId::from_uuid(id)), stock))
            })
            .collect()
    }
}

/// Bridge the sync trait onto the async pool.
///
/// Works when called from within a tokio runtime (blocking worker threads,
/// `spawn_blocking`); the ledger and availability services run their store
/// calls there.
fn block_on<F: Future>(future: F) -> Result<F::Output, StoreError> {
    let handle = tokio::runtime::Handle::try_current().map_err(|_| {
        StoreError::Backend(
            "PostgresInventoryStore requires a tokio runtime context".to_string(),
        )
    })?;
    Ok(handle.block_on(future))
}

impl InventoryStore for PostgresInventoryStore {
    fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        block_on(self.insert_product_async(product))?
    }

    fn get_product(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        block_on(self.get_product_async(venue_id, product_id))?
    }

    fn insert_package(
        &self,
        package: Package,
        components: Vec<PackageComponent>,
    ) -> Result<(), StoreError> {
        block_on(self.insert_package_async(package, components))?
    }

    fn get_package(
        &self,
        venue_id: VenueId,
        package_id: PackageId,
    ) -> Result<Option<Package>, StoreError> {
        block_on(self.get_package_async(venue_id, package_id))?
    }

    fn list_components(&self, venue_id: VenueId) -> Result<Vec<PackageComponent>, StoreError> {
        block_on(self.list_components_async(venue_id))?
    }

    fn commit_movement(
        &self,
        product: &Product,
        movement: &StockMovement,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        block_on(self.commit_movement_async(product, movement, expected_version))?
    }

    fn list_movements(
        &self,
        venue_id: VenueId,
        product_id: ProductId,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, StoreError> {
        block_on(self.list_movements_async(venue_id, product_id, filter))?
    }

    fn balances(
        &self,
        venue_id: VenueId,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, StoreError> {
        block_on(self.balances_async(venue_id, product_ids))?
    }
}

fn actor_kind(actor: &Actor) -> &'static str {
    if actor.is_system() { "system" } else { "user" }
}

fn row_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to read row: {err}"))
}

fn product_from_row(row: sqlx::postgres::PgRow) -> Result<Product, StoreError> {
    let id: Uuid = row.try_get("id").map_err(row_error)?;
    let venue_id: Uuid = row.try_get("venue_id").map_err(row_error)?;
    let name: String = row.try_get("name").map_err(row_error)?;
    let current_stock: Decimal = row.try_get("current_stock").map_err(row_error)?;
    let reorder_point: Decimal = row.try_get("reorder_point").map_err(row_error)?;
    let reorder_quantity: Decimal = row.try_get("reorder_quantity").map_err(row_error)?;
    let unit_of_measure: String = row.try_get("unit_of_measure").map_err(row_error)?;
    let version: i64 = row.try_get("version").map_err(row_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(row_error)?;

    Ok(Product::rehydrate(
        ProductId(EntityId::from_uuid(id)),
        VenueId::from_uuid(venue_id),
        name,
        current_stock,
        reorder_point,
        reorder_quantity,
        unit_of_measure,
        version as u64,
        created_at,
    ))
}

fn package_from_row(row: sqlx::postgres::PgRow) -> Result<Package, StoreError> {
    let id: Uuid = row.try_get("id").map_err(row_error)?;
    let venue_id: Uuid = row.try_get("venue_id").map_err(row_error)?;
    let name: String = row.try_get("name").map_err(row_error)?;
    let package_type: String = row.try_get("package_type").map_err(row_error)?;
    let base_price: Decimal = row.try_get("base_price").map_err(row_error)?;
    let cost_price: Option<Decimal> = row.try_get("cost_price").map_err(row_error)?;
    let version: i64 = row.try_get("version").map_err(row_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(row_error)?;

    let package_type = PackageType::from_str(&package_type)
        .map_err(|e| StoreError::Backend(format!("corrupt package row: {e}")))?;

    Ok(Package::rehydrate(
        PackageId(EntityId::from_uuid(id)),
        VenueId::from_uuid(venue_id),
        name,
        package_type,
        base_price,
        cost_price,
        version as u64,
        created_at,
    ))
}

fn movement_from_row(row: sqlx::postgres::PgRow) -> Result<StockMovement, StoreError> {
    let id: Uuid = row.try_get("id").map_err(row_error)?;
    let venue_id: Uuid = row.try_get("venue_id").map_err(row_error)?;
    let product_id: Uuid = row.try_get("product_id").map_err(row_error)?;
    let movement_type: String = row.try_get("movement_type").map_err(row_error)?;
    let quantity_change: Decimal = row.try_get("quantity_change").map_err(row_error)?;
    let resulting_balance: Decimal = row.try_get("resulting_balance").map_err(row_error)?;
    let reason: String = row.try_get("reason").map_err(row_error)?;
    let performed_by_kind: String = row.try_get("performed_by_kind").map_err(row_error)?;
    let performed_by_user: Option<Uuid> = row.try_get("performed_by_user").map_err(row_error)?;
    let unit_cost: Option<Decimal> = row.try_get("unit_cost").map_err(row_error)?;
    let notes: Option<String> = row.try_get("notes").map_err(row_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(row_error)?;

    let movement_type = MovementType::from_str(&movement_type)
        .map_err(|e| StoreError::Backend(format!("corrupt movement row: {e}")))?;

    let performed_by = match (performed_by_kind.as_str(), performed_by_user) {
        ("system", _) => Actor::System,
        ("user", Some(user)) => Actor::User(UserId::from_uuid(user)),
        (kind, user) => {
            return Err(StoreError::Backend(format!(
                "corrupt movement row: actor kind '{kind}' with user {user:?}"
            )));
        }
    };

    Ok(StockMovement {
        id: MovementId(EntityId::from_uuid(id)),
        venue_id: VenueId::from_uuid(venue_id),
        product_id: ProductId(EntityId::from_uuid(product_id)),
        movement_type,
        quantity_change,
        resulting_balance,
        reason,
        performed_by,
        unit_cost,
        notes,
        created_at,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Backend(format!(
            "database error in {operation}: {}",
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
