//! Repository for inventory items and the issuance ledger.
//!
//! Every stock change locks the item row, applies the domain stock rules, and
//! writes the ledger in the same transaction.

use domain::models::inventory::{check_issue, check_return, outstanding_for, resize_stock};
use domain::models::{InventoryError, InventoryItem, Issuance, IssuanceKind};
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::entities::{InventoryItemEntity, IssuanceEntity, IssuanceKindDb};
use crate::metrics::QueryTimer;

const LEDGER_SELECT: &str = r#"
    SELECT i.id, i.item_id, i.user_id, u.name AS user_name, u.college_id,
           i.quantity, i.project, i.kind, i.issue_date
    FROM inventory_issuances i
    JOIN users u ON u.id = i.user_id
"#;

/// Failure of a stock-changing operation.
#[derive(Debug, Error)]
pub enum StockChangeError {
    #[error(transparent)]
    Rule(#[from] InventoryError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct NewItem<'a> {
    pub item_name: &'a str,
    pub category: &'a str,
    pub total_quantity: i32,
    pub location: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub item_name: Option<String>,
    pub category: Option<String>,
    pub total_quantity: Option<i32>,
    pub location: Option<String>,
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists every item with its ledger, alphabetically.
    pub async fn list(&self) -> Result<Vec<InventoryItem>, sqlx::Error> {
        let timer = QueryTimer::new("list_inventory_items");
        let items = sqlx::query_as::<_, InventoryItemEntity>(
            r#"
            SELECT id, item_name, category, total_quantity, available_quantity,
                   location, created_at, updated_at
            FROM inventory_items
            ORDER BY item_name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
        let mut ledgers = self.ledgers_for(&ids).await?;
        timer.record();

        Ok(items
            .into_iter()
            .map(|item| {
                let ledger = ledgers.remove(&item.id).unwrap_or_default();
                item.into_item(ledger)
            })
            .collect())
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<InventoryItem>, sqlx::Error> {
        let timer = QueryTimer::new("find_inventory_item");
        let item = sqlx::query_as::<_, InventoryItemEntity>(
            r#"
            SELECT id, item_name, category, total_quantity, available_quantity,
                   location, created_at, updated_at
            FROM inventory_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(item) = item else {
            timer.record();
            return Ok(None);
        };
        let ledger = self.ledgers_for(&[id]).await?.remove(&id).unwrap_or_default();
        timer.record();
        Ok(Some(item.into_item(ledger)))
    }

    /// Adds an item with all units available.
    pub async fn create(&self, new_item: &NewItem<'_>) -> Result<InventoryItem, sqlx::Error> {
        let timer = QueryTimer::new("create_inventory_item");
        let item = sqlx::query_as::<_, InventoryItemEntity>(
            r#"
            INSERT INTO inventory_items (item_name, category, total_quantity,
                                         available_quantity, location)
            VALUES ($1, $2, $3, $3, $4)
            RETURNING id, item_name, category, total_quantity, available_quantity,
                      location, created_at, updated_at
            "#,
        )
        .bind(new_item.item_name)
        .bind(new_item.category)
        .bind(new_item.total_quantity)
        .bind(new_item.location)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(item.into_item(Vec::new()))
    }

    /// Updates descriptive fields and, when given, resizes the stock while
    /// keeping issued units accounted for.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &ItemChanges,
    ) -> Result<InventoryItem, StockChangeError> {
        let timer = QueryTimer::new("update_inventory_item");
        let mut tx = self.pool.begin().await?;

        let (total, available) = lock_stock(&mut tx, id).await?;

        let (new_total, new_available) = match changes.total_quantity {
            Some(new_total) => (new_total, resize_stock(total, available, new_total)?),
            None => (total, available),
        };

        sqlx::query(
            r#"
            UPDATE inventory_items
            SET item_name = COALESCE($2, item_name),
                category = COALESCE($3, category),
                location = COALESCE($4, location),
                total_quantity = $5,
                available_quantity = $6,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.item_name.as_deref())
        .bind(changes.category.as_deref())
        .bind(changes.location.as_deref())
        .bind(new_total)
        .bind(new_available)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        self.reload(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_inventory_item");
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Issues `quantity` units to a user.
    ///
    /// The item row is locked for the whole check-then-write, so concurrent
    /// issues queue up and none can oversell. State is unchanged on any error.
    pub async fn issue(
        &self,
        item_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        project: Option<&str>,
    ) -> Result<InventoryItem, StockChangeError> {
        if quantity < 1 {
            return Err(InventoryError::InvalidQuantity.into());
        }

        let timer = QueryTimer::new("issue_inventory_item");
        let mut tx = self.pool.begin().await?;

        let (_, available) = lock_stock(&mut tx, item_id).await?;
        let remaining = match check_issue(available, quantity) {
            Ok(remaining) => remaining,
            Err(rule) => {
                tx.rollback().await?;
                timer.record();
                debug!(%item_id, %user_id, quantity, available, "Issue rejected");
                return Err(rule.into());
            }
        };

        set_available(&mut tx, item_id, remaining).await?;
        insert_ledger_entry(&mut tx, item_id, user_id, quantity, project, IssuanceKind::Issue)
            .await?;

        tx.commit().await?;
        timer.record();
        self.reload(item_id).await
    }

    /// Returns units the user previously took.
    pub async fn return_stock(
        &self,
        item_id: Uuid,
        user_id: Uuid,
        quantity: i32,
    ) -> Result<InventoryItem, StockChangeError> {
        let timer = QueryTimer::new("return_inventory_item");
        let mut tx = self.pool.begin().await?;

        let (total, available) = lock_stock(&mut tx, item_id).await?;

        let held: Vec<Issuance> = sqlx::query_as::<_, IssuanceEntity>(&format!(
            "{LEDGER_SELECT} WHERE i.item_id = $1 AND i.user_id = $2"
        ))
        .bind(item_id)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(Issuance::from)
        .collect();

        let outstanding = outstanding_for(&held, user_id);
        let new_available = match check_return(available, total, outstanding, quantity) {
            Ok(new_available) => new_available,
            Err(rule) => {
                tx.rollback().await?;
                timer.record();
                debug!(%item_id, %user_id, quantity, outstanding, "Return rejected");
                return Err(rule.into());
            }
        };

        set_available(&mut tx, item_id, new_available).await?;
        insert_ledger_entry(&mut tx, item_id, user_id, quantity, None, IssuanceKind::Return)
            .await?;

        tx.commit().await?;
        timer.record();
        self.reload(item_id).await
    }

    async fn reload(&self, id: Uuid) -> Result<InventoryItem, StockChangeError> {
        self.find(id)
            .await?
            .ok_or(StockChangeError::Rule(InventoryError::ItemNotFound))
    }

    async fn ledgers_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Issuance>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, IssuanceEntity>(&format!(
            "{LEDGER_SELECT} WHERE i.item_id = ANY($1) ORDER BY i.issue_date, i.id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut ledgers: HashMap<Uuid, Vec<Issuance>> = HashMap::new();
        for row in rows {
            ledgers.entry(row.item_id).or_default().push(row.into());
        }
        Ok(ledgers)
    }
}

/// Locks the item row and returns `(total, available)`.
async fn lock_stock(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: Uuid,
) -> Result<(i32, i32), StockChangeError> {
    let stock: Option<(i32, i32)> = sqlx::query_as(
        "SELECT total_quantity, available_quantity FROM inventory_items WHERE id = $1 FOR UPDATE",
    )
    .bind(item_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(stock.ok_or(InventoryError::ItemNotFound)?)
}

async fn set_available(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: Uuid,
    available: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE inventory_items SET available_quantity = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(item_id)
    .bind(available)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_ledger_entry(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: Uuid,
    user_id: Uuid,
    quantity: i32,
    project: Option<&str>,
    kind: IssuanceKind,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO inventory_issuances (item_id, user_id, quantity, project, kind)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(item_id)
    .bind(user_id)
    .bind(quantity)
    .bind(project)
    .bind(IssuanceKindDb::from(kind))
    .execute(&mut **tx)
    .await?;
    Ok(())
}
