//! # Inventory Allocator (storage side)
//!
//! Executes allocation plans from `vitrina_core::inventory` with conditional
//! decrements, writes the movement ledger, and serves manual movements.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::EngineResult;
use crate::pool::Database;
use crate::repository::{generate_id, movement, product};
use vitrina_core::inventory::{check_branch, plan_manual_movement, AllocationPlan, StockDeduction};
use vitrina_core::validation::{normalize_optional_text, require_text};
use vitrina_core::{CoreError, InventoryMovement, MovementType, OperationType, Sale};

// =============================================================================
// Sale Allocation
// =============================================================================

/// A deduction that went through, with the stock level it left behind.
#[derive(Debug, Clone)]
pub struct ReservedStock {
    pub deduction: StockDeduction,
    pub stock_after: i64,
}

/// Applies every deduction of `plan` or fails on the first short product.
///
/// Runs inside the sale transaction; a failure part-way leaves earlier
/// decrements to the rollback.
pub async fn reserve_stock(
    conn: &mut SqliteConnection,
    plan: &AllocationPlan,
    now: DateTime<Utc>,
) -> EngineResult<Vec<ReservedStock>> {
    let mut reserved = Vec::with_capacity(plan.deductions.len());

    for deduction in &plan.deductions {
        let stock_after = product::decrement_stock(conn, &deduction.product_id, deduction.quantity, now)
            .await?
            .ok_or_else(|| CoreError::InsufficientStock {
                product: deduction.product_name.clone(),
                available: deduction.available,
                requested: deduction.quantity,
            })?;

        reserved.push(ReservedStock {
            deduction: deduction.clone(),
            stock_after,
        });
    }

    debug!(count = reserved.len(), combo = plan.combo_name.is_some(), "Stock reserved");
    Ok(reserved)
}

/// Writes one `out`/`sale` movement per reserved product, linked to the sale.
pub async fn record_sale_movements(
    conn: &mut SqliteConnection,
    reserved: &[ReservedStock],
    reason: &str,
    sale: &Sale,
) -> EngineResult<Vec<InventoryMovement>> {
    let mut movements = Vec::with_capacity(reserved.len());

    for item in reserved {
        let row = InventoryMovement {
            id: generate_id(),
            product_id: item.deduction.product_id.clone(),
            product_name: item.deduction.product_name.clone(),
            branch_name: Some(sale.branch.clone()),
            movement_type: MovementType::Out,
            operation_type: OperationType::Sale,
            quantity: item.deduction.quantity,
            stock_after: item.stock_after,
            reason: Some(reason.to_string()),
            actor_id: sale.manager_id.clone(),
            actor_name: Some(sale.manager_name.clone()),
            sale_id: Some(sale.id.clone()),
            created_at: sale.created_at,
        };
        movement::insert(conn, &row).await?;
        movements.push(row);
    }

    Ok(movements)
}

// =============================================================================
// Manual Movements
// =============================================================================

/// Body of `POST /inventory/movements`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualMovementRequest {
    pub product_id: String,
    pub movement_type: MovementType,
    /// Defaults to manual_in / manual_out / adjustment by direction.
    #[serde(default)]
    pub operation_type: Option<OperationType>,
    pub quantity: i64,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_name: Option<String>,
}

/// Manual stock operations (purchases, write-offs, transfers, counts).
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    pub async fn record_movement(&self, request: ManualMovementRequest) -> EngineResult<InventoryMovement> {
        self.record_movement_at(request, Utc::now()).await
    }

    /// Records a manual movement as of `now`.
    ///
    /// ## Rules
    /// - product must exist; combos have no stock of their own
    /// - branch must match the product's branch when both are set
    /// - operation must agree with the direction (`other` fits any)
    /// - `out` never takes stock below zero; `adjustment` sets the level
    pub async fn record_movement_at(
        &self,
        request: ManualMovementRequest,
        now: DateTime<Utc>,
    ) -> EngineResult<InventoryMovement> {
        let product_id = require_text("productId", &request.product_id)?;
        let branch = normalize_optional_text(request.branch.as_deref());

        let mut tx = self.db.pool().begin().await?;

        let current = product::fetch_by_id(&mut tx, &product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;
        check_branch(&current, branch.as_deref())?;

        let plan = plan_manual_movement(
            &current,
            request.movement_type,
            request.operation_type,
            request.quantity,
        )?;

        let stock_after = match request.movement_type {
            MovementType::In => product::increment_stock(&mut tx, &product_id, plan.quantity, now).await?,
            MovementType::Out => product::decrement_stock(&mut tx, &product_id, plan.quantity, now).await?,
            MovementType::Adjustment => product::set_stock(&mut tx, &product_id, plan.quantity, now).await?,
        }
        .ok_or_else(|| CoreError::InsufficientStock {
            product: current.name.clone(),
            available: current.stock_qty,
            requested: plan.quantity,
        })?;

        let row = InventoryMovement {
            id: generate_id(),
            product_id: current.id.clone(),
            product_name: current.name.clone(),
            branch_name: branch.or_else(|| current.branch_name.clone()),
            movement_type: request.movement_type,
            operation_type: plan.operation,
            quantity: plan.quantity,
            stock_after,
            reason: normalize_optional_text(request.reason.as_deref()),
            actor_id: normalize_optional_text(request.actor_id.as_deref()),
            actor_name: normalize_optional_text(request.actor_name.as_deref()),
            sale_id: None,
            created_at: now,
        };
        movement::insert(&mut tx, &row).await?;

        tx.commit().await?;

        info!(
            product_id = %row.product_id,
            movement_type = ?row.movement_type,
            operation = ?row.operation_type,
            quantity = row.quantity,
            stock_after = row.stock_after,
            "Manual stock movement recorded"
        );
        Ok(row)
    }
}
