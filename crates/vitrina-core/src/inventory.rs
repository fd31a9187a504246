//! # Inventory Module
//!
//! Stock allocation planning for sales and manual movements.
//!
//! The database layer executes these plans with atomic conditional
//! decrements; the plans themselves decide *what* must move and reject
//! anything that cannot be fully satisfied before a single row changes.
//!
//! ## Combo Expansion
//! ```text
//! Sale: "Gift Box" × 2
//!        │
//!        ▼
//!  combo_items ──► Mug   × 1  ──► required 2  (stock 5)  ✅
//!              └─► Tea   × 3  ──► required 6  (stock 4)  ❌ InsufficientStock
//!        │
//!        ▼
//!  All-or-nothing: nothing is deducted, no movement rows
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{MovementType, OperationType, Product};

// =============================================================================
// Branch Rules
// =============================================================================

/// Rejects a sale or movement whose branch differs from the product's.
///
/// A product without a branch, or a request without one, always passes.
pub fn check_branch(product: &Product, requested_branch: Option<&str>) -> CoreResult<()> {
    match (product.branch_name.as_deref(), requested_branch) {
        (Some(owner), Some(requested)) if owner != requested => Err(CoreError::BranchMismatch {
            product: product.name.clone(),
            product_branch: owner.to_string(),
            requested_branch: requested.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Branch recorded on a sale: request, else product, else the default.
pub fn resolve_branch(requested: Option<&str>, product: &Product, default_branch: &str) -> String {
    requested
        .or(product.branch_name.as_deref())
        .unwrap_or(default_branch)
        .to_string()
}

// =============================================================================
// Sale Allocation
// =============================================================================

/// One stock decrement a sale needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDeduction {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    /// Stock observed when planning; the decrement re-checks atomically.
    pub available: i64,
}

/// Stock decrements and cost basis for one sale line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Combo name when the sold product is a combo.
    pub combo_name: Option<String>,
    pub deductions: Vec<StockDeduction>,
    /// Effective cost per sold unit.
    pub cost_per_unit: Money,
}

impl AllocationPlan {
    /// Movement reason for the stock rows.
    pub fn movement_reason(&self, sale_id: &str) -> String {
        match &self.combo_name {
            Some(name) => format!("Combo sale {name}"),
            None => format!("Sale {sale_id}"),
        }
    }
}

/// Plans the stock effects of selling `quantity` units of `product`.
///
/// ## Arguments
/// * `components` - current rows of the combo's component products (ignored
///   for simple products)
/// * `cost_override` - explicit cost per unit for simple products
///
/// ## Errors
/// - `EmptyCombo` when a combo has no components
/// - `ComboComponentMissing` naming the first missing component
/// - `InsufficientStock` naming the first short product
pub fn plan_allocation(
    product: &Product,
    quantity: i64,
    components: &[Product],
    cost_override: Option<Money>,
) -> CoreResult<AllocationPlan> {
    if !product.is_combo {
        ensure_available(&product.name, product.stock_qty, quantity)?;
        return Ok(AllocationPlan {
            combo_name: None,
            deductions: vec![StockDeduction {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                quantity,
                available: product.stock_qty,
            }],
            cost_per_unit: cost_override.unwrap_or_else(|| product.cost_price()),
        });
    }

    if product.combo_items.is_empty() {
        return Err(CoreError::EmptyCombo(product.name.clone()));
    }

    let mut deductions = Vec::with_capacity(product.combo_items.len());
    let mut cost_per_unit = Money::zero();

    // Verify every component before producing any deduction.
    for item in &product.combo_items {
        let component = components
            .iter()
            .find(|c| c.id == item.product_id)
            .ok_or_else(|| CoreError::ComboComponentMissing {
                combo: product.name.clone(),
                component_id: item.product_id.clone(),
            })?;

        let required = item
            .quantity
            .checked_mul(quantity)
            .ok_or_else(|| ValidationError::overflow("quantity"))?;
        ensure_available(&component.name, component.stock_qty, required)?;

        cost_per_unit = component
            .cost_price()
            .checked_mul(item.quantity)
            .and_then(|cost| cost_per_unit.checked_add(cost))
            .ok_or_else(|| ValidationError::overflow("costPrice"))?;
        deductions.push(StockDeduction {
            product_id: component.id.clone(),
            product_name: component.name.clone(),
            quantity: required,
            available: component.stock_qty,
        });
    }

    Ok(AllocationPlan {
        combo_name: Some(product.name.clone()),
        deductions,
        cost_per_unit,
    })
}

fn ensure_available(product: &str, available: i64, requested: i64) -> CoreResult<()> {
    if available < requested {
        return Err(CoreError::InsufficientStock {
            product: product.to_string(),
            available,
            requested,
        });
    }
    Ok(())
}

// =============================================================================
// Manual Movements
// =============================================================================

/// Direction an operation must be recorded with; `None` means any.
///
/// | operation                                              | direction  |
/// |--------------------------------------------------------|------------|
/// | sale, writeoff, return_out, transfer_out, manual_out   | out        |
/// | purchase, return_in, transfer_in, manual_in            | in         |
/// | adjustment                                             | adjustment |
/// | other                                                  | any        |
pub fn expected_direction(operation: OperationType) -> Option<MovementType> {
    match operation {
        OperationType::Sale
        | OperationType::Writeoff
        | OperationType::ReturnOut
        | OperationType::TransferOut
        | OperationType::ManualOut => Some(MovementType::Out),
        OperationType::Purchase
        | OperationType::ReturnIn
        | OperationType::TransferIn
        | OperationType::ManualIn => Some(MovementType::In),
        OperationType::Adjustment => Some(MovementType::Adjustment),
        OperationType::Other => None,
    }
}

/// Operation assumed when a manual movement does not name one.
pub fn default_operation(movement: MovementType) -> OperationType {
    match movement {
        MovementType::In => OperationType::ManualIn,
        MovementType::Out => OperationType::ManualOut,
        MovementType::Adjustment => OperationType::Adjustment,
    }
}

/// Outcome of a manual stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualMovementPlan {
    pub operation: OperationType,
    /// Absolute quantity recorded on the movement row.
    pub quantity: i64,
    pub stock_after: i64,
}

/// Plans a manual movement against the current stock.
///
/// ## Rules
/// - quantity is taken as an absolute value and must be > 0
/// - the operation must match the movement direction (except `other`)
/// - `out` may not take stock below zero
/// - `adjustment` sets stock to the quantity
pub fn plan_manual_movement(
    product: &Product,
    movement: MovementType,
    operation: Option<OperationType>,
    quantity: i64,
) -> CoreResult<ManualMovementPlan> {
    let quantity = quantity
        .checked_abs()
        .ok_or_else(|| ValidationError::overflow("quantity"))?;
    if quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    let operation = operation.unwrap_or_else(|| default_operation(movement));
    if let Some(expected) = expected_direction(operation) {
        if expected != movement {
            return Err(CoreError::OperationDirectionMismatch {
                operation: operation.as_str().to_string(),
                movement: movement.as_str().to_string(),
            });
        }
    }

    if product.is_combo {
        return Err(CoreError::ComboStockImmutable(product.name.clone()));
    }

    let stock_after = match movement {
        MovementType::In => product
            .stock_qty
            .checked_add(quantity)
            .ok_or_else(|| ValidationError::overflow("quantity"))?,
        MovementType::Out => {
            ensure_available(&product.name, product.stock_qty, quantity)?;
            product.stock_qty - quantity
        }
        MovementType::Adjustment => quantity,
    };

    Ok(ManualMovementPlan {
        operation,
        quantity,
        stock_after,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
