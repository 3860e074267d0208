use crate::{
    db::DbPool,
    entities::{
        product::{self, Entity as ProductEntity, ProductCategory},
        production_goal::{self, Entity as ProductionGoalEntity},
        production_log::{self, ActionType, Entity as ProductionLogEntity},
        recipe_line::{self, Entity as RecipeLineEntity, RequirementKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::{insert_goal, GoalInput},
    services::inventory::adjust_count_on,
    services::requirements::Substitution,
};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// The goal & fulfilment state machine. Every public method is one database
/// transaction: on any error the transaction rolls back and no caller-visible
/// effect remains.
///
/// Two production paths exist. MAKE (`log_production`) builds a unit from raw
/// materials against a goal; PACK (`fulfill_goal`) serves a goal from cooler
/// stock; STOCK (`produce_stock`) builds straight into cooler stock with no
/// goal. Undo always reverses the single most recent log entry in scope and
/// must mirror the original path.
#[derive(Clone)]
pub struct ProductionService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ProductionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Schedules demand for a product version.
    #[instrument(skip(self))]
    pub async fn schedule_goal(
        &self,
        product_id: i64,
        due_date: NaiveDate,
        qty_ordered: i32,
    ) -> Result<i64, ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        require_product(&txn, product_id).await?;
        let goal_id = insert_goal(
            &txn,
            product_id,
            &GoalInput {
                due_date,
                qty_ordered,
            },
        )
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::GoalScheduled {
                goal_id,
                product_id,
            })
            .await;

        Ok(goal_id)
    }

    /// The MAKE path: build one unit from raw materials against a goal.
    ///
    /// Specific recipe lines are deducted from the ledger unless
    /// `ignore_standard_recipe` is set; `substitutions` (the resolved
    /// allocation for category lines, or a manual override) are deducted on
    /// top, verbatim. Ledger counts may go negative here — a known policy
    /// gap carried over from the original system, reconciled by stock-take.
    #[instrument(skip(self, substitutions))]
    pub async fn log_production(
        &self,
        goal_id: i64,
        substitutions: &[Substitution],
        ignore_standard_recipe: bool,
    ) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let goal = require_goal(&txn, goal_id).await?;
        deduct_materials(&txn, goal.product_id, substitutions, ignore_standard_recipe).await?;

        let product_id = goal.product_id;
        let mut active = goal.clone().into_active_model();
        active.qty_fulfilled = Set(goal.qty_fulfilled + 1);
        active.update(&txn).await?;

        append_entry(&txn, Some(goal_id), product_id, ActionType::Make).await?;

        txn.commit().await?;

        info!(goal_id, product_id, "production logged");
        self.event_sender
            .send_or_log(Event::ProductionLogged {
                goal_id,
                product_id,
            })
            .await;

        Ok(())
    }

    /// The PACK path: fulfil a goal from cooler stock. The request clamps to
    /// `min(qty, stock_on_hand, remaining need)`; a clamp of zero fails with
    /// `InsufficientStock` and no mutation. One log entry is written per
    /// packed unit so undo stays unit-granular. Returns the quantity
    /// actually packed — callers must not assume it equals the request.
    #[instrument(skip(self))]
    pub async fn fulfill_goal(&self, goal_id: i64, qty: i32) -> Result<i32, ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let goal = require_goal(&txn, goal_id).await?;
        let product = require_product(&txn, goal.product_id).await?;

        let clamped = qty.min(product.stock_on_hand).min(goal.remaining());
        if clamped <= 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "goal {}: stock {}, remaining {}, requested {}",
                goal_id,
                product.stock_on_hand,
                goal.remaining(),
                qty
            )));
        }

        let product_id = product.id;
        let new_stock = product.stock_on_hand - clamped;
        let one_off = product.category == ProductCategory::OneOff;

        let mut product_active = product.into_active_model();
        product_active.stock_on_hand = Set(new_stock);
        product_active.updated_at = Set(Utc::now());
        product_active.update(&txn).await?;

        let mut goal_active = goal.clone().into_active_model();
        goal_active.qty_fulfilled = Set(goal.qty_fulfilled + clamped);
        goal_active.update(&txn).await?;

        for _ in 0..clamped {
            append_entry(&txn, Some(goal_id), product_id, ActionType::Pack).await?;
        }

        // A one-off that has fully shipped leaves the active catalog on its
        // own: stock gone and no goal for it still open.
        if one_off && new_stock == 0 && !has_open_goal(&txn, product_id).await? {
            let product = require_product(&txn, product_id).await?;
            let mut archived = product.into_active_model();
            archived.active = Set(false);
            archived.updated_at = Set(Utc::now());
            archived.update(&txn).await?;
        }

        txn.commit().await?;

        info!(goal_id, packed = clamped, "goal fulfilled from stock");
        self.event_sender
            .send_or_log(Event::GoalFulfilled {
                goal_id,
                packed: clamped,
            })
            .await;

        Ok(clamped)
    }

    /// The STOCK path: build one unit straight into cooler stock. Deduction
    /// rules match `log_production`; the log entry carries no goal id.
    #[instrument(skip(self, substitutions))]
    pub async fn produce_stock(
        &self,
        product_id: i64,
        substitutions: &[Substitution],
        ignore_standard_recipe: bool,
    ) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let product = require_product(&txn, product_id).await?;
        deduct_materials(&txn, product_id, substitutions, ignore_standard_recipe).await?;

        let new_stock = product.stock_on_hand + 1;
        let mut active = product.into_active_model();
        active.stock_on_hand = Set(new_stock);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        append_entry(&txn, None, product_id, ActionType::Stock).await?;

        txn.commit().await?;

        info!(product_id, "stock produced");
        self.event_sender
            .send_or_log(Event::StockProduced { product_id })
            .await;

        Ok(())
    }

    /// Reverses the most recent log entry for a goal. A PACK entry is
    /// undone as a stock return (the unit goes back to the cooler), never
    /// as a ledger restoration; a MAKE entry restores the Specific-line
    /// quantities of the recipe belonging to the product id recorded on the
    /// entry — not the goal's current product, which may have been
    /// re-versioned since.
    #[instrument(skip(self))]
    pub async fn undo_production(&self, goal_id: i64) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let goal = require_goal(&txn, goal_id).await?;
        let entry = latest_entry_for_goal(&txn, goal_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("no production to undo for goal {}", goal_id))
            })?;

        match entry.action {
            ActionType::Pack => {
                return_to_stock(&txn, entry.product_id, 1).await?;
            }
            ActionType::Make | ActionType::Stock => {
                restore_specific_lines(&txn, entry.product_id).await?;
            }
        }

        let mut active = goal.clone().into_active_model();
        active.qty_fulfilled = Set(goal.qty_fulfilled - 1);
        active.update(&txn).await?;

        entry.delete(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ProductionUndone { goal_id })
            .await;

        Ok(())
    }

    /// PACK-only undo: the latest entry for the goal must be a PACK, which
    /// is returned to cooler stock.
    #[instrument(skip(self))]
    pub async fn undo_fulfillment(&self, goal_id: i64) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let goal = require_goal(&txn, goal_id).await?;
        let entry = latest_entry_for_goal(&txn, goal_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("no fulfilment to undo for goal {}", goal_id))
            })?;

        if entry.action != ActionType::Pack {
            return Err(ServiceError::InvalidOperation(format!(
                "last action for goal {} was {}, not a pack",
                goal_id, entry.action
            )));
        }

        return_to_stock(&txn, entry.product_id, 1).await?;

        let mut active = goal.clone().into_active_model();
        active.qty_fulfilled = Set(goal.qty_fulfilled - 1);
        active.update(&txn).await?;

        entry.delete(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::FulfillmentUndone { goal_id })
            .await;

        Ok(())
    }

    /// Undo in the cooler-stock scope (product id with null goal id):
    /// restores the recipe's Specific lines and removes the unit from
    /// stock.
    #[instrument(skip(self))]
    pub async fn undo_stock_production(&self, product_id: i64) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let product = require_product(&txn, product_id).await?;
        let entry = latest_stock_entry(&txn, product_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!(
                "no stock production to undo for product {}",
                product_id
            ))
        })?;

        restore_specific_lines(&txn, entry.product_id).await?;

        let mut active = product.clone().into_active_model();
        active.stock_on_hand = Set(product.stock_on_hand - 1);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        entry.delete(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::StockProductionUndone { product_id })
            .await;

        Ok(())
    }

    /// Overwrites the ordered quantity and reports the resulting overage,
    /// `max(0, qty_fulfilled - new_qty_ordered)`. Nothing moves here; the
    /// overage must be resolved explicitly via `release_overage_to_stock`.
    #[instrument(skip(self))]
    pub async fn update_goal_quantity(
        &self,
        goal_id: i64,
        new_qty_ordered: i32,
    ) -> Result<i32, ServiceError> {
        if new_qty_ordered < 0 {
            return Err(ServiceError::ValidationError(
                "ordered quantity cannot be negative".into(),
            ));
        }

        let db = self.connection();
        let goal = require_goal(db, goal_id).await?;

        let overage = (goal.qty_fulfilled - new_qty_ordered).max(0);

        let mut active = goal.into_active_model();
        active.qty_ordered = Set(new_qty_ordered);
        active.update(db).await?;

        self.event_sender
            .send_or_log(Event::GoalQuantityChanged { goal_id, overage })
            .await;

        Ok(overage)
    }

    /// Moves `qty` units of fulfilled progress back into cooler stock and
    /// reclassifies the matching tail of the goal's log: PACK entries are
    /// deleted outright, MAKE/STOCK entries are detached into plain stock
    /// history.
    #[instrument(skip(self))]
    pub async fn release_overage_to_stock(
        &self,
        goal_id: i64,
        qty: i32,
    ) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let goal = require_goal(&txn, goal_id).await?;
        if qty <= 0 || qty > goal.qty_fulfilled {
            return Err(ServiceError::ValidationError(format!(
                "cannot release {} units from goal {} with {} fulfilled",
                qty, goal_id, goal.qty_fulfilled
            )));
        }

        release_units(&txn, &goal, qty).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OverageReleased { goal_id, qty })
            .await;

        Ok(())
    }

    /// Removes a goal. Completed work is never discarded: fulfilled units
    /// go back to cooler stock first (with the same log reclassification as
    /// an overage release), and any history rows still attached are
    /// detached before the row is deleted.
    #[instrument(skip(self))]
    pub async fn delete_production_goal(&self, goal_id: i64) -> Result<(), ServiceError> {
        let db = self.connection();
        let txn = db.begin().await?;

        let goal = require_goal(&txn, goal_id).await?;
        let released = goal.qty_fulfilled;

        if released > 0 {
            release_units(&txn, &goal, released).await?;
        }

        // Entries can outnumber the fulfilled count after manual goal
        // edits; detach whatever is left so the history survives the row.
        let leftovers = ProductionLogEntity::find()
            .filter(production_log::Column::GoalId.eq(goal_id))
            .all(&txn)
            .await?;
        for entry in leftovers {
            if entry.action == ActionType::Pack {
                entry.delete(&txn).await?;
            } else {
                let mut detached = entry.into_active_model();
                detached.goal_id = Set(None);
                detached.action = Set(ActionType::Stock);
                detached.update(&txn).await?;
            }
        }

        ProductionGoalEntity::delete_by_id(goal_id).exec(&txn).await?;

        txn.commit().await?;

        info!(goal_id, released, "goal deleted");
        self.event_sender
            .send_or_log(Event::GoalDeleted {
                goal_id,
                released_to_stock: released,
            })
            .await;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_goal(
        &self,
        goal_id: i64,
    ) -> Result<Option<production_goal::Model>, ServiceError> {
        Ok(ProductionGoalEntity::find_by_id(goal_id)
            .one(self.connection())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn goals_for_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<production_goal::Model>, ServiceError> {
        Ok(ProductionGoalEntity::find()
            .filter(production_goal::Column::ProductId.eq(product_id))
            .order_by_asc(production_goal::Column::DueDate)
            .all(self.connection())
            .await?)
    }

    fn connection(&self) -> &DbPool {
        self.db_pool.as_ref()
    }
}

async fn require_goal<C: ConnectionTrait>(
    conn: &C,
    goal_id: i64,
) -> Result<production_goal::Model, ServiceError> {
    ProductionGoalEntity::find_by_id(goal_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("production goal {} not found", goal_id)))
}

async fn require_product<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
) -> Result<product::Model, ServiceError> {
    ProductEntity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("product {} not found", product_id)))
}

/// Deducts one unit's worth of materials: the recipe's Specific lines
/// (unless skipped) plus the supplied substitutions, applied verbatim. The
/// only generic-requirement check made here is that a recipe with category
/// lines is not produced with an empty substitution list; allocation policy
/// lives with the caller (`services::requirements`).
async fn deduct_materials<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
    substitutions: &[Substitution],
    ignore_standard_recipe: bool,
) -> Result<(), ServiceError> {
    if !ignore_standard_recipe {
        let lines = RecipeLineEntity::find()
            .filter(recipe_line::Column::ProductId.eq(product_id))
            .all(conn)
            .await?;

        let has_generics = lines
            .iter()
            .any(|line| line.kind == RequirementKind::Category);
        if has_generics && substitutions.is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "recipe for product {} has category requirements; substitutions are required",
                product_id
            )));
        }

        for line in lines
            .iter()
            .filter(|line| line.kind == RequirementKind::Specific)
        {
            if let Some(item_id) = line.item_id {
                adjust_count_on(conn, item_id, -line.qty_needed).await?;
            }
        }
    }

    for sub in substitutions {
        if sub.qty <= 0 {
            return Err(ServiceError::ValidationError(
                "substitution quantities must be positive".into(),
            ));
        }
        adjust_count_on(conn, sub.item_id, -sub.qty).await?;
    }

    Ok(())
}

/// Credits the Specific lines of a product version's recipe back to the
/// ledger (the MAKE undo). Substitution deductions are not recorded on the
/// log and therefore cannot be restored here.
async fn restore_specific_lines<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
) -> Result<(), ServiceError> {
    let lines = RecipeLineEntity::find()
        .filter(recipe_line::Column::ProductId.eq(product_id))
        .filter(recipe_line::Column::Kind.eq(RequirementKind::Specific))
        .all(conn)
        .await?;

    for line in lines {
        if let Some(item_id) = line.item_id {
            adjust_count_on(conn, item_id, line.qty_needed).await?;
        }
    }
    Ok(())
}

async fn return_to_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
    qty: i32,
) -> Result<(), ServiceError> {
    let product = require_product(conn, product_id).await?;
    let mut active = product.clone().into_active_model();
    active.stock_on_hand = Set(product.stock_on_hand + qty);
    active.updated_at = Set(Utc::now());
    active.update(conn).await?;
    Ok(())
}

async fn append_entry<C: ConnectionTrait>(
    conn: &C,
    goal_id: Option<i64>,
    product_id: i64,
    action: ActionType,
) -> Result<(), ServiceError> {
    let model = production_log::ActiveModel {
        id: Default::default(),
        goal_id: Set(goal_id),
        product_id: Set(product_id),
        action: Set(action),
        logged_at: Set(Utc::now()),
    };
    model.insert(conn).await?;
    Ok(())
}

/// Largest-id entry for a goal: the only reversible one in that scope.
async fn latest_entry_for_goal<C: ConnectionTrait>(
    conn: &C,
    goal_id: i64,
) -> Result<Option<production_log::Model>, ServiceError> {
    Ok(ProductionLogEntity::find()
        .filter(production_log::Column::GoalId.eq(goal_id))
        .order_by_desc(production_log::Column::Id)
        .one(conn)
        .await?)
}

/// Largest-id entry in the cooler-stock scope (null goal id).
async fn latest_stock_entry<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
) -> Result<Option<production_log::Model>, ServiceError> {
    Ok(ProductionLogEntity::find()
        .filter(production_log::Column::ProductId.eq(product_id))
        .filter(production_log::Column::GoalId.is_null())
        .order_by_desc(production_log::Column::Id)
        .one(conn)
        .await?)
}

async fn has_open_goal<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
) -> Result<bool, ServiceError> {
    let open = ProductionGoalEntity::find()
        .filter(production_goal::Column::ProductId.eq(product_id))
        .filter(
            Expr::col(production_goal::Column::QtyFulfilled)
                .lt(Expr::col(production_goal::Column::QtyOrdered)),
        )
        .one(conn)
        .await?;
    Ok(open.is_some())
}

/// Moves `qty` fulfilled units from a goal into cooler stock and rewrites
/// the matching tail of its log: PACK entries disappear (their effect is
/// the stock credit itself), MAKE/STOCK entries become plain stock history.
async fn release_units<C: ConnectionTrait>(
    conn: &C,
    goal: &production_goal::Model,
    qty: i32,
) -> Result<(), ServiceError> {
    let mut goal_active = goal.clone().into_active_model();
    goal_active.qty_fulfilled = Set(goal.qty_fulfilled - qty);
    goal_active.update(conn).await?;

    return_to_stock(conn, goal.product_id, qty).await?;

    let tail = ProductionLogEntity::find()
        .filter(production_log::Column::GoalId.eq(goal.id))
        .order_by_desc(production_log::Column::Id)
        .limit(qty as u64)
        .all(conn)
        .await?;

    for entry in tail {
        if entry.action == ActionType::Pack {
            entry.delete(conn).await?;
        } else {
            let mut detached = entry.into_active_model();
            detached.goal_id = Set(None);
            detached.action = Set(ActionType::Stock);
            detached.update(conn).await?;
        }
    }

    Ok(())
}
