//! Read-only reporting over the entities and the production log.
//!
//! Forecasting and history views consume the log and the recipe-line
//! history but never write them; all writes go through the services.

use crate::{
    db::DbPool,
    entities::{
        inventory_item::{self, Entity as InventoryItemEntity},
        product::{self, Entity as ProductEntity},
        production_goal::{self, Entity as ProductionGoalEntity},
        production_log::{self, ActionType, Entity as ProductionLogEntity},
        recipe_line::{self, Entity as RecipeLineEntity, RequirementKind},
    },
    errors::ServiceError,
};
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Goals aggregated per product per week (weeks start Monday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyGoalSummary {
    pub week_start: NaiveDate,
    pub product_id: i64,
    pub product_name: String,
    pub qty_ordered: i32,
    pub qty_fulfilled: i32,
}

/// Cooler stock held against demand due inside a date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRequirement {
    pub product_id: i64,
    pub product_name: String,
    /// False for archived versions that still carry open goals.
    pub active: bool,
    pub stock_on_hand: i32,
    pub required_qty: i32,
}

/// One goal row with its product resolved, for the goal management table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalOverview {
    pub goal_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub active: bool,
    pub due_date: NaiveDate,
    pub qty_ordered: i32,
    pub qty_fulfilled: i32,
}

/// Purchase forecast line: how much of one raw material a production
/// scenario needs, netted against stock and rounded up to purchase packs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub item_id: i64,
    pub item_name: String,
    pub total_needed: i32,
    /// On-hand count, in purchase packs.
    pub count_on_hand: i32,
    pub bundle_count: i32,
    pub deficit_units: i32,
    pub packs_to_buy: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionHistoryEntry {
    pub log_id: i64,
    pub goal_id: Option<i64>,
    pub product_id: i64,
    pub product_name: String,
    pub action: ActionType,
    pub logged_at: DateTime<Utc>,
}

/// Goals grouped by the Monday of their due week, for weekly planning.
pub async fn weekly_goal_summary(db: &DbPool) -> Result<Vec<WeeklyGoalSummary>, ServiceError> {
    let rows = ProductionGoalEntity::find()
        .find_also_related(ProductEntity)
        .order_by_asc(production_goal::Column::DueDate)
        .all(db)
        .await?;

    let mut buckets: BTreeMap<(NaiveDate, i64), WeeklyGoalSummary> = BTreeMap::new();
    for (goal, maybe_product) in rows {
        let Some(product) = maybe_product else {
            continue;
        };
        let week_start = goal.due_date.week(Weekday::Mon).first_day();
        let entry = buckets
            .entry((week_start, product.id))
            .or_insert_with(|| WeeklyGoalSummary {
                week_start,
                product_id: product.id,
                product_name: product.display_name.clone(),
                qty_ordered: 0,
                qty_fulfilled: 0,
            });
        entry.qty_ordered += goal.qty_ordered;
        entry.qty_fulfilled += goal.qty_fulfilled;
    }

    Ok(buckets.into_values().collect())
}

/// Per-product stock-versus-need view for a date window. Active products
/// always appear (required 0 when nothing is due); archived versions appear
/// only while open goals still point at them.
pub async fn production_requirements(
    db: &DbPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ProductionRequirement>, ServiceError> {
    let goals = ProductionGoalEntity::find()
        .filter(production_goal::Column::DueDate.gte(start))
        .filter(production_goal::Column::DueDate.lte(end))
        .all(db)
        .await?;

    let mut required: BTreeMap<i64, i32> = BTreeMap::new();
    for goal in &goals {
        *required.entry(goal.product_id).or_insert(0) += goal.remaining().max(0);
    }

    let mut out: BTreeMap<i64, ProductionRequirement> = BTreeMap::new();

    for product in ProductEntity::find()
        .filter(product::Column::Active.eq(true))
        .all(db)
        .await?
    {
        out.insert(
            product.id,
            ProductionRequirement {
                product_id: product.id,
                product_name: product.display_name,
                active: true,
                stock_on_hand: product.stock_on_hand,
                required_qty: required.get(&product.id).copied().unwrap_or(0),
            },
        );
    }

    let archived_with_need: Vec<i64> = required
        .iter()
        .filter(|(id, qty)| **qty > 0 && !out.contains_key(id))
        .map(|(id, _)| *id)
        .collect();
    if !archived_with_need.is_empty() {
        for product in ProductEntity::find()
            .filter(product::Column::Id.is_in(archived_with_need))
            .all(db)
            .await?
        {
            out.insert(
                product.id,
                ProductionRequirement {
                    product_id: product.id,
                    product_name: product.display_name,
                    active: product.active,
                    stock_on_hand: product.stock_on_hand,
                    required_qty: required.get(&product.id).copied().unwrap_or(0),
                },
            );
        }
    }

    Ok(out.into_values().collect())
}

/// Goal rows due in a window, products resolved, soonest first.
pub async fn goals_in_range(
    db: &DbPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<GoalOverview>, ServiceError> {
    let rows = ProductionGoalEntity::find()
        .filter(production_goal::Column::DueDate.gte(start))
        .filter(production_goal::Column::DueDate.lte(end))
        .find_also_related(ProductEntity)
        .order_by_asc(production_goal::Column::DueDate)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(goal, maybe_product)| {
            maybe_product.map(|product| GoalOverview {
                goal_id: goal.id,
                product_id: goal.product_id,
                product_name: product.display_name,
                active: product.active,
                due_date: goal.due_date,
                qty_ordered: goal.qty_ordered,
                qty_fulfilled: goal.qty_fulfilled,
            })
        })
        .collect())
}

/// Explodes the Specific recipe lines of a production scenario
/// (`(product_id, units to make)` pairs) into raw-material needs, netted
/// against `count_on_hand × bundle_count` and rounded up to whole purchase
/// packs. Category lines are excluded: their concrete items are unknown
/// until production time.
pub async fn material_forecast(
    db: &DbPool,
    scenarios: &[(i64, i32)],
) -> Result<Vec<MaterialRequirement>, ServiceError> {
    let mut needs: BTreeMap<i64, i32> = BTreeMap::new();

    for (product_id, qty_to_make) in scenarios {
        if *qty_to_make <= 0 {
            continue;
        }
        let lines = RecipeLineEntity::find()
            .filter(recipe_line::Column::ProductId.eq(*product_id))
            .filter(recipe_line::Column::Kind.eq(RequirementKind::Specific))
            .all(db)
            .await?;
        for line in lines {
            if let Some(item_id) = line.item_id {
                *needs.entry(item_id).or_insert(0) += line.qty_needed * qty_to_make;
            }
        }
    }

    if needs.is_empty() {
        return Ok(Vec::new());
    }

    let items = InventoryItemEntity::find()
        .filter(inventory_item::Column::Id.is_in(needs.keys().copied().collect::<Vec<_>>()))
        .all(db)
        .await?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let needed = needs.get(&item.id).copied().unwrap_or(0);
        let bundle = item.bundle_count.max(1);
        let available_units = item.count_on_hand * bundle;
        let deficit_units = (needed - available_units).max(0);
        let packs_to_buy = if deficit_units > 0 {
            (deficit_units + bundle - 1) / bundle
        } else {
            0
        };
        out.push(MaterialRequirement {
            item_id: item.id,
            item_name: item.name,
            total_needed: needed,
            count_on_hand: item.count_on_hand,
            bundle_count: bundle,
            deficit_units,
            packs_to_buy,
        });
    }

    // Worst shortages first, then by name for a stable order.
    out.sort_by(|a, b| {
        b.packs_to_buy
            .cmp(&a.packs_to_buy)
            .then_with(|| a.item_name.cmp(&b.item_name))
    });

    Ok(out)
}

/// Log entries in a time window, newest first, with product names resolved.
pub async fn production_history(
    db: &DbPool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ProductionHistoryEntry>, ServiceError> {
    let rows = ProductionLogEntity::find()
        .filter(production_log::Column::LoggedAt.gte(start))
        .filter(production_log::Column::LoggedAt.lte(end))
        .find_also_related(ProductEntity)
        .order_by_desc(production_log::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(entry, maybe_product)| {
            maybe_product.map(|product| ProductionHistoryEntry {
                log_id: entry.id,
                goal_id: entry.goal_id,
                product_id: entry.product_id,
                product_name: product.display_name,
                action: entry.action,
                logged_at: entry.logged_at,
            })
        })
        .collect())
}
