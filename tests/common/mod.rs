#![allow(dead_code)]

use bloomtrack::{
    config::AppConfig,
    db,
    entities::product::{ProductCategory, VariantType},
    events::{self, EventSender},
    services::catalog::{CreateProductInput, GoalInput, RecipeLineInput},
    AppState,
};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Test harness over an in-memory SQLite database with migrations applied
/// and every service wired.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        // One connection only: each in-memory SQLite connection is its own
        // database.
        let mut cfg = AppConfig::new("sqlite::memory:");
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::create_db_pool(&cfg).await.expect("failed to connect");
        db::run_migrations(&pool).await.expect("failed to migrate");

        let (tx, rx) = mpsc::channel(100);
        let event_task = tokio::spawn(events::process_events(rx));

        let state = AppState::new(Arc::new(pool), cfg, EventSender::new(tx));
        Self {
            state,
            _event_task: event_task,
        }
    }

    /// Seeds one raw material and returns its id.
    pub async fn seed_item(&self, name: &str, category: Option<&str>, count: i32) -> i64 {
        self.state
            .inventory
            .create_item(bloomtrack::services::inventory::CreateItemInput {
                name: name.to_string(),
                category: category.map(str::to_string),
                sub_category: None,
                count_on_hand: count,
                unit_cost: dec!(1.00),
                bundle_count: 1,
            })
            .await
            .expect("failed to seed item")
    }

    /// Creates a standard product with a single Specific recipe line.
    pub async fn seed_product(&self, name: &str, item_id: i64, qty: i32) -> i64 {
        self.state
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                selling_price: dec!(50.00),
                image: None,
                note: None,
                recipe: vec![RecipeLineInput::Specific {
                    item_id,
                    qty,
                    note: None,
                }],
                category: ProductCategory::Standard,
                variant_group_id: None,
                variant_type: VariantType::Std,
                initial_goal: None,
            })
            .await
            .expect("failed to seed product")
    }

    /// Schedules a goal due on a fixed date.
    pub async fn seed_goal(&self, product_id: i64, qty_ordered: i32) -> i64 {
        self.state
            .production
            .schedule_goal(product_id, date(2024, 3, 4), qty_ordered)
            .await
            .expect("failed to seed goal")
    }

    pub async fn item_count(&self, item_id: i64) -> i32 {
        self.state
            .inventory
            .get_item(item_id)
            .await
            .expect("item query failed")
            .expect("item missing")
            .count_on_hand
    }

    pub async fn stock_on_hand(&self, product_id: i64) -> i32 {
        self.state
            .catalog
            .get_product(product_id)
            .await
            .expect("product query failed")
            .expect("product missing")
            .stock_on_hand
    }

    pub async fn qty_fulfilled(&self, goal_id: i64) -> i32 {
        self.state
            .production
            .get_goal(goal_id)
            .await
            .expect("goal query failed")
            .expect("goal missing")
            .qty_fulfilled
    }

    /// Directly tops up a product's cooler stock, bypassing the ledger.
    pub async fn set_stock(&self, product_id: i64, stock: i32) {
        use bloomtrack::entities::{product, Product};
        use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, IntoActiveModel};

        let model = Product::find_by_id(product_id)
            .one(self.state.db.as_ref())
            .await
            .expect("product query failed")
            .expect("product missing");
        let mut active: product::ActiveModel = model.into_active_model();
        active.stock_on_hand = Set(stock);
        active
            .update(self.state.db.as_ref())
            .await
            .expect("stock update failed");
    }

    pub async fn log_entries_for_goal(
        &self,
        goal_id: i64,
    ) -> Vec<bloomtrack::entities::production_log::Model> {
        use bloomtrack::entities::{production_log, ProductionLog};
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

        ProductionLog::find()
            .filter(production_log::Column::GoalId.eq(goal_id))
            .order_by_asc(production_log::Column::Id)
            .all(self.state.db.as_ref())
            .await
            .expect("log query failed")
    }

    pub async fn stock_log_entries(
        &self,
        product_id: i64,
    ) -> Vec<bloomtrack::entities::production_log::Model> {
        use bloomtrack::entities::{production_log, ProductionLog};
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

        ProductionLog::find()
            .filter(production_log::Column::ProductId.eq(product_id))
            .filter(production_log::Column::GoalId.is_null())
            .order_by_asc(production_log::Column::Id)
            .all(self.state.db.as_ref())
            .await
            .expect("log query failed")
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("invalid date")
}

pub fn goal_input(y: i32, m: u32, d: u32, qty: i32) -> GoalInput {
    GoalInput {
        due_date: date(y, m, d),
        qty_ordered: qty,
    }
}
