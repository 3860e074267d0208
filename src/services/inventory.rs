use crate::{
    db::DbPool,
    entities::inventory_item::{self, Entity as InventoryItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;
use tracing::instrument;

/// Input payload for registering a new raw material.
#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub name: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub count_on_hand: i32,
    pub unit_cost: Decimal,
    pub bundle_count: i32,
}

/// The Inventory Ledger: raw-material counters and their administrative
/// overwrites. `adjust_count` is the only relative mutation; the `set_*`
/// operations are stock-take overwrites and bypass the production log.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Registers a raw material. Items are never deleted afterwards, only
    /// soft-adjusted.
    #[instrument(skip(self, input))]
    pub async fn create_item(&self, input: CreateItemInput) -> Result<i64, ServiceError> {
        let now = Utc::now();
        let model = inventory_item::ActiveModel {
            id: Default::default(),
            name: Set(input.name),
            category: Set(input.category),
            sub_category: Set(input.sub_category),
            count_on_hand: Set(input.count_on_hand),
            unit_cost: Set(input.unit_cost),
            bundle_count: Set(input.bundle_count.max(1)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let item = model.insert(self.connection()).await?;

        self.event_sender
            .send_or_log(Event::ItemCreated { item_id: item.id })
            .await;

        Ok(item.id)
    }

    /// Applies a relative delta to `count_on_hand`. No floor is enforced at
    /// this layer; callers decide whether the delta is sound. An unknown id
    /// is a `NotFound` with no mutation.
    #[instrument(skip(self))]
    pub async fn adjust_count(&self, item_id: i64, delta: i32) -> Result<(), ServiceError> {
        adjust_count_on(self.connection(), item_id, delta).await?;

        self.event_sender
            .send_or_log(Event::ItemAdjusted { item_id, delta })
            .await;

        Ok(())
    }

    /// Stock-take overwrite of the on-hand count.
    #[instrument(skip(self))]
    pub async fn set_count(&self, item_id: i64, count: i32) -> Result<(), ServiceError> {
        let mut item = self.require_item(item_id).await?.into_active_model();
        item.count_on_hand = Set(count);
        item.updated_at = Set(Utc::now());
        item.update(self.connection()).await?;
        Ok(())
    }

    /// Administrative overwrite of the unit cost.
    #[instrument(skip(self))]
    pub async fn set_cost(&self, item_id: i64, cost: Decimal) -> Result<(), ServiceError> {
        let mut item = self.require_item(item_id).await?.into_active_model();
        item.unit_cost = Set(cost);
        item.updated_at = Set(Utc::now());
        item.update(self.connection()).await?;
        Ok(())
    }

    /// Administrative overwrite of the units-per-pack figure.
    #[instrument(skip(self))]
    pub async fn set_bundle(&self, item_id: i64, bundle_count: i32) -> Result<(), ServiceError> {
        if bundle_count < 1 {
            return Err(ServiceError::ValidationError(
                "bundle_count must be at least 1".into(),
            ));
        }
        let mut item = self.require_item(item_id).await?.into_active_model();
        item.bundle_count = Set(bundle_count);
        item.updated_at = Set(Utc::now());
        item.update(self.connection()).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_item(
        &self,
        item_id: i64,
    ) -> Result<Option<inventory_item::Model>, ServiceError> {
        Ok(InventoryItemEntity::find_by_id(item_id)
            .one(self.connection())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(InventoryItemEntity::find()
            .order_by_asc(inventory_item::Column::Name)
            .all(self.connection())
            .await?)
    }

    /// Items sharing a category, for the generic-allocation picker.
    #[instrument(skip(self))]
    pub async fn items_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(InventoryItemEntity::find()
            .filter(inventory_item::Column::Category.eq(category))
            .order_by_asc(inventory_item::Column::Name)
            .all(self.connection())
            .await?)
    }

    async fn require_item(&self, item_id: i64) -> Result<inventory_item::Model, ServiceError> {
        InventoryItemEntity::find_by_id(item_id)
            .one(self.connection())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("inventory item {} not found", item_id)))
    }

    fn connection(&self) -> &DbPool {
        self.db_pool.as_ref()
    }
}

/// Connection-generic counter adjustment so the production engine can apply
/// deductions inside its own transactions.
pub(crate) async fn adjust_count_on<C: ConnectionTrait>(
    conn: &C,
    item_id: i64,
    delta: i32,
) -> Result<(), ServiceError> {
    let item = InventoryItemEntity::find_by_id(item_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("inventory item {} not found", item_id)))?;

    let mut active = item.clone().into_active_model();
    active.count_on_hand = Set(item.count_on_hand + delta);
    active.updated_at = Set(Utc::now());
    active.update(conn).await?;

    Ok(())
}
