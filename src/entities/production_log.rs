use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a log entry records, and therefore how undoing it behaves.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum ActionType {
    /// Built one unit from raw materials against a goal.
    #[sea_orm(string_value = "MAKE")]
    Make,
    /// Fulfilled one unit of a goal from existing cooler stock.
    #[sea_orm(string_value = "PACK")]
    Pack,
    /// Built one unit directly into cooler stock, unattached to a goal.
    #[sea_orm(string_value = "STOCK")]
    Stock,
}

/// Append-only production ledger. The entry with the largest id in an undo
/// scope (a goal id, or a product id with null goal) is the only reversible
/// one. `product_id` records the version actually produced, which may differ
/// from the goal's current product after a re-version.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Null when the action targeted cooler stock rather than a goal.
    pub goal_id: Option<i64>,
    pub product_id: i64,
    pub action: ActionType,
    pub logged_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production_goal::Entity",
        from = "Column::GoalId",
        to = "super::production_goal::Column::Id"
    )]
    ProductionGoal,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::production_goal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionGoal.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
