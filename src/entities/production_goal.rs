use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Due-dated demand for one product version. A goal is Open while
/// `qty_fulfilled < qty_ordered` and Complete once fulfilment catches up;
/// there is no explicit cancelled state, deletion is a separate admin action
/// that reconciles completed work back into cooler stock.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "production_goals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub due_date: NaiveDate,
    pub qty_ordered: i32,
    pub qty_fulfilled: i32,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Units still to produce or pack. Negative when the goal is in overage.
    pub fn remaining(&self) -> i32 {
        self.qty_ordered - self.qty_fulfilled
    }

    pub fn is_open(&self) -> bool {
        self.qty_fulfilled < self.qty_ordered
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::production_log::Entity")]
    ProductionLogs,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::production_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
