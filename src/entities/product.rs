use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog category. One-off products leave the active catalog automatically
/// once they have fully shipped (see `ProductionService::fulfill_goal`).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ProductCategory {
    #[sea_orm(string_value = "Standard")]
    Standard,
    #[sea_orm(string_value = "One-Off")]
    OneOff,
}

/// Variant tier within a variant group (e.g. the Deluxe rendition of a
/// bouquet family).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum VariantType {
    #[sea_orm(string_value = "STD")]
    Std,
    #[sea_orm(string_value = "DLX")]
    Dlx,
    #[sea_orm(string_value = "PRM")]
    Prm,
}

/// One immutable product version. Edits never touch an existing row: the
/// current version is archived (active=false) and a fresh row is inserted,
/// so historical production logs stay interpretable after a recipe change.
/// At most one row per display name is active at any time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub display_name: String,
    /// Opaque, already-encoded image bytes supplied by the caller.
    #[sea_orm(column_type = "Blob", nullable)]
    pub image_data: Option<Vec<u8>>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub selling_price: Decimal,
    pub active: bool,
    /// Pre-built finished goods ("cooler stock"), independent of any goal.
    pub stock_on_hand: i32,
    pub category: ProductCategory,
    pub note: Option<String>,
    /// Shared id linking variant siblings (STD/DLX/PRM of one family).
    pub variant_group_id: Option<String>,
    pub variant_type: VariantType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_line::Entity")]
    RecipeLines,
    #[sea_orm(has_many = "super::production_goal::Entity")]
    ProductionGoals,
    #[sea_orm(has_many = "super::production_log::Entity")]
    ProductionLogs,
}

impl Related<super::recipe_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeLines.def()
    }
}

impl Related<super::production_goal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionGoals.def()
    }
}

impl Related<super::production_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
