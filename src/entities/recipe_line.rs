use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a recipe line identifies the material it consumes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RequirementKind {
    /// Names a concrete inventory item id; deducted directly on MAKE/STOCK.
    #[sea_orm(string_value = "Specific")]
    Specific,
    /// Names a category label ("any rose"); the concrete allocation is
    /// chosen at production time and passed in as substitutions.
    #[sea_orm(string_value = "Category")]
    Category,
}

/// One line of a product version's bill of materials. Lines are never edited
/// after creation; a recipe change always inserts fresh lines against a new
/// product version.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub kind: RequirementKind,
    /// Set when kind is Specific.
    pub item_id: Option<i64>,
    /// Set when kind is Category.
    pub category_label: Option<String>,
    pub qty_needed: i32,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::ItemId",
        to = "super::inventory_item::Column::Id"
    )]
    InventoryItem,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
