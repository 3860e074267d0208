#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_inventory_items_table::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_recipe_lines_table::Migration),
            Box::new(m20240101_000004_create_production_goals_table::Migration),
            Box::new(m20240101_000005_create_production_logs_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_inventory_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_inventory_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::Name).string().not_null())
                        .col(ColumnDef::new(InventoryItems::Category).string().null())
                        .col(ColumnDef::new(InventoryItems::SubCategory).string().null())
                        .col(
                            ColumnDef::new(InventoryItems::CountOnHand)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UnitCost)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::BundleCount)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_items_category")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::Category)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryItems {
        Table,
        Id,
        Name,
        Category,
        SubCategory,
        CountOnHand,
        UnitCost,
        BundleCount,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::DisplayName).string().not_null())
                        .col(ColumnDef::new(Products::ImageData).binary().null())
                        .col(
                            ColumnDef::new(Products::SellingPrice)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::StockOnHand)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::Category)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Note).string().null())
                        .col(ColumnDef::new(Products::VariantGroupId).string().null())
                        .col(
                            ColumnDef::new(Products::VariantType)
                                .string_len(8)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Lookups are by name (case-insensitive) and by active flag.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_display_name")
                        .table(Products::Table)
                        .col(Products::DisplayName)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_active")
                        .table(Products::Table)
                        .col(Products::Active)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        DisplayName,
        ImageData,
        SellingPrice,
        Active,
        StockOnHand,
        Category,
        Note,
        VariantGroupId,
        VariantType,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_recipe_lines_table {

    use super::m20240101_000001_create_inventory_items_table::InventoryItems;
    use super::m20240101_000002_create_products_table::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_recipe_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RecipeLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RecipeLines::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RecipeLines::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RecipeLines::Kind).string_len(16).not_null())
                        .col(ColumnDef::new(RecipeLines::ItemId).big_integer().null())
                        .col(ColumnDef::new(RecipeLines::CategoryLabel).string().null())
                        .col(ColumnDef::new(RecipeLines::QtyNeeded).integer().not_null())
                        .col(ColumnDef::new(RecipeLines::Note).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recipe_lines_product_id")
                                .from(RecipeLines::Table, RecipeLines::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_recipe_lines_item_id")
                                .from(RecipeLines::Table, RecipeLines::ItemId)
                                .to(InventoryItems::Table, InventoryItems::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_recipe_lines_product_id")
                        .table(RecipeLines::Table)
                        .col(RecipeLines::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RecipeLines::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum RecipeLines {
        Table,
        Id,
        ProductId,
        Kind,
        ItemId,
        CategoryLabel,
        QtyNeeded,
        Note,
    }
}

mod m20240101_000004_create_production_goals_table {

    use super::m20240101_000002_create_products_table::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_production_goals_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionGoals::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionGoals::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionGoals::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionGoals::DueDate).date().not_null())
                        .col(
                            ColumnDef::new(ProductionGoals::QtyOrdered)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionGoals::QtyFulfilled)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductionGoals::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_goals_product_id")
                                .from(ProductionGoals::Table, ProductionGoals::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_goals_product_id")
                        .table(ProductionGoals::Table)
                        .col(ProductionGoals::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_goals_due_date")
                        .table(ProductionGoals::Table)
                        .col(ProductionGoals::DueDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionGoals::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductionGoals {
        Table,
        Id,
        ProductId,
        DueDate,
        QtyOrdered,
        QtyFulfilled,
        CreatedAt,
    }
}

mod m20240101_000005_create_production_logs_table {

    use super::m20240101_000002_create_products_table::Products;
    use super::m20240101_000004_create_production_goals_table::ProductionGoals;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_production_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionLogs::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionLogs::GoalId).big_integer().null())
                        .col(
                            ColumnDef::new(ProductionLogs::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductionLogs::Action).string_len(8).not_null())
                        .col(
                            ColumnDef::new(ProductionLogs::LoggedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_logs_goal_id")
                                .from(ProductionLogs::Table, ProductionLogs::GoalId)
                                .to(ProductionGoals::Table, ProductionGoals::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_logs_product_id")
                                .from(ProductionLogs::Table, ProductionLogs::ProductId)
                                .to(Products::Table, Products::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_logs_goal_id")
                        .table(ProductionLogs::Table)
                        .col(ProductionLogs::GoalId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_logs_product_id")
                        .table(ProductionLogs::Table)
                        .col(ProductionLogs::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductionLogs {
        Table,
        Id,
        GoalId,
        ProductId,
        Action,
        LoggedAt,
    }
}
